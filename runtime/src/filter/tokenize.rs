// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tokenizer shared by queries and page blocks.

/// English function words that carry no relevance signal.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Lowercase, split on anything that is not alphanumeric, drop stop
/// words and single characters, fold plurals.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|raw| !raw.is_empty())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1 && !is_stop_word(t))
        .map(|t| fold_plural(&t))
        .collect()
}

/// Minimal plural folding so "laptops" matches "laptop".
///
/// Singular and plural fold to the same stem rather than to the singular:
/// a trailing `e` is dropped after the plural suffix, so "cache" and
/// "caches" both become "cach" while "watch" and "watches" stay "watch".
fn fold_plural(token: &str) -> String {
    if token.chars().any(|c| c.is_ascii_digit()) || token.len() <= 3 {
        return token.to_string();
    }
    let stem = strip_plural(token);
    match stem.strip_suffix('e') {
        Some(shorter) if stem.len() > 3 => shorter.to_string(),
        _ => stem.to_string(),
    }
}

fn strip_plural(token: &str) -> std::borrow::Cow<'_, str> {
    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y").into();
        }
    }
    for suffix in ["ches", "shes", "sses", "xes", "zes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].into();
        }
    }
    if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") && !token.ends_with("is") {
        return token[..token.len() - 1].into();
    }
    token.into()
}
