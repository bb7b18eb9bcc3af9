// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-side sort interaction.
//!
//! The provider's shopping view lists results in its own order; a radio
//! control labelled "Price - Low To High" re-sorts them client-side. The
//! script here finds that control and clicks it. The control is optional:
//! when it is missing the script reports [`SortOutcome::Absent`] and the
//! page is extracted as-is.
//!
//! [`SortScript::simulate`] runs the same matching rules against a static
//! DOM so they can be tested without a browser.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Visible label of the provider's ascending-price sort option.
pub const DEFAULT_SORT_LABEL: &str = "Price - Low To High";

/// Radio inputs of the provider's sort control.
pub const SORT_RADIO_SELECTOR: &str = r#"input[type="radio"][name="Sort by"]"#;

/// Bumped whenever the page-side matching rules change.
pub const SORT_SCRIPT_VERSION: u32 = 2;

/// A named, versioned piece of JavaScript evaluated in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScript {
    pub name: &'static str,
    pub version: u32,
    pub source: String,
}

/// What the sort script did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOutcome {
    /// The radio was found and clicked.
    Clicked,
    /// The radio was found but already checked; nothing was clicked.
    AlreadySelected,
    /// No matching control on the page.
    Absent,
}

impl SortOutcome {
    /// Wire value returned by the page script.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOutcome::Clicked => "clicked",
            SortOutcome::AlreadySelected => "already_selected",
            SortOutcome::Absent => "absent",
        }
    }

    /// Interpret the value the page script evaluated to.
    ///
    /// Anything unexpected counts as absent: the sort is a soft
    /// enhancement and never a reason to fail extraction.
    pub fn from_script_value(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some("clicked") => SortOutcome::Clicked,
            Some("already_selected") => SortOutcome::AlreadySelected,
            _ => SortOutcome::Absent,
        }
    }
}

/// Builds and simulates the ascending-price sort interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortScript {
    label: String,
}

impl Default for SortScript {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_LABEL)
    }
}

impl SortScript {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The page-side script. Pure function of the label text.
    pub fn script(&self) -> PageScript {
        // serde_json string encoding is also a valid JS string literal.
        let label = serde_json::Value::String(self.label.clone()).to_string();
        let radio = serde_json::Value::String(SORT_RADIO_SELECTOR.to_string()).to_string();

        let source = format!(
            r#"(() => {{
  const label = {label};
  const match = Array.from(document.querySelectorAll('div'))
    .find((div) => div.textContent.trim() === label);
  if (!match) return "{absent}";
  const wrapper = match.closest('label');
  const input = wrapper ? wrapper.querySelector({radio}) : null;
  if (!input) return "{absent}";
  if (input.checked) return "{already}";
  input.click();
  return "{clicked}";
}})()"#,
            absent = SortOutcome::Absent.as_str(),
            already = SortOutcome::AlreadySelected.as_str(),
            clicked = SortOutcome::Clicked.as_str(),
        );

        PageScript {
            name: "sort-price-ascending",
            version: SORT_SCRIPT_VERSION,
            source,
        }
    }

    /// Apply the script's matching rules to a static document and report
    /// what the script would do. Nothing is mutated.
    pub fn simulate(&self, html: &str) -> SortOutcome {
        let document = Html::parse_document(html);
        let (Ok(div_sel), Ok(radio_sel)) =
            (Selector::parse("div"), Selector::parse(SORT_RADIO_SELECTOR))
        else {
            return SortOutcome::Absent;
        };

        let Some(matched) = document
            .select(&div_sel)
            .find(|div| div.text().collect::<String>().trim() == self.label)
        else {
            return SortOutcome::Absent;
        };

        let Some(wrapper) = closest(matched, "label") else {
            return SortOutcome::Absent;
        };

        match wrapper.select(&radio_sel).next() {
            Some(input) if input.value().attr("checked").is_some() => {
                SortOutcome::AlreadySelected
            }
            Some(_) => SortOutcome::Clicked,
            None => SortOutcome::Absent,
        }
    }
}

/// `Element.closest` for a bare tag name: the element itself or its
/// nearest ancestor with that name.
fn closest<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    if element.value().name() == tag {
        return Some(element);
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
}
