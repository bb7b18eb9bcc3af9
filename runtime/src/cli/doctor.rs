// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

//! Environment readiness check.

use crate::cli::ConfigArgs;
use crate::navigation::SortScript;
use crate::renderer::chromium::find_chromium;
use anyhow::{bail, Result};

/// Check Chromium availability and print the effective configuration.
/// Fails when the service could not run, so scripts can check the exit
/// code.
pub async fn run(args: ConfigArgs) -> Result<()> {
    println!("Shopfit Doctor");
    println!("==============");
    println!();

    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    let config = match args.into_config() {
        Ok(config) => {
            println!("[OK] Configuration is valid");
            config
        }
        Err(e) => {
            println!("[!!] Configuration is invalid");
            println!();
            println!("Status: NOT READY");
            return Err(e);
        }
    };

    let chromium_path = find_chromium(config.browser.chromium_path.as_ref());
    match &chromium_path {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Install Chrome or set SHOPFIT_CHROMIUM_PATH."
        ),
    }

    let script = SortScript::new(config.provider.sort_label.clone()).script();
    println!("[OK] Page script {} v{}", script.name, script.version);

    println!();
    println!("Effective configuration:");
    println!("{}", serde_json::to_string_pretty(&config)?);

    println!();
    if chromium_path.is_none() {
        println!("Status: NOT READY");
        bail!("Chromium not found");
    }
    println!("Status: READY");
    Ok(())
}
