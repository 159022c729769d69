// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use hlscache::derive_key;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::io::IsTerminal;
use std::time::Duration;

pub struct ProcessCommand {
    pub url: String,
    /// Report failures instead of falling back to the remote URL
    pub strict: bool,
    pub format: OutputFormat,
}

impl ProcessCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let processor = context.processor()?;

        let pb = if std::io::stderr().is_terminal() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Processing playlist...");

        if !self.strict {
            let uri = processor.process_playlist(&self.url).await;
            pb.finish_and_clear();
            let cached = uri != self.url;
            match self.format {
                OutputFormat::Text => println!("{}", uri),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "source": self.url,
                        "uri": uri,
                        "cached": cached,
                    }))?
                ),
            }
            return Ok(());
        }

        let result = processor.try_process_playlist(&self.url).await;
        pb.finish_and_clear();
        let processed = result?;

        match self.format {
            OutputFormat::Text => println!("{}", processed.cached.uri),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "source": processed.source_url,
                    "media_url": processed.media_url.as_str(),
                    "variant_depth": processed.variant_depth,
                    "key": processed.cached.key,
                    "path": processed.cached.path,
                    "uri": processed.cached.uri,
                    "cached": true,
                }))?
            ),
        }

        Ok(())
    }
}

pub struct KeyCommand {
    pub url: String,
}

impl KeyCommand {
    pub fn execute(self, context: CommandContext) -> Result<()> {
        let key = derive_key(&self.url);
        let cache = context.cache()?;
        println!("{}", key);
        eprintln!("Cache file: {}", cache.entry_path(&key).display());
        Ok(())
    }
}
