// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use inquire::Confirm;

pub enum CacheCommand {
    List { format: OutputFormat },
    Cleanup,
    Clear { yes: bool },
    Path,
}

impl CacheCommand {
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let cache = context.cache()?;

        match self {
            Self::List { format } => {
                let entries = cache.list().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        if entries.is_empty() {
                            println!("No cached playlists in {}", cache.cache_dir().display());
                        }
                        for entry in entries {
                            println!(
                                "{:<40} {:>10} B  {}",
                                entry.key,
                                entry.size_bytes,
                                entry.modified.format("%Y-%m-%d %H:%M:%S")
                            );
                        }
                    }
                }
            }
            Self::Cleanup => {
                let report = cache.cleanup().await;
                println!(
                    "Scanned {} playlists, removed {}, {} failed (retention {} days)",
                    report.scanned,
                    report.removed,
                    report.failed,
                    cache.retention().as_secs() / 86_400
                );
            }
            Self::Clear { yes } => {
                if !yes {
                    let confirmed = Confirm::new(&format!(
                        "Remove all cached playlists in {}?",
                        cache.cache_dir().display()
                    ))
                    .with_default(false)
                    .prompt()?;
                    if !confirmed {
                        return Ok(());
                    }
                }
                let removed = cache.clear().await?;
                println!("Removed {} cached playlists", removed);
            }
            Self::Path => {
                println!("{}", cache.cache_dir().display());
            }
        }

        Ok(())
    }
}
