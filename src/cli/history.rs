// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::{CommandContext, OutputFormat};
use anyhow::Result;
use hlscache::WatchProgress;

pub enum HistoryCommand {
    List {
        format: OutputFormat,
    },
    Show {
        title: String,
    },
    Record {
        title: String,
        position_secs: f64,
        duration_secs: f64,
        episode: Option<String>,
        server: Option<String>,
    },
    Remove {
        title: String,
    },
}

impl HistoryCommand {
    pub fn execute(self, context: CommandContext) -> Result<()> {
        let history = context.history()?;

        match self {
            Self::List { format } => {
                let entries = history.list()?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    }
                    OutputFormat::Text => {
                        if entries.is_empty() {
                            println!("No watch history");
                        }
                        for entry in entries {
                            println!(
                                "{}  {:>3.0}%  {}{}",
                                entry.updated_at.format("%Y-%m-%d %H:%M"),
                                entry.fraction_watched() * 100.0,
                                entry.title,
                                entry
                                    .episode
                                    .as_ref()
                                    .map(|ep| format!(" [{}]", ep))
                                    .unwrap_or_default()
                            );
                        }
                    }
                }
            }
            Self::Show { title } => match history.get(&title)? {
                Some(progress) => println!("{}", serde_json::to_string_pretty(&progress)?),
                None => anyhow::bail!("No watch history for '{}'", title),
            },
            Self::Record {
                title,
                position_secs,
                duration_secs,
                episode,
                server,
            } => {
                let mut progress = WatchProgress::new(title, position_secs, duration_secs);
                progress.episode = episode;
                progress.server = server;
                history.record(&progress)?;
                println!(
                    "Recorded {} at {:.0}s of {:.0}s",
                    progress.title, progress.position_secs, progress.duration_secs
                );
            }
            Self::Remove { title } => {
                history.remove(&title)?;
                println!("Removed watch history for {}", title);
            }
        }

        Ok(())
    }
}
