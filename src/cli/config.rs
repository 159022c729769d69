// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use super::CommandContext;
use anyhow::{Context, Result};

pub enum ConfigCommand {
    Show,
    Init { force: bool },
}

impl ConfigCommand {
    pub fn execute(self, context: CommandContext) -> Result<()> {
        match self {
            Self::Show => {
                let content = toml::to_string_pretty(&context.config)
                    .with_context(|| "Failed to serialize config to TOML")?;
                eprintln!("# {}", context.config_path.display());
                print!("{}", content);
            }
            Self::Init { force } => {
                if context.config_path.exists() && !force {
                    anyhow::bail!(
                        "Config already exists at {} (use --force to overwrite)",
                        context.config_path.display()
                    );
                }
                if let Some(parent) = context.config_path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create config directory: {}", parent.display())
                    })?;
                }
                context.config.save(&context.config_path)?;
                println!("Configuration saved to: {}", context.config_path.display());
            }
        }
        Ok(())
    }
}
