use crate::output::print_json;
use clap::Subcommand;
use timelock_core::config::WarnLevel;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(
    root: &Path,
    subcmd: ConfigSubcommand,
    rpc_url: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(root, rpc_url)?;
    match subcmd {
        ConfigSubcommand::Show => {
            if json {
                print_json(&config)?;
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(())
        }
        ConfigSubcommand::Validate => {
            let warnings = config.validate();
            if json {
                print_json(&serde_json::json!({ "warnings": warnings }))?;
            } else if warnings.is_empty() {
                println!("Config is valid. No warnings.");
            } else {
                for w in &warnings {
                    let prefix = match w.level {
                        WarnLevel::Warning => "warning",
                        WarnLevel::Error => "error",
                    };
                    println!("[{prefix}] {}", w.message);
                }
            }
            if warnings.iter().any(|w| w.level == WarnLevel::Error) {
                anyhow::bail!("config validation found errors");
            }
            Ok(())
        }
    }
}
