use anyhow::Context;
use timelock_core::config::{Config, StoreBackend};
use timelock_core::types;
use timelock_core::{io, paths, plan};
use std::path::Path;

pub struct InitArgs<'a> {
    pub rpc_url: Option<&'a str>,
    pub timelock: Option<&'a str>,
    pub sender: Option<&'a str>,
    pub store: Option<&'a str>,
}

/// Create `.timelock/` with a config and an example plan. Existing files
/// are left as they are.
pub fn run(root: &Path, args: InitArgs<'_>) -> anyhow::Result<()> {
    println!("Initializing timelock in: {}", root.display());

    let dir = paths::timelock_dir(root);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
    } else {
        let mut config = Config::default();
        if let Some(url) = args.rpc_url {
            config.ledger.rpc_url = url.to_string();
        }
        if let Some(addr) = args.timelock {
            config.ledger.timelock_address = Some(types::parse_address(addr).context("--timelock")?);
        }
        if let Some(addr) = args.sender {
            config.ledger.sender = Some(types::parse_address(addr).context("--sender")?);
        }
        if let Some(backend) = args.store {
            config.store.backend = backend.parse::<StoreBackend>()?;
        }
        config.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    }

    let created = io::write_if_missing(&paths::plan_path(root), plan::EXAMPLE_PLAN.as_bytes())
        .context("failed to write plan.yaml")?;
    if created {
        println!("  created: {}", paths::PLAN_FILE);
    } else {
        println!("  exists:  {}", paths::PLAN_FILE);
    }

    println!(
        "\nNext: set ledger.timelock_address and ledger.sender, then run 'timelock config validate'."
    );
    Ok(())
}
