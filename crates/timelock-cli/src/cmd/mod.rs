pub mod config;
pub mod execute;
pub mod id;
pub mod init;
pub mod list;
pub mod reconcile;
pub mod schedule;
pub mod show;

use anyhow::Context;
use std::path::Path;
use timelock_core::clock::SystemClock;
use timelock_core::config::Config;
use timelock_core::ledger::JsonRpcGateway;
use timelock_core::orchestrator::Orchestrator;
use timelock_core::store::{self, ActionStore, StoreState};

/// Load config.yaml and apply the `--rpc-url` override.
pub fn load_config(root: &Path, rpc_url: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(url) = rpc_url {
        config.ledger.rpc_url = url.to_string();
    }
    Ok(config)
}

pub fn open_store(root: &Path, config: &Config) -> anyhow::Result<Box<dyn ActionStore>> {
    store::open(root, config).context("failed to open action store")
}

/// Everything an orchestration command needs, wired from config.
pub struct Session {
    store: Box<dyn ActionStore>,
    ledger: JsonRpcGateway,
    clock: SystemClock,
}

impl Session {
    pub fn open(root: &Path, rpc_url: Option<&str>) -> anyhow::Result<Self> {
        let config = load_config(root, rpc_url)?;
        let ledger =
            JsonRpcGateway::new(&config.ledger).context("failed to set up ledger client")?;
        Ok(Self {
            store: open_store(root, &config)?,
            ledger,
            clock: SystemClock,
        })
    }

    pub fn load_state(&self) -> anyhow::Result<StoreState> {
        Ok(self.store.load()?)
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator::new(&*self.store, &self.ledger, &self.clock)
    }
}
