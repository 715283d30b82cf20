use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One server installation, as listed in the fleet's servers.json.
/// List order is significant: it determines port assignment.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Load the ordered server list from a JSON array file. Read fresh on
/// every run; an unreadable or unparseable list is fatal.
pub fn load_server_list(path: &Path) -> Result<Vec<ServerEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read server list: {}", path.display()))?;
    let servers: Vec<ServerEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse server list: {}", path.display()))?;
    Ok(servers)
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FleetConfig {
    /// First server in the list gets this port, the rest count up from it
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    /// Patched config file, relative to a server installation
    #[serde(default = "default_server_cfg_path")]
    pub server_cfg_path: String,
    /// Override for the rcon registry location (default ~/.rconrc)
    #[serde(default)]
    pub registry_path: Option<PathBuf>,
    /// Pass --delete to the mirror step. Off by default: extra files on
    /// the destination are left alone.
    #[serde(default)]
    pub rsync_delete: bool,
    #[serde(default = "default_notify_message")]
    pub notify_message: String,
}

fn default_base_port() -> u16 {
    27015
}

fn default_server_cfg_path() -> String {
    "tf/cfg/server.cfg".to_string()
}

fn default_notify_message() -> String {
    "Server files updated, changes apply on map change".to_string()
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            base_port: default_base_port(),
            server_cfg_path: default_server_cfg_path(),
            registry_path: None,
            rsync_delete: false,
            notify_message: default_notify_message(),
        }
    }
}

impl FleetConfig {
    pub fn load() -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        let config_path = home.join(".fleetdeploy/config.toml");

        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        Ok(config)
    }

    /// Registry location: the configured override, or ~/.rconrc
    pub fn registry_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.registry_path {
            return Ok(path.clone());
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".rconrc"))
    }
}
