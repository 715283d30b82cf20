pub mod config;
pub mod deploy;
pub mod doctor;
pub mod notify;
pub mod patcher;
pub mod registry;
pub mod secrets;
pub mod sync;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fs;

/// A single completed server deployment
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeployRecord {
    pub timestamp: String,
    pub server: String,
    pub host: String,
    pub port: u16,
    pub notified: bool,
}

/// Persistent log of all deployments
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DeployLog {
    pub entries: Vec<DeployRecord>,
}

impl DeployLog {
    /// Load deploy log from ~/.fleetdeploy/deploy_log.json
    pub fn load() -> Self {
        let home = match home::home_dir() {
            Some(h) => h,
            None => return Self::default(),
        };
        let path = home.join(".fleetdeploy").join("deploy_log.json");
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save deploy log to ~/.fleetdeploy/deploy_log.json
    pub fn save(&self) -> anyhow::Result<()> {
        let home = home::home_dir().ok_or_else(|| anyhow::anyhow!("No home dir"))?;
        let status_dir = home.join(".fleetdeploy");
        fs::create_dir_all(&status_dir)?;

        let json = serde_json::to_string_pretty(&self.trimmed())?;
        let mut file = fs::File::create(status_dir.join("deploy_log.json"))?;
        use std::io::Write;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    // Keep only the last 1000 entries to prevent unbounded growth
    fn trimmed(&self) -> DeployLog {
        if self.entries.len() > 1000 {
            DeployLog {
                entries: self.entries[self.entries.len() - 1000..].to_vec(),
            }
        } else {
            self.clone()
        }
    }

    /// Add a new record and save
    pub fn log_deploy(&mut self, record: DeployRecord) -> anyhow::Result<()> {
        self.entries.push(record);
        self.save()
    }

    /// Get recent deployments (last N)
    pub fn recent(&self, n: usize) -> Vec<&DeployRecord> {
        self.entries.iter().rev().take(n).collect()
    }
}
