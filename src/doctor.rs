use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

use crate::config::load_server_list;
use crate::registry::RconRegistry;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DoctorCheck {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
    pub overall_health: CheckStatus,
}

pub struct FleetDoctor;

impl FleetDoctor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, server_list: &Path, registry_path: &Path) -> DoctorReport {
        let mut checks = Vec::new();

        // rsync is a hard dependency, rcon only degrades notification
        checks.push(self.check_tool("rsync", CheckStatus::Fail));
        checks.push(self.check_tool("rcon", CheckStatus::Warning));
        checks.push(self.check_server_list(server_list));
        checks.push(self.check_registry(registry_path));

        let overall_health = if checks.iter().any(|c| matches!(c.status, CheckStatus::Fail)) {
            CheckStatus::Fail
        } else if checks
            .iter()
            .any(|c| matches!(c.status, CheckStatus::Warning))
        {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        };

        DoctorReport {
            checks,
            overall_health,
        }
    }

    fn check_tool(&self, tool: &str, missing_status: CheckStatus) -> DoctorCheck {
        match Command::new(tool).arg("--version").output() {
            Ok(_) => DoctorCheck {
                name: format!("{} client", tool),
                status: CheckStatus::Pass,
                message: format!("'{}' found on PATH", tool),
            },
            Err(_) => DoctorCheck {
                name: format!("{} client", tool),
                status: missing_status,
                message: format!("'{}' not found on PATH", tool),
            },
        }
    }

    fn check_server_list(&self, path: &Path) -> DoctorCheck {
        match load_server_list(path) {
            Ok(servers) => DoctorCheck {
                name: "Server list".to_string(),
                status: CheckStatus::Pass,
                message: format!("{} servers in {}", servers.len(), path.display()),
            },
            Err(e) => DoctorCheck {
                name: "Server list".to_string(),
                status: CheckStatus::Fail,
                message: format!("{:#}", e),
            },
        }
    }

    fn check_registry(&self, path: &Path) -> DoctorCheck {
        if path.exists() {
            match RconRegistry::read(path) {
                Ok(entries) => DoctorCheck {
                    name: "Rcon registry".to_string(),
                    status: CheckStatus::Pass,
                    message: format!("{} entries in {}", entries.len(), path.display()),
                },
                Err(e) => DoctorCheck {
                    name: "Rcon registry".to_string(),
                    status: CheckStatus::Fail,
                    message: format!("{:#}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "Rcon registry".to_string(),
                status: CheckStatus::Pass,
                message: format!("{} does not exist yet, will be created", path.display()),
            }
        }
    }
}
