use secrecy::SecretString;
use std::collections::HashMap;

use crate::config::ServerEntry;

/// Written in place of any secret that is not present in the environment.
pub const PLACEHOLDER: &str = "changeme";

/// Secrets shared by every server in the fleet
#[derive(Debug)]
pub struct SharedSecrets {
    pub sv_password: SecretString,
    pub demostf_apikey: SecretString,
    pub logstf_apikey: SecretString,
}

/// Per-server connection details. The hostname is a public cvar, not a
/// secret, so it stays a plain String.
#[derive(Debug)]
pub struct ServerSecrets {
    pub rcon_password: SecretString,
    pub hostname: String,
}

/// All secret values for one run, resolved from the environment exactly
/// once and threaded through by reference afterwards. Per-server values
/// come from `<NAME>_RCON` and `<NAME>_HOSTNAME` with the server name
/// uppercased.
#[derive(Debug)]
pub struct SecretStore {
    pub shared: SharedSecrets,
    servers: HashMap<String, ServerSecrets>,
}

impl SecretStore {
    pub fn resolve(server_list: &[ServerEntry]) -> Self {
        let shared = SharedSecrets {
            sv_password: SecretString::from(env_or_placeholder("SV_PASSWORD")),
            demostf_apikey: SecretString::from(env_or_placeholder("DEMOSTF_APIKEY")),
            logstf_apikey: SecretString::from(env_or_placeholder("LOGSTF_APIKEY")),
        };

        let mut servers = HashMap::new();
        for entry in server_list {
            servers.insert(
                entry.name.clone(),
                ServerSecrets {
                    rcon_password: SecretString::from(env_or_placeholder(&env_key(
                        &entry.name,
                        "RCON",
                    ))),
                    hostname: env_or_placeholder(&env_key(&entry.name, "HOSTNAME")),
                },
            );
        }

        Self { shared, servers }
    }

    /// Present for every name that was in the list given to resolve()
    pub fn for_server(&self, name: &str) -> Option<&ServerSecrets> {
        self.servers.get(name)
    }
}

fn env_key(server_name: &str, suffix: &str) -> String {
    format!("{}_{}", server_name.to_uppercase(), suffix)
}

fn env_or_placeholder(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| PLACEHOLDER.to_string())
}
