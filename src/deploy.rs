use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use std::path::Path;

use crate::config::{FleetConfig, ServerEntry};
use crate::notify::Notifier;
use crate::patcher::ConfigPatcher;
use crate::registry::RconRegistry;
use crate::secrets::SecretStore;
use crate::sync::FileSync;
use crate::{DeployLog, DeployRecord};

/// Terminal state of a single server within a run
#[derive(Debug, PartialEq)]
pub enum DeployOutcome {
    Deployed {
        host: String,
        port: u16,
        notified: bool,
    },
    Skipped,
}

pub struct Deployer;

impl Deployer {
    /// Run a full deployment over the server list, strictly in list
    /// order. A server with no installation on disk is skipped; sync,
    /// patch and registry errors abort the whole run.
    pub async fn run(
        config: &FleetConfig,
        servers: &[ServerEntry],
        secrets: &SecretStore,
        source: &Path,
        dry_run: bool,
    ) -> Result<()> {
        let registry_path = config.registry_file()?;
        let mut log = DeployLog::load();
        let mut deployed = 0usize;
        let mut skipped = 0usize;

        println!(
            "🚀 Deploying {} servers from {}",
            servers.len(),
            source.display()
        );

        for (index, server) in servers.iter().enumerate() {
            println!("\n--- {} ---", server.name);
            let outcome = Self::deploy_server(
                config,
                server,
                index,
                secrets,
                source,
                &registry_path,
                dry_run,
            )
            .await?;

            match outcome {
                DeployOutcome::Deployed {
                    host,
                    port,
                    notified,
                } => {
                    deployed += 1;
                    println!("✅ {} deployed (port {})", server.name, port);
                    if !dry_run {
                        let record = DeployRecord {
                            timestamp: chrono::Local::now()
                                .format("%Y-%m-%d %H:%M:%S")
                                .to_string(),
                            server: server.name.clone(),
                            host,
                            port,
                            notified,
                        };
                        if let Err(e) = log.log_deploy(record) {
                            println!("⚠️  Could not write deploy log: {}", e);
                        }
                    }
                }
                DeployOutcome::Skipped => skipped += 1,
            }
        }

        println!("\n📋 Run complete: {} deployed, {} skipped", deployed, skipped);
        Ok(())
    }

    /// Port assignment is a pure function of list position
    pub fn port_for(base_port: u16, index: usize) -> u16 {
        base_port + index as u16
    }

    pub async fn deploy_server(
        config: &FleetConfig,
        server: &ServerEntry,
        index: usize,
        secrets: &SecretStore,
        source: &Path,
        registry_path: &Path,
        dry_run: bool,
    ) -> Result<DeployOutcome> {
        // Anticipated failure: a listed server that is not installed on
        // this machine. Skip and keep going.
        if !server.path.exists() {
            println!(
                "⚠️  {} has no installation at {}, skipping",
                server.name,
                server.path.display()
            );
            return Ok(DeployOutcome::Skipped);
        }

        let server_secrets = secrets
            .for_server(&server.name)
            .with_context(|| format!("No resolved secrets for server '{}'", server.name))?;

        FileSync::mirror(source, &server.path, config.rsync_delete, dry_run).await?;

        let cfg_path = server.path.join(&config.server_cfg_path);
        if dry_run {
            println!("   [DRY RUN] Would patch {}", cfg_path.display());
        } else {
            ConfigPatcher::patch(&cfg_path, &secrets.shared, server_secrets)?;
            println!("   🔑 Patched {}", cfg_path.display());
        }

        let port = Self::port_for(config.base_port, index);

        // Previous password, captured before the upsert for the
        // notifier's rotation fallback
        let old_password = RconRegistry::current_password(registry_path, &server.name);

        if dry_run {
            println!(
                "   [DRY RUN] Would update registry entry [{}] ({}:{})",
                server.name, server_secrets.hostname, port
            );
        } else {
            RconRegistry::upsert(
                registry_path,
                &server.name,
                &server_secrets.hostname,
                port,
                server_secrets.rcon_password.expose_secret(),
            )?;
            println!("   📇 Registry entry [{}] updated", server.name);
        }

        let notified = Notifier::notify(
            &server.name,
            &config.notify_message,
            &server_secrets.hostname,
            port,
            &server_secrets.rcon_password,
            old_password.as_deref(),
            dry_run,
        )
        .await;

        Ok(DeployOutcome::Deployed {
            host: server_secrets.hostname.clone(),
            port,
            notified,
        })
    }
}
