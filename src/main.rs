use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use fleetdeploy::config::{load_server_list, FleetConfig};
use fleetdeploy::deploy::Deployer;
use fleetdeploy::doctor::{CheckStatus, FleetDoctor};
use fleetdeploy::notify::Notifier;
use fleetdeploy::registry::RconRegistry;
use fleetdeploy::secrets::SecretStore;
use fleetdeploy::DeployLog;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let matches = Command::new("fleetdeploy")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Game server fleet deployment: sync configs, rotate secrets, notify servers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("deploy")
                .about("Mirror the canonical tree to every server and rotate secrets")
                .arg(
                    Arg::new("config")
                        .required(false)
                        .default_value("servers.json")
                        .help("JSON server list ([{\"name\": ..., \"path\": ...}])"),
                )
                .arg(
                    Arg::new("source")
                        .short('s')
                        .long("source")
                        .required(true)
                        .help("Canonical config tree to mirror onto each server"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the plan without touching anything"),
                ),
        )
        .subcommand(
            Command::new("notify")
                .about("Send a chat message to one server via its registry entry")
                .arg(Arg::new("server").required(true))
                .arg(
                    Arg::new("message")
                        .required(false)
                        .default_value("Test notification"),
                ),
        )
        .subcommand(Command::new("registry").about("List rcon registry entries (passwords masked)"))
        .subcommand(
            Command::new("history")
                .about("Show recent deployments")
                .arg(Arg::new("limit").short('n').default_value("20")),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check external tools and fleet configuration")
                .arg(
                    Arg::new("config")
                        .required(false)
                        .default_value("servers.json"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("deploy", sub_matches)) => {
            let list_path = PathBuf::from(sub_matches.get_one::<String>("config").expect("default"));
            let source = PathBuf::from(sub_matches.get_one::<String>("source").expect("required"));
            let dry_run = sub_matches.get_flag("dry-run");

            let config = match FleetConfig::load() {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("❌ Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            let servers = match load_server_list(&list_path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("❌ {:#}", e);
                    std::process::exit(1);
                }
            };

            let secrets = SecretStore::resolve(&servers);

            if let Err(e) = Deployer::run(&config, &servers, &secrets, &source, dry_run).await {
                eprintln!("❌ Deployment failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(("notify", sub_matches)) => {
            let server = sub_matches.get_one::<String>("server").expect("required");
            let message = sub_matches.get_one::<String>("message").expect("default");

            if !Notifier::say(server, message).await {
                std::process::exit(1);
            }
        }
        Some(("registry", _)) => {
            let config = match FleetConfig::load() {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("❌ Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };
            let path = match config.registry_file() {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };

            match RconRegistry::read(&path) {
                Ok(entries) if entries.is_empty() => {
                    println!("Registry is empty ({})", path.display());
                }
                Ok(entries) => {
                    println!("📇 {} ({} entries)", path.display(), entries.len());
                    for entry in entries {
                        println!(
                            "[{}] {}:{} password {}",
                            entry.name,
                            entry.hostname,
                            entry.port,
                            mask(&entry.password)
                        );
                    }
                }
                Err(e) => {
                    eprintln!("❌ Failed to read registry: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(("history", sub_matches)) => {
            let limit: usize = sub_matches
                .get_one::<String>("limit")
                .expect("default")
                .parse()
                .unwrap_or(20);

            let log = DeployLog::load();
            if log.entries.is_empty() {
                println!("No deployments recorded yet");
            } else {
                for record in log.recent(limit) {
                    println!(
                        "{}  {}  {}:{}  {}",
                        record.timestamp,
                        record.server,
                        record.host,
                        record.port,
                        if record.notified {
                            "notified"
                        } else {
                            "not notified"
                        }
                    );
                }
            }
        }
        Some(("doctor", sub_matches)) => {
            let list_path = PathBuf::from(sub_matches.get_one::<String>("config").expect("default"));

            let config = FleetConfig::load().unwrap_or_default();
            let registry_path = match config.registry_file() {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            };

            println!("🩺 fleetdeploy doctor");
            let report = FleetDoctor::new().run(&list_path, &registry_path);
            for check in &report.checks {
                let icon = match check.status {
                    CheckStatus::Pass => "✅",
                    CheckStatus::Warning => "⚠️ ",
                    CheckStatus::Fail => "❌",
                };
                println!("{} {}: {}", icon, check.name, check.message);
            }
            if report.overall_health == CheckStatus::Fail {
                std::process::exit(1);
            }
        }
        _ => {}
    }
}

fn mask(password: &str) -> String {
    "*".repeat(password.chars().count().clamp(4, 12))
}
