//! Test suite for the fleetdeploy crate
//! Covers secret resolution, config patching, the rcon registry, port
//! assignment, the deploy driver's skip/dry-run paths and doctor checks

#[cfg(test)]
mod secrets_tests {
    use crate::config::ServerEntry;
    use crate::secrets::{SecretStore, PLACEHOLDER};
    use secrecy::ExposeSecret;
    use std::path::PathBuf;

    fn entry(name: &str) -> ServerEntry {
        ServerEntry {
            name: name.to_string(),
            path: PathBuf::from("/srv/unused"),
        }
    }

    #[test]
    fn test_placeholder_when_env_missing() {
        let store = SecretStore::resolve(&[entry("ghostship")]);
        let secrets = store.for_server("ghostship").unwrap();
        assert_eq!(secrets.rcon_password.expose_secret(), PLACEHOLDER);
        assert_eq!(secrets.hostname, PLACEHOLDER);
    }

    #[test]
    fn test_per_server_env_uses_uppercased_name() {
        std::env::set_var("BADWATER_RCON", "hunter2");
        std::env::set_var("BADWATER_HOSTNAME", "Badwater #1");

        let store = SecretStore::resolve(&[entry("badwater")]);
        let secrets = store.for_server("badwater").unwrap();
        assert_eq!(secrets.rcon_password.expose_secret(), "hunter2");
        assert_eq!(secrets.hostname, "Badwater #1");
    }

    #[test]
    fn test_shared_env_resolution() {
        std::env::set_var("SV_PASSWORD", "joinpass");

        let store = SecretStore::resolve(&[]);
        assert_eq!(store.shared.sv_password.expose_secret(), "joinpass");
    }

    #[test]
    fn test_unlisted_server_has_no_secrets() {
        let store = SecretStore::resolve(&[entry("alpha")]);
        assert!(store.for_server("beta").is_none());
    }
}

#[cfg(test)]
mod patcher_tests {
    use crate::patcher::ConfigPatcher;
    use crate::secrets::{ServerSecrets, SharedSecrets};
    use secrecy::SecretString;
    use std::fs;
    use std::path::PathBuf;

    const BASE_CFG: &str = "// fleet base config\n\
hostname        \"old name\"\n\
sv_password     \"old\"\n\
rcon_password   \"old\"\n\
sm_demostf_apikey \"old\"\n\
logstf_apikey   \"old\"\n\
mp_timelimit    30\n\
sv_tags \"payload\"\n";

    fn secrets(
        hostname: &str,
        sv: &str,
        rcon: &str,
        demostf: &str,
        logstf: &str,
    ) -> (SharedSecrets, ServerSecrets) {
        (
            SharedSecrets {
                sv_password: SecretString::from(sv.to_string()),
                demostf_apikey: SecretString::from(demostf.to_string()),
                logstf_apikey: SecretString::from(logstf.to_string()),
            },
            ServerSecrets {
                rcon_password: SecretString::from(rcon.to_string()),
                hostname: hostname.to_string(),
            },
        )
    }

    fn write_cfg(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("server.cfg");
        fs::write(&cfg, content).unwrap();
        (dir, cfg)
    }

    #[test]
    fn test_patch_updates_managed_keys_and_keeps_alignment() {
        let (_dir, cfg) = write_cfg(BASE_CFG);
        let (shared, server) = secrets("Fleet #1", "join", "rconpw", "demokey", "logkey");

        ConfigPatcher::patch(&cfg, &shared, &server).unwrap();

        let content = fs::read_to_string(&cfg).unwrap();
        assert!(content.contains("hostname        \"Fleet #1\""));
        assert!(content.contains("sv_password     \"join\""));
        assert!(content.contains("rcon_password   \"rconpw\""));
        assert!(content.contains("sm_demostf_apikey \"demokey\""));
        assert!(content.contains("logstf_apikey   \"logkey\""));
    }

    #[test]
    fn test_patch_leaves_other_lines_untouched() {
        let (_dir, cfg) = write_cfg(BASE_CFG);
        let (shared, server) = secrets("h", "a", "b", "c", "d");

        ConfigPatcher::patch(&cfg, &shared, &server).unwrap();

        let content = fs::read_to_string(&cfg).unwrap();
        assert!(content.contains("// fleet base config\n"));
        assert!(content.contains("mp_timelimit    30\n"));
        // quoted value under an unmanaged key stays as-is
        assert!(content.contains("sv_tags \"payload\"\n"));
    }

    #[test]
    fn test_patch_special_characters_land_literally() {
        let (_dir, cfg) = write_cfg(BASE_CFG);
        let (shared, server) = secrets("h", "a/b&c$1\\d", "li\nne", "c", "d");

        ConfigPatcher::patch(&cfg, &shared, &server).unwrap();

        let content = fs::read_to_string(&cfg).unwrap();
        assert!(content.contains("sv_password     \"a/b&c$1\\d\""));
        assert!(content.contains("rcon_password   \"li\nne\""));
    }

    #[test]
    fn test_patch_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let (shared, server) = secrets("h", "a", "b", "c", "d");

        let result = ConfigPatcher::patch(&dir.path().join("nope.cfg"), &shared, &server);
        assert!(result.is_err(), "Missing config file must abort");
    }
}

#[cfg(test)]
mod registry_tests {
    use crate::registry::{RconRegistry, RegistryEntry};
    use std::fs;

    #[test]
    fn test_new_section_appended() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");

        RconRegistry::upsert(&reg, "alpha", "alpha.example.net", 27015, "pw1").unwrap();

        let entries = RconRegistry::read(&reg).unwrap();
        assert_eq!(
            entries,
            vec![RegistryEntry {
                name: "alpha".to_string(),
                hostname: "alpha.example.net".to_string(),
                port: 27015,
                password: "pw1".to_string(),
            }]
        );
    }

    #[test]
    fn test_upsert_existing_touches_only_password() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");
        fs::write(
            &reg,
            "[alpha]\nhostname = alpha.example.net\nport = 27015\npassword = old\n\n\
[beta]\nhostname = beta.example.net\nport = 27016\npassword = betapw\n",
        )
        .unwrap();

        RconRegistry::upsert(&reg, "alpha", "other.example.net", 28000, "new").unwrap();

        let content = fs::read_to_string(&reg).unwrap();
        // hostname and port keep their recorded values, not the new ones
        assert!(content.contains("hostname = alpha.example.net"));
        assert!(content.contains("port = 27015"));
        assert!(content.contains("password = new"));
        // the other section is untouched
        assert!(content.contains(
            "[beta]\nhostname = beta.example.net\nport = 27016\npassword = betapw\n"
        ));
    }

    #[test]
    fn test_rerun_does_not_duplicate_section() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");

        RconRegistry::upsert(&reg, "alpha", "h", 27015, "pw1").unwrap();
        RconRegistry::upsert(&reg, "alpha", "h", 27015, "pw2").unwrap();

        let entries = RconRegistry::read(&reg).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].password, "pw2");
    }

    #[test]
    fn test_trailing_section_without_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");
        // no trailing newline and no following header
        fs::write(&reg, "[alpha]\nhostname = h\nport = 27015\npassword = old").unwrap();

        RconRegistry::upsert(&reg, "alpha", "h", 27015, "new").unwrap();

        let entries = RconRegistry::read(&reg).unwrap();
        assert_eq!(entries[0].password, "new");
    }

    #[test]
    fn test_password_scan_stops_at_next_section() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");
        // alpha is malformed: no password line of its own
        fs::write(
            &reg,
            "[alpha]\nhostname = h\nport = 27015\n[beta]\nhostname = b\nport = 27016\npassword = betapw\n",
        )
        .unwrap();

        RconRegistry::upsert(&reg, "alpha", "h", 27015, "new").unwrap();

        let entries = RconRegistry::read(&reg).unwrap();
        let beta = entries.iter().find(|e| e.name == "beta").unwrap();
        assert_eq!(beta.password, "betapw", "Scan must not cross into beta");
    }

    #[test]
    fn test_current_password() {
        let dir = tempfile::tempdir().unwrap();
        let reg = dir.path().join("rconrc");

        assert_eq!(RconRegistry::current_password(&reg, "alpha"), None);

        RconRegistry::upsert(&reg, "alpha", "h", 27015, "pw1").unwrap();
        assert_eq!(
            RconRegistry::current_password(&reg, "alpha"),
            Some("pw1".to_string())
        );
    }
}

#[cfg(test)]
mod config_tests {
    use crate::config::{load_server_list, FleetConfig};
    use std::fs;

    #[test]
    fn test_config_defaults_materialize() {
        let config: FleetConfig = toml::from_str("").unwrap();
        assert_eq!(config.base_port, 27015);
        assert_eq!(config.server_cfg_path, "tf/cfg/server.cfg");
        assert!(config.registry_path.is_none());
        assert!(!config.rsync_delete);
    }

    #[test]
    fn test_server_list_order_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("servers.json");
        fs::write(
            &list,
            r#"[{"name":"alpha","path":"/srv/a"},{"name":"beta","path":"/srv/b"}]"#,
        )
        .unwrap();

        let servers = load_server_list(&list).unwrap();
        let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_server_list_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_server_list(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_server_list_bad_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("servers.json");
        fs::write(&list, "{not json").unwrap();
        assert!(load_server_list(&list).is_err());
    }
}

#[cfg(test)]
mod deploy_tests {
    use crate::config::{FleetConfig, ServerEntry};
    use crate::deploy::{DeployOutcome, Deployer};
    use crate::secrets::SecretStore;

    #[test]
    fn test_port_assignment_is_positional() {
        assert_eq!(Deployer::port_for(27015, 0), 27015);
        assert_eq!(Deployer::port_for(27015, 1), 27016);
        assert_eq!(Deployer::port_for(28000, 5), 28005);
    }

    #[tokio::test]
    async fn test_missing_path_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let entry = ServerEntry {
            name: "ghost".to_string(),
            path: dir.path().join("missing"),
        };
        let secrets = SecretStore::resolve(std::slice::from_ref(&entry));
        let config = FleetConfig::default();
        let registry = dir.path().join("rconrc");

        let outcome = Deployer::deploy_server(
            &config, &entry, 0, &secrets, dir.path(), &registry, false,
        )
        .await
        .unwrap();

        assert_eq!(outcome, DeployOutcome::Skipped);
        assert!(!registry.exists(), "Skipped server must not touch registry");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let install = dir.path().join("srv");
        std::fs::create_dir_all(&install).unwrap();
        let entry = ServerEntry {
            name: "drytest".to_string(),
            path: install,
        };
        let secrets = SecretStore::resolve(std::slice::from_ref(&entry));
        let config = FleetConfig::default();
        let registry = dir.path().join("rconrc");

        let outcome = Deployer::deploy_server(
            &config, &entry, 0, &secrets, dir.path(), &registry, true,
        )
        .await
        .unwrap();

        match outcome {
            DeployOutcome::Deployed { port, .. } => assert_eq!(port, 27015),
            DeployOutcome::Skipped => panic!("Existing path must not be skipped"),
        }
        assert!(!registry.exists(), "Dry run must not write the registry");
    }
}

#[cfg(test)]
mod doctor_tests {
    use crate::doctor::{CheckStatus, FleetDoctor};

    #[test]
    fn test_missing_server_list_fails_doctor() {
        let dir = tempfile::tempdir().unwrap();
        let report = FleetDoctor::new().run(
            &dir.path().join("nope.json"),
            &dir.path().join("rconrc"),
        );
        assert_eq!(report.overall_health, CheckStatus::Fail);
    }

    #[test]
    fn test_doctor_reports_all_checks() {
        let dir = tempfile::tempdir().unwrap();
        let report = FleetDoctor::new().run(
            &dir.path().join("servers.json"),
            &dir.path().join("rconrc"),
        );
        assert_eq!(report.checks.len(), 4);
    }
}

#[cfg(test)]
mod log_tests {
    use crate::{DeployLog, DeployRecord};

    fn record(server: &str) -> DeployRecord {
        DeployRecord {
            timestamp: "2026-01-01 12:00:00".to_string(),
            server: server.to_string(),
            host: "h".to_string(),
            port: 27015,
            notified: true,
        }
    }

    #[test]
    fn test_recent_returns_newest_first() {
        let mut log = DeployLog::default();
        log.entries.push(record("alpha"));
        log.entries.push(record("beta"));

        let recent = log.recent(1);
        assert_eq!(recent[0].server, "beta");
    }

    #[test]
    fn test_trim_caps_entries() {
        let mut log = DeployLog::default();
        for i in 0..1100 {
            log.entries.push(record(&format!("srv{}", i)));
        }

        let trimmed = log.trimmed();
        assert_eq!(trimmed.entries.len(), 1000);
        assert_eq!(trimmed.entries.first().unwrap().server, "srv100");
    }
}
