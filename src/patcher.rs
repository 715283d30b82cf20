use anyhow::{Context, Result};
use regex::{Captures, Regex};
use secrecy::ExposeSecret;
use std::fs;
use std::path::Path;

use crate::secrets::{ServerSecrets, SharedSecrets};

pub struct ConfigPatcher;

impl ConfigPatcher {
    /// Rewrite the five managed cvars in the server config with the
    /// resolved secret values. Every other line is preserved byte for
    /// byte; a missing config file is an error and aborts the run.
    pub fn patch(cfg_path: &Path, shared: &SharedSecrets, server: &ServerSecrets) -> Result<()> {
        let original = fs::read_to_string(cfg_path)
            .with_context(|| format!("Failed to read server config: {}", cfg_path.display()))?;

        let mut patched = original.clone();
        for (key, value) in [
            ("hostname", server.hostname.as_str()),
            ("sv_password", shared.sv_password.expose_secret()),
            ("rcon_password", server.rcon_password.expose_secret()),
            ("sm_demostf_apikey", shared.demostf_apikey.expose_secret()),
            ("logstf_apikey", shared.logstf_apikey.expose_secret()),
        ] {
            patched = replace_cvar(&patched, key, value)?;
        }

        if patched != original {
            fs::write(cfg_path, patched)
                .with_context(|| format!("Failed to write server config: {}", cfg_path.display()))?;
        }

        Ok(())
    }
}

/// Replace the quoted value on the `key "value"` line. The whitespace
/// between key and value is captured and kept, so column alignment
/// survives the rewrite. The replacement goes through a closure, which
/// keeps the inserted value literal no matter what it contains.
fn replace_cvar(content: &str, key: &str, value: &str) -> Result<String> {
    let pattern = format!(r#"(?m)^({}[ \t]+)"[^"]*""#, regex::escape(key));
    let re = Regex::new(&pattern).context("Invalid cvar pattern")?;

    let mut hits = 0;
    let rewritten = re.replace_all(content, |caps: &Captures| {
        hits += 1;
        format!("{}\"{}\"", &caps[1], value)
    });

    if hits == 0 {
        println!("   ⚠️  No '{}' line found in config, key left unmanaged", key);
    }

    Ok(rewritten.into_owned())
}
