use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One `[name]` section of the rcon client's registry file
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub password: String,
}

pub struct RconRegistry;

impl RconRegistry {
    /// Parse every section of the registry. A missing file is an empty
    /// registry, not an error.
    pub fn read(path: &Path) -> Result<Vec<RegistryEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;
        Ok(parse(&content))
    }

    /// The password currently on record for `name`, if any
    pub fn current_password(path: &Path, name: &str) -> Option<String> {
        let entries = Self::read(path).ok()?;
        entries
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.password)
    }

    /// Create or update the entry for `name`. A new server gets a full
    /// section appended; an existing one only has its password line
    /// rewritten, leaving hostname/port and every other section alone.
    /// The file is always replaced via a temp file in the same directory
    /// so an interrupted run cannot truncate it.
    pub fn upsert(
        path: &Path,
        name: &str,
        hostname: &str,
        port: u16,
        password: &str,
    ) -> Result<()> {
        let content = if path.exists() {
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry: {}", path.display()))?
        } else {
            String::new()
        };

        let updated = upsert_content(&content, name, hostname, port, password);
        write_atomic(path, &updated)
    }
}

fn parse(content: &str) -> Vec<RegistryEntry> {
    let mut entries = Vec::new();
    let mut current: Option<RegistryEntry> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(RegistryEntry {
                name: line[1..line.len() - 1].to_string(),
                hostname: String::new(),
                port: 0,
                password: String::new(),
            });
            continue;
        }
        if let Some(entry) = current.as_mut() {
            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "hostname" => entry.hostname = value.trim().to_string(),
                    "port" => entry.port = value.trim().parse().unwrap_or(0),
                    "password" => entry.password = value.trim().to_string(),
                    _ => {}
                }
            }
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    entries
}

fn upsert_content(content: &str, name: &str, hostname: &str, port: u16, password: &str) -> String {
    let header = format!("[{}]", name);
    let lines: Vec<&str> = content.lines().collect();

    let Some(start) = lines.iter().position(|l| l.trim() == header) else {
        // New server: append a full section
        let mut out = content.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!(
            "[{}]\nhostname = {}\nport = {}\npassword = {}\n",
            name, hostname, port, password
        ));
        return out;
    };

    // Existing server: rewrite only the password line between this header
    // and the next one. The scan also terminates at end of file, so a
    // trailing section without a following header is handled.
    let mut out_lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
    for line in out_lines.iter_mut().skip(start + 1) {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            break;
        }
        if let Some(rest) = trimmed.strip_prefix("password") {
            if rest.trim_start().starts_with('=') {
                *line = format!("password = {}", password);
                break;
            }
        }
    }

    let mut out = out_lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create registry directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .context("Failed to create temp file for registry rewrite")?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write registry temp file")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace registry: {}", path.display()))?;
    Ok(())
}
