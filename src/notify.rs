use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;

pub struct Notifier;

impl Notifier {
    /// Chat notification after a deployment. Best effort: every outcome
    /// reduces to delivered-or-not, and nothing here fails the run.
    ///
    /// The first attempt lets the rcon client resolve connection details
    /// from the registry entry that was just written (i.e. the new
    /// password). If the password was rotated this run, the server
    /// process may still hold the old one in memory until it reloads its
    /// config, so a failed first attempt is retried with explicit
    /// connection parameters and the previous password.
    pub async fn notify(
        name: &str,
        message: &str,
        hostname: &str,
        port: u16,
        new_password: &SecretString,
        old_password: Option<&str>,
        dry_run: bool,
    ) -> bool {
        if dry_run {
            println!("   [DRY RUN] Would rcon say to {}: {}", name, message);
            return true;
        }

        if !Self::client_available().await {
            println!("   ⚠️  rcon client not found, skipping notification");
            return false;
        }

        match Self::say_registry(name, message).await {
            Ok(()) => {
                println!("   📡 {} notified", name);
                return true;
            }
            Err(e) => {
                println!("   ⚠️  Notification via registry failed: {}", e);
            }
        }

        if let Some(old) = old_password {
            if old != new_password.expose_secret() {
                println!("   🔁 Retrying with previous password (rotation window)...");
                match Self::say_direct(hostname, port, old, message).await {
                    Ok(()) => {
                        println!("   📡 {} notified (previous password)", name);
                        return true;
                    }
                    Err(e) => {
                        println!("   ⚠️  Retry failed: {}", e);
                    }
                }
            }
        }

        println!("   ⚠️  Could not notify {}, continuing", name);
        false
    }

    /// One-off say to a single server through its registry entry
    pub async fn say(name: &str, message: &str) -> bool {
        if !Self::client_available().await {
            println!("⚠️  rcon client not found, skipping notification");
            return false;
        }
        match Self::say_registry(name, message).await {
            Ok(()) => {
                println!("📡 {} notified", name);
                true
            }
            Err(e) => {
                println!("⚠️  Could not notify {}: {}", name, e);
                false
            }
        }
    }

    // output() only errors when the spawn itself fails, which is the
    // binary-missing case we care about here
    async fn client_available() -> bool {
        Command::new("rcon").arg("--version").output().await.is_ok()
    }

    async fn say_registry(name: &str, message: &str) -> Result<()> {
        let output = Command::new("rcon")
            .arg("-s")
            .arg(name)
            .arg(format!("say {}", message))
            .output()
            .await?;
        check_status(&output)
    }

    async fn say_direct(hostname: &str, port: u16, password: &str, message: &str) -> Result<()> {
        let output = Command::new("rcon")
            .arg("-H")
            .arg(hostname)
            .arg("-p")
            .arg(port.to_string())
            .arg("-P")
            .arg(password)
            .arg(format!("say {}", message))
            .output()
            .await?;
        check_status(&output)
    }
}

fn check_status(output: &std::process::Output) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::anyhow!(
            "rcon exited with {:?}: {}",
            output.status.code(),
            stderr.trim()
        ));
    }
    Ok(())
}
