use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

pub struct FileSync;

impl FileSync {
    /// One-way mirror of the canonical tree into a server installation,
    /// delegated to the system rsync. Additive by default: files only on
    /// the destination survive unless `delete` is set.
    pub async fn mirror(source: &Path, dest: &Path, delete: bool, dry_run: bool) -> Result<()> {
        if dry_run {
            println!(
                "   [DRY RUN] Would rsync {} -> {}",
                source.display(),
                dest.display()
            );
            return Ok(());
        }

        // Trailing slash on the source: copy the tree's contents, not the
        // directory itself.
        let src_arg = format!("{}/", source.display());

        let mut rsync = Command::new("rsync");
        rsync.arg("-a");
        if delete {
            rsync.arg("--delete");
        }
        rsync.arg(&src_arg).arg(dest);

        let output = rsync
            .output()
            .await
            .context("Failed to launch rsync (is it installed?)")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "rsync failed (exit: {:?}): {}",
                output.status.code(),
                stderr.trim()
            ));
        }

        Ok(())
    }
}
