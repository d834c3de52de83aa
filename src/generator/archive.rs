//! Archive staging and extraction
//!
//! The dropped game archive is copied into a scratch directory and unpacked
//! there by the external `farcpack` tool, so the original file is never
//! touched and a failed run leaves nothing behind next to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::constants::farc;

/// Validate the configured unpack tool path: it must exist and actually be
/// the expected tool, not some arbitrary executable.
pub fn validate_tool_path(configured: &str) -> Result<PathBuf> {
    if configured.trim().is_empty() {
        bail!("No unpack tool configured");
    }
    let path = PathBuf::from(configured.trim());
    if !path.is_file() {
        bail!("Unpack tool not found: {}", path.display());
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !farc::TOOL_NAMES.contains(&name.as_str()) {
        bail!("Configured path is not the farcpack tool: {}", path.display());
    }
    Ok(path)
}

/// Create the scratch directory. On Windows it is marked hidden so it does
/// not clutter the install directory between runs.
pub fn prepare_temp_dir(temp_dir: &Path) -> Result<()> {
    fs::create_dir_all(temp_dir)
        .with_context(|| format!("Failed to create temp directory {}", temp_dir.display()))?;
    #[cfg(windows)]
    {
        let status = Command::new("attrib").arg("+h").arg(temp_dir).status();
        if !status.map(|s| s.success()).unwrap_or(false) {
            warn!(path = %temp_dir.display(), "Could not mark temp directory hidden");
        }
    }
    Ok(())
}

/// Copy the archive into the scratch directory, run the unpack tool on the
/// copy, and return the directory the tool extracted into (named after the
/// archive stem, next to the copy).
pub fn extract_archive(archive: &Path, tool: &Path, temp_dir: &Path) -> Result<PathBuf> {
    if !archive.is_file() {
        bail!("Dropped file does not exist: {}", archive.display());
    }
    let file_name = archive
        .file_name()
        .context("Dropped file has no name")?;
    let staged = temp_dir.join(file_name);
    fs::copy(archive, &staged)
        .with_context(|| format!("Failed to copy archive into {}", temp_dir.display()))?;
    info!(archive = %archive.display(), staged = %staged.display(), "Staged archive for extraction");

    let output = Command::new(tool)
        .arg(&staged)
        .current_dir(temp_dir)
        .output()
        .with_context(|| format!("Failed to run unpack tool {}", tool.display()))?;
    if !output.status.success() {
        bail!(
            "Unpack tool exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stem = staged
        .file_stem()
        .context("Archive has no file stem")?;
    let extracted = temp_dir.join(stem);
    if !extracted.is_dir() {
        bail!(
            "Unpack tool reported success but {} was not created",
            extracted.display()
        );
    }
    info!(dir = %extracted.display(), "Archive extracted");
    Ok(extracted)
}

/// Remove the scratch directory. Failures are logged, not fatal: a locked
/// temp file should never abort a run that already produced its output.
pub fn clean_temp_dir(temp_dir: &Path) {
    if !temp_dir.exists() {
        return;
    }
    match fs::remove_dir_all(temp_dir) {
        Ok(()) => info!(path = %temp_dir.display(), "Removed temp directory"),
        Err(err) => warn!(path = %temp_dir.display(), error = %err, "Failed to remove temp directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tool_path_empty() {
        assert!(validate_tool_path("").is_err());
        assert!(validate_tool_path("   ").is_err());
    }

    #[test]
    fn test_validate_tool_path_missing_file() {
        assert!(validate_tool_path("/nonexistent/farcpack.exe").is_err());
    }

    #[test]
    fn test_validate_tool_path_wrong_name() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("other.exe");
        fs::write(&other, b"").unwrap();
        assert!(validate_tool_path(other.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_validate_tool_path_accepts_farcpack() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["farcpack.exe", "farcpack"] {
            let tool = dir.path().join(name);
            fs::write(&tool, b"").unwrap();
            let validated = validate_tool_path(tool.to_str().unwrap()).unwrap();
            assert_eq!(validated, tool);
        }
        // Case-insensitive on the file name
        let upper = dir.path().join("FarcPack.exe");
        fs::write(&upper, b"").unwrap();
        assert!(validate_tool_path(upper.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_clean_temp_dir_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        clean_temp_dir(&dir.path().join("never_created"));
    }

    #[test]
    fn test_prepare_and_clean_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("Temp");
        prepare_temp_dir(&temp).unwrap();
        assert!(temp.is_dir());
        fs::write(temp.join("junk.bin"), b"x").unwrap();
        clean_temp_dir(&temp);
        assert!(!temp.exists());
    }
}
