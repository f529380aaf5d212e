//! Writes assembled artifacts below an output root.
//!
//! Each file goes through a temporary file in the destination directory and
//! is persisted over the target, so a crash never leaves a half written file.
//! A differing file that already exists is moved to `<file>.bak` first when
//! backups are enabled.

use crate::config::WriterConfig;
use crate::errors::{AppError, AppResult, ErrorContextExt};
use crate::render::{validate_path, Artifact};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// What a write pass did (or would do, in dry-run mode)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub backed_up: Vec<PathBuf>,
    pub dry_run: bool,
}

impl WriteReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.unchanged.is_empty()
    }
}

/// File-writer collaborator for the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileWriter {
    backup: bool,
    dry_run: bool,
}

impl Default for FileWriter {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
        }
    }
}

impl FileWriter {
    pub fn new(backup: bool, dry_run: bool) -> Self {
        Self { backup, dry_run }
    }

    pub fn from_config(config: &WriterConfig) -> Self {
        Self::new(config.backup, config.dry_run)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write every artifact below `root`, in order.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactPath` for a path that would leave `root` and `Io` when
    /// a directory, backup or file cannot be written. Files written before
    /// the failure stay in place.
    pub fn write_all(&self, root: &Path, artifacts: &[Artifact]) -> AppResult<WriteReport> {
        let mut report = WriteReport {
            dry_run: self.dry_run,
            ..WriteReport::default()
        };

        for artifact in artifacts {
            validate_path(&artifact.path)?;
            let target = root.join(&artifact.path);
            self.write_one(&target, artifact, &mut report)?;
        }

        info!(
            root = %root.display(),
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            dry_run = self.dry_run,
            "artifacts written"
        );
        Ok(report)
    }

    fn write_one(&self, target: &Path, artifact: &Artifact, report: &mut WriteReport) -> AppResult<()> {
        let existing = match fs::read(target) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(AppError::io_with_source(target, "read existing file", e)),
        };

        if existing.as_deref() == Some(artifact.content.as_bytes()) {
            if artifact.executable && !self.dry_run {
                set_executable(target)?;
            }
            debug!(path = %target.display(), "unchanged");
            report.unchanged.push(target.to_path_buf());
            return Ok(());
        }

        let backup = (existing.is_some() && self.backup).then(|| backup_path(target));
        if self.dry_run {
            debug!(path = %target.display(), "would write");
            report.written.push(target.to_path_buf());
            report.backed_up.extend(backup);
            return Ok(());
        }

        let parent = target
            .parent()
            .ok_or_else(|| AppError::io(target, "resolve parent directory"))?;
        fs::create_dir_all(parent).in_file_operation(parent, "create directory")?;

        if let Some(backup) = backup {
            fs::rename(target, &backup).in_file_operation(&backup, "create backup")?;
            debug!(path = %backup.display(), "backed up");
            report.backed_up.push(backup);
        }

        let mut file = NamedTempFile::new_in(parent).in_file_operation(parent, "create temporary file")?;
        file.write_all(artifact.content.as_bytes())
            .in_file_operation(target, "write")?;
        if artifact.executable {
            set_executable(file.path())?;
        }
        file.persist(target)
            .map_err(|e| AppError::io_with_source(target, "persist", e.error))?;

        debug!(path = %target.display(), executable = artifact.executable, "written");
        report.written.push(target.to_path_buf());
        Ok(())
    }
}

fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> AppResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .in_file_operation(path, "set permissions")
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> AppResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ArtifactKind;
    use tempfile::TempDir;

    fn artifacts(body: &str) -> Vec<Artifact> {
        vec![
            Artifact::new("bin/cli.js", body, ArtifactKind::EntryPoint, "entry").executable(),
            Artifact::new("package.json", "{}", ArtifactKind::Manifest, "manifest"),
        ]
    }

    #[test]
    fn test_writes_files_and_directories() {
        let dir = TempDir::new().unwrap();
        let report = FileWriter::default().write_all(dir.path(), &artifacts("v1")).unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("bin/cli.js")).unwrap(), "v1");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("bin/cli.js")).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_unchanged_and_backup() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::default();
        writer.write_all(dir.path(), &artifacts("v1")).unwrap();

        let again = writer.write_all(dir.path(), &artifacts("v1")).unwrap();
        assert!(again.written.is_empty());
        assert_eq!(again.unchanged.len(), 2);

        let changed = writer.write_all(dir.path(), &artifacts("v2")).unwrap();
        assert_eq!(changed.written, vec![dir.path().join("bin/cli.js")]);
        assert_eq!(changed.backed_up, vec![dir.path().join("bin/cli.js.bak")]);
        assert_eq!(fs::read_to_string(dir.path().join("bin/cli.js.bak")).unwrap(), "v1");
        assert_eq!(fs::read_to_string(dir.path().join("bin/cli.js")).unwrap(), "v2");
    }

    #[test]
    fn test_no_backup_when_disabled() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(false, false);
        writer.write_all(dir.path(), &artifacts("v1")).unwrap();
        let report = writer.write_all(dir.path(), &artifacts("v2")).unwrap();
        assert!(report.backed_up.is_empty());
        assert!(!dir.path().join("bin/cli.js.bak").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let report = FileWriter::new(true, true)
            .write_all(dir.path(), &artifacts("v1"))
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.written.len(), 2);
        assert!(!dir.path().join("bin").exists());
        assert!(!dir.path().join("package.json").exists());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        let bad = vec![Artifact::new("../evil.sh", "x", ArtifactKind::Bootstrap, "bootstrap")];
        let err = FileWriter::default().write_all(dir.path(), &bad).unwrap_err();
        assert!(matches!(err, AppError::ArtifactPath { .. }));
    }
}
