//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Open a file for streaming reads.
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Editor abstraction for opening files.
pub trait Editor: Send + Sync {
    /// Open a file in the editor.
    /// Blocks until editor exits.
    fn open(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

/// Real editor implementation using the configured command, $VISUAL, $EDITOR, or vim.
#[derive(Debug, Default)]
pub struct EnvironmentEditor {
    command: Option<String>,
}

impl EnvironmentEditor {
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
        }
    }
}

impl Editor for EnvironmentEditor {
    fn open(&self, path: &Path) -> io::Result<()> {
        use std::process::Command;

        // Determine editor: configured > $VISUAL > $EDITOR > vim
        let editor = self
            .command
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| "vim".to_string());

        let status = Command::new(&editor).arg(path).status()?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("editor exited with status: {}", status),
            ))
        }
    }
}
