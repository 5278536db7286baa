//! Error types for pkgstore
//!
//! All modules use `StoreResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pkgstore operations
pub type StoreResult<T> = Result<T, StoreError>;

/// All errors that can occur in pkgstore
#[derive(Error, Debug)]
pub enum StoreError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Repository errors
    #[error("Branch not found in mirror: {branch}")]
    RefNotFound { branch: String },

    #[error("Invalid branch name '{name}': {reason}")]
    InvalidRef { name: String, reason: String },

    // Archive build errors
    #[error("Symlink {link} points outside the archived tree to {target}, which does not exist")]
    UnsafeSymlinkBroken { link: PathBuf, target: PathBuf },

    // Resolution errors
    #[error("No revision with content found for package {target}")]
    NoRevision { target: String },

    #[error("Package {target} has no location named {name}")]
    LocationNotFound { target: String, name: String },

    #[error("File not found in archive: {path}")]
    FileNotFound { path: String },

    #[error("No command given")]
    EmptyCommand,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, exit code: {code:?}, output: {output}")]
    CommandExecution {
        command: String,
        code: Option<i32>,
        output: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error (the process could not be spawned)
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error (the process exited unsuccessfully)
    pub fn command_exec(
        command: impl Into<String>,
        code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::CommandExecution {
            command: command.into(),
            code,
            output: output.into(),
        }
    }

    /// Create an invalid path error
    pub fn path_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only says that a branch does not exist
    pub fn is_ref_not_found(&self) -> bool {
        matches!(self, Self::RefNotFound { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RefNotFound { .. } => Some("List available branches with: pkgstore branches"),
            Self::UnsafeSymlinkBroken { .. } => {
                Some("Fix or remove the dangling symlink in the repository and push again")
            }
            Self::NoRevision { .. } => {
                Some("Push a main branch for the package, e.g. <package>/main")
            }
            Self::LocationNotFound { .. } => {
                Some("List the package's locations with: pkgstore locations <package>")
            }
            Self::ConfigInvalid { .. } => Some("Inspect the configuration with: pkgstore config show"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::RefNotFound {
            branch: "main".to_string(),
        };
        assert!(err.to_string().contains("Branch not found"));
        assert!(err.to_string().contains("main"));
    }

    #[test]
    fn error_hint() {
        let err = StoreError::RefNotFound {
            branch: "main".to_string(),
        };
        assert_eq!(
            err.hint(),
            Some("List available branches with: pkgstore branches")
        );
        assert_eq!(StoreError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn ref_not_found_detection() {
        assert!(StoreError::RefNotFound {
            branch: "x".to_string()
        }
        .is_ref_not_found());
        assert!(!StoreError::command_exec("git rev-parse", Some(128), "fatal").is_ref_not_found());
    }

    #[test]
    fn command_exec_keeps_output() {
        let err = StoreError::command_exec("git clone", Some(128), "fatal: not a git repository");
        let msg = err.to_string();
        assert!(msg.contains("git clone"));
        assert!(msg.contains("Some(128)"));
        assert!(msg.contains("not a git repository"));
    }
}
