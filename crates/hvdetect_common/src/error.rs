//! Evidence errors
//!
//! The only error class at this layer. Probes absorb every variant and
//! report an empty identifier instead of failing the detection.

use std::path::PathBuf;
use std::time::Duration;

/// A signal source could not be read
#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("permission denied reading {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("{program} exited with status {code:?}")]
    CommandFailed { program: String, code: Option<i32> },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

impl EvidenceError {
    /// Wrap an I/O error for `path`, keeping the common kinds distinguishable
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Missing sources are the normal case on most hosts
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CommandNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_from_io_kinds() {
        let err = EvidenceError::from_io("/proc/vz", Error::from(ErrorKind::NotFound));
        assert!(matches!(err, EvidenceError::NotFound { .. }));
        assert!(err.is_absent());

        let err = EvidenceError::from_io("/proc/vz", Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(err, EvidenceError::PermissionDenied { .. }));
        assert!(!err.is_absent());

        let err = EvidenceError::from_io("/proc/vz", Error::from(ErrorKind::InvalidData));
        assert!(matches!(err, EvidenceError::Io { .. }));
    }

    #[test]
    fn test_display_includes_path() {
        let err = EvidenceError::NotFound { path: PathBuf::from("/proc/self/cgroup") };
        assert_eq!(err.to_string(), "/proc/self/cgroup does not exist");
    }
}
