//! Error types for netat

use std::path::PathBuf;

use thiserror::Error;

/// netat error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The calling thread's own network namespace could not be opened
    #[error("Cannot determine origin namespace: {source}")]
    OriginLookup {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// `setns(2)` into the target namespace failed; the operation never ran
    #[error("Cannot enter target namespace: {source}")]
    EnterNamespace {
        /// Underlying errno
        #[source]
        source: nix::Error,
    },

    /// The confined operation failed; the thread was restored
    #[error("Operation failed in target namespace: {0}")]
    Operation(#[source] std::io::Error),

    /// The operation succeeded but the thread could not return to its origin namespace
    #[error("Cannot return to origin namespace: {source}")]
    RestoreNamespace {
        /// Underlying errno
        #[source]
        source: nix::Error,
    },

    /// Both the operation and the return to the origin namespace failed
    #[error("Error returning to origin namespace ({restore}) after operation failure: {operation}")]
    RestoreAfterOperation {
        /// Restore errno
        restore: nix::Error,
        /// Operation error
        #[source]
        operation: std::io::Error,
    },

    /// Network name not recognised
    #[error("Unsupported network: {network}")]
    UnsupportedNetwork {
        /// Network as given by the caller
        network: String,
    },

    /// Address could not be parsed for the requested network
    #[error("Invalid address {address:?}: {message}")]
    InvalidAddress {
        /// Address as given by the caller
        address: String,
        /// What is wrong with it
        message: String,
    },

    /// A namespace file could not be opened
    #[error("Cannot open namespace {}: {source}", .path.display())]
    OpenNamespace {
        /// Namespace path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation panicked on a dedicated confined thread
    #[error("Operation panicked in target namespace")]
    OperationPanicked,
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Origin namespace lookup failed
    OriginLookup,
    /// Entering the target namespace failed
    Enter,
    /// The confined operation failed
    Operation,
    /// Returning to the origin namespace failed (possibly alongside the operation)
    Restore,
    /// Caller input was rejected before any namespace switch
    InvalidInput,
    /// Anything else
    Other,
}

impl Error {
    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OriginLookup { .. } => ErrorKind::OriginLookup,
            Self::EnterNamespace { .. } => ErrorKind::Enter,
            Self::Operation(_) => ErrorKind::Operation,
            Self::RestoreNamespace { .. } | Self::RestoreAfterOperation { .. } => {
                ErrorKind::Restore
            }
            Self::UnsupportedNetwork { .. } | Self::InvalidAddress { .. } => {
                ErrorKind::InvalidInput
            }
            Self::OpenNamespace { .. } | Self::Io(_) | Self::OperationPanicked => ErrorKind::Other,
        }
    }

    /// True when the OS thread may have been left in a foreign namespace
    ///
    /// Such a thread must not be reused for namespace-sensitive work.
    #[must_use]
    pub const fn is_restore_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Restore)
    }

    /// The confined operation's own error, if it failed
    #[must_use]
    pub const fn operation_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Operation(e) | Self::RestoreAfterOperation { operation: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for netat operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;
    use std::io;

    #[test]
    fn test_combined_error_keeps_both_messages() {
        let err = Error::RestoreAfterOperation {
            restore: Errno::EBADF,
            operation: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };

        let msg = err.to_string();
        assert!(msg.contains("address in use"));
        assert!(msg.contains(&Errno::EBADF.to_string()));
        assert!(err.is_restore_failure());
        assert_eq!(
            err.operation_error().map(io::Error::kind),
            Some(io::ErrorKind::AddrInUse)
        );
    }

    #[test]
    fn test_error_kinds() {
        let origin = Error::OriginLookup {
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(origin.kind(), ErrorKind::OriginLookup);
        assert!(origin.to_string().starts_with("Cannot determine origin namespace"));

        let enter = Error::EnterNamespace {
            source: Errno::EPERM,
        };
        assert_eq!(enter.kind(), ErrorKind::Enter);
        assert!(!enter.is_restore_failure());
        assert!(enter.operation_error().is_none());

        let restore = Error::RestoreNamespace {
            source: Errno::EINVAL,
        };
        assert!(restore.is_restore_failure());
        assert!(restore.operation_error().is_none());

        let op = Error::Operation(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(op.kind(), ErrorKind::Operation);
        assert!(op.operation_error().is_some());
    }

    #[test]
    fn test_input_errors() {
        let err = Error::UnsupportedNetwork {
            network: "ip4".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "Unsupported network: ip4");
    }
}
