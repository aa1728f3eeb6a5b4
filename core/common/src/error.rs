//! Common error types for Lockbox.

use thiserror::Error;

/// Top-level error type for Lockbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No vault exists at the configured location.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage-layer damage: missing salt, or decrypted bytes that do not
    /// parse as a vault document.
    #[error("Vault corrupted: {0}")]
    Corrupted(String),

    /// MAC verification failed. Wrong password and tampered ciphertext are
    /// reported identically.
    #[error("Decryption failed: wrong password or corrupted data")]
    Decryption,

    /// Operation requires an unlocked vault.
    #[error("Vault is locked")]
    Locked,

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A serialized record carried a type tag this build does not know.
    #[error("Unknown record variant: {0}")]
    UnknownVariant(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Cryptographic operation failed for a reason other than authentication.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Import or export failed; the original error is chained.
    #[error("Import/export failed: {message}")]
    ImportExport {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap an error as an import/export failure, keeping the cause.
    pub fn import_export(message: impl Into<String>, source: Error) -> Self {
        Self::ImportExport {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
