//! The crate's single error channel. Every fallible public entry point
//! returns `Result<T, TLSError>` -- there is no other exception channel.

use std::fmt;

use crate::wire::enums::AlertDescription;

/// A single discriminated error type covering decode failures, protocol
/// violations and wrapped key-exchange errors. Internal-invariant
/// violations (reading `version` before it's set, reading a handshake
/// field with no handshake in progress) are not represented here: they
/// are programmer bugs and panic instead, per the design notes.
#[derive(Debug)]
pub enum TLSError {
    /// Malformed wire bytes. Always fatal at the protocol level.
    Decode(String),
    /// A semantic protocol violation: bad Finished MAC, renegotiation
    /// mismatch, missing certificate, etc. `fatal` and `alert` describe
    /// how the caller should respond on the wire.
    Protocol {
        message: String,
        fatal: bool,
        alert: AlertDescription,
    },
    /// A wrapped key-exchange error. Note that RSA decrypt failure during
    /// ClientKeyExchange is *not* surfaced this way -- see `kx::rsa_decrypt`
    /// and the anti-rollback countermeasure. This variant exists for the
    /// other key-exchange operations that may legitimately fail loudly
    /// (e.g. signature verification plumbing errors, not signature
    /// mismatches, which return `Ok(false)`).
    Kx(String),
}

impl TLSError {
    pub fn protocol(message: impl Into<String>, fatal: bool, alert: AlertDescription) -> Self {
        TLSError::Protocol {
            message: message.into(),
            fatal,
            alert,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        TLSError::Decode(message.into())
    }
}

impl fmt::Display for TLSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TLSError::Decode(msg) => write!(f, "decode error: {msg}"),
            TLSError::Protocol {
                message,
                fatal,
                alert,
            } => write!(
                f,
                "protocol error: {message} (fatal={fatal}, alert={alert:?})"
            ),
            TLSError::Kx(msg) => write!(f, "key exchange error: {msg}"),
        }
    }
}

impl std::error::Error for TLSError {}

impl From<rsa::Error> for TLSError {
    fn from(err: rsa::Error) -> Self {
        TLSError::Kx(err.to_string())
    }
}
