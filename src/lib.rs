//! Receive-side TLS handshake state machine and per-connection session
//! state. See the module docs on `session`, `record`, and `handshake` for
//! the pieces that do the actual protocol work; `wire` is the minimal
//! in-crate codec everything else decodes through.

pub mod crypto;
pub mod error;
pub mod handshake;
pub mod kx;
pub mod record;
pub mod rng;
pub mod session;
pub mod state;
pub mod wire;

pub use error::TLSError;
pub use handshake::{handle_client_key_exchange, process_handshake, process_server_hello, verify_rsa};
pub use record::{process_packet, Packet, Record};
pub use session::{ConnectionConfig, Role, SessionState};
pub use state::{run, TlsState};
