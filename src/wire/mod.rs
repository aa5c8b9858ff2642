//! The wire codec: a minimal, in-crate implementation of the "consumed"
//! collaborator named by the core's external interfaces (§6). Only the
//! message types and extensions this spec names are modeled structurally;
//! everything else round-trips as opaque, type-tagged bytes.

pub mod alert;
pub mod codec;
pub mod enums;
pub mod extension;
pub mod handshake;

pub use alert::{decode_alerts, decode_change_cipher_spec, Alert};
pub use extension::{extension_encode_client, extension_encode_server};
pub use handshake::{
    decode_deprecated_handshake, decode_handshake, decode_handshakes, decode_premaster_secret,
    encode_handshake, CurrentParams, Handshake,
};
