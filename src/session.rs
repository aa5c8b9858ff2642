//! The per-connection session state (§3) and the handshake substate scoped
//! to one in-progress handshake.

use ring::digest;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Serialize;

use crate::error::TLSError;
use crate::rng::RandomGen;
use crate::wire::enums::{AlertDescription, ProtocolVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Client,
    Server,
}

/// The key-exchange kind of the currently pending cipher, if any has been
/// negotiated yet. Only RSA key exchange is modeled structurally -- this
/// is the one §4.6 needs to drive the anti-rollback countermeasure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KxAlgorithm {
    Rsa,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingCipher {
    pub suite: u16,
    pub kx: KxAlgorithm,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionId {
    pub id: Vec<u8>,
    pub resuming: bool,
}

/// The running handshake transcript: the ordered raw bytes that feed
/// CertificateVerify (`handshake_messages`) and the incremental digest that
/// feeds Finished (`handshake_digest`). Kept distinct because invariant 3
/// requires each to be driven by its own, fixed material set.
pub struct Transcript {
    pub handshake_messages: Vec<u8>,
    digest_ctx: digest::Context,
    max_messages: usize,
}

impl Transcript {
    pub fn new(max_messages: usize) -> Self {
        Transcript {
            handshake_messages: Vec::new(),
            digest_ctx: digest::Context::new(&digest::SHA256),
            max_messages,
        }
    }

    /// Appends `bytes` to `handshake_messages`. Fails rather than silently
    /// truncating if the soft cap would be exceeded -- a truncated
    /// transcript would make the CertificateVerify signature cover less
    /// than what actually happened on the wire.
    pub fn add_message(&mut self, bytes: &[u8]) -> Result<(), TLSError> {
        if self.handshake_messages.len() + bytes.len() > self.max_messages {
            return Err(TLSError::protocol(
                "handshake transcript exceeded the configured maximum size",
                true,
                AlertDescription::InternalError,
            ));
        }
        self.handshake_messages.extend_from_slice(bytes);
        Ok(())
    }

    pub fn update_digest(&mut self, bytes: &[u8]) {
        self.digest_ctx.update(bytes);
    }

    /// A snapshot of the current running hash without consuming the
    /// context -- needed because both sides' Finished verify-data are
    /// computed from the transcript hash *at different points* in the
    /// handshake, and the digest keeps accumulating afterwards.
    pub fn current_digest(&self) -> digest::Digest {
        self.digest_ctx.clone().finish()
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("handshake_messages_len", &self.handshake_messages.len())
            .field("digest", &hex_digest(self.current_digest().as_ref()))
            .finish()
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Scoped to one in-progress handshake; torn down after Finished.
#[derive(Debug)]
pub struct HandshakeSubstate {
    pub pending_cipher: Option<PendingCipher>,
    /// The version byte pair advertised in ClientHello, retained verbatim
    /// for the anti-rollback check in ClientKeyExchange.
    pub client_version: Option<ProtocolVersion>,
    pub transcript: Transcript,
    pub public_key: Option<Vec<u8>>,
    pub client_public_key: Option<Vec<u8>>,
    /// The server's own RSA private key for this handshake's key-exchange.
    /// Set by the caller (it's configuration, not something observed on
    /// the wire) before `ClientKeyExchange` is processed.
    pub rsa_private_key: Option<RsaPrivateKey>,
    /// The client's RSA public key, when client authentication is in use.
    pub rsa_client_public_key: Option<RsaPublicKey>,
    pub server_random: Option<[u8; 32]>,
    pub client_random: Option<[u8; 32]>,
    pub negotiated_npn_protocol: Option<Vec<u8>>,
    pub doing_client_auth: bool,
    /// Crypto scratch set by `set_master_secret_from_pre`; consumed by
    /// `get_handshake_digest` to produce Finished verify-data. Not part of
    /// the long-lived session state -- it dies with the handshake substate.
    pub master_secret: Option<[u8; crate::crypto::MASTER_SECRET_LEN]>,
}

impl HandshakeSubstate {
    pub fn new(max_messages: usize) -> Self {
        HandshakeSubstate {
            pending_cipher: None,
            client_version: None,
            transcript: Transcript::new(max_messages),
            public_key: None,
            client_public_key: None,
            rsa_private_key: None,
            rsa_client_public_key: None,
            server_random: None,
            client_random: None,
            negotiated_npn_protocol: None,
            doing_client_auth: false,
            master_secret: None,
        }
    }
}

/// Construction-time parameters -- see SPEC_FULL §3.1. Not the external
/// parameter/configuration-loading collaborator named out of scope; just
/// the handful of values the constructor itself needs.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub role: Role,
    pub rng_seed: Option<[u8; 32]>,
    pub max_handshake_messages: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            role: Role::Client,
            rng_seed: None,
            max_handshake_messages: 1 << 20,
        }
    }
}

/// The per-connection session state (§3). Single-threaded access; the
/// caller is responsible for serializing calls on one instance (§5).
#[derive(Debug)]
pub struct SessionState {
    pub role: Role,
    version: Option<ProtocolVersion>,
    pub session: SessionId,
    pub secure_renegotiation: bool,
    pub client_verify_data: Option<Vec<u8>>,
    pub server_verify_data: Option<Vec<u8>>,
    pub server_end_point: Vec<u8>,
    pub extension_alpn: bool,
    pub negotiated_protocol: Option<Vec<u8>>,
    pub client_alpn_suggest: Option<Vec<Vec<u8>>>,
    pub client_group_suggest: Option<Vec<u16>>,
    pub client_ec_point_format_suggest: Option<Vec<u8>>,
    pub client_certificate_chain: Option<Vec<Vec<u8>>>,
    pub client_sni: Option<Vec<u8>>,
    pub random_gen: RandomGen,
    /// Resumable parser continuations for a handshake record split across
    /// several reads (§4.5/§3). Opaque to this crate: stashed verbatim by
    /// the caller and handed back on the next `process_packet` call.
    pub handshake_record_cont: Option<Vec<u8>>,
    pub handshake_record_cont13: Option<Vec<u8>>,
    /// TLS 1.3 fields: stored, not derived -- the HKDF-based key schedule
    /// itself is out of scope (§1 Non-goals).
    pub key_share: Option<Vec<u8>>,
    pub pre_shared_key: Option<Vec<u8>>,
    pub hrr: bool,
    pub cookie: Option<Vec<u8>>,
    pub exporter_master_secret: Option<Vec<u8>>,
    pub client_supports_pha: bool,
    pub tls12_session_ticket: Option<Vec<u8>>,
    pub npn_enabled: bool,
    pub handshake: Option<HandshakeSubstate>,
    max_handshake_messages: usize,
}

impl SessionState {
    pub fn new(config: ConnectionConfig) -> Self {
        let random_gen = match config.rng_seed {
            Some(seed) => RandomGen::from_seed(seed),
            None => RandomGen::from_entropy(),
        };
        SessionState {
            role: config.role,
            version: None,
            session: SessionId::default(),
            secure_renegotiation: false,
            client_verify_data: None,
            server_verify_data: None,
            server_end_point: Vec::new(),
            extension_alpn: false,
            negotiated_protocol: None,
            client_alpn_suggest: None,
            client_group_suggest: None,
            client_ec_point_format_suggest: None,
            client_certificate_chain: None,
            client_sni: None,
            random_gen,
            handshake_record_cont: None,
            handshake_record_cont13: None,
            key_share: None,
            pre_shared_key: None,
            hrr: false,
            cookie: None,
            exporter_master_secret: None,
            client_supports_pha: false,
            tls12_session_ticket: None,
            npn_enabled: false,
            handshake: None,
            max_handshake_messages: config.max_handshake_messages,
        }
    }

    /// Allocates the handshake substate at ClientHello / first handshake
    /// step. Does *not* touch `client_verify_data`/`server_verify_data`:
    /// on a genuinely fresh connection those are already `None` from
    /// `new`; on a renegotiation they must survive so the renegotiation-
    /// indication extension can still be checked against the prior
    /// handshake's verify data (§3 invariant 4, §4.4). They are only ever
    /// overwritten when a new Finished is validated.
    pub fn start_handshake(&mut self) {
        self.handshake = Some(HandshakeSubstate::new(self.max_handshake_messages));
    }

    pub fn end_handshake(&mut self) {
        self.handshake = None;
    }

    /// Reads the negotiated version. Reads before it is set are a
    /// programmer error (§7 "internal-invariant errors"), not a protocol
    /// error -- so this panics rather than returning `Result`.
    pub fn version(&self) -> ProtocolVersion {
        self.version
            .expect("read of negotiated version before it was set")
    }

    pub fn version_opt(&self) -> Option<ProtocolVersion> {
        self.version
    }

    /// The strict setter (invariant 2): `None -> Some(v)` is fine; setting
    /// again with a *different* value is a protocol error (anti-downgrade).
    pub fn set_version(&mut self, v: ProtocolVersion) -> Result<(), crate::error::TLSError> {
        match self.version {
            None => {
                self.version = Some(v);
                Ok(())
            }
            Some(existing) if existing == v => Ok(()),
            Some(_) => Err(crate::error::TLSError::protocol(
                "version renegotiated to a different value",
                true,
                crate::wire::enums::AlertDescription::HandshakeFailure,
            )),
        }
    }

    /// The unset-only setter: a no-op once `version` already holds a value.
    pub fn set_version_if_unset(&mut self, v: ProtocolVersion) {
        if self.version.is_none() {
            self.version = Some(v);
        }
    }

    pub fn handshake(&self) -> &HandshakeSubstate {
        self.handshake
            .as_ref()
            .expect("handshake field read while no handshake is in progress")
    }

    pub fn handshake_mut(&mut self) -> &mut HandshakeSubstate {
        self.handshake
            .as_mut()
            .expect("handshake field read while no handshake is in progress")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(role: Role) -> SessionState {
        SessionState::new(ConnectionConfig {
            role,
            rng_seed: Some([0u8; 32]),
            ..ConnectionConfig::default()
        })
    }

    /// I4: `version` transitions only `None -> Some(v)` via the strict
    /// setter; a later, different value is a protocol error. The
    /// unset-only setter is a no-op once a value is already present.
    #[test]
    fn version_setter_is_strict_and_set_if_unset_is_a_no_op_after_first_set() {
        let mut s = fresh(Role::Client);
        assert!(s.version_opt().is_none());

        s.set_version(ProtocolVersion::TLSv1_2).unwrap();
        assert_eq!(s.version(), ProtocolVersion::TLSv1_2);

        // Re-asserting the same value is fine (idempotent).
        s.set_version(ProtocolVersion::TLSv1_2).unwrap();
        assert_eq!(s.version(), ProtocolVersion::TLSv1_2);

        // A different value via the strict setter is a protocol error.
        let err = s.set_version(ProtocolVersion::TLSv1_1).unwrap_err();
        assert!(matches!(
            err,
            TLSError::Protocol {
                fatal: true,
                alert: AlertDescription::HandshakeFailure,
                ..
            }
        ));
        assert_eq!(s.version(), ProtocolVersion::TLSv1_2);

        // The unset-only setter never overrides an existing value.
        s.set_version_if_unset(ProtocolVersion::TLSv1_3);
        assert_eq!(s.version(), ProtocolVersion::TLSv1_2);
    }

    /// I5: `secure_renegotiation` is monotonic (false -> true, never
    /// reverts), including across a fresh handshake allocation.
    #[test]
    fn secure_renegotiation_is_monotonic_across_a_new_handshake() {
        let mut s = fresh(Role::Server);
        assert!(!s.secure_renegotiation);

        s.secure_renegotiation = true;
        s.start_handshake();
        assert!(s.secure_renegotiation, "start_handshake must not revert it");
    }

    /// Finding 3: starting a handshake (as a renegotiation would) must not
    /// wipe the verify-data the renegotiation-indication check needs from
    /// the prior handshake.
    #[test]
    fn start_handshake_preserves_prior_verify_data() {
        let mut s = fresh(Role::Server);
        s.client_verify_data = Some(vec![1, 2, 3]);
        s.server_verify_data = Some(vec![4, 5, 6]);

        s.start_handshake();

        assert_eq!(s.client_verify_data, Some(vec![1, 2, 3]));
        assert_eq!(s.server_verify_data, Some(vec![4, 5, 6]));
    }

    /// Finding 8: the transcript must fail rather than silently truncate
    /// once the soft cap would be exceeded.
    #[test]
    fn transcript_add_message_fails_past_the_cap_instead_of_truncating() {
        let mut t = Transcript::new(4);
        t.add_message(&[1, 2]).unwrap();
        let err = t.add_message(&[3, 4, 5]).unwrap_err();
        assert!(matches!(
            err,
            TLSError::Protocol {
                fatal: true,
                alert: AlertDescription::InternalError,
                ..
            }
        ));
        // The rejected write must not have partially landed.
        assert_eq!(t.handshake_messages, vec![1, 2]);
    }
}
