//! The handshake processor (§4.4) and the ServerHello client-side entry
//! point (§4.5).

use crate::crypto;
use crate::error::TLSError;
use crate::session::Role;
use crate::state::TlsState;
use crate::wire::enums::AlertDescription;
use crate::wire::extension::{ClientExtension, ServerExtension};
use crate::wire::handshake::ServerHelloPayload;
use crate::wire::{encode_handshake, Handshake};

/// Applies the renegotiation-indication extension rule (§4.4, RFC 5746):
/// the payload must equal `encode(SecureRenegotiation(expected_client,
/// expected_server))` under constant-time comparison. On success, flips
/// `secure_renegotiation` (monotonic, invariant I5). On mismatch, fails
/// fatally.
fn verify_renegotiation_payload(
    state: &mut TlsState,
    payload: &[u8],
    expected_server: Option<&[u8]>,
) -> Result<(), TLSError> {
    let expected_client = state.get().client_verify_data.clone().unwrap_or_default();
    let expected = crate::wire::extension::encode_secure_renegotiation(
        &expected_client,
        expected_server,
    );
    if !crypto::constant_time_eq(payload, &expected) {
        return Err(TLSError::protocol(
            "client verified data not matching: renegotiation extension mismatch",
            true,
            AlertDescription::HandshakeFailure,
        ));
    }
    state.modify(|s| s.secure_renegotiation = true);
    Ok(())
}

fn process_client_hello_extensions(
    state: &mut TlsState,
    extensions: &[ClientExtension],
) -> Result<(), TLSError> {
    for ext in extensions {
        match ext {
            ClientExtension::RenegotiationInfo(payload) => {
                verify_renegotiation_payload(state, payload, None)?;
            }
            ClientExtension::ServerName(name) => {
                let name = name.clone();
                state.modify(|s| s.client_sni = Some(name));
            }
            ClientExtension::SupportedGroups(groups) => {
                let groups = groups.clone();
                state.modify(|s| s.client_group_suggest = Some(groups));
            }
            ClientExtension::ECPointFormats(formats) => {
                let formats = formats.clone();
                state.modify(|s| s.client_ec_point_format_suggest = Some(formats));
            }
            ClientExtension::ALPN(protos) => {
                let protos = protos.clone();
                state.modify(|s| {
                    s.extension_alpn = true;
                    s.client_alpn_suggest = Some(protos);
                });
            }
            // Unrecognized extensions are ignored at this layer, per §4.4.
            ClientExtension::Unknown(..) => {}
        }
    }
    Ok(())
}

fn process_server_hello_extensions(
    state: &mut TlsState,
    extensions: &[ServerExtension],
) -> Result<(), TLSError> {
    let expected_server = state.get().server_verify_data.clone().unwrap_or_default();
    for ext in extensions {
        match ext {
            ServerExtension::RenegotiationInfo(payload) => {
                verify_renegotiation_payload(state, payload, Some(&expected_server))?;
            }
            ServerExtension::ALPN(proto) => {
                let proto = proto.clone();
                state.modify(|s| s.negotiated_protocol = Some(proto));
            }
            ServerExtension::Unknown(..) => {}
        }
    }
    Ok(())
}

/// Allocates the handshake substate if one isn't already in progress,
/// matching §3's Lifecycle note that it's "allocated at ClientHello/first
/// handshake step" -- callers driving only the documented §6 surface
/// (`process_handshake`, `process_server_hello`) never need to call
/// `start_handshake` themselves.
fn ensure_handshake_started(state: &mut TlsState) {
    if state.get().handshake.is_none() {
        state.modify(|s| s.start_handshake());
    }
}

/// `process_server_hello`: the client-side ServerHello entry point
/// (§4.5). Must run *before* the generic processor observes this message
/// (the pending cipher isn't known yet). The caller is responsible for
/// also invoking [`process_handshake`] on the same message afterwards --
/// the two effects are disjoint (Design Notes O3).
pub fn process_server_hello(
    state: &mut TlsState,
    hello: &ServerHelloPayload,
) -> Result<(), TLSError> {
    ensure_handshake_started(state);
    process_server_hello_extensions(state, &hello.extensions)?;
    state.modify(|s| {
        s.handshake_mut().server_random = Some(hello.random);
    });
    let version = hello.server_version;
    state.modify_mut(|s| s.set_version(version))?;
    log::debug!("processed ServerHello: version={:?}", hello.server_version);
    Ok(())
}

/// `process_handshake`: applies one decoded handshake message to state.
#[allow(clippy::collapsible_match)]
pub fn process_handshake(state: &mut TlsState, message: &Handshake) -> Result<(), TLSError> {
    let role = state.get().role;

    match message {
        Handshake::ClientHello(ch) => {
            if role == Role::Server {
                ensure_handshake_started(state);
                process_client_hello_extensions(state, &ch.extensions)?;
                let (random, version) = (ch.random, ch.client_version);
                state.modify(|s| {
                    let hs = s.handshake_mut();
                    hs.client_random = Some(random);
                    hs.client_version = Some(version);
                });
            }
        }
        Handshake::ServerHello(_) => {
            // Handled exclusively via `process_server_hello` (§4.5); the
            // generic path only folds it into the transcript below.
        }
        Handshake::Certificate(chain) => match role {
            Role::Client => {
                let leaf = chain.first().ok_or_else(|| {
                    TLSError::protocol(
                        "server certificate missing",
                        true,
                        AlertDescription::HandshakeFailure,
                    )
                })?;
                let leaf = leaf.clone();
                state.modify(|s| {
                    s.server_end_point = leaf.clone();
                    s.handshake_mut().public_key = Some(leaf);
                });
            }
            Role::Server => {
                let chain = chain.clone();
                let client_public_key = chain.first().cloned();
                state.modify(|s| {
                    s.client_certificate_chain = Some(chain);
                    s.handshake_mut().client_public_key = client_public_key;
                });
            }
        },
        Handshake::ClientKeyExchange(kx) => {
            // The anti-rollback decryption itself lives in
            // `handle_client_key_exchange`, which reads the RSA private
            // key that was stashed into the handshake substate (§3) when
            // the connection was configured.
            if role != Role::Server {
                return Err(TLSError::protocol(
                    "unexpected ClientKeyExchange received by client",
                    true,
                    AlertDescription::UnexpectedMessage,
                ));
            }
            handle_client_key_exchange(state, &kx.0)?;
        }
        Handshake::NextProtocol(proto) => {
            if role == Role::Server {
                let proto = proto.clone();
                state.modify(|s| s.handshake_mut().negotiated_npn_protocol = Some(proto));
            }
        }
        Handshake::Finished(fdata) => {
            let peer = match role {
                Role::Server => Role::Client,
                Role::Client => Role::Server,
            };
            let expected = expected_finished_digest(state.get(), peer)?;
            if !crypto::constant_time_eq(fdata, &expected) {
                return Err(TLSError::protocol(
                    "bad record mac",
                    true,
                    AlertDescription::BadRecordMac,
                ));
            }
            let fdata = fdata.clone();
            state.modify(|s| match peer {
                Role::Client => s.client_verify_data = Some(fdata),
                Role::Server => s.server_verify_data = Some(fdata),
            });
        }
        _ => {}
    }

    let typ = message.typ();
    let encoded = encode_handshake(message);
    state.modify_mut(|s| -> Result<(), TLSError> {
        let hs = s.handshake_mut();
        if typ.in_cert_verify_material_set() {
            hs.transcript.add_message(&encoded)?;
        }
        if typ.in_finished_material_set() {
            hs.transcript.update_digest(&encoded);
        }
        Ok(())
    })?;
    log::trace!("processed handshake message: {typ:?}");

    Ok(())
}

/// Computes the Finished verify-data we expect from `peer`, over the
/// transcript hash accumulated *before* this Finished message itself (the
/// Finished message is excluded from the Finished-material set).
fn expected_finished_digest(session: &crate::session::SessionState, peer: Role) -> Result<Vec<u8>, TLSError> {
    let hs = session.handshake();
    let master_secret = hs.master_secret.ok_or_else(|| {
        TLSError::protocol(
            "Finished received before master secret was derived",
            true,
            AlertDescription::HandshakeFailure,
        )
    })?;
    let digest = hs.transcript.current_digest();
    Ok(crypto::handshake_verify_data(
        &master_secret,
        digest.as_ref(),
        peer,
    ))
}

/// `handle_client_key_exchange`: the server-side ClientKeyExchange entry
/// point -- decrypts the premaster with the anti-rollback countermeasure
/// and derives the master secret (§4.6). Reads the RSA private key from
/// the handshake substate (§3 `rsaPrivateKey`), which the caller must have
/// populated before the handshake reaches ClientKeyExchange.
pub fn handle_client_key_exchange(
    state: &mut TlsState,
    encrypted_premaster: &[u8],
) -> Result<(), TLSError> {
    let client_hello_version = state
        .get()
        .handshake()
        .client_version
        .ok_or_else(|| {
            TLSError::protocol(
                "ClientKeyExchange received before ClientHello",
                true,
                AlertDescription::UnexpectedMessage,
            )
        })?;
    let client_random = state.get().handshake().client_random;
    let server_random = state.get().handshake().server_random;
    let (client_random, server_random) = match (client_random, server_random) {
        (Some(c), Some(s)) => (c, s),
        _ => {
            return Err(TLSError::protocol(
                "ClientKeyExchange received before both randoms were captured",
                true,
                AlertDescription::HandshakeFailure,
            ))
        }
    };
    let priv_key = state
        .get()
        .handshake()
        .rsa_private_key
        .clone()
        .ok_or_else(|| TLSError::Kx("no RSA private key configured for this handshake".into()))?;

    let premaster = state.modify_mut(|s| {
        crate::kx::rsa_decrypt_with_rollback_countermeasure(
            &mut s.random_gen,
            &priv_key,
            encrypted_premaster,
            client_hello_version,
        )
    });

    let role = state.get().role;
    let master_secret =
        crypto::master_secret_from_premaster(&premaster, &client_random, &server_random, role);
    state.modify(|s| s.handshake_mut().master_secret = Some(master_secret));
    log::debug!("derived master secret from ClientKeyExchange");
    Ok(())
}

/// `verify_rsa`: the exposed top-level CertificateVerify check.
pub fn verify_rsa(pub_key: &rsa::RsaPublicKey, hashed: &[u8], signature: &[u8]) -> bool {
    crate::kx::rsa_verify(pub_key, hashed, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConnectionConfig, Role, SessionState};
    use crate::state::run;
    use crate::wire::enums::ProtocolVersion;
    use crate::wire::handshake::{decode_handshake, decode_handshakes, CurrentParams, ClientHelloPayload};

    fn fresh_server() -> SessionState {
        let mut s = SessionState::new(ConnectionConfig {
            role: Role::Server,
            rng_seed: Some([0u8; 32]),
            ..ConnectionConfig::default()
        });
        s.start_handshake();
        s
    }

    fn minimal_client_hello() -> Handshake {
        Handshake::ClientHello(ClientHelloPayload {
            client_version: ProtocolVersion::TLSv1_2,
            random: [0x7fu8; 32],
            session_id: Vec::new(),
            cipher_suites: vec![0x002f],
            compression_methods: vec![0],
            extensions: Vec::new(),
        })
    }

    /// I1/I2: processing a message in both material sets extends
    /// `handshake_messages` by exactly its encoding and folds that same
    /// encoding into the running digest.
    #[test]
    fn processing_a_message_updates_transcript_per_invariants_i1_and_i2() {
        let mut session = fresh_server();
        let hello = minimal_client_hello();
        let encoded = encode_handshake(&hello);

        run(&mut session, |st| process_handshake(st, &hello)).expect("process_handshake");

        assert_eq!(session.handshake().transcript.handshake_messages, encoded);

        let expected_digest = ring::digest::digest(&ring::digest::SHA256, &encoded);
        assert_eq!(
            session.handshake().transcript.current_digest().as_ref(),
            expected_digest.as_ref()
        );
    }

    /// R2: round-tripping a handshake message through `encode_handshake`
    /// then `decode_handshakes`/`decode_handshake` then `process_handshake`
    /// must update the transcript identically to processing the original
    /// value directly.
    #[test]
    fn round_trip_through_encode_decode_matches_direct_processing() {
        let hello = minimal_client_hello();

        let mut direct = fresh_server();
        run(&mut direct, |st| process_handshake(st, &hello)).expect("direct process");

        let encoded = encode_handshake(&hello);
        let mut framed = Vec::new();
        framed.extend_from_slice(&encoded);
        let (typ, body) = decode_handshakes(&framed).expect("decode_handshakes").remove(0);
        let params = CurrentParams {
            version: ProtocolVersion::TLSv1_2,
            pending_kx: None,
            npn_enabled: false,
        };
        let decoded = decode_handshake(&params, typ, &body).expect("decode_handshake");

        let mut round_tripped = fresh_server();
        run(&mut round_tripped, |st| process_handshake(st, &decoded)).expect("round-trip process");

        assert_eq!(
            direct.handshake().transcript.handshake_messages,
            round_tripped.handshake().transcript.handshake_messages
        );
        assert_eq!(
            direct.handshake().transcript.current_digest().as_ref(),
            round_tripped.handshake().transcript.current_digest().as_ref()
        );
    }
}
