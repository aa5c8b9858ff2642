//! The literal end-to-end scenarios (deterministic, seeded RNG).

use rand::SeedableRng;
use rsa::pkcs1v15::Pkcs1v15Encrypt;
use rsa::{RsaPrivateKey, RsaPublicKey};

use tls_handshake_core::crypto;
use tls_handshake_core::error::TLSError;
use tls_handshake_core::handshake::{handle_client_key_exchange, process_handshake};
use tls_handshake_core::record::{process_packet, Packet, Record};
use tls_handshake_core::session::{ConnectionConfig, Role, SessionState};
use tls_handshake_core::state::{run, TlsState};
use tls_handshake_core::wire::enums::{AlertDescription, ContentType, ProtocolVersion};
use tls_handshake_core::wire::extension::{encode_secure_renegotiation, ClientExtension};
use tls_handshake_core::wire::handshake::ClientHelloPayload;
use tls_handshake_core::wire::Handshake;

fn server_session(seed: [u8; 32]) -> SessionState {
    SessionState::new(ConnectionConfig {
        role: Role::Server,
        rng_seed: Some(seed),
        ..ConnectionConfig::default()
    })
}

fn client_session(seed: [u8; 32]) -> SessionState {
    SessionState::new(ConnectionConfig {
        role: Role::Client,
        rng_seed: Some(seed),
        ..ConnectionConfig::default()
    })
}

fn is_protocol_error(err: &TLSError, expect_fatal: bool, expect_alert: AlertDescription) -> bool {
    matches!(err, TLSError::Protocol { fatal, alert, .. } if *fatal == expect_fatal && *alert == expect_alert)
}

/// Scenario 1: Finished mismatch.
#[test]
fn finished_with_wrong_verify_data_is_rejected() {
    let mut session = server_session([1u8; 32]);
    session.start_handshake();
    session.handshake_mut().master_secret = Some([0x42u8; crypto::MASTER_SECRET_LEN]);

    let result = run(&mut session, |st: &mut TlsState| {
        process_handshake(st, &Handshake::Finished(vec![0u8; 12]))
    });

    let err = result.expect_err("mismatched Finished must be rejected");
    assert!(is_protocol_error(&err, true, AlertDescription::BadRecordMac));
}

/// Scenario 2: renegotiation-extension mismatch. `start_handshake` must
/// not wipe the prior handshake's `client_verify_data` -- otherwise this
/// would only be comparing against the empty default instead of the
/// `[1, 2, 3]` the scenario specifies.
#[test]
fn renegotiation_extension_mismatch_on_client_hello_is_rejected() {
    let mut session = server_session([2u8; 32]);
    session.client_verify_data = Some(vec![0x01, 0x02, 0x03]);
    session.start_handshake();

    let bad_payload = encode_secure_renegotiation(&[0x01, 0x02, 0x04], None);
    let hello = ClientHelloPayload {
        client_version: ProtocolVersion::TLSv1_2,
        random: [0u8; 32],
        session_id: Vec::new(),
        cipher_suites: vec![0x002f],
        compression_methods: vec![0],
        extensions: vec![ClientExtension::RenegotiationInfo(bad_payload)],
    };

    let result = run(&mut session, |st: &mut TlsState| {
        process_handshake(st, &Handshake::ClientHello(hello))
    });

    let err = result.expect_err("renegotiation mismatch must be rejected");
    assert!(is_protocol_error(&err, true, AlertDescription::HandshakeFailure));
}

/// Companion to scenario 2: a ClientHello carrying the *correct*
/// renegotiation payload over a fresh handshake succeeds and flips
/// `secure_renegotiation` (I5).
#[test]
fn renegotiation_extension_matching_prior_verify_data_is_accepted() {
    let mut session = server_session([2u8; 32]);
    session.client_verify_data = Some(vec![0x01, 0x02, 0x03]);
    session.start_handshake();

    let good_payload = encode_secure_renegotiation(&[0x01, 0x02, 0x03], None);
    let hello = ClientHelloPayload {
        client_version: ProtocolVersion::TLSv1_2,
        random: [0u8; 32],
        session_id: Vec::new(),
        cipher_suites: vec![0x002f],
        compression_methods: vec![0],
        extensions: vec![ClientExtension::RenegotiationInfo(good_payload)],
    };

    run(&mut session, |st: &mut TlsState| {
        process_handshake(st, &Handshake::ClientHello(hello))
    })
    .expect("matching renegotiation payload must be accepted");

    assert!(session.secure_renegotiation);
    // The prior handshake's verify data is preserved, not reset.
    assert_eq!(session.client_verify_data, Some(vec![0x01, 0x02, 0x03]));
}

/// Finding 2: the documented §6 surface (`process_handshake` for a
/// server-role ClientHello) must auto-allocate the handshake substate
/// rather than panicking when none is already in progress.
#[test]
fn process_handshake_auto_allocates_handshake_substate_on_first_client_hello() {
    let mut session = server_session([7u8; 32]);
    assert!(session.handshake.is_none());

    let hello = ClientHelloPayload {
        client_version: ProtocolVersion::TLSv1_2,
        random: [0u8; 32],
        session_id: Vec::new(),
        cipher_suites: vec![0x002f],
        compression_methods: vec![0],
        extensions: Vec::new(),
    };

    run(&mut session, |st: &mut TlsState| {
        process_handshake(st, &Handshake::ClientHello(hello))
    })
    .expect("first ClientHello must not require a manually-started handshake");

    assert!(session.handshake.is_some());
}

/// Scenario 3: missing server certificate (client role).
#[test]
fn empty_certificate_chain_is_fatal_for_client() {
    let mut session = client_session([3u8; 32]);

    let result = run(&mut session, |st: &mut TlsState| {
        process_handshake(st, &Handshake::Certificate(Vec::new()))
    });

    let err = result.expect_err("empty chain must be fatal for a client");
    assert!(is_protocol_error(&err, true, AlertDescription::HandshakeFailure));
}

/// Scenario 4: version rollback in the premaster triggers the anti-rollback
/// countermeasure -- no error surfaces, and the derived master secret is
/// *not* the one a valid decode would have produced.
#[test]
fn premaster_version_rollback_falls_back_to_random_premaster() {
    let mut enc_rng = rand_chacha::ChaCha20Rng::from_seed([9u8; 32]);
    let priv_key = RsaPrivateKey::new(&mut enc_rng, 1024).expect("key generation");
    let pub_key = RsaPublicKey::from(&priv_key);

    // A plaintext premaster that embeds TLS 1.0 even though the
    // ClientHello advertised TLS 1.2 -- the rollback scenario.
    let mut rolled_back_pms = [0u8; 48];
    rolled_back_pms[0..2].copy_from_slice(&ProtocolVersion::TLSv1_0.to_u16().to_be_bytes());
    rolled_back_pms[2..].copy_from_slice(&[0x55u8; 46]);
    let ciphertext = pub_key
        .encrypt(&mut enc_rng, Pkcs1v15Encrypt, &rolled_back_pms)
        .expect("encrypt");

    let mut session = server_session([4u8; 32]);
    session.start_handshake();
    {
        let hs = session.handshake_mut();
        hs.client_version = Some(ProtocolVersion::TLSv1_2);
        hs.client_random = Some([0x11u8; 32]);
        hs.server_random = Some([0x22u8; 32]);
        hs.rsa_private_key = Some(priv_key);
    }

    let result = run(&mut session, |st: &mut TlsState| {
        handle_client_key_exchange(st, &ciphertext)
    });
    result.expect("rollback countermeasure never surfaces an error");

    let actual_master_secret = session
        .handshake()
        .master_secret
        .expect("master secret must be derived");
    let would_be_master_secret_if_rolled_back_accepted = crypto::master_secret_from_premaster(
        &rolled_back_pms,
        &[0x11u8; 32],
        &[0x22u8; 32],
        Role::Server,
    );
    assert_ne!(
        actual_master_secret, would_be_master_secret_if_rolled_back_accepted,
        "rolled-back premaster must never be used to derive the master secret"
    );
}

/// Scenario 5: a valid ChangeCipherSpec switches the receive cipher.
#[test]
fn change_cipher_spec_emits_packet_and_switches_cipher() {
    let mut session = server_session([5u8; 32]);
    let packet = run(&mut session, |st: &mut TlsState| {
        process_packet(
            st,
            Record {
                content_type: ContentType::ChangeCipherSpec,
                version: ProtocolVersion::TLSv1_2,
                fragment: &[1],
            },
        )
    })
    .expect("valid CCS must classify");
    assert!(matches!(packet, Packet::ChangeCipherSpec));
}

/// Scenario 6: application data passes through untouched.
#[test]
fn app_data_round_trips_with_no_state_mutation() {
    let mut session = server_session([6u8; 32]);
    let before = format!("{session:?}");

    let packet = run(&mut session, |st: &mut TlsState| {
        process_packet(
            st,
            Record {
                content_type: ContentType::ApplicationData,
                version: ProtocolVersion::TLSv1_2,
                fragment: &[0xDE, 0xAD, 0xBE, 0xEF],
            },
        )
    })
    .expect("AppData always classifies");

    match packet {
        Packet::AppData(bytes) => assert_eq!(bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]),
        other => panic!("expected AppData, got {other:?}"),
    }
    let after = format!("{session:?}");
    assert_eq!(before, after, "AppData must not mutate session state");
}
