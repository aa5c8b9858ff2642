//! The record classifier (§4.3): turns one decrypted record into a single
//! `Packet` event, mutating session state only for ChangeCipherSpec.

use crate::error::TLSError;
use crate::session::SessionState;
use crate::state::TlsState;
use crate::wire::enums::ContentType;
use crate::wire::handshake::CurrentParams;
use crate::wire::{self, Alert, Handshake};

/// A plaintext record as handed to the classifier: a content type, the
/// protocol version from the record header, and the fragment bytes.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub content_type: ContentType,
    pub version: crate::wire::enums::ProtocolVersion,
    pub fragment: &'a [u8],
}

/// One semantic event yielded by the classifier.
#[derive(Debug, Clone)]
pub enum Packet {
    AppData(Vec<u8>),
    Alert(Vec<Alert>),
    ChangeCipherSpec,
    Handshake(Vec<Handshake>),
}

/// Invoked from CCS handling -- the one output side effect §6 names
/// ("to the record layer"). There is no real record layer wired in here,
/// so this core only needs to observe that it was called; callers that
/// embed this crate behind an actual transport provide their own cipher
/// switch and call this as a marker/logging hook.
pub fn switch_receive_cipher() {
    log::info!("switching receive-side cipher to the pending spec");
}

/// Builds the "current parameters" snapshot the handshake decoder needs:
/// the record's own version (not the session's negotiated version -- the
/// classifier runs before a handshake message is necessarily accepted),
/// the pending cipher's key-exchange kind if one has been negotiated, and
/// whether NPN is currently enabled on this connection.
fn current_params(session: &SessionState, record_version: crate::wire::enums::ProtocolVersion) -> CurrentParams {
    let pending_kx = session
        .handshake
        .as_ref()
        .and_then(|hs| hs.pending_cipher)
        .map(|pc| pc.kx);
    CurrentParams {
        version: record_version,
        pending_kx,
        npn_enabled: session.npn_enabled,
    }
}

/// `process_packet` / `classify`: the record classifier's single entry
/// point.
pub fn process_packet(state: &mut TlsState, record: Record) -> Result<Packet, TLSError> {
    match record.content_type {
        ContentType::ApplicationData => {
            log::trace!("classified AppData record ({} bytes)", record.fragment.len());
            Ok(Packet::AppData(record.fragment.to_vec()))
        }
        ContentType::Alert => {
            let alerts = wire::decode_alerts(record.fragment)?;
            log::debug!("classified Alert record: {alerts:?}");
            Ok(Packet::Alert(alerts))
        }
        ContentType::ChangeCipherSpec => {
            wire::decode_change_cipher_spec(record.fragment)?;
            switch_receive_cipher();
            log::debug!("classified ChangeCipherSpec record");
            Ok(Packet::ChangeCipherSpec)
        }
        ContentType::Handshake => {
            let params = current_params(state.get(), record.version);
            let pairs = wire::decode_handshakes(record.fragment)?;
            let mut messages = Vec::with_capacity(pairs.len());
            for (typ, body) in pairs {
                let msg = wire::decode_handshake(&params, typ, &body)?;
                messages.push(msg);
            }
            log::debug!("classified Handshake record with {} message(s)", messages.len());
            Ok(Packet::Handshake(messages))
        }
        ContentType::Unknown(t) => Err(TLSError::decode(format!(
            "unknown record content type {t}"
        ))),
    }
}

/// `decode_deprecated_handshake` wrapped as a classifier entry point for
/// the SSLv2-compatible probe ClientHello -- always yields a singleton
/// Handshake packet, never mutates state.
pub fn process_deprecated_handshake(fragment: &[u8]) -> Result<Packet, TLSError> {
    let msg = wire::decode_deprecated_handshake(fragment)?;
    Ok(Packet::Handshake(vec![msg]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ConnectionConfig, Role};
    use crate::wire::enums::ProtocolVersion;

    fn fresh_session() -> SessionState {
        SessionState::new(ConnectionConfig {
            role: Role::Server,
            rng_seed: Some([1u8; 32]),
            ..ConnectionConfig::default()
        })
    }

    #[test]
    fn app_data_passes_through_untouched() {
        let mut session = fresh_session();
        let mut state = TlsState::new(&mut session);
        let record = Record {
            content_type: ContentType::ApplicationData,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[0xDE, 0xAD, 0xBE, 0xEF],
        };
        let packet = process_packet(&mut state, record).expect("classify");
        match packet {
            Packet::AppData(bytes) => assert_eq!(bytes, vec![0xDE, 0xAD, 0xBE, 0xEF]),
            other => panic!("expected AppData, got {other:?}"),
        }
    }

    #[test]
    fn change_cipher_spec_is_validated_and_switches() {
        let mut session = fresh_session();
        let mut state = TlsState::new(&mut session);
        let record = Record {
            content_type: ContentType::ChangeCipherSpec,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[1],
        };
        let packet = process_packet(&mut state, record).expect("classify");
        assert!(matches!(packet, Packet::ChangeCipherSpec));

        let bad = Record {
            content_type: ContentType::ChangeCipherSpec,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[0],
        };
        assert!(process_packet(&mut state, bad).is_err());
    }

    #[test]
    fn malformed_alert_fragment_fails_decode() {
        let mut session = fresh_session();
        let mut state = TlsState::new(&mut session);
        let record = Record {
            content_type: ContentType::Alert,
            version: ProtocolVersion::TLSv1_2,
            fragment: &[1, 2, 3],
        };
        assert!(process_packet(&mut state, record).is_err());
    }
}
