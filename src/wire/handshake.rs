//! Structural decode/encode for the handshake message subset named by this
//! spec. Grounded in the message shapes of the rustls-family handshake
//! payloads (`ClientHelloPayload`, `ServerHelloPayload`, ...): one struct per
//! message, one closed `Handshake` enum tying them together.

use serde::Serialize;

use crate::error::TLSError;
use crate::wire::codec::{put_u16, put_u24, put_u8, put_vec_u16, put_vec_u24, put_vec_u8, Cursor};
use crate::wire::enums::{HandshakeType, ProtocolVersion};
use crate::wire::extension::{
    decode_client_extension, decode_server_extension, extension_encode_client,
    extension_encode_server, ClientExtension, ServerExtension,
};

pub const RANDOM_LEN: usize = 32;
pub const PREMASTER_LEN: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientHelloPayload {
    pub client_version: ProtocolVersion,
    pub random: [u8; RANDOM_LEN],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<u16>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<ClientExtension>,
}

impl ClientHelloPayload {
    pub fn find_extension(&self, typ: crate::wire::enums::ExtensionType) -> Option<&ClientExtension> {
        self.extensions.iter().find(|e| e.ext_type() == typ)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerHelloPayload {
    pub server_version: ProtocolVersion,
    pub random: [u8; RANDOM_LEN],
    pub session_id: Vec<u8>,
    pub cipher_suite: u16,
    pub compression_method: u8,
    pub extensions: Vec<ServerExtension>,
}

impl ServerHelloPayload {
    pub fn find_extension(&self, typ: crate::wire::enums::ExtensionType) -> Option<&ServerExtension> {
        self.extensions.iter().find(|e| e.ext_type() == typ)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRequestPayload {
    pub cert_types: Vec<u8>,
    pub authorities: Vec<Vec<u8>>,
}

/// A parsed ClientKeyExchange: the still-encrypted premaster bytes, exactly
/// as received (the two-byte length prefix, if present for this version, is
/// already stripped -- see `ProtocolVersion::at_least_tls10`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientKeyExchangePayload(pub Vec<u8>);

/// The decoded result of `decode_premaster_secret`: the version embedded in
/// the plaintext premaster (checked against `clientVersion` for anti-rollback)
/// and the 46 trailing random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreMasterSecret {
    pub client_version: ProtocolVersion,
    pub random: [u8; 46],
}

impl PreMasterSecret {
    pub fn to_bytes(self) -> [u8; PREMASTER_LEN] {
        let mut out = [0u8; PREMASTER_LEN];
        out[0..2].copy_from_slice(&self.client_version.to_u16().to_be_bytes());
        out[2..].copy_from_slice(&self.random);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Handshake {
    HelloRequest,
    ClientHello(ClientHelloPayload),
    ServerHello(ServerHelloPayload),
    Certificate(Vec<Vec<u8>>),
    ServerKeyExchange(Vec<u8>),
    CertificateRequest(CertificateRequestPayload),
    ServerHelloDone,
    CertificateVerify(Vec<u8>),
    ClientKeyExchange(ClientKeyExchangePayload),
    Finished(Vec<u8>),
    NextProtocol(Vec<u8>),
    Unknown(u8, Vec<u8>),
}

impl Handshake {
    pub fn typ(&self) -> HandshakeType {
        match self {
            Handshake::HelloRequest => HandshakeType::HelloRequest,
            Handshake::ClientHello(_) => HandshakeType::ClientHello,
            Handshake::ServerHello(_) => HandshakeType::ServerHello,
            Handshake::Certificate(_) => HandshakeType::Certificate,
            Handshake::ServerKeyExchange(_) => HandshakeType::ServerKeyExchange,
            Handshake::CertificateRequest(_) => HandshakeType::CertificateRequest,
            Handshake::ServerHelloDone => HandshakeType::ServerHelloDone,
            Handshake::CertificateVerify(_) => HandshakeType::CertificateVerify,
            Handshake::ClientKeyExchange(_) => HandshakeType::ClientKeyExchange,
            Handshake::Finished(_) => HandshakeType::Finished,
            Handshake::NextProtocol(_) => HandshakeType::NextProtocol,
            Handshake::Unknown(t, _) => HandshakeType::Unknown(*t),
        }
    }
}

/// Snapshot of the parameters a structural decode needs but which live in
/// connection state rather than on the wire: the negotiated version (from
/// the record header), the pending cipher's key-exchange kind (if any has
/// been negotiated yet), and whether NPN is currently enabled.
#[derive(Debug, Clone, Copy)]
pub struct CurrentParams {
    pub version: ProtocolVersion,
    pub pending_kx: Option<crate::session::KxAlgorithm>,
    pub npn_enabled: bool,
}

fn body_of(typ: HandshakeType, payload: &Handshake) -> Vec<u8> {
    let mut body = Vec::new();
    match payload {
        Handshake::HelloRequest | Handshake::ServerHelloDone => {}
        Handshake::ClientHello(ch) => {
            put_u16(&mut body, ch.client_version.to_u16());
            body.extend_from_slice(&ch.random);
            put_vec_u8(&mut body, &ch.session_id);
            let mut suites = Vec::new();
            for cs in &ch.cipher_suites {
                put_u16(&mut suites, *cs);
            }
            put_vec_u16(&mut body, &suites);
            put_vec_u8(&mut body, &ch.compression_methods);
            let mut exts = Vec::new();
            for e in &ch.extensions {
                exts.extend_from_slice(&extension_encode_client(e));
            }
            put_vec_u16(&mut body, &exts);
        }
        Handshake::ServerHello(sh) => {
            put_u16(&mut body, sh.server_version.to_u16());
            body.extend_from_slice(&sh.random);
            put_vec_u8(&mut body, &sh.session_id);
            put_u16(&mut body, sh.cipher_suite);
            put_u8(&mut body, sh.compression_method);
            let mut exts = Vec::new();
            for e in &sh.extensions {
                exts.extend_from_slice(&extension_encode_server(e));
            }
            put_vec_u16(&mut body, &exts);
        }
        Handshake::Certificate(chain) => {
            let mut inner = Vec::new();
            for cert in chain {
                put_vec_u24(&mut inner, cert);
            }
            put_vec_u24(&mut body, &inner);
        }
        Handshake::ServerKeyExchange(raw) => body.extend_from_slice(raw),
        Handshake::CertificateRequest(cr) => {
            put_vec_u8(&mut body, &cr.cert_types);
            let mut inner = Vec::new();
            for a in &cr.authorities {
                put_vec_u16(&mut inner, a);
            }
            put_vec_u16(&mut body, &inner);
        }
        Handshake::CertificateVerify(sig) => put_vec_u16(&mut body, sig),
        Handshake::ClientKeyExchange(kx) => put_vec_u16(&mut body, &kx.0),
        Handshake::Finished(data) => body.extend_from_slice(data),
        Handshake::NextProtocol(proto) => put_vec_u8(&mut body, proto),
        Handshake::Unknown(_, raw) => body.extend_from_slice(raw),
    }
    let _ = typ;
    body
}

/// `encode_handshake`: re-encodes the authoritative wire bytes (4-byte
/// header: 1-byte type + 3-byte length, followed by the body) for a
/// decoded handshake message. This is exactly what the handshake processor
/// folds into the transcript -- not the original bytes off the wire,
/// though for every message this spec models the two must be identical
/// (see property R2).
pub fn encode_handshake(msg: &Handshake) -> Vec<u8> {
    let typ = msg.typ();
    let body = body_of(typ, msg);
    let mut out = Vec::with_capacity(4 + body.len());
    put_u8(&mut out, typ.to_u8());
    put_u24(&mut out, body.len() as u32);
    out.extend_from_slice(&body);
    out
}

/// `decode_handshakes`: splits a handshake-record fragment into a sequence
/// of `(type, raw_body)` pairs, per the 1-byte-type + 3-byte-length framing.
pub fn decode_handshakes(fragment: &[u8]) -> Result<Vec<(HandshakeType, Vec<u8>)>, TLSError> {
    let mut cursor = Cursor::new(fragment);
    let mut out = Vec::new();
    while !cursor.is_empty() {
        let typ = HandshakeType::from_u8(cursor.u8()?);
        let body = cursor.vec_u24()?;
        out.push((typ, body.to_vec()));
    }
    Ok(out)
}

fn decode_client_hello(body: &[u8]) -> Result<ClientHelloPayload, TLSError> {
    let mut c = Cursor::new(body);
    let client_version = ProtocolVersion::from_u16(c.u16()?);
    let random_slice = c.take(RANDOM_LEN)?;
    let mut random = [0u8; RANDOM_LEN];
    random.copy_from_slice(random_slice);
    let session_id = c.vec_u8()?.to_vec();
    let suites_raw = c.vec_u16()?;
    let mut cipher_suites = Vec::new();
    let mut sc = Cursor::new(suites_raw);
    while !sc.is_empty() {
        cipher_suites.push(sc.u16()?);
    }
    let compression_methods = c.vec_u8()?.to_vec();
    let mut extensions = Vec::new();
    if !c.is_empty() {
        let exts_raw = c.vec_u16()?;
        let mut ec = Cursor::new(exts_raw);
        while !ec.is_empty() {
            let typ = ec.u16()?;
            let ext_body = ec.vec_u16()?;
            extensions.push(decode_client_extension(typ, ext_body)?);
        }
    }
    Ok(ClientHelloPayload {
        client_version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
        extensions,
    })
}

fn decode_server_hello(body: &[u8]) -> Result<ServerHelloPayload, TLSError> {
    let mut c = Cursor::new(body);
    let server_version = ProtocolVersion::from_u16(c.u16()?);
    let random_slice = c.take(RANDOM_LEN)?;
    let mut random = [0u8; RANDOM_LEN];
    random.copy_from_slice(random_slice);
    let session_id = c.vec_u8()?.to_vec();
    let cipher_suite = c.u16()?;
    let compression_method = c.u8()?;
    let mut extensions = Vec::new();
    if !c.is_empty() {
        let exts_raw = c.vec_u16()?;
        let mut ec = Cursor::new(exts_raw);
        while !ec.is_empty() {
            let typ = ec.u16()?;
            let ext_body = ec.vec_u16()?;
            extensions.push(decode_server_extension(typ, ext_body)?);
        }
    }
    Ok(ServerHelloPayload {
        server_version,
        random,
        session_id,
        cipher_suite,
        compression_method,
        extensions,
    })
}

fn decode_certificate(body: &[u8]) -> Result<Vec<Vec<u8>>, TLSError> {
    let mut c = Cursor::new(body);
    let list = c.vec_u24()?;
    let mut lc = Cursor::new(list);
    let mut chain = Vec::new();
    while !lc.is_empty() {
        chain.push(lc.vec_u24()?.to_vec());
    }
    Ok(chain)
}

fn decode_certificate_request(body: &[u8]) -> Result<CertificateRequestPayload, TLSError> {
    let mut c = Cursor::new(body);
    let cert_types = c.vec_u8()?.to_vec();
    let authorities_raw = c.vec_u16()?;
    let mut ac = Cursor::new(authorities_raw);
    let mut authorities = Vec::new();
    while !ac.is_empty() {
        authorities.push(ac.vec_u16()?.to_vec());
    }
    Ok(CertificateRequestPayload {
        cert_types,
        authorities,
    })
}

/// `decode_handshake(current_params, type, bytes) -> Handshake`. The full
/// structural decoder invoked once per `(type, body)` pair produced by
/// `decode_handshakes`.
pub fn decode_handshake(
    params: &CurrentParams,
    typ: HandshakeType,
    body: &[u8],
) -> Result<Handshake, TLSError> {
    Ok(match typ {
        HandshakeType::HelloRequest => Handshake::HelloRequest,
        HandshakeType::ClientHello => Handshake::ClientHello(decode_client_hello(body)?),
        HandshakeType::ServerHello => Handshake::ServerHello(decode_server_hello(body)?),
        HandshakeType::Certificate => Handshake::Certificate(decode_certificate(body)?),
        HandshakeType::ServerKeyExchange => Handshake::ServerKeyExchange(body.to_vec()),
        HandshakeType::CertificateRequest => {
            Handshake::CertificateRequest(decode_certificate_request(body)?)
        }
        HandshakeType::ServerHelloDone => {
            if !body.is_empty() {
                return Err(TLSError::decode("ServerHelloDone must be empty"));
            }
            Handshake::ServerHelloDone
        }
        HandshakeType::CertificateVerify => {
            let mut c = Cursor::new(body);
            Handshake::CertificateVerify(c.vec_u16()?.to_vec())
        }
        HandshakeType::ClientKeyExchange => {
            let mut c = Cursor::new(body);
            let payload = if params.version.at_least_tls10() {
                c.vec_u16()?.to_vec()
            } else {
                c.take(c.remaining())?.to_vec()
            };
            Handshake::ClientKeyExchange(ClientKeyExchangePayload(payload))
        }
        HandshakeType::Finished => Handshake::Finished(body.to_vec()),
        HandshakeType::NextProtocol => {
            if !params.npn_enabled {
                return Err(TLSError::decode("unexpected NextProtocol message"));
            }
            let mut c = Cursor::new(body);
            Handshake::NextProtocol(c.vec_u8()?.to_vec())
        }
        HandshakeType::Unknown(t) => Handshake::Unknown(t, body.to_vec()),
    })
}

/// `decode_deprecated_handshake`: the SSLv2-compatible ClientHello used by
/// very old clients to probe a server. Only `client_version`, cipher specs
/// and the challenge (folded into `random`, zero-padded/truncated to 32
/// bytes as RFC 5246 appendix E.1 allows) are modeled.
pub fn decode_deprecated_handshake(fragment: &[u8]) -> Result<Handshake, TLSError> {
    let mut c = Cursor::new(fragment);
    let client_version = ProtocolVersion::from_u16(c.u16()?);
    let cipher_spec_len = c.u16()? as usize;
    let session_id_len = c.u16()? as usize;
    let challenge_len = c.u16()? as usize;
    let cipher_specs_raw = c.take(cipher_spec_len)?;
    let session_id = c.take(session_id_len)?.to_vec();
    let challenge = c.take(challenge_len)?;

    let mut cipher_suites = Vec::new();
    for chunk in cipher_specs_raw.chunks_exact(3) {
        if chunk[0] == 0 {
            cipher_suites.push(u16::from_be_bytes([chunk[1], chunk[2]]));
        }
    }

    let mut random = [0u8; RANDOM_LEN];
    let copy_len = challenge.len().min(RANDOM_LEN);
    random[RANDOM_LEN - copy_len..].copy_from_slice(&challenge[challenge.len() - copy_len..]);

    Ok(Handshake::ClientHello(ClientHelloPayload {
        client_version,
        random,
        session_id,
        cipher_suites,
        compression_methods: vec![0],
        extensions: Vec::new(),
    }))
}

/// `decode_premaster_secret`: parses the plaintext that should result from
/// successfully RSA-decrypting a ClientKeyExchange -- a 2-byte
/// `ProtocolVersion` followed by 46 random bytes (RFC 5246 §7.4.7.1).
pub fn decode_premaster_secret(plaintext: &[u8]) -> Result<PreMasterSecret, TLSError> {
    if plaintext.len() != PREMASTER_LEN {
        return Err(TLSError::decode("premaster secret has wrong length"));
    }
    let client_version = ProtocolVersion::from_u16(u16::from_be_bytes([
        plaintext[0],
        plaintext[1],
    ]));
    let mut random = [0u8; 46];
    random.copy_from_slice(&plaintext[2..]);
    Ok(PreMasterSecret {
        client_version,
        random,
    })
}
