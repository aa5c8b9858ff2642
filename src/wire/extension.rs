use serde::Serialize;

use crate::error::TLSError;
use crate::wire::codec::{put_u16, put_vec_u16, Cursor};
use crate::wire::enums::ExtensionType;

/// Extensions carried on a ClientHello. Only the subset this spec names is
/// modeled structurally; anything else is kept as opaque bytes under its
/// raw type so the transcript still reflects exactly what was on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClientExtension {
    ServerName(Vec<u8>),
    ECPointFormats(Vec<u8>),
    SupportedGroups(Vec<u16>),
    ALPN(Vec<Vec<u8>>),
    RenegotiationInfo(Vec<u8>),
    Unknown(u16, Vec<u8>),
}

impl ClientExtension {
    pub fn ext_type(&self) -> ExtensionType {
        match self {
            ClientExtension::ServerName(_) => ExtensionType::ServerName,
            ClientExtension::ECPointFormats(_) => ExtensionType::ECPointFormats,
            ClientExtension::SupportedGroups(_) => ExtensionType::SupportedGroups,
            ClientExtension::ALPN(_) => ExtensionType::ALPN,
            ClientExtension::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            ClientExtension::Unknown(code, _) => ExtensionType::from_u16(*code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ServerExtension {
    ALPN(Vec<u8>),
    RenegotiationInfo(Vec<u8>),
    Unknown(u16, Vec<u8>),
}

impl ServerExtension {
    pub fn ext_type(&self) -> ExtensionType {
        match self {
            ServerExtension::ALPN(_) => ExtensionType::ALPN,
            ServerExtension::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            ServerExtension::Unknown(code, _) => ExtensionType::from_u16(*code),
        }
    }
}

/// `encode(SecureRenegotiation(verify_data, other_verify_data))` -- a single
/// length-prefixed vector holding one or both verify-data strings back to
/// back, as RFC 5746 defines `renegotiated_connection`.
pub fn encode_secure_renegotiation(client: &[u8], server: Option<&[u8]>) -> Vec<u8> {
    let mut inner = Vec::with_capacity(client.len() + server.map_or(0, <[u8]>::len));
    inner.extend_from_slice(client);
    if let Some(server) = server {
        inner.extend_from_slice(server);
    }
    let mut out = Vec::with_capacity(inner.len() + 1);
    out.push(inner.len() as u8);
    out.extend_from_slice(&inner);
    out
}

pub fn decode_client_extension(typ: u16, body: &[u8]) -> Result<ClientExtension, TLSError> {
    let et = ExtensionType::from_u16(typ);
    Ok(match et {
        ExtensionType::ServerName => ClientExtension::ServerName(body.to_vec()),
        ExtensionType::ECPointFormats => {
            let mut c = Cursor::new(body);
            ClientExtension::ECPointFormats(c.vec_u8()?.to_vec())
        }
        ExtensionType::SupportedGroups => {
            let mut c = Cursor::new(body);
            let list = c.vec_u16()?;
            let mut groups = Vec::new();
            let mut gc = Cursor::new(list);
            while !gc.is_empty() {
                groups.push(gc.u16()?);
            }
            ClientExtension::SupportedGroups(groups)
        }
        ExtensionType::ALPN => {
            let mut c = Cursor::new(body);
            let list = c.vec_u16()?;
            let mut protos = Vec::new();
            let mut pc = Cursor::new(list);
            while !pc.is_empty() {
                protos.push(pc.vec_u8()?.to_vec());
            }
            ClientExtension::ALPN(protos)
        }
        ExtensionType::RenegotiationInfo => ClientExtension::RenegotiationInfo(body.to_vec()),
        ExtensionType::Unknown(code) => ClientExtension::Unknown(code, body.to_vec()),
    })
}

pub fn decode_server_extension(typ: u16, body: &[u8]) -> Result<ServerExtension, TLSError> {
    let et = ExtensionType::from_u16(typ);
    Ok(match et {
        ExtensionType::ALPN => ServerExtension::ALPN(body.to_vec()),
        ExtensionType::RenegotiationInfo => ServerExtension::RenegotiationInfo(body.to_vec()),
        _ => ServerExtension::Unknown(typ, body.to_vec()),
    })
}

/// `extension_encode`: re-serializes a single extension (type + length +
/// body) the way it must have appeared on the wire, authoritative for
/// transcript purposes.
pub fn extension_encode_client(ext: &ClientExtension) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, ext.ext_type().to_u16());
    let body = match ext {
        ClientExtension::ServerName(b) => b.clone(),
        ClientExtension::ECPointFormats(b) => {
            let mut body = Vec::new();
            body.push(b.len() as u8);
            body.extend_from_slice(b);
            body
        }
        ClientExtension::SupportedGroups(groups) => {
            let mut inner = Vec::new();
            for g in groups {
                put_u16(&mut inner, *g);
            }
            let mut body = Vec::new();
            put_vec_u16(&mut body, &inner);
            body
        }
        ClientExtension::ALPN(protos) => {
            let mut inner = Vec::new();
            for p in protos {
                inner.push(p.len() as u8);
                inner.extend_from_slice(p);
            }
            let mut body = Vec::new();
            put_vec_u16(&mut body, &inner);
            body
        }
        ClientExtension::RenegotiationInfo(b) => b.clone(),
        ClientExtension::Unknown(_, b) => b.clone(),
    };
    put_vec_u16(&mut out, &body);
    out
}

pub fn extension_encode_server(ext: &ServerExtension) -> Vec<u8> {
    let mut out = Vec::new();
    put_u16(&mut out, ext.ext_type().to_u16());
    let body = match ext {
        ServerExtension::ALPN(b) => b.clone(),
        ServerExtension::RenegotiationInfo(b) => b.clone(),
        ServerExtension::Unknown(_, b) => b.clone(),
    };
    put_vec_u16(&mut out, &body);
    out
}
