//! Closed discriminated unions for the wire-level enums this core reads.
//! Pattern matches on these are exhaustive on purpose: a new variant is a
//! type-level breaking change, which is desirable for a security-critical
//! protocol (see Design Notes).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolVersion {
    SSLv3,
    TLSv1_0,
    TLSv1_1,
    TLSv1_2,
    TLSv1_3,
    Unknown(u16),
}

impl ProtocolVersion {
    pub fn from_u16(v: u16) -> Self {
        match v {
            0x0300 => ProtocolVersion::SSLv3,
            0x0301 => ProtocolVersion::TLSv1_0,
            0x0302 => ProtocolVersion::TLSv1_1,
            0x0303 => ProtocolVersion::TLSv1_2,
            0x0304 => ProtocolVersion::TLSv1_3,
            other => ProtocolVersion::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ProtocolVersion::SSLv3 => 0x0300,
            ProtocolVersion::TLSv1_0 => 0x0301,
            ProtocolVersion::TLSv1_1 => 0x0302,
            ProtocolVersion::TLSv1_2 => 0x0303,
            ProtocolVersion::TLSv1_3 => 0x0304,
            ProtocolVersion::Unknown(v) => v,
        }
    }

    /// TLS 1.0 introduced the two-byte length prefix on the RSA-encrypted
    /// premaster; SSLv3 did not have it.
    pub fn at_least_tls10(self) -> bool {
        self.to_u16() >= ProtocolVersion::TLSv1_0.to_u16()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Unknown(u8),
}

impl ContentType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            other => ContentType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HandshakeType {
    HelloRequest,
    ClientHello,
    ServerHello,
    Certificate,
    ServerKeyExchange,
    CertificateRequest,
    ServerHelloDone,
    CertificateVerify,
    ClientKeyExchange,
    Finished,
    NextProtocol,
    Unknown(u8),
}

impl HandshakeType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => HandshakeType::HelloRequest,
            1 => HandshakeType::ClientHello,
            2 => HandshakeType::ServerHello,
            11 => HandshakeType::Certificate,
            12 => HandshakeType::ServerKeyExchange,
            13 => HandshakeType::CertificateRequest,
            14 => HandshakeType::ServerHelloDone,
            15 => HandshakeType::CertificateVerify,
            16 => HandshakeType::ClientKeyExchange,
            20 => HandshakeType::Finished,
            67 => HandshakeType::NextProtocol,
            other => HandshakeType::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            HandshakeType::HelloRequest => 0,
            HandshakeType::ClientHello => 1,
            HandshakeType::ServerHello => 2,
            HandshakeType::Certificate => 11,
            HandshakeType::ServerKeyExchange => 12,
            HandshakeType::CertificateRequest => 13,
            HandshakeType::ServerHelloDone => 14,
            HandshakeType::CertificateVerify => 15,
            HandshakeType::ClientKeyExchange => 16,
            HandshakeType::Finished => 20,
            HandshakeType::NextProtocol => 67,
            HandshakeType::Unknown(v) => v,
        }
    }

    /// The CertVerify-material set: messages whose raw bytes feed the
    /// CertificateVerify signature. Unknown types are excluded.
    pub fn in_cert_verify_material_set(self) -> bool {
        matches!(
            self,
            HandshakeType::ClientHello
                | HandshakeType::ServerHello
                | HandshakeType::Certificate
                | HandshakeType::ServerHelloDone
                | HandshakeType::ClientKeyExchange
                | HandshakeType::ServerKeyExchange
                | HandshakeType::CertificateRequest
        )
    }

    /// The Finished-material set: CertVerify-material plus CertificateVerify.
    /// Unknown types default to *included* -- deliberate asymmetry with
    /// `in_cert_verify_material_set`, preserved bit-for-bit (Design Notes O1).
    pub fn in_finished_material_set(self) -> bool {
        match self {
            HandshakeType::HelloRequest | HandshakeType::Finished => false,
            HandshakeType::CertificateVerify => true,
            other => other.in_cert_verify_material_set() || matches!(other, HandshakeType::Unknown(_)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertLevel {
    Warning,
    Fatal,
    Unknown(u8),
}

impl AlertLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => AlertLevel::Warning,
            2 => AlertLevel::Fatal,
            other => AlertLevel::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlertDescription {
    CloseNotify,
    UnexpectedMessage,
    BadRecordMac,
    DecryptionFailed,
    HandshakeFailure,
    DecodeError,
    DecryptError,
    ProtocolVersion,
    MissingExtension,
    UnsupportedExtension,
    IllegalParameter,
    InternalError,
    Unknown(u8),
}

impl AlertDescription {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            21 => AlertDescription::DecryptionFailed,
            40 => AlertDescription::HandshakeFailure,
            47 => AlertDescription::IllegalParameter,
            50 => AlertDescription::DecodeError,
            51 => AlertDescription::DecryptError,
            70 => AlertDescription::ProtocolVersion,
            80 => AlertDescription::InternalError,
            109 => AlertDescription::MissingExtension,
            110 => AlertDescription::UnsupportedExtension,
            other => AlertDescription::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            AlertDescription::CloseNotify => 0,
            AlertDescription::UnexpectedMessage => 10,
            AlertDescription::BadRecordMac => 20,
            AlertDescription::DecryptionFailed => 21,
            AlertDescription::HandshakeFailure => 40,
            AlertDescription::IllegalParameter => 47,
            AlertDescription::DecodeError => 50,
            AlertDescription::DecryptError => 51,
            AlertDescription::ProtocolVersion => 70,
            AlertDescription::InternalError => 80,
            AlertDescription::MissingExtension => 109,
            AlertDescription::UnsupportedExtension => 110,
            AlertDescription::Unknown(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExtensionType {
    ServerName,
    ECPointFormats,
    SupportedGroups,
    ALPN,
    RenegotiationInfo,
    Unknown(u16),
}

impl ExtensionType {
    pub const RENEGOTIATION_INFO_CODE: u16 = 0xff01;

    pub fn from_u16(v: u16) -> Self {
        match v {
            0 => ExtensionType::ServerName,
            10 => ExtensionType::SupportedGroups,
            11 => ExtensionType::ECPointFormats,
            16 => ExtensionType::ALPN,
            Self::RENEGOTIATION_INFO_CODE => ExtensionType::RenegotiationInfo,
            other => ExtensionType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ExtensionType::ServerName => 0,
            ExtensionType::SupportedGroups => 10,
            ExtensionType::ECPointFormats => 11,
            ExtensionType::ALPN => 16,
            ExtensionType::RenegotiationInfo => Self::RENEGOTIATION_INFO_CODE,
            ExtensionType::Unknown(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// O1: unknown handshake types default to *excluded* from the
    /// CertVerify-material set but *included* in the Finished-material
    /// set -- a deliberate asymmetry, preserved bit-for-bit.
    #[test]
    fn unknown_handshake_type_is_excluded_from_cert_verify_but_included_in_finished_material() {
        let unknown = HandshakeType::Unknown(99);
        assert!(!unknown.in_cert_verify_material_set());
        assert!(unknown.in_finished_material_set());
    }

    #[test]
    fn hello_request_and_finished_are_excluded_from_both_material_sets() {
        assert!(!HandshakeType::HelloRequest.in_cert_verify_material_set());
        assert!(!HandshakeType::HelloRequest.in_finished_material_set());
        assert!(!HandshakeType::Finished.in_cert_verify_material_set());
        assert!(!HandshakeType::Finished.in_finished_material_set());
    }

    #[test]
    fn certificate_verify_is_in_finished_material_but_not_cert_verify_material() {
        assert!(!HandshakeType::CertificateVerify.in_cert_verify_material_set());
        assert!(HandshakeType::CertificateVerify.in_finished_material_set());
    }
}
