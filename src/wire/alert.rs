use serde::Serialize;

use crate::error::TLSError;
use crate::wire::codec::Cursor;
use crate::wire::enums::{AlertDescription, AlertLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

/// `decode_alerts`: a single Alert record fragment may (rarely) carry more
/// than one 2-byte alert back to back.
pub fn decode_alerts(fragment: &[u8]) -> Result<Vec<Alert>, TLSError> {
    if fragment.is_empty() || !fragment.len().is_multiple_of(2) {
        return Err(TLSError::decode("malformed alert fragment"));
    }
    let mut c = Cursor::new(fragment);
    let mut out = Vec::new();
    while !c.is_empty() {
        let level = AlertLevel::from_u8(c.u8()?);
        let description = AlertDescription::from_u8(c.u8()?);
        out.push(Alert { level, description });
    }
    Ok(out)
}

/// `decode_change_cipher_spec`: validates the single-byte CCS payload.
pub fn decode_change_cipher_spec(fragment: &[u8]) -> Result<(), TLSError> {
    if fragment == [1] {
        Ok(())
    } else {
        Err(TLSError::decode("malformed ChangeCipherSpec payload"))
    }
}
