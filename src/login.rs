//! Login-frame recognition and decoding: `[length(2)][imei bytes]`.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    pub length: u16,
    pub imei: Vec<u8>,
}

/// A login frame is at least 2 bytes with a non-zero declared length.
pub fn is_login(buf: &[u8]) -> bool {
    if buf.len() < 2 {
        return false;
    }
    BigEndian::read_u16(&buf[0..2]) != 0
}

/// Decodes a login frame. The remaining bytes after `length` are taken
/// verbatim as the IMEI representation.
pub fn decode_login(buf: &[u8]) -> Result<LoginData> {
    if !is_login(buf) {
        return Err(TeltonikaError::BadHeader);
    }
    let length = BigEndian::read_u16(&buf[0..2]);
    let imei = buf[2..].to_vec();
    Ok(LoginData { length, imei })
}

/// Encodes a login frame from its components.
pub fn encode_login(login: &LoginData) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + login.imei.len());
    out.extend_from_slice(&login.length.to_be_bytes());
    out.extend_from_slice(&login.imei);
    out
}
