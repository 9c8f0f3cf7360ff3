//! Leaf primitives shared by every codec: CRC-16/IBM, fixed-point GPS
//! scaling, and the hex-string encoding used for I/O values and IMEIs.

use crc::{Crc, CRC_16_ARC};

use crate::error::{Result, TeltonikaError};

/// CRC-16/ARC (poly `0x8005`, reflected in/out, init `0x0000`, no XOR-out)
/// is the same algorithm the wire calls CRC-16/IBM.
const CRC_16_IBM: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Computes CRC-16/IBM over `data`.
///
/// This is the checksum carried in the 4-byte CRC tail of a TCP frame
/// (only the low 16 bits are meaningful, see [is_valid_tram]).
pub fn crc16_ibm(data: &[u8]) -> u16 {
    CRC_16_IBM.checksum(data)
}

/// Validates a TCP frame body (`codec_id || body || crc`, 4-byte CRC tail).
///
/// `len < 4` is treated as invalid outright; this is deliberate (see
/// spec design note on `is_valid_tram`'s length guard).
pub fn is_valid_tram(tram: &[u8]) -> bool {
    if tram.len() < 4 {
        return false;
    }
    let data = &tram[..tram.len() - 4];
    let tail = &tram[tram.len() - 4..];
    let received = u16::from_be_bytes([tail[2], tail[3]]);
    received == crc16_ibm(data)
}

/// Appends a 4-byte big-endian CRC-16/IBM tail (high 16 bits zero) to `data`.
pub fn append_crc16_ibm(data: &[u8]) -> Vec<u8> {
    let crc = crc16_ibm(data);
    let mut out = Vec::with_capacity(data.len() + 4);
    out.extend_from_slice(data);
    out.extend_from_slice(&(crc as u32).to_be_bytes());
    out
}

/// Decodes an even-length lowercase/uppercase hex string into bytes.
pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|_| TeltonikaError::InvalidHex(0))
}

/// Encodes bytes as a lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Rounds a GPS coordinate in degrees to its 10^7-scaled signed 32-bit
/// wire representation, rejecting out-of-range values.
pub fn scale_coordinate(degrees: f64, field: &'static str) -> Result<i32> {
    let scaled = (degrees * 10_000_000.0).round();
    if scaled < i32::MIN as f64 || scaled > i32::MAX as f64 {
        return Err(TeltonikaError::InvalidGpsRange(field));
    }
    Ok(scaled as i32)
}

/// Reverses [scale_coordinate]: converts a signed 32-bit wire value back
/// into degrees.
pub fn unscale_coordinate(raw: i32) -> f64 {
    raw as f64 / 10_000_000.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn crc16_ibm_known_vector() {
        // codec_id 0x08 + body from fixture #1 in spec.md
        let data = hex::decode(
            "08010000016B40D8EA30010000000000000000000000000000000105021503010101425E0F01F10000601A014E000000000000000001",
        )
        .unwrap();
        assert_eq!(crc16_ibm(&data), 0xC7CF);
    }

    #[test]
    fn is_valid_tram_rejects_short_buffers() {
        assert!(!is_valid_tram(&[0u8; 3]));
        assert!(!is_valid_tram(&[]));
    }

    #[test]
    fn is_valid_tram_roundtrip() {
        let body = vec![0x08, 0x01, 0x02, 0x03];
        let tram = append_crc16_ibm(&body);
        assert!(is_valid_tram(&tram));
    }

    #[test]
    fn is_valid_tram_detects_bitflip() {
        let body = vec![0x08, 0x01, 0x02, 0x03];
        let mut tram = append_crc16_ibm(&body);
        let last = tram.len() - 1;
        tram[last] ^= 0x01;
        assert!(!is_valid_tram(&tram));
    }

    #[test]
    fn crc_tail_high_bits_are_zero() {
        let tram = append_crc16_ibm(&[0x08, 0xAA]);
        assert_eq!(tram[tram.len() - 4], 0);
        assert_eq!(tram[tram.len() - 3], 0);
    }

    #[test]
    fn coordinate_scale_roundtrip() {
        let raw = scale_coordinate(24.419811, "longitude").unwrap();
        assert_eq!(raw, 244198110);
        assert!((unscale_coordinate(raw) - 24.419811).abs() < 1e-7);
    }

    #[test]
    fn coordinate_out_of_range_errors() {
        assert!(scale_coordinate(1000.0, "longitude").is_err());
    }
}
