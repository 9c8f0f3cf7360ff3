//! Millisecond/second epoch timestamp conversions used by the AVL and
//! command codecs.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};

/// Reads an 8-byte big-endian millisecond Unix timestamp.
pub fn decode_timestamp_millis(data: &[u8]) -> Result<u64> {
    if data.len() < 8 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: 8,
            have: data.len(),
        });
    }
    Ok(BigEndian::read_u64(&data[..8]))
}

/// Writes a millisecond Unix timestamp as 8 big-endian bytes.
pub fn encode_timestamp_millis(millis: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, millis);
    buf
}

/// Reads a 4-byte big-endian second Unix timestamp.
pub fn decode_timestamp_seconds(data: &[u8]) -> Result<u32> {
    if data.len() < 4 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: 4,
            have: data.len(),
        });
    }
    Ok(BigEndian::read_u32(&data[..4]))
}

/// Writes a second Unix timestamp as 4 big-endian bytes.
pub fn encode_timestamp_seconds(seconds: u32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, seconds);
    buf
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn millis_roundtrip() {
        let ts = 1_560_407_006_000u64;
        assert_eq!(decode_timestamp_millis(&encode_timestamp_millis(ts)).unwrap(), ts);
    }

    #[test]
    fn seconds_roundtrip() {
        let ts = 1_560_407_006u32;
        assert_eq!(decode_timestamp_seconds(&encode_timestamp_seconds(ts)).unwrap(), ts);
    }

    #[test]
    fn millis_truncated() {
        assert!(decode_timestamp_millis(&[0u8; 7]).is_err());
    }

    #[test]
    fn seconds_truncated() {
        assert!(decode_timestamp_seconds(&[0u8; 3]).is_err());
    }

    #[test]
    fn decodes_fixture_one_timestamp() {
        let data = hex::decode("0000016B40D8EA30").unwrap();
        assert_eq!(decode_timestamp_millis(&data).unwrap(), 1_560_161_086_000);
    }
}
