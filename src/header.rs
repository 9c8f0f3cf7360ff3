//! TCP/UDP protocol discrimination and header parsing.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTcp {
    pub data_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderUdp {
    pub length: u16,
    pub packet_id: u16,
    pub avl_packet_id: u8,
    pub imei_length: u16,
    pub imei: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderData {
    Tcp(HeaderTcp),
    Udp(HeaderUdp),
}

impl HeaderData {
    pub fn protocol(&self) -> Protocol {
        match self {
            HeaderData::Tcp(_) => Protocol::Tcp,
            HeaderData::Udp(_) => Protocol::Udp,
        }
    }
}

/// `0x00000000` preamble ⇒ TCP, otherwise UDP. A buffer shorter than 4
/// bytes can't be discriminated.
pub fn detect_protocol(buf: &[u8]) -> Protocol {
    if buf.len() < 4 {
        return Protocol::Unknown;
    }
    if buf[0..4] == [0, 0, 0, 0] {
        Protocol::Tcp
    } else {
        Protocol::Udp
    }
}

/// Parses the TCP or UDP header, returning the parsed header plus the
/// cursor offset of the first post-header byte (`codec_id`).
pub fn decode_header(buf: &[u8]) -> Result<(HeaderData, usize)> {
    match detect_protocol(buf) {
        Protocol::Tcp => decode_header_tcp(buf),
        Protocol::Udp => decode_header_udp(buf),
        Protocol::Unknown => Err(TeltonikaError::BadHeader),
    }
}

fn decode_header_tcp(buf: &[u8]) -> Result<(HeaderData, usize)> {
    if buf.len() < 8 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: 8,
            have: buf.len(),
        });
    }
    let data_length = BigEndian::read_u32(&buf[4..8]);
    Ok((HeaderData::Tcp(HeaderTcp { data_length }), 8))
}

fn decode_header_udp(buf: &[u8]) -> Result<(HeaderData, usize)> {
    if buf.len() < 8 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: 8,
            have: buf.len(),
        });
    }
    let mut read = 0usize;
    let length = BigEndian::read_u16(&buf[read..read + 2]);
    read += 2;

    let packet_id = BigEndian::read_u16(&buf[read..read + 2]);
    // +3, not +2: this consumes a reserved byte immediately after
    // `packet_id`. See design note on the UDP header's reserved byte.
    read += 3;

    if buf.len() < read + 1 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: read + 1,
            have: buf.len(),
        });
    }
    let avl_packet_id = buf[read];
    read += 1;

    if buf.len() < read + 2 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: read + 2,
            have: buf.len(),
        });
    }
    let imei_length = BigEndian::read_u16(&buf[read..read + 2]);
    read += 2;

    if buf.len() < read + imei_length as usize {
        return Err(TeltonikaError::TruncatedBuffer {
            need: read + imei_length as usize,
            have: buf.len(),
        });
    }
    let imei = buf[read..read + imei_length as usize].to_vec();
    read += imei_length as usize;

    Ok((
        HeaderData::Udp(HeaderUdp {
            length,
            packet_id,
            avl_packet_id,
            imei_length,
            imei,
        }),
        read,
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn detects_tcp() {
        let buf = hex::decode("00000000000000010800000000").unwrap();
        assert_eq!(detect_protocol(&buf), Protocol::Tcp);
    }

    #[test]
    fn detects_udp() {
        let buf = hex::decode("003DCAFE0105000F").unwrap();
        assert_eq!(detect_protocol(&buf), Protocol::Udp);
    }

    #[test]
    fn unknown_on_short_buffer() {
        assert_eq!(detect_protocol(&[0u8; 2]), Protocol::Unknown);
    }

    #[test]
    fn decodes_fixture_six_udp_header() {
        // spec.md fixture #6
        let frame = hex::decode(
            "003DCAFE0105000F33353230393330383634303336353508010000016B4F815B30010000000000000000000000000000000103021503010101425DBC000001",
        )
        .unwrap();
        let (header, cursor) = decode_header(&frame).unwrap();
        match header {
            HeaderData::Udp(udp) => {
                assert_eq!(udp.length, 0x003D);
                assert_eq!(udp.packet_id, 0xCAFE);
                assert_eq!(udp.avl_packet_id, 0x05);
                assert_eq!(udp.imei_length, 15);
                assert_eq!(udp.imei, b"352093086403655");
            }
            _ => panic!("expected UDP header"),
        }
        assert_eq!(cursor, 8 + 15);
        assert_eq!(frame[cursor], 0x08);
    }

    #[test]
    fn decodes_tcp_data_length() {
        let buf = hex::decode("0000000000000036080100").unwrap();
        let (header, cursor) = decode_header(&buf).unwrap();
        match header {
            HeaderData::Tcp(tcp) => assert_eq!(tcp.data_length, 0x36),
            _ => panic!("expected TCP header"),
        }
        assert_eq!(cursor, 8);
    }
}
