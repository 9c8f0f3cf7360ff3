//! Codec 08 / 8E / 16 AVL record sequences: `count, record..., count`.
//!
//! CRC validation is not this module's concern (see `router.rs`): this
//! module only knows how to walk the record sequence and report how many
//! bytes it consumed, which the router uses to locate the CRC suffix —
//! the leading `data_length` header field is not trustworthy for that
//! (see design notes).

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};
use crate::gps::{decode_gps, encode_gps, GpsData, GPS_BLOCK_LEN};
use crate::io_table::{decode_io_table, encode_io_table, Dialect, GenerationType, IoData};
use crate::timestamp::{decode_timestamp_millis, encode_timestamp_millis};

/// One reserved zero byte follows the 14-byte GPS block in every AVL
/// record; see design notes ("GPS trailing reserved byte").
const GPS_RESERVED_LEN: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvlCodec {
    Codec8,
    Codec8Ext,
    Codec16,
}

impl AvlCodec {
    pub fn codec_id(self) -> u8 {
        match self {
            AvlCodec::Codec8 => 0x08,
            AvlCodec::Codec8Ext => 0x8E,
            AvlCodec::Codec16 => 0x10,
        }
    }

    fn event_io_width(self) -> usize {
        match self {
            AvlCodec::Codec8 => 1,
            AvlCodec::Codec8Ext => 2,
            AvlCodec::Codec16 => 2,
        }
    }

    fn io_dialect(self) -> Dialect {
        match self {
            AvlCodec::Codec8 => Dialect::Codec8,
            AvlCodec::Codec8Ext => Dialect::Codec8Ext,
            AvlCodec::Codec16 => Dialect::Codec16,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvlRecord {
    pub timestamp: u64,
    pub priority: u8,
    pub gps: GpsData,
    pub event_io: u16,
    pub ios: Vec<IoData>,
    pub generation_type: Option<GenerationType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvlCodecData {
    pub records: Vec<AvlRecord>,
}

fn read_u8(data: &[u8], cursor: usize) -> Result<u8> {
    data.get(cursor).copied().ok_or(TeltonikaError::TruncatedBuffer {
        need: cursor + 1,
        have: data.len(),
    })
}

/// Decodes the record sequence starting at `data[0]` (the leading record
/// count byte). Returns the decoded records and the number of bytes
/// consumed, including the trailing count byte.
pub fn decode_avl_body(codec: AvlCodec, data: &[u8]) -> Result<(AvlCodecData, usize)> {
    let declared = read_u8(data, 0)? as usize;
    let mut cursor = 1usize;
    let mut records = Vec::with_capacity(declared);

    for _ in 0..declared {
        if data.len() < cursor + 8 {
            return Err(TeltonikaError::TruncatedBuffer {
                need: cursor + 8,
                have: data.len(),
            });
        }
        let timestamp = decode_timestamp_millis(&data[cursor..cursor + 8])?;
        cursor += 8;

        let priority = read_u8(data, cursor)?;
        cursor += 1;

        if data.len() < cursor + GPS_BLOCK_LEN + GPS_RESERVED_LEN {
            return Err(TeltonikaError::TruncatedBuffer {
                need: cursor + GPS_BLOCK_LEN + GPS_RESERVED_LEN,
                have: data.len(),
            });
        }
        let gps = decode_gps(&data[cursor..cursor + GPS_BLOCK_LEN])?;
        cursor += GPS_BLOCK_LEN + GPS_RESERVED_LEN;

        let width = codec.event_io_width();
        if data.len() < cursor + width {
            return Err(TeltonikaError::TruncatedBuffer {
                need: cursor + width,
                have: data.len(),
            });
        }
        let event_io = match width {
            1 => data[cursor] as u16,
            _ => BigEndian::read_u16(&data[cursor..cursor + 2]),
        };
        cursor += width;

        let table = decode_io_table(codec.io_dialect(), data, cursor)?;
        cursor += table.consumed;

        records.push(AvlRecord {
            timestamp,
            priority,
            gps,
            event_io,
            ios: table.ios,
            generation_type: table.generation_type,
        });
    }

    let trailing = read_u8(data, cursor)? as u64;
    cursor += 1;
    if trailing != declared as u64 {
        return Err(TeltonikaError::RecordCountMismatch {
            header: declared as u64,
            trailer: trailing,
        });
    }

    Ok((AvlCodecData { records }, cursor))
}

/// Encodes the record sequence (leading count, records, trailing count).
/// Does not include `codec_id` or the CRC suffix.
pub fn encode_avl_body(codec: AvlCodec, data: &AvlCodecData) -> Result<Vec<u8>> {
    if data.records.is_empty() {
        return Err(TeltonikaError::NilField("records"));
    }
    if data.records.len() > u8::MAX as usize {
        return Err(TeltonikaError::InvalidIoWidth(data.records.len()));
    }

    let mut out = Vec::new();
    out.push(data.records.len() as u8);

    for record in &data.records {
        out.extend_from_slice(&encode_timestamp_millis(record.timestamp));
        out.push(record.priority);
        out.extend_from_slice(&encode_gps(&record.gps)?);
        out.push(0x00); // GPS trailing reserved byte

        match codec.event_io_width() {
            1 => {
                if record.event_io > u8::MAX as u16 {
                    return Err(TeltonikaError::InvalidIoIdRange(record.event_io as u32));
                }
                out.push(record.event_io as u8);
            }
            _ => {
                let mut buf = [0u8; 2];
                BigEndian::write_u16(&mut buf, record.event_io);
                out.extend_from_slice(&buf);
            }
        }

        if codec == AvlCodec::Codec16 && record.generation_type.is_none() {
            return Err(TeltonikaError::NilField("generation_type"));
        }
        out.extend(encode_io_table(
            codec.io_dialect(),
            &record.ios,
            record.generation_type,
        )?);
    }

    out.push(data.records.len() as u8);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::io_table::GenerationType;

    fn sample_record(generation_type: Option<GenerationType>) -> AvlRecord {
        AvlRecord {
            timestamp: 1_560_161_086_000,
            priority: 1,
            gps: GpsData {
                longitude: 24.419811,
                latitude: 54.905919,
                altitude: 120,
                angle: 270,
                satellites: 9,
                speed: 35,
            },
            event_io: 1,
            ios: vec![IoData {
                id: 1,
                value: "01".into(),
            }],
            generation_type,
        }
    }

    #[test]
    fn roundtrip_codec8() {
        let data = AvlCodecData {
            records: vec![sample_record(None)],
        };
        let body = encode_avl_body(AvlCodec::Codec8, &data).unwrap();
        let (decoded, consumed) = decode_avl_body(AvlCodec::Codec8, &body).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(decoded, data);
    }

    #[test]
    fn roundtrip_codec16_with_generation_type() {
        let data = AvlCodecData {
            records: vec![sample_record(Some(GenerationType::OnChange))],
        };
        let body = encode_avl_body(AvlCodec::Codec16, &data).unwrap();
        let (decoded, consumed) = decode_avl_body(AvlCodec::Codec16, &body).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(decoded, data);
    }

    #[test]
    fn decodes_fixture_one_record() {
        // spec.md fixture #1, body after codec_id, including trailing count.
        let data = hex::decode(
            "010000016B40D8EA30010000000000000000000000000000000105021503010101425E0F01F10000601A014E000000000000000001",
        )
        .unwrap();
        let (decoded, consumed) = decode_avl_body(AvlCodec::Codec8, &data).unwrap();
        assert_eq!(consumed, data.len());
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].ios.len(), 5);
    }

    #[test]
    fn decodes_fixture_four_two_records_codec16() {
        // spec.md fixture #4, body after codec_id, including trailing count.
        let body = hex::decode(
            "020000016BDBC7833000000000000000000000000000000000000B05040200010000030002000B00270042563A00000000016BDBC7871800000000000000000000000000000000000B05040200010000030002000B00260042563A000002",
        )
        .unwrap();
        let (decoded, consumed) = decode_avl_body(AvlCodec::Codec16, &body).unwrap();
        assert_eq!(consumed, body.len());
        assert_eq!(decoded.records.len(), 2);
        for record in &decoded.records {
            assert_eq!(record.generation_type, Some(GenerationType::OnChange));
        }
    }

    #[test]
    fn trailing_count_mismatch_errors() {
        let mut data = AvlCodecData {
            records: vec![sample_record(None)],
        };
        let mut body = encode_avl_body(AvlCodec::Codec8, &data).unwrap();
        let last = body.len() - 1;
        body[last] = 0xFF;
        assert!(decode_avl_body(AvlCodec::Codec8, &body).is_err());

        data.records.push(sample_record(None));
        let body2 = encode_avl_body(AvlCodec::Codec8, &data).unwrap();
        assert_eq!(body2[0], 2);
    }
}
