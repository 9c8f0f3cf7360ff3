//! Codec 0C / 0D / 0E / 0F command-response payloads:
//! `count, response_type, block..., count`.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};
use crate::primitives::encode_hex;
use crate::timestamp::{decode_timestamp_millis, decode_timestamp_seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCodec {
    Codec12,
    Codec13,
    Codec14,
    Codec15,
}

impl CommandCodec {
    pub fn codec_id(self) -> u8 {
        match self {
            CommandCodec::Codec12 => 0x0C,
            CommandCodec::Codec13 => 0x0D,
            CommandCodec::Codec14 => 0x0E,
            CommandCodec::Codec15 => 0x0F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Command,
    Response,
}

impl CommandType {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            5 => Ok(CommandType::Command),
            6 => Ok(CommandType::Response),
            other => Err(TeltonikaError::UnsupportedCommandType(other)),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            CommandType::Command => 5,
            CommandType::Response => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTimestamp {
    Millis(u64),
    Seconds(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Bytes stringified as-is (not UTF-8 validated); the hex form is
    /// the authoritative representation.
    pub response: String,
    pub hex_message: String,
    pub imei: Option<String>,
    pub timestamp: Option<RecordTimestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCodecData {
    pub command_type: CommandType,
    pub responses: Vec<CommandResponse>,
}

fn bytes_to_ascii_view(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn read_u8(data: &[u8], cursor: usize) -> Result<u8> {
    data.get(cursor).copied().ok_or(TeltonikaError::TruncatedBuffer {
        need: cursor + 1,
        have: data.len(),
    })
}

fn read_u32(data: &[u8], cursor: usize) -> Result<u32> {
    if data.len() < cursor + 4 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: cursor + 4,
            have: data.len(),
        });
    }
    Ok(BigEndian::read_u32(&data[cursor..cursor + 4]))
}

fn need(data: &[u8], cursor: usize, len: usize) -> Result<()> {
    if data.len() < cursor + len {
        return Err(TeltonikaError::TruncatedBuffer {
            need: cursor + len,
            have: data.len(),
        });
    }
    Ok(())
}

/// Decodes a command-response body starting at the leading count byte.
/// Returns the decoded data and the number of bytes consumed, including
/// the trailing count byte.
pub fn decode_command_body(codec: CommandCodec, data: &[u8]) -> Result<(CommandCodecData, usize)> {
    let declared = read_u8(data, 0)? as usize;
    let mut cursor = 1usize;

    let command_type = CommandType::from_byte(read_u8(data, cursor)?)?;
    cursor += 1;
    if codec == CommandCodec::Codec13 && command_type == CommandType::Command {
        return Err(TeltonikaError::UnsupportedTypeForCodec(command_type.to_byte()));
    }

    let min_header = match codec {
        CommandCodec::Codec12 => 0usize,
        CommandCodec::Codec13 => 8,
        CommandCodec::Codec14 => 8,
        CommandCodec::Codec15 => 12,
    };

    let mut responses = Vec::with_capacity(declared);
    for _ in 0..declared {
        let response_size = read_u32(data, cursor)? as usize;
        cursor += 4;
        if response_size < min_header {
            return Err(TeltonikaError::TruncatedBuffer {
                need: min_header,
                have: response_size,
            });
        }

        let (timestamp, imei, message_len) = match codec {
            CommandCodec::Codec12 => (None, None, response_size),
            CommandCodec::Codec13 => {
                need(data, cursor, 8)?;
                let ts = decode_timestamp_millis(&data[cursor..cursor + 8])?;
                cursor += 8;
                (Some(RecordTimestamp::Millis(ts)), None, response_size - 8)
            }
            CommandCodec::Codec14 => {
                need(data, cursor, 8)?;
                let imei = encode_hex(&data[cursor..cursor + 8]);
                cursor += 8;
                (None, Some(imei), response_size - 8)
            }
            CommandCodec::Codec15 => {
                need(data, cursor, 4)?;
                let ts = decode_timestamp_seconds(&data[cursor..cursor + 4])?;
                cursor += 4;
                need(data, cursor, 8)?;
                let imei = encode_hex(&data[cursor..cursor + 8]);
                cursor += 8;
                (Some(RecordTimestamp::Seconds(ts)), Some(imei), response_size - 12)
            }
        };

        need(data, cursor, message_len)?;
        let message = &data[cursor..cursor + message_len];
        let response = bytes_to_ascii_view(message);
        let hex_message = encode_hex(message);
        cursor += message_len;

        responses.push(CommandResponse {
            response,
            hex_message,
            imei,
            timestamp,
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

    Ok((
        CommandCodecData {
            command_type,
            responses,
        },
        cursor,
    ))
}

/// Encodes a command-response body (leading count, response_type, blocks,
/// trailing count). Does not include `codec_id` or the CRC suffix.
pub fn encode_command_body(codec: CommandCodec, data: &CommandCodecData) -> Result<Vec<u8>> {
    if codec == CommandCodec::Codec13 && data.command_type == CommandType::Command {
        return Err(TeltonikaError::UnsupportedTypeForCodec(
            CommandType::Command.to_byte(),
        ));
    }
    if data.responses.len() > u8::MAX as usize {
        return Err(TeltonikaError::InvalidIoWidth(data.responses.len()));
    }

    let mut out = Vec::new();
    out.push(data.responses.len() as u8);
    out.push(data.command_type.to_byte());

    for response in &data.responses {
        let message = crate::primitives::decode_hex(&response.hex_message)?;
        let header_len: usize = match codec {
            CommandCodec::Codec12 => 0,
            CommandCodec::Codec13 => 8,
            CommandCodec::Codec14 => 8,
            CommandCodec::Codec15 => 12,
        };
        let response_size = header_len + message.len();
        let mut size_buf = [0u8; 4];
        BigEndian::write_u32(&mut size_buf, response_size as u32);
        out.extend_from_slice(&size_buf);

        match codec {
            CommandCodec::Codec12 => {}
            CommandCodec::Codec13 => {
                let millis = match response.timestamp {
                    Some(RecordTimestamp::Millis(ms)) => ms,
                    _ => return Err(TeltonikaError::NilField("timestamp")),
                };
                out.extend_from_slice(&millis.to_be_bytes());
            }
            CommandCodec::Codec14 => {
                let imei = response
                    .imei
                    .as_ref()
                    .ok_or(TeltonikaError::NilField("imei"))?;
                out.extend_from_slice(&crate::primitives::decode_hex(imei)?);
            }
            CommandCodec::Codec15 => {
                let seconds = match response.timestamp {
                    Some(RecordTimestamp::Seconds(s)) => s,
                    _ => return Err(TeltonikaError::NilField("timestamp")),
                };
                out.extend_from_slice(&seconds.to_be_bytes());
                let imei = response
                    .imei
                    .as_ref()
                    .ok_or(TeltonikaError::NilField("imei"))?;
                out.extend_from_slice(&crate::primitives::decode_hex(imei)?);
            }
        }

        out.extend_from_slice(&message);
    }

    out.push(data.responses.len() as u8);
    Ok(out)
}
