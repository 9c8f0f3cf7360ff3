//! Top-level envelope: dispatches a frame to the login decoder or to the
//! codec-specific AVL/command decoders by `codec_id`, and performs the
//! TCP CRC check over the span the codec decoder actually consumed (not
//! over the header's declared `data_length` — see design notes).

use crate::avl::{decode_avl_body, encode_avl_body, AvlCodec, AvlCodecData};
use crate::command::{decode_command_body, encode_command_body, CommandCodec, CommandCodecData};
use crate::error::{Result, TeltonikaError};
use crate::header::{decode_header, HeaderData, Protocol};
use crate::login::{decode_login, is_login, LoginData};
use crate::primitives::{append_crc16_ibm, is_valid_tram};

#[derive(Debug, Clone, PartialEq)]
pub enum TramResult {
    Avl(AvlCodecData),
    Command(CommandCodecData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodecHeaderResponse {
    pub header: HeaderData,
    pub codec_id: u8,
    pub result: TramResult,
}

/// What kind of frame a [CodecDecoded] envelope wraps. Unrecognized codec
/// ids still arrive over the tram path, so they carry `Tram`, not a third
/// kind of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Login,
    Tram,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedResult {
    Login(LoginData),
    Tram(CodecHeaderResponse),
    /// Codec not supported; carries the raw `codec_id` byte.
    Unknown(u8),
}

/// Polymorphic decode result. `error` is populated alongside a placeholder
/// `result` for recoverable dispatch failures (unknown codec); a CRC
/// mismatch is still fatal and returned as a bare `Err` from [decode_tram].
#[derive(Debug, Clone, PartialEq)]
pub struct CodecDecoded {
    pub kind: EnvelopeKind,
    pub result: DecodedResult,
    pub error: Option<TeltonikaError>,
}

/// Succeeds only when [is_login] recognizes the buffer.
pub fn decode_login_frame(buf: &[u8]) -> Result<CodecDecoded> {
    if !is_login(buf) {
        return Err(TeltonikaError::BadHeader);
    }
    Ok(CodecDecoded {
        kind: EnvelopeKind::Login,
        result: DecodedResult::Login(decode_login(buf)?),
        error: None,
    })
}

/// Parses the header, reads `codec_id`, dispatches to the AVL or command
/// decoder for the body, and validates CRC (TCP only) over the span the
/// codec decoder reports having consumed.
///
/// An unrecognized `codec_id` is not fatal: it comes back as
/// `Ok(CodecDecoded { result: DecodedResult::Unknown(codec_id), error: Some(..), .. })`
/// rather than a bare `Err`, per the router's polymorphic-result contract.
/// A CRC mismatch is fatal and still surfaces as `Err`.
pub fn decode_tram(buf: &[u8]) -> Result<CodecDecoded> {
    let (header, mut cursor) = decode_header(buf)?;

    if buf.len() < cursor + 1 {
        return Err(TeltonikaError::TruncatedBuffer {
            need: cursor + 1,
            have: buf.len(),
        });
    }
    let codec_id = buf[cursor];
    cursor += 1;
    let body = &buf[cursor..];

    let (result, consumed) = match codec_id {
        0x08 => {
            let (data, n) = decode_avl_body(AvlCodec::Codec8, body)?;
            (TramResult::Avl(data), n)
        }
        0x8E => {
            let (data, n) = decode_avl_body(AvlCodec::Codec8Ext, body)?;
            (TramResult::Avl(data), n)
        }
        0x10 => {
            let (data, n) = decode_avl_body(AvlCodec::Codec16, body)?;
            (TramResult::Avl(data), n)
        }
        0x0C => {
            let (data, n) = decode_command_body(CommandCodec::Codec12, body)?;
            (TramResult::Command(data), n)
        }
        0x0D => {
            let (data, n) = decode_command_body(CommandCodec::Codec13, body)?;
            (TramResult::Command(data), n)
        }
        0x0E => {
            let (data, n) = decode_command_body(CommandCodec::Codec14, body)?;
            (TramResult::Command(data), n)
        }
        0x0F => {
            let (data, n) = decode_command_body(CommandCodec::Codec15, body)?;
            (TramResult::Command(data), n)
        }
        other => {
            return Ok(CodecDecoded {
                kind: EnvelopeKind::Tram,
                result: DecodedResult::Unknown(other),
                error: Some(TeltonikaError::UnknownCodec(other)),
            });
        }
    };

    if header.protocol() == Protocol::Tcp {
        if body.len() < consumed + 4 {
            return Err(TeltonikaError::TruncatedBuffer {
                need: consumed + 4,
                have: body.len(),
            });
        }
        let mut tram = Vec::with_capacity(1 + consumed + 4);
        tram.push(codec_id);
        tram.extend_from_slice(&body[..consumed + 4]);
        if !is_valid_tram(&tram) {
            let received = u16::from_be_bytes([tram[tram.len() - 2], tram[tram.len() - 1]]);
            let computed = crate::primitives::crc16_ibm(&tram[..tram.len() - 4]);
            return Err(TeltonikaError::BadCrc { received, computed });
        }
    }

    Ok(CodecDecoded {
        kind: EnvelopeKind::Tram,
        result: DecodedResult::Tram(CodecHeaderResponse {
            header,
            codec_id,
            result,
        }),
        error: None,
    })
}

/// Encodes an AVL codec body and appends its CRC-16/IBM tail. The caller
/// prepends the 8-byte TCP header with `data_length = 1 + body.len()`.
pub fn encode_avl_frame(codec: AvlCodec, data: &AvlCodecData) -> Result<Vec<u8>> {
    let body = encode_avl_body(codec, data)?;
    let mut framed = Vec::with_capacity(1 + body.len());
    framed.push(codec.codec_id());
    framed.extend_from_slice(&body);
    Ok(append_crc16_ibm(&framed))
}

/// Encodes a command codec body and appends its CRC-16/IBM tail.
pub fn encode_command_frame(codec: CommandCodec, data: &CommandCodecData) -> Result<Vec<u8>> {
    let body = encode_command_body(codec, data)?;
    let mut framed = Vec::with_capacity(1 + body.len());
    framed.push(codec.codec_id());
    framed.extend_from_slice(&body);
    Ok(append_crc16_ibm(&framed))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_fixture_one_tcp() {
        let frame = hex::decode(
            "000000000000003608010000016B40D8EA30010000000000000000000000000000000105021503010101425E0F01F10000601A014E0000000000000000010000C7CF",
        )
        .unwrap();
        let decoded = decode_tram(&frame).unwrap();
        assert_eq!(decoded.kind, EnvelopeKind::Tram);
        assert!(decoded.error.is_none());
        match decoded.result {
            DecodedResult::Tram(resp) => {
                assert_eq!(resp.codec_id, 0x08);
                match resp.result {
                    TramResult::Avl(data) => assert_eq!(data.records.len(), 1),
                    _ => panic!("expected AVL result"),
                }
            }
            _ => panic!("expected Tram"),
        }
    }

    #[test]
    fn decodes_fixture_three_ignores_bad_data_length() {
        // data_length header field (0x42) undercounts the real body.
        let frame = hex::decode(
            "00000000000000428E010000016B412CEE000100000000000000000000000000000000010005000100010100010011001D00010010015E2C880002000B000000003544C87A000E000000001DD7E06A00000100002994",
        )
        .unwrap();
        let decoded = decode_tram(&frame).unwrap();
        match decoded.result {
            DecodedResult::Tram(resp) => assert_eq!(resp.codec_id, 0x8E),
            _ => panic!("expected Tram"),
        }
    }

    #[test]
    fn decodes_fixture_six_udp_no_crc() {
        let frame = hex::decode(
            "003DCAFE0105000F33353230393330383634303336353508010000016B4F815B30010000000000000000000000000000000103021503010101425DBC000001",
        )
        .unwrap();
        let decoded = decode_tram(&frame).unwrap();
        match decoded.result {
            DecodedResult::Tram(resp) => {
                assert_eq!(resp.codec_id, 0x08);
                match resp.header {
                    HeaderData::Udp(_) => {}
                    _ => panic!("expected UDP header"),
                }
            }
            _ => panic!("expected Tram"),
        }
    }

    #[test]
    fn decodes_fixture_five_login() {
        let frame = hex::decode("000F333536333037303432343431303133").unwrap();
        let decoded = decode_login_frame(&frame).unwrap();
        assert_eq!(decoded.kind, EnvelopeKind::Login);
        match decoded.result {
            DecodedResult::Login(login) => assert_eq!(login.imei, b"356307042441013"),
            _ => panic!("expected Login"),
        }
    }

    #[test]
    fn bitflipped_crc_is_rejected() {
        let mut frame = hex::decode(
            "000000000000003608010000016B40D8EA30010000000000000000000000000000000105021503010101425E0F01F10000601A014E0000000000000000010000C7CF",
        )
        .unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        assert!(matches!(decode_tram(&frame), Err(TeltonikaError::BadCrc { .. })));
    }

    #[test]
    fn unknown_codec_returns_placeholder_envelope_not_err() {
        let frame = hex::decode("0000000000000003FF00000000").unwrap();
        let decoded = decode_tram(&frame).expect("unknown codec is not a hard error");
        assert_eq!(decoded.kind, EnvelopeKind::Tram);
        assert_eq!(decoded.result, DecodedResult::Unknown(0xFF));
        assert_eq!(decoded.error, Some(TeltonikaError::UnknownCodec(0xFF)));
    }
}
