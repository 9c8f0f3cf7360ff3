use thiserror::Error;

/// A Teltonika codec `Result`, conveniently wrapping [TeltonikaError]
pub type Result<T> = std::result::Result<T, TeltonikaError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error types which can occur while parsing or building Teltonika frames.
pub enum TeltonikaError {
    #[error("buffer too short: need {need} bytes, have {have}")]
    TruncatedBuffer { need: usize, have: usize },

    #[error("header is not a valid TCP or UDP Teltonika header")]
    BadHeader,

    #[error("unknown codec id 0x{0:02X}")]
    UnknownCodec(u8),

    #[error("unsupported command type value {0}")]
    UnsupportedCommandType(u8),

    #[error("unsupported response type {0} for this codec")]
    UnsupportedTypeForCodec(u8),

    #[error("record count mismatch: header said {header}, trailer said {trailer}")]
    RecordCountMismatch { header: u64, trailer: u64 },

    #[error("GPS field {0} out of range")]
    InvalidGpsRange(&'static str),

    #[error("I/O value width {0} bytes is not one of 1/2/4/8")]
    InvalidIoWidth(usize),

    #[error("I/O id {0} out of range for this codec's id width")]
    InvalidIoIdRange(u32),

    #[error("frame CRC mismatch: received 0x{received:04X}, computed 0x{computed:04X}")]
    BadCrc { received: u16, computed: u16 },

    #[error("required field {0} missing")]
    NilField(&'static str),

    #[error("invalid hex at position {0}")]
    InvalidHex(usize),
}
