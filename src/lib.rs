//! Bidirectional codec for the Teltonika AVL telematics wire protocol.
//!
//! Covers the authentication handshake plus the AVL data codecs (`0x08`,
//! `0x8E`, `0x10`) and the command/response codecs (`0x0C`–`0x0F`). The
//! entry points are [router::decode_login_frame] and [router::decode_tram]
//! on the way in, and the per-codec `encode_*_frame` functions in
//! [router] on the way out.
//!
//! Every decode/encode call is a pure function of its input: no shared
//! state, no logging, no network I/O. Framing, stream reassembly, and
//! device configuration are out of scope — this crate consumes and
//! produces already-delimited buffers.

pub mod avl;
pub mod command;
pub mod error;
pub mod gps;
pub mod header;
pub mod io_table;
pub mod login;
pub mod primitives;
pub mod router;
pub mod timestamp;

pub use avl::{AvlCodec, AvlCodecData, AvlRecord};
pub use command::{CommandCodec, CommandCodecData, CommandResponse, CommandType};
pub use error::{Result, TeltonikaError};
pub use gps::GpsData;
pub use header::{HeaderData, Protocol};
pub use io_table::{GenerationType, IoData};
pub use login::LoginData;
pub use router::{
    decode_login_frame, decode_tram, CodecDecoded, CodecHeaderResponse, DecodedResult,
    EnvelopeKind, TramResult,
};
