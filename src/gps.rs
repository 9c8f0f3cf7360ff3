//! 14-byte GPS block codec: `[long(4)][lat(4)][alt(2)][ang(2)][sat(1)][spd(1)]`.
//!
//! Exactly 14 bytes in and out. The reserved byte some AVL records carry
//! after this block is owned by `avl.rs`, not here.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Result, TeltonikaError};
use crate::primitives::{scale_coordinate, unscale_coordinate};

pub const GPS_BLOCK_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsData {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: i16,
    pub angle: u16,
    pub satellites: u8,
    pub speed: u8,
}

/// Decodes a 14-byte GPS block. `data` must be at least 14 bytes; extra
/// trailing bytes are ignored (the caller owns cursor advancement).
pub fn decode_gps(data: &[u8]) -> Result<GpsData> {
    if data.len() < GPS_BLOCK_LEN {
        return Err(TeltonikaError::TruncatedBuffer {
            need: GPS_BLOCK_LEN,
            have: data.len(),
        });
    }
    let long_raw = BigEndian::read_u32(&data[0..4]) as i32;
    let lat_raw = BigEndian::read_u32(&data[4..8]) as i32;
    let altitude = BigEndian::read_u16(&data[8..10]) as i16;
    let angle = BigEndian::read_u16(&data[10..12]);
    let satellites = data[12];
    let speed = data[13];

    Ok(GpsData {
        longitude: unscale_coordinate(long_raw),
        latitude: unscale_coordinate(lat_raw),
        altitude,
        angle,
        satellites,
        speed,
    })
}

/// Encodes a GPS block to exactly 14 bytes, rejecting out-of-range fields.
pub fn encode_gps(gps: &GpsData) -> Result<[u8; GPS_BLOCK_LEN]> {
    let long_raw = scale_coordinate(gps.longitude, "longitude")?;
    let lat_raw = scale_coordinate(gps.latitude, "latitude")?;

    let mut buf = [0u8; GPS_BLOCK_LEN];
    BigEndian::write_u32(&mut buf[0..4], long_raw as u32);
    BigEndian::write_u32(&mut buf[4..8], lat_raw as u32);
    BigEndian::write_u16(&mut buf[8..10], gps.altitude as u16);
    BigEndian::write_u16(&mut buf[10..12], gps.angle);
    buf[12] = gps.satellites;
    buf[13] = gps.speed;
    Ok(buf)
}
