//! I/O element table codecs shared by codecs 08, 8E, and 16.
//!
//! The three dialects differ only in id width, count width, and whether a
//! variable-width group is present; a single walker parameterised by
//! [Dialect] covers all three rather than three copy-pasted loops.

use crate::error::{Result, TeltonikaError};
use crate::primitives::encode_hex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Codec8,
    Codec8Ext,
    Codec16,
}

impl Dialect {
    fn count_width(self) -> usize {
        match self {
            Dialect::Codec8 => 1,
            Dialect::Codec8Ext => 2,
            Dialect::Codec16 => 1,
        }
    }

    fn id_width(self) -> usize {
        match self {
            Dialect::Codec8 => 1,
            Dialect::Codec8Ext => 2,
            Dialect::Codec16 => 2,
        }
    }

    fn has_variable_group(self) -> bool {
        matches!(self, Dialect::Codec8Ext)
    }

    fn has_generation_type(self) -> bool {
        matches!(self, Dialect::Codec16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    OnExit,
    OnEntrance,
    OnBoth,
    Reserved,
    Hysteresis,
    OnChange,
    Eventual,
    Periodical,
}

impl GenerationType {
    fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => GenerationType::OnExit,
            1 => GenerationType::OnEntrance,
            2 => GenerationType::OnBoth,
            3 => GenerationType::Reserved,
            4 => GenerationType::Hysteresis,
            5 => GenerationType::OnChange,
            6 => GenerationType::Eventual,
            7 => GenerationType::Periodical,
            other => return Err(TeltonikaError::UnsupportedCommandType(other)),
        })
    }

    fn to_byte(self) -> u8 {
        match self {
            GenerationType::OnExit => 0,
            GenerationType::OnEntrance => 1,
            GenerationType::OnBoth => 2,
            GenerationType::Reserved => 3,
            GenerationType::Hysteresis => 4,
            GenerationType::OnChange => 5,
            GenerationType::Eventual => 6,
            GenerationType::Periodical => 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoData {
    pub id: u16,
    /// Even-length lowercase hex string; byte-length selects the group.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoTable {
    pub ios: Vec<IoData>,
    pub generation_type: Option<GenerationType>,
    /// Cursor offset (relative to the slice passed to [decode_io_table])
    /// of the first byte after the table.
    pub consumed: usize,
}

fn read_uint(data: &[u8], cursor: usize, width: usize) -> Result<u64> {
    if data.len() < cursor + width {
        return Err(TeltonikaError::TruncatedBuffer {
            need: cursor + width,
            have: data.len(),
        });
    }
    let mut value = 0u64;
    for &b in &data[cursor..cursor + width] {
        value = (value << 8) | b as u64;
    }
    Ok(value)
}

fn read_group(data: &[u8], cursor: &mut usize, dialect: Dialect, width: usize) -> Result<Vec<IoData>> {
    let count = read_uint(data, *cursor, dialect.count_width())?;
    *cursor += dialect.count_width();
    let mut ios = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = read_uint(data, *cursor, dialect.id_width())? as u16;
        *cursor += dialect.id_width();
        if data.len() < *cursor + width {
            return Err(TeltonikaError::TruncatedBuffer {
                need: *cursor + width,
                have: data.len(),
            });
        }
        let value = encode_hex(&data[*cursor..*cursor + width]);
        *cursor += width;
        ios.push(IoData { id, value });
    }
    Ok(ios)
}

fn read_variable_group(data: &[u8], cursor: &mut usize, dialect: Dialect) -> Result<Vec<IoData>> {
    let count = read_uint(data, *cursor, dialect.count_width())?;
    *cursor += dialect.count_width();
    let mut ios = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = read_uint(data, *cursor, dialect.id_width())? as u16;
        *cursor += dialect.id_width();
        let len = read_uint(data, *cursor, 2)? as usize;
        *cursor += 2;
        if data.len() < *cursor + len {
            return Err(TeltonikaError::TruncatedBuffer {
                need: *cursor + len,
                have: data.len(),
            });
        }
        let value = encode_hex(&data[*cursor..*cursor + len]);
        *cursor += len;
        ios.push(IoData { id, value });
    }
    Ok(ios)
}

/// Decodes an I/O table starting at `data[start..]`. Reads all groups
/// (and the variable group, for 8E) even when their counts are zero; does
/// not short-circuit on the declared total.
pub fn decode_io_table(dialect: Dialect, data: &[u8], start: usize) -> Result<IoTable> {
    let mut cursor = start;

    let generation_type = if dialect.has_generation_type() {
        let byte = read_uint(data, cursor, 1)? as u8;
        cursor += 1;
        Some(GenerationType::from_byte(byte)?)
    } else {
        None
    };

    let _declared_total = read_uint(data, cursor, dialect.count_width())?;
    cursor += dialect.count_width();

    let mut ios = read_group(data, &mut cursor, dialect, 1)?;
    ios.extend(read_group(data, &mut cursor, dialect, 2)?);
    ios.extend(read_group(data, &mut cursor, dialect, 4)?);
    ios.extend(read_group(data, &mut cursor, dialect, 8)?);
    if dialect.has_variable_group() {
        ios.extend(read_variable_group(data, &mut cursor, dialect)?);
    }

    Ok(IoTable {
        ios,
        generation_type,
        consumed: cursor - start,
    })
}

fn value_bytes(io: &IoData) -> Result<Vec<u8>> {
    crate::primitives::decode_hex(&io.value)
}

fn group_by_width(ios: &[IoData], width: usize) -> Result<Vec<IoData>> {
    let mut group: Vec<IoData> = ios
        .iter()
        .filter_map(|io| match value_bytes(io) {
            Ok(bytes) if bytes.len() == width => Some(Ok(io.clone())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect::<Result<Vec<_>>>()?;
    group.sort_by_key(|io| io.id);
    Ok(group)
}

fn write_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    for shift in (0..width).rev() {
        out.push(((value >> (shift * 8)) & 0xFF) as u8);
    }
}

/// Largest value that fits in `width` bytes.
fn max_uint(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

fn check_id_range(dialect: Dialect, id: u16) -> Result<()> {
    if id as u64 > max_uint(dialect.id_width()) {
        return Err(TeltonikaError::InvalidIoIdRange(id as u32));
    }
    Ok(())
}

fn write_group(out: &mut Vec<u8>, dialect: Dialect, group: &[IoData]) -> Result<()> {
    write_uint(out, group.len() as u64, dialect.count_width());
    for io in group {
        check_id_range(dialect, io.id)?;
        write_uint(out, io.id as u64, dialect.id_width());
        out.extend_from_slice(&value_bytes(io)?);
    }
    Ok(())
}

/// Encodes an I/O table. Elements are bucketed into the 1/2/4/8-byte
/// groups by decoded value width (any other width goes to the variable
/// group for 8E, or is an error otherwise); each group is sorted by
/// ascending id for deterministic round-trip encoding.
pub fn encode_io_table(
    dialect: Dialect,
    ios: &[IoData],
    generation_type: Option<GenerationType>,
) -> Result<Vec<u8>> {
    if ios.len() as u64 > max_uint(dialect.count_width()) {
        return Err(TeltonikaError::InvalidIoWidth(ios.len()));
    }

    let one = group_by_width(ios, 1)?;
    let two = group_by_width(ios, 2)?;
    let four = group_by_width(ios, 4)?;
    let eight = group_by_width(ios, 8)?;
    let bucketed = one.len() + two.len() + four.len() + eight.len();

    let mut variable: Vec<IoData> = Vec::new();
    if bucketed < ios.len() {
        if !dialect.has_variable_group() {
            for io in ios {
                let len = value_bytes(io)?.len();
                if ![1, 2, 4, 8].contains(&len) {
                    return Err(TeltonikaError::InvalidIoWidth(len));
                }
            }
        }
        let bucketed_ids: std::collections::HashSet<u16> = one
            .iter()
            .chain(two.iter())
            .chain(four.iter())
            .chain(eight.iter())
            .map(|io| io.id)
            .collect();
        variable = ios
            .iter()
            .filter(|io| !bucketed_ids.contains(&io.id))
            .cloned()
            .collect();
        variable.sort_by_key(|io| io.id);
    }

    let mut out = Vec::new();
    if let Some(gen) = generation_type {
        out.push(gen.to_byte());
    } else if dialect.has_generation_type() {
        return Err(TeltonikaError::NilField("generation_type"));
    }

    write_uint(&mut out, ios.len() as u64, dialect.count_width());
    write_group(&mut out, dialect, &one)?;
    write_group(&mut out, dialect, &two)?;
    write_group(&mut out, dialect, &four)?;
    write_group(&mut out, dialect, &eight)?;

    if dialect.has_variable_group() {
        write_uint(&mut out, variable.len() as u64, dialect.count_width());
        for io in &variable {
            check_id_range(dialect, io.id)?;
            write_uint(&mut out, io.id as u64, dialect.id_width());
            let bytes = value_bytes(io)?;
            write_uint(&mut out, bytes.len() as u64, 2);
            out.extend_from_slice(&bytes);
        }
    }

    Ok(out)
}
