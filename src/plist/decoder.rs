use thiserror::Error;
use tracing::debug;

use super::value::{Dictionary, PlistDate, Value};

const MAGIC: &[u8] = b"bplist00";
const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 32;
/// Deepest container nesting accepted below the root object
pub const MAX_DEPTH: usize = 256;
/// Decoded values allowed per input byte; shared objects are copied once per reference
const VALUES_PER_BYTE: usize = 4;

/// The byte stream is not a structurally valid binary property list
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing \"bplist00\" header")]
    MissingHeader,
    #[error("data is too short to hold a property list ({0} bytes)")]
    Truncated(usize),
    #[error("invalid trailer: {0}")]
    InvalidTrailer(&'static str),
    #[error("object reference {index} is out of range (object count {count})")]
    ObjectOutOfRange { index: u64, count: u64 },
    #[error("object offset {0:#x} lies outside the object area")]
    OffsetOutOfRange(u64),
    #[error("unknown object marker {marker:#04x} at offset {offset:#x}")]
    UnknownMarker { marker: u8, offset: usize },
    #[error("object at offset {0:#x} extends past the object area")]
    UnexpectedEnd(usize),
    #[error("invalid UTF-16 string at offset {0:#x}")]
    InvalidUtf16(usize),
    #[error("dictionary key at offset {0:#x} is not a string")]
    NonStringKey(usize),
    #[error("object {0} contains itself")]
    CyclicReference(u64),
    #[error("containers are nested more than {0} levels deep")]
    TooDeep(usize),
    #[error("shared objects expand to more than {0} values")]
    TooManyValues(usize),
}

/// Trailer fields, as stored in the last 32 bytes of the container
#[derive(Clone, Copy, Debug)]
struct Trailer {
    offset_size: usize,
    ref_size: usize,
    object_count: u64,
    root_object: u64,
    offset_table_start: usize,
}

impl Trailer {
    fn parse(data: &[u8]) -> Result<Self, FormatError> {
        let trailer = &data[data.len() - TRAILER_LEN..];

        let offset_size = trailer[6] as usize;
        let ref_size = trailer[7] as usize;
        let object_count = read_uint(&trailer[8..16]);
        let root_object = read_uint(&trailer[16..24]);
        let offset_table_start = read_uint(&trailer[24..32]);

        if !(1..=8).contains(&offset_size) {
            return Err(FormatError::InvalidTrailer("offset size must be 1 to 8 bytes"));
        }
        if !(1..=8).contains(&ref_size) {
            return Err(FormatError::InvalidTrailer(
                "object reference size must be 1 to 8 bytes",
            ));
        }
        if object_count == 0 {
            return Err(FormatError::InvalidTrailer("object count is zero"));
        }
        if root_object >= object_count {
            return Err(FormatError::InvalidTrailer("root object index is out of range"));
        }

        let trailer_start = (data.len() - TRAILER_LEN) as u64;
        if offset_table_start < HEADER_LEN as u64 || offset_table_start > trailer_start {
            return Err(FormatError::InvalidTrailer(
                "offset table does not lie between header and trailer",
            ));
        }
        let table_len = object_count
            .checked_mul(offset_size as u64)
            .ok_or(FormatError::InvalidTrailer("offset table size overflows"))?;
        if offset_table_start
            .checked_add(table_len)
            .map_or(true, |end| end > trailer_start)
        {
            return Err(FormatError::InvalidTrailer(
                "offset table runs into the trailer",
            ));
        }

        Ok(Trailer {
            offset_size,
            ref_size,
            object_count,
            root_object,
            // Bounded by data.len() above
            offset_table_start: offset_table_start as usize,
        })
    }
}

/// Decodes a binary property list into a [`Value`] tree
///
/// Decoding is deterministic: identical input always yields an identical tree.
pub fn decode(data: &[u8]) -> Result<Value, FormatError> {
    if data.len() < HEADER_LEN || !data.starts_with(MAGIC) {
        return Err(FormatError::MissingHeader);
    }
    if data.len() < HEADER_LEN + TRAILER_LEN {
        return Err(FormatError::Truncated(data.len()));
    }

    let trailer = Trailer::parse(data)?;
    let mut decoder = Decoder::new(data, trailer)?;
    let root = decoder.object(trailer.root_object, 0)?;

    debug!(
        bytes = data.len(),
        objects = trailer.object_count,
        values = decoder.produced,
        root = root.kind_name(),
        "decoded binary property list"
    );

    Ok(root)
}

struct Decoder<'a> {
    data: &'a [u8],
    trailer: Trailer,
    offsets: Vec<usize>,
    /// Decoded objects with the number of values each one expands to
    cache: Vec<Option<(Value, usize)>>,
    in_progress: Vec<bool>,
    /// Values produced so far, copies of shared objects included
    produced: usize,
    budget: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], trailer: Trailer) -> Result<Self, FormatError> {
        let count = trailer.object_count as usize;
        let mut offsets = Vec::with_capacity(count);

        for i in 0..count {
            let start = trailer.offset_table_start + i * trailer.offset_size;
            let offset = read_uint(&data[start..start + trailer.offset_size]);
            // Objects live between the header and the offset table
            if offset < HEADER_LEN as u64 || offset >= trailer.offset_table_start as u64 {
                return Err(FormatError::OffsetOutOfRange(offset));
            }
            offsets.push(offset as usize);
        }

        Ok(Decoder {
            data,
            trailer,
            offsets,
            cache: vec![None; count],
            in_progress: vec![false; count],
            produced: 0,
            budget: data.len().saturating_mul(VALUES_PER_BYTE),
        })
    }

    fn object(&mut self, index: u64, depth: usize) -> Result<Value, FormatError> {
        if depth > MAX_DEPTH {
            return Err(FormatError::TooDeep(MAX_DEPTH));
        }

        let slot = usize::try_from(index)
            .ok()
            .filter(|slot| *slot < self.offsets.len())
            .ok_or(FormatError::ObjectOutOfRange {
                index,
                count: self.trailer.object_count,
            })?;

        if let Some((value, size)) = &self.cache[slot] {
            let size = *size;
            // Checked before copying, so a hostile file cannot exhaust memory
            self.check_budget(size)?;
            let value = value.clone();
            self.produced += size;
            return Ok(value);
        }
        if self.in_progress[slot] {
            return Err(FormatError::CyclicReference(index));
        }

        let before = self.produced;
        self.in_progress[slot] = true;
        let value = self.parse_object(self.offsets[slot], depth)?;
        self.in_progress[slot] = false;

        self.check_budget(1)?;
        self.produced += 1;
        self.cache[slot] = Some((value.clone(), self.produced - before));
        Ok(value)
    }

    fn check_budget(&self, values: usize) -> Result<(), FormatError> {
        if self.produced.saturating_add(values) > self.budget {
            return Err(FormatError::TooManyValues(self.budget));
        }
        Ok(())
    }

    fn parse_object(&mut self, offset: usize, depth: usize) -> Result<Value, FormatError> {
        let marker = self.byte(offset)?;
        let info = marker & 0x0F;

        match marker >> 4 {
            0x0 => match info {
                0x0 | 0xF => Ok(Value::Null),
                0x8 => Ok(Value::Bool(false)),
                0x9 => Ok(Value::Bool(true)),
                _ => Err(FormatError::UnknownMarker { marker, offset }),
            },
            0x1 => {
                let (value, _) = self.integer(offset)?;
                Ok(Value::Integer(value))
            }
            0x2 => match info {
                0x2 => {
                    let bytes = self.slice(offset + 1, 4)?;
                    let bits = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    Ok(Value::Real(f32::from_bits(bits) as f64))
                }
                0x3 => Ok(Value::Real(self.float64(offset + 1)?)),
                _ => Err(FormatError::UnknownMarker { marker, offset }),
            },
            0x3 if info == 0x3 => Ok(Value::Date(PlistDate(self.float64(offset + 1)?))),
            0x4 => {
                let (len, start) = self.length(offset, info)?;
                Ok(Value::Bytes(self.slice(start, len)?.to_vec()))
            }
            0x5 => {
                let (len, start) = self.length(offset, info)?;
                Ok(Value::Text(decode_single_byte(self.slice(start, len)?)))
            }
            0x6 => {
                let (units, start) = self.length(offset, info)?;
                let len = units
                    .checked_mul(2)
                    .ok_or(FormatError::UnexpectedEnd(offset))?;
                let bytes = self.slice(start, len)?;
                let code_units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&code_units)
                    .map(Value::Text)
                    .map_err(|_| FormatError::InvalidUtf16(offset))
            }
            0x8 => {
                let width = info as usize + 1;
                if width > 8 {
                    return Err(FormatError::UnknownMarker { marker, offset });
                }
                Ok(Value::Uid(read_uint(self.slice(offset + 1, width)?)))
            }
            0xA | 0xC => {
                let (count, start) = self.length(offset, info)?;
                let refs = self.references(start, count)?;
                let mut items = Vec::with_capacity(refs.len());
                for reference in refs {
                    items.push(self.object(reference, depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            0xD => {
                let (count, start) = self.length(offset, info)?;
                let refs = self.references(start, count.saturating_mul(2))?;
                let (key_refs, value_refs) = refs.split_at(count);

                let mut dict = Dictionary::new();
                for (key_ref, value_ref) in key_refs.iter().zip(value_refs) {
                    let key = match self.object(*key_ref, depth + 1)? {
                        Value::Text(key) => key,
                        _ => return Err(FormatError::NonStringKey(offset)),
                    };
                    let value = self.object(*value_ref, depth + 1)?;
                    dict.insert(key, value);
                }
                Ok(Value::Dictionary(dict))
            }
            _ => Err(FormatError::UnknownMarker { marker, offset }),
        }
    }

    /// Reads an integer object, returning its value and total encoded length
    fn integer(&self, offset: usize) -> Result<(i128, usize), FormatError> {
        let marker = self.byte(offset)?;
        if marker >> 4 != 0x1 || marker & 0x0F > 4 {
            return Err(FormatError::UnknownMarker { marker, offset });
        }

        let width = 1usize << (marker & 0x0F);
        let bytes = self.slice(offset + 1, width)?;
        let value = match width {
            1 | 2 | 4 => read_uint(bytes) as i128,
            8 => read_uint(bytes) as i64 as i128,
            _ => {
                let mut buf = [0u8; 16];
                buf.copy_from_slice(bytes);
                i128::from_be_bytes(buf)
            }
        };

        Ok((value, 1 + width))
    }

    /// Returns the element count of a sized object and the offset of its payload
    fn length(&self, offset: usize, info: u8) -> Result<(usize, usize), FormatError> {
        if info != 0x0F {
            return Ok((info as usize, offset + 1));
        }

        let (len, encoded) = self.integer(offset + 1)?;
        let len = usize::try_from(len).map_err(|_| FormatError::UnexpectedEnd(offset))?;
        Ok((len, offset + 1 + encoded))
    }

    fn references(&self, start: usize, count: usize) -> Result<Vec<u64>, FormatError> {
        let ref_size = self.trailer.ref_size;
        let len = count
            .checked_mul(ref_size)
            .ok_or(FormatError::UnexpectedEnd(start))?;
        let bytes = self.slice(start, len)?;

        Ok(bytes.chunks_exact(ref_size).map(read_uint).collect())
    }

    fn float64(&self, offset: usize) -> Result<f64, FormatError> {
        let bytes = self.slice(offset, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(buf))
    }

    fn byte(&self, offset: usize) -> Result<u8, FormatError> {
        Ok(self.slice(offset, 1)?[0])
    }

    /// Bytes of the object area, which ends where the offset table starts
    fn slice(&self, start: usize, len: usize) -> Result<&'a [u8], FormatError> {
        let end = start
            .checked_add(len)
            .filter(|end| *end <= self.trailer.offset_table_start)
            .ok_or(FormatError::UnexpectedEnd(start))?;
        Ok(&self.data[start..end])
    }
}

/// Big-endian unsigned integer of 1 to 8 bytes
fn read_uint(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Single-byte strings are ASCII in well-formed files; anything else is taken
/// as UTF-8 when valid and as Latin-1 otherwise.
fn decode_single_byte(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|byte| char::from(*byte)).collect(),
    }
}
