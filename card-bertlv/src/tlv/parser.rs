//! BER-TLV Parser
//!
//! Reads the variable-width tag and length fields of BER-TLV records as used
//! in smart card responses, and walks one buffer segment record by record.
//!
//! Only the field shapes that occur in card data are accepted:
//! - tags of 1 to 3 bytes
//! - lengths in short form (`00..7F`) or long form `81 xx` / `82 xx xx`
//!
//! Everything else is a hard parse error.

use thiserror::Error;

use super::error::TLVError;

/// Bit of the first tag byte that marks a constructed tag
pub const CONSTRUCTED_BIT: u8 = 0x20;

/// Low five bits of the first tag byte announcing a multi-byte tag number
const TAG_NUMBER_ESCAPE: u8 = 0x1F;

/// Continuation bit of the subsequent tag bytes
const TAG_CONTINUATION: u8 = 0x80;

/// Errors that can occur while walking a TLV buffer
///
/// These are folded into [`TLVError::InvalidStructure`] at the public boundary;
/// the variants only serve diagnostics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of data at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid tag at offset {offset}: more than three tag bytes")]
    InvalidTag { offset: usize },

    #[error("Invalid length field 0x{first_byte:02X} at offset {offset}")]
    InvalidLength { offset: usize, first_byte: u8 },

    #[error("Nesting depth exceeds {0}")]
    DepthExceeded(usize),

    #[error("Empty TLV segment")]
    EmptySegment,
}

/// One `(tag, constructed, value)` record sliced out of a buffer
///
/// `value` borrows from the decoded buffer and is never copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TLVRecord<'a> {
    /// The tag id (1-3 bytes, big-endian, class and constructed bits included)
    pub tag: u32,
    /// Whether bit 0x20 of the first tag byte is set
    pub constructed: bool,
    /// The raw value bytes
    pub value: &'a [u8],
}

impl<'a> TLVRecord<'a> {
    /// Number of bytes the tag occupied in the encoding
    pub fn tag_width(&self) -> usize {
        if self.tag > 0xFFFF {
            3
        } else if self.tag > 0xFF {
            2
        } else {
            1
        }
    }
}

fn byte_at(data: &[u8], offset: usize) -> Result<u8, ParseError> {
    data.get(offset)
        .copied()
        .ok_or(ParseError::TruncatedInput {
            offset,
            needed: 1,
            available: 0,
        })
}

fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(ParseError::TruncatedInput {
            offset,
            needed: len,
            available: data.len().saturating_sub(offset),
        })
}

/// Check the constructed bit of a first tag byte
#[inline]
pub fn is_constructed_byte(first_tag_byte: u8) -> bool {
    (first_tag_byte & CONSTRUCTED_BIT) != 0
}

/// Determine how many bytes the tag starting at `offset` occupies (1-3)
pub fn read_tag_width(data: &[u8], offset: usize) -> Result<usize, ParseError> {
    let first = byte_at(data, offset)?;

    if (first & TAG_NUMBER_ESCAPE) != TAG_NUMBER_ESCAPE {
        return Ok(1);
    }

    let second = byte_at(data, offset + 1)?;
    if (second & TAG_CONTINUATION) == 0 {
        return Ok(2);
    }

    // A second continuation byte would make a 4-byte tag
    let third = byte_at(data, offset + 2)?;
    if (third & TAG_CONTINUATION) != 0 {
        return Err(ParseError::InvalidTag { offset });
    }

    Ok(3)
}

/// Decode the tag id of `width` bytes starting at `offset`
pub fn read_tag_id(data: &[u8], offset: usize, width: usize) -> Result<u32, ParseError> {
    if !(1..=3).contains(&width) {
        return Err(ParseError::InvalidTag { offset });
    }
    let bytes = slice_at(data, offset, width)?;
    Ok(bytes.iter().fold(0u32, |tag, &b| (tag << 8) | b as u32))
}

/// Determine how many bytes the length field starting at `offset` occupies (1-3)
pub fn read_length_width(data: &[u8], offset: usize) -> Result<usize, ParseError> {
    match byte_at(data, offset)? {
        0x00..=0x7F => Ok(1),
        0x81 => Ok(2),
        0x82 => Ok(3),
        // 0x80 is indefinite length, 0x83.. would exceed 65535
        first_byte => Err(ParseError::InvalidLength { offset, first_byte }),
    }
}

/// Decode the value length from a length field of `width` bytes at `offset`
pub fn read_length(data: &[u8], offset: usize, width: usize) -> Result<usize, ParseError> {
    match width {
        1 => Ok((byte_at(data, offset)? & 0x7F) as usize),
        2 => Ok(byte_at(data, offset + 1)? as usize),
        3 => {
            let bytes = slice_at(data, offset + 1, 2)?;
            Ok(((bytes[0] as usize) << 8) | bytes[1] as usize)
        }
        _ => Err(ParseError::InvalidLength {
            offset,
            first_byte: byte_at(data, offset)?,
        }),
    }
}

/// Read the record starting at `offset`
///
/// Returns the record and the offset just past its value.
pub fn read_record(data: &[u8], offset: usize) -> Result<(TLVRecord<'_>, usize), ParseError> {
    let tag_width = read_tag_width(data, offset)?;
    let tag = read_tag_id(data, offset, tag_width)?;
    let constructed = is_constructed_byte(byte_at(data, offset)?);

    let length_offset = offset + tag_width;
    let length_width = read_length_width(data, length_offset)?;
    let length = read_length(data, length_offset, length_width)?;

    let value_offset = length_offset + length_width;
    let value = slice_at(data, value_offset, length)?;

    Ok((
        TLVRecord {
            tag,
            constructed,
            value,
        },
        value_offset + length,
    ))
}

/// Walks the records of one buffer segment, without descending into
/// constructed values
///
/// A segment is valid only if it ends exactly on a record boundary. An empty
/// segment is rejected. The reader stops after the first error.
///
/// # Example
/// ```ignore
/// let data = [0x84, 0x02, 0x31, 0x54, 0x53, 0x00];
/// for record in TLVReader::new(&data) {
///     let record = record?;
///     println!("Tag: 0x{:X}, Length: {}", record.tag, record.value.len());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TLVReader<'a> {
    data: &'a [u8],
    position: usize,
    done: bool,
}

impl<'a> TLVReader<'a> {
    /// Create a reader over `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            done: false,
        }
    }

    /// Get current position in the segment
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read the next record, `Ok(None)` once the segment is exhausted
    pub(crate) fn next_record(&mut self) -> Result<Option<TLVRecord<'a>>, ParseError> {
        if self.done {
            return Ok(None);
        }
        if self.data.is_empty() {
            self.done = true;
            return Err(ParseError::EmptySegment);
        }
        if self.position == self.data.len() {
            self.done = true;
            return Ok(None);
        }

        match read_record(self.data, self.position) {
            Ok((record, next)) => {
                self.position = next;
                Ok(Some(record))
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }
}

impl<'a> Iterator for TLVReader<'a> {
    type Item = Result<TLVRecord<'a>, TLVError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().map_err(TLVError::from).transpose()
    }
}

impl std::iter::FusedIterator for TLVReader<'_> {}
