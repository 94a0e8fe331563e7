//! BER-TLV Encoder
//!
//! Encodes TLV structures in exactly the shapes the decoder accepts, for
//! building card responses in tests and host tools.

use super::error::{TLVError, TLVResult};
use super::MAX_TAG_ID;

/// Largest value length a two-byte length field can carry
pub const MAX_VALUE_LENGTH: usize = 0xFFFF;

/// TLV Encoder for building BER-TLV structures
pub struct TLVEncoder;

impl TLVEncoder {
    /// Encode a tag-value pair to bytes
    pub fn encode(tag: u32, value: &[u8]) -> TLVResult<Vec<u8>> {
        let tag_bytes = Self::encode_tag(tag)?;
        let length_bytes = Self::encode_length(value.len())?;

        let mut result = Vec::with_capacity(tag_bytes.len() + length_bytes.len() + value.len());
        result.extend(tag_bytes);
        result.extend(length_bytes);
        result.extend_from_slice(value);
        Ok(result)
    }

    /// Encode just the tag bytes
    ///
    /// The tag id already carries its encoding, so this only splits it into
    /// 1, 2 or 3 big-endian bytes.
    pub fn encode_tag(tag: u32) -> TLVResult<Vec<u8>> {
        if tag > MAX_TAG_ID {
            return Err(TLVError::OutOfRange(tag));
        }
        let bytes = if tag > 0xFFFF {
            vec![(tag >> 16) as u8, (tag >> 8) as u8, tag as u8]
        } else if tag > 0xFF {
            vec![(tag >> 8) as u8, tag as u8]
        } else {
            vec![tag as u8]
        };
        Ok(bytes)
    }

    /// Encode just the length bytes
    pub fn encode_length(length: usize) -> TLVResult<Vec<u8>> {
        match length {
            // Short form
            0..=0x7F => Ok(vec![length as u8]),
            // Long form, 1 byte
            0x80..=0xFF => Ok(vec![0x81, length as u8]),
            // Long form, 2 bytes
            0x100..=MAX_VALUE_LENGTH => Ok(vec![0x82, (length >> 8) as u8, length as u8]),
            _ => Err(TLVError::ValueTooLong(length)),
        }
    }

    /// Build a constructed TLV from pre-encoded children
    pub fn build_constructed(tag: u32, children: &[&[u8]]) -> TLVResult<Vec<u8>> {
        Self::encode(tag, &children.concat())
    }
}

/// Builder for constructing nested TLV structures
///
/// The first encoding error is kept and returned by [`TLVBuilder::build`].
///
/// # Example
/// ```ignore
/// let fci = TLVBuilder::new()
///     .add(tags::APPLICATION_SERIAL_NUMBER, &serial)
///     .wrap(tags::FCI_ISSUER_DISCRETIONARY_DATA)
///     .wrap(tags::FCI_PROPRIETARY_TEMPLATE)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct TLVBuilder {
    data: Vec<u8>,
    error: Option<TLVError>,
}

impl TLVBuilder {
    /// Create a new TLV builder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, encoded: TLVResult<Vec<u8>>) -> Self {
        if self.error.is_none() {
            match encoded {
                Ok(bytes) => self.data.extend(bytes),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    /// Add a primitive TLV
    pub fn add(self, tag: u32, value: &[u8]) -> Self {
        let encoded = TLVEncoder::encode(tag, value);
        self.push(encoded)
    }

    /// Add raw bytes (pre-encoded TLV)
    pub fn add_raw(mut self, data: &[u8]) -> Self {
        if self.error.is_none() {
            self.data.extend_from_slice(data);
        }
        self
    }

    /// Wrap current content in a constructed tag
    pub fn wrap(self, tag: u32) -> Self {
        let encoded = TLVEncoder::encode(tag, &self.data);
        Self {
            data: Vec::new(),
            error: self.error,
        }
        .push(encoded)
    }

    /// Build the final byte vector
    pub fn build(self) -> TLVResult<Vec<u8>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }

    /// Get current length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
