//! BER-TLV Decoder
//!
//! Flattens a (possibly nested) BER-TLV structure into a map keyed by tag id.
//! Constructed tags are walked depth-first, left to right, and their children
//! land in the same map as top-level tags.
//!
//! Two result disciplines share the walker:
//! - [`decode_last_wins`]: one value per tag, the last one visited survives
//! - [`decode_multi`]: every value per tag, in visiting order

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::error::{TLVError, TLVResult};
use super::hexify;
use super::parser::{ParseError, TLVReader};

/// Default bound on the nesting depth of constructed tags
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Tag id to value, one value per tag
pub type TagMap<'a> = HashMap<u32, &'a [u8]>;

/// Tag id to all its values, in the order the walk visited them
pub type MultiTagMap<'a> = HashMap<u32, Vec<&'a [u8]>>;

/// Decoder settings
///
/// Serializable so that a host application can keep it in its own JSON
/// configuration; missing fields take their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Also store the raw value of constructed tags
    pub include_constructed: bool,
    /// Deepest constructed nesting accepted (top-level segment is depth 0)
    pub max_depth: usize,
}

impl DecodeOptions {
    /// Options with the default depth bound
    pub fn new(include_constructed: bool) -> Self {
        Self {
            include_constructed,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Where decoded values go
trait Accumulator<'a> {
    fn record(&mut self, tag: u32, value: &'a [u8]);
}

impl<'a> Accumulator<'a> for TagMap<'a> {
    fn record(&mut self, tag: u32, value: &'a [u8]) {
        self.insert(tag, value);
    }
}

impl<'a> Accumulator<'a> for MultiTagMap<'a> {
    fn record(&mut self, tag: u32, value: &'a [u8]) {
        self.entry(tag).or_default().push(value);
    }
}

/// Walk one segment, recursing into constructed values
///
/// A constructed tag's own value is recorded before any of its children.
fn walk<'a, A: Accumulator<'a>>(
    segment: &'a [u8],
    options: &DecodeOptions,
    depth: usize,
    tlvs: &mut A,
) -> Result<(), ParseError> {
    let mut reader = TLVReader::new(segment);

    while let Some(record) = reader.next_record()? {
        trace!(
            "depth {} tag 0x{:X} constructed={} len={} value={}",
            depth,
            record.tag,
            record.constructed,
            record.value.len(),
            hexify(record.value)
        );

        if record.constructed {
            if options.include_constructed {
                tlvs.record(record.tag, record.value);
            }
            if depth >= options.max_depth {
                return Err(ParseError::DepthExceeded(options.max_depth));
            }
            walk(record.value, options, depth + 1, tlvs)?;
        } else {
            tlvs.record(record.tag, record.value);
        }
    }

    Ok(())
}

fn decode_into<'a, A: Accumulator<'a>>(
    buffer: &'a [u8],
    options: &DecodeOptions,
    tlvs: &mut A,
) -> TLVResult<()> {
    walk(buffer, options, 0, tlvs).map_err(|e| {
        debug!("Rejecting {} byte TLV buffer: {}", buffer.len(), e);
        TLVError::from(e)
    })
}

/// Decode `buffer` keeping every value of every tag
///
/// # Arguments
/// * `buffer` - Raw bytes to decode
/// * `include_constructed` - If true, constructed tags are stored too, with
///   their raw nested value
///
/// # Example
/// ```ignore
/// let tlvs = decode_multi(&data, false)?;
/// for value in tlvs.get(&0xC1).into_iter().flatten() {
///     println!("C1: {}", hexify(value));
/// }
/// ```
pub fn decode_multi(buffer: &[u8], include_constructed: bool) -> TLVResult<MultiTagMap<'_>> {
    decode_multi_with(buffer, &DecodeOptions::new(include_constructed))
}

/// [`decode_multi`] with explicit options
pub fn decode_multi_with<'a>(
    buffer: &'a [u8],
    options: &DecodeOptions,
) -> TLVResult<MultiTagMap<'a>> {
    let mut tlvs = MultiTagMap::new();
    decode_into(buffer, options, &mut tlvs)?;
    Ok(tlvs)
}

/// Decode `buffer` keeping one value per tag
///
/// When a tag id occurs more than once, anywhere in the structure, the value
/// visited last in a depth-first, left-to-right walk wins. A child sharing its
/// parent's tag id therefore overwrites the parent.
pub fn decode_last_wins(buffer: &[u8], include_constructed: bool) -> TLVResult<TagMap<'_>> {
    decode_last_wins_with(buffer, &DecodeOptions::new(include_constructed))
}

/// [`decode_last_wins`] with explicit options
pub fn decode_last_wins_with<'a>(
    buffer: &'a [u8],
    options: &DecodeOptions,
) -> TLVResult<TagMap<'a>> {
    let mut tlvs = TagMap::new();
    decode_into(buffer, options, &mut tlvs)?;
    Ok(tlvs)
}
