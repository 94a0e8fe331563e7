//! TLV (Tag-Length-Value) decoding
//!
//! This module implements the BER-TLV subset found in smart card response data
//! (EMV, Calypso, ISO 7816-4): 1 to 3 byte tags and 1 to 3 byte lengths.
//! Constructed tags are decoded recursively and flattened into one map keyed
//! by tag id. Values are borrowed from the input buffer.
//!
//! # Example
//! ```ignore
//! use card_bertlv::tlv::{decode_last_wins, hexify, tags};
//!
//! let fci = hex::decode("6F0B8409315449432E49434131").unwrap();
//! let tlvs = decode_last_wins(&fci, false)?;
//!
//! if let Some(df_name) = tlvs.get(&tags::DF_NAME) {
//!     println!("DF name: {}", hexify(df_name));
//! }
//! ```

mod decoder;
mod encoder;
mod error;
mod parser;

pub use decoder::{
    decode_last_wins, decode_last_wins_with, decode_multi, decode_multi_with, DecodeOptions,
    MultiTagMap, TagMap, DEFAULT_MAX_DEPTH,
};
pub use encoder::{TLVBuilder, TLVEncoder};
pub use error::{TLVError, TLVResult};
pub use parser::{
    read_length, read_length_width, read_tag_id, read_tag_width, ParseError, TLVReader, TLVRecord,
};

/// Largest tag id that fits in three tag bytes
pub const MAX_TAG_ID: u32 = 0xFF_FFFF;

/// Tell whether a decoded tag id denotes a constructed tag
///
/// The constructed flag is bit 0x20 of the first tag byte, so its position in
/// the id depends on how many bytes the tag has.
///
/// # Example
/// ```ignore
/// assert!(is_constructed_tag(0x6F)?);
/// assert!(!is_constructed_tag(0xDFEF2C)?);
/// ```
pub fn is_constructed_tag(tag_id: u32) -> TLVResult<bool> {
    if tag_id > MAX_TAG_ID {
        return Err(TLVError::OutOfRange(tag_id));
    }
    let constructed = if tag_id <= 0xFF {
        tag_id & 0x20 != 0
    } else if tag_id <= 0xFFFF {
        tag_id & 0x2000 != 0
    } else {
        tag_id & 0x20_0000 != 0
    };
    Ok(constructed)
}

/// Convert a byte slice to hex string for display
pub fn hexify(value: &[u8]) -> String {
    value.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ")
}

/// Tags of the File Control Information returned by SELECT on Calypso and
/// EMV applications
pub mod tags {
    pub const FCI_TEMPLATE: u32 = 0x6F;
    pub const DF_NAME: u32 = 0x84;
    pub const FCI_PROPRIETARY_TEMPLATE: u32 = 0xA5;
    pub const FCI_ISSUER_DISCRETIONARY_DATA: u32 = 0xBF0C;

    // Calypso, inside BF0C
    pub const APPLICATION_SERIAL_NUMBER: u32 = 0xC7;
    pub const DISCRETIONARY_DATA: u32 = 0x53;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk `data` recursively and check every record against `is_constructed_tag`
    fn check_constructed_flags(data: &[u8]) -> usize {
        let mut checked = 0;
        for record in TLVReader::new(data) {
            let record = record.unwrap();
            assert_eq!(
                is_constructed_tag(record.tag),
                Ok(record.constructed),
                "tag 0x{:X}",
                record.tag
            );
            checked += 1;
            if record.constructed && !record.value.is_empty() {
                checked += check_constructed_flags(record.value);
            }
        }
        checked
    }

    #[test]
    fn test_is_constructed_one_byte() {
        assert_eq!(is_constructed_tag(0x6F), Ok(true));
        assert_eq!(is_constructed_tag(0x84), Ok(false));
    }

    #[test]
    fn test_is_constructed_two_bytes() {
        assert_eq!(is_constructed_tag(0xBC0C), Ok(true));
        assert_eq!(is_constructed_tag(0xBF0C), Ok(true));
        assert_eq!(is_constructed_tag(0x9F0C), Ok(false));
    }

    #[test]
    fn test_is_constructed_three_bytes() {
        assert_eq!(is_constructed_tag(0x6FEF2C), Ok(true));
        assert_eq!(is_constructed_tag(0xDFEF2C), Ok(false));
    }

    #[test]
    fn test_is_constructed_out_of_range() {
        assert_eq!(is_constructed_tag(MAX_TAG_ID).map(|_| ()), Ok(()));
        assert_eq!(
            is_constructed_tag(0x100_0000),
            Err(TLVError::OutOfRange(0x100_0000))
        );
        assert_eq!(
            is_constructed_tag(u32::MAX),
            Err(TLVError::OutOfRange(u32::MAX))
        );
    }

    #[test]
    fn test_constructed_flags_agree_on_fci() {
        let tlv1 = hex::decode(
            "6F238409315449432E49434131A516BF0C13C708000000001122334453070A3C2005141001",
        )
        .unwrap();
        assert_eq!(check_constructed_flags(&tlv1), 6);

        let three_byte = hex::decode(
            "6F258409315449432E49434131A518BF0C15DFEF2C08000000001122334453070A3C2005141001",
        )
        .unwrap();
        assert_eq!(check_constructed_flags(&three_byte), 6);
    }

    #[test]
    fn test_constructed_flags_agree_on_all_tag_shapes() {
        let escapes = (0u8..=0xFF).filter(|b| b & 0x1F == 0x1F);

        for first in 0u8..=0xFF {
            if first & 0x1F != 0x1F {
                check_constructed_flags(&[first, 0x00]);
            }
        }
        for first in escapes {
            for second in 0u8..0x80 {
                check_constructed_flags(&[first, second, 0x00]);
            }
            for second in 0x80u8..=0xFF {
                for third in 0u8..0x80 {
                    check_constructed_flags(&[first, second, third, 0x00]);
                }
            }
        }
    }

    #[test]
    fn test_hexify() {
        assert_eq!(hexify(&[0x6F, 0x00, 0xBF]), "6F 00 BF");
        assert_eq!(hexify(&[]), "");
    }

    #[test]
    fn test_fci_tags() {
        let fci = hex::decode("6F0B8409315449432E49434131").unwrap();
        let tlvs = decode_last_wins(&fci, true).unwrap();
        assert_eq!(tlvs[&tags::DF_NAME], b"1TIC.ICA1");
        assert!(tlvs.contains_key(&tags::FCI_TEMPLATE));
    }
}
