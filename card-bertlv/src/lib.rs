//! BER-TLV decoding for smart card response data
//!
//! Smart card applications (EMV, Calypso, ISO 7816-4) answer commands such as
//! SELECT or READ RECORD with BER-TLV structures. This crate flattens those
//! structures, including nested constructed tags, into a map keyed by tag id.
//!
//! The decoder is stateless and synchronous. Values borrow from the input
//! buffer, and malformed input is always rejected as a whole.
//!
//! # Example
//! ```ignore
//! use card_bertlv::tlv::{decode_multi, tags};
//!
//! let tlvs = decode_multi(&fci, false)?;
//! let serial = tlvs[&tags::APPLICATION_SERIAL_NUMBER][0];
//! ```

pub mod apdu;
pub mod tlv;

pub use apdu::{build_apdu, is_case4, APDUError, CommandAPDU};
pub use tlv::{
    decode_last_wins, decode_multi, is_constructed_tag, DecodeOptions, TLVError, TLVResult,
};
