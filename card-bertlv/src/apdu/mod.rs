//! APDU (Application Protocol Data Unit) command construction
//!
//! Builds ISO 7816-4 short command APDUs, the commands whose responses carry
//! the TLV data decoded by [`crate::tlv`].
//!
//! # Example
//! ```ignore
//! use card_bertlv::apdu::{ins, is_case4, CommandAPDU};
//!
//! // SELECT by DF name, expecting the FCI back
//! let aid = [0x31, 0x54, 0x49, 0x43, 0x2E, 0x49, 0x43, 0x41];
//! let select = CommandAPDU::with_data(0x00, ins::SELECT, 0x04, 0x00, aid.to_vec()).with_le(0x00);
//! let raw = select.to_bytes()?;
//! assert!(is_case4(&raw));
//! ```

use thiserror::Error;

/// Errors that can occur while building an APDU
#[derive(Debug, Error, PartialEq, Eq)]
pub enum APDUError {
    #[error("Command data too long for a short APDU: {0} bytes (max 255)")]
    DataTooLong(usize),
}

/// A command APDU
///
/// # Fields
/// - `cla`: Class byte
/// - `ins`: Instruction byte
/// - `p1`, `p2`: Parameter bytes (command-specific)
/// - `data`: Command data, `None` when the command has no Lc field
/// - `le`: Expected response length, `None` when the command has no Le field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAPDU {
    /// Class byte (CLA)
    pub cla: u8,
    /// Instruction byte (INS)
    pub ins: u8,
    /// Parameter 1 (P1)
    pub p1: u8,
    /// Parameter 2 (P2)
    pub p2: u8,
    /// Command data
    pub data: Option<Vec<u8>>,
    /// Expected response length (Le)
    pub le: Option<u8>,
}

impl CommandAPDU {
    /// Create a new APDU with just the header (CLA, INS, P1, P2)
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new APDU with data
    pub fn with_data(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            data: Some(data),
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Set the expected response length
    pub fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Serialize the command
    pub fn to_bytes(&self) -> Result<Vec<u8>, APDUError> {
        build_apdu(
            self.cla,
            self.ins,
            self.p1,
            self.p2,
            self.data.as_deref(),
            self.le,
        )
    }
}

/// Build a short command APDU
///
/// - Case 1: CLA INS P1 P2 00
/// - Case 2: CLA INS P1 P2 Le
/// - Case 3: CLA INS P1 P2 Lc Data
/// - Case 4: CLA INS P1 P2 Lc Data Le
pub fn build_apdu(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Option<&[u8]>,
    le: Option<u8>,
) -> Result<Vec<u8>, APDUError> {
    let data_len = data.map_or(0, |d| d.len() + 1);
    let mut command = Vec::with_capacity(4 + data_len + 1);
    command.extend_from_slice(&[cla, ins, p1, p2]);

    match (data, le) {
        (Some(data), le) => {
            let lc = u8::try_from(data.len()).map_err(|_| APDUError::DataTooLong(data.len()))?;
            command.push(lc);
            command.extend_from_slice(data);
            command.extend(le);
        }
        (None, Some(le)) => command.push(le),
        // Case 1 still carries P3 = 0
        (None, None) => command.push(0x00),
    }

    Ok(command)
}

/// Check whether a raw command is a case 4 APDU (both Lc/data and Le present)
pub fn is_case4(command: &[u8]) -> bool {
    command.len() > 4 && command[4] as usize + 6 == command.len()
}

/// Instruction bytes of the commands returning TLV data
pub mod ins {
    pub const SELECT: u8 = 0xA4;
    pub const READ_RECORD: u8 = 0xB2;
    pub const GET_RESPONSE: u8 = 0xC0;
    pub const GET_DATA: u8 = 0xCA;
}
