use std::fmt::{Display, Error, Formatter};

use crate::error::{OfpError, Result};

/// OpenFlow protocol revisions understood by the codec.
///
/// Ordered, so `pv < ProtocolVersion::V1_2` reads as "predates SET_FIELD".
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    V1_0 = 0x01,
    V1_1 = 0x02,
    V1_2 = 0x03,
    V1_3 = 0x04,
}

/// Every version this codec implements.
pub const SUPPORTED_VERSIONS: [ProtocolVersion; 4] = [
    ProtocolVersion::V1_0,
    ProtocolVersion::V1_1,
    ProtocolVersion::V1_2,
    ProtocolVersion::V1_3,
];

impl ProtocolVersion {
    /// Map the version byte of an OpenFlow header to a `ProtocolVersion`.
    pub fn from_wire(v: u8) -> Result<ProtocolVersion> {
        match v {
            0x01 => Ok(ProtocolVersion::V1_0),
            0x02 => Ok(ProtocolVersion::V1_1),
            0x03 => Ok(ProtocolVersion::V1_2),
            0x04 => Ok(ProtocolVersion::V1_3),
            v => Err(OfpError::VersionNotSupported(v)),
        }
    }

    /// Return the version byte carried in OpenFlow headers.
    pub fn wire(self) -> u8 {
        self as u8
    }

    /// True for 1.0 and 1.1, which use the discrete SET_* action opcodes.
    pub fn is_legacy(self) -> bool {
        self < ProtocolVersion::V1_2
    }

    /// Fail with a version mismatch unless `self` is at least `min`.
    pub fn require(self, min: ProtocolVersion, what: &str) -> Result<()> {
        if self < min {
            Err(OfpError::mismatch(what, min, self))
        } else {
            Ok(())
        }
    }
}

impl Display for ProtocolVersion {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        let text = match *self {
            ProtocolVersion::V1_0 => "1.0",
            ProtocolVersion::V1_1 => "1.1",
            ProtocolVersion::V1_2 => "1.2",
            ProtocolVersion::V1_3 => "1.3",
        };
        f.write_str(text)
    }
}
