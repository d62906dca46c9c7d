use std::convert::TryFrom;
use std::fmt::{Debug, Display};

use tracing::debug;

use crate::buffer::{OfpPacketReader, OfpPacketWriter};
use crate::error::{OfpError, Result};
use crate::ofp_version::ProtocolVersion;
use crate::oxm::OxmBasicFieldType;

/// Byte-size of the common structure header: u16 type, u16 length.
pub const STRUCT_HEADER_LEN: usize = 4;

/// Largest total length the 16-bit length field can carry.
pub const MAX_STRUCT_LEN: usize = u16::max_value() as usize;

/// Narrow a computed total length to the 16-bit length field.
pub(crate) fn wire_length(len: usize, what: &dyn Display) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| OfpError::Internal(format!("{} length {} exceeds {}", what, len, MAX_STRUCT_LEN)))
}

/// Fail unless the reader stopped exactly on `target_ri`, reporting the
/// signed overshoot (or shortfall) otherwise.
pub(crate) fn verify_target_ri(target_ri: usize, pkt: &OfpPacketReader) -> Result<()> {
    if pkt.ri() != target_ri {
        let delta = pkt.ri() as i64 - target_ri as i64;
        debug!("structure list ended at {}, target {}", pkt.ri(), target_ri);
        return Err(OfpError::OffBy {
            target: target_ri,
            delta,
        });
    }
    Ok(())
}

/// Common API for the type enums carried in a structure header.
///
/// Actions and instructions share the header layout but not their opcode
/// tables; each table implements this to plug into `StructHeader`.
pub trait StructType: Copy + Debug + Display + Sized {
    /// Decode a wire opcode read at position `at` for version `pv`.
    ///
    /// The field type is only ever present for legacy set-field opcodes.
    fn decode(code: u16, pv: ProtocolVersion, at: usize)
        -> Result<(Self, Option<OxmBasicFieldType>)>;

    /// Encode to the wire opcode used by `pv`.
    fn encode(self, field_type: Option<OxmBasicFieldType>, pv: ProtocolVersion) -> Result<u16>;

    /// Smallest legal total length of a full structure of this type.
    fn min_len(self, field_type: Option<OxmBasicFieldType>, pv: ProtocolVersion) -> usize;
}

/// Structure Header
///
/// The first fields of every action and instruction. This is parsed to
/// determine the type and total length of the structure, so that the rest of
/// it can be properly handled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StructHeader<T: StructType> {
    typ: T,
    length: u16,
    field_type: Option<OxmBasicFieldType>,
}

impl<T: StructType> StructHeader<T> {
    /// Create a `StructHeader` out of the arguments.
    pub fn new(typ: T, length: u16, field_type: Option<OxmBasicFieldType>) -> StructHeader<T> {
        StructHeader {
            typ,
            length,
            field_type,
        }
    }

    /// Return the byte-size of a `StructHeader`.
    pub fn size() -> usize {
        STRUCT_HEADER_LEN
    }

    /// Write the version-specific opcode and the length.
    pub fn marshal(&self, pv: ProtocolVersion, pkt: &mut OfpPacketWriter) -> Result<()> {
        pkt.write_u16(self.typ.encode(self.field_type, pv)?);
        pkt.write_u16(self.length);
        Ok(())
    }

    /// Read a header, mapping the opcode through the table for `pv`.
    pub fn parse(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<StructHeader<T>> {
        let at = pkt.ri();
        let code = pkt.read_u16()?;
        let length = pkt.read_u16()?;
        let (typ, field_type) = T::decode(code, pv, at)?;
        Ok(StructHeader {
            typ,
            length,
            field_type,
        })
    }

    /// Fail unless the declared length covers the type's minimum.
    pub fn check_min_len(&self, pv: ProtocolVersion, at: usize) -> Result<()> {
        let min = self.typ.min_len(self.field_type, pv);
        if (self.length as usize) < min {
            debug!("{} length {} below minimum {}", self.typ, self.length, min);
            return Err(OfpError::HeaderParse {
                position: at,
                reason: format!("{} length {} < minimum {}", self.typ, self.length, min),
            });
        }
        Ok(())
    }

    /// Return the type carried by the header.
    pub fn type_code(&self) -> T {
        self.typ
    }

    /// Return the `length` field of a header. Includes the length of the header itself.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    /// Return the set-field's basic field type, if any.
    pub fn field_type(&self) -> Option<OxmBasicFieldType> {
        self.field_type
    }
}
