use std::fmt::{Display, Error, Formatter};

use crate::error::{OfpError, Result};
use crate::ofp_header::StructType;
use crate::ofp_version::ProtocolVersion;
use crate::oxm::OxmBasicFieldType;

/// Instruction types (`ofp_instruction_type`), 1.1 and later.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstructionType {
    GotoTable = 1,
    WriteMetadata = 2,
    WriteActions = 3,
    ApplyActions = 4,
    ClearActions = 5,
    Meter = 6,
    Experimenter = 0xffff,
}

pub(crate) const INSTR_MIN_LEN: usize = 8;
pub(crate) const WRITE_METADATA_LEN: usize = 24;

impl InstructionType {
    pub const ALL: [InstructionType; 7] = [
        InstructionType::GotoTable,
        InstructionType::WriteMetadata,
        InstructionType::WriteActions,
        InstructionType::ApplyActions,
        InstructionType::ClearActions,
        InstructionType::Meter,
        InstructionType::Experimenter,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<InstructionType> {
        InstructionType::ALL.iter().cloned().find(|t| t.code() == code)
    }

    pub fn min_version(self) -> ProtocolVersion {
        match self {
            InstructionType::Meter => ProtocolVersion::V1_3,
            _ => ProtocolVersion::V1_1,
        }
    }

    /// True for WRITE_ACTIONS and APPLY_ACTIONS, the types built from an
    /// action list.
    pub fn has_actions(self) -> bool {
        match self {
            InstructionType::WriteActions | InstructionType::ApplyActions => true,
            _ => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstructionType::GotoTable => "GOTO_TABLE",
            InstructionType::WriteMetadata => "WRITE_METADATA",
            InstructionType::WriteActions => "WRITE_ACTIONS",
            InstructionType::ApplyActions => "APPLY_ACTIONS",
            InstructionType::ClearActions => "CLEAR_ACTIONS",
            InstructionType::Meter => "METER",
            InstructionType::Experimenter => "EXPERIMENTER",
        }
    }
}

impl Display for InstructionType {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        f.write_str(self.name())
    }
}

impl StructType for InstructionType {
    fn decode(
        code: u16,
        pv: ProtocolVersion,
        at: usize,
    ) -> Result<(InstructionType, Option<OxmBasicFieldType>)> {
        pv.require(ProtocolVersion::V1_1, "instructions")?;
        let t = InstructionType::from_code(code).ok_or_else(|| OfpError::HeaderParse {
            position: at,
            reason: format!("unknown instruction type {:#06x} for {}", code, pv),
        })?;
        pv.require(t.min_version(), t.name())?;
        Ok((t, None))
    }

    fn encode(self, _: Option<OxmBasicFieldType>, pv: ProtocolVersion) -> Result<u16> {
        pv.require(self.min_version(), self.name())?;
        Ok(self.code())
    }

    fn min_len(self, _: Option<OxmBasicFieldType>, _: ProtocolVersion) -> usize {
        match self {
            InstructionType::WriteMetadata => WRITE_METADATA_LEN,
            _ => INSTR_MIN_LEN,
        }
    }
}
