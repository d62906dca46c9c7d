//! Instructions attached to flow entries (1.1 and later).

use std::fmt::{Display, Error, Formatter};

use crate::action::{self, Action};
use crate::error::Result;
use crate::ofp_header::{wire_length, StructHeader, STRUCT_HEADER_LEN};
use crate::ofp_version::ProtocolVersion;
use crate::types::{MeterId, TableId};

pub mod codes;
pub mod encoder;
pub mod factory;
pub mod parser;

pub use self::codes::InstructionType;
pub use self::factory::ActionListBuilder;

/// Header of an instruction structure.
pub type InstructionHeader = StructHeader<InstructionType>;

/// Payload of an instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    GotoTable(TableId),
    WriteMetadata { metadata: u64, mask: u64 },
    WriteActions(Vec<Action>),
    ApplyActions(Vec<Action>),
    ClearActions,
    Meter(MeterId),
    Experimenter { id: u32, data: Vec<u8> },
    /// Type-only stub, as listed in table features.
    Header(InstructionType),
}

impl InstructionKind {
    pub fn instruction_type(&self) -> InstructionType {
        match *self {
            InstructionKind::GotoTable(_) => InstructionType::GotoTable,
            InstructionKind::WriteMetadata { .. } => InstructionType::WriteMetadata,
            InstructionKind::WriteActions(_) => InstructionType::WriteActions,
            InstructionKind::ApplyActions(_) => InstructionType::ApplyActions,
            InstructionKind::ClearActions => InstructionType::ClearActions,
            InstructionKind::Meter(_) => InstructionType::Meter,
            InstructionKind::Experimenter { .. } => InstructionType::Experimenter,
            InstructionKind::Header(t) => t,
        }
    }

    /// Return the byte-size of the encoded instruction.
    pub fn size_of(&self) -> usize {
        match *self {
            InstructionKind::Header(_) => STRUCT_HEADER_LEN,
            InstructionKind::WriteMetadata { .. } => codes::WRITE_METADATA_LEN,
            InstructionKind::WriteActions(ref acts) | InstructionKind::ApplyActions(ref acts) => {
                codes::INSTR_MIN_LEN + action::size_of_sequence(acts)
            }
            InstructionKind::Experimenter { ref data, .. } => codes::INSTR_MIN_LEN + data.len(),
            _ => codes::INSTR_MIN_LEN,
        }
    }
}

/// An instruction, bound to the protocol version it was built or parsed for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    version: ProtocolVersion,
    length: u16,
    kind: InstructionKind,
}

impl Instruction {
    pub(crate) fn new(pv: ProtocolVersion, kind: InstructionKind) -> Result<Instruction> {
        let length = wire_length(kind.size_of(), &kind.instruction_type())?;
        Ok(Instruction {
            version: pv,
            length,
            kind,
        })
    }

    pub(crate) fn with_length(pv: ProtocolVersion, length: u16, kind: InstructionKind) -> Instruction {
        Instruction {
            version: pv,
            length,
            kind,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Total length in bytes, header and embedded actions included.
    pub fn length(&self) -> usize {
        self.length as usize
    }

    pub fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    pub fn instruction_type(&self) -> InstructionType {
        self.kind.instruction_type()
    }

    /// Derived header value.
    pub fn header(&self) -> InstructionHeader {
        StructHeader::new(self.instruction_type(), self.length, None)
    }

    /// Embedded actions; empty for every type but WRITE_ACTIONS and APPLY_ACTIONS.
    pub fn actions(&self) -> &[Action] {
        match self.kind {
            InstructionKind::WriteActions(ref acts) | InstructionKind::ApplyActions(ref acts) => acts,
            _ => &[],
        }
    }

    pub fn to_debug_string(&self) -> String {
        let mut s = format!(
            "{{ofm:[V{},{},{}],{}}}",
            self.version,
            self.instruction_type(),
            self.length,
            self
        );
        for a in self.actions() {
            s.push_str("\n  ");
            s.push_str(&a.to_debug_string());
        }
        s
    }
}

/// Return the byte-size of a sequence of instructions.
pub fn size_of_sequence(instrs: &[Instruction]) -> usize {
    instrs.iter().map(Instruction::length).sum()
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match self.kind {
            InstructionKind::GotoTable(t) => write!(f, "GOTO_TABLE:{}", t.0),
            InstructionKind::WriteMetadata { metadata, mask } => {
                write!(f, "WRITE_METADATA:{:#x}/{:#x}", metadata, mask)
            }
            InstructionKind::WriteActions(ref acts) | InstructionKind::ApplyActions(ref acts) => {
                write!(f, "{}:[", self.instruction_type())?;
                for (i, a) in acts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", a)?;
                }
                f.write_str("]")
            }
            InstructionKind::Meter(m) => write!(f, "METER:{}", m.0),
            InstructionKind::Experimenter { id, ref data } => {
                write!(f, "EXPERIMENTER:{:#010x},{}b", id, data.len())
            }
            _ => write!(f, "{}", self.instruction_type()),
        }
    }
}
