//! Validated construction of instructions.

use tracing::debug;

use crate::action::factory::validate_action;
use crate::action::Action;
use crate::error::{OfpError, Result};
use crate::instruction::codes::INSTR_MIN_LEN;
use crate::instruction::{Instruction, InstructionKind, InstructionType};
use crate::ofp_header::{wire_length, MAX_STRUCT_LEN};
use crate::ofp_version::ProtocolVersion;
use crate::types::{MeterId, TableId};

fn reject(msg: String) -> OfpError {
    debug!("rejected instruction: {}", msg);
    OfpError::InvalidArgument(msg)
}

fn require(pv: ProtocolVersion, typ: InstructionType) -> Result<()> {
    pv.require(ProtocolVersion::V1_1, "instructions")?;
    pv.require(typ.min_version(), typ.name())
}

/// Create a GOTO_TABLE instruction. `TableId::ALL` is not a table.
pub fn create_goto_table(pv: ProtocolVersion, table_id: TableId) -> Result<Instruction> {
    require(pv, InstructionType::GotoTable)?;
    if table_id == TableId::ALL {
        return Err(reject(format!("cannot go to table {:#04x}", table_id.0)));
    }
    Instruction::new(pv, InstructionKind::GotoTable(table_id))
}

pub fn create_write_metadata(pv: ProtocolVersion, metadata: u64, mask: u64) -> Result<Instruction> {
    require(pv, InstructionType::WriteMetadata)?;
    Instruction::new(
        pv,
        InstructionKind::WriteMetadata { metadata, mask },
    )
}

/// Create a CLEAR_ACTIONS instruction, which never carries actions.
pub fn create_clear_actions(pv: ProtocolVersion) -> Result<Instruction> {
    require(pv, InstructionType::ClearActions)?;
    Instruction::new(pv, InstructionKind::ClearActions)
}

pub fn create_meter(pv: ProtocolVersion, meter_id: MeterId) -> Result<Instruction> {
    require(pv, InstructionType::Meter)?;
    Instruction::new(pv, InstructionKind::Meter(meter_id))
}

/// Create an EXPERIMENTER instruction. The payload is copied and must be a
/// multiple of 8 bytes long.
pub fn create_instr_experimenter(pv: ProtocolVersion, id: u32, data: &[u8]) -> Result<Instruction> {
    require(pv, InstructionType::Experimenter)?;
    if data.len() % 8 != 0 {
        return Err(reject(format!(
            "experimenter data length {} not a multiple of 8",
            data.len()
        )));
    }
    if data.len() > MAX_STRUCT_LEN - INSTR_MIN_LEN {
        return Err(reject(format!(
            "experimenter data length {} exceeds {}",
            data.len(),
            MAX_STRUCT_LEN - INSTR_MIN_LEN
        )));
    }
    Instruction::new(
        pv,
        InstructionKind::Experimenter {
            id,
            data: data.to_vec(),
        },
    )
}

/// Create header stubs for the given types, for table-features properties.
pub fn create_instruction_headers(
    pv: ProtocolVersion,
    types: &[InstructionType],
) -> Result<Vec<Instruction>> {
    types
        .iter()
        .map(|&typ| {
            require(pv, typ)?;
            if typ == InstructionType::Experimenter {
                return Err(reject("experimenter header stubs need an id".to_string()));
            }
            Instruction::new(pv, InstructionKind::Header(typ))
        })
        .collect()
}

/// Start a WRITE_ACTIONS or APPLY_ACTIONS instruction to be filled with
/// `ActionListBuilder::add_action`.
pub fn create_mutable_instruction(pv: ProtocolVersion, typ: InstructionType) -> Result<ActionListBuilder> {
    require(pv, typ)?;
    if !typ.has_actions() {
        return Err(reject(format!("{} does not take an action list", typ)));
    }
    Ok(ActionListBuilder {
        version: pv,
        typ,
        length: INSTR_MIN_LEN,
        actions: Some(vec![]),
    })
}

/// Accumulates the actions of a WRITE_ACTIONS or APPLY_ACTIONS instruction.
///
/// Freezing with `to_immutable` hands the actions over to the returned
/// instruction; the builder rejects every call after that.
#[derive(Debug)]
pub struct ActionListBuilder {
    version: ProtocolVersion,
    typ: InstructionType,
    length: usize,
    actions: Option<Vec<Action>>,
}

impl ActionListBuilder {
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn instruction_type(&self) -> InstructionType {
        self.typ
    }

    /// Length the instruction would have if frozen now.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_frozen(&self) -> bool {
        self.actions.is_none()
    }

    /// Append a full action built for the same version.
    pub fn add_action(&mut self, act: Action) -> Result<&mut ActionListBuilder> {
        let (pv, typ) = (self.version, self.typ);
        let actions = match self.actions {
            Some(ref mut v) => v,
            None => return Err(OfpError::Frozen(format!("cannot add {} to {}", act, typ))),
        };
        if act.version() != pv {
            return Err(OfpError::mismatch(
                format!("{} in {} instruction", act, pv),
                pv,
                act.version(),
            ));
        }
        if act.is_header_stub() {
            return Err(reject(format!("header stub {} in {}", act, typ)));
        }
        validate_action(pv, &act, typ.name())?;
        let length = self.length + act.length();
        if length > MAX_STRUCT_LEN {
            return Err(reject(format!(
                "{} would grow {} to {} bytes, over {}",
                act, typ, length, MAX_STRUCT_LEN
            )));
        }
        self.length = length;
        actions.push(act);
        Ok(self)
    }

    /// Freeze into an immutable instruction. Works exactly once.
    pub fn to_immutable(&mut self) -> Result<Instruction> {
        let length = wire_length(self.length, &self.typ)?;
        let actions = self
            .actions
            .take()
            .ok_or_else(|| OfpError::Frozen(format!("{} already converted", self.typ)))?;
        let kind = match self.typ {
            InstructionType::WriteActions => InstructionKind::WriteActions(actions),
            _ => InstructionKind::ApplyActions(actions),
        };
        Ok(Instruction::with_length(self.version, length, kind))
    }
}

/// Check that an instruction may be carried in a `msg_type` message for `pv`.
pub fn validate_instruction(pv: ProtocolVersion, ins: &Instruction, msg_type: &str) -> Result<()> {
    require(pv, ins.instruction_type())?;
    for act in ins.actions() {
        validate_action(pv, act, msg_type)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::factory::{create_action, create_output_port};
    use crate::action::ActionType;
    use crate::ofp_port::PortNumber;

    const V10: ProtocolVersion = ProtocolVersion::V1_0;
    const V11: ProtocolVersion = ProtocolVersion::V1_1;
    const V12: ProtocolVersion = ProtocolVersion::V1_2;
    const V13: ProtocolVersion = ProtocolVersion::V1_3;

    fn is_mismatch<T: std::fmt::Debug>(r: Result<T>) -> bool {
        match r {
            Err(OfpError::VersionMismatch { .. }) => true,
            _ => false,
        }
    }

    #[test]
    fn versions() {
        assert!(is_mismatch(create_goto_table(V10, TableId(1))));
        assert!(is_mismatch(create_clear_actions(V10)));
        assert!(is_mismatch(create_meter(V12, MeterId(1))));
        assert!(create_meter(V13, MeterId(1)).is_ok());
        assert!(is_mismatch(create_mutable_instruction(V10, InstructionType::ApplyActions)));
    }

    #[test]
    fn lengths() {
        assert_eq!(create_goto_table(V11, TableId(1)).unwrap().length(), 8);
        assert_eq!(create_write_metadata(V11, 1, 1).unwrap().length(), 24);
        assert_eq!(create_clear_actions(V11).unwrap().length(), 8);
        assert_eq!(create_instr_experimenter(V13, 1, &[0; 8]).unwrap().length(), 16);
        assert!(create_instr_experimenter(V13, 1, &[0; 3]).is_err());
        assert!(create_goto_table(V13, TableId::ALL).is_err());
    }

    #[test]
    fn experimenter_length_fits_header() {
        assert_eq!(create_instr_experimenter(V13, 1, &[0; 65520]).unwrap().length(), 65528);
        match create_instr_experimenter(V13, 1, &[0; 65528]) {
            Err(OfpError::InvalidArgument(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn builder_stops_at_max_length() {
        let out = create_output_port(V13, PortNumber(1)).unwrap();
        let mut b = create_mutable_instruction(V13, InstructionType::ApplyActions).unwrap();
        for _ in 0..4095 {
            b.add_action(out.clone()).unwrap();
        }
        assert_eq!(b.length(), 65528);
        match b.add_action(out.clone()) {
            Err(OfpError::InvalidArgument(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(b.add_action(create_action(V13, ActionType::DecNwTtl).unwrap()).is_err());
        assert_eq!(b.length(), 65528);
        let ins = b.to_immutable().unwrap();
        assert_eq!(ins.length(), 65528);
        assert_eq!(ins.actions().len(), 4095);
        assert_eq!(ins.header().length(), ins.length());
    }

    #[test]
    fn builder_freezes_once() {
        let mut b = create_mutable_instruction(V13, InstructionType::WriteActions).unwrap();
        b.add_action(create_output_port(V13, PortNumber(1)).unwrap())
            .unwrap()
            .add_action(create_action(V13, ActionType::DecNwTtl).unwrap())
            .unwrap();
        assert_eq!(b.length(), 8 + 16 + 8);
        let ins = b.to_immutable().unwrap();
        assert_eq!(ins.length(), 32);
        assert_eq!(ins.actions().len(), 2);
        assert!(b.is_frozen());
        match b.to_immutable() {
            Err(OfpError::Frozen(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        match b.add_action(create_output_port(V13, PortNumber(1)).unwrap()) {
            Err(OfpError::Frozen(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn builder_checks_actions() {
        assert!(create_mutable_instruction(V13, InstructionType::ClearActions).is_err());
        assert!(create_mutable_instruction(V13, InstructionType::GotoTable).is_err());
        let mut b = create_mutable_instruction(V13, InstructionType::ApplyActions).unwrap();
        assert!(is_mismatch(
            b.add_action(create_output_port(V12, PortNumber(1)).unwrap())
                .map(|_| ())
        ));
        let stub = crate::action::factory::create_action_headers(V13, &[ActionType::Output])
            .unwrap()
            .remove(0);
        assert!(b.add_action(stub).is_err());
        assert_eq!(b.length(), 8);
        assert!(b.to_immutable().unwrap().actions().is_empty());
    }

    #[test]
    fn validation() {
        let meter = create_meter(V13, MeterId(1)).unwrap();
        assert!(validate_instruction(V13, &meter, "FLOW_MOD").is_ok());
        assert!(is_mismatch(validate_instruction(V12, &meter, "FLOW_MOD")));
        let goto = create_goto_table(V11, TableId(3)).unwrap();
        assert!(is_mismatch(validate_instruction(V10, &goto, "FLOW_MOD")));
    }
}
