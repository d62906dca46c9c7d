use std::fmt::{Display, Error, Formatter};

use crate::buffer::{OfpPacketReader, OfpPacketWriter};
use crate::error::{OfpError, Result};
use crate::ofp_version::ProtocolVersion;

/// First reserved port code in the 16-bit 1.0 port space. Later versions
/// widen reserved codes to 32 bits by setting the upper 16 bits.
const OFPP_MAX_1_0: u16 = 0xff00;

/// 32-bit port identifier, physical or reserved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortNumber(pub u32);

impl PortNumber {
    /// Upper bound (inclusive) of physical port numbers; reserved ports follow.
    pub const MAX: PortNumber = PortNumber(0xffff_ff00);
    pub const IN_PORT: PortNumber = PortNumber(0xffff_fff8);
    pub const TABLE: PortNumber = PortNumber(0xffff_fff9);
    pub const NORMAL: PortNumber = PortNumber(0xffff_fffa);
    pub const FLOOD: PortNumber = PortNumber(0xffff_fffb);
    pub const ALL: PortNumber = PortNumber(0xffff_fffc);
    pub const CONTROLLER: PortNumber = PortNumber(0xffff_fffd);
    pub const LOCAL: PortNumber = PortNumber(0xffff_fffe);
    /// "No port"; called NONE in 1.0.
    pub const ANY: PortNumber = PortNumber(0xffff_ffff);

    /// True for the logical ports above `MAX`.
    pub fn is_reserved(self) -> bool {
        self.0 > PortNumber::MAX.0
    }

    /// Whether the port can be carried in the 16-bit 1.0 encoding.
    pub fn fits_1_0(self) -> bool {
        self.0 < OFPP_MAX_1_0 as u32 || self.0 >= PortNumber::MAX.0
    }

    /// Check the port is a legal value to put on the wire for `pv`.
    ///
    /// Codes between `MAX` and `IN_PORT` are unassigned in every version.
    pub fn validate(self, pv: ProtocolVersion) -> Result<()> {
        let unassigned = self.0 > PortNumber::MAX.0 && self.0 < PortNumber::IN_PORT.0;
        if unassigned || (pv == ProtocolVersion::V1_0 && !self.fits_1_0()) {
            return Err(OfpError::invalid(format!("{} bad port number {:#x}", pv, self.0)));
        }
        Ok(())
    }

    /// Widen a 16-bit 1.0 port, mapping 0xff00..=0xffff onto the reserved range.
    pub fn of_u16(p: u16) -> PortNumber {
        if p >= OFPP_MAX_1_0 {
            PortNumber(0xffff_0000 | p as u32)
        } else {
            PortNumber(p as u32)
        }
    }

    /// Narrow to the 16-bit 1.0 encoding.
    pub fn to_u16(self) -> Result<u16> {
        if !self.fits_1_0() {
            return Err(OfpError::invalid(format!(
                "port {} not representable in 1.0",
                self
            )));
        }
        Ok((self.0 & 0xffff) as u16)
    }

    /// Read a port in the width dictated by `pv`.
    pub fn parse(pv: ProtocolVersion, pkt: &mut OfpPacketReader) -> Result<PortNumber> {
        if pv == ProtocolVersion::V1_0 {
            Ok(PortNumber::of_u16(pkt.read_u16()?))
        } else {
            Ok(PortNumber(pkt.read_u32()?))
        }
    }

    /// Write a port in the width dictated by `pv`.
    pub fn marshal(self, pv: ProtocolVersion, pkt: &mut OfpPacketWriter) -> Result<()> {
        if pv == ProtocolVersion::V1_0 {
            pkt.write_u16(self.to_u16()?);
        } else {
            pkt.write_u32(self.0);
        }
        Ok(())
    }

    fn name(self) -> Option<&'static str> {
        match self {
            PortNumber::IN_PORT => Some("IN_PORT"),
            PortNumber::TABLE => Some("TABLE"),
            PortNumber::NORMAL => Some("NORMAL"),
            PortNumber::FLOOD => Some("FLOOD"),
            PortNumber::ALL => Some("ALL"),
            PortNumber::CONTROLLER => Some("CONTROLLER"),
            PortNumber::LOCAL => Some("LOCAL"),
            PortNumber::ANY => Some("ANY"),
            _ => None,
        }
    }
}

impl Display for PortNumber {
    fn fmt(&self, f: &mut Formatter) -> std::result::Result<(), Error> {
        match self.name() {
            Some(n) => f.write_str(n),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_1_0_ports() {
        assert_eq!(PortNumber::of_u16(5), PortNumber(5));
        assert_eq!(PortNumber::of_u16(0xfffd), PortNumber::CONTROLLER);
        assert_eq!(PortNumber::of_u16(0xffff), PortNumber::ANY);
        assert_eq!(PortNumber::of_u16(0xff00), PortNumber::MAX);
    }

    #[test]
    fn narrow_1_0_ports() {
        assert_eq!(PortNumber::CONTROLLER.to_u16(), Ok(0xfffd));
        assert_eq!(PortNumber(0xfeff).to_u16(), Ok(0xfeff));
        assert!(PortNumber(0xff01).to_u16().is_err());
        assert!(PortNumber(0x10000).to_u16().is_err());
    }

    #[test]
    fn validation() {
        assert!(PortNumber(7).validate(ProtocolVersion::V1_0).is_ok());
        assert!(PortNumber::FLOOD.validate(ProtocolVersion::V1_0).is_ok());
        assert!(PortNumber(0xff10).validate(ProtocolVersion::V1_0).is_err());
        assert!(PortNumber(0x1_0000).validate(ProtocolVersion::V1_0).is_err());
        assert!(PortNumber(0x1_0000).validate(ProtocolVersion::V1_3).is_ok());
        assert!(PortNumber(0xffff_ff01).validate(ProtocolVersion::V1_3).is_err());
        assert!(PortNumber::MAX.validate(ProtocolVersion::V1_3).is_ok());
    }

    #[test]
    fn width_by_version() {
        let mut w = OfpPacketWriter::new();
        PortNumber::LOCAL.marshal(ProtocolVersion::V1_0, &mut w).unwrap();
        PortNumber::LOCAL.marshal(ProtocolVersion::V1_3, &mut w).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![0xff, 0xfe, 0xff, 0xff, 0xff, 0xfe]);

        let mut r = OfpPacketReader::new(&bytes);
        assert_eq!(PortNumber::parse(ProtocolVersion::V1_0, &mut r), Ok(PortNumber::LOCAL));
        assert_eq!(PortNumber::parse(ProtocolVersion::V1_1, &mut r), Ok(PortNumber::LOCAL));
    }

    #[test]
    fn display() {
        assert_eq!(PortNumber::CONTROLLER.to_string(), "CONTROLLER");
        assert_eq!(PortNumber(42).to_string(), "42");
    }
}
