//! Protocol value types carried inside actions and instructions.

use std::fmt::{Display, Error, Formatter};

/// 48-bit Ethernet hardware address.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn of_u64(addr: u64) -> MacAddress {
        let mut arr = [0; 6];
        for (i, b) in arr.iter_mut().enumerate() {
            *b = ((addr >> (8 * (5 - i))) & 0xff) as u8;
        }
        MacAddress(arr)
    }

    pub fn to_u64(self) -> u64 {
        self.0.iter().fold(0, |acc, b| (acc << 8) | *b as u64)
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let a = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

/// EtherType of a frame or of a tag being pushed/popped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EthernetType(pub u16);

impl EthernetType {
    pub const IPV4: EthernetType = EthernetType(0x0800);
    pub const ARP: EthernetType = EthernetType(0x0806);
    pub const VLAN: EthernetType = EthernetType(0x8100);
    pub const IPV6: EthernetType = EthernetType(0x86dd);
    pub const MPLS_U: EthernetType = EthernetType(0x8847);
    pub const MPLS_M: EthernetType = EthernetType(0x8848);
    /// 802.1ad provider bridging (Q-in-Q outer tag).
    pub const PRV_BRDG: EthernetType = EthernetType(0x88a8);
    /// 802.1ah provider backbone bridging.
    pub const PBB: EthernetType = EthernetType(0x88e7);
}

impl Display for EthernetType {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Group table entry identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

/// Port queue identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueueId(pub u32);

/// Meter identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeterId(pub u32);

/// Flow table identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableId(pub u8);

impl TableId {
    /// Wildcard "all tables" value; not a valid goto target.
    pub const ALL: TableId = TableId(0xff);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_conversions() {
        let mac = MacAddress::of_u64(0x0011_2233_4455);
        assert_eq!(mac, MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        assert_eq!(mac.to_u64(), 0x0011_2233_4455);
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");
    }

    #[test]
    fn ether_type_display() {
        assert_eq!(EthernetType::VLAN.to_string(), "0x8100");
    }
}
