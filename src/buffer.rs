//! Cursor-based big-endian reader and writer used by every codec in the crate.

use std::io::{self, Cursor, Read};
use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::error::{OfpError, Result};
use crate::types::MacAddress;

fn wrap(at: usize, e: io::Error) -> OfpError {
    OfpError::Decode {
        position: at,
        reason: e.to_string(),
    }
}

/// Sequential reader over a borrowed OpenFlow message buffer.
///
/// Never seeks backward. Running past the end of the buffer is a decode error
/// tagged with the position at which the read started.
pub struct OfpPacketReader<'a> {
    bytes: Cursor<&'a [u8]>,
}

impl<'a> OfpPacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> OfpPacketReader<'a> {
        OfpPacketReader { bytes: Cursor::new(buf) }
    }

    /// Current reader index.
    pub fn ri(&self) -> usize {
        self.bytes.position() as usize
    }

    /// Bytes left between the reader index and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.bytes.get_ref().len().saturating_sub(self.ri())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let at = self.ri();
        self.bytes.read_u8().map_err(|e| wrap(at, e))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let at = self.ri();
        self.bytes.read_u16::<BigEndian>().map_err(|e| wrap(at, e))
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        let at = self.ri();
        self.bytes.read_u24::<BigEndian>().map_err(|e| wrap(at, e))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let at = self.ri();
        self.bytes.read_u32::<BigEndian>().map_err(|e| wrap(at, e))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let at = self.ri();
        self.bytes.read_u64::<BigEndian>().map_err(|e| wrap(at, e))
    }

    /// Read exactly `n` bytes into a fresh vector.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.check_available(n)?;
        let mut v = vec![0; n];
        let at = self.ri();
        self.bytes.read_exact(&mut v).map_err(|e| wrap(at, e))?;
        Ok(v)
    }

    pub fn read_mac(&mut self) -> Result<MacAddress> {
        let mut arr = [0; 6];
        let at = self.ri();
        self.bytes.read_exact(&mut arr).map_err(|e| wrap(at, e))?;
        Ok(MacAddress(arr))
    }

    pub fn read_ipv4(&mut self) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::from(self.read_u32()?))
    }

    pub fn read_ipv6(&mut self) -> Result<Ipv6Addr> {
        let mut arr = [0; 16];
        let at = self.ri();
        self.bytes.read_exact(&mut arr).map_err(|e| wrap(at, e))?;
        Ok(Ipv6Addr::from(arr))
    }

    /// Advance the reader index by `n` bytes without interpreting them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.check_available(n)?;
        let pos = self.bytes.position() + n as u64;
        self.bytes.set_position(pos);
        Ok(())
    }

    fn check_available(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            Err(OfpError::Decode {
                position: self.ri(),
                reason: format!("need {} bytes, {} remaining", n, self.remaining()),
            })
        } else {
            Ok(())
        }
    }
}

/// Append-only writer producing an OpenFlow byte buffer.
#[derive(Default)]
pub struct OfpPacketWriter {
    bytes: Vec<u8>,
}

impl OfpPacketWriter {
    pub fn new() -> OfpPacketWriter {
        OfpPacketWriter { bytes: vec![] }
    }

    /// Current writer index.
    pub fn wi(&self) -> usize {
        self.bytes.len()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut buf = [0; 2];
        BigEndian::write_u16(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_u24(&mut self, v: u32) {
        let mut buf = [0; 3];
        BigEndian::write_u24(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_u32(&mut self, v: u32) {
        let mut buf = [0; 4];
        BigEndian::write_u32(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_u64(&mut self, v: u64) {
        let mut buf = [0; 8];
        BigEndian::write_u64(&mut buf, v);
        self.bytes.extend_from_slice(&buf);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub fn write_mac(&mut self, mac: MacAddress) {
        self.bytes.extend_from_slice(&mac.0);
    }

    pub fn write_ipv4(&mut self, ip: Ipv4Addr) {
        self.bytes.extend_from_slice(&ip.octets());
    }

    pub fn write_ipv6(&mut self, ip: Ipv6Addr) {
        self.bytes.extend_from_slice(&ip.octets());
    }

    /// Emit `n` explicit zero bytes of padding.
    pub fn write_zeros(&mut self, n: usize) {
        let len = self.bytes.len();
        self.bytes.resize(len + n, 0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let buf = [0x00, 0x10, 0xde, 0xad, 0xbe, 0xef, 0x07];
        let mut pkt = OfpPacketReader::new(&buf);
        assert_eq!(pkt.read_u16().unwrap(), 0x0010);
        assert_eq!(pkt.read_u32().unwrap(), 0xdeadbeef);
        assert_eq!(pkt.ri(), 6);
        assert_eq!(pkt.read_u8().unwrap(), 7);
        assert_eq!(pkt.remaining(), 0);
    }

    #[test]
    fn underrun_is_decode_error() {
        let buf = [0x00, 0x10, 0xde];
        let mut pkt = OfpPacketReader::new(&buf);
        pkt.read_u16().unwrap();
        match pkt.read_u32() {
            Err(OfpError::Decode { position, .. }) => assert_eq!(position, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(pkt.skip(4).is_err());
        assert!(pkt.read_bytes(2).is_err());
    }

    #[test]
    fn writes_padding() {
        let mut pkt = OfpPacketWriter::new();
        pkt.write_u16(0x8100);
        pkt.write_zeros(2);
        pkt.write_u24(0x010203);
        assert_eq!(pkt.wi(), 7);
        assert_eq!(pkt.into_inner(), vec![0x81, 0x00, 0, 0, 1, 2, 3]);
    }
}
