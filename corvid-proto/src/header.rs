use crate::buffer::BytePacketBuffer;
use crate::rcode::Rcode;

use crate::buffer::{ReaderError, WriterError};

/// The fixed 12-byte section of a DNS message, minus the four count fields
/// (those are derived from the question/answer/authority/additional vector
/// lengths by whoever owns them, never stored redundantly here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub response: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub rcode: Rcode,
}

impl Header {
    /// A recursive query header with the flags a stub resolver sends.
    pub fn query(id: u16) -> Self {
        Header {
            id,
            response: false,
            opcode: 0,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: false,
            rcode: Rcode::NoError,
        }
    }

    /// A response header matching the fixed flag pattern `0x8180` with the
    /// low nibble replaced by `rcode`.
    pub fn response(id: u16, rcode: Rcode) -> Self {
        Header {
            id,
            response: true,
            opcode: 0,
            authoritative: false,
            truncated: false,
            recursion_desired: true,
            recursion_available: true,
            rcode,
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Self, ReaderError> {
        let id = buffer.read_u16()?;
        let flags_hi = buffer.read_u8()?;
        let flags_lo = buffer.read_u8()?;

        let recursion_desired = flags_hi & 0x01 != 0;
        let truncated = flags_hi & 0x02 != 0;
        let authoritative = flags_hi & 0x04 != 0;
        let opcode = (flags_hi >> 3) & 0x0F;
        let response = flags_hi & 0x80 != 0;

        let rcode = Rcode::from_num(flags_lo & 0x0F);
        let recursion_available = flags_lo & 0x80 != 0;

        Ok(Header {
            id,
            response,
            opcode,
            authoritative,
            truncated,
            recursion_desired,
            recursion_available,
            rcode,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_u16(self.id)?;

        let mut flags_hi = 0u8;
        if self.recursion_desired {
            flags_hi |= 0x01;
        }
        if self.truncated {
            flags_hi |= 0x02;
        }
        if self.authoritative {
            flags_hi |= 0x04;
        }
        flags_hi |= (self.opcode & 0x0F) << 3;
        if self.response {
            flags_hi |= 0x80;
        }
        buffer.write_u8(flags_hi)?;

        let mut flags_lo = self.rcode.as_num() & 0x0F;
        if self.recursion_available {
            flags_lo |= 0x80;
        }
        buffer.write_u8(flags_lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_query_flags() {
        let header = Header::query(42);
        let mut buffer = BytePacketBuffer::new();
        header.write(&mut buffer).unwrap();
        assert_eq!(&buffer.buf[..4], &[0x00, 0x2A, 0x01, 0x00]);

        buffer.seek(0);
        let decoded = Header::read(&mut buffer).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn should_round_trip_response_flags() {
        let header = Header::response(42, Rcode::NxDomain);
        let mut buffer = BytePacketBuffer::new();
        header.write(&mut buffer).unwrap();
        assert_eq!(&buffer.buf[..4], &[0x00, 0x2A, 0x81, 0x83]);

        buffer.seek(0);
        let decoded = Header::read(&mut buffer).unwrap();
        assert_eq!(decoded, header);
    }
}
