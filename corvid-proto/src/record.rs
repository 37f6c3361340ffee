use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::{Duration, SystemTime};

use crate::buffer::BytePacketBuffer;
use crate::buffer::{ReaderError, WriterError};
use crate::name::Name;
use crate::record_type::{RecordClass, RecordType};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RecordReadError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("unrecognized record type {0}")]
    UnrecognizedType(u16),
    #[error("rdata truncated")]
    RdataTruncated,
}

/// A resource record as handed between the zone store, the cache, the alias
/// chaser and the wire codec. `data` is the verbatim RDATA bytes; `text` is a
/// best-effort human/decompressed rendering used where the pipeline needs to
/// read the value rather than just forward it (A/AAAA addresses, CNAME/NS/PTR
/// targets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub rtype: RecordType,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub data: Vec<u8>,
    pub text: Option<String>,
    /// `None` for authoritative records, which never expire. `Some` for
    /// records obtained from an upstream lookup, set to the wall-clock
    /// instant at which the cache should evict them.
    pub expires_at: Option<SystemTime>,
}

impl ResourceRecord {
    pub fn authoritative(
        name: Name,
        rtype: RecordType,
        ttl: u32,
        data: Vec<u8>,
        text: Option<String>,
    ) -> Self {
        ResourceRecord {
            name,
            rtype,
            rclass: RecordClass::Internet,
            ttl,
            data,
            text,
            expires_at: None,
        }
    }

    pub fn cached(
        name: Name,
        rtype: RecordType,
        ttl: u32,
        data: Vec<u8>,
        text: Option<String>,
        now: SystemTime,
    ) -> Self {
        ResourceRecord {
            name,
            rtype,
            rclass: RecordClass::Internet,
            ttl,
            data,
            text,
            expires_at: Some(now + Duration::from_secs(ttl as u64)),
        }
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.expires_at {
            Some(expiry) => now > expiry,
            None => false,
        }
    }

    pub fn ttl_remaining(&self, now: SystemTime) -> u32 {
        match self.expires_at {
            None => self.ttl,
            Some(expiry) => expiry
                .duration_since(now)
                .unwrap_or(Duration::ZERO)
                .as_secs()
                .min(self.ttl as u64) as u32,
        }
    }

    /// For CNAME records, the target name parsed out of `text`.
    pub fn alias_target(&self) -> Option<&str> {
        if self.rtype == RecordType::Cname {
            self.text.as_deref()
        } else {
            None
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer, now: SystemTime) -> Result<Self, RecordReadError> {
        let name = Name::from_wire(buffer.read_qname()?);
        let rtype_num = buffer.read_u16()?;
        let rtype =
            RecordType::from_num(rtype_num).ok_or(RecordReadError::UnrecognizedType(rtype_num))?;
        let rclass = RecordClass::from_num(buffer.read_u16()?);
        let ttl = buffer.read_u32()?;
        let rdlen = buffer.read_u16()? as usize;

        let rdata_start = buffer.pos();
        let raw = buffer.get_rdata_range(rdata_start, rdlen)?.to_vec();

        let text = match rtype {
            RecordType::A => {
                if rdlen != 4 {
                    return Err(RecordReadError::RdataTruncated);
                }
                let a = buffer.read_u32()?;
                Some(Ipv4Addr::from(a).to_string())
            }
            RecordType::Aaaa => {
                if rdlen != 16 {
                    return Err(RecordReadError::RdataTruncated);
                }
                let mut octets = [0u8; 16];
                for octet in octets.iter_mut() {
                    *octet = buffer.read_u8()?;
                }
                Some(Ipv6Addr::from(octets).to_string())
            }
            RecordType::Cname | RecordType::Ns | RecordType::Ptr => {
                let target = buffer.read_qname()?;
                Some(target)
            }
            RecordType::Mx => {
                let priority = buffer.read_u16()?;
                let exchange = buffer.read_qname()?;
                Some(format!("{} {}", priority, exchange))
            }
            RecordType::Soa | RecordType::Txt => {
                buffer.step(rdlen);
                None
            }
        };

        Ok(ResourceRecord {
            name,
            rtype,
            rclass,
            ttl,
            data: raw,
            text,
            expires_at: Some(now + Duration::from_secs(ttl as u64)),
        })
    }

    /// Writes the record verbatim. When `name` equals `question_name`
    /// (case-insensitive) the owner name is replaced by a pointer to offset
    /// 12, where the question name was written; otherwise the full name is
    /// spelled out.
    pub fn write(
        &self,
        buffer: &mut BytePacketBuffer,
        question_name: &str,
    ) -> Result<(), WriterError> {
        if self.name.as_str().eq_ignore_ascii_case(question_name) {
            buffer.write_pointer(12)?;
        } else {
            buffer.write_qname(self.name.as_str())?;
        }
        buffer.write_u16(self.rtype.as_num())?;
        buffer.write_u16(self.rclass.as_num())?;
        buffer.write_u32(self.ttl)?;
        buffer.write_u16(self.data.len() as u16)?;
        buffer.write_bytes(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_a_record() {
        let mut raw = vec![0u8; 32];
        raw[0] = 0;
        raw[1..3].copy_from_slice(&1u16.to_be_bytes());
        raw[3..5].copy_from_slice(&1u16.to_be_bytes());
        raw[5..9].copy_from_slice(&300u32.to_be_bytes());
        raw[9..11].copy_from_slice(&4u16.to_be_bytes());
        raw[11..15].copy_from_slice(&[93, 184, 216, 34]);
        let mut buffer = BytePacketBuffer::from_bytes(&raw);
        let now = SystemTime::UNIX_EPOCH;
        let record = ResourceRecord::read(&mut buffer, now).unwrap();
        assert_eq!(record.rtype, RecordType::A);
        assert_eq!(record.text.as_deref(), Some("93.184.216.34"));
        assert_eq!(record.ttl_remaining(now), 300);
    }

    #[test]
    fn should_reject_unknown_type() {
        let mut raw = vec![0u8; 16];
        raw[0] = 0;
        raw[1..3].copy_from_slice(&999u16.to_be_bytes());
        let mut buffer = BytePacketBuffer::from_bytes(&raw);
        let err = ResourceRecord::read(&mut buffer, SystemTime::UNIX_EPOCH).unwrap_err();
        assert_eq!(err, RecordReadError::UnrecognizedType(999));
    }

    #[test]
    fn authoritative_records_never_expire() {
        let record = ResourceRecord::authoritative(
            Name::parse("example.com").unwrap(),
            RecordType::A,
            3600,
            vec![127, 0, 0, 1],
            Some("127.0.0.1".into()),
        );
        assert!(!record.is_expired(SystemTime::now()));
        assert_eq!(record.ttl_remaining(SystemTime::now()), 3600);
    }
}
