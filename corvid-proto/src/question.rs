use crate::buffer::BytePacketBuffer;
use crate::buffer::{ReaderError, WriterError};
use crate::name::Name;
use crate::record_type::{RecordClass, RecordType};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum QuestionReadError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("unrecognized question type {0}")]
    UnrecognizedType(u16),
}

/// A single question: the transaction id it travelled with plus the
/// name/type/class triple used as the cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: u16,
    pub name: Name,
    pub qtype: RecordType,
    pub qclass: RecordClass,
}

impl Question {
    pub fn new(id: u16, name: Name, qtype: RecordType) -> Self {
        Question {
            id,
            name,
            qtype,
            qclass: RecordClass::Internet,
        }
    }

    /// The (name, type, class) key used by the cache and zone store. Excludes
    /// the transaction id deliberately: two queries for the same data should
    /// hit the same cache entry regardless of id.
    pub fn fingerprint(&self) -> (String, RecordType, RecordClass) {
        (self.name.as_str().to_string(), self.qtype, self.qclass)
    }

    pub fn read(id: u16, buffer: &mut BytePacketBuffer) -> Result<Self, QuestionReadError> {
        let name = Name::from_wire(buffer.read_qname()?);
        let qtype_num = buffer.read_u16()?;
        let qclass = buffer.read_u16()?;
        let qtype = RecordType::from_num(qtype_num)
            .ok_or(QuestionReadError::UnrecognizedType(qtype_num))?;
        Ok(Question {
            id,
            name,
            qtype,
            qclass: RecordClass::from_num(qclass),
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_qname(self.name.as_str())?;
        buffer.write_u16(self.qtype.as_num())?;
        buffer.write_u16(self.qclass.as_num())
    }
}
