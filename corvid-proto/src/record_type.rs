/// Record types recognized by the resolver. Anything else is rejected while
/// decoding with [`crate::CodecError::InvalidResourceRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Soa,
    Ptr,
    Mx,
    Txt,
    Aaaa,
}

impl RecordType {
    pub fn from_num(num: u16) -> Option<Self> {
        match num {
            1 => Some(RecordType::A),
            2 => Some(RecordType::Ns),
            5 => Some(RecordType::Cname),
            6 => Some(RecordType::Soa),
            12 => Some(RecordType::Ptr),
            15 => Some(RecordType::Mx),
            16 => Some(RecordType::Txt),
            28 => Some(RecordType::Aaaa),
            _ => None,
        }
    }

    pub fn as_num(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Ptr => 12,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Aaaa => 28,
        }
    }
}

/// Only the Internet class is recognized. RFC 1035 defines CSNET, CHAOS and
/// HESIOD but none of them see real traffic today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    Internet,
}

impl RecordClass {
    pub fn from_num(num: u16) -> Self {
        let _ = num;
        RecordClass::Internet
    }

    pub fn as_num(self) -> u16 {
        match self {
            RecordClass::Internet => 1,
        }
    }
}
