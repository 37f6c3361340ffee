use std::time::SystemTime;

use crate::buffer::{BytePacketBuffer, ReaderError, WriterError};
use crate::header::Header;
use crate::question::{Question, QuestionReadError};
use crate::rcode::Rcode;
use crate::record::{RecordReadError, ResourceRecord};

/// Error surface for the four wire-level operations. Named after the
/// conditions a malformed or hostile message can trigger, not after the
/// internal reader/writer machinery that detects them.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("message shorter than the fixed header")]
    TooShort,
    #[error("response transaction id does not match the query")]
    IdMismatch,
    #[error("question count invalid")]
    QuestionCountInvalid,
    #[error("label exceeds 63 octets")]
    LabelTooLong,
    #[error("name offset out of bounds")]
    NameOutOfBounds,
    #[error("compression pointer out of bounds")]
    CompressionPointerOutOfBounds,
    #[error("rdata truncated")]
    RdataTruncated,
    #[error("invalid resource record")]
    InvalidResourceRecord,
    #[error("encoded message would exceed the 512 byte buffer")]
    BufferOverflow,
}

impl From<ReaderError> for CodecError {
    fn from(err: ReaderError) -> Self {
        match err {
            ReaderError::OffsetOutOfBounds | ReaderError::LabelLengthOutOfBounds => {
                CodecError::NameOutOfBounds
            }
            ReaderError::RdataOutOfBounds => CodecError::RdataTruncated,
            ReaderError::CompressionPointerOutOfBounds | ReaderError::TooManyJumps(_) => {
                CodecError::CompressionPointerOutOfBounds
            }
        }
    }
}

impl From<WriterError> for CodecError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::LabelTooLong => CodecError::LabelTooLong,
            WriterError::EndOfBuffer => CodecError::BufferOverflow,
        }
    }
}

impl From<QuestionReadError> for CodecError {
    fn from(err: QuestionReadError) -> Self {
        match err {
            QuestionReadError::Reader(inner) => inner.into(),
            QuestionReadError::UnrecognizedType(_) => CodecError::InvalidResourceRecord,
        }
    }
}

impl From<RecordReadError> for CodecError {
    fn from(err: RecordReadError) -> Self {
        match err {
            RecordReadError::Reader(inner) => inner.into(),
            RecordReadError::UnrecognizedType(_) => CodecError::InvalidResourceRecord,
            RecordReadError::RdataTruncated => CodecError::RdataTruncated,
        }
    }
}

/// The answer/authority/additional payload of a response, independent of the
/// question that produced it. Mirrors what the resolver pipeline actually
/// passes between its stages; the wire encoding of a response additionally
/// needs the originating question, so [`encode_response`] takes it alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResponse {
    pub id: u16,
    pub rcode: Rcode,
    pub authoritative: bool,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl DnsResponse {
    pub fn new(id: u16, rcode: Rcode) -> Self {
        DnsResponse {
            id,
            rcode,
            authoritative: false,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn with_answers(mut self, answers: Vec<ResourceRecord>) -> Self {
        self.answers = answers;
        self
    }
}

const MAX_MESSAGE_SIZE: usize = 512;

pub fn decode_query(bytes: &[u8]) -> Result<Question, CodecError> {
    if bytes.len() < 12 {
        return Err(CodecError::TooShort);
    }
    let mut buffer = BytePacketBuffer::from_bytes(bytes);
    let header = Header::read(&mut buffer)?;
    let qdcount = buffer.read_u16()?;
    if qdcount != 1 {
        return Err(CodecError::QuestionCountInvalid);
    }
    let _ancount = buffer.read_u16()?;
    let _nscount = buffer.read_u16()?;
    let _arcount = buffer.read_u16()?;

    Ok(Question::read(header.id, &mut buffer)?)
}

pub fn encode_query(question: &Question) -> Result<Vec<u8>, CodecError> {
    let mut buffer = BytePacketBuffer::new();
    let header = Header::query(question.id);
    header.write(&mut buffer)?;
    buffer.write_u16(1)?; // qdcount
    buffer.write_u16(0)?; // ancount
    buffer.write_u16(0)?; // nscount
    buffer.write_u16(0)?; // arcount
    question.write(&mut buffer)?;
    Ok(buffer.as_slice().to_vec())
}

pub fn decode_response(
    bytes: &[u8],
    expected_id: u16,
    now: SystemTime,
) -> Result<DnsResponse, CodecError> {
    if bytes.len() < 12 {
        return Err(CodecError::TooShort);
    }
    let mut buffer = BytePacketBuffer::from_bytes(bytes);
    let header = Header::read(&mut buffer)?;
    if header.id != expected_id {
        return Err(CodecError::IdMismatch);
    }

    let qdcount = buffer.read_u16()?;
    let ancount = buffer.read_u16()?;
    let nscount = buffer.read_u16()?;
    let arcount = buffer.read_u16()?;

    for _ in 0..qdcount {
        Question::read(header.id, &mut buffer)?;
    }

    let read_records = |buffer: &mut BytePacketBuffer, count: u16| {
        (0..count)
            .map(|_| ResourceRecord::read(buffer, now).map_err(CodecError::from))
            .collect::<Result<Vec<_>, _>>()
    };

    let answers = read_records(&mut buffer, ancount)?;
    let authority = read_records(&mut buffer, nscount)?;
    let additional = read_records(&mut buffer, arcount)?;

    Ok(DnsResponse {
        id: header.id,
        rcode: header.rcode,
        authoritative: header.authoritative,
        answers,
        authority,
        additional,
    })
}

/// Encodes a response. `question` is the question it answers: its name is
/// echoed in the question section and used as the compression target for any
/// record whose owner name equals it.
pub fn encode_response(question: &Question, response: &DnsResponse) -> Result<Vec<u8>, CodecError> {
    for records in [&response.answers, &response.authority, &response.additional] {
        if records.len() > u16::MAX as usize {
            return Err(CodecError::BufferOverflow);
        }
        if records.iter().any(|r| r.data.len() > u16::MAX as usize) {
            return Err(CodecError::BufferOverflow);
        }
    }

    let mut buffer = BytePacketBuffer::new();
    let mut header = Header::response(response.id, response.rcode);
    header.authoritative = response.authoritative;
    header.write(&mut buffer)?;

    buffer.write_u16(1)?;
    buffer.write_u16(response.answers.len() as u16)?;
    buffer.write_u16(response.authority.len() as u16)?;
    buffer.write_u16(response.additional.len() as u16)?;

    question.write(&mut buffer)?;

    for record in response
        .answers
        .iter()
        .chain(response.authority.iter())
        .chain(response.additional.iter())
    {
        record.write(&mut buffer, question.name.as_str())?;
    }

    let encoded = buffer.as_slice();
    if encoded.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::BufferOverflow);
    }
    Ok(encoded.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::record_type::RecordType;

    #[test]
    fn should_round_trip_query() {
        let question = Question::new(7, Name::parse("example.com").unwrap(), RecordType::A);
        let bytes = encode_query(&question).unwrap();
        let decoded = decode_query(&bytes).unwrap();
        assert_eq!(decoded, question);
    }

    #[test]
    fn should_round_trip_response_with_compressed_answer() {
        let question = Question::new(7, Name::parse("example.com").unwrap(), RecordType::A);
        let now = SystemTime::UNIX_EPOCH;
        let record = ResourceRecord::cached(
            Name::parse("example.com").unwrap(),
            RecordType::A,
            300,
            vec![93, 184, 216, 34],
            Some("93.184.216.34".into()),
            now,
        );
        let response = DnsResponse::new(7, Rcode::NoError).with_answers(vec![record.clone()]);
        let bytes = encode_response(&question, &response).unwrap();

        // the answer's owner name must be compressed to a pointer at offset 12
        let name_field_offset = 12 + "example.com".len() + 2 + 4;
        assert_eq!(&bytes[name_field_offset..name_field_offset + 2], &[0xC0, 0x0C]);

        let decoded = decode_response(&bytes, 7, now).unwrap();
        assert_eq!(decoded.answers.len(), 1);
        assert_eq!(decoded.answers[0].text, record.text);
    }

    #[test]
    fn should_reject_id_mismatch() {
        let question = Question::new(7, Name::parse("example.com").unwrap(), RecordType::A);
        let response = DnsResponse::new(7, Rcode::NoError);
        let bytes = encode_response(&question, &response).unwrap();
        let err = decode_response(&bytes, 8, SystemTime::now()).unwrap_err();
        assert_eq!(err, CodecError::IdMismatch);
    }

    #[test]
    fn should_reject_too_short_message() {
        let err = decode_query(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, CodecError::TooShort);
    }

    #[test]
    fn should_reject_multi_question_query() {
        let mut buffer = BytePacketBuffer::new();
        Header::query(1).write(&mut buffer).unwrap();
        buffer.write_u16(2).unwrap();
        buffer.write_u16(0).unwrap();
        buffer.write_u16(0).unwrap();
        buffer.write_u16(0).unwrap();
        let err = decode_query(&buffer.as_slice()).unwrap_err();
        assert_eq!(err, CodecError::QuestionCountInvalid);
    }
}
