use super::BytePacketBuffer;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum WriterError {
    #[error("end of buffer reached while writing")]
    EndOfBuffer,
    #[error("label exceeds 63 octets")]
    LabelTooLong,
}

impl BytePacketBuffer {
    fn check_room(&self, len: usize) -> Result<(), WriterError> {
        if self.pos + len > self.buf.len() {
            return Err(WriterError::EndOfBuffer);
        }
        Ok(())
    }

    pub fn write_u8(&mut self, val: u8) -> Result<(), WriterError> {
        self.check_room(1)?;
        self.buf[self.pos] = val;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, val: u16) -> Result<(), WriterError> {
        self.write_u8((val >> 8) as u8)?;
        self.write_u8((val & 0xFF) as u8)
    }

    pub fn write_u32(&mut self, val: u32) -> Result<(), WriterError> {
        self.write_u8(((val >> 24) & 0xFF) as u8)?;
        self.write_u8(((val >> 16) & 0xFF) as u8)?;
        self.write_u8(((val >> 8) & 0xFF) as u8)?;
        self.write_u8((val & 0xFF) as u8)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        self.check_room(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Writes a compression pointer to `offset` (must fit in 14 bits).
    pub fn write_pointer(&mut self, offset: usize) -> Result<(), WriterError> {
        self.write_u16(0xC000 | (offset as u16 & 0x3FFF))
    }

    /// Writes `name` as a sequence of length-prefixed labels terminated by a
    /// zero octet. Never emits a compression pointer; callers that want
    /// compression call [`BytePacketBuffer::write_pointer`] explicitly.
    pub fn write_qname(&mut self, name: &str) -> Result<(), WriterError> {
        if name.is_empty() {
            return self.write_u8(0);
        }
        for label in name.split('.') {
            let len = label.len();
            if len > 63 {
                return Err(WriterError::LabelTooLong);
            }
            self.write_u8(len as u8)?;
            self.write_bytes(label.as_bytes())?;
        }
        self.write_u8(0)
    }

    /// Remembers that `name` starts at the current position, for callers
    /// that build their own compression dictionaries.
    pub fn remember_label(&mut self, name: &str) {
        self.writing_labels.insert(name.to_lowercase(), self.pos);
    }

    pub fn label_offset(&self, name: &str) -> Option<usize> {
        self.writing_labels.get(&name.to_lowercase()).copied()
    }
}
