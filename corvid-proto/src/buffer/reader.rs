use super::BytePacketBuffer;

/// Maximum number of compression-pointer jumps followed while decoding a
/// single name. RFC 1035 messages never need more than a handful; this bound
/// only exists to cut off pointer cycles.
const MAX_JUMPS: usize = 128;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ReaderError {
    #[error("read past end of buffer")]
    OffsetOutOfBounds,
    #[error("rdata range past end of buffer")]
    RdataOutOfBounds,
    #[error("label length out of bounds")]
    LabelLengthOutOfBounds,
    #[error("compression pointer out of bounds")]
    CompressionPointerOutOfBounds,
    #[error("too many compression pointer jumps: {0}")]
    TooManyJumps(usize),
}

impl BytePacketBuffer {
    fn check_range(&self, start: usize, len: usize) -> Result<(), ReaderError> {
        if start + len > self.buf.len() {
            return Err(ReaderError::OffsetOutOfBounds);
        }
        Ok(())
    }

    pub fn get(&self, pos: usize) -> Result<u8, ReaderError> {
        self.check_range(pos, 1)?;
        Ok(self.buf[pos])
    }

    pub fn get_range(&self, start: usize, len: usize) -> Result<&[u8], ReaderError> {
        self.check_range(start, len)?;
        Ok(&self.buf[start..start + len])
    }

    /// Same as [`get_range`](Self::get_range), but for the RDATA slice of a
    /// resource record, so an overrun is reported as a distinct error rather
    /// than the generic name-decoding `OffsetOutOfBounds`.
    pub fn get_rdata_range(&self, start: usize, len: usize) -> Result<&[u8], ReaderError> {
        if start + len > self.buf.len() {
            return Err(ReaderError::RdataOutOfBounds);
        }
        Ok(&self.buf[start..start + len])
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        let val = self.get(self.pos)?;
        self.pos += 1;
        Ok(val)
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        let high = self.read_u8()? as u16;
        let low = self.read_u8()? as u16;
        Ok((high << 8) | low)
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let mut val: u32 = 0;
        for _ in 0..4 {
            val = (val << 8) | self.read_u8()? as u32;
        }
        Ok(val)
    }

    /// Reads a (possibly compressed) domain name starting at the current
    /// position, leaving `pos` just past the name as it appears at the call
    /// site (i.e. past the terminating pointer, not past the jump target).
    pub fn read_qname(&mut self) -> Result<String, ReaderError> {
        let (name, end_pos) = self.recursive_read_qname(self.pos, 0)?;
        self.pos = end_pos;
        Ok(name)
    }

    fn recursive_read_qname(
        &mut self,
        start: usize,
        jumps: usize,
    ) -> Result<(String, usize), ReaderError> {
        if jumps > MAX_JUMPS {
            return Err(ReaderError::TooManyJumps(jumps));
        }
        if let Some(cached) = self.reading_labels.get(&start) {
            let end = self.skip_labels(start)?;
            return Ok((cached.clone(), end));
        }

        let mut labels: Vec<String> = Vec::new();
        let mut pos = start;
        loop {
            let len = self.get(pos)?;

            if len & 0xC0 == 0xC0 {
                let hi = (len & 0x3F) as usize;
                let lo = self.get(pos + 1)? as usize;
                let offset = (hi << 8) | lo;
                if offset >= self.buf.len() {
                    return Err(ReaderError::CompressionPointerOutOfBounds);
                }
                let (tail, _) = self.recursive_read_qname(offset, jumps + 1)?;
                labels.push(tail);
                pos += 2;
                break;
            }

            pos += 1;
            if len == 0 {
                break;
            }
            let len = len as usize;
            if len > 63 {
                return Err(ReaderError::LabelLengthOutOfBounds);
            }
            let bytes = self.get_range(pos, len)?;
            labels.push(String::from_utf8_lossy(bytes).to_lowercase());
            pos += len;
        }

        let name = labels.join(".");
        self.reading_labels.insert(start, name.clone());
        Ok((name, pos))
    }

    /// Walks a name at `start` purely to compute its end offset, without
    /// rebuilding the string (already in `reading_labels`).
    fn skip_labels(&self, start: usize) -> Result<usize, ReaderError> {
        let mut pos = start;
        loop {
            let len = self.get(pos)?;
            if len & 0xC0 == 0xC0 {
                pos += 2;
                break;
            }
            pos += 1;
            if len == 0 {
                break;
            }
            pos += len as usize;
        }
        Ok(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(bytes: &[u8]) -> BytePacketBuffer {
        BytePacketBuffer::from_bytes(bytes)
    }

    #[test]
    fn should_read_simple_qname() {
        let mut buf = buffer_with(b"\x03www\x07example\x03com\x00");
        let name = buf.read_qname().unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(buf.pos(), 17);
    }

    #[test]
    fn should_read_qname_with_redirect() {
        let mut raw = vec![0u8; 32];
        raw[0..4].copy_from_slice(b"\x03www");
        raw[4..12].copy_from_slice(b"\x07example");
        raw[12..16].copy_from_slice(b"\x03com");
        raw[16] = 0;
        raw[20] = 0xC0;
        raw[21] = 0x00;
        let mut buf = buffer_with(&raw);
        buf.seek(20);
        let name = buf.read_qname().unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(buf.pos(), 22);
    }

    #[test]
    fn should_fail_read_qname_with_loop() {
        let mut raw = vec![0u8; 16];
        raw[0] = 0xC0;
        raw[1] = 0x00;
        let mut buf = buffer_with(&raw);
        let err = buf.read_qname().unwrap_err();
        assert_eq!(err, ReaderError::TooManyJumps(MAX_JUMPS + 1));
    }

    #[test]
    fn should_reject_overlong_label() {
        let mut raw = vec![0u8; 70];
        raw[0] = 64;
        let mut buf = buffer_with(&raw);
        let err = buf.read_qname().unwrap_err();
        assert_eq!(err, ReaderError::LabelLengthOutOfBounds);
    }

    #[test]
    fn should_reject_pointer_out_of_bounds() {
        let mut raw = vec![0u8; 16];
        raw[0] = 0xC0;
        raw[1] = 0xFF;
        let mut buf = buffer_with(&raw);
        let err = buf.read_qname().unwrap_err();
        assert_eq!(err, ReaderError::CompressionPointerOutOfBounds);
    }
}
