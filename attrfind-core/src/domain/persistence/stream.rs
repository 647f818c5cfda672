// attrfind-core/src/domain/persistence/stream.rs

// Little-endian, length-prefixed blob format.
//   int32  -> 4 bytes LE
//   bool   -> 1 byte (0 | 1)
//   string -> int32 byte length + UTF-8 bytes
//   frame  -> int32 byte length + inner fields

use crate::domain::error::DomainError;

#[derive(Debug, Default)]
pub struct BlobWriter {
    buf: Vec<u8>,
}

impl BlobWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), DomainError> {
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Writes `[int32 length][inner]`, where `inner` is produced by `fill`.
    pub fn write_framed<E, F>(&mut self, fill: F) -> Result<(), E>
    where
        F: FnOnce(&mut BlobWriter) -> Result<(), E>,
        E: From<DomainError>,
    {
        let mut inner = BlobWriter::new();
        fill(&mut inner)?;
        self.write_len(inner.buf.len())?;
        self.buf.extend_from_slice(&inner.buf);
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<(), DomainError> {
        let len = i32::try_from(len)
            .map_err(|_| DomainError::corrupt("blob", format!("length {} exceeds int32", len)))?;
        self.write_i32(len);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct BlobReader<'a> {
    data: &'a [u8],
    pos: usize,
    component: &'static str,
    depth: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(data: &'a [u8], component: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            component,
            depth: 0,
        }
    }

    /// Number of frames enclosing this reader.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DomainError> {
        if count > self.remaining() {
            return Err(DomainError::corrupt(
                self.component,
                format!(
                    "unexpected end of data at offset {} (needed {} bytes, {} left)",
                    self.pos,
                    count,
                    self.remaining()
                ),
            ));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    pub fn read_i32(&mut self) -> Result<i32, DomainError> {
        let bytes = self.take(4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(i32::from_le_bytes(raw))
    }

    pub fn read_bool(&mut self) -> Result<bool, DomainError> {
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DomainError::corrupt(
                self.component,
                format!("invalid bool byte {:#04x}", other),
            )),
        }
    }

    fn read_len(&mut self) -> Result<usize, DomainError> {
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| DomainError::corrupt(self.component, format!("negative length {}", len)))
    }

    pub fn read_string(&mut self) -> Result<String, DomainError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| DomainError::corrupt(self.component, format!("invalid UTF-8: {}", e)))
    }

    /// Reads `[int32 length][inner]` and returns a reader bounded to `inner`.
    /// Bytes the caller leaves unread inside the frame are skipped.
    pub fn read_framed(&mut self, component: &'static str) -> Result<BlobReader<'a>, DomainError> {
        let len = self.read_len()?;
        let inner = self.take(len)?;
        Ok(BlobReader {
            data: inner,
            pos: 0,
            component,
            depth: self.depth + 1,
        })
    }
}

/// Rejects blobs written by a newer loader, reporting both versions.
pub fn ensure_supported(
    component: &'static str,
    loader_version: i32,
    blob_version: i32,
) -> Result<(), DomainError> {
    if blob_version > loader_version {
        return Err(DomainError::UnsupportedVersion {
            component,
            loader_version,
            blob_version,
        });
    }
    if blob_version < 1 {
        return Err(DomainError::corrupt(
            component,
            format!("invalid version {}", blob_version),
        ));
    }
    Ok(())
}
