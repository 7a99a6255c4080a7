use bytes::Bytes;
use fedq_result::{Error, Result};
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempPath;

/// Temp file holding the finished contents of a spilled sink.
///
/// The file is removed when the last [`LobHandle`] referencing it is dropped.
pub struct SpilledFile {
    path: Option<TempPath>,
    len: u64,
}

impl SpilledFile {
    pub(crate) fn new(path: TempPath, len: u64) -> Self {
        Self {
            path: Some(path),
            len,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> Result<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| Error::Internal("spill file already released".into()))
    }

    fn open(&self) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(self.path()?)?))
    }
}

impl fmt::Debug for SpilledFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpilledFile")
            .field("path", &self.path.as_deref())
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for SpilledFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown = path.to_path_buf();
            if let Err(err) = path.close() {
                tracing::warn!("failed to remove spill file {}: {}", shown.display(), err);
            }
        }
    }
}

/// Immutable handle to a large object produced by a sink or supplied as input.
///
/// Cloning is cheap; file-backed handles share the underlying temp file.
#[derive(Clone, Debug)]
pub enum LobHandle {
    Memory(Bytes),
    File(Arc<SpilledFile>),
}

impl LobHandle {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        LobHandle::Memory(bytes.into())
    }

    pub fn from_string(text: impl Into<String>) -> Self {
        LobHandle::Memory(Bytes::from(text.into()))
    }

    pub fn len(&self) -> u64 {
        match self {
            LobHandle::Memory(bytes) => bytes.len() as u64,
            LobHandle::File(file) => file.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the contents live in a temp file rather than in memory.
    pub fn is_spilled(&self) -> bool {
        matches!(self, LobHandle::File(_))
    }

    /// Stream the contents from the beginning.
    pub fn reader(&self) -> Result<Box<dyn Read + Send + '_>> {
        match self {
            LobHandle::Memory(bytes) => Ok(Box::new(Cursor::new(bytes.as_ref()))),
            LobHandle::File(file) => Ok(Box::new(file.open()?)),
        }
    }

    /// Materialize the full contents in memory.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            LobHandle::Memory(bytes) => Ok(bytes.clone()),
            LobHandle::File(file) => {
                let mut buf = Vec::with_capacity(usize::try_from(file.len()).unwrap_or(0));
                file.open()?.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Materialize the contents as UTF-8 text.
    pub fn to_text(&self) -> Result<String> {
        let bytes = self.to_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(Error::expr_cast)
    }
}

/// In-memory handles compare by content; file-backed handles by identity.
impl PartialEq for LobHandle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LobHandle::Memory(a), LobHandle::Memory(b)) => a == b,
            (LobHandle::File(a), LobHandle::File(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for LobHandle {}

impl Hash for LobHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LobHandle::Memory(bytes) => bytes.hash(state),
            LobHandle::File(file) => (Arc::as_ptr(file) as usize).hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_handle_reads_back() {
        let lob = LobHandle::from_string("hello");
        assert_eq!(lob.len(), 5);
        assert!(!lob.is_spilled());
        let mut out = String::new();
        lob.reader().unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(lob.to_text().unwrap(), "hello");
    }

    #[test]
    fn invalid_utf8_is_a_cast_error() {
        let lob = LobHandle::from_bytes(vec![0xff, 0xfe]);
        assert!(matches!(lob.to_text(), Err(Error::ExprCast(_))));
    }
}
