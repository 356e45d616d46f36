use crate::error::{RdbError, Result};
use std::collections::HashMap;

/// Deduplicated arena of null-terminated UTF-8 strings.
///
/// Owned by a single build. Offsets are handed out in first-seen order, so
/// interning the same sequence of strings always yields the same bytes.
#[derive(Debug, Default)]
pub struct StringPool {
    buf: Vec<u8>,
    offsets: HashMap<String, u32>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the offset of `s`, appending it if it has not been seen yet.
    ///
    /// # Panics
    /// If `s` contains a NUL byte; such a string would split in two when
    /// read back.
    pub fn intern(&mut self, s: &str) -> Result<u32> {
        assert!(!s.contains('\0'), "string pool value contains NUL: {s:?}");

        if let Some(&off) = self.offsets.get(s) {
            return Ok(off);
        }

        let off = u32::try_from(self.buf.len()).map_err(|_| RdbError::TooLarge {
            what: "string pool offset",
            value: self.buf.len(),
        })?;

        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        self.offsets.insert(s.to_owned(), off);
        Ok(off)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of distinct strings stored.
    pub fn distinct(&self) -> usize {
        self.offsets.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
