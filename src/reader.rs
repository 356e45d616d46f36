use crate::codec::{self, ENTRY_SIZE, HEADER_SIZE, Header, INDEX_ITEM_SIZE};
use crate::error::{RdbError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// The four pool offsets stored for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub title: u32,
    pub artist: u32,
    pub album: u32,
    pub path: u32,
}

/// An entry with its strings resolved from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub path: &'a str,
}

/// Read-only view over an RDB1 file, the same queries a device performs.
///
/// Construction checks that every section lies inside the data; string
/// lookups are checked lazily. [`verify`](Self::verify) does a full pass.
pub struct RdbReader<B = Mmap> {
    data: B,
    header: Header,
}

impl RdbReader<Mmap> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| RdbError::io(path, e))?;
        // The file is only read; concurrent truncation by another process is
        // outside what we guard against.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| RdbError::io(path, e))?;
        Self::from_bytes(mmap)
    }
}

impl<B: AsRef<[u8]>> RdbReader<B> {
    pub fn from_bytes(data: B) -> Result<Self> {
        let header = Header::decode(data.as_ref())?;
        check_sections(&header, data.as_ref().len())?;
        Ok(Self { data, header })
    }

    fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn entry_count(&self) -> u32 {
        self.header.entry_count
    }

    pub fn artist_count(&self) -> u32 {
        self.header.artist_index_count
    }

    pub fn album_count(&self) -> u32 {
        self.header.album_index_count
    }

    pub fn pool(&self) -> &[u8] {
        &self.bytes()[self.header.string_pool_offset as usize..]
    }

    pub fn entry(&self, index: u32) -> Option<RawEntry> {
        if index >= self.header.entry_count {
            return None;
        }
        let at = HEADER_SIZE + index as usize * ENTRY_SIZE;
        let b = self.bytes();
        Some(RawEntry {
            title: codec::get_u32(b, at),
            artist: codec::get_u32(b, at + 4),
            album: codec::get_u32(b, at + 8),
            path: codec::get_u32(b, at + 12),
        })
    }

    /// Null-terminated string at `offset` (relative to the pool start).
    pub fn string(&self, offset: u32) -> Result<&str> {
        let pool = self.pool();
        let start = offset as usize;
        if start >= pool.len() {
            return Err(RdbError::Corrupt(format!(
                "string offset {offset} outside pool of {} bytes",
                pool.len()
            )));
        }
        let len = pool[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| RdbError::Corrupt(format!("string at {offset} is not terminated")))?;
        std::str::from_utf8(&pool[start..start + len])
            .map_err(|e| RdbError::Corrupt(format!("string at {offset}: {e}")))
    }

    pub fn track(&self, index: u32) -> Result<Track<'_>> {
        let e = self
            .entry(index)
            .ok_or_else(|| RdbError::Corrupt(format!("entry {index} out of range")))?;
        Ok(Track {
            title: self.string(e.title)?,
            artist: self.string(e.artist)?,
            album: self.string(e.album)?,
            path: self.string(e.path)?,
        })
    }

    pub fn tracks(&self) -> impl Iterator<Item = Result<Track<'_>>> + '_ {
        (0..self.header.entry_count).map(move |i| self.track(i))
    }

    /// First entry of the `n`th artist run.
    pub fn artist_start(&self, n: u32) -> Option<u32> {
        self.index_item(self.header.artist_index_offset, self.header.artist_index_count, n)
    }

    /// First entry of the `n`th album run.
    pub fn album_start(&self, n: u32) -> Option<u32> {
        self.index_item(self.header.album_index_offset, self.header.album_index_count, n)
    }

    pub fn artist_index(&self) -> Vec<u32> {
        self.index_slice(self.header.artist_index_offset, self.header.artist_index_count)
    }

    pub fn album_index(&self) -> Vec<u32> {
        self.index_slice(self.header.album_index_offset, self.header.album_index_count)
    }

    fn index_item(&self, offset: u32, count: u32, n: u32) -> Option<u32> {
        (n < count).then(|| codec::get_u32(self.bytes(), offset as usize + n as usize * INDEX_ITEM_SIZE))
    }

    fn index_slice(&self, offset: u32, count: u32) -> Vec<u32> {
        let start = offset as usize;
        codec::u32_list_unpack(&self.bytes()[start..start + count as usize * INDEX_ITEM_SIZE])
    }

    /// Full consistency pass: every string resolves, the table is sorted and
    /// both boundary indices mark exactly the run starts.
    pub fn verify(&self) -> Result<()> {
        let n = self.header.entry_count;

        if let Some(last) = self.pool().last() {
            if *last != 0 {
                return Err(RdbError::Corrupt("string pool does not end with NUL".into()));
            }
        }

        let mut prev: Option<Track<'_>> = None;
        for i in 0..n {
            let t = self.track(i)?;
            if let Some(p) = &prev {
                if sort_key(p) > sort_key(&t) {
                    return Err(RdbError::Corrupt(format!("entries {} and {i} out of order", i - 1)));
                }
            }
            prev = Some(t);
        }

        self.verify_index("artist", &self.artist_index(), |e| e.artist)?;
        self.verify_index("album", &self.album_index(), |e| e.album)?;
        Ok(())
    }

    fn verify_index(&self, name: &str, index: &[u32], field: impl Fn(&RawEntry) -> u32) -> Result<()> {
        let mut expected = Vec::new();
        let mut last = None;
        for i in 0..self.header.entry_count {
            let off = self.entry(i).map(|e| field(&e));
            if off != last {
                expected.push(i);
                last = off;
            }
        }
        if index != expected.as_slice() {
            return Err(RdbError::Corrupt(format!(
                "{name} index does not match entry runs ({} stored, {} expected)",
                index.len(),
                expected.len()
            )));
        }
        Ok(())
    }
}

fn sort_key(t: &Track<'_>) -> (String, String, String) {
    (t.artist.to_lowercase(), t.album.to_lowercase(), t.title.to_lowercase())
}

fn check_sections(h: &Header, len: usize) -> Result<()> {
    let entries_end = HEADER_SIZE as u64 + h.entry_count as u64 * ENTRY_SIZE as u64;
    let artist_end = h.artist_index_offset as u64 + h.artist_index_count as u64 * INDEX_ITEM_SIZE as u64;
    let album_end = h.album_index_offset as u64 + h.album_index_count as u64 * INDEX_ITEM_SIZE as u64;

    let ordered = entries_end <= h.artist_index_offset as u64
        && artist_end <= h.album_index_offset as u64
        && album_end <= h.string_pool_offset as u64;
    if !ordered {
        return Err(RdbError::Corrupt("header sections overlap or are out of order".into()));
    }
    if h.string_pool_offset as u64 > len as u64 {
        return Err(RdbError::Corrupt(format!(
            "string pool offset {} beyond end of {len}-byte file",
            h.string_pool_offset
        )));
    }
    Ok(())
}
