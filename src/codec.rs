//! RDB1 wire format.
//!
//! Everything is little-endian and packed:
//!
//! | Section       | Offset   | Size                  |
//! |---------------|----------|-----------------------|
//! | header        | 0        | 28                    |
//! | entry table   | 28       | 16 * entry_count      |
//! | artist index  | computed | 4 * artist_index_count|
//! | album index   | computed | 4 * album_index_count |
//! | string pool   | computed | rest of file          |
//!
//! Entry fields are offsets relative to the start of the string pool, in the
//! order title, artist, album, path.

use crate::error::{RdbError, Result};
use crate::track::SortedEntry;

pub const MAGIC: [u8; 4] = *b"RDB1";
pub const HEADER_SIZE: usize = 28;
pub const ENTRY_SIZE: usize = 16;
pub const INDEX_ITEM_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub entry_count: u32,
    pub artist_index_count: u32,
    pub album_index_count: u32,
    pub artist_index_offset: u32,
    pub album_index_offset: u32,
    pub string_pool_offset: u32,
}

impl Header {
    /// Compute section offsets from the section sizes.
    pub fn layout(entries: usize, artists: usize, albums: usize) -> Result<Self> {
        let artist_index_offset = HEADER_SIZE + ENTRY_SIZE * entries;
        let album_index_offset = artist_index_offset + INDEX_ITEM_SIZE * artists;
        let string_pool_offset = album_index_offset + INDEX_ITEM_SIZE * albums;

        Ok(Self {
            entry_count: to_u32("entry count", entries)?,
            artist_index_count: to_u32("artist index count", artists)?,
            album_index_count: to_u32("album index count", albums)?,
            artist_index_offset: to_u32("artist index offset", artist_index_offset)?,
            album_index_offset: to_u32("album index offset", album_index_offset)?,
            string_pool_offset: to_u32("string pool offset", string_pool_offset)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        put_u32(out, self.entry_count);
        put_u32(out, self.artist_index_count);
        put_u32(out, self.album_index_count);
        put_u32(out, self.artist_index_offset);
        put_u32(out, self.album_index_offset);
        put_u32(out, self.string_pool_offset);
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RdbError::Corrupt(format!(
                "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
                bytes.len()
            )));
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        if magic != MAGIC {
            return Err(RdbError::BadMagic { found: magic });
        }

        Ok(Self {
            entry_count: get_u32(bytes, 4),
            artist_index_count: get_u32(bytes, 8),
            album_index_count: get_u32(bytes, 12),
            artist_index_offset: get_u32(bytes, 16),
            album_index_offset: get_u32(bytes, 20),
            string_pool_offset: get_u32(bytes, 24),
        })
    }
}

/// Lay out the whole file into one exactly-sized buffer.
pub fn encode(
    entries: &[SortedEntry],
    artist_index: &[u32],
    album_index: &[u32],
    pool: &[u8],
) -> Result<Vec<u8>> {
    let header = Header::layout(entries.len(), artist_index.len(), album_index.len())?;
    let total = header.string_pool_offset as usize + pool.len();
    to_u32("file size", total)?;

    tracing::trace!(
        entries = header.entry_count,
        artist_index_offset = header.artist_index_offset,
        album_index_offset = header.album_index_offset,
        string_pool_offset = header.string_pool_offset,
        total,
        "encoding database"
    );

    let mut out = Vec::with_capacity(total);
    header.encode(&mut out);

    for e in entries {
        put_u32(&mut out, e.title_offset);
        put_u32(&mut out, e.artist_offset);
        put_u32(&mut out, e.album_offset);
        put_u32(&mut out, e.path_offset);
    }
    u32_list_pack(&mut out, artist_index);
    u32_list_pack(&mut out, album_index);
    out.extend_from_slice(pool);

    debug_assert_eq!(out.len(), total);
    Ok(out)
}

pub fn u32_list_pack(out: &mut Vec<u8>, ids: &[u32]) {
    for &id in ids {
        put_u32(out, id);
    }
}

pub fn u32_list_unpack(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[inline]
fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Caller guarantees `at + 4 <= bytes.len()`.
#[inline]
pub(crate) fn get_u32(bytes: &[u8], at: usize) -> u32 {
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(arr)
}

fn to_u32(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| RdbError::TooLarge { what, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackRecord;

    fn entry(t: u32, ar: u32, al: u32, p: u32) -> SortedEntry {
        SortedEntry {
            record: TrackRecord {
                relative_path: String::new(),
                title: String::new(),
                artist: String::new(),
                album: String::new(),
            },
            title_offset: t,
            artist_offset: ar,
            album_offset: al,
            path_offset: p,
        }
    }

    #[test]
    fn layout_sums_section_sizes() {
        let h = Header::layout(3, 2, 1).unwrap();
        assert_eq!(h.artist_index_offset, 28 + 48);
        assert_eq!(h.album_index_offset, 28 + 48 + 8);
        assert_eq!(h.string_pool_offset, 28 + 48 + 8 + 4);
    }

    #[test]
    fn empty_database_is_just_a_header() {
        let buf = encode(&[], &[], &[], &[]).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..4], b"RDB1");
        let h = Header::decode(&buf).unwrap();
        assert_eq!(h.entry_count, 0);
        assert_eq!(h.string_pool_offset, HEADER_SIZE as u32);
    }

    #[test]
    fn bytes_are_little_endian_in_field_order() {
        let entries = [entry(1, 2, 3, 0x0403_0201)];
        let pool = b"a\0";
        let buf = encode(&entries, &[0], &[0], pool).unwrap();

        assert_eq!(buf.len(), 28 + 16 + 4 + 4 + 2);
        assert_eq!(&buf[4..8], &[1, 0, 0, 0]); // entry_count
        assert_eq!(&buf[16..20], &44u32.to_le_bytes());
        assert_eq!(&buf[20..24], &48u32.to_le_bytes());
        assert_eq!(&buf[24..28], &52u32.to_le_bytes());
        assert_eq!(&buf[28..32], &[1, 0, 0, 0]);
        assert_eq!(&buf[40..44], &[1, 2, 3, 4]);
        assert_eq!(&buf[52..], pool);
    }

    #[test]
    fn decode_rejects_bad_magic_and_short_input() {
        let mut buf = encode(&[], &[], &[], &[]).unwrap();
        assert!(matches!(Header::decode(&buf[..10]), Err(RdbError::Corrupt(_))));
        buf[0] = b'X';
        assert!(matches!(Header::decode(&buf), Err(RdbError::BadMagic { .. })));
    }

    #[test]
    fn u32_list_unpack_reads_packed_values() {
        let mut out = Vec::new();
        u32_list_pack(&mut out, &[0, 2, 70_000]);
        assert_eq!(u32_list_unpack(&out), [0, 2, 70_000]);
    }
}
