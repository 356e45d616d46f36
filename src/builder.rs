//! The build pipeline: collect -> sort -> pool -> indices -> encode -> write.
//!
//! Every structure lives only for the duration of one call; nothing is
//! shared between builds.

use crate::codec;
use crate::error::{RdbError, Result};
use crate::index::{self, Field};
use crate::pool::StringPool;
use crate::scan::{self, ScanOptions};
use crate::tags::{RawTags, SymphoniaTagReader, TagReader};
use crate::track::{self, SortedEntry, TrackRecord};
use crate::writer;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub track_count: u32,
    pub artist_count: u32,
    pub album_count: u32,
    pub pool_bytes: usize,
    pub file_bytes: usize,
    /// Unreadable directories/entries skipped during the walk.
    pub skipped_dirs: u64,
    /// Files that fell back to default tags.
    pub tag_failures: u64,
}

/// An encoded database, not yet written anywhere.
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub entries: Vec<SortedEntry>,
    pub artist_index: Vec<u32>,
    pub album_index: Vec<u32>,
    pub pool_bytes: usize,
}

impl Encoded {
    fn summary(&self) -> BuildSummary {
        BuildSummary {
            track_count: self.entries.len() as u32,
            artist_count: self.artist_index.len() as u32,
            album_count: self.album_index.len() as u32,
            pool_bytes: self.pool_bytes,
            file_bytes: self.bytes.len(),
            ..Default::default()
        }
    }
}

/// Scan `source`, read tags with symphonia and write the database to `dest`.
pub fn build(source: &Path, dest: &Path) -> Result<BuildSummary> {
    build_with(source, dest, &SymphoniaTagReader, &ScanOptions::default())
}

pub fn build_with(
    source: &Path,
    dest: &Path,
    reader: &dyn TagReader,
    opts: &ScanOptions,
) -> Result<BuildSummary> {
    // Fail before spending time on the scan.
    writer::destination_dir(dest)?;

    tracing::info!(source = %source.display(), dest = %dest.display(), threads = opts.threads, "build starting");

    let report = scan::collect_tracks(source, reader, opts)?;
    let mut summary = build_from_records(report.records, dest)?;
    summary.skipped_dirs = report.skipped;
    summary.tag_failures = report.tag_failures;
    Ok(summary)
}

/// Build from already-extracted `(absolute path, tags)` pairs.
pub fn build_from_tags(tracks: Vec<(PathBuf, RawTags)>, dest: &Path) -> Result<BuildSummary> {
    let records = tracks
        .into_iter()
        .map(|(path, tags)| scan::resolve_track(&path, Ok(tags)).0)
        .collect();
    build_from_records(records, dest)
}

pub fn build_from_records(records: Vec<TrackRecord>, dest: &Path) -> Result<BuildSummary> {
    let encoded = encode_records(records)?;
    writer::write_atomic(dest, &encoded.bytes)?;

    let summary = encoded.summary();
    tracing::info!(
        dest = %dest.display(),
        tracks = summary.track_count,
        artists = summary.artist_count,
        albums = summary.album_count,
        bytes = summary.file_bytes,
        "database built"
    );
    Ok(summary)
}

/// Sort, intern and lay out `records` in memory.
pub fn encode_records(mut records: Vec<TrackRecord>) -> Result<Encoded> {
    if u32::try_from(records.len()).is_err() {
        return Err(RdbError::TooLarge {
            what: "entry count",
            value: records.len(),
        });
    }

    track::sort_tracks(&mut records);

    let mut pool = StringPool::new();
    let entries = assign_offsets(records, &mut pool)?;

    let artist_index = index::boundaries(&entries, Field::Artist);
    let album_index = index::boundaries(&entries, Field::Album);

    tracing::debug!(
        entries = entries.len(),
        distinct_strings = pool.distinct(),
        pool_bytes = pool.len(),
        "string pool built"
    );

    let bytes = codec::encode(&entries, &artist_index, &album_index, pool.as_bytes())?;

    Ok(Encoded {
        bytes,
        pool_bytes: pool.len(),
        entries,
        artist_index,
        album_index,
    })
}

/// Intern each record's strings in sorted order: path, title, artist, album.
/// The order is part of the layout, so identical inputs give identical pools.
fn assign_offsets(records: Vec<TrackRecord>, pool: &mut StringPool) -> Result<Vec<SortedEntry>> {
    records
        .into_iter()
        .map(|record| {
            let path_offset = pool.intern(&record.relative_path)?;
            let title_offset = pool.intern(&record.title)?;
            let artist_offset = pool.intern(&record.artist)?;
            let album_offset = pool.intern(&record.album)?;
            Ok(SortedEntry {
                record,
                title_offset,
                artist_offset,
                album_offset,
                path_offset,
            })
        })
        .collect()
}
