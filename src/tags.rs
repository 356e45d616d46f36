use std::fs::File;
use std::path::Path;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use thiserror::Error;

/// The three tag values a database entry needs. Any of them may be absent.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("open failed: {0}")]
    Open(#[from] std::io::Error),

    #[error("unrecognised or unreadable container: {0}")]
    Probe(#[from] SymphoniaError),

    #[error("tag reader panicked: {0}")]
    Panicked(String),
}

/// Per-file tag extraction. Failures are returned and the collector decides
/// what to substitute; a panic inside `read_tags` is caught and handled the
/// same way.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<RawTags, TagError>;
}

/// Tag reader backed by symphonia's format probe.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaTagReader;

impl TagReader for SymphoniaTagReader {
    fn read_tags(&self, path: &Path) -> Result<RawTags, TagError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let meta_opts = MetadataOptions::default();
        let fmt_opts = FormatOptions::default();
        let mut probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;

        let mut out = RawTags::default();

        // Container metadata (Vorbis comments, MP4 atoms, RIFF INFO) wins over
        // tags found in front of the stream while probing (ID3v2).
        let container = probed.format.metadata();
        if let Some(rev) = container.current() {
            apply_tags(&mut out, rev.tags());
        }
        if let Some(probe_meta) = probed.metadata.get() {
            if let Some(rev) = probe_meta.current() {
                apply_tags(&mut out, rev.tags());
            }
        }

        Ok(out)
    }
}

fn apply_tags(out: &mut RawTags, tags: &[Tag]) {
    for tag in tags {
        let slot = match tag.std_key {
            Some(StandardTagKey::TrackTitle) => &mut out.title,
            Some(StandardTagKey::Artist) => &mut out.artist,
            Some(StandardTagKey::Album) => &mut out.album,
            _ => continue,
        };
        if slot.is_none() {
            *slot = clean_value(&tag.value.to_string());
        }
    }
}

/// Tag values are C strings on the device; anything after a NUL is padding.
fn clean_value(v: &str) -> Option<String> {
    let v = v.split('\0').next().unwrap_or_default();
    if v.is_empty() { None } else { Some(v.to_string()) }
}
