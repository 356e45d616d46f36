//! Builds RDB1 music databases: a flat, memory-mappable index of tracks
//! sorted by artist, album and title, with a deduplicated string pool and
//! artist/album jump tables for playback devices.

pub mod builder;
pub mod codec;
pub mod error;
pub mod index;
pub mod path_utils;
pub mod pool;
pub mod reader;
pub mod scan;
pub mod tags;
pub mod track;
pub mod writer;

pub use builder::{BuildSummary, build, build_from_records, build_from_tags, build_with, encode_records};
pub use error::{RdbError, Result};
pub use reader::RdbReader;
pub use scan::ScanOptions;
pub use tags::{RawTags, SymphoniaTagReader, TagError, TagReader};
pub use track::TrackRecord;
