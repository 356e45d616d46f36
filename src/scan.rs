use crate::error::{RdbError, Result};
use crate::path_utils::device_path;
use crate::tags::{RawTags, TagError, TagReader};
use crate::track::TrackRecord;
use crossbeam_channel as chan;
use indicatif::{ProgressBar, ProgressStyle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread;

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["mp3", "flac", "ogg", "wav", "m4a"];

/// Upper bound for tag reading workers, whatever the caller asks for.
pub const MAX_THREADS: usize = 256;
const QUEUE_PER_THREAD: usize = 256;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Tag reading worker threads (min 1).
    pub threads: usize,
    pub follow_symlinks: bool,
    /// Draw a progress bar on stderr.
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            follow_symlinks: false,
            progress: false,
        }
    }
}

pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

#[derive(Debug, Default)]
pub struct ScanReport {
    /// In walk order (directory entries sorted by file name).
    pub records: Vec<TrackRecord>,
    /// Directories or entries that could not be read, and files whose path
    /// is not valid UTF-8; all of them are left out of the database.
    pub skipped: u64,
    /// Files whose tags could not be read and got default values.
    pub tag_failures: u64,
}

#[derive(Debug)]
struct TagJob {
    seq: usize,
    path: PathBuf,
}

#[derive(Debug)]
struct TagResult {
    seq: usize,
    record: TrackRecord,
    failed: bool,
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
}

/// Turn one tag-reading outcome into a record, substituting defaults on
/// failure. Returns whether defaults were forced by an error.
pub fn resolve_track(path: &Path, outcome: std::result::Result<RawTags, TagError>) -> (TrackRecord, bool) {
    let rel = device_path(&path.to_string_lossy());
    let (tags, failed) = match outcome {
        Ok(t) => (t, false),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "tags unreadable, using defaults");
            (RawTags::default(), true)
        }
    };
    (TrackRecord::with_defaults(rel, tags.title, tags.artist, tags.album), failed)
}

/// Walk `root`, read tags for every supported file and return the records.
///
/// Unreadable subdirectories are skipped and counted; an unreadable root is
/// an error. The result order only depends on the directory contents, not on
/// thread scheduling.
pub fn collect_tracks(root: &Path, reader: &dyn TagReader, opts: &ScanOptions) -> Result<ScanReport> {
    std::fs::read_dir(root).map_err(|source| RdbError::SourceUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let (paths, skipped) = walk(root, opts.follow_symlinks);
    tracing::info!(root = %root.display(), files = paths.len(), skipped, "walk finished");

    let threads = opts.threads.clamp(1, MAX_THREADS);
    let bar = progress_bar(paths.len() as u64, opts.progress);

    let depth = threads * QUEUE_PER_THREAD;
    let (job_tx, job_rx) = chan::bounded::<TagJob>(depth);
    let (res_tx, res_rx) = chan::bounded::<TagResult>(depth);

    let mut results: Vec<TagResult> = Vec::with_capacity(paths.len());

    thread::scope(|s| -> Result<()> {
        let mut workers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            workers.push(s.spawn(move || worker_loop(reader, rx, tx)));
        }
        // Only worker clones remain; res_rx closes once they exit.
        drop(job_rx);
        drop(res_tx);

        let producer = s.spawn(move || {
            for (seq, path) in paths.into_iter().enumerate() {
                if job_tx.send(TagJob { seq, path }).is_err() {
                    break;
                }
            }
        });

        while let Ok(r) = res_rx.recv() {
            bar.inc(1);
            results.push(r);
        }

        let mut panicked = producer.join().is_err();
        for w in workers {
            panicked |= w.join().is_err();
        }
        if panicked {
            return Err(RdbError::WorkerPanicked);
        }
        Ok(())
    })?;

    bar.finish_and_clear();

    results.sort_by_key(|r| r.seq);
    let tag_failures = results.iter().filter(|r| r.failed).count() as u64;
    if tag_failures > 0 {
        tracing::info!(tag_failures, "some files had unreadable tags");
    }

    Ok(ScanReport {
        records: results.into_iter().map(|r| r.record).collect(),
        skipped,
        tag_failures,
    })
}

fn worker_loop(reader: &dyn TagReader, rx: chan::Receiver<TagJob>, tx: chan::Sender<TagResult>) {
    while let Ok(job) = rx.recv() {
        // A reader crashing on one malformed file must not take the build down.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| reader.read_tags(&job.path)))
            .unwrap_or_else(|payload| Err(TagError::Panicked(panic_message(payload.as_ref()))));
        let (record, failed) = resolve_track(&job.path, outcome);
        if tx
            .send(TagResult {
                seq: job.seq,
                record,
                failed,
            })
            .is_err()
        {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn walk(root: &Path, follow_symlinks: bool) -> (Vec<PathBuf>, u64) {
    let mut files = Vec::new();
    let mut skipped = 0u64;

    let walker = walkdir::WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped += 1;
                let at = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::warn!(path = %at, error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_supported(entry.path()) {
            continue;
        }
        // The device opens files by the stored UTF-8 path; a lossy name
        // would point at nothing.
        if entry.path().to_str().is_none() {
            skipped += 1;
            tracing::warn!(path = %entry.path().display(), "skipping file with non-UTF-8 path");
            continue;
        }
        files.push(entry.into_path());
    }

    (files, skipped)
}

fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} tracks {elapsed}") {
        bar.set_style(style);
    }
    bar
}
