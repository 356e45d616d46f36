use anyhow::{Context, Result};
use rdbgen::RdbReader;
use rdbgen::reader::Track;
use std::path::Path;

fn open(db: &Path) -> Result<RdbReader> {
    RdbReader::open(db).with_context(|| format!("Failed to open database {}", db.display()))
}

pub fn run_info(db: &Path) -> Result<()> {
    let r = open(db)?;
    let h = r.header();
    let size = std::fs::metadata(db).map(|m| m.len()).unwrap_or(0);

    println!("Database:            {}", db.display());
    println!("File size:           {}", format_size(size));
    println!("Entries:             {}", h.entry_count);
    println!("Artist runs:         {}", h.artist_index_count);
    println!("Album runs:          {}", h.album_index_count);
    println!("Artist index offset: {}", h.artist_index_offset);
    println!("Album index offset:  {}", h.album_index_offset);
    println!("String pool offset:  {}", h.string_pool_offset);
    println!("String pool size:    {}", format_size(r.pool().len() as u64));
    Ok(())
}

pub fn run_list(db: &Path) -> Result<()> {
    let r = open(db)?;
    for (i, t) in r.tracks().enumerate() {
        let t = t.with_context(|| format!("entry {i}"))?;
        println!("{i:6}  {}", describe(&t));
    }
    Ok(())
}

pub fn run_artists(db: &Path) -> Result<()> {
    let r = open(db)?;
    for n in 0..r.artist_count() {
        let Some(start) = r.artist_start(n) else { break };
        let t = r.track(start)?;
        println!("{start:6}  {}", t.artist);
    }
    Ok(())
}

pub fn run_albums(db: &Path) -> Result<()> {
    let r = open(db)?;
    for n in 0..r.album_count() {
        let Some(start) = r.album_start(n) else { break };
        let t = r.track(start)?;
        println!("{start:6}  {} / {}", t.artist, t.album);
    }
    Ok(())
}

pub fn run_verify(db: &Path) -> Result<()> {
    let r = open(db)?;
    r.verify()
        .with_context(|| format!("Verification failed for {}", db.display()))?;
    println!("OK {} ({} entries)", db.display(), r.entry_count());
    Ok(())
}

fn describe(t: &Track<'_>) -> String {
    format!("{} / {} / {}  [{}]", t.artist, t.album, t.title, t.path)
}

// Simple human-readable size (binary units)
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    let b = bytes as f64;
    if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.00 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MiB");
    }
}
