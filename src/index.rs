//! Artist / album boundary indices.
//!
//! A boundary index lists the position of the first entry of every maximal
//! run of consecutive entries whose field resolves to the same pool offset.
//!
//! Precondition: `entries` must be in [`sort_tracks`](crate::track::sort_tracks)
//! order. Runs are only contiguous because the sort is stable and
//! artist-major; the scan itself compares each entry with its immediate
//! predecessor and nothing else. Album runs are therefore not scoped to an
//! artist: when one artist's last album and the next artist's first album
//! share a name, they form a single run.

use crate::track::SortedEntry;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Field {
    Artist,
    Album,
}

impl Field {
    fn offset(self, e: &SortedEntry) -> u32 {
        match self {
            Field::Artist => e.artist_offset,
            Field::Album => e.album_offset,
        }
    }
}

pub fn boundaries(entries: &[SortedEntry], field: Field) -> Vec<u32> {
    debug_assert!(
        entries
            .windows(2)
            .all(|w| w[0].record.sort_key() <= w[1].record.sort_key()),
        "boundary index built over unsorted entries"
    );

    let mut out = Vec::new();
    let mut last: Option<u32> = None;

    for (i, e) in entries.iter().enumerate() {
        let off = field.offset(e);
        if last != Some(off) {
            // entry count is bounded to u32 by the caller
            out.push(i as u32);
            last = Some(off);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackRecord;

    fn entry(artist: &str, album: &str, artist_offset: u32, album_offset: u32) -> SortedEntry {
        SortedEntry {
            record: TrackRecord {
                relative_path: "/x.mp3".into(),
                title: "t".into(),
                artist: artist.into(),
                album: album.into(),
            },
            title_offset: 0,
            artist_offset,
            album_offset,
            path_offset: 0,
        }
    }

    #[test]
    fn empty_input_gives_empty_index() {
        assert!(boundaries(&[], Field::Artist).is_empty());
    }

    #[test]
    fn first_entry_is_always_a_boundary() {
        let v = vec![entry("a", "x", 7, 9)];
        assert_eq!(boundaries(&v, Field::Artist), [0]);
        assert_eq!(boundaries(&v, Field::Album), [0]);
    }

    #[test]
    fn runs_start_where_offset_changes() {
        let v = vec![
            entry("a", "x", 10, 20),
            entry("a", "x", 10, 20),
            entry("a", "y", 10, 30),
            entry("b", "y", 40, 30),
            entry("c", "z", 50, 60),
        ];
        assert_eq!(boundaries(&v, Field::Artist), [0, 3, 4]);
        // "y" continues across the artist change, so it is one album run
        assert_eq!(boundaries(&v, Field::Album), [0, 2, 4]);
    }

    #[test]
    fn reused_album_name_in_non_adjacent_runs_counts_twice() {
        let v = vec![
            entry("a", "greatest hits", 1, 5),
            entry("b", "live", 2, 6),
            entry("c", "greatest hits", 3, 5),
        ];
        assert_eq!(boundaries(&v, Field::Album), [0, 1, 2]);
    }
}
