use std::cmp::Ordering;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One collected track, before any pool offsets are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    /// Device-root-relative, forward slashes, always starts with `/`.
    pub relative_path: String,
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackRecord {
    /// Build a record from optional tag values, substituting defaults for
    /// anything missing or empty. The default title is the file name.
    pub fn with_defaults(
        relative_path: String,
        title: Option<String>,
        artist: Option<String>,
        album: Option<String>,
    ) -> Self {
        let title = non_empty(title).unwrap_or_else(|| base_name(&relative_path).to_string());
        Self {
            title,
            artist: non_empty(artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            album: non_empty(album).unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            relative_path,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey {
            artist: self.artist.to_lowercase(),
            album: self.album.to_lowercase(),
            title: self.title.to_lowercase(),
        }
    }
}

/// Case-folded (artist, album, title); compared field by field by code point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub artist: String,
    pub album: String,
    pub title: String,
}

/// A record at its final position, with its four string pool offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedEntry {
    pub record: TrackRecord,
    pub title_offset: u32,
    pub artist_offset: u32,
    pub album_offset: u32,
    pub path_offset: u32,
}

/// Stable sort by the case-insensitive (artist, album, title) key.
/// Records with equal keys keep their input order.
pub fn sort_tracks(records: &mut [TrackRecord]) {
    // stable; each key is folded once
    records.sort_by_cached_key(TrackRecord::sort_key);
}

pub fn compare_tracks(a: &TrackRecord, b: &TrackRecord) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(artist: &str, album: &str, title: &str) -> TrackRecord {
        TrackRecord {
            relative_path: format!("/{artist}/{album}/{title}.mp3"),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }

    #[test]
    fn defaults_for_missing_tags() {
        let r = TrackRecord::with_defaults("/Music/x/track01.flac".into(), None, None, None);
        assert_eq!(r.title, "track01.flac");
        assert_eq!(r.artist, UNKNOWN_ARTIST);
        assert_eq!(r.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn empty_tag_counts_as_missing() {
        let r = TrackRecord::with_defaults(
            "/a.mp3".into(),
            Some(String::new()),
            Some("Someone".into()),
            Some(String::new()),
        );
        assert_eq!(r.title, "a.mp3");
        assert_eq!(r.artist, "Someone");
        assert_eq!(r.album, UNKNOWN_ALBUM);
    }

    #[test]
    fn sorts_artist_then_album_then_title() {
        let mut v = vec![rec("B", "Z", "Song1"), rec("A", "Y", "Song2"), rec("A", "Y", "Song3")];
        sort_tracks(&mut v);
        let titles: Vec<_> = v.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Song2", "Song3", "Song1"]);
    }

    #[test]
    fn sort_ignores_case() {
        let mut v = vec![rec("beta", "x", "1"), rec("Alpha", "x", "2"), rec("ALPHA", "a", "3")];
        sort_tracks(&mut v);
        let titles: Vec<_> = v.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["3", "2", "1"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut a = rec("Same", "Same", "Same");
        a.relative_path = "/first.mp3".into();
        let mut b = rec("SAME", "same", "SAME");
        b.relative_path = "/second.mp3".into();
        let mut c = rec("same", "SAME", "same");
        c.relative_path = "/third.mp3".into();

        let mut v = vec![a, b, c];
        sort_tracks(&mut v);
        let paths: Vec<_> = v.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(paths, ["/first.mp3", "/second.mp3", "/third.mp3"]);
    }

    #[test]
    fn sort_keeps_every_record() {
        let mut v: Vec<_> = (0..50)
            .map(|i| rec(&format!("a{}", i % 7), &format!("b{}", i % 3), &format!("t{i}")))
            .collect();
        sort_tracks(&mut v);
        assert_eq!(v.len(), 50);
        assert!(v.windows(2).all(|w| compare_tracks(&w[0], &w[1]) != Ordering::Greater));
    }
}
