/// Turn an absolute path into the root-relative form stored in the database.
///
/// - the root / drive prefix is removed (`/`, `E:\`, `\\?\E:\`, `\\server\share\`)
/// - every `\` becomes `/`
/// - the result always starts with `/`
///
/// Casing is preserved and nothing is escaped. Windows prefixes are
/// recognised syntactically, so this behaves the same on every host.
pub fn device_path(abs: &str) -> String {
    let rest = strip_root(abs);
    let mut out = String::with_capacity(rest.len() + 1);
    if !rest.starts_with(['/', '\\']) {
        out.push('/');
    }
    out.extend(rest.chars().map(|c| if c == '\\' { '/' } else { c }));
    out
}

/// Returns `abs` without its root prefix, keeping the separator that
/// followed the root (if any).
fn strip_root(abs: &str) -> &str {
    // Verbatim prefix: \\?\E:\... or \\?\UNC\server\share\...
    if let Some(rest) = abs.strip_prefix(r"\\?\") {
        if let Some(unc) = rest.strip_prefix(r"UNC\") {
            return skip_unc_share(unc);
        }
        return strip_drive(rest).unwrap_or(rest);
    }

    // UNC: \\server\share\...
    if let Some(unc) = abs.strip_prefix(r"\\") {
        return skip_unc_share(unc);
    }

    if let Some(rest) = strip_drive(abs) {
        return rest;
    }

    abs
}

/// `E:\Music` -> `\Music`, `E:` -> ``
fn strip_drive(p: &str) -> Option<&str> {
    let b = p.as_bytes();
    if b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':' {
        Some(&p[2..])
    } else {
        None
    }
}

/// `server\share\Music\a.mp3` -> `\Music\a.mp3`
fn skip_unc_share(p: &str) -> &str {
    let mut seps = p.match_indices(['\\', '/']).map(|(i, _)| i);
    let _server_end = seps.next();
    match seps.next() {
        Some(share_end) => &p[share_end..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_drive_is_stripped() {
        assert_eq!(device_path(r"E:\Music\a.mp3"), "/Music/a.mp3");
        assert_eq!(device_path(r"e:\Music\Sub\B.FLAC"), "/Music/Sub/B.FLAC");
    }

    #[test]
    fn unix_paths_keep_their_root_slash() {
        assert_eq!(device_path("/mnt/ipod/Music/a.mp3"), "/mnt/ipod/Music/a.mp3");
    }

    #[test]
    fn verbatim_and_unc_prefixes() {
        assert_eq!(device_path(r"\\?\E:\Music\a.mp3"), "/Music/a.mp3");
        assert_eq!(device_path(r"\\nas\media\Music\a.mp3"), "/Music/a.mp3");
        assert_eq!(device_path(r"\\?\UNC\nas\media\Music\a.mp3"), "/Music/a.mp3");
    }

    #[test]
    fn rootless_input_used_verbatim() {
        assert_eq!(device_path(r"Music\a.mp3"), "/Music/a.mp3");
        assert_eq!(device_path("a b%20c.ogg"), "/a b%20c.ogg");
    }

    #[test]
    fn casing_is_untouched() {
        assert_eq!(device_path(r"E:\MuSiC\Ärger.mp3"), "/MuSiC/Ärger.mp3");
    }
}
