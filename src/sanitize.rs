//! Entry-name normalization.
//!
//! Archive entry names are attacker-controlled. Before anything touches the
//! filesystem the name is rewritten into a relative, forward-slash path with
//! no drive label, no `..` and no segments made only of dots or whitespace.

/// Normalize a raw archive entry name into a safe relative path.
///
/// Returns an empty string when nothing usable remains (e.g. `"./"`, `"..."`).
///
/// ```
/// use release_unpack::normalize_entry_path;
///
/// assert_eq!(normalize_entry_path("  ..\\..\\evil.txt  "), "evil.txt");
/// assert_eq!(normalize_entry_path("C:\\tools\\bin\\app.exe"), "tools/bin/app.exe");
/// assert_eq!(normalize_entry_path("/etc/passwd"), "etc/passwd");
/// ```
pub fn normalize_entry_path(name: &str) -> String {
    let trimmed = strip_drive_label(name.trim());
    let forward = trimmed.replace('\\', "/");
    let cleaned = clean(&forward);

    let parts: Vec<&str> = cleaned
        .split('/')
        .map(str::trim)
        .filter(|part| !is_nuisance_segment(part))
        .collect();

    let normalized = clean(&parts.join("/"));
    if normalized == "." {
        String::new()
    } else {
        normalized
    }
}

/// Strip a leading `X:` drive label and any backslashes directly after it.
fn strip_drive_label(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_uppercase() && bytes[1] == b':' {
        name[2..].trim_start_matches('\\')
    } else {
        name
    }
}

/// Empty, or nothing but dots and whitespace.
fn is_nuisance_segment(part: &str) -> bool {
    part.chars().all(|c| c == '.' || c.is_whitespace())
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// against preceding segments. Leading `..` of a relative path is kept and
/// `..` directly under the root is dropped. Never consults the filesystem.
fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ if rooted => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }

    let joined = out.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
