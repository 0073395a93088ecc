//! The record shared by both pipelines: one file as a relative name plus its bytes.

/// One logical file: a `/`-separated relative path and its full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub data: Vec<u8>,
}

impl Entry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Iterate over the `/`-separated segments of the name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('/')
    }
}

/// Check that `name` is a safe relative member path.
///
/// Accepted names are non-empty, relative, and consist of `/`-separated
/// segments that are neither empty, `.` nor `..`. Other characters are left
/// to the host: `a\b` and `c:notes.txt` are ordinary file names on Unix.
/// See [`validate_host_name`] for the checks that depend on the host.
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty name");
    }
    if name.starts_with('/') {
        return Err("absolute path");
    }
    if name.contains('\0') {
        return Err("NUL byte in path");
    }
    for segment in name.split('/') {
        match segment {
            "" => return Err("empty path segment"),
            "." | ".." => return Err("relative path segment"),
            _ => {}
        }
    }
    Ok(())
}

/// Check that `name` stays below the destination root once joined to a
/// host path.
///
/// On Windows a backslash is a separator and `C:foo` names a drive, so both
/// could escape the root; elsewhere they are plain characters.
pub fn validate_host_name(name: &str) -> Result<(), &'static str> {
    validate_name(name)?;
    if cfg!(windows) {
        if name.contains('\\') {
            return Err("backslash in path");
        }
        let bytes = name.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            return Err("drive prefix in path");
        }
    }
    Ok(())
}
