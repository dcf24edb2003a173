//! Address-range mapping of one region.

use crate::utils::config::ANON_PATH;
use serde::Serialize;

/// One `/proc/<pid>/smaps` mapping header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    /// First address of the range
    pub head: u64,
    /// One past the last address
    pub tail: u64,
    /// Protection string such as `r-xp`
    pub prot: String,
    /// Offset into the backing object
    pub offset: u64,
    /// Device node, `major:minor`
    pub device: String,
    /// Inode / flag column, decimal
    pub flags: u64,
    /// Backing path; never empty
    pub path: String,
}

impl Mapping {
    /// Build a mapping, normalising an empty path to `[anon]`
    pub fn new(
        head: u64,
        tail: u64,
        prot: impl Into<String>,
        offset: u64,
        device: impl Into<String>,
        flags: u64,
        path: &str,
    ) -> Self {
        let path = path.trim();
        Self {
            head,
            tail,
            prot: prot.into(),
            offset,
            device: device.into(),
            flags,
            path: if path.is_empty() {
                ANON_PATH.to_string()
            } else {
                path.to_string()
            },
        }
    }

    pub fn is_executable(&self) -> bool {
        self.prot.contains('x')
    }

    /// Region class
    ///
    /// Special paths name their own class (`[heap]` → `heap`); other
    /// regions are `code` when executable and `data` otherwise.
    pub fn class(&self) -> &str {
        match self.path.strip_prefix('[') {
            Some(rest) => rest.split(']').next().unwrap_or(rest),
            None if self.is_executable() => "code",
            None => "data",
        }
    }

    /// Last path component
    pub fn basename(&self) -> &str {
        basename(&self.path)
    }
}

/// Last component of a `/`-separated path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(prot: &str, path: &str) -> Mapping {
        Mapping::new(0x1000, 0x2000, prot, 0, "00:00", 0, path)
    }

    #[test]
    fn test_empty_path_is_anon() {
        let m = mapping("rw-p", "");
        assert_eq!(m.path, "[anon]");
        assert_eq!(m.class(), "anon");
    }

    #[test]
    fn test_bracketed_class() {
        assert_eq!(mapping("rw-p", "[heap]").class(), "heap");
        assert_eq!(mapping("rw-p", "[stack:1234]").class(), "stack:1234");
        assert_eq!(mapping("rw-p", "[vdso").class(), "vdso");
    }

    #[test]
    fn test_code_and_data_class() {
        assert_eq!(mapping("r-xp", "/lib/libc.so.6").class(), "code");
        assert_eq!(mapping("rw-p", "/lib/libc.so.6").class(), "data");
    }

    #[test]
    fn test_basename() {
        assert_eq!(mapping("r-xp", "/usr/lib/libfoo.so").basename(), "libfoo.so");
        assert_eq!(basename("plain"), "plain");
    }
}
