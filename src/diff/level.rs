//! Diff and trim levels.
//!
//! Both levels share one vocabulary: `sys` (0), `app` (1), `pid` (2),
//! `sec` (3), `obj` (4), or an integer.

use serde::Serialize;
use std::path::Path;

/// How many key columns a diff compares by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DiffLevel(u8);

/// Header titles of the four key columns
const COLUMN_TITLES: [&str; 4] = ["Cmd", "Pid", "Type", "Path"];

impl DiffLevel {
    /// Whole system, one row per measure
    pub const SYSTEM: DiffLevel = DiffLevel(0);
    /// Per application name
    pub const APPLICATION: DiffLevel = DiffLevel(1);
    /// Per application instance
    pub const INSTANCE: DiffLevel = DiffLevel(2);
    /// Per instance and region class
    pub const CLASS: DiffLevel = DiffLevel(3);
    /// Per instance, class and backing object
    pub const OBJECT: DiffLevel = DiffLevel(4);

    /// Level from a raw integer, clamped into `0..=4`
    pub fn new(level: i64) -> Self {
        DiffLevel(level.clamp(0, 4) as u8)
    }

    /// Parse a level name or integer
    ///
    /// Anything unrecognised means [`DiffLevel::INSTANCE`].
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "sys" => Self::SYSTEM,
            "app" => Self::APPLICATION,
            "pid" => Self::INSTANCE,
            "sec" => Self::CLASS,
            "obj" => Self::OBJECT,
            other => parse_integer(other).map(Self::new).unwrap_or(Self::INSTANCE),
        }
    }

    /// Level named by the secondary extension of an output path
    ///
    /// `diff.obj.csv` → `obj`; no secondary extension means the default.
    pub fn from_output_path(path: &Path) -> Self {
        let secondary = path
            .file_stem()
            .map(Path::new)
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::parse(secondary)
    }

    pub fn value(self) -> usize {
        self.0 as usize
    }

    pub fn includes_application(self) -> bool {
        self.0 >= 1
    }

    pub fn includes_instance(self) -> bool {
        self.0 >= 2
    }

    pub fn includes_class(self) -> bool {
        self.0 >= 3
    }

    pub fn includes_path(self) -> bool {
        self.0 >= 4
    }

    /// Titles of the key columns enabled at this level
    pub fn column_titles(self) -> &'static [&'static str] {
        &COLUMN_TITLES[..self.value()]
    }
}

impl Default for DiffLevel {
    fn default() -> Self {
        Self::INSTANCE
    }
}

/// Integer in decimal or `0x` hex, sign allowed
fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}
