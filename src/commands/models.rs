use crate::diff::DiffLevel;
use crate::utils::config::{
    ANALYZE_EXTENSION, APPVALS_EXTENSION, FLATTEN_EXTENSION, NORMALIZE_EXTENSION,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Processing mode selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Re-render cleaned captures in capture syntax
    Flatten,
    /// One CSV row per region
    Normalize,
    /// Aggregation engine, JSON report
    Analyze,
    /// Per-application value table
    Appvals,
    /// Compare captures against each other
    Diff,
}

impl Mode {
    /// Extension of derived output paths; diff output is always forced
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Mode::Flatten => Some(FLATTEN_EXTENSION),
            Mode::Normalize => Some(NORMALIZE_EXTENSION),
            Mode::Analyze => Some(ANALYZE_EXTENSION),
            Mode::Appvals => Some(APPVALS_EXTENSION),
            Mode::Diff => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Flatten => "flatten",
            Mode::Normalize => "normalize",
            Mode::Analyze => "analyze",
            Mode::Appvals => "appvals",
            Mode::Diff => "diff",
        };
        f.write_str(name)
    }
}

/// Arguments shared by every mode
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct FilterArgs {
    pub mode: Mode,

    /// Capture files, in the order given
    pub inputs: Vec<PathBuf>,

    /// Forced output path
    pub output: Option<PathBuf>,

    /// Diff level; taken from the output path when absent
    pub level: Option<DiffLevel>,

    /// Diff trim level
    pub trim: DiffLevel,

    /// Print the system table to stdout (analyze)
    pub print_summary: bool,
}

impl Default for FilterArgs {
    fn default() -> Self {
        Self {
            mode: Mode::Analyze,
            inputs: Vec::new(),
            output: None,
            level: None,
            trim: DiffLevel::SYSTEM,
            print_summary: false,
        }
    }
}

impl FilterArgs {
    /// Output path for one input of a per-file mode
    ///
    /// A forced path wins; otherwise the input's extension is replaced
    /// with the mode's.
    pub fn output_for(&self, input: &Path) -> PathBuf {
        match (&self.output, self.mode.extension()) {
            (Some(forced), _) => forced.clone(),
            (None, Some(extension)) => input.with_extension(extension),
            (None, None) => input.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_for_replaces_extension() {
        let args = FilterArgs {
            mode: Mode::Flatten,
            ..Default::default()
        };
        assert_eq!(
            args.output_for(Path::new("caps/boot.cap")),
            PathBuf::from("caps/boot.flat")
        );
        assert_eq!(args.output_for(Path::new("boot")), PathBuf::from("boot.flat"));
    }

    #[test]
    fn test_output_for_forced() {
        let args = FilterArgs {
            mode: Mode::Appvals,
            output: Some(PathBuf::from("out.txt")),
            ..Default::default()
        };
        assert_eq!(args.output_for(Path::new("a.cap")), PathBuf::from("out.txt"));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(Mode::Normalize.to_string(), "normalize");
        assert_eq!(Mode::Normalize.extension(), Some("csv"));
        assert_eq!(Mode::Diff.extension(), None);
    }
}
