pub mod cpp;
pub mod pattern;
pub mod walker;

pub use cpp::{parse_bytes, parse_source, ParseError, ParsedFile};
pub use pattern::FilePattern;
pub use walker::{FileWalker, SkippedFile, WalkOutcome};
