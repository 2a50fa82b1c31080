pub mod builder;
pub mod store;
pub mod symbols;

pub use builder::{IndexBuilder, IndexWarning, IndexedFile, RootIndex};
pub use store::{IndexStore, IndexView, SourceIndex};
pub use symbols::{ClassKind, ClassSymbol, ExposureAnnotation, ExposureFlags, MacroKind};
