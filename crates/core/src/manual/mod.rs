//! Field manual ingestion: text fixups, the line parser and the versioned
//! catalog library.

pub mod fixes;
pub mod library;
pub mod parser;

pub use fixes::{apply_fixups, default_fixups, Fixup};
pub use library::ManualLibrary;
pub use parser::{parse_manual, ManualParser, UNKNOWN_VERSION};
