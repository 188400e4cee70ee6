//! Roster documents: container decoding, XML reading and file discovery.

/// Plain and zipped roster containers.
pub mod container;
/// Roster file discovery on disk.
pub mod discover;
mod node;
mod reader;

pub use container::{decode_container, load_document, read_container};
pub use discover::{discover_rosters, expand_inputs};
pub use node::{Element, Located};
pub use reader::parse_xml;
