//! Roster containers: plain `.ros` XML or zipped `.rosz` archives.

use std::{
    fs,
    io::{Cursor, Read},
    path::Path,
};

use tracing::debug;

use crate::error::{Result, RosterError};

use super::{node::Element, reader::parse_xml};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Read a roster container from disk and return its XML payload.
pub fn read_container(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    decode_container(bytes)
}

/// Turn raw container bytes into the roster XML, unzipping when needed.
pub fn decode_container(bytes: Vec<u8>) -> Result<String> {
    if bytes.starts_with(ZIP_MAGIC) {
        return read_zipped_roster(&bytes);
    }
    Ok(String::from_utf8(bytes)?)
}

/// Load and parse a roster file into its element tree.
pub fn load_document(path: impl AsRef<Path>) -> Result<Element> {
    let xml = read_container(path)?;
    parse_xml(&xml)
}

fn read_zipped_roster(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if !is_root_roster_entry(file.name()) {
            continue;
        }
        debug!("using archive entry {}", file.name());
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        return Ok(xml);
    }
    Err(RosterError::EmptyArchive)
}

fn is_root_roster_entry(name: &str) -> bool {
    !name.contains('/') && name.ends_with(".ros")
}
