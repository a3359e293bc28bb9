//! Shared fixtures for unit tests.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::author::Author;
use crate::upwell::Upwell;

/// A fixed author, so tests can assert on ids and names.
pub fn ada() -> Author {
    Author {
        id: "a1".to_string(),
        name: "Ada".to_string(),
    }
}

/// An independent replica of `upwell`, decoded from its archive as the same
/// author.
pub fn copy_of(upwell: &Upwell) -> Upwell {
    let bytes = upwell.to_bytes().expect("serialize bundle");
    Upwell::from_bytes(&bytes, upwell.author().clone()).expect("deserialize bundle")
}

/// Contents of one archive entry.
pub fn entry_bytes(archive: &[u8], name: &str) -> Vec<u8> {
    let mut archive = ZipArchive::new(Cursor::new(archive)).expect("open archive");
    let mut entry = archive.by_name(name).expect("archive entry");
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).expect("read entry");
    bytes
}

/// Copy of `archive` with the contents of entry `name` swapped for `bytes`.
pub fn with_entry_replaced(archive: &[u8], name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut source = ZipArchive::new(Cursor::new(archive)).expect("open archive");
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..source.len() {
        let mut entry = source.by_index(i).expect("archive entry");
        let entry_name = entry.name().to_string();
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        if entry_name == name {
            contents = bytes.to_vec();
        }
        zip.start_file(entry_name, options).expect("start entry");
        zip.write_all(&contents).expect("write entry");
    }
    zip.finish().expect("finish archive").into_inner()
}
