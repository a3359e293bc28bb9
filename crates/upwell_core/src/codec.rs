//! Archive encoding of a bundle.
//!
//! A bundle is stored as a ZIP container with uncompressed entries: one
//! `<draft id>.draft` entry per draft plus the ledger under
//! [`METADATA_KEY`]. Drafts that are archived (and not the root) are kept as
//! raw bytes when loading and written back byte-for-byte unless they were
//! edited in the meantime.

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};

use futures_lite::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use indexmap::IndexMap;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::author::Author;
use crate::crdt::MetadataDoc;
use crate::draft::Draft;
use crate::error::{Result, UpwellError};
use crate::upwell::{DraftSlot, Upwell};

/// File extension of draft entries.
pub const DRAFT_EXT: &str = "draft";

/// Entry name of the metadata ledger.
pub const METADATA_KEY: &str = "metadata.yrs";

fn malformed(reason: impl std::fmt::Display) -> UpwellError {
    UpwellError::MalformedArchive(reason.to_string())
}

fn write_error(e: zip::result::ZipError) -> UpwellError {
    UpwellError::Io(std::io::Error::other(e.to_string()))
}

impl Upwell {
    /// Encode the bundle as an archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let started = chrono::Utc::now();
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for (id, slot) in &self.drafts {
            let bytes = slot.encode();
            zip.start_file(format!("{}.{}", id, DRAFT_EXT), options)
                .map_err(write_error)?;
            zip.write_all(&bytes)?;
        }

        zip.start_file(METADATA_KEY, options).map_err(write_error)?;
        zip.write_all(&self.metadata.save())?;

        let bytes = zip.finish().map_err(write_error)?.into_inner();
        log::debug!(
            "serialized {} ({} drafts, {} bytes) in {}ms",
            self.id(),
            self.drafts.len(),
            bytes.len(),
            (chrono::Utc::now() - started).num_milliseconds()
        );
        Ok(bytes)
    }

    /// Decode an archive produced by [`Upwell::to_bytes`], acting as `author`.
    ///
    /// Nothing is returned unless the whole archive is consistent: every
    /// entry is a known draft or the ledger, no draft appears twice, and every
    /// draft the ledger names is present.
    pub fn from_bytes(bytes: &[u8], author: Author) -> Result<Upwell> {
        let started = chrono::Utc::now();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(malformed)?;

        let metadata = {
            let mut entry = archive
                .by_name(METADATA_KEY)
                .map_err(|_| malformed(format!("missing {}", METADATA_KEY)))?;
            let mut state = Vec::new();
            entry.read_to_end(&mut state)?;
            MetadataDoc::load(&state).map_err(|e| malformed(format!("ledger: {}", e)))?
        };
        let root_id = metadata
            .root_id()
            .ok_or_else(|| malformed("ledger has no root draft"))?;

        let mut drafts: IndexMap<String, DraftSlot> = IndexMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(malformed)?;
            let name = entry.name().to_string();
            if name == METADATA_KEY {
                continue;
            }
            let id = name
                .strip_suffix(DRAFT_EXT)
                .and_then(|stem| stem.strip_suffix('.'))
                .filter(|id| !id.is_empty())
                .ok_or_else(|| malformed(format!("unexpected entry '{}'", name)))?
                .to_string();
            if drafts.contains_key(&id) {
                return Err(malformed(format!("duplicate draft '{}'", id)));
            }
            if !metadata.has_draft(&id) {
                return Err(malformed(format!("draft '{}' is not in the ledger", id)));
            }

            let mut state = Vec::new();
            entry.read_to_end(&mut state)?;
            let slot = if id != root_id && metadata.is_archived(&id) {
                DraftSlot::raw(state)
            } else {
                let draft = Draft::load(&id, &state)
                    .map_err(|e| malformed(format!("draft '{}': {}", id, e)))?;
                DraftSlot::Hydrated(draft)
            };
            drafts.insert(id, slot);
        }

        let present: HashSet<&str> = drafts.keys().map(String::as_str).collect();
        if let Some(missing) = metadata
            .draft_ids()
            .into_iter()
            .find(|id| !present.contains(id.as_str()))
        {
            return Err(malformed(format!("draft '{}' is missing", missing)));
        }
        if !present.contains(root_id.as_str()) {
            return Err(malformed(format!("root draft '{}' is missing", root_id)));
        }

        let mut upwell = Upwell::new(metadata, author);
        upwell.drafts = drafts;
        log::debug!(
            "deserialized {} ({} drafts, {} bytes) in {}ms",
            upwell.id(),
            upwell.drafts.len(),
            bytes.len(),
            (chrono::Utc::now() - started).num_milliseconds()
        );
        Ok(upwell)
    }

    /// Write the archive to `writer`.
    pub async fn serialize<W>(&self, mut writer: W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read a whole archive from `reader` and decode it, acting as `author`.
    pub async fn deserialize<R>(mut reader: R, author: Author) -> Result<Upwell>
    where
        R: AsyncRead + Unpin,
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Upwell::from_bytes(&bytes, author)
    }
}
