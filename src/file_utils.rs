use anyhow::{Context, Result};
use encoding_rs::GB18030;
use log::{debug, warn};
use std::fs;
use std::path::Path;

// @module: File and directory utilities

/// UTF-8 byte order mark, common in exports opened in spreadsheet tools
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encoding a statement was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    /// GBK and its superset GB18030, used by older Alipay exports
    Gb18030,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a statement export and decode it to text.
    ///
    /// UTF-8 is tried first; anything else is decoded as GB18030.
    pub fn read_statement<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read statement file: {:?}", path))?;

        let (text, encoding) = Self::decode_statement(&bytes);
        debug!("Decoded {:?} as {:?} ({} bytes)", path, encoding, bytes.len());
        Ok(text)
    }

    /// Decode raw export bytes, stripping a leading byte order mark
    pub fn decode_statement(bytes: &[u8]) -> (String, SourceEncoding) {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        if let Ok(text) = std::str::from_utf8(bytes) {
            return (text.to_string(), SourceEncoding::Utf8);
        }

        let (text, _, had_errors) = GB18030.decode(bytes);
        if had_errors {
            warn!("Statement is neither valid UTF-8 nor GB18030; undecodable bytes were replaced");
        }
        (text.into_owned(), SourceEncoding::Gb18030)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
