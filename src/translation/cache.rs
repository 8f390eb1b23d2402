/*!
 * Persistent translation cache.
 *
 * A flat source-text → translated-text table backed by a plain text file with
 * one `source|translation` entry per line. The whole file is loaded when the
 * cache is opened and every new entry is appended to it right away, so a run
 * that dies half-way keeps everything translated so far. Entries never expire.
 *
 * The file is meant to be hand-editable; `\`, `|` and line breaks inside a
 * text are written as `\\`, `\|`, `\n` and `\r`. Lines that are not valid
 * UTF-8 are skipped with a warning.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Translation cache for storing and retrieving translations
#[derive(Debug, Default)]
pub struct TranslationCache {
    /// Source text to translation
    entries: HashMap<String, String>,

    /// Backing file; `None` keeps the cache in memory only
    path: Option<PathBuf>,

    /// The backing file does not end with a line break yet
    needs_newline: bool,

    /// Cache hit counter
    hits: usize,

    /// Cache miss counter
    misses: usize,
}

impl TranslationCache {
    /// Create a cache that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`; a missing file gives an empty cache
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut cache = Self {
            path: Some(path.to_path_buf()),
            ..Self::default()
        };

        if !path.exists() {
            debug!("No translation cache at {:?}, starting empty", path);
            return Ok(cache);
        }

        let content = fs::read(path)
            .with_context(|| format!("Failed to read translation cache: {:?}", path))?;
        cache.needs_newline = !content.is_empty() && !content.ends_with(b"\n");

        for (index, raw_line) in content.split(|&b| b == b'\n').enumerate() {
            let Ok(line) = std::str::from_utf8(raw_line) else {
                warn!("Ignoring translation cache line {}: not valid UTF-8", index + 1);
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some((source, translation)) => {
                    cache.entries.insert(source, translation);
                }
                None => warn!("Ignoring unreadable translation cache line {}: {}", index + 1, line),
            }
        }

        debug!("Loaded {} cached translations from {:?}", cache.entries.len(), path);
        Ok(cache)
    }

    /// Get a translation from the cache
    pub fn lookup(&mut self, source_text: &str) -> Option<String> {
        match self.entries.get(source_text) {
            Some(translation) => {
                self.hits += 1;
                debug!("Cache hit for '{}'", truncate_text(source_text, 30));
                Some(translation.clone())
            }
            None => {
                self.misses += 1;
                debug!("Cache miss for '{}'", truncate_text(source_text, 30));
                None
            }
        }
    }

    /// Store a translation and append it to the backing file.
    ///
    /// The entry is kept in memory even when writing the file fails.
    pub fn store(&mut self, source_text: &str, translation: &str) -> Result<()> {
        if self.entries.get(source_text).map(String::as_str) == Some(translation) {
            return Ok(());
        }
        self.entries.insert(source_text.to_string(), translation.to_string());

        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open translation cache: {:?}", path))?;

        if self.needs_newline {
            writeln!(file)?;
            self.needs_newline = false;
        }
        writeln!(file, "{}|{}", escape(source_text), escape(translation))
            .with_context(|| format!("Failed to write translation cache: {:?}", path))?;
        file.flush()?;

        debug!("Cached translation for '{}'", truncate_text(source_text, 30));
        Ok(())
    }

    /// Get cache statistics: hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        (self.hits, self.misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Split a cache line at its first unescaped `|`
fn parse_line(line: &str) -> Option<(String, String)> {
    let mut source = String::new();
    let mut translation = String::new();
    let mut seen_separator = false;
    let mut chars = line.trim_end_matches('\r').chars();

    while let Some(c) = chars.next() {
        let target = if seen_separator { &mut translation } else { &mut source };
        match c {
            '\\' => match chars.next() {
                Some('n') => target.push('\n'),
                Some('r') => target.push('\r'),
                Some(other) => target.push(other),
                None => target.push('\\'),
            },
            '|' if !seen_separator => seen_separator = true,
            _ => target.push(c),
        }
    }

    if seen_separator && !source.is_empty() {
        Some((source, translation))
    } else {
        None
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
