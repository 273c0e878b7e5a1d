//! JSON snapshot writer.
//!
//! The snapshot is one object keyed by SKU, indented with four spaces,
//! UTF-8 with non-ASCII text left as-is. Each export replaces the previous
//! file; there is no atomic rename or backup.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use metro_core::Catalog;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::ScraperError;

const INDENT: &[u8] = b"    ";

/// Renders `catalog` exactly as [`export`] writes it.
///
/// # Errors
///
/// Returns [`ScraperError::Serialize`] if serialization fails.
pub fn to_json_string(catalog: &Catalog) -> Result<String, ScraperError> {
    let mut buf = Vec::new();
    write_pretty(catalog, &mut buf)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes `catalog` to `path`, truncating any existing file.
///
/// # Errors
///
/// Returns [`ScraperError::Export`] if the file cannot be created, written
/// or flushed, or [`ScraperError::Serialize`] if serialization fails.
pub fn export(catalog: &Catalog, path: &Path) -> Result<(), ScraperError> {
    let file = File::create(path).map_err(|source| ScraperError::Export {
        path: path.to_path_buf(),
        source,
    })?;
    write_to(catalog, BufWriter::new(file), path)?;

    tracing::info!(path = %path.display(), products = catalog.len(), "snapshot written");
    Ok(())
}

/// Serializes into `writer`; write failures are reported against `path`.
fn write_to<W: Write>(catalog: &Catalog, mut writer: W, path: &Path) -> Result<(), ScraperError> {
    let io_err = |source: std::io::Error| ScraperError::Export {
        path: path.to_path_buf(),
        source,
    };

    write_pretty(catalog, &mut writer).map_err(|e| {
        if e.is_io() {
            io_err(e.into())
        } else {
            ScraperError::Serialize(e)
        }
    })?;
    writer.flush().map_err(io_err)
}

fn write_pretty<W: Write>(catalog: &Catalog, writer: W) -> Result<(), serde_json::Error> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    catalog.serialize(&mut serializer)
}
