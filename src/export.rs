use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Fixed header row, in the column order the whole pipeline preserves.
pub const HEADER: [&str; 4] = ["Rep Firm Name", "Brand Carried", "Product Covered", "Space"];

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

/// One categorized line-sheet entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub rep_firm_name: String,
    pub brand: String,
    pub product: String,
    pub space_category: String,
}

/// Write rows as a single CSV sheet: header first, then one record per row in
/// input order. An existing file at the target path is overwritten. Returns
/// the final path written (the canonical extension is appended when the path
/// has none).
pub fn write_rows(rows: &[CatalogRow], path: &Path) -> Result<PathBuf, WriteError> {
    let path = with_spreadsheet_extension(path);
    let file = File::create(&path).map_err(|source| WriteError::Create {
        path: path.clone(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(HEADER).map_err(|source| WriteError::Write {
        path: path.clone(),
        source,
    })?;
    for row in rows {
        writer
            .write_record([&row.rep_firm_name, &row.brand, &row.product, &row.space_category])
            .map_err(|source| WriteError::Write {
                path: path.clone(),
                source,
            })?;
    }
    writer.flush().map_err(|source| WriteError::Write {
        path: path.clone(),
        source: source.into(),
    })?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Append the canonical spreadsheet extension when the target has none.
fn with_spreadsheet_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("csv")
    }
}
