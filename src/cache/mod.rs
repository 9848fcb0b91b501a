// src/cache/mod.rs

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder as CsvReaderBuilder, WriterBuilder as CsvWriterBuilder},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::{RecordBatch, RecordBatchReader},
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    errors::ParquetError,
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::schema::{housing_schema, HousingTable, SchemaError};

const BATCH_SIZE: usize = 8_192;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("unsupported cache file format: {0:?}")]
    UnsupportedFormat(PathBuf),

    #[error("cache I/O on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("cache schema: {0}")]
    Schema(#[from] SchemaError),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// On-disk encodings of the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFormat {
    /// Snappy-compressed Parquet.
    Parquet,
    /// Comma-delimited text with a header row.
    Csv,
}

impl CacheFormat {
    /// Pick a format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Some(CacheFormat::Parquet),
            "csv" => Some(CacheFormat::Csv),
            _ => None,
        }
    }
}

/// Write `table` to `path`. Empty tables are skipped so a good cache is
/// never replaced by nothing. Unknown extensions are written as CSV.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.num_rows()))]
pub fn save(table: &HousingTable, path: &Path) -> Result<(), CacheError> {
    if table.is_empty() {
        debug!("empty table; cache left untouched");
        return Ok(());
    }

    let format = CacheFormat::from_path(path).unwrap_or_else(|| {
        warn!("unrecognized cache extension; writing CSV");
        CacheFormat::Csv
    });

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    // write aside, then rename over the target
    let tmp = tmp_path(path);
    let written = File::create(&tmp)
        .map_err(io_err(&tmp))
        .and_then(|file| match format {
            CacheFormat::Parquet => write_parquet(file, table.batch()),
            CacheFormat::Csv => write_csv(file, table.batch(), &tmp),
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(io_err(path))?;

    info!(?format, "cache saved");
    Ok(())
}

/// Read the table at `path`.
///
/// A missing file is not an error: it is logged and `Ok(None)` returned.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Option<HousingTable>, CacheError> {
    if !path.exists() {
        warn!("no cache file found");
        return Ok(None);
    }
    let format =
        CacheFormat::from_path(path).ok_or_else(|| CacheError::UnsupportedFormat(path.into()))?;

    let batch = match format {
        CacheFormat::Parquet => read_parquet(path)?,
        CacheFormat::Csv => read_csv(path)?,
    };
    let table = HousingTable::try_new(batch)?;
    info!(?format, rows = table.num_rows(), "cache loaded");
    Ok(Some(table))
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "cache".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_parquet(file: File, batch: &RecordBatch) -> Result<(), CacheError> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn write_csv(file: File, batch: &RecordBatch, path: &Path) -> Result<(), CacheError> {
    let mut writer = CsvWriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch)?;
    writer.into_inner().flush().map_err(io_err(path))?;
    Ok(())
}

fn read_parquet(path: &Path) -> Result<RecordBatch, CacheError> {
    let file = File::open(path).map_err(io_err(path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(BATCH_SIZE)
        .build()?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, ArrowError>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// CSV columns are matched by header name: known columns get their
/// cleaned-table type, anything else is read as text and dropped later.
fn read_csv(path: &Path) -> Result<RecordBatch, CacheError> {
    let file = File::open(path).map_err(io_err(path))?;
    let (header, _) = Format::default()
        .with_header(true)
        .infer_schema(file, Some(0))?;

    let canonical = housing_schema();
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| match canonical.field_with_name(f.name()) {
            Ok(known) => known.clone().with_nullable(true),
            Err(_) => Field::new(f.name(), DataType::Utf8, true),
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let file = File::open(path).map_err(io_err(path))?;
    let reader = CsvReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)?;
    let batches = reader.collect::<Result<Vec<_>, ArrowError>>()?;
    Ok(concat_batches(&schema, &batches)?)
}
