// src/process/mod.rs
pub mod convert;
pub mod date_parser;
pub mod raw_table;
pub mod sample;
pub mod utils;

use arrow::{
    array::{ArrayRef, Date32Array, Float64Array, Int32Array, StringArray},
    compute::filter_record_batch,
    datatypes::{Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::{Datelike, Local};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::schema::{housing_schema, HousingTable, SchemaError};

pub use raw_table::{RawRecord, RawTable, RawValue};
pub use sample::sample_raw_table;

#[derive(Debug, Error)]
pub enum CleaningError {
    /// No record carries the column at all.
    #[error("column `{0}` is absent from every record")]
    MissingColumn(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Clean `raw` using the current calendar year for lease arithmetic.
pub fn clean(raw: &RawTable) -> Result<HousingTable, CleaningError> {
    clean_as_of(raw, Local::now().year())
}

/// Turn raw records into the typed, enriched, filtered table.
///
/// Steps run in order, each depending on the ones before it:
/// 1. `month` → date (first of month); unparseable → null, row kept
/// 2. `resale_price`, `floor_area_sqm` → f64, nulls filled with the median
/// 3. `price_per_sqm`
/// 4. `lease_commence_date` → date, `lease_remaining` as of `current_year`
/// 5. `town` trimmed and title-cased
/// 6. outlier rows dropped
///
/// A failure in step 4 only nulls the two lease columns.
#[tracing::instrument(level = "info", skip(raw), fields(records = raw.len()))]
pub fn clean_as_of(raw: &RawTable, current_year: i32) -> Result<HousingTable, CleaningError> {
    if raw.is_empty() {
        warn!("no data to clean");
        return Ok(HousingTable::empty());
    }
    let n = raw.len();

    // 1) month
    let month = convert::parse_months(&raw.column(|r| r.month.as_ref()));
    debug!(
        unparsed = month.iter().filter(|m| m.is_none()).count(),
        "parsed month"
    );

    // 2) numeric columns, median-filled before any filtering
    let mut resale_price = convert::coerce_numeric(&raw.column(|r| r.resale_price.as_ref()));
    let mut floor_area = convert::coerce_numeric(&raw.column(|r| r.floor_area_sqm.as_ref()));
    for (name, col) in [
        ("resale_price", &mut resale_price),
        ("floor_area_sqm", &mut floor_area),
    ] {
        let missing = col.iter().filter(|v| v.is_none()).count();
        match convert::fill_with_median(col) {
            Some(median) => debug!(column = name, missing, median, "converted to numeric"),
            None => warn!(column = name, "no numeric values to take a median from"),
        }
    }

    // 3) price per square metre
    let price_per_sqm = convert::price_per_sqm(&resale_price, &floor_area);

    // 4) lease dates, isolated from the rest of the pipeline
    let (lease_date, lease_remaining) =
        match convert::lease_columns(&raw.column(|r| r.lease_commence_date.as_ref()), current_year)
        {
            Ok(cols) => cols,
            Err(e) => {
                error!(error = %e, "lease date derivation failed; lease_remaining left null");
                (vec![None; n], vec![None; n])
            }
        };

    // 5) categorical clean-up
    let town = convert::normalize_towns(&raw.column(|r| r.town.as_ref()));

    let keep = convert::outlier_mask(&resale_price, &floor_area);

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(month)),
        Arc::new(StringArray::from(town)),
        Arc::new(StringArray::from(convert::text(&raw.column(|r| r.flat_type.as_ref())))),
        Arc::new(StringArray::from(convert::text(&raw.column(|r| r.block.as_ref())))),
        Arc::new(StringArray::from(convert::text(&raw.column(|r| r.street_name.as_ref())))),
        Arc::new(StringArray::from(convert::text(&raw.column(|r| r.storey_range.as_ref())))),
        Arc::new(StringArray::from(convert::text(&raw.column(|r| r.flat_model.as_ref())))),
        Arc::new(Float64Array::from(floor_area)),
        Arc::new(Float64Array::from(resale_price)),
        Arc::new(Float64Array::from(price_per_sqm)),
        Arc::new(Date32Array::from(lease_date)),
        Arc::new(Int32Array::from(lease_remaining)),
    ];
    let staged = RecordBatch::try_new(staging_schema(), columns)?;

    // 6) outliers, last
    let filtered = filter_record_batch(&staged, &keep)?;
    info!(
        kept = filtered.num_rows(),
        removed = n - filtered.num_rows(),
        "data cleaning completed"
    );

    Ok(HousingTable::try_new(filtered)?)
}

/// The cleaned layout with every column nullable, for rows that have not
/// been through the outlier filter yet.
fn staging_schema() -> Arc<Schema> {
    let fields: Vec<Field> = housing_schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_nullable(true))
        .collect();
    Arc::new(Schema::new(fields))
}
