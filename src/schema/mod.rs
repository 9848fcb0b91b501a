pub mod arrow;

use ::arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Float64Array, Int32Array, StringArray,
};
use ::arrow::datatypes::{DataType, Date32Type, Float64Type, Int32Type};
use ::arrow::error::ArrowError;
use ::arrow::record_batch::RecordBatch;
use thiserror::Error;

pub use self::arrow::{housing_schema, COLUMN_NAMES};
use self::arrow::*;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("column `{column}` has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

/// The cleaned, enriched resale table.
///
/// Always carries exactly the columns of [`housing_schema`], in that order.
/// Nothing hands out mutable access to the batch, so a table can be shared
/// freely between readers once built.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingTable {
    batch: RecordBatch,
}

impl HousingTable {
    /// Reconcile `batch` to the canonical layout by column name. Extra
    /// columns are dropped; missing or mistyped ones are an error.
    pub fn try_new(batch: RecordBatch) -> Result<Self, SchemaError> {
        let schema = housing_schema();
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let idx = batch
                .schema()
                .index_of(field.name())
                .map_err(|_| SchemaError::MissingColumn(field.name().clone()))?;
            let col = batch.column(idx);
            if col.data_type() != field.data_type() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().clone(),
                    expected: field.data_type().clone(),
                    found: col.data_type().clone(),
                });
            }
            columns.push(col.clone());
        }
        let batch = RecordBatch::try_new(schema, columns)?;
        Ok(Self { batch })
    }

    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(housing_schema()),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Typed views of every column.
    pub fn columns(&self) -> Columns<'_> {
        let b = &self.batch;
        // layout is fixed by `try_new`, so the positional downcasts hold
        Columns {
            month: b.column(0).as_primitive::<Date32Type>(),
            town: b.column(1).as_string::<i32>(),
            flat_type: b.column(2).as_string::<i32>(),
            block: b.column(3).as_string::<i32>(),
            street_name: b.column(4).as_string::<i32>(),
            storey_range: b.column(5).as_string::<i32>(),
            flat_model: b.column(6).as_string::<i32>(),
            floor_area_sqm: b.column(7).as_primitive::<Float64Type>(),
            resale_price: b.column(8).as_primitive::<Float64Type>(),
            price_per_sqm: b.column(9).as_primitive::<Float64Type>(),
            lease_commence_date: b.column(10).as_primitive::<Date32Type>(),
            lease_remaining: b.column(11).as_primitive::<Int32Type>(),
        }
    }
}

impl Default for HousingTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<RecordBatch> for HousingTable {
    type Error = SchemaError;

    fn try_from(batch: RecordBatch) -> Result<Self, Self::Error> {
        Self::try_new(batch)
    }
}

pub struct Columns<'a> {
    pub month: &'a Date32Array,
    pub town: &'a StringArray,
    pub flat_type: &'a StringArray,
    pub block: &'a StringArray,
    pub street_name: &'a StringArray,
    pub storey_range: &'a StringArray,
    pub flat_model: &'a StringArray,
    pub floor_area_sqm: &'a Float64Array,
    pub resale_price: &'a Float64Array,
    pub price_per_sqm: &'a Float64Array,
    pub lease_commence_date: &'a Date32Array,
    pub lease_remaining: &'a Int32Array,
}

impl Columns<'_> {
    pub fn town_at(&self, row: usize) -> Option<&str> {
        (!self.town.is_null(row)).then(|| self.town.value(row))
    }

    pub fn flat_type_at(&self, row: usize) -> Option<&str> {
        (!self.flat_type.is_null(row)).then(|| self.flat_type.value(row))
    }

    pub fn month_at(&self, row: usize) -> Option<i32> {
        (!self.month.is_null(row)).then(|| self.month.value(row))
    }

    pub fn lease_remaining_at(&self, row: usize) -> Option<i32> {
        (!self.lease_remaining.is_null(row)).then(|| self.lease_remaining.value(row))
    }
}
