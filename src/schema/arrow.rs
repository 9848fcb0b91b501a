// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, SchemaRef};
use once_cell::sync::Lazy;
use std::sync::Arc;

pub const MONTH: &str = "month";
pub const TOWN: &str = "town";
pub const FLAT_TYPE: &str = "flat_type";
pub const BLOCK: &str = "block";
pub const STREET_NAME: &str = "street_name";
pub const STOREY_RANGE: &str = "storey_range";
pub const FLAT_MODEL: &str = "flat_model";
pub const FLOOR_AREA_SQM: &str = "floor_area_sqm";
pub const RESALE_PRICE: &str = "resale_price";
pub const PRICE_PER_SQM: &str = "price_per_sqm";
pub const LEASE_COMMENCE_DATE: &str = "lease_commence_date";
pub const LEASE_REMAINING: &str = "lease_remaining";

/// Column names of the cleaned table, in order.
pub const COLUMN_NAMES: &[&str] = &[
    MONTH,
    TOWN,
    FLAT_TYPE,
    BLOCK,
    STREET_NAME,
    STOREY_RANGE,
    FLAT_MODEL,
    FLOOR_AREA_SQM,
    RESALE_PRICE,
    PRICE_PER_SQM,
    LEASE_COMMENCE_DATE,
    LEASE_REMAINING,
];

/// Layout of the cleaned table:
///
/// - month, lease_commence_date → Date32 (days since epoch)
/// - categorical columns        → Utf8
/// - price and area columns     → Float64, never null after cleaning
/// - lease_remaining            → Int32 (years)
static HOUSING_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(ArrowSchema::new(vec![
        ArrowField::new(MONTH, DataType::Date32, true),
        ArrowField::new(TOWN, DataType::Utf8, true),
        ArrowField::new(FLAT_TYPE, DataType::Utf8, true),
        ArrowField::new(BLOCK, DataType::Utf8, true),
        ArrowField::new(STREET_NAME, DataType::Utf8, true),
        ArrowField::new(STOREY_RANGE, DataType::Utf8, true),
        ArrowField::new(FLAT_MODEL, DataType::Utf8, true),
        ArrowField::new(FLOOR_AREA_SQM, DataType::Float64, false),
        ArrowField::new(RESALE_PRICE, DataType::Float64, false),
        ArrowField::new(PRICE_PER_SQM, DataType::Float64, false),
        ArrowField::new(LEASE_COMMENCE_DATE, DataType::Date32, true),
        ArrowField::new(LEASE_REMAINING, DataType::Int32, true),
    ]))
});

/// Shared Arrow schema of the cleaned table.
pub fn housing_schema() -> SchemaRef {
    HOUSING_SCHEMA.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_layout() {
        let schema = housing_schema();
        assert_eq!(schema.fields().len(), COLUMN_NAMES.len());
        for (field, name) in schema.fields().iter().zip(COLUMN_NAMES) {
            assert_eq!(field.name(), name);
        }
        assert_eq!(schema.index_of(MONTH).unwrap(), 0);
        let price = schema.field_with_name(RESALE_PRICE).unwrap();
        assert_eq!(price.data_type(), &DataType::Float64);
        assert!(!price.is_nullable());
        assert!(schema.field_with_name(LEASE_REMAINING).unwrap().is_nullable());
    }
}
