use crate::process::raw_table::{RawRecord, RawTable, RawValue};

/// Two synthetic transactions used when neither the API nor the cache can
/// provide real data.
pub fn sample_raw_table() -> RawTable {
    let row = |month: &str, town: &str, price: f64, area: f64, flat_type: &str, lease: f64| {
        RawRecord {
            month: Some(RawValue::from(month)),
            town: Some(RawValue::from(town)),
            flat_type: Some(RawValue::from(flat_type)),
            resale_price: Some(RawValue::from(price)),
            floor_area_sqm: Some(RawValue::from(area)),
            lease_commence_date: Some(RawValue::from(lease)),
            ..RawRecord::default()
        }
    };

    RawTable::new(vec![
        row("2023-01", "Ang Mo Kio", 400000.0, 80.0, "4 ROOM", 1985.0),
        row("2023-02", "Bedok", 420000.0, 85.0, "5 ROOM", 1990.0),
    ])
}
