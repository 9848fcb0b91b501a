use crate::process::raw_table::RawValue;
use crate::process::{date_parser, utils, CleaningError};
use crate::schema::arrow::LEASE_COMMENCE_DATE;
use arrow::array::BooleanArray;
use tracing::debug;

/// Leases in this market run for 99 years from commencement.
pub const LEASE_YEARS: i32 = 99;
/// Transactions at or below this price are treated as data-entry noise.
pub const MIN_RESALE_PRICE: f64 = 10_000.0;
/// Flats at or below this floor area are treated as data-entry noise.
pub const MIN_FLOOR_AREA_SQM: f64 = 20.0;

/// Month text → Date32 (first of the month); unparseable → null.
pub fn parse_months(values: &[Option<&RawValue>]) -> Vec<Option<i32>> {
    values
        .iter()
        .map(|v| {
            v.and_then(RawValue::as_text)
                .and_then(|s| date_parser::parse_month(&s))
                .map(date_parser::to_date32)
        })
        .collect()
}

/// Coerce to f64; anything non-numeric or non-finite becomes null.
pub fn coerce_numeric(values: &[Option<&RawValue>]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.and_then(RawValue::as_f64)).collect()
}

/// Replace nulls with the median of the non-null entries, returning the
/// median used. A column with no valid entries is left untouched.
pub fn fill_with_median(col: &mut [Option<f64>]) -> Option<f64> {
    let valid: Vec<f64> = col.iter().flatten().copied().collect();
    let median = utils::median(&valid)?;
    for v in col.iter_mut().filter(|v| v.is_none()) {
        *v = Some(median);
    }
    Some(median)
}

/// `resale_price / floor_area_sqm`, row by row.
///
/// A zero floor area is not guarded against and yields an infinite (or NaN)
/// ratio; the outlier filter removes those rows afterwards.
pub fn price_per_sqm(price: &[Option<f64>], area: &[Option<f64>]) -> Vec<Option<f64>> {
    price
        .iter()
        .zip(area)
        .map(|(p, a)| Some((*p)? / (*a)?))
        .collect()
}

/// Lease commencement (Date32) and remaining lease in years, as of
/// `current_year`. Fails when no record carries a lease date at all.
pub fn lease_columns(
    values: &[Option<&RawValue>],
    current_year: i32,
) -> Result<(Vec<Option<i32>>, Vec<Option<i32>>), CleaningError> {
    if values.iter().all(Option::is_none) {
        return Err(CleaningError::MissingColumn(LEASE_COMMENCE_DATE.to_string()));
    }

    let dates: Vec<_> = values
        .iter()
        .map(|v| v.and_then(date_parser::parse_year_date))
        .collect();
    let unparsed = dates
        .iter()
        .zip(values)
        .filter(|(d, v)| d.is_none() && v.is_some())
        .count();
    if unparsed > 0 {
        debug!(unparsed, "lease dates coerced to null");
    }

    let remaining = dates
        .iter()
        .map(|d| {
            d.map(|d| {
                use chrono::Datelike;
                LEASE_YEARS - (current_year - d.year())
            })
        })
        .collect();
    let dates = dates
        .into_iter()
        .map(|d| d.map(date_parser::to_date32))
        .collect();
    Ok((dates, remaining))
}

/// Trimmed, title-cased town names.
pub fn normalize_towns(values: &[Option<&RawValue>]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| v.and_then(RawValue::as_text).map(|s| utils::title_case(&s)))
        .collect()
}

/// Descriptive columns are carried through as trimmed text.
pub fn text(values: &[Option<&RawValue>]) -> Vec<Option<String>> {
    values.iter().map(|v| v.and_then(RawValue::as_text)).collect()
}

/// Rows to keep: price above [`MIN_RESALE_PRICE`] and area above
/// [`MIN_FLOOR_AREA_SQM`]. Null values never pass.
pub fn outlier_mask(price: &[Option<f64>], area: &[Option<f64>]) -> BooleanArray {
    price
        .iter()
        .zip(area)
        .map(|(p, a)| {
            let keep = matches!((p, a), (Some(p), Some(a)) if *p > MIN_RESALE_PRICE && *a > MIN_FLOOR_AREA_SQM);
            Some(keep)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn vals(raw: &[Option<RawValue>]) -> Vec<Option<&RawValue>> {
        raw.iter().map(Option::as_ref).collect()
    }

    #[test]
    fn test_median_fill_uses_valid_values_only() {
        let raw = vec![
            Some(RawValue::from("400000")),
            Some(RawValue::from("bad")),
            Some(RawValue::from(500000.0)),
            None,
        ];
        let mut col = coerce_numeric(&vals(&raw));
        assert_eq!(col, vec![Some(400000.0), None, Some(500000.0), None]);

        let median = fill_with_median(&mut col);
        assert_eq!(median, Some(450000.0));
        assert_eq!(col, vec![Some(400000.0), Some(450000.0), Some(500000.0), Some(450000.0)]);
    }

    #[test]
    fn test_median_fill_all_invalid_leaves_nulls() {
        let raw = vec![Some(RawValue::from("x")), None];
        let mut col = coerce_numeric(&vals(&raw));
        assert_eq!(fill_with_median(&mut col), None);
        assert_eq!(col, vec![None, None]);
    }

    #[test]
    fn test_zero_area_ratio_is_unguarded() {
        let ratio = price_per_sqm(&[Some(400000.0), Some(0.0)], &[Some(0.0), Some(0.0)]);
        assert_eq!(ratio[0], Some(f64::INFINITY));
        assert!(ratio[1].unwrap().is_nan());

        // both rows are then removed by the area threshold
        let mask = outlier_mask(&[Some(400000.0), Some(0.0)], &[Some(0.0), Some(0.0)]);
        assert_eq!(mask.true_count(), 0);
    }

    #[test]
    fn test_outlier_mask_boundaries() {
        let price = [Some(10000.0), Some(10000.01), Some(500000.0), None];
        let area = [Some(80.0), Some(80.0), Some(20.0), Some(80.0)];
        let mask = outlier_mask(&price, &area);
        assert_eq!(mask.len(), 4);
        assert!(!mask.value(0));
        assert!(mask.value(1));
        assert!(!mask.value(2));
        assert!(!mask.value(3));
    }

    #[test]
    fn test_lease_columns() {
        let raw = vec![
            Some(RawValue::from(1985.0)),
            Some(RawValue::from("1990")),
            Some(RawValue::from("n/a")),
            None,
        ];
        let (dates, remaining) = lease_columns(&vals(&raw), 2024).unwrap();
        assert_eq!(remaining, vec![Some(60), Some(65), None, None]);
        assert!(dates[0].is_some() && dates[1].is_some());
        assert_eq!(dates[2], None);
    }

    #[test]
    fn test_lease_columns_missing_everywhere() {
        let raw: Vec<Option<RawValue>> = vec![None, None];
        let err = lease_columns(&vals(&raw), 2024).unwrap_err();
        assert!(matches!(err, CleaningError::MissingColumn(c) if c == LEASE_COMMENCE_DATE));
    }

    #[test]
    fn test_normalize_towns() {
        let raw = vec![Some(RawValue::from(" bedok ")), Some(RawValue::from("ANG MO KIO")), None];
        assert_eq!(
            normalize_towns(&vals(&raw)),
            vec![Some("Bedok".to_string()), Some("Ang Mo Kio".to_string()), None]
        );
    }

    #[test]
    fn test_blank_text_becomes_null() {
        let raw = vec![Some(RawValue::from("   ")), Some(RawValue::from("")), Some(RawValue::from("12A"))];
        assert_eq!(normalize_towns(&vals(&raw)), vec![None, None, Some("12A".to_string())]);
        assert_eq!(text(&vals(&raw)), vec![None, None, Some("12A".to_string())]);
    }
}
