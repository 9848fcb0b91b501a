use serde::{Deserialize, Serialize};

use crate::process::utils::clean_str;

/// A single field value as the remote source sent it.
///
/// The source is not consistent about types: prices arrive as strings on
/// one page and numbers on the next, and anything else (bools, nested
/// objects) is kept as `Other` so it can be reported as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    /// Textual form with whitespace and outer quotes stripped. Blank text
    /// is treated as missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(clean_str(s)).filter(|s| !s.is_empty()),
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Other(_) => None,
        }
    }

    /// Finite numeric value, if the field holds one.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => clean_str(s).parse::<f64>().ok()?,
            RawValue::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

/// One resale transaction before cleaning. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub month: Option<RawValue>,
    pub town: Option<RawValue>,
    pub flat_type: Option<RawValue>,
    pub block: Option<RawValue>,
    pub street_name: Option<RawValue>,
    pub storey_range: Option<RawValue>,
    pub flat_model: Option<RawValue>,
    pub floor_area_sqm: Option<RawValue>,
    pub resale_price: Option<RawValue>,
    pub lease_commence_date: Option<RawValue>,
}

/// The records of one load, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pull one optional field out of every record.
    pub(crate) fn column<'a, F>(&'a self, field: F) -> Vec<Option<&'a RawValue>>
    where
        F: Fn(&'a RawRecord) -> Option<&'a RawValue>,
    {
        self.records.iter().map(field).collect()
    }
}

impl From<Vec<RawRecord>> for RawTable {
    fn from(records: Vec<RawRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mixed_types() {
        let json = r#"{
            "_id": 7,
            "month": "2017-01",
            "town": "ANG MO KIO",
            "resale_price": 232000,
            "floor_area_sqm": "44",
            "lease_commence_date": null,
            "remaining_lease": "61 years 04 months",
            "flat_model": true
        }"#;
        let rec: RawRecord = serde_json::from_str(json).unwrap();

        assert_eq!(rec.month, Some(RawValue::Text("2017-01".into())));
        assert_eq!(rec.resale_price, Some(RawValue::Number(232000.0)));
        assert_eq!(rec.floor_area_sqm.as_ref().and_then(RawValue::as_f64), Some(44.0));
        assert_eq!(rec.lease_commence_date, None);
        assert!(rec.flat_type.is_none());
        assert!(matches!(rec.flat_model, Some(RawValue::Other(_))));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(RawValue::from(" 400000 ").as_f64(), Some(400000.0));
        assert_eq!(RawValue::from("bad").as_f64(), None);
        assert_eq!(RawValue::from("NaN").as_f64(), None);
        assert_eq!(RawValue::from(f64::INFINITY).as_f64(), None);
        assert_eq!(RawValue::Other(serde_json::Value::Bool(true)).as_f64(), None);
    }

    #[test]
    fn test_text_of_numbers() {
        assert_eq!(RawValue::from(1985.0).as_text().as_deref(), Some("1985"));
        assert_eq!(RawValue::from(67.5).as_text().as_deref(), Some("67.5"));
        assert_eq!(RawValue::from("\"BEDOK\"").as_text().as_deref(), Some("BEDOK"));
    }

    #[test]
    fn test_blank_text_is_missing() {
        assert_eq!(RawValue::from("").as_text(), None);
        assert_eq!(RawValue::from("   ").as_text(), None);
        assert_eq!(RawValue::from(" \"\" ").as_text(), None);
    }
}
