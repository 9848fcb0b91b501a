/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// 2) Title-case a name: the first letter of every alphabetic run is
/// upper-cased, every other letter lower-cased.
///
/// `"KALLANG/WHAMPOA"` → `"Kallang/Whampoa"`, `" bedok "` → `"Bedok"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.trim().chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// 3) Median of the given values; `None` when there are none.
/// Even-length inputs average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 4) Arithmetic mean of the given values; `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case(" bedok "), "Bedok");
        assert_eq!(title_case("ANG MO KIO"), "Ang Mo Kio");
        assert_eq!(title_case("KALLANG/WHAMPOA"), "Kallang/Whampoa");
        assert_eq!(title_case("Central Area"), "Central Area");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[5100.0, 5000.0]), Some(5050.0));
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
    }

    #[test]
    fn test_median_with_nan_ignores_input_order() {
        let a = median(&[f64::NAN, 1.0, 2.0]);
        let b = median(&[2.0, f64::NAN, 1.0]);
        let c = median(&[1.0, 2.0, f64::NAN]);
        assert_eq!(a, Some(2.0));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_clean_str() {
        assert_eq!(clean_str("  \"2023-01\" "), "2023-01");
        assert_eq!(clean_str("\""), "\"");
    }
}
