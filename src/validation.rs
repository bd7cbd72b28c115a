use crate::error::AppError;

pub const MIN_ACRES: f64 = 1.0;
pub const MAX_ACRES: f64 = 100.0;

pub const CROPS: [&str; 8] = [
    "Paddy",
    "Wheat",
    "Mango",
    "Chilli",
    "Cotton",
    "Maize",
    "Sugarcane",
    "Banana",
];

/// Crop recorded for bookings taken over the phone line.
pub const PHONE_BOOKING_CROP: &str = "Mixed/General";

pub fn acres(value: f64) -> Result<f64, AppError> {
    if value.is_finite() && (MIN_ACRES..=MAX_ACRES).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Validation(format!(
            "land area must be between {MIN_ACRES} and {MAX_ACRES} acres, got {value}"
        )))
    }
}

pub fn pincode(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.len() == 6 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::Validation(format!(
            "pincode must be 6 digits, got {raw:?}"
        )))
    }
}

/// Keeps the last ten digits, dropping country codes and separators.
pub fn phone(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 10 {
        return Err(AppError::Validation(format!(
            "phone must contain 10 digits, got {raw:?}"
        )));
    }
    Ok(digits[digits.len() - 10..].to_string())
}

pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn crop(value: &str) -> Result<String, AppError> {
    let crop = required("crop", value)?;
    Ok(CROPS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(&crop))
        .map_or(crop, |known| known.to_string()))
}

pub fn villages(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub fn pincodes(values: Vec<String>) -> Result<Vec<String>, AppError> {
    values.iter().map(|raw| pincode(raw)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acreage_bounds_are_inclusive() {
        assert!(acres(1.0).is_ok());
        assert!(acres(100.0).is_ok());
        assert!(acres(0.5).is_err());
        assert!(acres(100.5).is_err());
        assert!(acres(f64::NAN).is_err());
    }

    #[test]
    fn pincode_must_be_six_digits() {
        assert_eq!(pincode(" 641108 ").unwrap(), "641108");
        assert!(pincode("64110").is_err());
        assert!(pincode("64110a").is_err());
        assert!(pincode("6411080").is_err());
    }

    #[test]
    fn phone_keeps_last_ten_digits() {
        assert_eq!(phone("+91 98765-43210").unwrap(), "9876543210");
        assert_eq!(phone("9876543210").unwrap(), "9876543210");
        assert!(phone("12345").is_err());
    }

    #[test]
    fn known_crops_are_canonicalised() {
        assert_eq!(crop("paddy").unwrap(), "Paddy");
        assert_eq!(crop(PHONE_BOOKING_CROP).unwrap(), "Mixed/General");
        assert!(crop("   ").is_err());
    }

    #[test]
    fn blank_villages_are_dropped() {
        let cleaned = villages(vec![" Anaikatti ".to_string(), "".to_string()]);
        assert_eq!(cleaned, vec!["Anaikatti"]);
    }
}
