use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Deserializer};

/// Convert DMS (Degrees:Minutes:Seconds) format to decimal degrees
///
/// # Examples
/// ```
/// use cattle_climate::utils::dms_to_decimal;
///
/// let decimal = dms_to_decimal("10:30:15").unwrap();
/// assert!((decimal - 10.504167).abs() < 0.000001);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let parts: Vec<&str> = dms.split(':').collect();

    if parts.len() != 3 {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Invalid DMS format: '{}'. Expected format: 'DD:MM:SS'",
            dms
        )));
    }

    // The sign may only be carried by the degrees part ("-0:07:39")
    let is_negative = dms.starts_with('-');

    let degrees = parts[0].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid degrees value: '{}'", parts[0]))
    })?;

    let minutes = parts[1].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid minutes value: '{}'", parts[1]))
    })?;

    let seconds = parts[2].parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid seconds value: '{}'", parts[2]))
    })?;

    if !(0.0..60.0).contains(&minutes) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Minutes must be between 0 and 60, got: {}",
            minutes
        )));
    }

    if !(0.0..60.0).contains(&seconds) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Seconds must be between 0 and 60, got: {}",
            seconds
        )));
    }

    let decimal_value = degrees.abs() + minutes / 60.0 + seconds / 3600.0;

    if is_negative {
        Ok(-decimal_value)
    } else {
        Ok(decimal_value)
    }
}

/// Parse coordinate that might be in DMS or decimal format.
/// Spreadsheet exports with a comma decimal separator ("-74,2") are accepted.
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();

    if !trimmed.contains(':') {
        trimmed.replace(',', ".").parse::<f64>().map_err(|_| {
            ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
        })
    } else {
        dms_to_decimal(trimmed)
    }
}

/// Serde adapter for optional coordinate columns: empty or unparsable cells become `None`.
pub fn deserialize_optional_coordinate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| parse_coordinate(&s).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_to_decimal() {
        assert!((dms_to_decimal("10:30:15").unwrap() - 10.504167).abs() < 0.000001);

        // -74:07:39 = -(74 + 7/60 + 39/3600)
        let result = dms_to_decimal("-74:07:39").unwrap();
        assert!((result - -74.1275).abs() < 0.0001);
    }

    #[test]
    fn test_invalid_dms_format() {
        assert!(dms_to_decimal("50:30").is_err());
        assert!(dms_to_decimal("50:70:15").is_err()); // Invalid minutes
        assert!(dms_to_decimal("50:30:70").is_err()); // Invalid seconds
    }

    #[test]
    fn test_parse_coordinate() {
        assert!((parse_coordinate("11.2408").unwrap() - 11.2408).abs() < 0.000001);
        assert!((parse_coordinate(" -74,1990 ").unwrap() - -74.199).abs() < 0.000001);
        assert!((parse_coordinate("10:30:15").unwrap() - 10.504167).abs() < 0.000001);
        assert!(parse_coordinate("north").is_err());
    }
}
