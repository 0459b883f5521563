//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a color is a CSS hex color (`#RGB` or `#RRGGBB`).
///
/// # Examples
///
/// ```ignore
/// validate_hex_color("#FF5733") // Ok
/// validate_hex_color("#f57")    // Ok
/// validate_hex_color("FF5733")  // Err - missing '#'
/// ```
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let Some(digits) = color.strip_prefix('#') else {
        let mut err = ValidationError::new("color_prefix");
        err.message = Some("Color must start with '#'".into());
        return Err(err);
    };

    if digits.len() != 3 && digits.len() != 6 {
        let mut err = ValidationError::new("color_length");
        err.message = Some(
            format!(
                "Color must have 3 or 6 hexadecimal digits (got {})",
                digits.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("color_format");
        err.message = Some("Color must contain only hexadecimal digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that every entry of a name list is non-blank.
pub fn validate_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|name| name.trim().is_empty()) {
        let mut err = ValidationError::new("blank_name");
        err.message = Some("Names must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hex_color_valid() {
        assert!(validate_hex_color("#FF5733").is_ok());
        assert!(validate_hex_color("#33a1ff").is_ok());
        assert!(validate_hex_color("#fff").is_ok());
    }

    #[test]
    fn test_validate_hex_color_invalid() {
        assert!(validate_hex_color("FF5733").is_err()); // no prefix
        assert!(validate_hex_color("#FF573").is_err()); // 5 digits
        assert!(validate_hex_color("#GG5733").is_err()); // not hex
        assert!(validate_hex_color("").is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_names(&["Ann".into(), "Bob".into()]).is_ok());
        assert!(validate_names(&[]).is_ok());
        assert!(validate_names(&["Ann".into(), "  ".into()]).is_err());
    }
}
