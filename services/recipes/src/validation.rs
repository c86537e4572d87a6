//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{FormValue, RecipeFields, RecipeInput};

pub const TITLE_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const PREP_TIME_MAX: i64 = 1440;
pub const RATING_MAX: f64 = 5.0;
pub const IMG_URL_MAX_LEN: usize = 2048;

/// Validate a full recipe payload, returning the first failure
pub fn validate_recipe(input: &RecipeInput) -> Result<RecipeFields, String> {
    let title = validate_text("title", input.title.as_deref(), TITLE_MAX_LEN)?;
    let description = validate_text(
        "description",
        input.description.as_deref(),
        DESCRIPTION_MAX_LEN,
    )?;
    let prep_time = validate_prep_time(input.prep_time.as_ref())?;
    let rating = validate_rating(input.rating.as_ref())?;
    let img_url = validate_img_url(input.img_url.as_deref())?;

    Ok(RecipeFields {
        title,
        description,
        prep_time,
        rating,
        img_url,
    })
}

/// Validate a required text field
pub fn validate_text(field: &str, value: Option<&str>, max_len: usize) -> Result<String, String> {
    let value = value
        .map(str::trim)
        .ok_or_else(|| format!("\"{}\" is required", field))?;

    if value.is_empty() {
        return Err(format!("\"{}\" is not allowed to be empty", field));
    }

    if value.chars().count() > max_len {
        return Err(format!(
            "\"{}\" must be at most {} characters long",
            field, max_len
        ));
    }

    Ok(value.to_string())
}

/// Validate preparation time in minutes
pub fn validate_prep_time(value: Option<&FormValue>) -> Result<i32, String> {
    let minutes = match value.ok_or("\"prep_time\" is required")? {
        FormValue::Number(n) => match n.as_i64() {
            Some(minutes) => minutes,
            None => return Err("\"prep_time\" must be a whole number of minutes".to_string()),
        },
        FormValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "\"prep_time\" must be a whole number of minutes".to_string())?,
    };

    if minutes < 1 {
        return Err("\"prep_time\" must be at least 1 minute".to_string());
    }

    if minutes > PREP_TIME_MAX {
        return Err(format!(
            "\"prep_time\" must be at most {} minutes",
            PREP_TIME_MAX
        ));
    }

    Ok(minutes as i32)
}

/// Validate a rating between 0 and 5 inclusive
pub fn validate_rating(value: Option<&FormValue>) -> Result<f64, String> {
    let rating = match value.ok_or("\"rating\" is required")? {
        FormValue::Number(n) => n.as_f64(),
        FormValue::Text(s) => s.trim().parse::<f64>().ok(),
    }
    .filter(|r| r.is_finite())
    .ok_or("\"rating\" must be a number")?;

    if !(0.0..=RATING_MAX).contains(&rating) {
        return Err(format!(
            "\"rating\" must be between 0 and {}",
            RATING_MAX
        ));
    }

    Ok(rating)
}

/// Validate an optional external image URL; blank means absent
pub fn validate_img_url(value: Option<&str>) -> Result<Option<String>, String> {
    let url = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(url) => url,
    };

    if url.len() > IMG_URL_MAX_LEN {
        return Err(format!(
            "\"img_url\" must be at most {} characters long",
            IMG_URL_MAX_LEN
        ));
    }

    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX
        .get_or_init(|| Regex::new(r"^https?://\S+$").expect("Failed to compile URL regex"));

    if !regex.is_match(url) {
        return Err("\"img_url\" must be an http or https URL".to_string());
    }

    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(raw: &str) -> FormValue {
        FormValue::Number(serde_json::from_str(raw).unwrap())
    }

    fn text(raw: &str) -> FormValue {
        FormValue::Text(raw.to_string())
    }

    fn soup() -> RecipeInput {
        RecipeInput {
            title: Some("Soup".into()),
            description: Some("Hot soup".into()),
            prep_time: Some(number("10")),
            rating: Some(number("4")),
            img_url: None,
        }
    }

    #[test]
    fn test_valid_recipe() {
        let fields = validate_recipe(&soup()).unwrap();
        assert_eq!(fields.title, "Soup");
        assert_eq!(fields.description, "Hot soup");
        assert_eq!(fields.prep_time, 10);
        assert_eq!(fields.rating, 4.0);
        assert_eq!(fields.img_url, None);
    }

    #[test]
    fn test_form_strings_are_parsed() {
        let input = RecipeInput {
            prep_time: Some(text(" 25 ")),
            rating: Some(text("3.5")),
            ..soup()
        };

        let fields = validate_recipe(&input).unwrap();
        assert_eq!(fields.prep_time, 25);
        assert_eq!(fields.rating, 3.5);
    }

    #[test]
    fn test_missing_fields() {
        let err = validate_recipe(&RecipeInput::default()).unwrap_err();
        assert_eq!(err, "\"title\" is required");

        let input = RecipeInput {
            rating: None,
            ..soup()
        };
        assert_eq!(validate_recipe(&input).unwrap_err(), "\"rating\" is required");
    }

    #[test]
    fn test_text_bounds() {
        assert!(validate_text("title", Some("   "), TITLE_MAX_LEN).is_err());
        assert!(validate_text("title", Some(&"a".repeat(TITLE_MAX_LEN)), TITLE_MAX_LEN).is_ok());
        assert!(
            validate_text("title", Some(&"a".repeat(TITLE_MAX_LEN + 1)), TITLE_MAX_LEN).is_err()
        );
        assert_eq!(
            validate_text("title", Some("  Stew "), TITLE_MAX_LEN).unwrap(),
            "Stew"
        );
    }

    #[test]
    fn test_prep_time_bounds() {
        assert!(validate_prep_time(Some(&number("0"))).is_err());
        assert!(validate_prep_time(Some(&number("-5"))).is_err());
        assert!(validate_prep_time(Some(&number("1441"))).is_err());
        assert!(validate_prep_time(Some(&number("12.5"))).is_err());
        assert!(validate_prep_time(Some(&text("ten"))).is_err());
        assert_eq!(validate_prep_time(Some(&number("1"))), Ok(1));
        assert_eq!(validate_prep_time(Some(&number("1440"))), Ok(1440));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(Some(&number("-0.1"))).is_err());
        assert!(validate_rating(Some(&number("5.01"))).is_err());
        assert!(validate_rating(Some(&text("NaN"))).is_err());
        assert!(validate_rating(Some(&text("inf"))).is_err());
        assert_eq!(validate_rating(Some(&number("0"))), Ok(0.0));
        assert_eq!(validate_rating(Some(&number("5"))), Ok(5.0));
    }

    #[test]
    fn test_img_url() {
        assert_eq!(validate_img_url(None), Ok(None));
        assert_eq!(validate_img_url(Some("")), Ok(None));
        assert_eq!(
            validate_img_url(Some("https://example.com/soup.png")),
            Ok(Some("https://example.com/soup.png".to_string()))
        );
        assert!(validate_img_url(Some("ftp://example.com/soup.png")).is_err());
        assert!(validate_img_url(Some("images/soup.png")).is_err());
    }
}
