//! Structured-output extraction from free-form model text
//!
//! Language models wrap the JSON they were asked for in prose, code fences,
//! or commentary. The scanner here lifts the first balanced object out of
//! the surrounding text; validation afterwards is all-or-nothing, so a
//! caller either gets the complete shape or a typed failure.

use crate::models::{CategorySet, MarketingKit};
use crate::{Error, Result};

/// Locate the first balanced `{...}` span in `text`.
///
/// Brace depth is tracked with string-literal and escape awareness, so
/// braces inside string values cannot mis-bound the span. Returns `None`
/// when no opening brace exists or the object never closes.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a nine-field category set out of raw model output.
pub fn parse_categories(raw: &str) -> Result<CategorySet> {
    let span = first_json_object(raw)
        .ok_or_else(|| Error::LlmFailed("no JSON object found in model output".to_string()))?;

    serde_json::from_str(span)
        .map_err(|e| Error::LlmFailed(format!("category JSON did not match expected shape: {}", e)))
}

/// Parse and validate a marketing kit out of raw model output.
///
/// The kit is rejected wholesale when any field is missing, a count floor
/// is unmet, or a text field is blank. The only mutation applied is
/// deterministic: hashtags missing their `#` prefix get one.
pub fn parse_marketing_kit(raw: &str) -> Result<MarketingKit> {
    let span = first_json_object(raw)
        .ok_or_else(|| Error::LlmFailed("no JSON object found in model output".to_string()))?;

    let mut kit: MarketingKit = serde_json::from_str(span)
        .map_err(|e| Error::LlmFailed(format!("kit JSON did not match expected shape: {}", e)))?;

    validate_kit(&kit)?;

    for tag in &mut kit.hashtags {
        if !tag.starts_with('#') {
            tag.insert(0, '#');
        }
    }

    Ok(kit)
}

fn validate_kit(kit: &MarketingKit) -> Result<()> {
    if kit.tagline.trim().is_empty() {
        return Err(Error::LlmFailed("kit tagline is empty".to_string()));
    }
    if kit.bullets.len() < 3 {
        return Err(Error::LlmFailed(format!(
            "kit has {} bullets, minimum is 3",
            kit.bullets.len()
        )));
    }
    if kit.hashtags.len() < 6 {
        return Err(Error::LlmFailed(format!(
            "kit has {} hashtags, minimum is 6",
            kit.hashtags.len()
        )));
    }
    if kit.hashtags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(Error::LlmFailed("kit contains a blank hashtag".to_string()));
    }
    if kit.captions.ig.trim().is_empty() || kit.captions.tt.trim().is_empty() {
        return Err(Error::LlmFailed("kit caption is empty".to_string()));
    }
    if kit.alt_text.trim().is_empty() {
        return Err(Error::LlmFailed("kit altText is empty".to_string()));
    }
    Ok(())
}
