//! Language utilities for translation target codes
//!
//! Targets are ISO 639-1 (2-letter) or ISO 639-2/3 (3-letter) codes,
//! optionally followed by a region subtag as in `zh-TW`.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their ISO 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"), ("ger", "deu"), ("dut", "nld"), ("gre", "ell"),
    ("chi", "zho"), ("cze", "ces"), ("ice", "isl"), ("alb", "sqi"),
    ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("per", "fas"),
    ("geo", "kat"), ("may", "msa"), ("mac", "mkd"), ("rum", "ron"),
    ("slo", "slk"), ("wel", "cym"),
];

/// Split `zh-tw` / `zh_TW` into the primary code and an optional region
fn split_code(code: &str) -> (String, Option<String>) {
    let code = code.trim();
    match code.split_once(['-', '_']) {
        Some((primary, region)) => (primary.to_lowercase(), Some(region.to_uppercase())),
        None => (code.to_lowercase(), None),
    }
}

fn lookup(primary: &str) -> Option<Language> {
    match primary.len() {
        2 => Language::from_639_1(primary),
        3 => {
            let terminology = BIBLIOGRAPHIC_CODES.iter()
                .find(|(bibliographic, _)| *bibliographic == primary)
                .map_or(primary, |(_, terminology)| *terminology);
            Language::from_639_3(terminology)
        }
        _ => None,
    }
}

/// Validate a target language code
pub fn validate_language_code(code: &str) -> Result<()> {
    let (primary, region) = split_code(code);
    if let Some(region) = &region {
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("Invalid region in language code: {}", code));
        }
    }
    lookup(&primary)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize to the form the translation API expects: the 2-letter code
/// where one exists, keeping any region (`ZH-tw` becomes `zh-TW`)
pub fn normalize_target_language(code: &str) -> Result<String> {
    validate_language_code(code)?;
    let (primary, region) = split_code(code);
    let language = lookup(&primary)
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    let base = language.to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| language.to_639_3().to_string());

    Ok(match region {
        Some(region) => format!("{}-{}", base, region),
        None => base,
    })
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (primary, _) = split_code(code);
    let language = lookup(&primary)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(language.to_name().to_string())
}
