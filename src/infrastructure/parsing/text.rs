//! Text helpers shared by the listing and detail parsers

use scraper::{ElementRef, Selector};
use tracing::warn;

use super::{ParsingError, ParsingResult};

/// Compile selector strings, skipping invalid ones.
///
/// Fails only when every selector in a non-empty list is invalid.
pub fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    Ok(compile_named_selectors(selector_strings)?
        .into_iter()
        .map(|(_, selector)| selector)
        .collect())
}

/// Like `compile_selectors`, keeping each selector's source text for diagnostics
pub fn compile_named_selectors(
    selector_strings: &[String],
) -> ParsingResult<Vec<(String, Selector)>> {
    let mut selectors = Vec::with_capacity(selector_strings.len());
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push((selector_str.clone(), selector)),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::InvalidSelector {
            selector: selector_strings.join(", "),
            reason: errors.join("; "),
        });
    }

    Ok(selectors)
}

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

/// First non-empty text found under `element` using the selectors in order
pub fn first_text(element: &ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element
            .select(selector)
            .map(|e| element_text(&e))
            .find(|text| !text.is_empty())
    })
}

/// Elements matched by the first selector that matches anything under `root`
pub fn select_first_matching<'a>(
    root: ElementRef<'a>,
    selectors: &[Selector],
) -> Vec<ElementRef<'a>> {
    for selector in selectors {
        let elements: Vec<_> = root.select(selector).collect();
        if !elements.is_empty() {
            return elements;
        }
    }
    Vec::new()
}

/// Trimmed string, or `None` when blank
pub fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalize a field label into a mapping key.
///
/// `"Date Closed :"` becomes `"date_closed"`; labels with no content become `""`.
pub fn normalize_key(label: &str) -> String {
    let trimmed = label.trim();
    let without_colon = trimmed.strip_suffix(':').unwrap_or(trimmed);
    normalize_ws(without_colon).replace(' ', "_").to_lowercase()
}

/// Reverse the entity encodings used for embedded JSON attributes.
///
/// `&amp;` is decoded last so that `&amp;#34;` yields the literal text `&#34;`.
pub fn decode_entities(s: &str) -> String {
    s.replace("&#34;", "\"")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
