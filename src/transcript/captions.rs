//! Parser for YouTube's timedtext caption payload.
//!
//! The payload is a flat XML document:
//!
//! ```xml
//! <transcript>
//!   <text start="0.5" dur="2.1">Hello &amp;amp; welcome</text>
//! </transcript>
//! ```
//!
//! Text content is entity-encoded twice (XML, then HTML) and may carry inline
//! `<font>`/`<i>` markup, which is dropped.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{CaptionEntry, FetchError};

static TEXT_ELEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap());

static ATTRIBUTE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*"([^"]*)""#).unwrap());

static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static ENTITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").unwrap());

/// Parse a timedtext document into caption entries, in document order.
///
/// Elements without text are skipped. A missing `dur` attribute means zero.
pub fn parse_timedtext(payload: &str) -> Result<Vec<CaptionEntry>, FetchError> {
    if !payload.contains("<transcript") && !payload.contains("<timedtext") {
        return Err(FetchError::InvalidResponse(
            "caption payload is not a timedtext document".to_string(),
        ));
    }

    let mut entries = Vec::new();

    for element in TEXT_ELEMENT_REGEX.captures_iter(payload) {
        let Some(raw_text) = element.get(2).map(|m| m.as_str()) else {
            continue;
        };

        let text = decode_entities(&MARKUP_TAG_REGEX.replace_all(&decode_entities(raw_text), ""));
        if text.is_empty() {
            continue;
        }

        let attributes = element.get(1).map(|m| m.as_str()).unwrap_or_default();
        let start = numeric_attribute(attributes, "start")?.ok_or_else(|| {
            FetchError::InvalidResponse("caption element without a start time".to_string())
        })?;
        let duration = numeric_attribute(attributes, "dur")?.unwrap_or(0.0);

        entries.push(CaptionEntry::new(text, start, duration));
    }

    tracing::debug!("Parsed {} caption entries", entries.len());
    Ok(entries)
}

fn numeric_attribute(attributes: &str, name: &str) -> Result<Option<f64>, FetchError> {
    let Some(value) = ATTRIBUTE_REGEX
        .captures_iter(attributes)
        .find(|attr| &attr[1] == name)
        .map(|attr| attr[2].to_string())
    else {
        return Ok(None);
    };

    let parsed: f64 = value.trim().parse().map_err(|_| {
        FetchError::InvalidResponse(format!("invalid {name} attribute: {value:?}"))
    })?;

    if !parsed.is_finite() || parsed < 0.0 {
        return Err(FetchError::InvalidResponse(format!(
            "invalid {name} attribute: {value:?}"
        )));
    }

    Ok(Some(parsed))
}

/// Decode named and numeric character references. Unknown names are left untouched.
pub fn decode_entities(s: &str) -> String {
    ENTITY_REGEX
        .replace_all(s, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };

            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        _ => return None,
    };
    Some(c)
}
