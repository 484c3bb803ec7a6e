//! Human-readable identifiers derived from display names.

use crate::shared::constants::IDENTIFIER_MAX;
use crate::shared::validation::CODE_REGEX;

const SEPARATOR: char = '-';

/// ASCII replacement for common accented Latin letters (input is lowercase)
fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Turn free text into a lowercase, hyphen-separated slug.
///
/// Returns an empty string when the input has no letters or digits.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let piece = if c.is_ascii_alphanumeric() {
            Some(c.encode_utf8(&mut [0; 4]).to_string())
        } else {
            fold(c).map(str::to_string)
        };

        match piece {
            Some(piece) => {
                if pending_separator && !slug.is_empty() {
                    slug.push(SEPARATOR);
                }
                pending_separator = false;
                slug.push_str(&piece);
            }
            None => pending_separator = true,
        }
    }

    truncate(&slug, IDENTIFIER_MAX).to_string()
}

/// Whether `value` has the shape of a stored identifier
pub fn is_identifier(value: &str) -> bool {
    value.len() <= IDENTIFIER_MAX && CODE_REGEX.is_match(value)
}

/// Cut an ASCII slug to `max` bytes without leaving a dangling separator.
fn truncate(slug: &str, max: usize) -> &str {
    let end = slug.len().min(max);
    slug[..end].trim_end_matches(SEPARATOR)
}

/// Candidate identifiers for `base`, in the order they should be tried:
/// `base`, `base-1`, `base-2`, ... Each candidate fits the identifier column.
pub fn identifier_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(truncate(base, IDENTIFIER_MAX).to_string()).chain((1u32..).map(
        move |n| {
            let suffix = format!("{}{}", SEPARATOR, n);
            let stem = truncate(base, IDENTIFIER_MAX - suffix.len());
            format!("{}{}", stem, suffix)
        },
    ))
}
