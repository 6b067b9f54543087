//! Slug generation for client and product identity keys
//!
//! A slug is lowercase ASCII (`a-z`, `0-9`) words joined by single dashes.
//! Latin diacritics are transliterated (`ã` → `a`, `ç` → `c`, `ß` → `ss`),
//! apostrophes are dropped so possessives stay one word, and every other
//! run of whitespace or punctuation collapses into one dash.

use thiserror::Error;

/// Name cannot be turned into a slug
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidNameError {
    #[error("Name must not be empty")]
    Empty,

    #[error("Name '{0}' has no characters usable in a slug")]
    Unrepresentable(String),
}

/// Derive the slug for a display name.
///
/// Pure and deterministic; applying it to its own output is a no-op.
pub fn slugify(name: &str) -> Result<String, InvalidNameError> {
    if name.trim().is_empty() {
        return Err(InvalidNameError::Empty);
    }

    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if is_silent(ch) {
            continue;
        }

        let piece = if ch.is_ascii_alphanumeric() {
            Some(ch.to_string())
        } else {
            transliterate(ch).map(str::to_owned)
        };

        match piece {
            Some(piece) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push_str(&piece);
            }
            None => pending_dash = true,
        }
    }

    if slug.is_empty() {
        return Err(InvalidNameError::Unrepresentable(name.to_string()));
    }
    Ok(slug)
}

/// Characters removed without leaving a separator behind
fn is_silent(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}' | '`' | '´')
        // Combining diacritical marks (decomposed input)
        || ('\u{0300}'..='\u{036F}').contains(&ch)
}

/// ASCII replacement for lowercase Latin letters outside the ASCII range
fn transliterate(ch: char) -> Option<&'static str> {
    let out = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' | 'ª' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ĝ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' | 'º' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' | 'ț' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(out)
}
