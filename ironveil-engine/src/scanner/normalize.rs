//! Input canonicalization
//!
//! Attackers hide signatures inside encoding layers the matcher would
//! otherwise miss. Every input is brought to a canonical form before any
//! analysis: Unicode NFKC, HTML/XML entity decoding, bounded repeated
//! percent-decoding, then homoglyph folding and invisible-character
//! stripping.

use percent_encoding::percent_decode_str;
use unicode_normalization::UnicodeNormalization;

/// Upper bound on percent-decode rounds for multiply-encoded input
const MAX_DECODE_ROUNDS: usize = 5;

/// Canonicalize `text` for analysis. Pure function.
pub fn normalize(text: &str) -> String {
    // NFKC also folds full-width digits and mathematical alphanumerics
    let canonical: String = text.nfkc().collect();
    let decoded = html_escape::decode_html_entities(&canonical);
    let decoded = percent_decode_bounded(&decoded);
    decoded
        .chars()
        .filter(|ch| !is_invisible(*ch))
        .map(fold_homoglyph)
        .collect()
}

/// Percent-decode until a fixed point, at most `MAX_DECODE_ROUNDS` times.
fn percent_decode_bounded(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let next = percent_decode_str(&current).decode_utf8_lossy().into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Map common Cyrillic and Greek lookalikes to their ASCII equivalents.
fn fold_homoglyph(ch: char) -> char {
    match ch {
        // Cyrillic lowercase
        '\u{0430}' => 'a',
        '\u{0435}' => 'e',
        '\u{043E}' => 'o',
        '\u{0440}' => 'p',
        '\u{0441}' => 'c',
        '\u{0443}' => 'y',
        '\u{0445}' => 'x',
        '\u{0456}' => 'i',
        '\u{0455}' => 's',
        '\u{0458}' => 'j',
        // Cyrillic uppercase
        '\u{0410}' => 'A',
        '\u{0412}' => 'B',
        '\u{0415}' => 'E',
        '\u{041A}' => 'K',
        '\u{041C}' => 'M',
        '\u{041D}' => 'H',
        '\u{041E}' => 'O',
        '\u{0420}' => 'P',
        '\u{0421}' => 'C',
        '\u{0422}' => 'T',
        '\u{0425}' => 'X',
        // Greek
        '\u{03B1}' => 'a',
        '\u{03B5}' => 'e',
        '\u{03B9}' => 'i',
        '\u{03BF}' => 'o',
        '\u{03C1}' => 'p',
        '\u{03C5}' => 'u',
        '\u{039F}' => 'O',
        '\u{0391}' => 'A',
        '\u{0395}' => 'E',
        _ => ch,
    }
}

/// Invisible and zero-width characters, including BiDi controls.
fn is_invisible(ch: char) -> bool {
    matches!(ch,
        '\u{200B}' | // Zero-width space
        '\u{200C}' | // Zero-width non-joiner
        '\u{200D}' | // Zero-width joiner
        '\u{FEFF}' | // Zero-width no-break space
        '\u{2060}' | // Word joiner
        '\u{180E}' | // Mongolian vowel separator
        '\u{00AD}' | // Soft hyphen
        '\u{034F}' | // Combining grapheme joiner
        '\u{061C}' | // Arabic letter mark
        '\u{202A}'..='\u{202E}' | // BiDi embeddings and overrides
        '\u{2066}'..='\u{2069}'   // BiDi isolates
    )
}
