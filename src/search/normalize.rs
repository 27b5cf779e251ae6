//! Query normalization.
//!
//! Raw user queries go through a fixed, ordered sequence of pure text
//! transforms before they reach the query builder:
//!
//! 1. **Lowercasing** of every term except the boolean operators
//!    (`AND`, `OR`, `NOT`, `XOR`) and all-capital acronyms such as `REM`
//! 2. **Legacy remaps** - `type:1` → `type:person`, `artype:` → `type:`,
//!    leading zeros dropped from barcodes and label codes
//! 3. **Boost stripping** - `love^2` → `love`
//! 4. **Acronym collapsing** - `R.E.M.` → `REM`, while `end.` is kept
//! 5. **Apostrophe stripping** - `don't` → `dont`
//! 6. **UUID undashing** - `a1b2c3d4-e5f6-...` → `a1b2c3d4e5f6...`
//! 7. **Accent folding** - `Beyoncé` → `beyonce`
//! 8. **Ideograph spacing** - `東京事変live` → `東京事変 live`
//!
//! The order matters: boosts are removed after remapping so `type:1^2`
//! still remaps, acronyms collapse before apostrophes disappear so
//! `R.E.M.'s` becomes `rems`, and folding runs last among the character
//! rewrites so every earlier step sees the original letters.
//!
//! A removal late in the sequence can expose text an earlier step rewrites
//! (`type^2:1`, `a.'b.`, `type:'1`), so the whole sequence repeats until the
//! text stops changing. The result is idempotent: feeding it back in returns
//! it unchanged. Term and acronym boundaries treat ideographs as separators so
//! the spacing inserted by the final step settles in one pass.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use super::descriptor::EntityDescriptor;
use super::error::QueryError;

/// Boolean operators that keep their case.
pub const OPERATORS: [&str; 4] = ["AND", "OR", "NOT", "XOR"];

static FIELD_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)([a-z]+):").expect("valid prefix regex"));

static FIELD_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)([a-z]+):([0-9]+)(?-u:\b)").expect("valid ordinal regex"));

static FIELD_LEADING_ZEROS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)([a-z]+):0+([0-9])").expect("valid zeros regex"));

static BOOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^[0-9]+(?:\.[0-9]+)?").expect("valid boost regex"));

static DASHED_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}(?-u:\b)",
    )
    .expect("valid uuid regex")
});

/// Validate and normalize a raw query for `descriptor`'s entity type.
pub fn normalize(raw: &[u8], descriptor: &EntityDescriptor) -> Result<String, QueryError> {
    let text = std::str::from_utf8(raw).map_err(|_| QueryError::InvalidUtf8)?;
    if text.trim().is_empty() {
        return Err(QueryError::Empty);
    }
    Ok(normalize_text(text, descriptor))
}

/// Upper bound on pipeline passes. Each pass that changes the text removes
/// at least one layer of interleaved boost/apostrophe/dot noise.
const MAX_PASSES: usize = 64;

/// The transform pipeline without input validation.
pub fn normalize_text(text: &str, descriptor: &EntityDescriptor) -> String {
    let mut current = single_pass(text, descriptor);
    for _ in 1..MAX_PASSES {
        let next = single_pass(&current, descriptor);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn single_pass(text: &str, descriptor: &EntityDescriptor) -> String {
    let q = lowercase_terms(text);
    let q = remap_legacy(&q, descriptor);
    let q = strip_boosts(&q);
    let q = collapse_acronyms(&q);
    let q = strip_apostrophes(&q);
    let q = undash_uuids(&q);
    let q = fold_accents(&q);
    separate_ideographs(&q)
}

/// Index-side counterpart of the pipeline, applied to stored text before
/// tokenization so that indexed terms and normalized query terms agree.
/// Case and accents are left to the index analyzer.
pub fn index_form(text: &str) -> String {
    let mut current = index_pass(text);
    for _ in 1..MAX_PASSES {
        let next = index_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn index_pass(text: &str) -> String {
    let q = collapse_acronyms(text);
    let q = strip_apostrophes(&q);
    let q = undash_uuids(&q);
    separate_ideographs(&q)
}

/// Whether `c` belongs to a script written without spaces between words.
pub fn is_ideograph(c: char) -> bool {
    matches!(c,
        '\u{3005}'                      // iteration mark
        | '\u{3040}'..='\u{30FF}'       // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}'       // CJK extension A
        | '\u{4E00}'..='\u{9FFF}'       // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}'       // CJK compatibility ideographs
        | '\u{20000}'..='\u{2FFFF}'     // CJK extensions B and later
    )
}

fn is_plain_word_char(c: char) -> bool {
    c.is_alphanumeric() && !is_ideograph(c)
}

fn lowercase_terms(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segment = String::new();
    let mut segment_ideo = false;
    for c in text.chars() {
        let boundary = c.is_whitespace() || is_ideograph(c) != segment_ideo;
        if boundary && !segment.is_empty() {
            out.push_str(&lower_term(&segment));
            segment.clear();
        }
        if c.is_whitespace() {
            out.push(c);
        } else {
            segment_ideo = is_ideograph(c);
            segment.push(c);
        }
    }
    out.push_str(&lower_term(&segment));
    out
}

fn lower_term(term: &str) -> Cow<'_, str> {
    if OPERATORS.contains(&term) || is_acronym(term) {
        Cow::Borrowed(term)
    } else {
        Cow::Owned(term.to_lowercase())
    }
}

/// `REM`, `R.E.M.`, `ÆON`: at least two letters, all capitals, nothing but dots in between.
fn is_acronym(term: &str) -> bool {
    let mut letters = 0;
    for c in term.chars() {
        if c.is_uppercase() {
            letters += 1;
        } else if c != '.' {
            return false;
        }
    }
    letters >= 2
}

fn remap_legacy(text: &str, descriptor: &EntityDescriptor) -> String {
    let renamed = FIELD_PREFIX.replace_all(text, |caps: &Captures| {
        let prefix = &caps[1];
        let target = descriptor
            .prefix_aliases
            .iter()
            .find(|(alias, _)| *alias == prefix)
            .map_or(prefix, |(_, target)| *target);
        format!("{target}:")
    });

    let remapped = FIELD_ORDINAL.replace_all(&renamed, |caps: &Captures| {
        let field = &caps[1];
        let Some(remap) = descriptor.remaps.iter().find(|r| r.field == field) else {
            return caps[0].to_string();
        };
        match caps[2].parse::<u32>().ok().and_then(|n| remap.lookup(n)) {
            Some(name) if name.contains(' ') => format!("{field}:\"{name}\""),
            Some(name) => format!("{field}:{name}"),
            None => String::new(),
        }
    });

    FIELD_LEADING_ZEROS
        .replace_all(&remapped, |caps: &Captures| {
            let field = &caps[1];
            if descriptor.strip_leading_zeros.contains(&field) {
                format!("{field}:{}", &caps[2])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn strip_boosts(text: &str) -> String {
    BOOST.replace_all(text, "").into_owned()
}

fn collapse_acronyms(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let starts_word = i == 0 || !is_plain_word_char(chars[i - 1]);
        if starts_word {
            let mut j = i;
            while j + 1 < chars.len() && is_acronym_letter(chars[j]) && chars[j + 1] == '.' {
                j += 2;
            }
            if (j - i) / 2 >= 2 {
                out.extend(chars[i..j].iter().step_by(2));
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn is_acronym_letter(c: char) -> bool {
    c.is_alphabetic() && !is_ideograph(c)
}

fn strip_apostrophes(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{02BC}'))
        .collect()
}

fn undash_uuids(text: &str) -> String {
    DASHED_UUID
        .replace_all(text, |caps: &Captures| caps[0].replace('-', ""))
        .into_owned()
}

fn fold_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ß' => out.push_str("ss"),
            'ẞ' => out.push_str("SS"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("TH"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'đ' | 'ð' => out.push('d'),
            'Đ' | 'Ð' => out.push('D'),
            'ı' => out.push('i'),
            '\u{0300}'..='\u{036F}' => {}
            '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}' => {
                out.extend(
                    std::iter::once(c)
                        .nfd()
                        .filter(|d| !matches!(d, '\u{0300}'..='\u{036F}')),
                );
            }
            _ => out.push(c),
        }
    }
    out
}

fn separate_ideographs(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            let entering = is_ideograph(c) && !is_ideograph(p) && !p.is_whitespace();
            let leaving = !is_ideograph(c) && is_ideograph(p) && !c.is_whitespace();
            if entering || leaving {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::descriptor::{ARTIST, LABEL, RELEASE, TRACK};

    fn norm(q: &str) -> String {
        normalize(q.as_bytes(), &ARTIST).unwrap()
    }

    #[test]
    fn operators_keep_case_and_terms_are_lowercased() {
        assert_eq!(norm("find AND this OR That"), "find AND this OR that");
        assert_eq!(norm("NOT Beatles XOR Stones"), "NOT beatles XOR stones");
        assert_eq!(norm("and or"), "and or");
    }

    #[test]
    fn dotted_acronyms_collapse_but_abbreviations_do_not() {
        assert_eq!(norm("R.E.M. radio"), "REM radio");
        assert_eq!(norm("end. radio"), "end. radio");
        assert_eq!(norm("artist:R.E.M."), "artist:rem");
        assert_eq!(norm("(R.E.M.)"), "(rem)");
    }

    #[test]
    fn legacy_type_codes_are_remapped_per_entity() {
        assert_eq!(norm("type:1"), "type:person");
        assert_eq!(normalize(b"type:1", &RELEASE).unwrap(), "type:album");
        assert_eq!(normalize(b"type:1", &TRACK).unwrap(), "type:album");
        assert_eq!(
            normalize(b"status:4", &RELEASE).unwrap(),
            "status:pseudo-release"
        );
        assert_eq!(norm("artype:2 oasis"), "type:group oasis");
    }

    #[test]
    fn unmapped_ordinals_are_dropped() {
        assert_eq!(norm("oasis type:9"), "oasis ");
        assert_eq!(normalize(b"status:0 x", &RELEASE).unwrap(), " x");
    }

    #[test]
    fn multi_word_remaps_are_quoted() {
        assert_eq!(
            normalize(b"type:4", &LABEL).unwrap(),
            "type:\"original production\""
        );
    }

    #[test]
    fn leading_zeros_dropped_only_for_configured_fields() {
        assert_eq!(
            normalize(b"barcode:000123", &RELEASE).unwrap(),
            "barcode:123"
        );
        assert_eq!(normalize(b"code:0042", &LABEL).unwrap(), "code:42");
        assert_eq!(norm("begin:0042"), "begin:0042");
    }

    #[test]
    fn boosts_and_apostrophes_are_stripped() {
        assert_eq!(norm("love^2 hate^0.5"), "love hate");
        assert_eq!(norm("Don't Stop"), "dont stop");
        assert_eq!(norm("R.E.M.'s"), "rems");
    }

    #[test]
    fn uuid_dashes_removed_but_hyphenated_words_kept() {
        assert_eq!(
            norm("arid:a1b2c3d4-e5f6-a1b2-c3d4-e5f6a1b2c3d4"),
            "arid:a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4"
        );
        assert_eq!(norm("well-known"), "well-known");
    }

    #[test]
    fn accents_fold_to_ascii() {
        assert_eq!(norm("Beyoncé Sigur Rós Ørsted"), "beyonce sigur ros orsted");
        assert_eq!(norm("Straße"), "strasse");
        assert_eq!(norm("ÆON"), "AEON");
    }

    #[test]
    fn ideograph_runs_are_space_separated() {
        assert_eq!(norm("東京事変live"), "東京事変 live");
        assert_eq!(norm("abc東京def"), "abc 東京 def");
        assert_eq!(norm("東京 事変"), "東京 事変");
    }

    #[test]
    fn invalid_or_empty_input_is_a_query_error() {
        assert_eq!(normalize(b"\xff\xfe", &ARTIST), Err(QueryError::InvalidUtf8));
        assert_eq!(normalize(b"   ", &ARTIST), Err(QueryError::Empty));
        assert_eq!(normalize(b"", &ARTIST), Err(QueryError::Empty));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        for q in [
            "find AND this OR That",
            "R.E.M. radio",
            "東京R.E.M.",
            "東京AND事変",
            "東京type:1",
            "Don't Stop Believin'",
            "arid:A1B2C3D4-E5F6-A1B2-C3D4-E5F6A1B2C3D4",
            "Ørsted^3 ÆON",
            "type^2:1",
            "a.'b.",
            "type:'1",
            "love^'2",
            "barcode:'00123",
        ] {
            let once = normalize_text(q, &ARTIST);
            assert_eq!(normalize_text(&once, &ARTIST), once, "input: {q}");
        }
    }

    #[test]
    fn noise_hidden_inside_a_construct_is_settled_in_one_call() {
        assert_eq!(norm("type^2:1"), "type:person");
        assert_eq!(norm("type:'1"), "type:person");
        assert_eq!(norm("a.'b."), "ab");
        assert_eq!(norm("love^'2"), "love");
        assert_eq!(
            normalize(b"barcode:'00123", &RELEASE).unwrap(),
            "barcode:123"
        );
    }

    #[test]
    fn index_form_matches_query_side_segmentation() {
        assert_eq!(index_form("a.'b."), "ab");
        assert_eq!(index_form("R.E.M."), "REM");
        assert_eq!(index_form("Don't"), "Dont");
        assert_eq!(index_form("東京Jihen"), "東京 Jihen");
    }
}
