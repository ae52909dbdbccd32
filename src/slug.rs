//! Slug derivation shared by every catalog entity.
//!
//! A slug is the lowercase, hyphenated, ASCII-only form of a name. It is never
//! accepted from callers: entity save hooks recompute it on every write.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::ActiveValue;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Derives the slug for a piece of text.
///
/// ```
/// use product_catalog::slug::slugify;
///
/// assert_eq!(slugify("Acme Widgets, Inc."), "acme-widgets-inc");
/// assert_eq!(slugify("  Crème Brûlée  "), "creme-brulee");
/// ```
pub fn slugify(input: &str) -> String {
    let folded = fold_to_ascii(input).to_lowercase();
    let stripped = DISALLOWED.replace_all(&folded, "");
    let hyphenated = SEPARATORS.replace_all(&stripped, "-");
    hyphenated.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Separator between the parts of a composite slug.
///
/// [`slugify`] collapses hyphen runs, so a single slug never contains it.
pub const PART_SEPARATOR: &str = "--";

/// Slugifies each part and joins them with [`PART_SEPARATOR`].
///
/// Distinct part lists give distinct slugs as long as no part slugifies to
/// the empty string.
///
/// ```
/// use product_catalog::slug::slugify_parts;
///
/// assert_eq!(slugify_parts(&["Size", "X Large"]), "size--x-large");
/// assert_eq!(slugify_parts(&["Size X", "Large"]), "size-x--large");
/// ```
pub fn slugify_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| slugify(part))
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

/// Returns the value a model field holds, whether freshly set or loaded from the database.
pub(crate) fn active_str(value: &ActiveValue<String>) -> Option<&str> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(v.as_str()),
        ActiveValue::NotSet => None,
    }
}

/// Slug value to write for a model whose slug derives from `name`.
///
/// When the name is not part of the write the slug is left out as well, so a
/// caller-supplied slug can never reach the database on its own.
pub(crate) fn derived_slug(name: &ActiveValue<String>) -> ActiveValue<String> {
    match active_str(name) {
        Some(name) => ActiveValue::Set(slugify(name)),
        None => ActiveValue::NotSet,
    }
}

fn fold_to_ascii(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            out.push(' ');
            continue;
        }
        if let Some(folded) = fold_char(ch) {
            out.push_str(folded);
        }
    }
    out
}

fn fold_char(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'ğ' => "g",
        'Ğ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "I",
        'ł' => "l",
        'Ł' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' => "s",
        'Ś' | 'Š' | 'Ş' => "S",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'Ť' | 'Ţ' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' | 'Ų' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        '–' | '—' => "-",
        _ => return None,
    };
    Some(folded)
}
