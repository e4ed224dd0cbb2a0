// src/classification/phone.rs
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

/// Already canonical: +20 followed by a mobile, Cairo or Alexandria number.
static INTERNATIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+20(?:1\d{9}|2\d{8}|3\d{7})$").expect("valid phone pattern"));
static LOCAL_MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^01\d{9}$").expect("valid phone pattern"));
static CAIRO_LANDLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^02\d{8}$").expect("valid phone pattern"));
static ALEXANDRIA_LANDLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^03\d{7}$").expect("valid phone pattern"));
static EMBEDDED_MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"01\d{9}").expect("valid phone pattern"));

/// Canonicalizes an Egyptian phone number to `+20…`, or returns `None`.
///
/// Local mobile (`01` + 9 digits), Cairo (`02` + 8) and Alexandria (`03` + 7)
/// numbers get the `+2` prefix. Strings that carry extension text or several
/// numbers fall back to the first embedded mobile number. Never panics, and
/// feeding the output back in returns it unchanged.
pub fn normalize_phone(phone: Option<&str>) -> Option<String> {
    let phone = phone?;
    let cleaned = clean_phone(phone);
    if cleaned.is_empty() {
        return None;
    }

    if INTERNATIONAL.is_match(&cleaned) {
        return Some(cleaned);
    }

    if LOCAL_MOBILE.is_match(&cleaned)
        || CAIRO_LANDLINE.is_match(&cleaned)
        || ALEXANDRIA_LANDLINE.is_match(&cleaned)
    {
        return Some(format!("+2{}", cleaned));
    }

    if let Some(m) = EMBEDDED_MOBILE.find(&cleaned) {
        return Some(format!("+2{}", m.as_str()));
    }

    debug!("Phone '{}' (cleaned '{}') is not a recognizable Egyptian number", phone, cleaned);
    None
}

/// Keeps digits and a `+` that precedes every digit. Arabic-Indic digits
/// are folded to ASCII since Egyptian listings use both.
fn clean_phone(phone: &str) -> String {
    let mut cleaned = String::with_capacity(phone.len());
    for c in phone.chars() {
        if let Some(d) = ascii_digit(c) {
            cleaned.push(d);
        } else if c == '+' && cleaned.is_empty() {
            cleaned.push('+');
        }
    }
    cleaned
}

fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{0660}'..='\u{0669}' => char::from_digit(c as u32 - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(c as u32 - 0x06F0, 10),
        _ => None,
    }
}
