// Line heuristics for the identity card layout.
//
// Every rule looks at a three-line window and either yields a value for its
// field or nothing. Rules are independent: one line may feed several fields.

use lazy_static::lazy_static;
use regex::Regex;

use super::Field;

/// Tokens announcing the card number on the same line.
pub const CARD_NUMBER_MARKERS: [&str; 2] = ["C100", "n°"];

/// Labels that, on the previous line, announce the expiration date.
pub const EXPIRATION_LABELS: [&str; 3] = ["Expiration", "Expire", "Valid"];

/// The single nationality printed on supported cards.
pub const NATIONALITY: &str = "IVOIRIENNE";

lazy_static! {
    static ref CARD_NUMBER_RE: Regex = Regex::new(r"C\d{10}").unwrap();
    static ref DATE_RE: Regex = Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap();
    static ref HEIGHT_RE: Regex = Regex::new(r"\d,\d{2}").unwrap();
}

/// The line under inspection with its neighbours.
///
/// `current` is trimmed; `previous` and `next` are the raw OCR lines.
#[derive(Debug, Clone, Copy)]
pub struct LineWindow<'a> {
    pub previous: Option<&'a str>,
    pub current: &'a str,
    pub next: Option<&'a str>,
}

impl<'a> LineWindow<'a> {
    pub fn at(lines: &[&'a str], index: usize) -> Self {
        LineWindow {
            previous: index.checked_sub(1).map(|i| lines[i]),
            current: lines[index].trim(),
            next: lines.get(index + 1).copied(),
        }
    }
}

pub type Extractor = fn(&LineWindow) -> Option<String>;

pub struct FieldRule {
    pub field: Field,
    pub extract: Extractor,
}

/// Applied in this order to every line.
pub const FIELD_RULES: [FieldRule; 8] = [
    FieldRule { field: Field::NumeroCarte, extract: card_number },
    FieldRule { field: Field::Nom, extract: surname },
    FieldRule { field: Field::Prenom, extract: given_names },
    FieldRule { field: Field::DateNaissance, extract: birth_date },
    FieldRule { field: Field::Sexe, extract: sex },
    FieldRule { field: Field::Taille, extract: height },
    FieldRule { field: Field::Nationalite, extract: nationality },
    FieldRule { field: Field::DateExpiration, extract: expiration_date },
];

fn find(re: &Regex, line: &str) -> Option<String> {
    re.find(line).map(|m| m.as_str().to_string())
}

pub fn card_number(window: &LineWindow) -> Option<String> {
    if !CARD_NUMBER_MARKERS.iter().any(|marker| window.current.contains(marker)) {
        return None;
    }
    find(&CARD_NUMBER_RE, window.current)
}

pub fn surname(window: &LineWindow) -> Option<String> {
    match window.previous {
        Some(previous) if previous.contains("Nom") => Some(window.current.to_string()),
        _ => None,
    }
}

pub fn given_names(window: &LineWindow) -> Option<String> {
    if !window.current.contains("Prénom") {
        return None;
    }
    Some(window.next.map(str::trim).unwrap_or("").to_string())
}

pub fn birth_date(window: &LineWindow) -> Option<String> {
    if !window.current.to_lowercase().contains("naissance") {
        return None;
    }
    find(&DATE_RE, window.current).or_else(|| window.next.and_then(|next| find(&DATE_RE, next)))
}

pub fn sex(window: &LineWindow) -> Option<String> {
    if !window.current.contains("Sexe") {
        return None;
    }
    let upper = window.current.to_uppercase();
    if upper.contains('M') {
        Some("M".to_string())
    } else if upper.contains('F') {
        Some("F".to_string())
    } else {
        None
    }
}

pub fn height(window: &LineWindow) -> Option<String> {
    if !window.current.contains("Taille") {
        return None;
    }
    find(&HEIGHT_RE, window.current)
}

pub fn nationality(window: &LineWindow) -> Option<String> {
    if window.current.contains("Nationalité") || window.current.contains(NATIONALITY) {
        Some(NATIONALITY.to_string())
    } else {
        None
    }
}

pub fn expiration_date(window: &LineWindow) -> Option<String> {
    let previous = window.previous?;
    if !EXPIRATION_LABELS.iter().any(|label| previous.contains(label)) {
        return None;
    }
    find(&DATE_RE, window.current)
}
