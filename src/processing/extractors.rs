// Field extraction from the joined OCR text
use log::debug;

use crate::models::{FieldMap, LineWindow, FIELD_RULES};

/// Line-oriented parser: every rule of the table is tried on every line, and
/// a later match for a field replaces an earlier one.
pub struct FieldParser;

impl FieldParser {
    pub fn parse(text: &str) -> FieldMap {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut fields = FieldMap::new();

        for index in 0..lines.len() {
            let window = LineWindow::at(&lines, index);
            for rule in FIELD_RULES.iter() {
                if let Some(value) = (rule.extract)(&window) {
                    debug!("Line {} matched {}: {:?}", index, rule.field, value);
                    fields.insert(rule.field, value);
                }
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    const CARD_TEXT: &str = "REPUBLIQUE DE COTE D'IVOIRE\n\
        CARTE NATIONALE D'IDENTITE n° C0123456789\n\
        Nom\n\
        KOUASSI\n\
        Prénom(s)\n\
        KOFFI N'GUESSAN\n\
        Date de naissance\n\
        12/05/1990\n\
        Sexe: Masculin M  Taille 1,78\n\
        Nationalité IVOIRIENNE\n\
        Date d'Expiration\n\
        11/05/2031";

    #[test]
    fn test_full_card() {
        let fields = FieldParser::parse(CARD_TEXT);
        assert_eq!(fields.get(Field::NumeroCarte), Some("C0123456789"));
        assert_eq!(fields.get(Field::Nom), Some("KOUASSI"));
        assert_eq!(fields.get(Field::Prenom), Some("KOFFI N'GUESSAN"));
        assert_eq!(fields.get(Field::DateNaissance), Some("12/05/1990"));
        assert_eq!(fields.get(Field::Sexe), Some("M"));
        assert_eq!(fields.get(Field::Taille), Some("1,78"));
        assert_eq!(fields.get(Field::Nationalite), Some("IVOIRIENNE"));
        assert_eq!(fields.get(Field::DateExpiration), Some("11/05/2031"));
        assert_eq!(fields.len(), 8);
    }

    #[test]
    fn test_parse_is_pure() {
        assert_eq!(FieldParser::parse(CARD_TEXT), FieldParser::parse(CARD_TEXT));
    }

    #[test]
    fn test_no_markers_gives_empty_map() {
        assert!(FieldParser::parse("lorem ipsum\n\n1234\n").is_empty());
        assert!(FieldParser::parse("").is_empty());
    }

    #[test]
    fn test_sex_line() {
        let fields = FieldParser::parse("Sexe: Masculin M");
        assert_eq!(fields.get(Field::Sexe), Some("M"));
    }

    #[test]
    fn test_given_names_from_next_line() {
        let fields = FieldParser::parse("Prénom\nKOFFI N'GUESSAN");
        assert_eq!(fields.get(Field::Prenom), Some("KOFFI N'GUESSAN"));
    }

    #[test]
    fn test_given_names_label_on_last_line() {
        let fields = FieldParser::parse("Prénom");
        assert_eq!(fields.get(Field::Prenom), Some(""));
    }

    #[test]
    fn test_birth_date_on_next_line() {
        let fields = FieldParser::parse("Date de naissance\n12/05/1990");
        assert_eq!(fields.get(Field::DateNaissance), Some("12/05/1990"));
    }

    #[test]
    fn test_later_height_wins() {
        let fields = FieldParser::parse("Taille 1,70\nbruit\nTaille 1,82 m");
        assert_eq!(fields.get(Field::Taille), Some("1,82"));
    }

    #[test]
    fn test_repeated_passes_last_match_wins() {
        // Same card read by two passes, the second with a different surname.
        let text = "Nom\nKOUASSl\n\nNom\nKOUASSI";
        let fields = FieldParser::parse(text);
        assert_eq!(fields.get(Field::Nom), Some("KOUASSI"));
    }

    #[test]
    fn test_one_line_feeds_several_fields() {
        let fields = FieldParser::parse("Sexe F Taille 1,65 IVOIRIENNE");
        assert_eq!(fields.get(Field::Sexe), Some("F"));
        assert_eq!(fields.get(Field::Taille), Some("1,65"));
        assert_eq!(fields.get(Field::Nationalite), Some("IVOIRIENNE"));
    }

    #[test]
    fn test_implausible_values_kept() {
        let fields = FieldParser::parse("Taille 9,99\nDate de naissance 99/99/0000");
        assert_eq!(fields.get(Field::Taille), Some("9,99"));
        assert_eq!(fields.get(Field::DateNaissance), Some("99/99/0000"));
    }

    #[test]
    fn test_surname_line_is_trimmed() {
        let fields = FieldParser::parse("Nom:\n   KOUASSI  \r");
        assert_eq!(fields.get(Field::Nom), Some("KOUASSI"));
    }
}
