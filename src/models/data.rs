use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of fields the parser can recognise on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    NumeroCarte,
    Nom,
    Prenom,
    DateNaissance,
    Sexe,
    Taille,
    Nationalite,
    DateExpiration,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::NumeroCarte,
        Field::Nom,
        Field::Prenom,
        Field::DateNaissance,
        Field::Sexe,
        Field::Taille,
        Field::Nationalite,
        Field::DateExpiration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::NumeroCarte => "numero_carte",
            Field::Nom => "nom",
            Field::Prenom => "prenom",
            Field::DateNaissance => "date_naissance",
            Field::Sexe => "sexe",
            Field::Taille => "taille",
            Field::Nationalite => "nationalite",
            Field::DateExpiration => "date_expiration",
        }
    }

    /// Human readable label: underscores become spaces, each word capitalised.
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields found on a card. A key is present only when a heuristic fired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<Field, String>);

impl FieldMap {
    pub fn new() -> Self {
        FieldMap(BTreeMap::new())
    }

    /// Later assignments overwrite earlier ones.
    pub(crate) fn insert(&mut self, field: Field, value: String) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

/// Axis-aligned rectangle in processed-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextZone {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Tesseract page segmentation strategies used by the recogniser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMode {
    /// PSM 6: a single uniform block of text.
    UniformBlock,
    /// PSM 3: fully automatic page segmentation.
    Automatic,
    /// PSM 4: a single column of text of variable sizes.
    SingleColumn,
}

impl SegmentationMode {
    /// Pass order; the joined text follows it.
    pub const PASSES: [SegmentationMode; 3] = [
        SegmentationMode::UniformBlock,
        SegmentationMode::Automatic,
        SegmentationMode::SingleColumn,
    ];

    pub fn psm(&self) -> u8 {
        match self {
            SegmentationMode::UniformBlock => 6,
            SegmentationMode::Automatic => 3,
            SegmentationMode::SingleColumn => 4,
        }
    }
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SegmentationMode::UniformBlock => "uniform-block",
            SegmentationMode::Automatic => "automatic",
            SegmentationMode::SingleColumn => "single-column",
        };
        write!(f, "{} (psm {})", name, self.psm())
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: FieldMap,
    pub raw_text: String,
}

impl ExtractionResult {
    /// Plain-text rendering for manual inspection: structured fields first,
    /// then the raw OCR text. Only the raw text when nothing was found.
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        if !self.fields.is_empty() {
            lines.push("=== DONNÉES STRUCTURÉES ===".to_string());
            for (field, value) in self.fields.iter() {
                lines.push(format!("{}: {}", field.label(), value));
            }
            lines.push("\n=== TEXTE BRUT ===".to_string());
        }
        lines.push(self.raw_text.clone());
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: Field,
    pub issue_type: ValidationIssueType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationIssueType {
    Format,
    Expiry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_labels() {
        assert_eq!(Field::NumeroCarte.label(), "Numero Carte");
        assert_eq!(Field::Nom.label(), "Nom");
        assert_eq!(Field::DateExpiration.label(), "Date Expiration");
    }

    #[test]
    fn test_field_map_serializes_with_field_names() {
        let mut fields = FieldMap::new();
        fields.insert(Field::Sexe, "M".to_string());
        fields.insert(Field::DateNaissance, "12/05/1990".to_string());

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["sexe"], "M");
        assert_eq!(json["date_naissance"], "12/05/1990");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_later_insert_overwrites() {
        let mut fields = FieldMap::new();
        fields.insert(Field::Taille, "1,70".to_string());
        fields.insert(Field::Taille, "1,82".to_string());
        assert_eq!(fields.get(Field::Taille), Some("1,82"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_report_with_fields() {
        let mut fields = FieldMap::new();
        fields.insert(Field::Nom, "KOUASSI".to_string());
        let result = ExtractionResult {
            fields,
            raw_text: "Nom\nKOUASSI".to_string(),
        };

        let report = result.report();
        assert!(report.starts_with("=== DONNÉES STRUCTURÉES ===\nNom: KOUASSI\n"));
        assert!(report.contains("=== TEXTE BRUT ===\nNom\nKOUASSI"));
    }

    #[test]
    fn test_report_without_fields_is_raw_text() {
        let result = ExtractionResult {
            fields: FieldMap::new(),
            raw_text: "illisible".to_string(),
        };
        assert_eq!(result.report(), "illisible");
    }

    #[test]
    fn test_segmentation_mode_order() {
        let psms: Vec<u8> = SegmentationMode::PASSES.iter().map(|m| m.psm()).collect();
        assert_eq!(psms, vec![6, 3, 4]);
    }
}
