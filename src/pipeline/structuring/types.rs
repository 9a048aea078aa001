use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StructuringError;

/// The metadata keys the extraction prompt asks the model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Title,
    Authors,
    PublicationYear,
    Summary,
    Keywords,
    Methodology,
    KnowledgeArea,
}

impl RecordField {
    pub fn all() -> &'static [RecordField] {
        &[
            RecordField::Title,
            RecordField::Authors,
            RecordField::PublicationYear,
            RecordField::Summary,
            RecordField::Keywords,
            RecordField::Methodology,
            RecordField::KnowledgeArea,
        ]
    }

    /// Key used in the model's JSON answer.
    pub fn json_key(&self) -> &'static str {
        match self {
            RecordField::Title => "titulo_artigo",
            RecordField::Authors => "autores",
            RecordField::PublicationYear => "ano_publicacao",
            RecordField::Summary => "resumo_ia",
            RecordField::Keywords => "palavras_chave_ia",
            RecordField::Methodology => "metodologia_principal",
            RecordField::KnowledgeArea => "grande_area_conhecimento",
        }
    }

    pub fn from_json_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.json_key() == key)
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.json_key())
    }
}

/// A recognized value from the model's answer, kept as loosely as the model
/// sent it. Nothing beyond shape is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    /// Key present with a JSON `null`.
    Empty,
}

impl FieldValue {
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Empty,
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Array(items) => FieldValue::List(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Text shown in a spreadsheet cell.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Empty => String::new(),
        }
    }
}

/// One document's metadata as returned by the model, tagged with the file it
/// came from. Only recognized keys are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    pub source_filename: String,
    fields: BTreeMap<RecordField, FieldValue>,
}

impl ExtractedRecord {
    pub fn from_json(
        source_filename: &str,
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let fields = object
            .iter()
            .filter_map(|(key, value)| {
                RecordField::from_json_key(key).map(|field| (field, FieldValue::from_json(value)))
            })
            .collect();

        Self {
            source_filename: source_filename.to_string(),
            fields,
        }
    }

    pub fn get(&self, field: RecordField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Recognized keys the model left out.
    pub fn missing_fields(&self) -> Vec<RecordField> {
        RecordField::all()
            .iter()
            .copied()
            .filter(|f| !self.fields.contains_key(f))
            .collect()
    }
}

/// Hosted text-generation client abstraction (allows mocking)
pub trait LlmClient {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, StructuringError>;

    fn list_models(&self) -> Result<Vec<String>, StructuringError>;

    fn is_model_available(&self, model: &str) -> Result<bool, StructuringError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn json_key_roundtrip() {
        for field in RecordField::all() {
            assert_eq!(RecordField::from_json_key(field.json_key()), Some(*field));
        }
        assert_eq!(RecordField::from_json_key("arquivo"), None);
    }

    #[test]
    fn seven_recognized_fields() {
        assert_eq!(RecordField::all().len(), 7);
    }

    #[test]
    fn full_answer_populates_every_field() {
        let record = ExtractedRecord::from_json(
            "artigo.pdf",
            &object(json!({
                "titulo_artigo": "Canto de aves urbanas",
                "autores": ["Ana Souza", "Bruno Lima"],
                "ano_publicacao": "2021",
                "resumo_ia": "Resumo.",
                "palavras_chave_ia": ["bioacústica", "aves"],
                "metodologia_principal": "Gravações de campo.",
                "grande_area_conhecimento": "Biologia / Ornitologia"
            })),
        );

        assert_eq!(record.source_filename, "artigo.pdf");
        assert!(record.missing_fields().is_empty());
        assert_eq!(
            record.get(RecordField::Authors),
            Some(&FieldValue::List(vec!["Ana Souza".into(), "Bruno Lima".into()]))
        );
        assert_eq!(
            record.get(RecordField::Title).map(FieldValue::render).as_deref(),
            Some("Canto de aves urbanas")
        );
    }

    #[test]
    fn missing_keys_are_reported() {
        let record = ExtractedRecord::from_json(
            "a.pdf",
            &object(json!({"titulo_artigo": "T", "autores": []})),
        );
        let missing = record.missing_fields();
        assert_eq!(missing.len(), 5);
        assert!(missing.contains(&RecordField::PublicationYear));
        assert!(!missing.contains(&RecordField::Authors));
    }

    #[test]
    fn unrecognized_keys_are_dropped() {
        let record = ExtractedRecord::from_json(
            "a.pdf",
            &object(json!({"doi": "10.1000/xyz", "titulo_artigo": "T"})),
        );
        assert_eq!(record.missing_fields().len(), 6);
    }

    #[test]
    fn field_value_shapes() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Empty);
        assert_eq!(FieldValue::from_json(&json!(2019)).render(), "2019");
        assert_eq!(FieldValue::from_json(&json!(["a", 1, null])).render(), "a, 1");
        assert_eq!(FieldValue::from_json(&json!("x")).render(), "x");
        assert_eq!(FieldValue::Empty.render(), "");
    }
}
