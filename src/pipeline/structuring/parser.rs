use std::sync::LazyLock;

use regex::Regex;

use super::types::ExtractedRecord;
use super::StructuringError;

/// Markdown fence markers the model wraps JSON in (```` ```json ```` and ```` ``` ````).
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("valid regex"));

/// Remove every code-fence marker and surrounding whitespace.
pub fn strip_code_fences(completion: &str) -> String {
    FENCE_RE.replace_all(completion.trim(), "").trim().to_string()
}

/// Parse a completion into the JSON object it describes.
///
/// Anything other than a single non-empty JSON object after fence-stripping
/// is rejected; no attempt is made to salvage prose around the JSON.
pub fn parse_completion(
    completion: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, StructuringError> {
    let cleaned = strip_code_fences(completion);
    if cleaned.is_empty() {
        return Err(StructuringError::MalformedResponse("empty completion".into()));
    }

    let value: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| StructuringError::JsonParsing(e.to_string()))?;

    match value {
        serde_json::Value::Object(map) if map.is_empty() => Err(
            StructuringError::MalformedResponse("empty JSON object".into()),
        ),
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StructuringError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Parse a completion straight into a record for `source_filename`.
pub fn parse_record(
    source_filename: &str,
    completion: &str,
) -> Result<ExtractedRecord, StructuringError> {
    let object = parse_completion(completion)?;
    Ok(ExtractedRecord::from_json(source_filename, &object))
}

/// First `max_chars` characters of a completion, for log lines.
pub fn completion_preview(completion: &str, max_chars: usize) -> &str {
    super::prompt::truncate_chars(completion, max_chars)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::types::{FieldValue, RecordField};

    fn sample_completion() -> String {
        r#"```json
{
  "titulo_artigo": "Efeitos do ruído urbano no canto de Zonotrichia capensis",
  "autores": ["Ana Souza", "Bruno Lima", "Carla Dias"],
  "ano_publicacao": "2022",
  "resumo_ia": "O artigo investiga como o ruído altera o canto. Foram feitas gravações. O canto fica mais agudo.",
  "palavras_chave_ia": ["bioacústica", "ruído antropogênico", "canto de aves", "ecologia urbana", "Zonotrichia"],
  "metodologia_principal": "Gravações de campo comparando áreas urbanas e rurais.",
  "grande_area_conhecimento": "Biologia / Ornitologia"
}
```"#
            .to_string()
    }

    #[test]
    fn parse_fenced_completion() {
        let record = parse_record("zonotrichia.pdf", &sample_completion()).unwrap();

        assert!(record.missing_fields().is_empty());
        assert_eq!(
            record.get(RecordField::PublicationYear),
            Some(&FieldValue::Text("2022".into()))
        );
        assert_eq!(
            record.get(RecordField::KnowledgeArea).unwrap().render(),
            "Biologia / Ornitologia"
        );
        match record.get(RecordField::Keywords) {
            Some(FieldValue::List(k)) => assert_eq!(k.len(), 5),
            other => panic!("keywords should be a list, got {other:?}"),
        }
    }

    #[test]
    fn parse_bare_json() {
        let object = parse_completion(r#"  {"titulo_artigo": "T"}  "#).unwrap();
        assert_eq!(object["titulo_artigo"], "T");
    }

    #[test]
    fn parse_bare_fence_without_language() {
        let object = parse_completion("```\n{\"autores\": [\"X\"]}\n```").unwrap();
        assert!(object.contains_key("autores"));
    }

    #[test]
    fn uppercase_fence_is_stripped() {
        let object = parse_completion("```JSON\n{\"ano_publicacao\": \"1999\"}\n```").unwrap();
        assert_eq!(object["ano_publicacao"], "1999");
    }

    #[test]
    fn prose_around_json_is_rejected() {
        let result = parse_completion("Claro! Aqui está:\n{\"titulo_artigo\": \"T\"}");
        assert!(matches!(result, Err(StructuringError::JsonParsing(_))));
    }

    #[test]
    fn invalid_json_returns_error() {
        let result = parse_completion("```json\n{invalid json}\n```");
        assert!(matches!(result, Err(StructuringError::JsonParsing(_))));
    }

    #[test]
    fn array_is_malformed() {
        let result = parse_completion(r#"[{"titulo_artigo": "T"}]"#);
        assert!(matches!(result, Err(StructuringError::MalformedResponse(_))));
    }

    #[test]
    fn empty_completion_is_malformed() {
        let result = parse_completion("```json\n```");
        assert!(matches!(result, Err(StructuringError::MalformedResponse(_))));
    }

    #[test]
    fn empty_object_is_malformed() {
        let result = parse_completion("```json\n{}\n```");
        match result {
            Err(StructuringError::MalformedResponse(msg)) => assert_eq!(msg, "empty JSON object"),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
        assert!(parse_record("e.pdf", "{ }").is_err());
    }

    #[test]
    fn strip_code_fences_trims() {
        assert_eq!(strip_code_fences("\n```json\n{}\n```\n"), "{}");
    }

    #[test]
    fn preview_is_char_bounded() {
        assert_eq!(completion_preview("ççççç", 2), "çç");
    }
}
