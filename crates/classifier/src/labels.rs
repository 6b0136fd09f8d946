use crate::processing::Prediction;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid label JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Class index to human-readable name, keyed by the stringified index
/// (`{"0": "tench", "1": "goldfish", ...}`). Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl LabelTable {
    /// Parse a JSON object of labels. Numbers and booleans are kept in their
    /// textual form; entries holding anything else are skipped individually.
    pub fn from_json(json: &str) -> Result<Self, LabelError> {
        let entries: Map<String, Value> = serde_json::from_str(json)?;

        let mut labels = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            let label = match value {
                Value::String(label) => label,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    tracing::warn!(key = %key, value = %other, "Skipping non-scalar label");
                    continue;
                }
            };
            labels.insert(key, label);
        }

        Ok(Self { labels })
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, LabelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load the table, degrading to an empty one on any read or parse error.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(table) => {
                tracing::info!(path = %path.display(), labels = table.len(), "Loaded label table");
                table
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Label table unavailable, predictions will be unlabeled"
                );
                Self::default()
            }
        }
    }

    /// Label for `index`, or `""` when the table has no entry.
    pub fn resolve(&self, index: usize) -> &str {
        self.labels
            .get(&index.to_string())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Label for a decoded prediction; `""` when there is none.
pub fn resolve_label(table: &LabelTable, prediction: Option<Prediction>) -> &str {
    prediction.map_or("", |p| table.resolve(p.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_present_and_absent() {
        let table = LabelTable::from_json(r#"{"7": "broccoli", "8": "cauliflower"}"#).unwrap();
        assert_eq!(table.resolve(7), "broccoli");
        assert_eq!(table.resolve(999_999), "");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_label_without_prediction() {
        let table = LabelTable::from_json(r#"{"0": "tench"}"#).unwrap();
        assert_eq!(resolve_label(&table, None), "");
        assert_eq!(
            resolve_label(
                &table,
                Some(Prediction {
                    index: 0,
                    confidence: 0.4
                })
            ),
            "tench"
        );
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            LabelTable::from_json("{not json"),
            Err(LabelError::Parse(_))
        ));
        assert!(matches!(
            LabelTable::from_json(r#"["tench"]"#),
            Err(LabelError::Parse(_))
        ));
    }

    #[test]
    fn test_scalar_values_become_labels() {
        let table = LabelTable::from_json(r#"{"0": 12, "1": true, "2": "goldfish"}"#).unwrap();
        assert_eq!(table.resolve(0), "12");
        assert_eq!(table.resolve(1), "true");
        assert_eq!(table.resolve(2), "goldfish");
    }

    #[test]
    fn test_malformed_entry_only_drops_itself() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"0": "tench", "1": "goldfish", "2": ["shark"], "3": null}"#)
            .unwrap();

        let table = LabelTable::load(file.path());
        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(0), "tench");
        assert_eq!(table.resolve(1), "goldfish");
        assert_eq!(table.resolve(2), "");
        assert_eq!(table.resolve(3), "");
    }

    #[test]
    fn test_load_fails_soft_on_missing_file() {
        let table = LabelTable::load("/nonexistent/labels.json");
        assert!(table.is_empty());
        assert_eq!(table.resolve(0), "");
    }

    #[test]
    fn test_load_fails_soft_on_corrupt_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[\"tench\", \"goldfish\"]").unwrap();

        let table = LabelTable::load(file.path());
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"937": "broccoli"}"#).unwrap();

        let table = LabelTable::load(file.path());
        assert_eq!(table.resolve(937), "broccoli");
    }
}
