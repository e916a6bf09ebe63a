//! The configuration document: the unit the agent loads, mutates and saves

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vigil_core::{ItemDoc, TriggerDoc};

use crate::error::{ConfigError, ConfigResult};

/// One monitoring configuration file.
///
/// `items` and `triggers` are the sections a run processes; any other
/// top-level key passes through load and save verbatim. The document doubles
/// as the agent's state store: item histories and trigger statuses computed
/// during a run are written back into the same file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Monitored items, polled once per run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemDoc>,

    /// Triggers processed against the freshly polled histories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<TriggerDoc>,

    /// Top-level keys outside the model, preserved verbatim
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl ConfigDocument {
    /// Load a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the document back, pretty-printed with two-space indents.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving configuration");
        let content =
            serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(path, content).map_err(|source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use vigil_core::{CheckResult, ErrorInfo, TriggerStatus};

    fn sample() -> ConfigDocument {
        let mut doc: ConfigDocument = serde_json::from_str(
            r#"{
                "comment": "lab boxes",
                "items": [
                    {"name": "cpu", "cmd": "cpu-pct", "history": 3}
                ],
                "triggers": [
                    {
                        "name": "cpu high",
                        "expression": "{item:cpu} > 90",
                        "up-actions": [{"type": "notification", "to": "ops@example.com"}]
                    }
                ]
            }"#,
        )
        .unwrap();

        let mut result = CheckResult::at("2026-01-05 10:20:30.400".to_string());
        result.stdout = Some(vec!["95".to_string()]);
        doc.items[0].record(result.with_derived_value());

        doc.triggers[0].status = Some(TriggerStatus::Up);
        doc.triggers[0].since = Some("2026-01-05 10:20:30.400".to_string());
        doc.triggers[0].last_processing_time = Some("2026-01-05 10:20:30.400".to_string());
        doc.triggers[0].error = Some(ErrorInfo::new("line one\nline two"));
        doc
    }

    #[test]
    fn test_save_then_load_preserves_run_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        let doc = sample();
        doc.save(&path).unwrap();

        let back = ConfigDocument::load(&path).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.items[0].last_values[0].value(), Some("95"));
        assert_eq!(back.triggers[0].status, Some(TriggerStatus::Up));
        assert_eq!(back.triggers[0].since.as_deref(), Some("2026-01-05 10:20:30.400"));
        // multi-line error messages keep the array-of-lines form
        let error = back.triggers[0].error.as_ref().unwrap();
        assert_eq!(error.msg.join(), "line one\nline two");
    }

    #[test]
    fn test_unmodeled_top_level_keys_survive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        sample().save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["comment"], "lab boxes");
    }

    #[test]
    fn test_save_is_pretty_printed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitor.json");
        sample().save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("{\n  \""));
    }

    #[test]
    fn test_load_missing_file_reports_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = ConfigDocument::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();
        let err = ConfigDocument::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_empty_document_loads_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, "{}").unwrap();
        let doc = ConfigDocument::load(&path).unwrap();
        assert!(doc.items.is_empty());
        assert!(doc.triggers.is_empty());
    }
}
