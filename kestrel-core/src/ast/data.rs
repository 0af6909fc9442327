//! Top-level-key extraction for JSON and YAML files.
//!
//! These formats have no functions, classes, or imports; structural
//! summarization is limited to reporting the top-level keys as variable
//! exports, one entry per key at its own line, so callers can still get a
//! quick shape overview via `get_structure` without a dedicated viewer.

use crate::model::ast::{ExportKind, ExportRecord, FileAst};

pub fn extract_json(source: &str) -> FileAst {
    let mut ast = FileAst::empty();
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(source);
    match parsed {
        Ok(serde_json::Value::Object(map)) => {
            for key in map.keys() {
                ast.exports.push(ExportRecord {
                    name: key.clone(),
                    line: line_of_key(source, key),
                    is_default: false,
                    kind: ExportKind::Variable,
                });
            }
        }
        Ok(_) => {}
        Err(err) => {
            ast.parse_error = true;
            ast.parse_error_message = Some(err.to_string());
        }
    }
    ast
}

pub fn extract_yaml(source: &str) -> FileAst {
    let mut ast = FileAst::empty();
    let parsed: Result<serde_saphyr::Value, _> = serde_saphyr::from_str(source);
    match parsed {
        Ok(serde_saphyr::Value::Mapping(map)) => {
            for key in map.keys() {
                if let Some(name) = key.as_str() {
                    ast.exports.push(ExportRecord {
                        name: name.to_string(),
                        line: line_of_key(source, name),
                        is_default: false,
                        kind: ExportKind::Variable,
                    });
                }
            }
        }
        Ok(serde_saphyr::Value::Sequence(_)) => {
            ast.exports.push(ExportRecord {
                name: "(array)".to_string(),
                line: 1,
                is_default: false,
                kind: ExportKind::Variable,
            });
        }
        Ok(_) => {}
        Err(err) => {
            ast.parse_error = true;
            ast.parse_error_message = Some(err.to_string());
        }
    }
    ast
}

/// Best-effort line lookup: finds the first line whose key token matches.
/// Structural-only, so a wrong line for a duplicate key name is acceptable.
fn line_of_key(source: &str, key: &str) -> usize {
    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        let quoted = format!("\"{key}\"");
        if trimmed.starts_with(&quoted) || trimmed.starts_with(&format!("{key}:")) {
            return idx + 1;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_top_level_keys() {
        let ast = extract_json("{\n  \"name\": \"x\",\n  \"version\": \"1.0.0\"\n}\n");
        let names: Vec<_> = ast.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"version"));
        assert!(!ast.parse_error);
    }

    #[test]
    fn invalid_json_sets_parse_error() {
        let ast = extract_json("{ not json");
        assert!(ast.parse_error);
    }

    #[test]
    fn extracts_yaml_top_level_keys() {
        let ast = extract_yaml("name: x\nversion: 1.0.0\n");
        let names: Vec<_> = ast.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"version"));
    }

    #[test]
    fn yaml_sequence_document_becomes_single_array_export() {
        let ast = extract_yaml("- a\n- b\n- c\n");
        assert_eq!(ast.exports.len(), 1);
        assert_eq!(ast.exports[0].name, "(array)");
    }
}
