//! The AST Extractor: turns a file's content into a [`FileAst`]
//! structural summary, dispatching on [`SourceLanguage`].

pub mod data;
pub mod language;
pub mod treesitter;

pub use language::SourceLanguage;

use crate::model::ast::FileAst;

/// Extracts a structural summary for `path`/`content`. Unsupported
/// languages yield an empty, non-error AST — extraction is best-effort
/// and a missing summary is not itself a failure.
pub fn extract(path: &str, content: &str) -> FileAst {
    match SourceLanguage::from_path(path) {
        lang @ (SourceLanguage::TypeScript
        | SourceLanguage::Tsx
        | SourceLanguage::JavaScript
        | SourceLanguage::Jsx) => treesitter::extract(content, lang),
        SourceLanguage::Json => data::extract_json(content),
        SourceLanguage::Yaml => data::extract_yaml(content),
        SourceLanguage::Other => FileAst::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension() {
        let ast = extract("src/a.ts", "export function f() {}\n");
        assert_eq!(ast.functions.len(), 1);

        let ast = extract("data.json", "{\"k\": 1}");
        assert_eq!(ast.exports.len(), 1);

        let ast = extract("README.md", "# hi");
        assert!(ast.functions.is_empty());
        assert!(!ast.parse_error);
    }
}
