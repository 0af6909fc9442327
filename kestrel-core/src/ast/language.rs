//! Source language detection from a file path.

/// The AST extractor is polymorphic over these variants; every other
/// language yields an empty AST with `parse_error = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Json,
    Yaml,
    Other,
}

impl SourceLanguage {
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".tsx") {
            Self::Tsx
        } else if lower.ends_with(".ts") && !lower.ends_with(".d.ts") {
            Self::TypeScript
        } else if lower.ends_with(".d.ts") {
            Self::TypeScript
        } else if lower.ends_with(".jsx") {
            Self::Jsx
        } else if lower.ends_with(".js") || lower.ends_with(".mjs") || lower.ends_with(".cjs") {
            Self::JavaScript
        } else if lower.ends_with(".json") {
            Self::Json
        } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            Self::Yaml
        } else {
            Self::Other
        }
    }

    pub fn is_tree_sitter(self) -> bool {
        matches!(
            self,
            Self::TypeScript | Self::Tsx | Self::JavaScript | Self::Jsx
        )
    }
}
