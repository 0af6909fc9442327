//! File-type and entry-point/hub classification.

use crate::model::meta::FileType;

const CONFIG_TOKENS: &[&str] = &[
    "config", "webpack", "babel", "eslint", "jest", "tsconfig", "rollup", "vite",
    "postcss", "prettier", "tailwind",
];

const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".json", ".yaml", ".yml"];

pub fn classify_file_type(path: &str) -> FileType {
    let lower = path.to_ascii_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if basename.contains(".test.")
        || basename.contains(".spec.")
        || lower.contains("/tests/")
        || lower.contains("/__tests__/")
    {
        return FileType::Test;
    }
    if basename.ends_with(".d.ts") || lower.contains("/types/") || basename.starts_with("types.") {
        return FileType::Types;
    }
    if CONFIG_TOKENS.iter().any(|token| basename.contains(token)) {
        return FileType::Config;
    }
    if SOURCE_EXTENSIONS.iter().any(|ext| basename.ends_with(ext)) {
        return FileType::Source;
    }
    FileType::Unknown
}

/// Entry-point iff basename starts with one of a fixed set of prefixes, or
/// the file has no dependents.
pub fn is_entry_point(path: &str, dependent_count: usize) -> bool {
    let lower = path.to_ascii_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);
    const PREFIXES: &[&str] = &["index.", "main.", "app.", "cli.", "server."];
    PREFIXES.iter().any(|p| basename.starts_with(p)) || dependent_count == 0
}

pub fn is_hub(dependent_count: usize) -> bool {
    dependent_count > 5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_test_files() {
        assert_eq!(classify_file_type("src/a.test.ts"), FileType::Test);
        assert_eq!(classify_file_type("src/__tests__/b.ts"), FileType::Test);
    }

    #[test]
    fn classifies_types_files() {
        assert_eq!(classify_file_type("src/a.d.ts"), FileType::Types);
        assert_eq!(classify_file_type("src/types/index.ts"), FileType::Types);
    }

    #[test]
    fn classifies_config_files() {
        assert_eq!(classify_file_type("webpack.config.js"), FileType::Config);
    }

    #[test]
    fn entry_point_by_basename_or_zero_dependents() {
        assert!(is_entry_point("src/index.ts", 3));
        assert!(is_entry_point("src/util.ts", 0));
        assert!(!is_entry_point("src/util.ts", 1));
    }

    #[test]
    fn hub_threshold_is_exclusive_five() {
        assert!(!is_hub(5));
        assert!(is_hub(6));
    }
}
