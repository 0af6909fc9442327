//! The Tool Layer: 18 tools across six categories, a uniform
//! [`traits::Tool`] contract, dual-channel results, and the registry that
//! exposes them to the agent loop.

pub mod analysis;
pub mod builder;
pub mod edit;
pub mod git;
pub mod read;
pub mod registry;
pub mod result;
pub mod run;
pub mod search;
pub mod storage_helpers;
pub mod traits;

pub use registry::ToolRegistry;
pub use result::ToolExecResult;
pub use traits::{ConfirmationOutcome, ConfirmationRequest, Tool, ToolCategory, ToolContext};

/// Builds the full, fixed 18-tool registry. Called once at startup; the
/// registry is read-only afterward.
pub fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Box::new(read::GetLines));
    registry.register(Box::new(read::GetFunction));
    registry.register(Box::new(read::GetClass));
    registry.register(Box::new(read::GetStructure));

    registry.register(Box::new(edit::EditLines));
    registry.register(Box::new(edit::CreateFile));
    registry.register(Box::new(edit::DeleteFile));

    registry.register(Box::new(search::FindReferences));
    registry.register(Box::new(search::FindDefinition));

    registry.register(Box::new(analysis::GetDependencies));
    registry.register(Box::new(analysis::GetDependents));
    registry.register(Box::new(analysis::GetComplexity));
    registry.register(Box::new(analysis::GetTodos));

    registry.register(Box::new(git::GitStatus));
    registry.register(Box::new(git::GitDiff));
    registry.register(Box::new(git::GitCommit));

    registry.register(Box::new(run::RunCommand));
    registry.register(Box::new(run::RunTests));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_all_eighteen_tools_without_panicking() {
        let registry = build_registry();
        assert_eq!(registry.all().count(), 18);
    }

    #[test]
    fn every_tool_name_is_unique_and_matches_catalog() {
        let registry = build_registry();
        let names: Vec<&str> = registry.all().map(|t| t.name()).collect();
        for expected in [
            "get_lines", "get_function", "get_class", "get_structure",
            "edit_lines", "create_file", "delete_file",
            "find_references", "find_definition",
            "get_dependencies", "get_dependents", "get_complexity", "get_todos",
            "git_status", "git_diff", "git_commit",
            "run_command", "run_tests",
        ] {
            assert!(names.contains(&expected), "missing tool: {expected}");
        }
    }
}
