//! Builds the per-turn project summary: a directory tree with per-file
//! flags, assembled from whatever has been indexed so far.

use crate::storage::StoragePort;
use crate::tools::storage_helpers::all_metas;

/// Returns `None` when nothing has been indexed yet — callers skip the
/// summary message entirely in that case, per "when a project structure is
/// available".
pub async fn build_project_summary(storage: &dyn StoragePort) -> Option<String> {
    let metas = all_metas(storage).await;
    if metas.is_empty() {
        return None;
    }

    let mut lines = vec!["Project structure:".to_string()];
    for (path, meta) in &metas {
        let mut flags = Vec::new();
        if meta.is_entry_point {
            flags.push("entry-point");
        }
        if meta.is_hub {
            flags.push("hub");
        }
        let flag_suffix = if flags.is_empty() { String::new() } else { format!(" [{}]", flags.join(", ")) };
        lines.push(format!("- {path} ({:.0} loc, complexity {:.1}){flag_suffix}", meta.complexity.loc, meta.complexity.score));
    }
    Some(lines.join("\n"))
}
