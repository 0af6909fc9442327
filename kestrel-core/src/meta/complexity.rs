//! Complexity scoring: `loc`, `max_nesting`, `cyclomatic`, `score`.

use crate::model::ast::{ClassRecord, FileAst};
use crate::model::meta::Complexity;

/// Counts non-blank, non-comment lines, recognizing `//` line comments and
/// `/* ... */` block comments (including single-line forms).
pub fn count_loc(content: &str) -> usize {
    let mut loc = 0;
    let mut in_block_comment = false;
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if in_block_comment {
            if let Some(end) = line.find("*/") {
                in_block_comment = false;
                let rest = line[end + 2..].trim();
                if !rest.is_empty() && !rest.starts_with("//") {
                    loc += 1;
                }
            }
            continue;
        }
        if line.starts_with("//") {
            continue;
        }
        if let Some(start) = line.find("/*") {
            if let Some(end) = line[start..].find("*/") {
                let before = line[..start].trim();
                let after = line[start + end + 2..].trim();
                if !before.is_empty() || (!after.is_empty() && !after.starts_with("//")) {
                    loc += 1;
                }
            } else {
                in_block_comment = true;
                let before = line[..start].trim();
                if !before.is_empty() {
                    loc += 1;
                }
            }
            continue;
        }
        loc += 1;
    }
    loc
}

fn nesting_bucket(len_lines: usize) -> u32 {
    if len_lines <= 5 {
        1
    } else if len_lines <= 15 {
        2
    } else if len_lines <= 30 {
        3
    } else if len_lines <= 50 {
        4
    } else {
        5
    }
}

fn span_lines(start_line: usize, end_line: usize) -> usize {
    end_line.saturating_sub(start_line).saturating_add(1)
}

pub fn compute_complexity(content: &str, ast: &FileAst) -> Complexity {
    let loc = count_loc(content);

    let mut max_nesting = 0u32;
    let mut cyclomatic_fraction = 0u32;

    for func in &ast.functions {
        let len = span_lines(func.start_line, func.end_line);
        max_nesting = max_nesting.max(nesting_bucket(len));
        cyclomatic_fraction += div_ceil(len, 8);
    }

    for class in &ast.classes {
        let class_nesting = class_method_nesting(class);
        max_nesting = max_nesting.max(class_nesting);
        for method in &class.methods {
            let len = span_lines(method.start_line, method.end_line);
            cyclomatic_fraction += div_ceil(len, 10);
        }
    }

    let cyclomatic = 1 + cyclomatic_fraction;

    let loc_component = cap(loc as f64 / 500.0 * 100.0);
    let nesting_component = cap(max_nesting as f64 / 6.0 * 100.0);
    let cyclomatic_component = cap(cyclomatic as f64 / 30.0 * 100.0);
    let score = (0.3 * loc_component + 0.35 * nesting_component + 0.35 * cyclomatic_component)
        .min(100.0)
        .round();

    Complexity {
        loc,
        max_nesting,
        cyclomatic,
        score,
    }
}

/// Classes add one to the maximum method nesting, per the bucket table.
fn class_method_nesting(class: &ClassRecord) -> u32 {
    let method_max = class
        .methods
        .iter()
        .map(|m| nesting_bucket(span_lines(m.start_line, m.end_line)))
        .max()
        .unwrap_or(0);
    if class.methods.is_empty() {
        nesting_bucket(span_lines(class.start_line, class.end_line))
    } else {
        method_max + 1
    }
}

fn div_ceil(value: usize, divisor: usize) -> u32 {
    ((value + divisor - 1) / divisor.max(1)) as u32
}

fn cap(value: f64) -> f64 {
    value.min(100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::FunctionRecord;

    #[test]
    fn counts_loc_ignoring_comments() {
        let content = "// header\nconst x = 1;\n/* block\n   comment */\nconst y = 2;\n\n";
        assert_eq!(count_loc(content), 2);
    }

    #[test]
    fn single_line_block_comment_ignored() {
        assert_eq!(count_loc("const x = 1; /* note */\n"), 1);
        assert_eq!(count_loc("/* just a comment */\n"), 0);
    }

    #[test]
    fn score_bounded_at_100() {
        let mut ast = FileAst::empty();
        for i in 0..50 {
            ast.functions.push(FunctionRecord {
                name: format!("f{i}"),
                start_line: i * 100,
                end_line: i * 100 + 90,
                params: vec![],
                is_async: false,
                exported: false,
                return_type: None,
            });
        }
        let content = "x\n".repeat(5000);
        let complexity = compute_complexity(&content, &ast);
        assert!(complexity.score <= 100.0);
    }
}
