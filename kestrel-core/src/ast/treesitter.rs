//! TypeScript/TSX/JavaScript/JSX extraction via `tree-sitter`.
//!
//! Traversal only descends into top-level declarations: function-shaped
//! variable bindings become functions, exports attached to a declaration
//! emit both records, classes report method visibility/static/async and
//! literal `extends`/`implements`.

use tree_sitter::{Node, Parser, Tree};

use crate::ast::language::SourceLanguage;
use crate::model::ast::{
    ClassRecord, ExportKind, ExportRecord, FileAst, FunctionRecord, ImportClassification,
    ImportRecord, InterfaceRecord, MethodRecord, PropertyRecord, TypeAliasRecord, Visibility,
};

/// Parses `source` as `language` and extracts a [`FileAst`].
///
/// On a library-level parse failure (not a syntax error node, an actual
/// exception-equivalent — e.g. the parser returning no tree) a fully empty
/// AST is returned with the failure recorded as the parse-error message.
pub fn extract(source: &str, language: SourceLanguage) -> FileAst {
    let Some(mut parser) = make_parser(language) else {
        return FileAst::empty();
    };

    let Some(tree) = parser.parse(source, None) else {
        return FileAst::with_parse_error("tree-sitter failed to produce a parse tree");
    };

    let root = tree.root_node();
    let mut ast = FileAst::empty();

    if root.has_error() {
        ast.parse_error = true;
        ast.parse_error_message = Some(describe_first_error(&tree, source));
    }

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        visit_top_level(child, source, &mut ast);
    }

    ast
}

fn make_parser(language: SourceLanguage) -> Option<Parser> {
    let mut parser = Parser::new();
    let lang: tree_sitter::Language = match language {
        SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        SourceLanguage::JavaScript | SourceLanguage::Jsx => {
            tree_sitter_javascript::LANGUAGE.into()
        }
        SourceLanguage::Json | SourceLanguage::Yaml | SourceLanguage::Other => return None,
    };
    parser.set_language(&lang).ok()?;
    Some(parser)
}

fn describe_first_error(tree: &Tree, source: &str) -> String {
    let mut cursor = tree.root_node().walk();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let line = node.start_position().row + 1;
            let text = node_text(node, source);
            return format!("syntax error near line {line}: {text}");
        }
        stack.extend(node.named_children(&mut cursor));
    }
    "syntax error".to_string()
}

fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or_default()
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn end_line_of(node: Node) -> usize {
    node.end_position().row + 1
}

fn visit_top_level(node: Node, source: &str, ast: &mut FileAst) {
    match node.kind() {
        "import_statement" => extract_import(node, source, ast),
        "export_statement" => extract_export(node, source, ast),
        "function_declaration" => {
            if let Some(func) = function_from_declaration(node, source, false) {
                ast.functions.push(func);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            extract_function_shaped_bindings(node, source, false, ast);
        }
        "class_declaration" => {
            if let Some(class) = class_from_declaration(node, source, false) {
                ast.classes.push(class);
            }
        }
        "interface_declaration" => {
            if let Some(iface) = interface_from_declaration(node, source, false) {
                ast.interfaces.push(iface);
            }
        }
        "type_alias_declaration" => {
            if let Some(alias) = type_alias_from_declaration(node, source, false) {
                ast.type_aliases.push(alias);
            }
        }
        _ => {}
    }
}

fn extract_import(node: Node, source: &str, ast: &mut FileAst) {
    let line = line_of(node);
    let module = node
        .child_by_field_name("source")
        .map(|n| strip_quotes(node_text(n, source)))
        .unwrap_or_default();
    let classification = classify_module(&module);

    let Some(clause) = node.child(1).filter(|n| n.kind() == "import_clause") else {
        return;
    };

    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        match child.kind() {
            "identifier" => ast.imports.push(ImportRecord {
                name: node_text(child, source).to_string(),
                module: module.clone(),
                line,
                classification,
                is_default: true,
            }),
            "named_imports" => {
                let mut inner_cursor = child.walk();
                for spec in child.named_children(&mut inner_cursor) {
                    if spec.kind() == "import_specifier" {
                        if let Some(name_node) = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                        {
                            ast.imports.push(ImportRecord {
                                name: node_text(name_node, source).to_string(),
                                module: module.clone(),
                                line,
                                classification,
                                is_default: false,
                            });
                        }
                    }
                }
            }
            "namespace_import" => {
                if let Some(name_node) = child.named_child(0) {
                    ast.imports.push(ImportRecord {
                        name: node_text(name_node, source).to_string(),
                        module: module.clone(),
                        line,
                        classification,
                        is_default: false,
                    });
                }
            }
            _ => {}
        }
    }
}

fn classify_module(module: &str) -> ImportClassification {
    if module.starts_with('.') || module.starts_with('/') {
        ImportClassification::Internal
    } else if is_builtin_module(module) {
        ImportClassification::Builtin
    } else {
        ImportClassification::External
    }
}

fn is_builtin_module(module: &str) -> bool {
    const BUILTINS: &[&str] = &[
        "fs", "path", "os", "util", "events", "stream", "http", "https", "crypto", "child_process",
        "url", "assert", "buffer", "process", "node:fs", "node:path", "node:os",
    ];
    BUILTINS.contains(&module)
}

fn strip_quotes(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

fn extract_export(node: Node, source: &str, ast: &mut FileAst) {
    let line = line_of(node);
    let is_default = node_text(node, source).contains("export default");

    // `export { a, b as c }` (and `export * from "m"`) with no attached
    // declaration: emit variable export records for each named binding.
    if let Some(clause) = node.child_by_field_name("declaration") {
        extract_export_with_declaration(clause, source, ast, is_default);
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "export_clause" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "export_specifier" {
                        if let Some(name_node) = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"))
                        {
                            ast.exports.push(ExportRecord {
                                name: node_text(name_node, source).to_string(),
                                line,
                                is_default: false,
                                kind: ExportKind::Variable,
                            });
                        }
                    }
                }
            }
            "identifier" if is_default => {
                ast.exports.push(ExportRecord {
                    name: node_text(child, source).to_string(),
                    line,
                    is_default: true,
                    kind: ExportKind::Variable,
                });
            }
            _ => {}
        }
    }
}

fn extract_export_with_declaration(decl: Node, source: &str, ast: &mut FileAst, is_default: bool) {
    match decl.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(mut func) = function_from_declaration(decl, source, true) {
                func.exported = true;
                ast.exports.push(ExportRecord {
                    name: func.name.clone(),
                    line: func.start_line,
                    is_default,
                    kind: ExportKind::Function,
                });
                ast.functions.push(func);
            }
        }
        "class_declaration" => {
            if let Some(mut class) = class_from_declaration(decl, source, true) {
                class.exported = true;
                ast.exports.push(ExportRecord {
                    name: class.name.clone(),
                    line: class.start_line,
                    is_default,
                    kind: ExportKind::Class,
                });
                ast.classes.push(class);
            }
        }
        "lexical_declaration" | "variable_declaration" => {
            extract_function_shaped_bindings(decl, source, true, ast);
        }
        "interface_declaration" => {
            if let Some(mut iface) = interface_from_declaration(decl, source, true) {
                iface.exported = true;
                ast.exports.push(ExportRecord {
                    name: iface.name.clone(),
                    line: iface.start_line,
                    is_default,
                    kind: ExportKind::Interface,
                });
                ast.interfaces.push(iface);
            }
        }
        "type_alias_declaration" => {
            if let Some(mut alias) = type_alias_from_declaration(decl, source, true) {
                alias.exported = true;
                ast.exports.push(ExportRecord {
                    name: alias.name.clone(),
                    line: alias.line,
                    is_default,
                    kind: ExportKind::Type,
                });
                ast.type_aliases.push(alias);
            }
        }
        _ => {}
    }
}

fn function_from_declaration(node: Node, source: &str, exported: bool) -> Option<FunctionRecord> {
    let name_node = node.child_by_field_name("name")?;
    Some(FunctionRecord {
        name: node_text(name_node, source).to_string(),
        start_line: line_of(node),
        end_line: end_line_of(node),
        params: extract_params(node, source),
        is_async: node_text(node, source).trim_start().starts_with("async"),
        exported,
        return_type: node
            .child_by_field_name("return_type")
            .map(|n| node_text(n, source).trim_start_matches(':').trim().to_string()),
    })
}

fn extract_params(node: Node, source: &str) -> Vec<String> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|p| {
            let name = p
                .child_by_field_name("pattern")
                .or_else(|| p.named_child(0))
                .unwrap_or(p);
            Some(node_text(name, source).to_string())
        })
        .collect()
}

/// Walks `let`/`const`/`var` declarators, emitting a [`FunctionRecord`] for
/// any binding whose initializer is an arrow function or function
/// expression, per the function-shaped-variable-binding policy.
fn extract_function_shaped_bindings(node: Node, source: &str, exported: bool, ast: &mut FileAst) {
    let mut cursor = node.walk();
    for declarator in node.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        let Some(value) = declarator.child_by_field_name("value") else {
            continue;
        };
        if matches!(value.kind(), "arrow_function" | "function_expression") {
            let func = FunctionRecord {
                name: node_text(name_node, source).to_string(),
                start_line: line_of(declarator),
                end_line: end_line_of(value),
                params: extract_params(value, source),
                is_async: node_text(value, source).trim_start().starts_with("async"),
                exported,
                return_type: value
                    .child_by_field_name("return_type")
                    .map(|n| node_text(n, source).trim_start_matches(':').trim().to_string()),
            };
            if exported {
                ast.exports.push(ExportRecord {
                    name: func.name.clone(),
                    line: func.start_line,
                    is_default: false,
                    kind: ExportKind::Function,
                });
            }
            ast.functions.push(func);
        }
    }
}

fn class_from_declaration(node: Node, source: &str, _exported: bool) -> Option<ClassRecord> {
    let name_node = node.child_by_field_name("name")?;
    let mut extends = None;
    let mut implements = Vec::new();
    if let Some(heritage) = node.child_by_field_name("heritage") {
        collect_heritage(heritage, source, &mut extends, &mut implements);
    } else {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if matches!(child.kind(), "class_heritage") {
                collect_heritage(child, source, &mut extends, &mut implements);
            }
        }
    }

    let mut methods = Vec::new();
    let mut properties = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_definition" => {
                    if let Some(m) = method_from_node(member, source) {
                        methods.push(m);
                    }
                }
                "public_field_definition" | "field_definition" => {
                    if let Some(name_node) = member.child_by_field_name("property") {
                        properties.push(PropertyRecord {
                            name: node_text(name_node, source).to_string(),
                            line: line_of(member),
                            visibility: visibility_of(member, source),
                        });
                    }
                }
                _ => {}
            }
        }
    }

    let text = node_text(node, source);
    Some(ClassRecord {
        name: node_text(name_node, source).to_string(),
        start_line: line_of(node),
        end_line: end_line_of(node),
        methods,
        properties,
        extends,
        implements,
        exported: false,
        is_abstract: text.trim_start().starts_with("abstract"),
    })
}

fn collect_heritage(
    heritage: Node,
    source: &str,
    extends: &mut Option<String>,
    implements: &mut Vec<String>,
) {
    let mut cursor = heritage.walk();
    for clause in heritage.named_children(&mut cursor) {
        match clause.kind() {
            "extends_clause" => {
                if let Some(value) = clause.named_child(0) {
                    *extends = Some(node_text(value, source).to_string());
                }
            }
            "implements_clause" => {
                let mut inner = clause.walk();
                for t in clause.named_children(&mut inner) {
                    implements.push(node_text(t, source).to_string());
                }
            }
            _ => {}
        }
    }
}

fn method_from_node(node: Node, source: &str) -> Option<MethodRecord> {
    let name_node = node.child_by_field_name("name")?;
    let text = node_text(node, source);
    Some(MethodRecord {
        name: node_text(name_node, source).to_string(),
        start_line: line_of(node),
        end_line: end_line_of(node),
        visibility: visibility_of(node, source),
        is_static: text.trim_start().starts_with("static"),
        is_async: text.contains("async "),
    })
}

fn visibility_of(node: Node, source: &str) -> Visibility {
    let text = node_text(node, source);
    if text.contains("private ") {
        Visibility::Private
    } else if text.contains("protected ") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

fn interface_from_declaration(node: Node, source: &str, _exported: bool) -> Option<InterfaceRecord> {
    let name_node = node.child_by_field_name("name")?;
    let mut extends = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "extends_type_clause" {
            let mut inner = child.walk();
            for t in child.named_children(&mut inner) {
                extends.push(node_text(t, source).to_string());
            }
        }
    }
    Some(InterfaceRecord {
        name: node_text(name_node, source).to_string(),
        start_line: line_of(node),
        end_line: end_line_of(node),
        extends,
        exported: false,
    })
}

fn type_alias_from_declaration(node: Node, source: &str, _exported: bool) -> Option<TypeAliasRecord> {
    let name_node = node.child_by_field_name("name")?;
    Some(TypeAliasRecord {
        name: node_text(name_node, source).to_string(),
        line: line_of(node),
        exported: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_exported_function() {
        let ast = extract(
            "export function add(a: number, b: number): number {\n  return a + b;\n}\n",
            SourceLanguage::TypeScript,
        );
        assert_eq!(ast.functions.len(), 1);
        assert_eq!(ast.functions[0].name, "add");
        assert!(ast.functions[0].exported);
        assert_eq!(ast.exports.len(), 1);
        assert_eq!(ast.exports[0].kind, ExportKind::Function);
        assert!(!ast.parse_error);
    }

    #[test]
    fn arrow_function_binding_becomes_function_record() {
        let ast = extract(
            "const double = (x: number) => x * 2;\n",
            SourceLanguage::TypeScript,
        );
        assert_eq!(ast.functions.len(), 1);
        assert_eq!(ast.functions[0].name, "double");
        assert!(ast.classes.is_empty());
    }

    #[test]
    fn classifies_imports() {
        let ast = extract(
            "import fs from 'fs';\nimport { helper } from './util';\nimport lodash from 'lodash';\n",
            SourceLanguage::TypeScript,
        );
        assert_eq!(ast.imports.len(), 3);
        assert_eq!(ast.imports[0].classification, ImportClassification::Builtin);
        assert_eq!(ast.imports[1].classification, ImportClassification::Internal);
        assert_eq!(ast.imports[2].classification, ImportClassification::External);
    }

    #[test]
    fn class_reports_heritage_and_method_flags() {
        let ast = extract(
            "export class Widget extends Base implements Drawable {\n  private async render() {}\n  static create() {}\n}\n",
            SourceLanguage::TypeScript,
        );
        assert_eq!(ast.classes.len(), 1);
        let class = &ast.classes[0];
        assert_eq!(class.extends.as_deref(), Some("Base"));
        assert_eq!(class.implements, vec!["Drawable".to_string()]);
        assert!(class.exported);
        let render = class.methods.iter().find(|m| m.name == "render").unwrap();
        assert_eq!(render.visibility, Visibility::Private);
        assert!(render.is_async);
        let create = class.methods.iter().find(|m| m.name == "create").unwrap();
        assert!(create.is_static);
    }

    #[test]
    fn syntax_error_sets_parse_error_flag() {
        let ast = extract("function broken( {\n", SourceLanguage::TypeScript);
        assert!(ast.parse_error);
        assert!(ast.parse_error_message.is_some());
    }

    #[test]
    fn bare_export_clause_emits_variable_exports() {
        let ast = extract("const x = 1;\nexport { x };\n", SourceLanguage::TypeScript);
        assert!(
            ast.exports
                .iter()
                .any(|e| e.name == "x" && e.kind == ExportKind::Variable)
        );
    }
}
