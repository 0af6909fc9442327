//! Mapping from symbol name to every place it is defined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ast::{ClassRecord, FileAst, FunctionRecord, InterfaceRecord, TypeAliasRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    TypeAlias,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub path: String,
    pub line: usize,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolIndex {
    definitions: BTreeMap<String, Vec<SymbolDefinition>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, symbol: &str) -> &[SymbolDefinition] {
        self.definitions
            .get(symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn remove_file(&mut self, path: &str) {
        for defs in self.definitions.values_mut() {
            defs.retain(|d| d.path != path);
        }
        self.definitions.retain(|_, defs| !defs.is_empty());
    }

    /// (Re-)indexes every symbol defined in `path` given its AST, replacing
    /// any prior definitions from that path.
    pub fn index_file(&mut self, path: &str, ast: &FileAst) {
        self.remove_file(path);

        for func in &ast.functions {
            self.insert(path, func, SymbolKind::Function);
        }
        for class in &ast.classes {
            self.insert(path, class, SymbolKind::Class);
        }
        for iface in &ast.interfaces {
            self.insert(path, iface, SymbolKind::Interface);
        }
        for alias in &ast.type_aliases {
            self.insert_at(path, &alias.name, alias.line, SymbolKind::TypeAlias);
        }
    }

    fn insert(&mut self, path: &str, named: &impl NamedAt, kind: SymbolKind) {
        self.insert_at(path, named.name(), named.line(), kind);
    }

    fn insert_at(&mut self, path: &str, name: &str, line: usize, kind: SymbolKind) {
        self.definitions
            .entry(name.to_string())
            .or_default()
            .push(SymbolDefinition {
                path: path.to_string(),
                line,
                kind,
            });
    }
}

trait NamedAt {
    fn name(&self) -> &str;
    fn line(&self) -> usize;
}

impl NamedAt for FunctionRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn line(&self) -> usize {
        self.start_line
    }
}

impl NamedAt for ClassRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn line(&self) -> usize {
        self.start_line
    }
}

impl NamedAt for InterfaceRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn line(&self) -> usize {
        self.start_line
    }
}
