//! Per-file structural summary produced by the AST extractor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportClassification {
    Internal,
    External,
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub name: String,
    pub module: String,
    pub line: usize,
    pub classification: ImportClassification,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    Function,
    Class,
    Variable,
    Type,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    pub line: usize,
    pub is_default: bool,
    pub kind: ExportKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub params: Vec<String>,
    pub is_async: bool,
    pub exported: bool,
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    pub line: usize,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub methods: Vec<MethodRecord>,
    pub properties: Vec<PropertyRecord>,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub exported: bool,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub extends: Vec<String>,
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAliasRecord {
    pub name: String,
    pub line: usize,
    pub exported: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAst {
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
    pub interfaces: Vec<InterfaceRecord>,
    pub type_aliases: Vec<TypeAliasRecord>,
    pub parse_error: bool,
    pub parse_error_message: Option<String>,
}

impl FileAst {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_parse_error(message: impl Into<String>) -> Self {
        Self {
            parse_error: true,
            parse_error_message: Some(message.into()),
            ..Default::default()
        }
    }
}
