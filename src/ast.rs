//! This module defines abstract syntax tree (AST) types for SQL.

use enum_as_inner::EnumAsInner;

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum SelItem {
    Star,
    ColName(String),
}

impl std::fmt::Display for SelItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelItem::Star => "*".fmt(f),
            SelItem::ColName(x) => x.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub items: Vec<SelItem>,
    pub tablename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColDef {
    pub name: String,
    pub coltype: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStatement {
    pub tablename: String,
    pub coldefs: Vec<ColDef>,
}
