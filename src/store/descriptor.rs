// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Store descriptors: the fixed schema a store is validated against.
//!
//! A descriptor is a plain value. It is built once through a validating
//! constructor, so a malformed store definition fails at start-up instead of
//! on the first write.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DescriptorError, StoreError};
use crate::store::Payload;

/// Uid of the in-memory store that stands in for manually supplied input.
pub const MANUAL_STORE_UID: &str = "Manual";

/// Columns every persistent store carries and the framework fills in.
pub const RESERVED_COLUMNS: [&str; 5] = [
    "rowid",
    "entry_key",
    "process_uid",
    "input_structure_uid",
    "input_data_key",
];

/// Tables the framework creates for itself. No store may take these names.
pub const RESERVED_TABLES: [&str; 1] = ["installed_processes"];

const SQL_KEYWORDS: &[&str] = &[
    "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as", "asc",
    "attach", "autoincrement", "before", "begin", "between", "by", "cascade", "case", "cast",
    "check", "collate", "column", "commit", "conflict", "constraint", "create", "cross",
    "current", "current_date", "current_time", "current_timestamp", "database", "default",
    "deferrable", "deferred", "delete", "desc", "detach", "distinct", "do", "drop", "each",
    "else", "end", "escape", "except", "exclude", "exclusive", "exists", "explain", "fail",
    "filter", "first", "following", "for", "foreign", "from", "full", "generated", "glob",
    "group", "groups", "having", "if", "ignore", "immediate", "in", "index", "indexed",
    "initially", "inner", "insert", "instead", "intersect", "into", "is", "isnull", "join",
    "key", "last", "left", "like", "limit", "match", "materialized", "natural", "no", "not",
    "nothing", "notnull", "null", "nulls", "of", "offset", "on", "or", "order", "others",
    "outer", "over", "partition", "plan", "pragma", "preceding", "primary", "query", "raise",
    "range", "recursive", "references", "regexp", "reindex", "release", "rename", "replace",
    "restrict", "returning", "right", "rollback", "row", "rows", "savepoint", "select", "set",
    "table", "temp", "temporary", "then", "ties", "to", "transaction", "trigger", "unbounded",
    "union", "unique", "update", "using", "vacuum", "values", "view", "virtual", "when", "where",
    "window", "with", "without",
];

/// Storage type of a payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    /// Any JSON value, stored as its serialized text
    Json,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Json => "TEXT",
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Boolean => "boolean",
            ColumnType::Json => "json",
        }
    }

    /// Whether `value` can be stored in a column of this type. `null` is
    /// always accepted here; required-ness is checked separately.
    ///
    /// `Real` takes only JSON floats: an integer would come back as a float
    /// and no longer compare equal to what was written.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Json, _) => true,
            (ColumnType::Text, Value::String(_)) => true,
            (ColumnType::Integer, Value::Number(n)) => n.is_i64(),
            (ColumnType::Real, Value::Number(n)) => n.is_f64(),
            (ColumnType::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// One payload column of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub required: bool,
    pub unique: bool,
}

impl ColumnSpec {
    pub fn required(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: true,
            unique: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            required: false,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Name, schema and content-addressing policy of a store.
///
/// The uid doubles as the table name, so it must be a valid SQL identifier.
/// The Manual store is the only exception and is never materialized as a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDescriptor {
    uid: String,
    columns: Vec<ColumnSpec>,
    content_column: Option<String>,
    manual: bool,
}

impl StoreDescriptor {
    /// Build and validate a persistent store descriptor.
    ///
    /// # Errors
    /// * `InvalidIdentifier` if the store or a column name is not `[a-z_][a-z0-9_]*`
    /// * `ReservedIdentifier` if a name is an SQL keyword or the store name is a framework table
    /// * `ReservedColumn` if a column shadows a framework-managed column
    /// * `DuplicateColumn` if a column is declared twice
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Result<Self, DescriptorError> {
        let uid = name.into();
        validate_sql_name(&uid)?;
        if RESERVED_TABLES.contains(&uid.as_str()) {
            return Err(DescriptorError::ReservedIdentifier { name: uid });
        }

        let mut seen = Vec::with_capacity(columns.len());
        for column in &columns {
            validate_sql_name(&column.name)?;
            if RESERVED_COLUMNS.contains(&column.name.as_str()) {
                return Err(DescriptorError::ReservedColumn {
                    store: uid,
                    column: column.name.clone(),
                });
            }
            if seen.contains(&column.name.as_str()) {
                return Err(DescriptorError::DuplicateColumn {
                    store: uid,
                    column: column.name.clone(),
                });
            }
            seen.push(column.name.as_str());
        }

        Ok(Self {
            uid,
            columns,
            content_column: None,
            manual: false,
        })
    }

    /// Mark `column` as the content-hash column. Two entries with the same
    /// value in it are the same object, so the column becomes unique.
    pub fn content_addressed(mut self, column: &str) -> Result<Self, DescriptorError> {
        let spec = self
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| DescriptorError::UnknownContentColumn {
                store: self.uid.clone(),
                column: column.to_string(),
            })?;
        spec.unique = true;
        spec.required = true;
        self.content_column = Some(column.to_string());
        Ok(self)
    }

    /// Descriptor of the ephemeral Manual store. It has no schema: any
    /// non-empty payload is accepted.
    pub fn manual() -> Self {
        Self {
            uid: MANUAL_STORE_UID.to_string(),
            columns: Vec::new(),
            content_column: None,
            manual: true,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn content_column(&self) -> Option<&str> {
        self.content_column.as_deref()
    }

    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name.as_str())
    }

    /// Check a payload about to be inserted.
    pub fn validate_create(&self, data: &Payload) -> Result<(), StoreError> {
        let mut missing: Vec<String> = self
            .required_fields()
            .filter(|name| data.get(*name).map_or(true, Value::is_null))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(StoreError::MissingField {
                store: self.uid.clone(),
                fields: missing,
            });
        }
        self.validate_fields(data)
    }

    /// Check a partial update. Absent required columns are fine, nulling one is not.
    pub fn validate_update(&self, updates: &Payload) -> Result<(), StoreError> {
        self.validate_fields(updates)?;
        let mut nulled: Vec<String> = updates
            .iter()
            .filter(|(name, value)| value.is_null() && self.column(name).is_some_and(|c| c.required))
            .map(|(name, _)| name.clone())
            .collect();
        if !nulled.is_empty() {
            nulled.sort();
            return Err(StoreError::MissingField {
                store: self.uid.clone(),
                fields: nulled,
            });
        }
        Ok(())
    }

    fn validate_fields(&self, data: &Payload) -> Result<(), StoreError> {
        for (name, value) in data {
            if RESERVED_COLUMNS.contains(&name.as_str()) {
                return Err(StoreError::ReservedField {
                    store: self.uid.clone(),
                    column: name.clone(),
                });
            }
            let column = self.column(name).ok_or_else(|| StoreError::UnknownColumn {
                store: self.uid.clone(),
                column: name.clone(),
            })?;
            if !column.ty.accepts(value) {
                return Err(StoreError::TypeMismatch {
                    store: self.uid.clone(),
                    column: name.clone(),
                    expected: column.ty.name(),
                    found: json_kind(value).to_string(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_identifier(name: &str) -> Result<(), DescriptorError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DescriptorError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// A valid identifier that can also name a table or column unquoted.
fn validate_sql_name(name: &str) -> Result<(), DescriptorError> {
    validate_identifier(name)?;
    if name.starts_with("sqlite_") || SQL_KEYWORDS.contains(&name) {
        return Err(DescriptorError::ReservedIdentifier {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "real",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
