// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::store::{StoreDescriptor, RESERVED_COLUMNS};

/// SQL view of a store descriptor: table DDL and the column lists queries use.
///
/// All identifiers come from a validated [`StoreDescriptor`], so they can be
/// interpolated into statements.
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: String,
    payload_columns: Vec<String>,
    select_list: String,
}

impl TableSchema {
    pub fn new(descriptor: &StoreDescriptor) -> Self {
        let payload_columns: Vec<String> =
            descriptor.columns().iter().map(|c| c.name.clone()).collect();
        let select_list = RESERVED_COLUMNS[1..]
            .iter()
            .map(|c| c.to_string())
            .chain(payload_columns.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            table: descriptor.uid().to_string(),
            payload_columns,
            select_list,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns fetched for every entry, in a fixed order.
    pub fn select_list(&self) -> &str {
        &self.select_list
    }

    pub fn create_statements(descriptor: &StoreDescriptor) -> Vec<String> {
        let table = descriptor.uid();
        let mut columns = vec![
            "rowid INTEGER PRIMARY KEY AUTOINCREMENT".to_string(),
            "entry_key TEXT NOT NULL UNIQUE".to_string(),
            "process_uid TEXT NOT NULL".to_string(),
            "input_structure_uid TEXT".to_string(),
            "input_data_key TEXT".to_string(),
        ];
        for column in descriptor.columns() {
            let unique = if column.unique { " UNIQUE" } else { "" };
            columns.push(format!("{} {}{}", column.name, column.ty.sql_type(), unique));
        }

        vec![
            format!("CREATE TABLE IF NOT EXISTS {} ({})", table, columns.join(", ")),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_input_data_key ON {table} (input_data_key)"
            ),
        ]
    }

    /// Every column the table must have on disk.
    pub fn expected_columns(&self) -> Vec<&str> {
        RESERVED_COLUMNS
            .iter()
            .copied()
            .chain(self.payload_columns.iter().map(String::as_str))
            .collect()
    }

    pub fn insert_statement(&self) -> String {
        let columns: Vec<&str> = RESERVED_COLUMNS[1..]
            .iter()
            .copied()
            .chain(self.payload_columns.iter().map(String::as_str))
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ColumnSpec, ColumnType};

    fn hashes() -> StoreDescriptor {
        StoreDescriptor::new(
            "hashes",
            vec![
                ColumnSpec::required("digest", ColumnType::Text),
                ColumnSpec::optional("size", ColumnType::Integer),
            ],
        )
        .unwrap()
        .content_addressed("digest")
        .unwrap()
    }

    #[test]
    fn test_create_statement_marks_content_column_unique() {
        let statements = TableSchema::create_statements(&hashes());
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS hashes ("));
        assert!(statements[0].contains("digest TEXT UNIQUE"));
        assert!(statements[0].contains("size INTEGER"));
        assert!(statements[1].contains("ON hashes (input_data_key)"));
    }

    #[test]
    fn test_insert_statement_placeholders() {
        let schema = TableSchema::new(&hashes());
        assert_eq!(
            schema.insert_statement(),
            "INSERT INTO hashes (entry_key, process_uid, input_structure_uid, input_data_key, digest, size) VALUES (?, ?, ?, ?, ?, ?)"
        );
        assert_eq!(
            schema.select_list(),
            "entry_key, process_uid, input_structure_uid, input_data_key, digest, size"
        );
    }
}
