// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::errors::StoreError;
use crate::observability::messages::store::{EntryCreated, SchemaMismatchDetected, SchemaVerified};
use crate::observability::messages::StructuredLog;
use crate::store::{
    random_entry_key, unique_entry_key, ColumnSpec, ColumnType, DataStore, Entry, Payload,
    Provenance, StoreDescriptor, TableSchema, RESERVED_COLUMNS,
};
use crate::traits::ProcessDescriptor;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Encode an already validated payload value for `ty`.
    fn encode(ty: ColumnType, value: &Value) -> Self {
        match (ty, value) {
            (_, Value::Null) => SqlValue::Null,
            (ColumnType::Integer, Value::Number(n)) => n.as_i64().map_or(SqlValue::Null, SqlValue::Integer),
            (ColumnType::Real, Value::Number(n)) => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            (ColumnType::Boolean, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
            (ColumnType::Text, Value::String(s)) => SqlValue::Text(s.clone()),
            (_, other) => SqlValue::Text(other.to_string()),
        }
    }

    fn bind(self, query: SqliteQuery<'_>) -> SqliteQuery<'_> {
        match self {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(v),
            SqlValue::Real(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
        }
    }
}

/// Store backed by one SQLite table named after the store uid.
pub struct SqliteStore {
    descriptor: StoreDescriptor,
    schema: TableSchema,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create the table if needed and verify the columns on disk.
    ///
    /// A table created by an older schema that lacks declared columns is a
    /// `SchemaMismatch`; extra columns on disk are tolerated.
    pub async fn open(pool: SqlitePool, descriptor: StoreDescriptor) -> Result<Self, StoreError> {
        for statement in TableSchema::create_statements(&descriptor) {
            sqlx::query(&statement).execute(&pool).await?;
        }

        let schema = TableSchema::new(&descriptor);
        let pragma = format!("PRAGMA table_info({})", schema.table());
        let rows = sqlx::query(&pragma).fetch_all(&pool).await?;
        let existing: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()?;

        let missing: Vec<String> = schema
            .expected_columns()
            .into_iter()
            .filter(|c| !existing.iter().any(|e| e == c))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            SchemaMismatchDetected {
                store: descriptor.uid(),
                missing: &missing,
            }
            .log();
            return Err(StoreError::SchemaMismatch {
                store: descriptor.uid().to_string(),
                missing,
            });
        }

        SchemaVerified {
            store: descriptor.uid(),
            column_count: existing.len(),
        }
        .log();

        Ok(Self {
            descriptor,
            schema,
            pool,
        })
    }

    fn decode_row(&self, row: &SqliteRow) -> Result<Entry, StoreError> {
        let mut data = Payload::new();
        for column in self.descriptor.columns() {
            if let Some(value) = self.decode_column(column, row)? {
                data.insert(column.name.clone(), value);
            }
        }

        Ok(Entry {
            entry_key: row.try_get("entry_key")?,
            provenance: Provenance {
                process_uid: row.try_get("process_uid")?,
                input_structure_uid: row.try_get("input_structure_uid")?,
                input_data_key: row.try_get("input_data_key")?,
            },
            data,
        })
    }

    fn decode_column(&self, column: &ColumnSpec, row: &SqliteRow) -> Result<Option<Value>, StoreError> {
        let name = column.name.as_str();
        let value = match column.ty {
            ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            ColumnType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            ColumnType::Real => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            ColumnType::Boolean => row.try_get::<Option<i64>, _>(name)?.map(|v| Value::Bool(v != 0)),
            ColumnType::Json => match row.try_get::<Option<String>, _>(name)? {
                Some(text) => Some(serde_json::from_str(&text).map_err(|source| {
                    StoreError::CorruptValue {
                        store: self.descriptor.uid().to_string(),
                        column: column.name.clone(),
                        source,
                    }
                })?),
                None => None,
            },
        };
        Ok(value)
    }

    /// SQLite reports unique violations as `UNIQUE constraint failed: <table>.<column>`.
    fn write_error(&self, error: sqlx::Error) -> StoreError {
        match error {
            sqlx::Error::Database(e) if e.is_unique_violation() => StoreError::DuplicateValue {
                store: self.descriptor.uid().to_string(),
                column: e.message().rsplit('.').next().unwrap_or_default().to_string(),
            },
            other => other.into(),
        }
    }

    /// Encode a lookup value for `column`, rejecting undeclared columns.
    fn lookup_value(&self, column: &str, value: &Value) -> Result<SqlValue, StoreError> {
        if RESERVED_COLUMNS.contains(&column) {
            return Ok(match value {
                Value::String(s) => SqlValue::Text(s.clone()),
                Value::Null => SqlValue::Null,
                other => SqlValue::encode(ColumnType::Integer, other),
            });
        }

        let spec = self
            .descriptor
            .column(column)
            .ok_or_else(|| StoreError::UnknownColumn {
                store: self.descriptor.uid().to_string(),
                column: column.to_string(),
            })?;
        Ok(SqlValue::encode(spec.ty, value))
    }

    async fn fetch_one_where(&self, column: &str, value: SqlValue) -> Result<Option<Entry>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY rowid LIMIT 1",
            self.schema.select_list(),
            self.schema.table(),
            column
        );
        let row = value.bind(sqlx::query(&sql)).fetch_optional(&self.pool).await?;
        row.map(|r| self.decode_row(&r)).transpose()
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    async fn create_entry(
        &self,
        data: Payload,
        process: &ProcessDescriptor,
        input_store: Option<&StoreDescriptor>,
        input_key: Option<&str>,
    ) -> Result<String, StoreError> {
        self.descriptor.validate_create(&data)?;

        let entry_key = unique_entry_key(self, random_entry_key).await?;
        let provenance = Provenance::new(process, input_store, input_key);

        let sql = self.schema.insert_statement();
        let mut query = sqlx::query(&sql)
            .bind(entry_key.clone())
            .bind(provenance.process_uid.clone())
            .bind(provenance.input_structure_uid.clone())
            .bind(provenance.input_data_key.clone());
        for column in self.descriptor.columns() {
            let value = data
                .get(&column.name)
                .map_or(SqlValue::Null, |v| SqlValue::encode(column.ty, v));
            query = value.bind(query);
        }
        query
            .execute(&self.pool)
            .await
            .map_err(|e| self.write_error(e))?;

        EntryCreated {
            store: self.descriptor.uid(),
            entry_key: &entry_key,
            process_uid: &provenance.process_uid,
        }
        .log();

        Ok(entry_key)
    }

    async fn read_by_entry_key(&self, entry_key: &str) -> Result<Option<Entry>, StoreError> {
        self.fetch_one_where("entry_key", SqlValue::Text(entry_key.to_string()))
            .await
    }

    async fn read_by_input_key(&self, input_key: &str) -> Result<Option<Entry>, StoreError> {
        self.fetch_one_where("input_data_key", SqlValue::Text(input_key.to_string()))
            .await
    }

    async fn read(&self, column: &str, value: &Value) -> Result<Option<Entry>, StoreError> {
        let value = self.lookup_value(column, value)?;
        self.fetch_one_where(column, value).await
    }

    async fn update(&self, entry_key: &str, updates: Payload) -> Result<Entry, StoreError> {
        self.descriptor.validate_update(&updates)?;

        if !updates.is_empty() {
            let assignments: Vec<String> = updates.keys().map(|c| format!("{} = ?", c)).collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE entry_key = ?",
                self.schema.table(),
                assignments.join(", ")
            );
            let mut query = sqlx::query(&sql);
            for (name, value) in &updates {
                let ty = self
                    .descriptor
                    .column(name)
                    .map_or(ColumnType::Json, |c| c.ty);
                query = SqlValue::encode(ty, value).bind(query);
            }
            let result = query
                .bind(entry_key.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| self.write_error(e))?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found(self.uid(), "entry_key", entry_key));
            }
        }

        self.expect_entry(entry_key).await
    }

    async fn delete(&self, entry_key: &str) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE entry_key = ?", self.schema.table());
        let result = sqlx::query(&sql)
            .bind(entry_key.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(self.uid(), "entry_key", entry_key));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Entry>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            self.schema.select_list(),
            self.schema.table()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|r| self.decode_row(r)).collect()
    }

    async fn fetch_all_entry_keys(&self) -> Result<Vec<String>, StoreError> {
        let sql = format!("SELECT entry_key FROM {} ORDER BY rowid", self.schema.table());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("entry_key").map_err(StoreError::from))
            .collect()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.schema.table());
        let total: i64 = sqlx::query(&sql).fetch_one(&self.pool).await?.try_get("total")?;
        Ok(usize::try_from(total).unwrap_or_default())
    }
}
