//! Column/value accumulation and statement rendering for ingestion writes.
//!
//! Two renderings are supported. [`SqlMode::Parameterized`] produces sea-query
//! statements whose values are bound by the driver. [`SqlMode::LegacyLiteral`]
//! reproduces the historical literal SQL text, where single quotes inside a
//! value are removed rather than escaped. The literal form alters data and is
//! only kept for byte-exact parity with older ingestion runs.

use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, DbErr, EntityTrait, Value,
    sea_query::{Expr, ExprTrait, InsertStatement, Query, UpdateStatement},
};
use serde::{Deserialize, Serialize};

pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlMode {
    #[default]
    Parameterized,
    LegacyLiteral,
}

/// A typed value that may be null. The type is kept for null values so bound
/// parameters still match the target column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Text(Option<String>),
    Timestamp(Option<NaiveDateTime>),
}

impl SqlValue {
    /// Renders the value the way the legacy literal SQL did: booleans become the
    /// quoted tokens `'true'`/`'false'`, nulls become bare `NULL`, everything
    /// else is single-quoted with embedded single quotes removed.
    pub fn render_literal(&self) -> String {
        match self {
            SqlValue::Bool(Some(true)) => "'true'".to_string(),
            SqlValue::Bool(Some(false)) => "'false'".to_string(),
            SqlValue::Int(Some(value)) => quote_literal(&value.to_string()),
            SqlValue::Text(Some(value)) => quote_literal(value),
            SqlValue::Timestamp(Some(value)) => {
                quote_literal(&value.format(CANONICAL_TIMESTAMP_FORMAT).to_string())
            }
            _ => "NULL".to_string(),
        }
    }

    fn loses_quotes(&self) -> bool {
        matches!(self, SqlValue::Text(Some(value)) if value.contains('\''))
    }
}

/// Quotes `raw` after stripping every single quote from it.
pub fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', ""))
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(Some(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(Some(value))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        SqlValue::Int(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(Some(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        SqlValue::Text(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(Some(value))
    }
}

impl From<SqlValue> for Value {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Bool(value) => value.into(),
            SqlValue::Int(value) => value.into(),
            SqlValue::Text(value) => value.into(),
            SqlValue::Timestamp(value) => value.into(),
        }
    }
}

/// Ordered column/value pairs for one statement.
///
/// Values are never mutated in place: [`ColumnValues::extended`] returns a new
/// list so a shared base can be reused for several statements.
#[derive(Debug, Clone)]
pub struct ColumnValues<C> {
    entries: Vec<(C, SqlValue)>,
}

impl<C: ColumnTrait> Default for ColumnValues<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C: ColumnTrait> ColumnValues<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: C, value: impl Into<SqlValue>) -> Self {
        self.entries.push((column, value.into()));
        self
    }

    /// Returns a copy of `self` with `extra` appended; `self` is left untouched.
    pub fn extended<I>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (C, SqlValue)>,
    {
        let mut entries = self.entries.clone();
        entries.extend(extra);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(column, _)| column.as_str()).collect()
    }

    pub fn get(&self, column: C) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.as_str() == column.as_str())
            .map(|(_, value)| value)
    }

    pub fn insert_statement<E>(&self, entity: E) -> Result<InsertStatement, DbErr>
    where
        E: EntityTrait<Column = C>,
    {
        let mut stmt = Query::insert();
        stmt.into_table(entity)
            .columns(self.entries.iter().map(|(column, _)| *column));
        stmt.values(
            self.entries
                .iter()
                .map(|(_, value)| Value::from(value.clone()).into()),
        )
        .map_err(|err| DbErr::Custom(format!("failed to build insert: {err}")))?;
        Ok(stmt)
    }

    pub fn update_statement<E>(
        &self,
        entity: E,
        key: C,
        key_value: impl Into<SqlValue>,
    ) -> UpdateStatement
    where
        E: EntityTrait<Column = C>,
    {
        let mut stmt = Query::update();
        stmt.table(entity);
        for (column, value) in &self.entries {
            stmt.value(*column, Value::from(value.clone()));
        }
        stmt.and_where(Expr::col(key).eq(Value::from(key_value.into())));
        stmt
    }

    /// `INSERT INTO table(a,b) VALUES ('x',NULL);`
    pub fn legacy_insert_sql(&self, table: &str) -> String {
        self.warn_on_lossy_values();
        let columns = self.column_names().join(",");
        let values = self
            .entries
            .iter()
            .map(|(_, value)| value.render_literal())
            .collect::<Vec<_>>()
            .join(",");
        format!("INSERT INTO {table}({columns}) VALUES ({values});")
    }

    /// `UPDATE table SET a = 'x' WHERE key = '1';`
    pub fn legacy_update_sql(&self, table: &str, key: C, key_value: impl Into<SqlValue>) -> String {
        self.warn_on_lossy_values();
        let assignments = self
            .entries
            .iter()
            .map(|(column, value)| format!("{} = {}", column.as_str(), value.render_literal()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "UPDATE {table} SET {assignments} WHERE {} = {};",
            key.as_str(),
            key_value.into().render_literal()
        )
    }

    fn warn_on_lossy_values(&self) {
        for (column, value) in &self.entries {
            if value.loses_quotes() {
                tracing::warn!(
                    column = column.as_str(),
                    "Single quotes stripped from literal value"
                );
            }
        }
    }
}
