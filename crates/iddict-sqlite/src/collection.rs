//! JSON document collections.
//!
//! A collection is a table `(id TEXT PRIMARY KEY, data TEXT)` holding one
//! serialized entity per row. Filters are pushed to the engine through
//! `json_extract`; subset checks on list fields run in process on the
//! fetched documents.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_sqlite::{Sqlite, SqliteConnection};

use crate::error::{Result, SqliteError, is_unique_violation};

/// Maximum number of identifiers bound to a single `IN (...)` delete.
pub const DELETE_BATCH_SIZE: usize = 1000;

macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                SqlValue::Text(text) => query.bind(text.clone()),
                SqlValue::Integer(number) => query.bind(*number),
            };
        }
        query
    }};
}

#[derive(Debug, Clone, PartialEq)]
enum SqlValue {
    Text(String),
    Integer(i64),
}

/// Conjunction of conditions on document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<String>,
    values: Vec<SqlValue>,
}

impl Filter {
    /// Matches every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Row identifier equals `id`.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.clauses.push("id = ?".into());
        self.values.push(SqlValue::Text(id.to_owned()));
        self
    }

    /// Field equals `value`.
    #[must_use]
    pub fn eq(mut self, field: &'static str, value: &str) -> Self {
        self.clauses.push(format!("{} = ?", extract(field)));
        self.values.push(SqlValue::Text(value.to_owned()));
        self
    }

    /// Field equals `value` when one is given.
    #[must_use]
    pub fn eq_opt(self, field: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// Field differs from `value`; an absent field counts as different.
    #[must_use]
    pub fn ne(mut self, field: &'static str, value: &str) -> Self {
        self.clauses.push(format!("{} IS NOT ?", extract(field)));
        self.values.push(SqlValue::Text(value.to_owned()));
        self
    }

    /// Timestamp field is set and earlier than `timestamp` (unix seconds).
    #[must_use]
    pub fn before(mut self, field: &'static str, timestamp: i64) -> Self {
        self.clauses.push(format!("{} < ?", extract(field)));
        self.values.push(SqlValue::Integer(timestamp));
        self
    }

    /// Field is one of `values`. An empty list matches nothing.
    #[must_use]
    pub fn one_of(mut self, field: &'static str, values: &[String]) -> Self {
        if values.is_empty() {
            self.clauses.push("0".into());
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses
            .push(format!("{} IN ({placeholders})", extract(field)));
        self.values
            .extend(values.iter().cloned().map(SqlValue::Text));
        self
    }

    /// At least one of `branches` holds. No branches match nothing.
    #[must_use]
    pub fn any(mut self, branches: impl IntoIterator<Item = Filter>) -> Self {
        let mut alternatives = Vec::new();
        for branch in branches {
            alternatives.push(branch.condition());
            self.values.extend(branch.values);
        }
        if alternatives.is_empty() {
            self.clauses.push("0".into());
        } else {
            self.clauses.push(format!("({})", alternatives.join(" OR ")));
        }
        self
    }

    /// Field is among the non-null `selected` values of the documents of
    /// `other` that match `filter`.
    #[must_use]
    pub fn in_select(
        self,
        field: &'static str,
        other: &Collection,
        selected: &'static str,
        filter: Filter,
    ) -> Self {
        self.membership(field, "IN", other, selected, filter)
    }

    /// Negation of [`Filter::in_select`].
    #[must_use]
    pub fn not_in_select(
        self,
        field: &'static str,
        other: &Collection,
        selected: &'static str,
        filter: Filter,
    ) -> Self {
        self.membership(field, "NOT IN", other, selected, filter)
    }

    fn membership(
        mut self,
        field: &'static str,
        operator: &str,
        other: &Collection,
        selected: &'static str,
        filter: Filter,
    ) -> Self {
        // NOT IN over a list holding NULL never matches.
        let filter = filter.not_null(selected);
        self.clauses.push(format!(
            r#"{} {operator} (SELECT {} FROM "{}"{})"#,
            column(field),
            column(selected),
            other.name,
            filter.where_clause()
        ));
        self.values.extend(filter.values);
        self
    }

    fn not_null(mut self, field: &'static str) -> Self {
        self.clauses.push(format!("{} IS NOT NULL", column(field)));
        self
    }

    fn condition(&self) -> String {
        if self.clauses.is_empty() {
            "1".into()
        } else {
            format!("({})", self.clauses.join(" AND "))
        }
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn extract(field: &str) -> String {
    format!("json_extract(data, '$.{field}')")
}

/// The row identifier column for `id`, the document field otherwise.
fn column(field: &str) -> String {
    if field == "id" {
        field.to_owned()
    } else {
        extract(field)
    }
}

/// Window over the rows of a collection in insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub count: Option<usize>,
    pub offset: Option<usize>,
}

impl Page {
    #[must_use]
    pub fn new(count: Option<usize>, offset: Option<usize>) -> Self {
        Self { count, offset }
    }

    fn limit_clause(self) -> String {
        match (self.count, self.offset) {
            (None, None) => String::new(),
            // SQLite treats a negative limit as unbounded.
            (count, offset) => format!(
                " LIMIT {} OFFSET {}",
                count.map_or(-1, |c| i64::try_from(c).unwrap_or(i64::MAX)),
                offset.unwrap_or(0)
            ),
        }
    }
}

/// A named document collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    name: String,
}

impl Collection {
    /// Wraps a validated collection name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Counts the documents matching `filter`.
    pub async fn count(&self, conn: &mut SqliteConnection, filter: &Filter) -> Result<u64> {
        let sql = format!(
            r#"SELECT COUNT(*) FROM "{}"{}"#,
            self.name,
            filter.where_clause()
        );
        let count: i64 = bind_values!(query_scalar::<Sqlite, i64>(&sql), &filter.values)
            .fetch_one(&mut *conn)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Fetches the documents matching `filter` in insertion order.
    pub async fn find<T: DeserializeOwned>(
        &self,
        conn: &mut SqliteConnection,
        filter: &Filter,
        page: Page,
    ) -> Result<Vec<T>> {
        let sql = format!(
            r#"SELECT data FROM "{}"{} ORDER BY rowid{}"#,
            self.name,
            filter.where_clause(),
            page.limit_clause()
        );
        let documents: Vec<String> =
            bind_values!(query_scalar::<Sqlite, String>(&sql), &filter.values)
                .fetch_all(&mut *conn)
                .await?;

        documents
            .iter()
            .map(|document| serde_json::from_str(document).map_err(SqliteError::from))
            .collect()
    }

    /// Fetches the first document matching `filter`.
    pub async fn find_one<T: DeserializeOwned>(
        &self,
        conn: &mut SqliteConnection,
        filter: &Filter,
    ) -> Result<Option<T>> {
        let mut documents = self.find(conn, filter, Page::new(Some(1), None)).await?;
        Ok(documents.pop())
    }

    /// Returns the identifiers of the documents matching `filter`.
    pub async fn find_ids(
        &self,
        conn: &mut SqliteConnection,
        filter: &Filter,
        page: Page,
    ) -> Result<Vec<String>> {
        let sql = format!(
            r#"SELECT id FROM "{}"{} ORDER BY rowid{}"#,
            self.name,
            filter.where_clause(),
            page.limit_clause()
        );
        let ids = bind_values!(query_scalar::<Sqlite, String>(&sql), &filter.values)
            .fetch_all(&mut *conn)
            .await?;
        Ok(ids)
    }

    /// Inserts a new document.
    pub async fn insert<T: Serialize>(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        document: &T,
    ) -> Result<()> {
        let data = serde_json::to_string(document)?;
        let sql = format!(r#"INSERT INTO "{}" (id, data) VALUES (?, ?)"#, self.name);
        query::<Sqlite>(&sql)
            .bind(id)
            .bind(data)
            .execute(&mut *conn)
            .await
            .map_err(|e| self.map_write_error(e))?;
        Ok(())
    }

    /// Overwrites the document `id` if it still carries `concurrency_token`.
    ///
    /// Returns the number of replaced documents (0 or 1).
    pub async fn replace<T: Serialize>(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        concurrency_token: &str,
        document: &T,
    ) -> Result<u64> {
        let data = serde_json::to_string(document)?;
        let sql = format!(
            r#"UPDATE "{}" SET data = ? WHERE id = ? AND {} = ?"#,
            self.name,
            extract("concurrency_token")
        );
        let result = query::<Sqlite>(&sql)
            .bind(data)
            .bind(id)
            .bind(concurrency_token)
            .execute(&mut *conn)
            .await
            .map_err(|e| self.map_write_error(e))?;
        Ok(result.rows_affected())
    }

    /// Deletes the document `id` if it still carries `concurrency_token`.
    pub async fn delete_one(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        concurrency_token: &str,
    ) -> Result<u64> {
        let sql = format!(
            r#"DELETE FROM "{}" WHERE id = ? AND {} = ?"#,
            self.name,
            extract("concurrency_token")
        );
        let result = query::<Sqlite>(&sql)
            .bind(id)
            .bind(concurrency_token)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes every document matching `filter`.
    pub async fn delete_many(&self, conn: &mut SqliteConnection, filter: &Filter) -> Result<u64> {
        let sql = format!(r#"DELETE FROM "{}"{}"#, self.name, filter.where_clause());
        let result = bind_values!(query::<Sqlite>(&sql), &filter.values)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes the documents with the given identifiers, in batches.
    pub async fn delete_ids(&self, conn: &mut SqliteConnection, ids: &[String]) -> Result<u64> {
        let mut deleted = 0;
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            let placeholders = vec!["?"; batch.len()].join(", ");
            let sql = format!(
                r#"DELETE FROM "{}" WHERE id IN ({placeholders})"#,
                self.name
            );
            let mut statement = query::<Sqlite>(&sql);
            for id in batch {
                statement = statement.bind(id.as_str());
            }
            deleted += statement.execute(&mut *conn).await?.rows_affected();
        }
        Ok(deleted)
    }

    fn map_write_error(&self, err: sqlx_core::Error) -> SqliteError {
        if is_unique_violation(&err) {
            return SqliteError::conflict(format!(
                "A document with the same unique key already exists in '{}'",
                self.name
            ));
        }
        SqliteError::from(err)
    }
}
