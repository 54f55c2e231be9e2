//! Document repository for database operations

use super::{map_write_error, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docvault_shared::{CreateDocumentRequest, Document, UpdateDocumentRequest};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Listing filters. Empty strings are treated as absent by the service.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Case-insensitive substring of number, title or lookup
    pub search: Option<String>,
    pub project: Option<String>,
    pub discipline: Option<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One page ordered by creation time, plus the total matching count
    async fn list(
        &self,
        filter: &DocumentFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Document>, u64), StoreError>;

    async fn find(&self, number: &str) -> Result<Option<Document>, StoreError>;

    async fn exists(&self, number: &str) -> Result<bool, StoreError>;

    /// Fails with `StoreError::AlreadyExists` on a duplicate number
    async fn create(&self, document: &CreateDocumentRequest) -> Result<Document, StoreError>;

    /// `None` when no document has this number
    async fn update(
        &self,
        number: &str,
        changes: &UpdateDocumentRequest,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns the deleted row
    async fn delete(&self, number: &str) -> Result<Option<Document>, StoreError>;
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    number: String,
    title: String,
    availability: bool,
    file_path: String,
    project: String,
    discipline: String,
    wp: String,
    lookup: String,
    created_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            number: row.number,
            title: row.title,
            availability: row.availability,
            file_path: row.file_path,
            project: row.project,
            discipline: row.discipline,
            wp: row.wp,
            lookup: row.lookup,
            created_at: row.created_at,
        }
    }
}

const DOCUMENT_COLUMNS: &str =
    "number, title, availability, file_path, project, discipline, wp, lookup, created_at";

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
    let mut keyword = " WHERE ";

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(keyword)
            .push("(number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR lookup ILIKE ")
            .push_bind(pattern)
            .push(")");
        keyword = " AND ";
    }
    if let Some(project) = &filter.project {
        qb.push(keyword).push("project = ").push_bind(project.clone());
        keyword = " AND ";
    }
    if let Some(discipline) = &filter.discipline {
        qb.push(keyword).push("discipline = ").push_bind(discipline.clone());
    }
}

/// LIMIT and OFFSET are BIGINT; anything past `i64::MAX` is clamped
fn sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// PostgreSQL-backed document registry
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list(
        &self,
        filter: &DocumentFilter,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Document>, u64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM documents",
            DOCUMENT_COLUMNS
        ));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at LIMIT ")
            .push_bind(sql_bound(limit))
            .push(" OFFSET ")
            .push_bind(sql_bound(offset));

        let rows: Vec<DocumentRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Document::from).collect(), total.max(0) as u64))
    }

    async fn find(&self, number: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "SELECT {} FROM documents WHERE number = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn exists(&self, number: &str) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE number = $1)",
        )
        .bind(number)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }

    async fn create(&self, document: &CreateDocumentRequest) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            INSERT INTO documents (number, title, availability, file_path, project, discipline, wp, lookup)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(&document.number)
        .bind(&document.title)
        .bind(document.availability)
        .bind(&document.file_path)
        .bind(&document.project)
        .bind(&document.discipline)
        .bind(&document.wp)
        .bind(&document.lookup)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        number: &str,
        changes: &UpdateDocumentRequest,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            r#"
            UPDATE documents SET
                title = COALESCE($2, title),
                availability = COALESCE($3, availability),
                file_path = COALESCE($4, file_path),
                project = COALESCE($5, project),
                discipline = COALESCE($6, discipline),
                wp = COALESCE($7, wp),
                lookup = COALESCE($8, lookup)
            WHERE number = $1
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        ))
        .bind(number)
        .bind(&changes.title)
        .bind(changes.availability)
        .bind(&changes.file_path)
        .bind(&changes.project)
        .bind(&changes.discipline)
        .bind(&changes.wp)
        .bind(&changes.lookup)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }

    async fn delete(&self, number: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(&format!(
            "DELETE FROM documents WHERE number = $1 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Document::from))
    }
}
