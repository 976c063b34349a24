//! Persistent storage of methodics and QA pairs.

use crate::lexical::{DocumentField, LexicalFilter, QaField, SearchField};
use crate::types::{Document, NewDocument, NewQaPair, QaPair, StoreStats};
use chrono::{DateTime, Utc};
use methodics_core::{AppError, AppResult};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Storage operations used by the answering pipeline and ingestion.
///
/// Filter results come back in ascending id order. An empty filter returns
/// an empty result without querying.
pub trait MethodicStore: Send + Sync {
    fn create_document(&self, document: &NewDocument) -> AppResult<Document>;

    fn get_document(&self, id: i64) -> AppResult<Option<Document>>;

    /// Like [`get_document`](Self::get_document), failing with `NotFound`.
    fn require_document(&self, id: i64) -> AppResult<Document> {
        self.get_document(id)?
            .ok_or_else(|| AppError::NotFound(format!("methodic {}", id)))
    }

    /// Delete a document and its QA pairs. Returns false if it did not exist.
    fn delete_document(&self, id: i64) -> AppResult<bool>;

    fn filter_documents(
        &self,
        filter: &LexicalFilter<DocumentField>,
        limit: usize,
    ) -> AppResult<Vec<Document>>;

    fn create_qa_pair(&self, pair: &NewQaPair) -> AppResult<QaPair>;

    fn list_qa_pairs(&self) -> AppResult<Vec<QaPair>>;

    fn filter_qa_pairs(&self, filter: &LexicalFilter<QaField>, limit: usize)
        -> AppResult<Vec<QaPair>>;

    fn stats(&self) -> AppResult<StoreStats>;
}

const DOCUMENT_COLUMNS: &str = "id, title, subject, author, body, created_at";
const QA_COLUMNS: &str = "id, question, answer, document_id";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    subject TEXT,
    author TEXT,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS qa_pairs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question TEXT NOT NULL CHECK (length(trim(question)) > 0),
    answer TEXT NOT NULL CHECK (length(trim(answer)) > 0),
    document_id INTEGER REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_qa_pairs_document ON qa_pairs(document_id);
"#;

/// SQLite-backed store. One connection guarded by a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Storage(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!("Opened SQLite database at {:?}", db_path);
        Self::init(conn)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Storage(format!("Failed to open database: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| AppError::Storage(format!("Failed to enable foreign keys: {}", e)))?;

        // Unicode lowercase; SQLite's lower() only folds ASCII
        conn.create_scalar_function(
            "casefold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|v| v.to_lowercase()))
            },
        )
        .map_err(|e| AppError::Storage(format!("Failed to register casefold: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Storage(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("Database connection lock poisoned".to_string()))
    }
}

fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let created_at: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        subject: row.get(2)?,
        author: row.get(3)?,
        body: row.get(4)?,
        created_at,
    })
}

fn row_to_qa_pair(row: &Row) -> rusqlite::Result<QaPair> {
    Ok(QaPair {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        document_id: row.get(3)?,
    })
}

/// Run a filtered select. `table_sql` is `SELECT <cols> FROM <table>`.
fn query_filtered<F, T>(
    conn: &Connection,
    table_sql: &str,
    filter: &LexicalFilter<F>,
    limit: usize,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> AppResult<Vec<T>>
where
    F: SearchField,
{
    let Some((clause, keywords)) = filter.to_sql() else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }

    let sql = format!(
        "{} WHERE {} ORDER BY id LIMIT ?{}",
        table_sql,
        clause,
        keywords.len() + 1
    );

    let mut values: Vec<Value> = keywords.into_iter().map(Value::Text).collect();
    values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map(params_from_iter(values.iter()), map)
        .map_err(|e| AppError::Storage(format!("Failed to run query: {}", e)))?;

    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Storage(format!("Failed to read row: {}", e)))
}

impl MethodicStore for SqliteStore {
    fn create_document(&self, document: &NewDocument) -> AppResult<Document> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Storage(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "INSERT INTO documents (title, subject, author, body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                document.title,
                document.subject,
                document.author,
                document.body,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::Storage(format!("Failed to insert document: {}", e)))?;

        let id = tx.last_insert_rowid();
        let stored = tx
            .query_row(
                &format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS),
                params![id],
                row_to_document,
            )
            .map_err(|e| AppError::Storage(format!("Failed to read back document: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Storage(format!("Failed to commit document: {}", e)))?;

        tracing::debug!("Stored document {} ({})", stored.id, stored.title);
        Ok(stored)
    }

    fn get_document(&self, id: i64) -> AppResult<Option<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS))
            .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

        let mut rows = stmt
            .query_map(params![id], row_to_document)
            .map_err(|e| AppError::Storage(format!("Failed to query document: {}", e)))?;

        rows.next()
            .transpose()
            .map_err(|e| AppError::Storage(format!("Failed to read document: {}", e)))
    }

    fn delete_document(&self, id: i64) -> AppResult<bool> {
        let conn = self.lock()?;
        let affected = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .map_err(|e| AppError::Storage(format!("Failed to delete document: {}", e)))?;
        Ok(affected > 0)
    }

    fn filter_documents(
        &self,
        filter: &LexicalFilter<DocumentField>,
        limit: usize,
    ) -> AppResult<Vec<Document>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        query_filtered(
            &conn,
            &format!("SELECT {} FROM documents", DOCUMENT_COLUMNS),
            filter,
            limit,
            row_to_document,
        )
    }

    fn create_qa_pair(&self, pair: &NewQaPair) -> AppResult<QaPair> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO qa_pairs (question, answer, document_id) VALUES (?1, ?2, ?3)",
            params![pair.question, pair.answer, pair.document_id],
        )
        .map_err(|e| AppError::Storage(format!("Failed to insert QA pair: {}", e)))?;

        Ok(QaPair {
            id: conn.last_insert_rowid(),
            question: pair.question.clone(),
            answer: pair.answer.clone(),
            document_id: pair.document_id,
        })
    }

    fn list_qa_pairs(&self) -> AppResult<Vec<QaPair>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM qa_pairs ORDER BY id", QA_COLUMNS))
            .map_err(|e| AppError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], row_to_qa_pair)
            .map_err(|e| AppError::Storage(format!("Failed to query QA pairs: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Storage(format!("Failed to read QA pair: {}", e)))
    }

    fn filter_qa_pairs(
        &self,
        filter: &LexicalFilter<QaField>,
        limit: usize,
    ) -> AppResult<Vec<QaPair>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        query_filtered(
            &conn,
            &format!("SELECT {} FROM qa_pairs", QA_COLUMNS),
            filter,
            limit,
            row_to_qa_pair,
        )
    }

    fn stats(&self) -> AppResult<StoreStats> {
        let conn = self.lock()?;
        let count = |sql: &str| -> AppResult<u64> {
            conn.query_row(sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n.max(0) as u64)
                .map_err(|e| AppError::Storage(format!("Failed to count rows: {}", e)))
        };

        Ok(StoreStats {
            documents: count("SELECT COUNT(*) FROM documents")?,
            qa_pairs: count("SELECT COUNT(*) FROM qa_pairs")?,
            linked_qa_pairs: count("SELECT COUNT(*) FROM qa_pairs WHERE document_id IS NOT NULL")?,
        })
    }
}
