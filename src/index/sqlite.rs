//! SQLite-backed semantic index.
//!
//! Embeddings are stored as little-endian `f32` blobs and cosine similarity is
//! computed in Rust. Reported distances are `1 - similarity`.

use super::{ChunkMetadata, FilterExpr, SearchFilter, SearchOutcome, SemanticIndex};
use crate::course::{Course, CourseChunk, Lesson};
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    instructor TEXT,
    link TEXT,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lessons (
    course_title TEXT NOT NULL,
    number INTEGER NOT NULL,
    title TEXT NOT NULL,
    link TEXT,
    PRIMARY KEY (course_title, number)
);

CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// SQLite-based semantic index.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
    min_title_similarity: Option<f32>,
}

impl SqliteIndex {
    /// Open (or create) an index at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite index at {:?}", path);

        Ok(Self::from_connection(conn, embedder))
    }

    /// Create an in-memory index (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::from_connection(conn, embedder))
    }

    fn from_connection(conn: Connection, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            conn: Mutex::new(conn),
            embedder,
            max_results: 5,
            min_title_similarity: None,
        }
    }

    /// Set the maximum number of chunks a search returns.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Reject fuzzy title matches below this cosine similarity.
    pub fn with_min_title_similarity(mut self, threshold: Option<f32>) -> Self {
        self.min_title_similarity = threshold;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LecternError::Index(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    /// Translate a filter expression into a SQL predicate with positional parameters.
    fn predicate(expr: &FilterExpr, params: &mut Vec<Value>) -> String {
        match expr {
            FilterExpr::CourseTitle(title) => {
                params.push(Value::Text(title.clone()));
                "course_title = ?".to_string()
            }
            FilterExpr::LessonNumber(lesson) => {
                params.push(Value::Integer(*lesson));
                "lesson_number = ?".to_string()
            }
            FilterExpr::And(parts) => {
                let clauses: Vec<String> =
                    parts.iter().map(|p| Self::predicate(p, params)).collect();
                format!("({})", clauses.join(" AND "))
            }
        }
    }

    async fn try_search(&self, query: &str, filter: &SearchFilter) -> Result<SearchOutcome> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut params = Vec::new();
        let mut sql =
            "SELECT course_title, lesson_number, chunk_index, content, embedding FROM chunks"
                .to_string();
        if let Some(expr) = filter.expression() {
            sql.push_str(" WHERE ");
            sql.push_str(&Self::predicate(&expr, &mut params));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            let embedding: Vec<u8> = row.get(4)?;
            let chunk_index: i64 = row.get(2)?;
            Ok((
                row.get::<_, String>(3)?,
                ChunkMetadata {
                    course_title: Some(row.get(0)?),
                    lesson_number: row.get(1)?,
                    chunk_index: Some(chunk_index as usize),
                },
                Self::bytes_to_embedding(&embedding),
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (content, metadata, embedding) = row?;
            let similarity = cosine_similarity(&query_embedding, &embedding);
            scored.push((content, metadata, similarity));
        }

        scored.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.max_results);

        debug!("Search matched {} chunks", scored.len());

        Ok(SearchOutcome::from_hits(
            scored
                .into_iter()
                .map(|(content, metadata, similarity)| (content, metadata, 1.0 - similarity)),
        ))
    }
}

#[async_trait]
impl SemanticIndex for SqliteIndex {
    #[instrument(skip(self, filter))]
    async fn search(&self, query: &str, filter: &SearchFilter) -> SearchOutcome {
        match self.try_search(query, filter).await {
            Ok(outcome) => outcome,
            Err(e) => SearchOutcome::failed(format!("Search error: {}", e)),
        }
    }

    #[instrument(skip(self))]
    async fn resolve_title(&self, fuzzy: &str) -> Result<Option<String>> {
        let query_embedding = self.embedder.embed(fuzzy).await?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title, embedding FROM courses ORDER BY title")?;
        let rows = stmt.query_map([], |row| {
            let embedding: Vec<u8> = row.get(1)?;
            Ok((row.get::<_, String>(0)?, Self::bytes_to_embedding(&embedding)))
        })?;

        let mut best: Option<(String, f32)> = None;
        for row in rows {
            let (title, embedding) = row?;
            let similarity = cosine_similarity(&query_embedding, &embedding);
            if best.as_ref().map_or(true, |(_, s)| similarity > *s) {
                best = Some((title, similarity));
            }
        }

        match (best, self.min_title_similarity) {
            (Some((title, similarity)), Some(threshold)) if similarity < threshold => {
                debug!(
                    "Nearest title '{}' ({:.3}) is below threshold {:.3}",
                    title, similarity, threshold
                );
                Ok(None)
            }
            (best, _) => Ok(best.map(|(title, _)| title)),
        }
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>> {
        let conn = self.lock()?;
        let link: Option<Option<String>> = conn
            .query_row(
                "SELECT link FROM lessons WHERE course_title = ?1 AND number = ?2",
                params![course_title, lesson_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(link.flatten())
    }

    async fn course_outline(&self, course_title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;
        let header = conn
            .query_row(
                "SELECT title, link, instructor FROM courses WHERE title = ?1",
                params![course_title],
                |row| {
                    Ok(Course {
                        title: row.get(0)?,
                        link: row.get(1)?,
                        instructor: row.get(2)?,
                        lessons: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut course) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT number, title, link FROM lessons WHERE course_title = ?1 ORDER BY number",
        )?;
        course.lessons = stmt
            .query_map(params![course_title], |row| {
                Ok(Lesson {
                    number: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(course))
    }

    #[instrument(skip(self, course), fields(title = %course.title))]
    async fn add_course(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO courses (title, instructor, link, embedding, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                course.title,
                course.instructor,
                course.link,
                Self::embedding_to_bytes(&embedding),
                Utc::now().to_rfc3339(),
            ],
        )?;
        tx.execute(
            "DELETE FROM lessons WHERE course_title = ?1",
            params![course.title],
        )?;
        tx.execute(
            "DELETE FROM chunks WHERE course_title = ?1",
            params![course.title],
        )?;
        for lesson in &course.lessons {
            tx.execute(
                "INSERT OR REPLACE INTO lessons (course_title, number, title, link)
                 VALUES (?1, ?2, ?3, ?4)",
                params![course.title, lesson.number, lesson.title, lesson.link],
            )?;
        }
        tx.commit()?;

        info!("Catalogued course with {} lessons", course.lessons.len());
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&contents).await?;
        if embeddings.len() != chunks.len() {
            return Err(LecternError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            tx.execute(
                "INSERT INTO chunks (id, course_title, lesson_number, chunk_index, content, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index as i64,
                    chunk.content,
                    Self::embedding_to_bytes(embedding),
                ],
            )?;
        }
        tx.commit()?;

        Ok(chunks.len())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM lessons; DELETE FROM courses;")?;
        info!("Cleared index");
        Ok(())
    }
}
