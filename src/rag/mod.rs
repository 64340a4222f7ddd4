//! Question answering over the course index.
//!
//! [`RagSystem`] wires the reasoning engine, the semantic index, the course
//! tools and session history together, and owns course ingestion.

use crate::agent::{course_tools, Agent, Completion, Query, QueryContext, ToolRegistry};
use crate::config::{Prompts, Settings};
use crate::course::Course;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::engine::{OpenAIEngine, ReasoningEngine};
use crate::error::{LecternError, Result};
use crate::index::{SemanticIndex, SqliteIndex};
use crate::ingest::DocumentProcessor;
use crate::session::SessionStore;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answer to a question, with the sources it cites.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    #[serde(skip)]
    pub completion: Completion,
}

/// Catalog summary.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Outcome of ingesting a folder of course documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderIngest {
    pub courses_added: usize,
    pub chunks_added: usize,
    /// Documents skipped because their title is already indexed.
    pub already_indexed: usize,
    /// Documents that could not be read or parsed.
    pub failed: usize,
}

/// The main entry point for asking questions and loading courses.
pub struct RagSystem {
    index: Arc<dyn SemanticIndex>,
    agent: Agent,
    tools: ToolRegistry,
    prompts: Prompts,
    processor: DocumentProcessor,
    sessions: SessionStore,
}

impl RagSystem {
    /// Build the production stack: OpenAI engine and embedder over SQLite.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let index = SqliteIndex::new(&settings.sqlite_path(), embedder)?
            .with_max_results(settings.index.max_results)
            .with_min_title_similarity(settings.index.min_title_similarity);

        let engine = OpenAIEngine::from_settings(&settings.reasoning)?;
        info!("Using reasoning model {}", engine.model());

        Self::with_components(settings, prompts, Arc::new(engine), Arc::new(index))
    }

    /// Build a system from already-constructed components.
    pub fn with_components(
        settings: &Settings,
        prompts: Prompts,
        engine: Arc<dyn ReasoningEngine>,
        index: Arc<dyn SemanticIndex>,
    ) -> Result<Self> {
        let max_rounds = settings.reasoning.max_rounds;
        let agent = Agent::new(engine)
            .with_max_rounds(max_rounds)
            .with_system_prompt(&prompts.system_prompt(max_rounds));

        Ok(Self {
            tools: course_tools(index.clone())?,
            index,
            agent,
            prompts,
            processor: DocumentProcessor::from_settings(&settings.ingest),
            sessions: SessionStore::new(settings.session.max_history),
        })
    }

    /// Override the round limit.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.agent = self
            .agent
            .with_max_rounds(max_rounds)
            .with_system_prompt(&self.prompts.system_prompt(max_rounds));
        self
    }

    pub fn index(&self) -> Arc<dyn SemanticIndex> {
        self.index.clone()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Answer a question, using and extending the session history when given.
    ///
    /// An engine failure is returned as `Err`; the session is left untouched.
    #[instrument(skip(self))]
    pub async fn query(&self, question: &str, session_id: Option<&str>) -> Result<QueryResponse> {
        let history = session_id.and_then(|id| self.sessions.history(id));
        let query = Query::new(self.prompts.query_prompt(question))
            .with_history(history)
            .with_session(session_id.map(str::to_string));

        let mut ctx = QueryContext::new();
        let generation = self.agent.generate(&query, Some(&self.tools), &mut ctx).await?;
        let sources = self.tools.take_sources(&mut ctx);

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, question, &generation.answer);
        }

        info!(
            "Answered after {} rounds ({:?}) with {} sources",
            generation.rounds,
            generation.completion,
            sources.len()
        );

        Ok(QueryResponse {
            answer: generation.answer,
            sources,
            completion: generation.completion,
        })
    }

    /// Ingest one course document.
    ///
    /// Re-ingesting a known title replaces its lessons and chunks.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let (course, chunks) = self.processor.process_file(path)?;
        self.index.add_course(&course).await?;
        let added = self.index.add_chunks(&chunks).await?;
        info!("Indexed '{}' ({} chunks)", course.title, added);
        Ok((course, added))
    }

    /// Ingest every course document in `dir`, skipping titles already indexed.
    ///
    /// With `clear_existing` the index is emptied first. Documents that fail
    /// to parse are logged and skipped.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<FolderIngest> {
        if !dir.is_dir() {
            return Err(LecternError::InvalidInput(format!(
                "Folder does not exist: {}",
                dir.display()
            )));
        }

        if clear_existing {
            info!("Clearing existing index");
            self.index.clear().await?;
        }

        let mut known: HashSet<String> = self.index.course_titles().await?.into_iter().collect();
        let mut report = FolderIngest::default();

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && DocumentProcessor::is_course_file(p))
            .collect();
        paths.sort();

        for path in paths {
            let (course, chunks) = match self.processor.process_file(&path) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if known.contains(&course.title) {
                info!("Course already indexed: {}", course.title);
                report.already_indexed += 1;
                continue;
            }

            self.index.add_course(&course).await?;
            report.chunks_added += self.index.add_chunks(&chunks).await?;
            report.courses_added += 1;
            known.insert(course.title);
        }

        info!(
            "Added {} courses ({} chunks) from {}",
            report.courses_added,
            report.chunks_added,
            dir.display()
        );
        Ok(report)
    }

    pub async fn course_analytics(&self) -> Result<CourseStats> {
        let course_titles = self.index.course_titles().await?;
        Ok(CourseStats {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::TOOL_FAILURE_APOLOGY;
    use crate::embedding::KeywordEmbedder;
    use crate::engine::scripted::ScriptedEngine;
    use crate::engine::{EngineResponse, ToolInvocation, Turn};
    use crate::index::stub::StubIndex;
    use crate::index::{ChunkMetadata, SearchFilter, SearchOutcome};
    use serde_json::json;
    use tempfile::TempDir;

    fn search_call(course: &str) -> EngineResponse {
        EngineResponse::tool_use(vec![ToolInvocation {
            id: "call_1".to_string(),
            name: "search_course_content".to_string(),
            arguments: json!({"query": "variables", "course_name": course}),
        }])
    }

    fn stub_index() -> StubIndex {
        StubIndex::new()
            .with_resolution("Python", "Python Basics")
            .with_outcome(SearchOutcome::from_hits(vec![(
                "Variables hold values.".to_string(),
                ChunkMetadata {
                    course_title: Some("Python Basics".to_string()),
                    lesson_number: Some(1),
                    chunk_index: Some(0),
                },
                0.1,
            )]))
            .with_link("Python Basics", 1, "https://example.com/pb/1")
    }

    fn system(engine: Arc<ScriptedEngine>, index: Arc<dyn SemanticIndex>) -> RagSystem {
        RagSystem::with_components(&Settings::default(), Prompts::default(), engine, index).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_answer_and_sources() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            search_call("Python"),
            EngineResponse::text("Variables hold values."),
        ]));
        let rag = system(engine.clone(), Arc::new(stub_index()));

        let response = rag.query("What are variables?", None).await.unwrap();

        assert_eq!(response.answer, "Variables hold values.");
        assert_eq!(
            response.sources,
            vec!["Python Basics - Lesson 1|https://example.com/pb/1".to_string()]
        );
        assert_eq!(
            engine.call(0).turns[0],
            Turn::User("Answer this question about course materials: What are variables?".to_string())
        );
    }

    #[tokio::test]
    async fn test_sources_do_not_leak_between_queries() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            search_call("Python"),
            EngineResponse::text("first"),
            EngineResponse::text("second"),
        ]));
        let rag = system(engine, Arc::new(stub_index()));

        assert_eq!(rag.query("q1", None).await.unwrap().sources.len(), 1);
        assert!(rag.query("q2", None).await.unwrap().sources.is_empty());
    }

    #[tokio::test]
    async fn test_session_history_flows_into_next_query() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            EngineResponse::text("Lesson 1 is about variables."),
            EngineResponse::text("Lesson 2 is about loops."),
        ]));
        let rag = system(engine.clone(), Arc::new(stub_index()));
        let session = rag.create_session();

        rag.query("What is lesson 1?", Some(session.as_str())).await.unwrap();
        rag.query("And lesson 2?", Some(session.as_str())).await.unwrap();

        assert!(!engine.call(0).system.contains("Previous conversation"));
        assert!(engine.call(1).system.ends_with(
            "Previous conversation:\nUser: What is lesson 1?\nAssistant: Lesson 1 is about variables."
        ));
        assert_eq!(
            rag.sessions().history(&session).as_deref(),
            Some(
                "User: What is lesson 1?\nAssistant: Lesson 1 is about variables.\n\
                 User: And lesson 2?\nAssistant: Lesson 2 is about loops."
            )
        );
    }

    #[tokio::test]
    async fn test_no_session_means_no_history() {
        let engine = Arc::new(ScriptedEngine::new(vec![EngineResponse::text("a")]));
        let rag = system(engine, Arc::new(stub_index()));

        rag.query("q", None).await.unwrap();
        assert_eq!(rag.sessions().history("session_1"), None);
    }

    #[tokio::test]
    async fn test_engine_failure_leaves_session_untouched() {
        let rag = system(Arc::new(ScriptedEngine::failing()), Arc::new(stub_index()));
        let session = rag.create_session();

        let result = rag.query("q", Some(session.as_str())).await;
        assert!(matches!(result, Err(LecternError::Reasoning(_))));
        assert_eq!(rag.sessions().history(&session), None);
    }

    #[tokio::test]
    async fn test_tool_failure_returns_apology() {
        let engine = Arc::new(ScriptedEngine::new(vec![search_call("Python")]));
        let rag = system(engine.clone(), Arc::new(StubIndex::new().failing_resolution()));

        let response = rag.query("q", None).await.unwrap();
        assert_eq!(response.answer, TOOL_FAILURE_APOLOGY);
        assert_eq!(response.completion, Completion::Failed);
        assert!(response.sources.is_empty());
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_max_rounds_override_updates_prompt() {
        let engine = Arc::new(ScriptedEngine::new(vec![EngineResponse::text("a")]));
        let rag = system(engine.clone(), Arc::new(stub_index())).with_max_rounds(4);

        rag.query("q", None).await.unwrap();
        assert!(engine.call(0).system.contains("up to 4 separate reasoning rounds"));
    }

    fn keyword_index() -> Arc<dyn SemanticIndex> {
        let embedder = Arc::new(KeywordEmbedder::new(&["python", "rust", "variables"]));
        Arc::new(SqliteIndex::in_memory(embedder).unwrap())
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_add_course_folder_skips_known_titles() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.txt", b"Course Title: Python Basics\nLesson 1: Variables\nVariables hold values.");
        write(&dir, "b.md", b"Course Title: Rust Basics\nLesson 1: Ownership\nOwnership moves values.");
        write(&dir, "c.txt", b"Course Title: Python Basics\nLesson 1: Duplicate\nSame title.");
        write(&dir, "notes.pdf", b"not a course");
        write(&dir, "broken.txt", &[0xff, 0xfe, 0x00]);

        let rag = system(Arc::new(ScriptedEngine::new(vec![])), keyword_index());

        let report = rag.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!(report.courses_added, 2);
        assert_eq!(report.chunks_added, 2);
        assert_eq!(report.already_indexed, 1);
        assert_eq!(report.failed, 1);

        let again = rag.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!(again.courses_added, 0);
        assert_eq!(again.already_indexed, 3);

        let rebuilt = rag.add_course_folder(dir.path(), true).await.unwrap();
        assert_eq!(rebuilt.courses_added, 2);

        let stats = rag.course_analytics().await.unwrap();
        assert_eq!(stats.total_courses, 2);
        assert_eq!(stats.course_titles, vec!["Python Basics", "Rust Basics"]);
    }

    #[tokio::test]
    async fn test_add_course_folder_missing_dir() {
        let rag = system(Arc::new(ScriptedEngine::new(vec![])), keyword_index());
        let result = rag
            .add_course_folder(Path::new("/nonexistent/lectern/courses"), false)
            .await;
        assert!(matches!(result, Err(LecternError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_add_course_document() {
        let dir = TempDir::new().unwrap();
        write(&dir, "course.txt", b"Course Title: Python Basics\nCourse Instructor: Ada\nLesson 0: Intro\nPython variables.");

        let index = keyword_index();
        let rag = system(Arc::new(ScriptedEngine::new(vec![])), index.clone());

        let (course, chunks) = rag
            .add_course_document(&dir.path().join("course.txt"))
            .await
            .unwrap();
        assert_eq!(course.title, "Python Basics");
        assert_eq!(chunks, 1);

        let outline = index.course_outline("Python Basics").await.unwrap().unwrap();
        assert_eq!(outline.instructor.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_reingesting_document_does_not_duplicate_chunks() {
        let dir = TempDir::new().unwrap();
        write(&dir, "course.txt", b"Course Title: Python Basics\nLesson 1: Variables\nPython variables hold values.");
        let path = dir.path().join("course.txt");

        let index = keyword_index();
        let rag = system(Arc::new(ScriptedEngine::new(vec![])), index.clone());
        rag.add_course_document(&path).await.unwrap();
        rag.add_course_document(&path).await.unwrap();

        let outcome = index
            .search("python variables", &SearchFilter::unrestricted())
            .await;
        assert_eq!(outcome.len(), 1);
        assert_eq!(index.course_count().await.unwrap(), 1);
    }
}
