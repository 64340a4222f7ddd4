//! Course document ingestion.
//!
//! A course document is plain text with a short header followed by lesson
//! sections:
//!
//! ```text
//! Course Title: Python Basics
//! Course Link: https://example.com/python
//! Course Instructor: Ada
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/python/0
//! Lesson text...
//! ```
//!
//! Header fields and lesson links are optional. Text outside any lesson
//! becomes lesson-less content.

mod chunker;

pub use chunker::SentenceChunker;

use crate::config::IngestSettings;
use crate::course::{Course, CourseChunk, Lesson};
use crate::error::{LecternError, Result};
use regex::Regex;
use std::path::Path;
use tracing::{debug, instrument};

/// File extensions treated as course documents.
pub const COURSE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Lesson text as parsed from a document, before chunking.
#[derive(Debug, Clone, PartialEq)]
struct Section {
    lesson_number: Option<i64>,
    text: String,
}

/// Turns course documents into a [`Course`] and its [`CourseChunk`]s.
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    chunker: SentenceChunker,
    lesson_marker: Regex,
}

impl DocumentProcessor {
    pub fn new(chunker: SentenceChunker) -> Self {
        Self {
            chunker,
            lesson_marker: Regex::new(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$").expect("Invalid regex"),
        }
    }

    pub fn from_settings(settings: &IngestSettings) -> Self {
        Self::new(SentenceChunker::from_settings(settings))
    }

    /// Whether `path` looks like a course document.
    pub fn is_course_file(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| COURSE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Read and process a course document from disk.
    ///
    /// The file stem is used as the title when the header has none.
    #[instrument(skip(self))]
    pub fn process_file(&self, path: &Path) -> Result<(Course, Vec<CourseChunk>)> {
        let text = std::fs::read_to_string(path)?;
        let fallback = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        self.process(&text, fallback)
    }

    /// Process document text.
    pub fn process(&self, text: &str, fallback_title: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let (course, sections) = self.parse(text, fallback_title)?;
        let chunks = self.chunk_sections(&course.title, &sections);
        debug!(
            "Parsed '{}' into {} lessons and {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );
        Ok((course, chunks))
    }

    fn parse(&self, text: &str, fallback_title: &str) -> Result<(Course, Vec<Section>)> {
        let mut course = Course::new(String::new());
        let mut sections: Vec<Section> = Vec::new();
        let mut current = Section {
            lesson_number: None,
            text: String::new(),
        };
        let mut in_header = true;
        let mut expect_lesson_link = false;

        for line in text.lines() {
            let trimmed = line.trim();

            if in_header {
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(value) = header_value(trimmed, "Course Title:") {
                    course.title = value;
                    continue;
                }
                if let Some(value) = header_value(trimmed, "Course Link:") {
                    course.link = Some(value).filter(|v| !v.is_empty());
                    continue;
                }
                if let Some(value) = header_value(trimmed, "Course Instructor:") {
                    course.instructor = Some(value).filter(|v| !v.is_empty());
                    continue;
                }
                in_header = false;
            }

            if let Some(caps) = self.lesson_marker.captures(trimmed) {
                let number: i64 = caps[1].parse().map_err(|_| {
                    LecternError::Ingest(format!("Invalid lesson number in '{}'", trimmed))
                })?;
                sections.push(std::mem::replace(
                    &mut current,
                    Section {
                        lesson_number: Some(number),
                        text: String::new(),
                    },
                ));
                course.lessons.push(Lesson {
                    number,
                    title: caps[2].trim().to_string(),
                    link: None,
                });
                expect_lesson_link = true;
                continue;
            }

            if expect_lesson_link {
                if let Some(link) = header_value(trimmed, "Lesson Link:") {
                    if let Some(lesson) = course.lessons.last_mut() {
                        lesson.link = Some(link).filter(|v| !v.is_empty());
                    }
                    expect_lesson_link = false;
                    continue;
                }
                if !trimmed.is_empty() {
                    expect_lesson_link = false;
                }
            }

            current.text.push_str(line);
            current.text.push('\n');
        }
        sections.push(current);

        if course.title.is_empty() {
            course.title = fallback_title.trim().to_string();
        }
        if course.title.is_empty() {
            return Err(LecternError::Ingest(
                "Document has no course title".to_string(),
            ));
        }

        sections.retain(|s| !s.text.trim().is_empty());
        Ok((course, sections))
    }

    fn chunk_sections(&self, course_title: &str, sections: &[Section]) -> Vec<CourseChunk> {
        let mut chunks = Vec::new();
        for section in sections {
            let prefix = match section.lesson_number {
                Some(n) => format!("Course {} Lesson {} content: ", course_title, n),
                None => format!("Course {} content: ", course_title),
            };
            for piece in self.chunker.chunk(&section.text) {
                chunks.push(CourseChunk {
                    course_title: course_title.to_string(),
                    lesson_number: section.lesson_number,
                    chunk_index: chunks.len(),
                    content: format!("{}{}", prefix, piece),
                });
            }
        }
        chunks
    }
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::from_settings(&IngestSettings::default())
    }
}

/// Value after a case-insensitive `label` prefix.
fn header_value(line: &str, label: &str) -> Option<String> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim().to_string())
}
