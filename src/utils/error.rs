// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Fatal extraction failures: the document's shape no longer matches the
/// parser's assumptions and no topic-specific fallback can recover. These
/// abort the current document. Data-quality issues go through
/// `utils::diag::Diagnostics` instead and never take this path.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("document is not a recognizable questionnaire response")]
    UnrecognizedDocument,

    #[error("unsupported questionnaire version: {0}")]
    UnsupportedVersion(i32),

    #[error("section `{0}` not found")]
    SectionNotFound(String),

    #[error("invalid question code `{0}` (expected `<page>.<question>`)")]
    InvalidQuestionCode(String),

    #[error("page `{page}` not found in module `{module}`")]
    PageNotFound { module: String, page: String },

    #[error("question `{question}` not found in page `{page}`")]
    QuestionNotFound { page: String, question: String },

    #[error("no `{class}` table in section `{section}`")]
    TableNotFound {
        section: String,
        class: &'static str,
    },

    #[error("table dimensions do not match: {body} body cells across {header} header columns")]
    TableShape { header: usize, body: usize },

    #[error("{label}: unparseable date `{value}`")]
    InvalidDate { label: String, value: String },

    #[error("{context}: expected a number, got `{value}`")]
    InvalidNumber {
        context: &'static str,
        value: String,
    },

    #[error("{context}: unexpected label `{label}`")]
    UnexpectedLabel {
        context: &'static str,
        label: String,
    },

    #[error("{context}: {detail}")]
    Inconsistent {
        context: &'static str,
        detail: String,
    },
}

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("workbook serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("extraction failed: {0}")]
    Extraction(#[from] StructuralError),

    #[error("workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("too many response paths given ({0}, max 5)")]
    TooManyResponses(usize),

    #[error("version {version} appears twice in the batch ({first:?} and {second:?})")]
    DuplicateVersion {
        version: i32,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("data processing failed: {0}")]
    Processing(String),
}
