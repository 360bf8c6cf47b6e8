use std::fmt;

use thiserror::Error;

use crate::image::ImageFormat;
use crate::report::Criterion;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The model reply did not follow the structural template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("reply contains no bold headings")]
    NoHeadings,

    #[error("expected 6 criterion headings, found {found}")]
    MissingHeadings { found: usize },

    #[error("heading {position} should be '{expected}' but reads '{found}'")]
    HeadingMismatch {
        position: usize,
        expected: Criterion,
        found: String,
    },

    #[error("no description found for '{criterion}'")]
    MissingDescription { criterion: Criterion },

    #[error("no confidence marker found for '{criterion}'")]
    MissingConfidence { criterion: Criterion },

    #[error("confidence for '{criterion}' is not a whole number: '{value}'")]
    InvalidConfidence { criterion: Criterion, value: String },

    #[error("confidence for '{criterion}' is {value}, outside 0-100")]
    ConfidenceOutOfRange { criterion: Criterion, value: u64 },

    #[error("reply has no 'Final review:' section")]
    MissingFinalReview,

    #[error("'Final review:' section is empty")]
    EmptyFinalReview,
}

/// Broad cause of a failed completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    Transport,
    Auth,
    ContentPolicy,
    Service,
    MalformedResponse,
    EmptyResponse,
}

impl fmt::Display for CompletionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompletionErrorKind::Transport => "transport failure",
            CompletionErrorKind::Auth => "authentication failed",
            CompletionErrorKind::ContentPolicy => "rejected by content policy",
            CompletionErrorKind::Service => "service error",
            CompletionErrorKind::MalformedResponse => "malformed response",
            CompletionErrorKind::EmptyResponse => "empty response",
        };
        f.write_str(s)
    }
}

/// The vision-completion service call failed. Never retried.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct CompletionError {
    pub kind: CompletionErrorKind,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl CompletionError {
    pub fn new(kind: CompletionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Transport, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Auth, message)
    }

    pub fn content_policy(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::ContentPolicy, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::Service, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::MalformedResponse, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(CompletionErrorKind::EmptyResponse, message)
    }
}

/// No usable image was supplied.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("no image selected")]
    NoImage,

    #[error("unsupported image type '{0}'; expected PNG, JPEG or WEBP")]
    Unsupported(String),

    #[error("image content is not a valid {declared} file")]
    SignatureMismatch { declared: ImageFormat },

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Terminal failure of one analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    #[error("model call failed ({0})")]
    Completion(#[from] CompletionError),

    #[error("could not read the model's report: {0}")]
    Parse(#[from] ParseError),
}

impl AnalysisError {
    /// Stable machine-readable failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Image(_) => "image",
            AnalysisError::Completion(_) => "completion",
            AnalysisError::Parse(_) => "parse",
        }
    }
}
