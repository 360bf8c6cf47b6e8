pub mod error;
pub mod image;
pub mod report;
pub mod traits;

pub use error::{AnalysisError, CompletionError, CompletionErrorKind, ImageError, ParseError};
pub use image::{ImageFormat, ImageInput};
pub use report::{AnalysisReport, Confidence, Criterion, ReportEntry, CRITERIA_COUNT};
pub use traits::VisionCompletion;
