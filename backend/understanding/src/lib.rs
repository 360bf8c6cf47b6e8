pub mod analyzer;
pub mod mock;
pub mod parser;
pub mod prompt;
pub mod vision;

pub use analyzer::PhotoAnalyzer;
pub use mock::MockVisionClient;
pub use parser::{HeadingPolicy, ReportParser, parse_report};
pub use prompt::PromptBuilder;
pub use vision::GeminiVisionClient;

#[cfg(test)]
pub(crate) mod fixtures {
    use photocritic_core::{AnalysisReport, Criterion};

    /// A well-formed reply with the given scores, optionally closed by a review.
    pub fn sample_reply(scores: [&str; 6], review: Option<&str>) -> String {
        let mut out = String::new();
        for (criterion, score) in Criterion::ALL.iter().zip(scores) {
            let title = criterion.title();
            out.push_str(&format!(
                "**{}. {title}:**\nNotes on {title}. (confidence: {score}%)\n\n",
                criterion.position()
            ));
        }
        if let Some(review) = review {
            out.push_str(&format!("**Final review:**\n{review}"));
        }
        out
    }

    /// Render a report back into reply text the parser accepts.
    pub fn format_reply(report: &AnalysisReport) -> String {
        let mut out = String::new();
        for entry in report.entries() {
            out.push_str(&format!(
                "**{}**\n{} (confidence: {}%)\n\n",
                entry.heading,
                entry.description,
                entry.confidence.value()
            ));
        }
        out.push_str(&format!("**Final review:**\n{}", report.final_review()));
        out
    }
}
