//! Report parser: turns a free-text model reply into an [`AnalysisReport`].
//!
//! The reply is scanned left to right as a small state machine:
//! bold heading → description up to the first whitespace + `(` →
//! `confidence: N%)` → next heading, six times, then the bold
//! `Final review:` marker and everything after it. Any missing piece fails
//! the whole parse; a partial report is never returned.

use photocritic_config::PhotoCriticConfig;
use photocritic_core::{
    AnalysisReport, CRITERIA_COUNT, Confidence, Criterion, ParseError, ReportEntry,
};

const BOLD: &str = "**";
const FINAL_REVIEW: &str = "Final review:";
const CONFIDENCE_OPEN: &str = "confidence:";
const CONFIDENCE_CLOSE: &str = "%)";

/// How headings are tied to criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingPolicy {
    /// The n-th heading is the n-th criterion, whatever it says.
    #[default]
    Positional,
    /// The n-th heading must also name the n-th criterion.
    Verified,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser {
    policy: HeadingPolicy,
}

/// A `**…**` span on a single line. Offsets are byte indices into the reply.
#[derive(Debug)]
struct BoldSpan<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

/// A bold span that ends its line, with the offset where its body begins.
#[derive(Debug)]
struct Heading<'a> {
    start: usize,
    body_start: usize,
    text: &'a str,
}

impl ReportParser {
    pub fn new(policy: HeadingPolicy) -> Self {
        Self { policy }
    }

    /// Parser honoring `parser.verifyHeadings`.
    pub fn from_config(config: &PhotoCriticConfig) -> Self {
        if config.parser.verify_headings() {
            Self::new(HeadingPolicy::Verified)
        } else {
            Self::new(HeadingPolicy::Positional)
        }
    }

    pub fn policy(&self) -> HeadingPolicy {
        self.policy
    }

    pub fn parse(&self, raw: &str) -> Result<AnalysisReport, ParseError> {
        let spans = bold_spans(raw);
        if spans.is_empty() {
            return Err(ParseError::NoHeadings);
        }

        let final_marker = spans
            .iter()
            .find(|s| s.text.trim().eq_ignore_ascii_case(FINAL_REVIEW));
        let limit = final_marker.map_or(raw.len(), |m| m.start);

        let headings: Vec<Heading<'_>> = spans
            .iter()
            .take_while(|s| s.start < limit)
            .filter_map(|s| as_heading(raw, s))
            .collect();
        if headings.len() < CRITERIA_COUNT {
            return Err(ParseError::MissingHeadings {
                found: headings.len(),
            });
        }

        let mut entries = Vec::with_capacity(CRITERIA_COUNT);
        for (i, criterion) in Criterion::ALL.into_iter().enumerate() {
            let block_end = headings.get(i + 1).map_or(limit, |h| h.start);
            entries.push(self.parse_entry(raw, criterion, &headings[i], block_end)?);
        }

        let marker = final_marker.ok_or(ParseError::MissingFinalReview)?;
        AnalysisReport::new(entries, raw[marker.end..].trim())
    }

    fn parse_entry(
        &self,
        raw: &str,
        criterion: Criterion,
        heading: &Heading<'_>,
        block_end: usize,
    ) -> Result<ReportEntry, ParseError> {
        let heading_text = heading.text.trim();
        if self.policy == HeadingPolicy::Verified && !criterion.matches_heading(heading_text) {
            return Err(ParseError::HeadingMismatch {
                position: criterion.position(),
                expected: criterion,
                found: heading_text.to_string(),
            });
        }

        let block = raw
            .get(heading.body_start..block_end)
            .unwrap_or_default();
        let desc_end =
            description_end(block).ok_or(ParseError::MissingDescription { criterion })?;
        let description = block[..desc_end].trim();
        if description.is_empty() {
            return Err(ParseError::MissingDescription { criterion });
        }

        let value = confidence_token(&block[desc_end..])
            .ok_or(ParseError::MissingConfidence { criterion })?;
        let confidence = parse_confidence(criterion, value)?;

        Ok(ReportEntry {
            criterion,
            heading: heading_text.to_string(),
            description: description.to_string(),
            confidence,
        })
    }
}

/// Parse with positional heading trust.
pub fn parse_report(raw: &str) -> Result<AnalysisReport, ParseError> {
    ReportParser::default().parse(raw)
}

/// All leftmost, non-greedy `**…**` spans that open and close on one line.
fn bold_spans(raw: &str) -> Vec<BoldSpan<'_>> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(rel) = raw[pos..].find(BOLD) {
        let open = pos + rel;
        let inner = open + BOLD.len();
        let line_end = raw[inner..].find('\n').map_or(raw.len(), |i| inner + i);
        match raw[inner..line_end].find(BOLD) {
            Some(close_rel) => {
                let close = inner + close_rel;
                spans.push(BoldSpan {
                    start: open,
                    end: close + BOLD.len(),
                    text: &raw[inner..close],
                });
                pos = close + BOLD.len();
            }
            None => pos = open + 1,
        }
    }
    spans
}

/// A span is a heading when only horizontal whitespace separates it from a
/// line break or the end of the reply.
fn as_heading<'a>(raw: &str, span: &BoldSpan<'a>) -> Option<Heading<'a>> {
    let rest = &raw[span.end..];
    let after_ws = rest.trim_start_matches([' ', '\t', '\r']);
    let ws = rest.len() - after_ws.len();
    let body_start = if after_ws.is_empty() {
        raw.len()
    } else if after_ws.starts_with('\n') {
        span.end + ws + 1
    } else {
        return None;
    };
    Some(Heading {
        start: span.start,
        body_start,
        text: span.text,
    })
}

/// Byte offset of the first whitespace character directly followed by `(`.
fn description_end(block: &str) -> Option<usize> {
    let mut chars = block.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && matches!(chars.peek(), Some((_, '('))) {
            return Some(i);
        }
    }
    None
}

/// Text between `confidence:` (any ASCII case) and the next `%)`.
fn confidence_token(text: &str) -> Option<&str> {
    let open = find_ascii_case_insensitive(text, CONFIDENCE_OPEN)? + CONFIDENCE_OPEN.len();
    let close = text[open..].find(CONFIDENCE_CLOSE)?;
    Some(&text[open..open + close])
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

fn parse_confidence(criterion: Criterion, value: &str) -> Result<Confidence, ParseError> {
    let value = value.trim();
    let invalid = || ParseError::InvalidConfidence {
        criterion,
        value: value.to_string(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // All digits, so the only parse failure left is overflow.
    let number: u64 = value.parse().unwrap_or(u64::MAX);
    u8::try_from(number)
        .ok()
        .and_then(Confidence::new)
        .ok_or(ParseError::ConfidenceOutOfRange {
            criterion,
            value: number,
        })
}
