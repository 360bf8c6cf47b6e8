//! Structured critique produced from a model reply.
//!
//! A report always holds exactly one entry per [`Criterion`], in the
//! order the reply template mandates, plus a non-empty final review.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Number of criteria every report covers.
pub const CRITERIA_COUNT: usize = 6;

/// The fixed evaluation categories for a profile photo, in template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    ResolutionAndClarity,
    ProfessionalAppearance,
    FaceVisibility,
    AppropriateExpression,
    FiltersAndDistortions,
    SinglePersonNoPets,
}

impl Criterion {
    /// All criteria in the order the model is told to answer them.
    pub const ALL: [Criterion; CRITERIA_COUNT] = [
        Criterion::ResolutionAndClarity,
        Criterion::ProfessionalAppearance,
        Criterion::FaceVisibility,
        Criterion::AppropriateExpression,
        Criterion::FiltersAndDistortions,
        Criterion::SinglePersonNoPets,
    ];

    /// Heading text used in the prompt template.
    pub fn title(&self) -> &'static str {
        match self {
            Criterion::ResolutionAndClarity => "Resolution and Clarity",
            Criterion::ProfessionalAppearance => "Professional Appearance",
            Criterion::FaceVisibility => "Face Visibility",
            Criterion::AppropriateExpression => "Appropriate Expression",
            Criterion::FiltersAndDistortions => "Filters and Distortions",
            Criterion::SinglePersonNoPets => "Single Person and No Pets",
        }
    }

    /// 1-based position in the template.
    pub fn position(&self) -> usize {
        Criterion::ALL
            .iter()
            .position(|c| c == self)
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Whether a model-echoed heading names this criterion.
    ///
    /// Ignores a leading `N.` / `N)` numbering, a trailing colon, case and
    /// repeated whitespace.
    pub fn matches_heading(&self, heading: &str) -> bool {
        let mut text = heading.trim();
        let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits > 0 {
            let rest = &text[digits..];
            if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
                text = stripped;
            }
        }
        let text = text.trim().trim_end_matches(':').trim();
        let normalized: Vec<&str> = text.split_whitespace().collect();
        let expected: Vec<&str> = self.title().split_whitespace().collect();
        normalized.len() == expected.len()
            && normalized
                .iter()
                .zip(&expected)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Model confidence for one criterion, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: u8 = 100;

    /// Returns `None` when `value` exceeds 100.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Share of the full scale, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        f32::from(self.0) / f32::from(Self::MAX)
    }
}

impl TryFrom<u8> for Confidence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Confidence::new(value).ok_or_else(|| format!("confidence {value} is above 100"))
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> u8 {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// One parsed section of the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub criterion: Criterion,
    /// Heading text exactly as the model wrote it, trimmed.
    pub heading: String,
    pub description: String,
    pub confidence: Confidence,
}

/// A complete, validated critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    entries: [ReportEntry; CRITERIA_COUNT],
    final_review: String,
}

impl AnalysisReport {
    /// Build a report, enforcing six entries and a non-empty final review.
    pub fn new(entries: Vec<ReportEntry>, final_review: impl Into<String>) -> Result<Self, ParseError> {
        let found = entries.len();
        let entries: [ReportEntry; CRITERIA_COUNT] = entries
            .try_into()
            .map_err(|_| ParseError::MissingHeadings { found })?;
        let final_review = final_review.into().trim().to_string();
        if final_review.is_empty() {
            return Err(ParseError::EmptyFinalReview);
        }
        Ok(Self {
            entries,
            final_review,
        })
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn final_review(&self) -> &str {
        &self.final_review
    }

    /// Entry for a given criterion.
    pub fn entry(&self, criterion: Criterion) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.criterion == criterion)
    }

    /// Mean confidence across all six entries, rounded to the nearest integer.
    pub fn average_confidence(&self) -> u8 {
        let total: u32 = self
            .entries
            .iter()
            .map(|e| u32::from(e.confidence.value()))
            .sum();
        let n = CRITERIA_COUNT as u32;
        ((total + n / 2) / n) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(criterion: Criterion, confidence: u8) -> ReportEntry {
        ReportEntry {
            criterion,
            heading: format!("{}. {}:", criterion.position(), criterion.title()),
            description: "Looks fine.".into(),
            confidence: Confidence::new(confidence).unwrap(),
        }
    }

    fn six_entries() -> Vec<ReportEntry> {
        Criterion::ALL
            .iter()
            .zip([90, 75, 88, 60, 95, 100])
            .map(|(c, v)| entry(*c, v))
            .collect()
    }

    #[test]
    fn criteria_positions_follow_template_order() {
        for (i, c) in Criterion::ALL.iter().enumerate() {
            assert_eq!(c.position(), i + 1);
        }
    }

    #[test]
    fn heading_matching_ignores_numbering_and_case() {
        assert!(Criterion::FaceVisibility.matches_heading("3. Face Visibility:"));
        assert!(Criterion::FaceVisibility.matches_heading("face  visibility"));
        assert!(Criterion::SinglePersonNoPets.matches_heading("6) Single Person and No Pets:"));
        assert!(!Criterion::FaceVisibility.matches_heading("3. Appropriate Expression:"));
    }

    #[test]
    fn confidence_rejects_values_above_100() {
        assert!(Confidence::new(100).is_some());
        assert!(Confidence::new(101).is_none());
        assert_eq!(Confidence::new(60).unwrap().fraction(), 0.6);
    }

    #[test]
    fn report_requires_six_entries() {
        let mut entries = six_entries();
        entries.pop();
        let err = AnalysisReport::new(entries, "Good photo.").unwrap_err();
        assert!(matches!(err, ParseError::MissingHeadings { found: 5 }));
    }

    #[test]
    fn report_requires_non_empty_review() {
        let err = AnalysisReport::new(six_entries(), "  \n ").unwrap_err();
        assert!(matches!(err, ParseError::EmptyFinalReview));
    }

    #[test]
    fn report_lookup_and_average() {
        let report = AnalysisReport::new(six_entries(), " Suitable. ").unwrap();
        assert_eq!(report.final_review(), "Suitable.");
        assert_eq!(report.entries()[3].confidence.value(), 60);
        assert_eq!(
            report.entry(Criterion::FiltersAndDistortions).unwrap().confidence.value(),
            95
        );
        // (90 + 75 + 88 + 60 + 95 + 100) / 6 = 84.67
        assert_eq!(report.average_confidence(), 85);
    }

    #[test]
    fn report_serializes_confidence_as_number() {
        let report = AnalysisReport::new(six_entries(), "Suitable.").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["confidence"], 90);
        assert_eq!(json["entries"][0]["criterion"], "resolution_and_clarity");
        assert_eq!(json["final_review"], "Suitable.");
    }
}
