//! Data models for the survey analyzer.
//!
//! This module contains the core data structures used throughout
//! the application for representing questions, aggregates, test results
//! and reports.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Significance threshold used when no other value is configured.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Kind of a survey question, as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Consent and other administrative questions
    Skip,
    /// Open-ended answers that are not aggregated
    FreeText,
    /// Several options separated by a delimiter in one answer
    SelectAll,
    /// Exactly one option per answer
    MultipleChoice,
    /// Vote for the best/worst group
    Ranking,
    /// Ordinal rating on a 1-5 scale
    Likert,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Skip => write!(f, "Skip"),
            QuestionType::FreeText => write!(f, "Free Text"),
            QuestionType::SelectAll => write!(f, "Select All"),
            QuestionType::MultipleChoice => write!(f, "Multiple Choice"),
            QuestionType::Ranking => write!(f, "Ranking"),
            QuestionType::Likert => write!(f, "Likert"),
        }
    }
}

impl QuestionType {
    /// Whether answers to this kind of question are aggregated at all.
    pub fn is_analyzed(&self) -> bool {
        !matches!(self, QuestionType::Skip | QuestionType::FreeText)
    }
}

/// A single survey question with one raw answer per respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question identifier.
    pub id: String,
    /// Full question text.
    pub text: String,
    /// Raw answers, one per respondent, in respondent order.
    pub answers: Vec<String>,
}

impl Question {
    /// Returns the text truncated to `max` characters with a trailing ellipsis.
    pub fn short_text(&self, max: usize) -> String {
        truncate(&self.text, max)
    }
}

/// Truncate a string to `max` characters, appending "..." when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// Category counts that remember the order in which categories first appeared.
///
/// Ties in [`FrequencyCounts::most_common`] and in frequency ordering are
/// broken by first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyCounts {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count for `category`.
    pub fn add(&mut self, category: &str) {
        self.add_count(category, 1);
    }

    /// Adds `count` occurrences of `category`.
    pub fn add_count(&mut self, category: &str, count: usize) {
        match self.index.get(category) {
            Some(&pos) => self.entries[pos].1 += count,
            None => {
                self.index.insert(category.to_string(), self.entries.len());
                self.entries.push((category.to_string(), count));
            }
        }
    }

    /// Count for `category`, zero when never seen.
    pub fn get(&self, category: &str) -> usize {
        self.index
            .get(category)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Iterate in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The `n` most frequent categories, ties in first-appearance order.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut sorted: Vec<(&str, usize)> = self.iter().collect();
        sorted.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        sorted.truncate(n);
        sorted
    }
}

impl<'a> FromIterator<&'a str> for FrequencyCounts {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut counts = Self::new();
        for item in iter {
            counts.add(item);
        }
        counts
    }
}

impl Serialize for FrequencyCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Descriptive statistics of an ordinal answer list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator); NaN when n < 2.
    pub std: f64,
    pub min: i64,
    pub max: i64,
    pub n: usize,
}

/// Aggregated answers of one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Aggregate {
    Frequencies(FrequencyCounts),
    Numeric(NumericSummary),
}

/// Outcome of one significance test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// Test statistic; `None` for placeholder results.
    pub statistic: Option<f64>,
    pub p_value: f64,
    /// Degrees of freedom (zero for placeholders and KS tests).
    pub dof: usize,
    pub significant: bool,
    /// Bonferroni-corrected p-value, capped at 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_p_value: Option<f64>,
    /// Reason a placeholder was substituted for a computed test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TestResult {
    /// A computed result with significance judged at `alpha`.
    pub fn computed(statistic: f64, p_value: f64, dof: usize, alpha: f64) -> Self {
        Self {
            statistic: Some(statistic),
            p_value,
            dof,
            significant: p_value < alpha,
            adjusted_p_value: None,
            note: None,
        }
    }

    /// A non-significant stand-in for a test that could not be run.
    pub fn placeholder(note: &str) -> Self {
        Self {
            statistic: None,
            p_value: 1.0,
            dof: 0,
            significant: false,
            adjusted_p_value: None,
            note: Some(note.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.note.is_some()
    }
}

/// Per-question entry of the needfinding summary.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    /// 1-based position of the question in the survey.
    #[serde(skip)]
    pub number: usize,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub statistics: Aggregate,
    pub total_responses: usize,
    /// Raw answer count, excluded answers included.
    #[serde(skip)]
    pub answered: usize,
}

impl QuestionResult {
    /// Share of all raw answers, in percent.
    pub fn percentage(&self, count: usize) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            count as f64 / self.answered as f64 * 100.0
        }
    }
}

/// Ordered mapping from question id to result, serialized as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct SurveyResults {
    pub entries: Vec<(String, QuestionResult)>,
}

impl SurveyResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for SurveyResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, result) in &self.entries {
            map.serialize_entry(id, result)?;
        }
        map.end()
    }
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Input file the survey was read from.
    pub input: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Number of questions in the survey.
    pub questions: usize,
    /// Respondent count of the first question.
    pub respondents: usize,
    /// Chart files written during the run.
    pub charts: Vec<String>,
}

/// Complete needfinding analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    pub metadata: ReportMetadata,
    pub results: SurveyResults,
}

/// Likert summaries of one group, in configured question order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub questions: Vec<(String, Option<NumericSummary>)>,
}

impl GroupSummary {
    pub fn summary(&self, label: &str) -> Option<&NumericSummary> {
        self.questions
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, s)| s.as_ref())
    }
}

/// Chi-squared omnibus test of one Likert question across all groups.
#[derive(Debug, Clone, Serialize)]
pub struct OmnibusResult {
    pub question: String,
    /// Unfiltered groups x ratings 1-5 table.
    pub contingency_table: Vec<Vec<usize>>,
    pub result: TestResult,
}

/// KS comparison of two groups on one question.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseResult {
    pub first: String,
    pub second: String,
    pub result: TestResult,
}

impl PairwiseResult {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.first, self.second)
    }
}

/// Pairwise comparisons of one question.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionPairwise {
    pub question: String,
    pub pairs: Vec<PairwiseResult>,
}

/// Goodness-of-fit analysis of one ranking question.
#[derive(Debug, Clone, Serialize)]
pub struct RankingResult {
    pub label: String,
    pub counts: FrequencyCounts,
    pub total_responses: usize,
    pub result: TestResult,
}

/// Complete prototype comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub metadata: ReportMetadata,
    pub groups: Vec<String>,
    pub descriptive: Vec<GroupSummary>,
    pub omnibus: Vec<OmnibusResult>,
    pub pairwise: Vec<QuestionPairwise>,
    pub ranking: Vec<RankingResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_type_display() {
        assert_eq!(QuestionType::SelectAll.to_string(), "Select All");
        assert_eq!(QuestionType::MultipleChoice.to_string(), "Multiple Choice");
    }

    #[test]
    fn test_question_type_serializes_snake_case() {
        let json = serde_json::to_string(&QuestionType::MultipleChoice).unwrap();
        assert_eq!(json, "\"multiple_choice\"");
    }

    #[test]
    fn test_is_analyzed() {
        assert!(!QuestionType::Skip.is_analyzed());
        assert!(!QuestionType::FreeText.is_analyzed());
        assert!(QuestionType::SelectAll.is_analyzed());
        assert!(QuestionType::Likert.is_analyzed());
    }

    #[test]
    fn test_frequency_counts_most_common_ties_keep_first_seen() {
        let counts: FrequencyCounts = ["b", "a", "a", "c", "b", "d"].into_iter().collect();
        let top = counts.most_common(3);
        assert_eq!(top, vec![("b", 2), ("a", 2), ("c", 1)]);
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.get("missing"), 0);
    }

    #[test]
    fn test_frequency_counts_serialize_as_ordered_map() {
        let counts: FrequencyCounts = ["Maps", "Email", "Email"].into_iter().collect();
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"Maps":1,"Email":2}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_placeholder_is_not_significant() {
        let result = TestResult::placeholder("No variation in data");
        assert!(!result.significant);
        assert_eq!(result.p_value, 1.0);
        assert!(result.statistic.is_none());
        assert!(result.is_placeholder());
    }

    #[test]
    fn test_computed_significance() {
        assert!(TestResult::computed(9.0, 0.01, 2, DEFAULT_ALPHA).significant);
        assert!(!TestResult::computed(1.0, 0.05, 2, DEFAULT_ALPHA).significant);
    }
}
