//! Survey file loading.
//!
//! A survey file is a JSON array of `{id, text, answers}` objects where
//! `answers` holds one string per respondent.

use crate::error::SurveyError;
use crate::models::Question;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// All questions of a survey, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Survey {
    pub questions: Vec<Question>,
}

impl Survey {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Respondent count of the first question.
    ///
    /// Free-text and multiple-choice blocks may have different lengths, so
    /// this is only a headline number.
    pub fn respondent_count(&self) -> usize {
        self.questions.first().map(|q| q.answers.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Flatten into a (question id, respondent) table.
    pub fn response_table(&self) -> ResponseTable {
        ResponseTable::from_questions(&self.questions)
    }
}

/// One cell of the flattened response table.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub question_id: String,
    pub respondent: usize,
    pub answer: String,
}

/// Flattened view of a survey: one row per (question, respondent).
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    rows: Vec<Response>,
}

impl ResponseTable {
    pub fn from_questions(questions: &[Question]) -> Self {
        let rows = questions
            .iter()
            .flat_map(|q| {
                q.answers.iter().enumerate().map(move |(respondent, answer)| Response {
                    question_id: q.id.clone(),
                    respondent,
                    answer: answer.clone(),
                })
            })
            .collect();

        Self { rows }
    }

    /// All answers recorded under `question_id`, in row order.
    ///
    /// Unknown ids yield an empty list.
    pub fn answers(&self, question_id: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.question_id == question_id)
            .map(|r| r.answer.as_str())
            .collect()
    }

    /// Number of respondents recorded for `question_id`.
    pub fn respondents(&self, question_id: &str) -> usize {
        self.rows
            .iter()
            .filter(|r| r.question_id == question_id)
            .map(|r| r.respondent + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse survey JSON. `source` is only used in error messages.
pub fn parse_survey(content: &str, source: &Path) -> Result<Survey, SurveyError> {
    let questions: Vec<Question> =
        serde_json::from_str(content).map_err(|e| SurveyError::Parse {
            path: source.to_path_buf(),
            source: e,
        })?;

    if questions.is_empty() {
        return Err(SurveyError::Empty(source.to_path_buf()));
    }

    Ok(Survey::new(questions))
}

/// Load a survey from a JSON file.
pub fn load_survey(path: &Path) -> Result<Survey, SurveyError> {
    info!("Loading survey from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| SurveyError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let survey = parse_survey(&content, path)?;
    debug!(
        "Loaded {} questions, {} respondents in first question",
        survey.len(),
        survey.respondent_count()
    );

    Ok(survey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"[
        {"id": "q1", "text": "Do you consent?", "answers": ["Yes", "Yes", "No"]},
        {"id": "q2", "text": "Which tools? (Select all that apply)", "answers": ["Maps;Email", "Email"]}
    ]"#;

    #[test]
    fn test_parse_survey() {
        let survey = parse_survey(SAMPLE, Path::new("sample.json")).unwrap();
        assert_eq!(survey.len(), 2);
        assert_eq!(survey.respondent_count(), 3);
        assert_eq!(survey.questions[1].answers, vec!["Maps;Email", "Email"]);
    }

    #[test]
    fn test_response_table_lengths_vary_per_question() {
        let survey = parse_survey(SAMPLE, Path::new("sample.json")).unwrap();
        let table = survey.response_table();

        assert_eq!(table.len(), 5);
        assert_eq!(table.respondents("q1"), 3);
        assert_eq!(table.respondents("q2"), 2);
        assert_eq!(table.answers("q2"), vec!["Maps;Email", "Email"]);
        assert!(table.answers("missing").is_empty());
        assert_eq!(table.respondents("missing"), 0);
    }

    #[test]
    fn test_parse_missing_field_fails() {
        let result = parse_survey(r#"[{"id": "q1", "text": "x"}]"#, Path::new("bad.json"));
        assert!(matches!(result, Err(SurveyError::Parse { .. })));
    }

    #[test]
    fn test_parse_empty_survey_fails() {
        let result = parse_survey("[]", Path::new("empty.json"));
        assert!(matches!(result, Err(SurveyError::Empty(_))));
    }

    #[test]
    fn test_load_survey_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("survey_data.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let survey = load_survey(&path).unwrap();
        assert_eq!(survey.questions[0].id, "q1");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_survey(&temp_dir.path().join("nope.json"));
        assert!(matches!(result, Err(SurveyError::Io { .. })));
    }
}
