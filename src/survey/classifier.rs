//! Question classification.
//!
//! Classification is an ordered list of (predicate, label) rules evaluated
//! top to bottom. The last rule always matches, so every question gets a
//! label.

use crate::config::ClassifierConfig;
use crate::models::{Question, QuestionType};
use std::collections::HashSet;

/// Condition a question must meet for a rule to apply.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Lowercased question text contains any of the (lowercased) phrases.
    TextContainsAny(Vec<String>),
    /// Question id is one of the listed ids.
    IdIn(HashSet<String>),
    Always,
}

impl Predicate {
    fn matches(&self, question: &Question, lowered_text: &str) -> bool {
        match self {
            Predicate::TextContainsAny(phrases) => {
                phrases.iter().any(|p| lowered_text.contains(p.as_str()))
            }
            Predicate::IdIn(ids) => ids.contains(&question.id),
            Predicate::Always => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub predicate: Predicate,
    pub label: QuestionType,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    /// Id rules sit in front of the text rules, in insertion order.
    id_rules: usize,
}

impl Classifier {
    /// Text rules from the config followed by the multiple-choice catch-all.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let lowered = |phrases: &[String]| -> Vec<String> {
            phrases.iter().map(|p| p.to_lowercase()).collect()
        };

        let rules = vec![
            Rule {
                predicate: Predicate::TextContainsAny(lowered(&config.skip_phrases)),
                label: QuestionType::Skip,
            },
            Rule {
                predicate: Predicate::TextContainsAny(lowered(&config.free_text_phrases)),
                label: QuestionType::FreeText,
            },
            Rule {
                predicate: Predicate::TextContainsAny(lowered(&config.select_all_phrases)),
                label: QuestionType::SelectAll,
            },
            Rule {
                predicate: Predicate::Always,
                label: QuestionType::MultipleChoice,
            },
        ];

        Self { rules, id_rules: 0 }
    }

    /// Label the given ids ahead of every text rule.
    pub fn with_id_rule<I, S>(mut self, ids: I, label: QuestionType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = Rule {
            predicate: Predicate::IdIn(ids.into_iter().map(Into::into).collect()),
            label,
        };
        self.rules.insert(self.id_rules, rule);
        self.id_rules += 1;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule wins.
    pub fn classify(&self, question: &Question) -> QuestionType {
        let lowered = question.text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(question, &lowered))
            .map(|rule| rule.label)
            .unwrap_or(QuestionType::MultipleChoice)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, text: &str) -> Question {
        Question {
            id: id.to_string(),
            text: text.to_string(),
            answers: Vec::new(),
        }
    }

    #[test]
    fn test_default_text_rules() {
        let classifier = Classifier::default();

        assert_eq!(
            classifier.classify(&question("1", "I CONSENT to participate")),
            QuestionType::Skip
        );
        assert_eq!(
            classifier.classify(&question("2", "Briefly describe your last trip")),
            QuestionType::FreeText
        );
        assert_eq!(
            classifier.classify(&question("3", "If you selected \"Other\", please specify")),
            QuestionType::FreeText
        );
        assert_eq!(
            classifier.classify(&question("4", "Which apps do you use? (Select all that apply)")),
            QuestionType::SelectAll
        );
        assert_eq!(
            classifier.classify(&question("5", "How many trips did you take last year?")),
            QuestionType::MultipleChoice
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let classifier = Classifier::default();
        // Matches both the skip and the select-all phrase
        let q = question("1", "Select all that apply: consent forms you signed");
        assert_eq!(classifier.classify(&q), QuestionType::Skip);
    }

    #[test]
    fn test_id_rules_take_precedence_in_insertion_order() {
        let classifier = Classifier::default()
            .with_id_rule(["likert-1"], QuestionType::Likert)
            .with_id_rule(["rank-1", "likert-1"], QuestionType::Ranking);

        assert_eq!(
            classifier.classify(&question("likert-1", "Do you consent? 1-5")),
            QuestionType::Likert
        );
        assert_eq!(
            classifier.classify(&question("rank-1", "Which was BEST?")),
            QuestionType::Ranking
        );
        assert_eq!(classifier.rules().len(), 6);
        assert!(matches!(
            classifier.rules().last().map(|r| &r.predicate),
            Some(Predicate::Always)
        ));
    }

    #[test]
    fn test_custom_phrases_are_case_insensitive() {
        let config = ClassifierConfig {
            free_text_phrases: vec!["Tell Us More".to_string()],
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::from_config(&config);
        assert_eq!(
            classifier.classify(&question("1", "tell us more about it")),
            QuestionType::FreeText
        );
    }
}
