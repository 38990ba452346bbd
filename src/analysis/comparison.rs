//! Prototype comparison.
//!
//! Collects Likert answers per group and question, then runs the omnibus,
//! pairwise and ranking tests.

use crate::analysis::aggregator::{describe, parse_likert, rating_counts};
use crate::analysis::hypothesis::{chi2_goodness_of_fit, chi2_independence, pairwise_ks};
use crate::config::PrototypeConfig;
use crate::error::StatsError;
use crate::models::{
    FrequencyCounts, GroupSummary, OmnibusResult, QuestionPairwise, RankingResult,
};
use crate::survey::ResponseTable;
use tracing::{debug, info};

/// Parsed Likert ratings, indexed by group then question.
#[derive(Debug, Clone, Default)]
pub struct LikertData {
    pub groups: Vec<String>,
    pub labels: Vec<String>,
    values: Vec<Vec<Vec<i64>>>,
}

impl LikertData {
    /// Pull every configured Likert question out of the response table.
    pub fn from_table(table: &ResponseTable, config: &PrototypeConfig) -> Self {
        let values = config
            .groups
            .iter()
            .map(|group| {
                group
                    .questions
                    .iter()
                    .map(|q| {
                        debug!(
                            "Group {} question {} ({}): {} answers",
                            group.name,
                            q.id,
                            q.label,
                            table.respondents(&q.id)
                        );
                        parse_likert(table.answers(&q.id))
                    })
                    .collect()
            })
            .collect();

        Self::new(
            config.groups.iter().map(|g| g.name.clone()).collect(),
            config.question_labels(),
            values,
        )
    }

    /// Build directly from ratings; `values[group][question]`.
    pub fn new(groups: Vec<String>, labels: Vec<String>, values: Vec<Vec<Vec<i64>>>) -> Self {
        Self {
            groups,
            labels,
            values,
        }
    }

    pub fn values(&self, group: usize, question: usize) -> &[i64] {
        self.values
            .get(group)
            .and_then(|g| g.get(question))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Groups x ratings 1-5 counts for one question.
    pub fn contingency_table(&self, question: usize) -> Vec<Vec<usize>> {
        (0..self.groups.len())
            .map(|g| rating_counts(self.values(g, question)).to_vec())
            .collect()
    }
}

/// Descriptive statistics per group and question.
pub fn descriptive_stats(data: &LikertData) -> Vec<GroupSummary> {
    data.groups
        .iter()
        .enumerate()
        .map(|(g, group)| GroupSummary {
            group: group.clone(),
            questions: data
                .labels
                .iter()
                .enumerate()
                .map(|(q, label)| (label.clone(), describe(data.values(g, q))))
                .collect(),
        })
        .collect()
}

/// Chi-squared omnibus test of every question across all groups.
pub fn omnibus_tests(data: &LikertData, alpha: f64) -> Result<Vec<OmnibusResult>, StatsError> {
    data.labels
        .iter()
        .enumerate()
        .map(|(q, label)| {
            let table = data.contingency_table(q);
            let result = chi2_independence(&table, alpha)?;
            debug!("Omnibus {}: p = {:.4}", label, result.p_value);
            Ok(OmnibusResult {
                question: label.clone(),
                contingency_table: table,
                result,
            })
        })
        .collect()
}

/// Pairwise KS tests, only for questions whose omnibus test was significant.
pub fn pairwise_tests(
    data: &LikertData,
    omnibus: &[OmnibusResult],
    alpha: f64,
) -> Result<Vec<QuestionPairwise>, StatsError> {
    let mut results = Vec::new();

    for (q, test) in omnibus.iter().enumerate() {
        if !test.result.significant {
            continue;
        }

        let samples: Vec<(String, Vec<f64>)> = data
            .groups
            .iter()
            .enumerate()
            .map(|(g, name)| {
                let values = data.values(g, q).iter().map(|&v| v as f64).collect();
                (name.clone(), values)
            })
            .collect();

        info!("Running pairwise comparisons for {}", test.question);
        results.push(QuestionPairwise {
            question: test.question.clone(),
            pairs: pairwise_ks(&samples, alpha)?,
        });
    }

    Ok(results)
}

/// Votes per group for each ranking question, tested against a uniform split.
pub fn ranking_tests(
    table: &ResponseTable,
    config: &PrototypeConfig,
    alpha: f64,
) -> Result<Vec<RankingResult>, StatsError> {
    config
        .ranking_questions
        .iter()
        .map(|question| {
            let answers = table.answers(&question.id);

            let mut counts = FrequencyCounts::new();
            for group in &config.groups {
                let votes = answers
                    .iter()
                    .filter(|a| a.contains(group.ranking_label.as_str()))
                    .count();
                counts.add_count(&group.ranking_label, votes);
            }

            let observed: Vec<usize> = counts.iter().map(|(_, c)| c).collect();
            let result = chi2_goodness_of_fit(&observed, alpha)?;

            Ok(RankingResult {
                label: question.label.clone(),
                total_responses: counts.total(),
                counts,
                result,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroupConfig, LabeledQuestion};
    use crate::models::Question;

    const ALPHA: f64 = 0.05;

    fn question(id: &str, answers: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            answers: answers.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn two_group_config() -> PrototypeConfig {
        let group = |name: &str, id: &str| GroupConfig {
            name: name.to_string(),
            ranking_label: format!("Prototype {}", name),
            questions: vec![LabeledQuestion {
                id: id.to_string(),
                label: "Easy to Use".to_string(),
            }],
        };
        PrototypeConfig {
            groups: vec![group("A", "a1"), group("B", "b1")],
            ranking_questions: vec![LabeledQuestion {
                id: "best".to_string(),
                label: "BEST".to_string(),
            }],
        }
    }

    fn table(questions: &[Question]) -> ResponseTable {
        ResponseTable::from_questions(questions)
    }

    #[test]
    fn test_likert_data_from_table() {
        let config = two_group_config();
        let table = table(&[
            question("a1", &["5", "4", "n/a", "5"]),
            question("b1", &["1", "2"]),
        ]);
        let data = LikertData::from_table(&table, &config);

        assert_eq!(data.groups, vec!["A", "B"]);
        assert_eq!(data.values(0, 0), &[5, 4, 5]);
        assert_eq!(data.values(1, 0), &[1, 2]);
        assert!(data.values(5, 0).is_empty());
        assert_eq!(data.contingency_table(0), vec![vec![0, 0, 0, 1, 2], vec![1, 1, 0, 0, 0]]);
    }

    #[test]
    fn test_descriptive_stats() {
        let data = LikertData::new(
            vec!["A".to_string()],
            vec!["Easy".to_string(), "Missing".to_string()],
            vec![vec![vec![4, 5, 3], vec![]]],
        );
        let summaries = descriptive_stats(&data);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].summary("Easy").map(|s| s.n), Some(3));
        assert!(summaries[0].summary("Missing").is_none());
    }

    #[test]
    fn test_pairwise_runs_only_for_significant_omnibus() {
        let groups = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let labels = vec!["Different".to_string(), "Same".to_string()];
        let values = vec![
            vec![vec![1; 12], vec![3, 4, 5, 3, 4, 5]],
            vec![vec![5; 12], vec![3, 4, 5, 3, 4, 5]],
            vec![vec![3; 12], vec![5, 4, 3, 5, 4, 3]],
        ];
        let data = LikertData::new(groups, labels, values);

        let omnibus = omnibus_tests(&data, ALPHA).unwrap();
        assert!(omnibus[0].result.significant);
        assert!(!omnibus[1].result.significant);

        let pairwise = pairwise_tests(&data, &omnibus, ALPHA).unwrap();
        assert_eq!(pairwise.len(), 1);
        assert_eq!(pairwise[0].question, "Different");
        assert_eq!(pairwise[0].pairs.len(), 3);
        for pair in &pairwise[0].pairs {
            let adjusted = pair.result.adjusted_p_value.unwrap();
            assert!(adjusted >= pair.result.p_value);
            assert!(adjusted <= 1.0);
        }
    }

    #[test]
    fn test_pairwise_skipped_when_nothing_significant() {
        let data = LikertData::new(
            vec!["A".to_string(), "B".to_string()],
            vec!["Q".to_string()],
            vec![vec![vec![3, 4]], vec![vec![4, 3]]],
        );
        let omnibus = omnibus_tests(&data, ALPHA).unwrap();
        assert!(pairwise_tests(&data, &omnibus, ALPHA).unwrap().is_empty());
    }

    #[test]
    fn test_ranking_tests_count_votes_by_label() {
        let mut config = two_group_config();
        config.groups.push(GroupConfig {
            name: "C".to_string(),
            ranking_label: "Prototype C".to_string(),
            questions: vec![LabeledQuestion {
                id: "c1".to_string(),
                label: "Easy to Use".to_string(),
            }],
        });

        let mut answers: Vec<String> = Vec::new();
        for label in ["Prototype A", "Prototype B", "Prototype C"] {
            for _ in 0..10 {
                answers.push(format!("{} (the map one)", label));
            }
        }
        let answer_refs: Vec<&str> = answers.iter().map(String::as_str).collect();
        let table = table(&[question("best", &answer_refs)]);

        let results = ranking_tests(&table, &config, ALPHA).unwrap();
        assert_eq!(results.len(), 1);
        let best = &results[0];
        assert_eq!(best.label, "BEST");
        assert_eq!(best.total_responses, 30);
        assert_eq!(best.counts.get("Prototype B"), 10);
        assert!((best.result.p_value - 1.0).abs() < 1e-12);
        assert!(!best.result.significant);
    }
}
