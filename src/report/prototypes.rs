//! Prototype comparison report: plain text sections plus a JSON mirror.

use crate::models::{ComparisonReport, GroupSummary, OmnibusResult, QuestionPairwise, RankingResult};
use anyhow::Result;

fn banner(title: &str) -> String {
    let rule = "=".repeat(80);
    format!("{rule}\n{title}\n{rule}\n")
}

fn yes_no(significant: bool) -> &'static str {
    if significant {
        "YES"
    } else {
        "NO"
    }
}

/// Full text report, as printed and written to `analysis_results.txt`.
pub fn generate_text_report(report: &ComparisonReport) -> String {
    let mut output = String::new();

    output.push_str(&descriptive_section(&report.descriptive));
    output.push('\n');
    output.push_str(&omnibus_section(&report.omnibus));
    output.push('\n');
    output.push_str(&pairwise_section(&report.pairwise));
    output.push('\n');
    output.push_str(&ranking_section(&report.ranking));

    output
}

fn descriptive_section(summaries: &[GroupSummary]) -> String {
    let mut section = banner("DESCRIPTIVE STATISTICS");

    for summary in summaries {
        section.push_str(&format!("\n--- Prototype {} ---\n", summary.group));
        for (label, stats) in &summary.questions {
            section.push_str(&format!("\n{}:\n", label));
            match stats {
                Some(s) => {
                    section.push_str(&format!("  Mean: {:.2} (SD: {:.2})\n", s.mean, s.std));
                    section.push_str(&format!("  Median: {:.1}\n", s.median));
                    section.push_str(&format!("  Range: {}-{}\n", s.min, s.max));
                    section.push_str(&format!("  N: {}\n", s.n));
                }
                None => section.push_str("  No valid responses\n"),
            }
        }
    }

    section
}

fn omnibus_section(results: &[OmnibusResult]) -> String {
    let mut section = banner("CHI-SQUARED OMNIBUS TESTS (Across All Prototypes)");

    for test in results {
        section.push_str(&format!("\n{}:\n", test.question));
        if test.result.is_placeholder() {
            section.push_str(&format!("  {}\n", note_or_default(&test.result.note)));
            continue;
        }

        section.push_str(&format!(
            "  χ² = {:.3}, p = {:.4}\n",
            test.result.statistic.unwrap_or(0.0),
            test.result.p_value
        ));
        section.push_str(&format!("  Significant: {}\n", yes_no(test.result.significant)));
        if test.result.significant {
            section.push_str("  → Proceeding with pairwise comparisons\n");
        }
    }

    section
}

fn note_or_default(note: &Option<String>) -> &str {
    note.as_deref().unwrap_or("Test not applicable")
}

fn pairwise_section(results: &[QuestionPairwise]) -> String {
    let mut section = banner("PAIRWISE KOLMOGOROV-SMIRNOV TESTS (Bonferroni Corrected)");

    if results.is_empty() {
        section.push_str("\nNo significant omnibus results; no pairwise comparisons run.\n");
        return section;
    }

    for question in results {
        section.push_str(&format!("\n{}:\n", question.question));
        for pair in &question.pairs {
            let result = &pair.result;
            section.push_str(&format!("  {}:\n", pair.label()));
            section.push_str(&format!(
                "    KS statistic: {:.3}\n",
                result.statistic.unwrap_or(0.0)
            ));
            section.push_str(&format!("    p-value (raw): {:.4}\n", result.p_value));
            section.push_str(&format!(
                "    p-value (adjusted): {:.4}\n",
                result.adjusted_p_value.unwrap_or(result.p_value)
            ));
            section.push_str(&format!("    Significant: {}\n", yes_no(result.significant)));
        }
    }

    section
}

fn ranking_section(results: &[RankingResult]) -> String {
    let mut section = banner("RANKING QUESTIONS ANALYSIS");

    for ranking in results {
        section.push_str(&format!("\n{}:\n", ranking.label));
        for (prototype, count) in ranking.counts.iter() {
            section.push_str(&format!("  {}: {} votes\n", prototype, count));
        }
        match ranking.result.statistic {
            Some(statistic) => {
                section.push_str(&format!(
                    "  χ² = {:.3}, p = {:.4}\n",
                    statistic, ranking.result.p_value
                ));
                section.push_str(&format!(
                    "  Significant: {}\n",
                    yes_no(ranking.result.significant)
                ));
            }
            None => {
                section.push_str(&format!("  {}\n", note_or_default(&ranking.result.note)));
            }
        }
    }

    section
}

/// JSON mirror of the text report.
pub fn generate_comparison_json(report: &ComparisonReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FrequencyCounts, NumericSummary, PairwiseResult, ReportMetadata, TestResult,
    };
    use chrono::Utc;

    fn create_test_report() -> ComparisonReport {
        let stats = NumericSummary {
            mean: 4.25,
            median: 4.5,
            std: 0.957,
            min: 3,
            max: 5,
            n: 4,
        };

        let mut adjusted = TestResult::computed(0.75, 0.01, 0, 0.05);
        adjusted.adjusted_p_value = Some(0.03);

        let mut counts = FrequencyCounts::new();
        counts.add_count("Prototype A", 12);
        counts.add_count("Prototype B", 3);

        ComparisonReport {
            metadata: ReportMetadata {
                input: "survey_data.json".to_string(),
                analysis_date: Utc::now(),
                questions: 18,
                respondents: 15,
                charts: Vec::new(),
            },
            groups: vec!["A".to_string(), "B".to_string()],
            descriptive: vec![GroupSummary {
                group: "A".to_string(),
                questions: vec![
                    ("Easy to Use".to_string(), Some(stats)),
                    ("Has Features Needed".to_string(), None),
                ],
            }],
            omnibus: vec![
                OmnibusResult {
                    question: "Easy to Use".to_string(),
                    contingency_table: vec![vec![0, 0, 1, 1, 2], vec![3, 1, 0, 0, 0]],
                    result: TestResult::computed(9.5, 0.0497, 4, 0.05),
                },
                OmnibusResult {
                    question: "Has Features Needed".to_string(),
                    contingency_table: vec![vec![0; 5], vec![0; 5]],
                    result: TestResult::placeholder("No variation in data"),
                },
            ],
            pairwise: vec![QuestionPairwise {
                question: "Easy to Use".to_string(),
                pairs: vec![PairwiseResult {
                    first: "A".to_string(),
                    second: "B".to_string(),
                    result: adjusted,
                }],
            }],
            ranking: vec![RankingResult {
                label: "BEST".to_string(),
                counts,
                total_responses: 15,
                result: TestResult::computed(5.4, 0.0201, 1, 0.05),
            }],
        }
    }

    #[test]
    fn test_text_report_sections_in_order() {
        let text = generate_text_report(&create_test_report());

        let positions: Vec<usize> = [
            "DESCRIPTIVE STATISTICS",
            "CHI-SQUARED OMNIBUS TESTS",
            "PAIRWISE KOLMOGOROV-SMIRNOV TESTS (Bonferroni Corrected)",
            "RANKING QUESTIONS ANALYSIS",
        ]
        .iter()
        .map(|heading| text.find(heading).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_descriptive_section() {
        let text = generate_text_report(&create_test_report());
        assert!(text.contains("--- Prototype A ---"));
        assert!(text.contains("  Mean: 4.25 (SD: 0.96)"));
        assert!(text.contains("  Median: 4.5"));
        assert!(text.contains("  Range: 3-5"));
        assert!(text.contains("  N: 4"));
        assert!(text.contains("  No valid responses"));
    }

    #[test]
    fn test_omnibus_section() {
        let text = generate_text_report(&create_test_report());
        assert!(text.contains("  χ² = 9.500, p = 0.0497"));
        assert!(text.contains("  → Proceeding with pairwise comparisons"));
        assert!(text.contains("  No variation in data"));
    }

    #[test]
    fn test_pairwise_and_ranking_sections() {
        let text = generate_text_report(&create_test_report());
        assert!(text.contains("  A vs B:"));
        assert!(text.contains("    KS statistic: 0.750"));
        assert!(text.contains("    p-value (raw): 0.0100"));
        assert!(text.contains("    p-value (adjusted): 0.0300"));
        assert!(text.contains("  Prototype A: 12 votes"));
        assert!(text.contains("  χ² = 5.400, p = 0.0201"));
    }

    #[test]
    fn test_pairwise_section_without_comparisons() {
        let mut report = create_test_report();
        report.pairwise.clear();
        let text = generate_text_report(&report);
        assert!(text.contains("no pairwise comparisons run"));
    }

    #[test]
    fn test_generate_comparison_json() {
        let json = generate_comparison_json(&create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["groups"][1], "B");
        assert_eq!(value["ranking"][0]["counts"]["Prototype A"], 12);
        assert_eq!(value["omnibus"][1]["result"]["note"], "No variation in data");
    }
}
