//! Needfinding report generation.
//!
//! Produces the per-question console narrative, the JSON summary and an
//! optional Markdown report from the aggregated survey results.

use crate::models::{truncate, Aggregate, QuestionResult, SurveyReport, SurveyResults};
use anyhow::Result;

const RULE_WIDTH: usize = 80;

/// Number of answers listed under "Top responses".
pub const TOP_RESPONSES: usize = 5;

/// Banner printed before the per-question narrative.
pub fn format_header(respondents: usize) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{rule}\nSURVEY DATA ANALYSIS\n{rule}\n\nTotal respondents: {}\n",
        respondents
    )
}

/// Console narrative for one analyzed question.
pub fn format_question_summary(id: &str, result: &QuestionResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("\nQuestion {} (ID: {})\n", result.number, id));
    out.push_str(&"-".repeat(60));
    out.push('\n');
    out.push_str(&format!("Question: {}\n", truncate(&result.question, 100)));
    out.push_str(&format!("Type: {}\n", result.kind));

    match &result.statistics {
        Aggregate::Frequencies(counts) => {
            out.push_str(&format!("Total responses: {}\n", result.total_responses));
            out.push_str(&format!("Unique options: {}\n", counts.len()));
            out.push_str("\nTop responses:\n");
            for (option, count) in counts.most_common(TOP_RESPONSES) {
                out.push_str(&format!(
                    "  - {}: {} ({:.1}%)\n",
                    truncate(option, 50),
                    count,
                    result.percentage(count)
                ));
            }
        }
        Aggregate::Numeric(summary) => {
            out.push_str(&format!("Total responses: {}\n", summary.n));
            out.push_str(&format!(
                "Mean: {:.2} (SD: {:.2}), Median: {:.1}, Range: {}-{}\n",
                summary.mean, summary.std, summary.median, summary.min, summary.max
            ));
        }
    }

    out
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SurveyReport) -> String {
    let mut output = String::new();

    output.push_str("# Survey Analysis Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_overview_section(&report.results));
    output.push_str(&generate_questions_section(&report.results));
    output.push_str(&generate_charts_section(&report.metadata.charts));
    output.push_str("---\n\n*Report generated by surveystat*\n");

    output
}

fn generate_metadata_section(report: &SurveyReport) -> String {
    let metadata = &report.metadata;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Questions:** {}\n", metadata.questions));
    section.push_str(&format!("- **Respondents:** {}\n", metadata.respondents));
    section.push_str(&format!("- **Questions Analyzed:** {}\n", report.results.len()));
    section.push('\n');

    section
}

/// One row per analyzed question.
fn generate_overview_section(results: &SurveyResults) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    if results.is_empty() {
        section.push_str("No questions produced countable answers.\n\n");
        return section;
    }

    section.push_str("| # | Question | Type | Responses |\n");
    section.push_str("|:---:|:---|:---|:---:|\n");
    for (_, result) in &results.entries {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            result.number,
            escape_cell(&truncate(&result.question, 60)),
            result.kind,
            result.total_responses
        ));
    }
    section.push('\n');

    section
}

fn generate_questions_section(results: &SurveyResults) -> String {
    let mut section = String::new();

    for (id, result) in &results.entries {
        section.push_str(&format!("## Q{}: {}\n\n", result.number, result.question));
        section.push_str(&format!(
            "*ID: `{}` | Type: {} | Responses: {}*\n\n",
            id, result.kind, result.total_responses
        ));

        match &result.statistics {
            Aggregate::Frequencies(counts) => {
                section.push_str("| Answer | Count | Share |\n");
                section.push_str("|:---|:---:|:---:|\n");
                for (option, count) in counts.most_common(counts.len()) {
                    section.push_str(&format!(
                        "| {} | {} | {:.1}% |\n",
                        escape_cell(option),
                        count,
                        result.percentage(count)
                    ));
                }
            }
            Aggregate::Numeric(summary) => {
                section.push_str("| Mean | Median | SD | Min | Max | N |\n");
                section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
                section.push_str(&format!(
                    "| {:.2} | {:.1} | {:.2} | {} | {} | {} |\n",
                    summary.mean, summary.median, summary.std, summary.min, summary.max, summary.n
                ));
            }
        }
        section.push('\n');
    }

    section
}

fn generate_charts_section(charts: &[String]) -> String {
    if charts.is_empty() {
        return String::new();
    }

    let mut section = String::from("## Charts\n\n");
    for chart in charts {
        section.push_str(&format!("- ![{}]({})\n", chart, chart));
    }
    section.push('\n');
    section
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// JSON summary mapping question id to its aggregated result.
pub fn generate_json_report(results: &SurveyResults) -> Result<String> {
    serde_json::to_string_pretty(results).map_err(Into::into)
}
