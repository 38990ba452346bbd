//! Answer aggregation and chart ordering.
//!
//! This module turns raw answers into frequency counts or descriptive
//! statistics, and decides the order categories are charted in.

use crate::config::ClassifierConfig;
use crate::models::{Aggregate, FrequencyCounts, NumericSummary, Question, QuestionResult, QuestionType};
use statrs::statistics::{Data, Median, Statistics};
use tracing::debug;

/// Label of the slice that absorbs categories beyond the pie cap.
pub const OTHER_CATEGORIES: &str = "Other Categories";

static TRIP_BUCKETS: [&str; 5] = ["0 trips", "1-2 trips", "3-5 trips", "6-10 trips", "11+ trips"];
static TIME_BUCKETS: [&str; 5] = ["0 times", "1-2 times", "3-5 times", "6-10 times", "11+ times"];
static TOOL_CONSISTENCY: [&str; 5] = [
    "I use completely different tools/services/processes for different trips",
    "I mostly use different tools/services/processes for different trips",
    "Not really sure/It depends",
    "I mostly use the same tools/services/processes for both kinds of trips",
    "I use almost exactly the same tools/services/processes for both kinds of trips",
];

/// Non-empty and not one of `excluded` (case-insensitive).
pub fn is_valid_answer(answer: &str, excluded: &[String]) -> bool {
    if answer.is_empty() {
        return false;
    }
    let lowered = answer.to_lowercase();
    !excluded.iter().any(|e| *e == lowered)
}

/// Count every delimited option across all valid answers.
pub fn count_select_all<'a, I>(answers: I, delimiter: &str, excluded: &[String]) -> FrequencyCounts
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = FrequencyCounts::new();

    for answer in answers {
        if !is_valid_answer(answer, excluded) {
            continue;
        }
        for option in answer.split(delimiter).map(str::trim) {
            if !option.is_empty() {
                counts.add(option);
            }
        }
    }

    counts
}

/// Count valid answers verbatim.
pub fn count_multiple_choice<'a, I>(answers: I, excluded: &[String]) -> FrequencyCounts
where
    I: IntoIterator<Item = &'a str>,
{
    answers
        .into_iter()
        .filter(|a| is_valid_answer(a, excluded))
        .collect()
}

/// Number of answers that count as a response.
pub fn total_responses<'a, I>(answers: I, excluded: &[String]) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    answers
        .into_iter()
        .filter(|a| is_valid_answer(a, excluded))
        .count()
}

/// Keep digit-only answers as integers; everything else is dropped.
pub fn parse_likert<'a, I>(answers: I) -> Vec<i64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut dropped = 0usize;
    let values: Vec<i64> = answers
        .into_iter()
        .filter_map(|a| {
            let parsed = if !a.is_empty() && a.chars().all(|c| c.is_ascii_digit()) {
                a.parse::<i64>().ok()
            } else {
                None
            };
            if parsed.is_none() {
                dropped += 1;
            }
            parsed
        })
        .collect();

    if dropped > 0 {
        debug!("Dropped {} non-numeric Likert answers", dropped);
    }
    values
}

/// Mean, median, sample std, min, max and n. `None` for an empty list.
pub fn describe(values: &[i64]) -> Option<NumericSummary> {
    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    let floats: Vec<f64> = values.iter().map(|&v| v as f64).collect();

    Some(NumericSummary {
        mean: floats.iter().mean(),
        median: Data::new(floats.clone()).median(),
        std: floats.iter().std_dev(),
        min,
        max,
        n: values.len(),
    })
}

/// Aggregate a classified question.
///
/// Returns `None` for skipped and free-text questions.
pub fn aggregate(question: &Question, kind: QuestionType, config: &ClassifierConfig) -> Option<Aggregate> {
    let answers = question.answers.iter().map(String::as_str);

    match kind {
        QuestionType::Skip | QuestionType::FreeText => None,
        QuestionType::SelectAll => Some(Aggregate::Frequencies(count_select_all(
            answers,
            &config.delimiter,
            &config.select_all_excluded,
        ))),
        QuestionType::MultipleChoice | QuestionType::Ranking => Some(Aggregate::Frequencies(
            count_multiple_choice(answers, &config.multiple_choice_excluded),
        )),
        QuestionType::Likert => describe(&parse_likert(answers)).map(Aggregate::Numeric),
    }
}

/// Summary entry for one question, or `None` when nothing was counted.
pub fn summarize_question(
    number: usize,
    question: &Question,
    kind: QuestionType,
    config: &ClassifierConfig,
) -> Option<QuestionResult> {
    let statistics = aggregate(question, kind, config)?;
    if let Aggregate::Frequencies(ref counts) = statistics {
        if counts.is_empty() {
            debug!("Question {} has no countable answers", question.id);
            return None;
        }
    }

    Some(QuestionResult {
        number,
        question: question.text.clone(),
        kind,
        statistics,
        total_responses: total_responses(
            question.answers.iter().map(String::as_str),
            &config.select_all_excluded,
        ),
        answered: question.answers.len(),
    })
}

fn is_frequency_question(lowered: &str) -> bool {
    lowered.contains("how many trips") || lowered.contains("how many times")
}

/// Fixed category order for recognised question wordings.
pub fn custom_order(question_text: &str) -> Option<&'static [&'static str]> {
    let lowered = question_text.to_lowercase();

    if is_frequency_question(&lowered) {
        if lowered.contains("how many times") || lowered.contains("away from your home city") {
            return Some(&TIME_BUCKETS[..]);
        }
        return Some(&TRIP_BUCKETS[..]);
    }

    if lowered.contains("same basic tools/processes") {
        return Some(&TOOL_CONSISTENCY[..]);
    }

    None
}

/// Order categories for charting.
///
/// With a custom order and `include_zeros` on a trip/time frequency question,
/// every bucket is present in fixed order. Otherwise ordered buckets found in
/// the data come first, followed by the rest in first-seen order. Questions
/// without a custom order are sorted by descending count.
pub fn order_for_chart(
    counts: &FrequencyCounts,
    question_text: &str,
    include_zeros: bool,
) -> Vec<(String, usize)> {
    let Some(order) = custom_order(question_text) else {
        return counts
            .most_common(counts.len())
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
    };

    let lowered = question_text.to_lowercase();
    if include_zeros && is_frequency_question(&lowered) {
        return order
            .iter()
            .map(|bucket| (bucket.to_string(), counts.get(bucket)))
            .collect();
    }

    let mut ordered: Vec<(String, usize)> = order
        .iter()
        .filter(|bucket| counts.contains(bucket))
        .map(|bucket| (bucket.to_string(), counts.get(bucket)))
        .collect();

    for (category, count) in counts.iter() {
        if !order.contains(&category) {
            ordered.push((category.to_string(), count));
        }
    }

    ordered
}

/// Keep the first `cap` slices and merge the rest into "Other Categories"
/// once there are more than `cap + 1` slices.
pub fn collapse_other(ordered: Vec<(String, usize)>, cap: usize) -> Vec<(String, usize)> {
    if ordered.len() <= cap + 1 {
        return ordered;
    }

    let other: usize = ordered[cap..].iter().map(|(_, c)| c).sum();
    let mut kept: Vec<(String, usize)> = ordered.into_iter().take(cap).collect();
    if other > 0 {
        kept.push((OTHER_CATEGORIES.to_string(), other));
    }
    kept
}

/// Ratings 1..=5 histogram of a Likert answer list.
pub fn rating_counts(values: &[i64]) -> [usize; 5] {
    let mut counts = [0usize; 5];
    for &v in values {
        if (1..=5).contains(&v) {
            counts[(v - 1) as usize] += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluded(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_all_counts_each_option() {
        let counts = count_select_all(["Maps;Email", "Email"], ";", &excluded(&["n/a", "na", "none"]));
        assert_eq!(counts.get("Maps"), 1);
        assert_eq!(counts.get("Email"), 2);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_select_all_trims_and_skips_excluded() {
        let counts = count_select_all(
            ["Maps ; Email", "", "N/A", "None", " Maps"],
            ";",
            &excluded(&["n/a", "na", "none"]),
        );
        assert_eq!(counts.get("Maps"), 2);
        assert_eq!(counts.get("Email"), 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_select_all_drops_empty_tokens() {
        let counts = count_select_all(["Maps;", "Maps;;Email", ";"], ";", &excluded(&["n/a"]));
        assert_eq!(counts.get("Maps"), 2);
        assert_eq!(counts.get("Email"), 1);
        assert_eq!(counts.get(""), 0);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_multiple_choice_keeps_none_answers() {
        let counts = count_multiple_choice(["Yes", "None", "na", "", "Yes"], &excluded(&["n/a", "na"]));
        assert_eq!(counts.get("Yes"), 2);
        assert_eq!(counts.get("None"), 1);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_total_responses_excludes_none() {
        let total = total_responses(["Yes", "None", "n/a", ""], &excluded(&["n/a", "na", "none"]));
        assert_eq!(total, 1);
    }

    #[test]
    fn test_parse_likert_drops_non_digits() {
        let values = parse_likert(["5", "4", "", "N/A", "3.5", "-1", "2"]);
        assert_eq!(values, vec![5, 4, 2]);
    }

    #[test]
    fn test_describe() {
        let summary = describe(&[1, 2, 3, 4]).unwrap();
        assert!((summary.mean - 2.5).abs() < 1e-12);
        assert!((summary.median - 2.5).abs() < 1e-12);
        assert!((summary.std - 1.290_994_448_735_805_6).abs() < 1e-9);
        assert_eq!(summary.min, 1);
        assert_eq!(summary.max, 4);
        assert_eq!(summary.n, 4);
    }

    #[test]
    fn test_describe_single_value_has_nan_std() {
        let summary = describe(&[3]).unwrap();
        assert_eq!(summary.mean, 3.0);
        assert!(summary.std.is_nan());
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_likert_mean_within_scale_and_std_non_negative() {
        let samples: [&[i64]; 4] = [&[1, 1, 1], &[5, 5, 4, 1], &[2, 3, 4, 5, 1, 3], &[5, 5]];
        for values in samples {
            let summary = describe(values).unwrap();
            assert!((1.0..=5.0).contains(&summary.mean));
            assert!(summary.std >= 0.0);
        }
    }

    #[test]
    fn test_aggregate_skips_free_text() {
        let q = Question {
            id: "q".to_string(),
            text: "Briefly describe".to_string(),
            answers: vec!["anything".to_string()],
        };
        assert!(aggregate(&q, QuestionType::FreeText, &ClassifierConfig::default()).is_none());
    }

    #[test]
    fn test_summarize_question_select_all() {
        let q = Question {
            id: "q7".to_string(),
            text: "Which tools? Select all that apply".to_string(),
            answers: vec!["Maps;Email".to_string(), "Email".to_string(), "none".to_string()],
        };
        let result = summarize_question(7, &q, QuestionType::SelectAll, &ClassifierConfig::default()).unwrap();
        assert_eq!(result.total_responses, 2);
        match result.statistics {
            Aggregate::Frequencies(counts) => assert_eq!(counts.get("Email"), 2),
            other => panic!("unexpected aggregate: {:?}", other),
        }
    }

    #[test]
    fn test_summarize_question_without_answers() {
        let q = Question {
            id: "q".to_string(),
            text: "Pick one".to_string(),
            answers: vec!["".to_string(), "n/a".to_string()],
        };
        assert!(summarize_question(1, &q, QuestionType::MultipleChoice, &ClassifierConfig::default()).is_none());
    }

    #[test]
    fn test_trip_buckets_keep_fixed_order_with_zeros() {
        let counts: FrequencyCounts = ["3-5 trips", "0 trips", "3-5 trips"].into_iter().collect();
        let ordered = order_for_chart(&counts, "How many trips did you take for work?", true);

        let labels: Vec<&str> = ordered.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(labels, TRIP_BUCKETS.to_vec());
        let values: Vec<usize> = ordered.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1, 0, 2, 0, 0]);
    }

    #[test]
    fn test_time_buckets_detected() {
        let order = custom_order("How many times did you travel away from your home city?").unwrap();
        assert_eq!(order[0], "0 times");
        let order = custom_order("How many trips away from your home city?").unwrap();
        assert_eq!(order[4], "11+ times");
    }

    #[test]
    fn test_custom_order_without_zeros_appends_unknown() {
        let counts: FrequencyCounts = ["Other", "3-5 trips", "0 trips"].into_iter().collect();
        let ordered = order_for_chart(&counts, "How many trips did you take?", false);
        let labels: Vec<&str> = ordered.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(labels, vec!["0 trips", "3-5 trips", "Other"]);
    }

    #[test]
    fn test_default_order_is_descending_frequency() {
        let counts: FrequencyCounts = ["b", "a", "a", "c", "a", "c"].into_iter().collect();
        let ordered = order_for_chart(&counts, "Favourite colour?", true);
        assert_eq!(
            ordered,
            vec![("a".to_string(), 3), ("c".to_string(), 2), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_collapse_other() {
        let slices: Vec<(String, usize)> = (0..10).map(|i| (format!("c{}", i), 10 - i)).collect();
        let collapsed = collapse_other(slices, 7);
        assert_eq!(collapsed.len(), 8);
        assert_eq!(collapsed[7], (OTHER_CATEGORIES.to_string(), 3 + 2 + 1));

        let eight: Vec<(String, usize)> = (0..8).map(|i| (format!("c{}", i), 1)).collect();
        assert_eq!(collapse_other(eight.clone(), 7), eight);
    }

    #[test]
    fn test_rating_counts() {
        assert_eq!(rating_counts(&[1, 5, 5, 3, 7]), [1, 0, 1, 0, 2]);
    }
}
