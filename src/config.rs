//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.surveystat.toml` files.

use crate::models::DEFAULT_ALPHA;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".surveystat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Question classification settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Prototype comparison settings.
    #[serde(default)]
    pub prototypes: PrototypeConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Survey JSON file.
    #[serde(default = "default_input")]
    pub input: String,

    /// Directory charts and reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Significance threshold for every test.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_dir: default_output_dir(),
            verbose: false,
            alpha: default_alpha(),
        }
    }
}

fn default_input() -> String {
    "survey_data.json".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// Phrase lists driving the text rules of the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Questions containing any of these are skipped.
    #[serde(default = "default_skip_phrases")]
    pub skip_phrases: Vec<String>,

    /// Questions containing any of these are free text.
    #[serde(default = "default_free_text_phrases")]
    pub free_text_phrases: Vec<String>,

    /// Questions containing any of these are select-all.
    #[serde(default = "default_select_all_phrases")]
    pub select_all_phrases: Vec<String>,

    /// Separator between options of a select-all answer.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Answers ignored for select-all questions and response totals.
    #[serde(default = "default_select_all_excluded")]
    pub select_all_excluded: Vec<String>,

    /// Answers ignored for multiple-choice counts.
    #[serde(default = "default_multiple_choice_excluded")]
    pub multiple_choice_excluded: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            skip_phrases: default_skip_phrases(),
            free_text_phrases: default_free_text_phrases(),
            select_all_phrases: default_select_all_phrases(),
            delimiter: default_delimiter(),
            select_all_excluded: default_select_all_excluded(),
            multiple_choice_excluded: default_multiple_choice_excluded(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_skip_phrases() -> Vec<String> {
    strings(&["consent"])
}

fn default_free_text_phrases() -> Vec<String> {
    strings(&[
        "briefly describe",
        "if you selected \"other\"",
        "if you could magically conjure",
    ])
}

fn default_select_all_phrases() -> Vec<String> {
    strings(&["select all that apply"])
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_select_all_excluded() -> Vec<String> {
    strings(&["n/a", "na", "none"])
}

fn default_multiple_choice_excluded() -> Vec<String> {
    strings(&["n/a", "na"])
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Render PNG charts at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bar chart size in pixels.
    #[serde(default = "default_bar_size")]
    pub bar_size: (u32, u32),

    /// Pie chart size in pixels.
    #[serde(default = "default_pie_size")]
    pub pie_size: (u32, u32),

    /// Column width category labels are wrapped at.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,

    /// Slices kept before the rest collapse into "Other Categories".
    #[serde(default = "default_pie_cap")]
    pub pie_cap: usize,

    /// Multiple-choice questions with more distinct answers get no pie chart.
    #[serde(default = "default_pie_max_categories")]
    pub pie_max_categories: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bar_size: default_bar_size(),
            pie_size: default_pie_size(),
            wrap_width: default_wrap_width(),
            pie_cap: default_pie_cap(),
            pie_max_categories: default_pie_max_categories(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bar_size() -> (u32, u32) {
    (1400, 700)
}

fn default_pie_size() -> (u32, u32) {
    (1000, 800)
}

fn default_wrap_width() -> usize {
    25
}

fn default_pie_cap() -> usize {
    7
}

fn default_pie_max_categories() -> usize {
    10
}

/// A question referenced by id, with the short label used in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledQuestion {
    pub id: String,
    pub label: String,
}

impl LabeledQuestion {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

/// One compared prototype and its Likert questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Short group name ("A").
    pub name: String,

    /// Text identifying a vote for this group in ranking answers.
    pub ranking_label: String,

    /// Likert questions, in the same label order for every group.
    #[serde(default)]
    pub questions: Vec<LabeledQuestion>,
}

/// Prototype comparison settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrototypeConfig {
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,

    #[serde(default = "default_ranking_questions")]
    pub ranking_questions: Vec<LabeledQuestion>,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            ranking_questions: default_ranking_questions(),
        }
    }
}

const LIKERT_LABELS: [&str; 5] = [
    "Understand Tasks",
    "Understand How to Use",
    "Easy to Use",
    "Has Features Needed",
    "Superior to Existing Tools",
];

fn group(name: &str, ids: [&str; 5]) -> GroupConfig {
    GroupConfig {
        name: name.to_string(),
        ranking_label: format!("Prototype {}", name),
        questions: ids
            .iter()
            .zip(LIKERT_LABELS)
            .map(|(id, label)| LabeledQuestion::new(id, label))
            .collect(),
    }
}

fn default_groups() -> Vec<GroupConfig> {
    vec![
        group(
            "A",
            [
                "1763429742172",
                "1763429933708",
                "1763429972190",
                "1763430192770",
                "1763430096428",
            ],
        ),
        group(
            "B",
            [
                "1763431473322",
                "1763431486831",
                "1763431509699",
                "1763431525649",
                "1763431567705",
            ],
        ),
        group(
            "C",
            [
                "1763433215212",
                "1763433230680",
                "1763433260707",
                "1763433293713",
                "1763433312274",
            ],
        ),
    ]
}

fn default_ranking_questions() -> Vec<LabeledQuestion> {
    vec![
        LabeledQuestion::new("1763433609862", "BEST"),
        LabeledQuestion::new("1763433957657", "SECOND BEST"),
        LabeledQuestion::new("1763434721787", "WORST"),
    ]
}

impl PrototypeConfig {
    /// Question labels in the order of the first group.
    pub fn question_labels(&self) -> Vec<String> {
        self.groups
            .first()
            .map(|g| g.questions.iter().map(|q| q.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Every Likert question id across all groups.
    pub fn likert_ids(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|g| g.questions.iter().map(|q| q.id.clone()))
            .collect()
    }

    /// Every ranking question id.
    pub fn ranking_ids(&self) -> Vec<String> {
        self.ranking_questions.iter().map(|q| q.id.clone()).collect()
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check values that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.general.alpha > 0.0 && self.general.alpha < 1.0) {
            bail!("alpha must be between 0 and 1, got {}", self.general.alpha);
        }

        if self.classifier.delimiter.is_empty() {
            bail!("select-all delimiter must not be empty");
        }

        let labels = self.prototypes.question_labels();
        for group in &self.prototypes.groups {
            let group_labels: Vec<&String> = group.questions.iter().map(|q| &q.label).collect();
            if group_labels != labels.iter().collect::<Vec<_>>() {
                bail!(
                    "group '{}' must list the same question labels in the same order as the first group",
                    group.name
                );
            }
        }

        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.to_string_lossy().to_string();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.output_dir = dir.to_string_lossy().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.no_charts {
            self.charts.enabled = false;
        }
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.general.input)
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.output_dir)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
