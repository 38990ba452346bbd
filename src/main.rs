//! SurveyStat - statistics and charts for survey responses
//!
//! A CLI tool that classifies survey questions, counts answers, compares
//! prototypes with chi-squared and Kolmogorov-Smirnov tests, and writes
//! charts plus text and JSON reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, bad config, failed write, etc.)

mod analysis;
mod charts;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod survey;

use analysis::comparison::{descriptive_stats, omnibus_tests, pairwise_tests, ranking_tests};
use analysis::LikertData;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AnalysisMode, Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Aggregate, ComparisonReport, QuestionType, ReportMetadata, SurveyReport, SurveyResults};
use std::path::{Path, PathBuf};
use survey::{load_survey, Classifier, Survey};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (config, notes) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("SurveyStat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    for note in notes {
        note.log();
    }

    match run(&args, &config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .surveystat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize question phrases, prototype groups, charts, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `--quiet` wins; otherwise `verbose = true` in the config file also
/// enables debug output.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Read the survey and dispatch to the selected analysis.
fn run(args: &Args, config: &Config) -> Result<()> {
    let input = config.input_path();
    println!("📥 Loading survey: {}", input.display());
    let survey = load_survey(&input)
        .with_context(|| format!("Could not load survey from {}", input.display()))?;

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory {}", output_dir.display())
    })?;

    match args.mode {
        AnalysisMode::Needfinding => run_needfinding(config, &survey, &output_dir, args.format),
        AnalysisMode::Prototypes => run_prototypes(config, &survey, &output_dir),
    }
}

fn metadata(config: &Config, survey: &Survey, charts: Vec<String>) -> ReportMetadata {
    ReportMetadata {
        input: config.general.input.clone(),
        analysis_date: Utc::now(),
        questions: survey.len(),
        respondents: survey.respondent_count(),
        charts,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Per-question frequency analysis with bar and pie charts.
fn run_needfinding(
    config: &Config,
    survey: &Survey,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let classifier = Classifier::from_config(&config.classifier);
    debug!("Classifier has {} rules", classifier.rules().len());
    let chart_config = &config.charts;

    print!("{}", report::format_header(survey.respondent_count()));

    let mut results = SurveyResults::default();
    let mut chart_files: Vec<String> = Vec::new();
    let mut chart_number = 1;

    for (i, question) in survey.questions.iter().enumerate() {
        let number = i + 1;
        let kind = classifier.classify(question);
        if !kind.is_analyzed() {
            debug!("Skipping question {} ({})", question.id, kind);
            continue;
        }

        let Some(result) = analysis::summarize_question(number, question, kind, &config.classifier)
        else {
            continue;
        };

        print!("{}", report::format_question_summary(&question.id, &result));

        if chart_config.enabled {
            if let Aggregate::Frequencies(ref counts) = result.statistics {
                let title = format!("Q{}: {}", number, question.short_text(60));

                let name = format!("chart_{:02}_q{}_bar.png", chart_number, number);
                let ordered = analysis::order_for_chart(counts, &question.text, true);
                charts::draw_frequency_bars(&output_dir.join(&name), &title, &ordered, chart_config)?;
                println!("  Saved: {}", name);
                chart_files.push(name);
                chart_number += 1;

                if kind == QuestionType::MultipleChoice && counts.len() <= chart_config.pie_max_categories {
                    let name = format!("chart_{:02}_q{}_pie.png", chart_number, number);
                    let slices = analysis::collapse_other(
                        analysis::order_for_chart(counts, &question.text, false),
                        chart_config.pie_cap,
                    );
                    charts::draw_pie(&output_dir.join(&name), &title, &slices, chart_config)?;
                    println!("  Saved: {}", name);
                    chart_files.push(name);
                    chart_number += 1;
                }
            }
        }

        results.entries.push((question.id.clone(), result));
    }

    info!(
        "Analyzed {} of {} questions, {} charts",
        results.len(),
        survey.len(),
        chart_files.len()
    );

    let (path, content) = match format {
        OutputFormat::Json => (
            output_dir.join("survey_results.json"),
            report::generate_json_report(&results)?,
        ),
        OutputFormat::Markdown => {
            let report = SurveyReport {
                metadata: metadata(config, survey, chart_files.clone()),
                results,
            };
            (
                output_dir.join("survey_results.md"),
                report::generate_markdown_report(&report),
            )
        }
    };
    write_output(&path, &content)?;
    println!("\nResults saved to {}", path.display());

    println!("\n{}", "=".repeat(80));
    if chart_config.enabled {
        println!("✅ Analysis complete! {} charts saved as PNG files.", chart_files.len());
    } else {
        println!("✅ Analysis complete! Chart rendering was disabled.");
    }
    println!("   Numerical results have been saved to '{}'", file_name(&path));
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Likert and ranking comparison across prototype groups.
fn run_prototypes(config: &Config, survey: &Survey, output_dir: &Path) -> Result<()> {
    let prototypes = &config.prototypes;
    let alpha = config.general.alpha;

    let classifier = Classifier::from_config(&config.classifier)
        .with_id_rule(prototypes.likert_ids(), QuestionType::Likert)
        .with_id_rule(prototypes.ranking_ids(), QuestionType::Ranking);
    check_coverage(survey, &classifier, prototypes.likert_ids().len(), prototypes.ranking_ids().len());

    println!("📊 Processing Likert scale questions...");
    let table = survey.response_table();
    if table.is_empty() {
        warn!("Survey contains no answers");
    }
    debug!("Response table has {} rows", table.len());
    let data = LikertData::from_table(&table, prototypes);

    println!("📈 Calculating descriptive statistics...");
    let descriptive = descriptive_stats(&data);

    println!("🔬 Performing chi-squared omnibus tests...");
    let omnibus = omnibus_tests(&data, alpha)?;

    println!("🔬 Performing pairwise Kolmogorov-Smirnov tests...");
    let pairwise = pairwise_tests(&data, &omnibus, alpha)?;

    println!("🗳️  Analyzing ranking questions...");
    let ranking = ranking_tests(&table, prototypes, alpha)?;

    let mut chart_files: Vec<String> = Vec::new();
    if config.charts.enabled {
        println!("🎨 Creating visualizations...");
        let rendered: Vec<PathBuf> = vec![
            charts::draw_mean_scores(
                &output_dir.join("mean_scores_comparison.png"),
                &descriptive,
                &data.labels,
            )?,
            charts::draw_distributions(&output_dir.join("distribution_plots.png"), &data)?,
            charts::draw_rankings(&output_dir.join("ranking_analysis.png"), &ranking)?,
            charts::draw_summary_table(
                &output_dir.join("summary_table.png"),
                &descriptive,
                &data.labels,
            )?,
        ];
        for path in rendered {
            println!("  Saved: {}", file_name(&path));
            chart_files.push(file_name(&path));
        }
    }

    let comparison = ComparisonReport {
        metadata: metadata(config, survey, chart_files),
        groups: data.groups.clone(),
        descriptive,
        omnibus,
        pairwise,
        ranking,
    };

    let json_path = output_dir.join("prototype_results.json");
    write_output(&json_path, &report::generate_comparison_json(&comparison)?)?;

    let text = report::generate_text_report(&comparison);
    println!("\n{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE - RESULTS SUMMARY");
    println!("{}", text);

    println!("\nSaving results to file...");
    let text_path = output_dir.join("analysis_results.txt");
    write_output(&text_path, &text)?;

    println!(
        "\n✅ Analysis complete! Check the generated plots and {} for detailed results.",
        file_name(&text_path)
    );
    println!("   JSON results: {}", json_path.display());

    Ok(())
}

/// Warn when configured prototype questions are missing from the survey.
fn check_coverage(survey: &Survey, classifier: &Classifier, likert: usize, ranking: usize) {
    let found = |kind: QuestionType| {
        survey
            .questions
            .iter()
            .filter(|q| classifier.classify(q) == kind)
            .count()
    };

    let likert_found = found(QuestionType::Likert);
    let ranking_found = found(QuestionType::Ranking);
    info!(
        "Found {}/{} Likert and {}/{} ranking questions",
        likert_found, likert, ranking_found, ranking
    );

    if likert_found < likert {
        warn!(
            "{} configured Likert questions are missing from the survey",
            likert - likert_found
        );
    }
    if ranking_found < ranking {
        warn!(
            "{} configured ranking questions are missing from the survey",
            ranking - ranking_found
        );
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Something worth logging about config loading, kept until the
/// subscriber is installed.
enum ConfigNote {
    Loaded(String),
    Defaults,
    Fallback(String),
}

impl ConfigNote {
    fn log(&self) {
        match self {
            ConfigNote::Loaded(path) => info!("Loaded config from {}", path),
            ConfigNote::Defaults => debug!("No config file found, using defaults"),
            ConfigNote::Fallback(reason) => warn!("Failed to load config: {}", reason),
        }
    }
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<(Config, Vec<ConfigNote>)> {
    let mut notes = Vec::new();

    // Try explicit config path
    let mut config = if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        notes.push(ConfigNote::Loaded(config_path.display().to_string()));
        config
    } else {
        // Try default location
        match Config::load_default() {
            Ok(Some(config)) => {
                notes.push(ConfigNote::Loaded(CONFIG_FILE_NAME.to_string()));
                config
            }
            Ok(None) => {
                notes.push(ConfigNote::Defaults);
                Config::default()
            }
            Err(e) => {
                notes.push(ConfigNote::Fallback(format!("{:#}", e)));
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok((config, notes))
}
