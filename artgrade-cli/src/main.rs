//! artgrade CLI - grade a drawing against a reference image
//!
//! Compare a submitted drawing with a reference and print its percentage,
//! letter grade, detected style and feedback.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use artgrade::{
    grade_images_observed, BlockStatsEmbedding, Comparison, GradingError, GradingReference,
    HeatmapImage, ImageSample, ImgVec, LogObserver, NoopObserver, PixelSampler, ScoreObserver,
    ScoringConfig, SimilarityScores, StyleLabel, RGBA8,
};
use clap::{ArgAction, ColorChoice, Parser, ValueEnum};
use colored::{ColoredString, Colorize};
use log::{debug, info};
use serde::Serialize;

/// Heuristic drawing grader
///
/// Compares a submitted drawing with a reference image. Higher percentages
/// mean the drawing is closer to the reference.
///
/// Grade bands (default):
///   A+  90-100
///   A   80-89
///   B   70-79
///   C   60-69
///   D   50-59
///   F   below 50
#[derive(Parser, Debug)]
#[command(name = "artgrade")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Grade a drawing:
        artgrade reference.png drawing.jpg

    Only print the percentage:
        artgrade -q reference.png drawing.jpg

    CI mode - fail below a percentage:
        artgrade --min-percentage 70 reference.png drawing.jpg

    Grade every drawing in a directory against one reference:
        artgrade reference.png drawings/

    Grade matching files in two directories:
        artgrade --batch references/ drawings/

    Output JSON for scripting:
        artgrade --json reference.png drawing.jpg

    Save difference heatmap:
        artgrade --heatmap diff.png reference.png drawing.jpg

    Override scoring constants:
        artgrade --config scoring.json reference.png drawing.jpg

EXIT CODES:
    0 - Success (percentage meets --min-percentage if specified)
    1 - Percentage below threshold (--min-percentage)
    2 - Error (file not found, invalid image, bad config, etc.)")]
struct Cli {
    /// Reference image or directory
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Submitted drawing or directory
    #[arg(value_name = "SUBMISSION")]
    submission: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Quiet mode - only output the percentage
    #[arg(long, short = 'q', action = ArgAction::SetTrue)]
    quiet: bool,

    /// Save difference heatmap (PNG) to file
    #[arg(long, value_name = "FILE")]
    heatmap: Option<PathBuf>,

    /// JSON file with scoring overrides; missing fields keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum acceptable percentage (exit code 1 if not reached)
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    min_percentage: Option<u8>,

    /// Batch mode: grade matching files in two directories
    #[arg(long, short = 'b')]
    batch: bool,

    /// File extensions to include in batch mode (comma-separated)
    #[arg(
        long,
        default_value = "png,jpg,jpeg,webp,gif,bmp",
        value_delimiter = ','
    )]
    extensions: Vec<String>,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Continue on errors in batch mode
    #[arg(long)]
    keep_going: bool,

    /// Show summary statistics in batch mode
    #[arg(long)]
    summary: bool,

    /// Log intermediate values to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Percentage, grade, style and feedback
    Text,
    /// JSON output with all metrics
    Json,
    /// One line: percentage, colored grade and style
    Grade,
    /// Minimal - just the percentage
    Score,
}

#[derive(Serialize)]
struct JsonOutput {
    reference: String,
    submission: String,
    percentage: u8,
    grade: String,
    color: String,
    style: JsonStyle,
    scores: SimilarityScores,
    feedback: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    heatmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    below_threshold: Option<bool>,
}

#[derive(Serialize)]
struct JsonStyle {
    label: StyleLabel,
    confidence: f64,
}

#[derive(Serialize)]
struct BatchJsonOutput {
    results: Vec<JsonOutput>,
    summary: BatchSummary,
}

#[derive(Serialize)]
struct BatchSummary {
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    min_percentage: u8,
    max_percentage: u8,
    mean_percentage: f64,
}

struct GradedPair {
    reference: PathBuf,
    submission: PathBuf,
    result: Result<Comparison, String>,
}

/// Loads image files through the `image` crate.
struct FileSampler;

impl PixelSampler for FileSampler {
    fn load(&self, source: &str) -> Result<ImageSample, GradingError> {
        let img = image::open(source)
            .map_err(|e| GradingError::Decode(format!("failed to load '{source}': {e}")))?
            .to_rgba8();
        let (width, height) = (img.width() as usize, img.height() as usize);
        let pixels = img
            .pixels()
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        Ok(ImgVec::new(pixels, width, height))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(&cli);
    setup_colors(&cli);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report_error(&cli, &e);
            return ExitCode::from(2);
        }
    };

    let outcome = if cli.batch || (cli.reference.is_dir() && cli.submission.is_dir()) {
        run_batch(&cli, &config)
    } else if cli.submission.is_dir() {
        run_against_reference(&cli, &config)
    } else {
        run_single(&cli, &config)
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            report_error(&cli, &e);
            ExitCode::from(2)
        }
    }
}

fn setup_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn report_error(cli: &Cli, e: &anyhow::Error) {
    if !cli.quiet {
        eprintln!("{}: {:#}", "error".red().bold(), e);
    }
}

fn load_config(cli: &Cli) -> Result<ScoringConfig> {
    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            serde_json::from_str::<ScoringConfig>(&text)
                .with_context(|| format!("failed to parse config '{}'", path.display()))?
        }
        None => ScoringConfig::default(),
    };
    config.validate().context("invalid scoring config")?;
    debug!("scoring config: {config:?}");
    Ok(config)
}

fn observer(cli: &Cli) -> &'static dyn ScoreObserver {
    if cli.verbose {
        &LogObserver
    } else {
        &NoopObserver
    }
}

fn load_image(path: &Path) -> Result<ImageSample> {
    let source = path
        .to_str()
        .with_context(|| format!("path is not valid UTF-8: '{}'", path.display()))?;
    Ok(FileSampler.load(source)?)
}

fn grade_pair(
    cli: &Cli,
    config: &ScoringConfig,
    ref_path: &Path,
    sub_path: &Path,
) -> Result<Comparison> {
    let reference = load_image(ref_path)?;
    let submission = load_image(sub_path)?;
    let comparison = grade_images_observed(
        reference.as_ref(),
        submission.as_ref(),
        &BlockStatsEmbedding::default(),
        config,
        observer(cli),
    )
    .with_context(|| format!("failed to grade '{}'", sub_path.display()))?;
    Ok(comparison)
}

fn below_threshold(cli: &Cli, comparison: &Comparison) -> bool {
    cli.min_percentage
        .is_some_and(|min| comparison.result.percentage < min)
}

fn run_single(cli: &Cli, config: &ScoringConfig) -> Result<ExitCode> {
    let config = config.clone().with_compute_heatmap(cli.heatmap.is_some());
    let comparison = grade_pair(cli, &config, &cli.reference, &cli.submission)?;

    if let (Some(path), Some(heatmap)) = (&cli.heatmap, &comparison.heatmap) {
        save_heatmap(heatmap, path)?;
        if !cli.quiet && get_format(cli) != OutputFormat::Json {
            eprintln!("Heatmap saved to: {}", path.display());
        }
    }

    output_single_result(cli, &cli.reference, &cli.submission, &comparison)?;

    Ok(if below_threshold(cli, &comparison) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

/// One reference file, every image in the submission directory.
fn run_against_reference(cli: &Cli, config: &ScoringConfig) -> Result<ExitCode> {
    if cli.heatmap.is_some() {
        log::warn!("--heatmap is ignored when grading a directory");
    }
    let provider = BlockStatsEmbedding::default();
    let reference_img = load_image(&cli.reference)?;
    let reference = GradingReference::new(reference_img.as_ref(), &provider, config.clone())
        .with_context(|| format!("failed to prepare '{}'", cli.reference.display()))?;

    let submissions = list_images(&cli.submission, &cli.extensions)?;
    if submissions.is_empty() {
        bail!("no image files found in '{}'", cli.submission.display());
    }
    info!(
        "grading {} submissions against '{}'",
        submissions.len(),
        cli.reference.display()
    );

    let pairs = submissions
        .into_iter()
        .map(|sub_path| {
            let result = load_image(&sub_path).and_then(|img| {
                reference
                    .grade_observed(img.as_ref(), &provider, observer(cli))
                    .map_err(anyhow::Error::from)
            });
            (cli.reference.clone(), sub_path, result)
        });
    collect_batch(cli, pairs)
}

fn run_batch(cli: &Cli, config: &ScoringConfig) -> Result<ExitCode> {
    if !cli.reference.is_dir() {
        bail!(
            "reference path '{}' is not a directory",
            cli.reference.display()
        );
    }
    if !cli.submission.is_dir() {
        bail!(
            "submission path '{}' is not a directory",
            cli.submission.display()
        );
    }
    if cli.heatmap.is_some() {
        log::warn!("--heatmap is ignored in batch mode");
    }

    let pairs = find_matching_files(&cli.reference, &cli.submission, &cli.extensions)?;
    if pairs.is_empty() {
        bail!("no matching image files found");
    }

    let graded = pairs.into_iter().map(|(ref_path, sub_path)| {
        let result = grade_pair(cli, config, &ref_path, &sub_path);
        (ref_path, sub_path, result)
    });
    collect_batch(cli, graded)
}

fn collect_batch(
    cli: &Cli,
    pairs: impl Iterator<Item = (PathBuf, PathBuf, Result<Comparison>)>,
) -> Result<ExitCode> {
    let mut results: Vec<GradedPair> = Vec::new();
    let mut had_errors = false;
    let mut threshold_failed = false;

    for (reference, submission, result) in pairs {
        match &result {
            Err(e) => {
                had_errors = true;
                if !cli.keep_going {
                    return Err(anyhow::anyhow!("{}: {e:#}", submission.display()));
                }
            }
            Ok(comparison) => threshold_failed |= below_threshold(cli, comparison),
        }
        results.push(GradedPair {
            reference,
            submission,
            result: result.map_err(|e| format!("{e:#}")),
        });
    }

    output_batch_results(cli, &results)?;

    Ok(if threshold_failed {
        ExitCode::from(1)
    } else if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory '{}'", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.context("failed to read directory entry")?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn find_matching_files(
    ref_dir: &Path,
    sub_dir: &Path,
    extensions: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>> {
    Ok(list_images(ref_dir, extensions)?
        .into_iter()
        .filter_map(|path| {
            let sub_path = sub_dir.join(path.file_name()?);
            sub_path.exists().then_some((path, sub_path))
        })
        .collect())
}

fn get_format(cli: &Cli) -> OutputFormat {
    if cli.json {
        OutputFormat::Json
    } else if cli.quiet {
        OutputFormat::Score
    } else {
        cli.format
    }
}

fn save_heatmap(heatmap: &HeatmapImage, path: &Path) -> Result<()> {
    let bytes: Vec<u8> = heatmap
        .buf()
        .iter()
        .flat_map(|p| [p.r, p.g, p.b, p.a])
        .collect();
    image::save_buffer(
        path,
        &bytes,
        heatmap.width() as u32,
        heatmap.height() as u32,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("failed to save heatmap '{}'", path.display()))
}

/// Parses `#rrggbb`.
fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn paint(text: &str, color: &str) -> ColoredString {
    match hex_rgb(color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

fn json_output(
    cli: &Cli,
    reference: &Path,
    submission: &Path,
    comparison: &Comparison,
) -> JsonOutput {
    let result = &comparison.result;
    JsonOutput {
        reference: reference.display().to_string(),
        submission: submission.display().to_string(),
        percentage: result.percentage,
        grade: result.grade.clone(),
        color: result.color.clone(),
        style: JsonStyle {
            label: result.style_label,
            confidence: result.style_confidence,
        },
        scores: comparison.scores,
        feedback: result.feedback.clone(),
        heatmap: comparison
            .heatmap
            .as_ref()
            .and(cli.heatmap.as_ref())
            .map(|p| p.display().to_string()),
        below_threshold: cli.min_percentage.map(|_| below_threshold(cli, comparison)),
    }
}

fn output_single_result(
    cli: &Cli,
    reference: &Path,
    submission: &Path,
    comparison: &Comparison,
) -> Result<()> {
    let result = &comparison.result;
    let grade = paint(&result.grade, &result.color).bold();

    match get_format(cli) {
        OutputFormat::Score => println!("{}", result.percentage),
        OutputFormat::Grade => println!(
            "{}% {} ({})",
            result.percentage, grade, result.style_label
        ),
        OutputFormat::Text => {
            println!("Score: {}%  Grade: {}", result.percentage, grade);
            println!(
                "Style: {} (confidence {:.2})",
                result.style_label, result.style_confidence
            );
            println!(
                "Similarity: cosine {:.3}  structural {:.3}  statistical {:.3}",
                comparison.scores.cosine, comparison.scores.structural, comparison.scores.statistical
            );
            println!();
            for line in &result.feedback {
                println!("  - {line}");
            }
            if let Some(min) = cli.min_percentage {
                if result.percentage < min {
                    println!();
                    println!(
                        "{}",
                        format!("Below threshold: {}% < {min}%", result.percentage)
                            .red()
                            .bold()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output = json_output(cli, reference, submission, comparison);
            let json =
                serde_json::to_string_pretty(&output).context("failed to serialize JSON")?;
            println!("{json}");
        }
    }

    Ok(())
}

fn output_batch_results(cli: &Cli, results: &[GradedPair]) -> Result<()> {
    let percentages: Vec<u8> = results
        .iter()
        .filter_map(|r| r.result.as_ref().ok())
        .map(|c| c.result.percentage)
        .collect();
    let errors = results.len() - percentages.len();
    let failed = results
        .iter()
        .filter_map(|r| r.result.as_ref().ok())
        .filter(|c| below_threshold(cli, c))
        .count();
    let passed = percentages.len() - failed;

    let min = percentages.iter().copied().min().unwrap_or(0);
    let max = percentages.iter().copied().max().unwrap_or(0);
    let mean = if percentages.is_empty() {
        0.0
    } else {
        percentages.iter().map(|&p| f64::from(p)).sum::<f64>() / percentages.len() as f64
    };

    match get_format(cli) {
        OutputFormat::Json => {
            let output = BatchJsonOutput {
                results: results
                    .iter()
                    .filter_map(|r| {
                        let comparison = r.result.as_ref().ok()?;
                        Some(json_output(cli, &r.reference, &r.submission, comparison))
                    })
                    .collect(),
                summary: BatchSummary {
                    total: results.len(),
                    passed,
                    failed,
                    errors,
                    min_percentage: min,
                    max_percentage: max,
                    mean_percentage: mean,
                },
            };
            let json =
                serde_json::to_string_pretty(&output).context("failed to serialize JSON")?;
            println!("{json}");
        }
        OutputFormat::Score => {
            for p in &percentages {
                println!("{p}");
            }
        }
        OutputFormat::Text | OutputFormat::Grade => {
            let name_width = results
                .iter()
                .map(|r| r.submission.file_name().unwrap_or_default().len())
                .max()
                .unwrap_or(20);

            for r in results {
                let filename = r
                    .submission
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("?");

                match &r.result {
                    Ok(comparison) => {
                        let result = &comparison.result;
                        let status = match cli.min_percentage {
                            Some(_) if below_threshold(cli, comparison) => "FAIL".red().bold(),
                            Some(_) => "PASS".green().bold(),
                            None => result.style_label.as_str().normal(),
                        };
                        println!(
                            "{:width$}  {:>4}%  {:<2}  {}",
                            filename,
                            result.percentage,
                            paint(&result.grade, &result.color).bold(),
                            status,
                            width = name_width
                        );
                    }
                    Err(e) => {
                        println!(
                            "{:width$}  {:>5}  {}",
                            filename,
                            "-".dimmed(),
                            format!("ERROR: {e}").red(),
                            width = name_width
                        );
                    }
                }
            }

            if cli.summary || results.len() > 1 {
                println!();
                println!("{}", "Summary:".bold());
                println!(
                    "  Total: {}  Passed: {}  Failed: {}  Errors: {}",
                    results.len(),
                    passed.to_string().green(),
                    if failed > 0 {
                        failed.to_string().red()
                    } else {
                        failed.to_string().normal()
                    },
                    if errors > 0 {
                        errors.to_string().red()
                    } else {
                        errors.to_string().normal()
                    }
                );
                if !percentages.is_empty() {
                    println!("  Percentages: min={min}%  max={max}%  mean={mean:.1}%");
                }
            }
        }
    }

    // Flush stdout
    let _ = io::stdout().flush();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_rgb() {
        assert_eq!(hex_rgb("#16a34a"), Some((0x16, 0xa3, 0x4a)));
        assert_eq!(hex_rgb("16a34a"), None);
        assert_eq!(hex_rgb("#fff"), None);
        assert_eq!(hex_rgb("#zzzzzz"), None);
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["png".to_string(), "JPG".to_string()];
        assert!(has_extension(Path::new("a/b.PNG"), &exts));
        assert!(has_extension(Path::new("c.jpg"), &exts));
        assert!(!has_extension(Path::new("notes.txt"), &exts));
        assert!(!has_extension(Path::new("no_extension"), &exts));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "artgrade",
            "--min-percentage",
            "70",
            "--format",
            "grade",
            "ref.png",
            "sub.png",
        ])
        .unwrap();
        assert_eq!(cli.min_percentage, Some(70));
        assert_eq!(get_format(&cli), OutputFormat::Grade);

        assert!(Cli::try_parse_from(["artgrade", "--min-percentage", "101", "a", "b"]).is_err());
    }
}
