//! Integration tests for the artgrade CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path to the artgrade binary built for this test run.
fn artgrade_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_artgrade"))
}

/// Create temp directory for test files.
fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("artgrade-test-{}-{}", std::process::id(), id));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

/// 48x48 diagonal color gradient.
fn create_gradient_png(path: &Path) {
    let img = image::RgbaImage::from_fn(48, 48, |x, y| {
        let v = ((x + y) * 255 / 94) as u8;
        image::Rgba([v, 255 - v, (x * 5) as u8, 255])
    });
    img.save(path).expect("Failed to write PNG");
}

/// 48x48 pseudo-random noise.
fn create_noise_png(path: &Path, seed: u64) {
    let mut state = seed;
    let img = image::RgbaImage::from_fn(48, 48, |_, _| {
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) & 0xFF) as u8
        };
        image::Rgba([next(), next(), next(), 255])
    });
    img.save(path).expect("Failed to write PNG");
}

fn run(args: &[&str]) -> Output {
    Command::new(artgrade_bin())
        .args(["--color", "never"])
        .args(args)
        .output()
        .expect("Failed to run artgrade")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_identical_images() {
    let dir = temp_dir();
    let img = dir.join("ref.png");
    create_gradient_png(&img);

    let output = run(&[path_str(&img), path_str(&img)]);
    assert!(output.status.success(), "Exit code should be 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Grade: A+"), "Should output top grade: {stdout}");
    assert!(stdout.contains("Style:"), "Should output style");
    assert!(stdout.contains("Outstanding"), "Should output feedback");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_quiet_mode() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let submission = dir.join("sub.png");
    create_gradient_png(&reference);
    create_noise_png(&submission, 7);

    let output = run(&["-q", path_str(&reference), path_str(&submission)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let percentage: u8 = stdout.trim().parse().expect("Should be an integer");
    assert!(percentage <= 100);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_min_percentage_pass() {
    let dir = temp_dir();
    let img = dir.join("ref.png");
    create_gradient_png(&img);

    let output = run(&["--min-percentage", "90", path_str(&img), path_str(&img)]);
    assert_eq!(output.status.code(), Some(0));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_min_percentage_fail() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let submission = dir.join("sub.png");
    create_gradient_png(&reference);
    create_noise_png(&submission, 3);

    let output = run(&[
        "--min-percentage",
        "90",
        path_str(&reference),
        path_str(&submission),
    ]);
    assert_eq!(output.status.code(), Some(1), "Exit code should be 1 below threshold");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Below threshold"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_json_output() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let submission = dir.join("sub.png");
    create_gradient_png(&reference);
    create_noise_png(&submission, 11);

    let output = run(&["--json", path_str(&reference), path_str(&submission)]);
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should be valid JSON");
    assert!(json["percentage"].as_u64().unwrap() <= 100);
    assert!(json["grade"].is_string());
    assert!(json["style"]["label"].is_string());
    for metric in ["cosine", "structural", "statistical"] {
        let v = json["scores"][metric].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&v), "{metric} out of range: {v}");
    }
    assert!(!json["feedback"].as_array().unwrap().is_empty());
    assert!(json.get("below_threshold").is_none());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_grade_format() {
    let dir = temp_dir();
    let img = dir.join("ref.png");
    create_gradient_png(&img);

    let output = run(&["--format", "grade", path_str(&img), path_str(&img)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("% A+ ("), "Unexpected line: {stdout}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_heatmap_file() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let submission = dir.join("sub.png");
    let heatmap = dir.join("heat.png");
    create_gradient_png(&reference);
    create_noise_png(&submission, 5);

    let output = run(&[
        "--heatmap",
        path_str(&heatmap),
        path_str(&reference),
        path_str(&submission),
    ]);
    assert!(output.status.success());

    let img = image::open(&heatmap).expect("Heatmap should be a readable image");
    assert_eq!((img.width(), img.height()), (256, 256));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_config_override() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let submission = dir.join("sub.png");
    let config = dir.join("scoring.json");
    create_gradient_png(&reference);
    create_noise_png(&submission, 13);
    fs::write(
        &config,
        r##"{"grading": {"bands": [{"name": "PASS", "min_percentage": 0.0, "color": "#00ff00"}]}}"##,
    )
    .unwrap();

    let output = run(&[
        "--json",
        "--config",
        path_str(&config),
        path_str(&reference),
        path_str(&submission),
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["grade"], "PASS");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_invalid_config() {
    let dir = temp_dir();
    let img = dir.join("ref.png");
    let config = dir.join("scoring.json");
    create_gradient_png(&img);
    fs::write(&config, r#"{"embedding_size": 0}"#).unwrap();

    let output = run(&["--config", path_str(&config), path_str(&img), path_str(&img)]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid scoring config"), "stderr: {stderr}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_file() {
    let output = run(&["/nonexistent/ref.png", "/nonexistent/sub.png"]);
    assert_eq!(output.status.code(), Some(2), "Exit code should be 2 for errors");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should print error message");
}

#[test]
fn test_batch_mode() {
    let dir = temp_dir();
    let ref_dir = dir.join("ref");
    let sub_dir = dir.join("sub");
    fs::create_dir_all(&ref_dir).unwrap();
    fs::create_dir_all(&sub_dir).unwrap();

    create_gradient_png(&ref_dir.join("a.png"));
    create_gradient_png(&sub_dir.join("a.png"));
    create_gradient_png(&ref_dir.join("b.png"));
    create_noise_png(&sub_dir.join("b.png"), 17);
    // No counterpart, skipped
    create_gradient_png(&ref_dir.join("c.png"));

    let output = run(&["--batch", path_str(&ref_dir), path_str(&sub_dir)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.png"), "Should list a.png");
    assert!(stdout.contains("b.png"), "Should list b.png");
    assert!(!stdout.contains("c.png"), "Should skip unmatched c.png");
    assert!(stdout.contains("Summary"), "Should show summary");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_reference_against_directory() {
    let dir = temp_dir();
    let reference = dir.join("ref.png");
    let sub_dir = dir.join("class");
    fs::create_dir_all(&sub_dir).unwrap();
    create_gradient_png(&reference);
    create_gradient_png(&sub_dir.join("alice.png"));
    create_noise_png(&sub_dir.join("bob.png"), 23);
    fs::write(sub_dir.join("notes.txt"), "not an image").unwrap();

    let output = run(&["--json", path_str(&reference), path_str(&sub_dir)]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(json["summary"]["total"], 2);
    assert_eq!(json["summary"]["errors"], 0);
    assert_eq!(results[0]["grade"], "A+");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_version() {
    let output = Command::new(artgrade_bin())
        .arg("--version")
        .output()
        .expect("Failed to run artgrade");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("artgrade"), "Should show name");
    assert!(stdout.contains("0."), "Should show version");
}

#[test]
fn test_help() {
    let output = Command::new(artgrade_bin())
        .arg("--help")
        .output()
        .expect("Failed to run artgrade");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("REFERENCE"), "Should show REFERENCE arg");
    assert!(stdout.contains("SUBMISSION"), "Should show SUBMISSION arg");
    assert!(stdout.contains("--min-percentage"), "Should show --min-percentage");
    assert!(stdout.contains("--batch"), "Should show --batch");
}
