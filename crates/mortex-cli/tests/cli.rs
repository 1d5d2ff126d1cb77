use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

fn mortex() -> Command {
    let mut cmd = Command::cargo_bin("mortex").unwrap();
    cmd.env_remove("EXTRACT_DEBUG");
    cmd
}

/// Config whose OCR tools cannot be found, so results do not depend on the host.
fn offline_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{"ocr": {"tesseract_path": "mortex-missing-tesseract", "ocrmypdf_path": "mortex-missing-ocrmypdf"}}"#,
    )
    .unwrap();
    path
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_rejects_unsupported_type() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "notes.txt", b"hello");

    mortex()
        .arg("extract")
        .arg(&input)
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""error":"Unsupported file type""#))
        .stdout(predicate::str::contains(r#""content_type":"text/plain""#))
        .stdout(predicate::str::contains("application/pdf"))
        .stdout(predicate::str::contains("image/jpeg"))
        .stdout(predicate::str::contains("image/png"));
}

#[test]
fn test_declared_type_wins_over_detection() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "scan.png", PNG_MAGIC);

    mortex()
        .arg("extract")
        .arg(&input)
        .args(["--content-type", "text/csv"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("text/csv"));
}

#[test]
fn test_missing_input() {
    mortex()
        .args(["extract", "/nonexistent/statement.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_unreadable_pdf_gives_empty_fields() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let input = write_file(dir.path(), "statement.pdf", b"%PDF-1.4\n%not really a pdf");

    let json = run_json(mortex().arg("--config").arg(&config).arg("extract").arg(&input));

    let fields = json["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 6);
    for field in fields.values() {
        assert_eq!(field["value"], "");
        assert_eq!(field["confidence"], 0.0);
        assert_eq!(field["provenance"], "pdf_text");
    }
    assert_eq!(json["debug"]["doc_type"], "pdf");
    assert_eq!(json["debug"]["pages_used"], serde_json::json!([1]));
    assert_eq!(json["debug"]["text_stats"]["chars"], 0);
    assert_eq!(
        json["debug"]["errors"].as_array().unwrap().last().unwrap(),
        "No text extracted from document"
    );
    assert!(json["debug"].get("text_sample").is_none());
}

#[test]
fn test_undecodable_image_with_debug_text() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let mut content = PNG_MAGIC.to_vec();
    content.extend_from_slice(b"truncated");
    let input = write_file(dir.path(), "scan.png", &content);

    let json = run_json(
        mortex()
            .arg("--config")
            .arg(&config)
            .arg("extract")
            .arg(&input)
            .env("EXTRACT_DEBUG", "1"),
    );

    assert_eq!(json["debug"]["doc_type"], "image");
    assert_eq!(json["debug"]["text_stats"]["source"], "ocr_text");
    assert_eq!(json["fields"]["escrow"]["provenance"], "ocr_text");
    assert_eq!(json["debug"]["text_sample"], "");
    let errors = json["debug"]["errors"].as_array().unwrap();
    assert!(errors[0].as_str().unwrap().starts_with("Image OCR failed"));
}

#[test]
fn test_output_file() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let input = write_file(dir.path(), "statement.pdf", b"%PDF-1.4\n");
    let output = dir.path().join("result.json");

    mortex()
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(&input)
        .arg("--pretty")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["fields"]["maturity_date"]["value"], "");
}

#[test]
fn test_config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "ocr.language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"eng\""));

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "debug.text_sample_chars", "120"])
        .assert()
        .success();

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "debug.text_sample_chars"])
        .assert()
        .success()
        .stdout(predicate::str::contains("120"));

    mortex()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "debug.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_check_reports_missing_tools() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());

    mortex()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("tesseract: not found"))
        .stdout(predicate::str::contains("ocrmypdf: not found"));
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let inputs = dir.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    write_file(&inputs, "statement.pdf", b"%PDF-1.4\n");
    write_file(&inputs, "notes.txt", b"hello");
    let out = dir.path().join("out");

    mortex()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*", inputs.display()))
        .arg("-o")
        .arg(&out)
        .args(["--summary", "--continue-on-error", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful"));

    assert!(out.join("statement.json").exists());
    assert!(!out.join("notes.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status,principal_balance,note_rate"));
    assert!(summary.contains("statement.pdf,success"));
    assert!(summary.contains("notes.txt,error"));
}

#[test]
fn test_batch_stops_on_error() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    write_file(dir.path(), "notes.txt", b"hello");

    mortex()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type"));
}

#[test]
fn test_batch_shared_stem_writes_both_results() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(dir.path());
    let inputs = dir.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    write_file(&inputs, "statement.pdf", b"%PDF-1.4\n");
    write_file(&inputs, "statement.png", PNG_MAGIC);
    let out = dir.path().join("out");

    mortex()
        .arg("--config")
        .arg(&config)
        .arg("batch")
        .arg(format!("{}/statement.*", inputs.display()))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let pdf: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("statement.pdf.json")).unwrap()).unwrap();
    let png: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("statement.png.json")).unwrap()).unwrap();
    assert_eq!(pdf["debug"]["doc_type"], "pdf");
    assert_eq!(png["debug"]["doc_type"], "image");
    assert!(!out.join("statement.json").exists());
}
