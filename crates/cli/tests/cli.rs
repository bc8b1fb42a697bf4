use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

const DRAFT: &str = "We launched the new onboarding flow. Signups doubled in a week.";

/// A postcraft command isolated in `dir`, logging to `dir/log.jsonl`
fn postcraft(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("postcraft");
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env("POSTCRAFT__GENERAL__LOG_PATH", dir.join("log.jsonl"))
        .env("POSTCRAFT__LLM__PROVIDER", "none")
        .env("POSTCRAFT__SCHEDULER__MAX_IDLE_MS", "50");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("postcraft.toml");

    postcraft(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("log_path"));
    assert!(content.contains("[scheduler]"));

    postcraft(dir.path())
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn refine_outputs_two_distinct_variations() {
    let dir = TempDir::new().expect("temp dir");

    let output = postcraft(dir.path())
        .args([
            "refine",
            "--text",
            DRAFT,
            "--structure",
            "bulleted",
            "--closing",
            "cta",
            "--max-length",
            "200",
            "--json",
        ])
        .output()
        .expect("run refine");
    assert!(output.status.success());

    let value = stdout_json(&output);
    let variations = value["variations"].as_array().expect("variations");
    assert_eq!(variations.len(), 2);
    assert_ne!(variations[0]["text"], variations[1]["text"]);
    for variation in variations {
        assert_eq!(variation["source"], "rule-based");
        assert!(variation["text"].as_str().unwrap().chars().count() <= 200);
    }
    assert_eq!(variations[0]["style"]["structure"], "bulleted");
    assert_eq!(variations[1]["style"]["structure"], "question-led");
    assert_eq!(value["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn refine_with_stub_llm_adds_third_candidate() {
    let dir = TempDir::new().expect("temp dir");

    let output = postcraft(dir.path())
        .env("POSTCRAFT__LLM__PROVIDER", "stub")
        .args(["refine", "--text", DRAFT, "--count", "3", "--json"])
        .output()
        .expect("run refine");
    assert!(output.status.success());

    let value = stdout_json(&output);
    let variations = value["variations"].as_array().expect("variations");
    assert_eq!(variations.len(), 3);
    assert_eq!(variations[2]["source"], "llm");
}

#[test]
fn refine_llm_without_key_warns_and_falls_back() {
    let dir = TempDir::new().expect("temp dir");

    let output = postcraft(dir.path())
        .env("POSTCRAFT__LLM__PROVIDER", "openai")
        .env("POSTCRAFT__LLM__OPENAI__API_KEY_ENV", "POSTCRAFT_TEST_UNSET_KEY")
        .env_remove("POSTCRAFT_TEST_UNSET_KEY")
        .args(["refine", "--text", DRAFT, "--llm", "--json"])
        .output()
        .expect("run refine");
    assert!(output.status.success());

    let value = stdout_json(&output);
    assert_eq!(value["variations"].as_array().unwrap().len(), 2);
    let warning = value["warnings"][0].as_str().expect("warning");
    assert!(warning.starts_with("LLM unavailable"));
}

#[test]
fn refine_rejects_bad_options() {
    let dir = TempDir::new().expect("temp dir");

    postcraft(dir.path())
        .args(["refine", "--text", DRAFT, "--tone", "sarcastic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown tone"));

    postcraft(dir.path())
        .args(["refine", "--text", DRAFT, "--count", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be 2 or 3"));

    postcraft(dir.path())
        .args(["refine", "--text", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn publish_now_then_analyze_and_export() {
    let dir = TempDir::new().expect("temp dir");

    let output = postcraft(dir.path())
        .args(["publish", "--text", "Hello, network!", "--attachment", "img/a.png", "--json"])
        .output()
        .expect("run publish");
    assert!(output.status.success());

    let published = stdout_json(&output);
    assert_eq!(published["status"], "executed");
    assert_eq!(published["dry_run"], true);
    assert!(
        published["preview_url"]
            .as_str()
            .unwrap()
            .starts_with("https://preview.postcraft.invalid/p/")
    );

    let log = fs::read_to_string(dir.path().join("log.jsonl")).expect("read log");
    assert_eq!(log.lines().count(), 1);
    let entry: Value = serde_json::from_str(log.lines().next().unwrap()).expect("entry json");
    assert_eq!(entry["job_id"], published["job_id"]);
    assert_eq!(entry["attachments"][0], "img/a.png");

    let csv_path = dir.path().join("out").join("report.csv");
    let pdf_path = dir.path().join("out").join("report.pdf");
    let output = postcraft(dir.path())
        .args(["analyze", "--last", "5", "--json", "--csv"])
        .arg(&csv_path)
        .arg("--pdf")
        .arg(&pdf_path)
        .output()
        .expect("run analyze");
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["stats"].as_array().unwrap().len(), 1);
    let totals = &report["totals"];

    let csv = fs::read_to_string(&csv_path).expect("read csv");
    assert!(csv.starts_with("job_id,executed_at,likes,comments,shares"));
    assert!(csv.contains(&format!(
        "TOTAL,,{},{},{}",
        totals["likes"], totals["comments"], totals["shares"]
    )));

    let pdf = fs::read(&pdf_path).expect("read pdf");
    assert!(pdf.starts_with(b"%PDF-1.4"));
    let pdf = String::from_utf8_lossy(&pdf);
    assert!(pdf.contains(&format!("Total likes: {}", totals["likes"])));

    // Same log, same numbers
    let again = postcraft(dir.path())
        .args(["analyze", "--last", "5", "--json"])
        .output()
        .expect("run analyze");
    assert_eq!(stdout_json(&again)["totals"], *totals);
}

#[test]
fn publish_rejects_past_schedule_without_logging() {
    let dir = TempDir::new().expect("temp dir");

    postcraft(dir.path())
        .args([
            "publish",
            "--text",
            "Too late",
            "--mode",
            "schedule",
            "--at",
            "2000-01-01T00:00:00Z",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the future"));

    postcraft(dir.path())
        .args(["publish", "--text", "No time", "--mode", "schedule"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires scheduled_at"));

    assert!(!dir.path().join("log.jsonl").exists());
}

#[test]
fn publish_schedule_waits_for_the_job() {
    let dir = TempDir::new().expect("temp dir");
    let at = (OffsetDateTime::now_utc() + Duration::seconds(2))
        .format(&Rfc3339)
        .unwrap();

    let output = postcraft(dir.path())
        .args(["publish", "--text", "Soon", "--mode", "schedule", "--at", &at, "--json"])
        .output()
        .expect("run publish");
    assert!(output.status.success());

    let published = stdout_json(&output);
    assert_eq!(published["status"], "executed");
    assert!(published["preview_url"].is_string());

    let log = fs::read_to_string(dir.path().join("log.jsonl")).expect("read log");
    let entry: Value = serde_json::from_str(log.trim()).expect("entry json");
    assert_eq!(entry["mode"], "schedule");
    assert_eq!(entry["job_id"], published["job_id"]);
}

#[test]
fn publish_schedule_no_wait_warns_job_is_lost() {
    let dir = TempDir::new().expect("temp dir");
    let at = (OffsetDateTime::now_utc() + Duration::hours(1))
        .format(&Rfc3339)
        .unwrap();

    let output = postcraft(dir.path())
        .args(["publish", "--text", "Later", "--mode", "schedule", "--at", &at, "--no-wait", "--json"])
        .output()
        .expect("run publish");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["status"], "scheduled");
    assert!(String::from_utf8_lossy(&output.stderr).contains("lost"));
    assert!(!dir.path().join("log.jsonl").exists());
}

#[test]
fn history_lists_most_recent_first() {
    let dir = TempDir::new().expect("temp dir");

    for text in ["first post", "second post"] {
        postcraft(dir.path())
            .args(["publish", "--text", text])
            .assert()
            .success();
    }

    let output = postcraft(dir.path())
        .args(["history", "--json"])
        .output()
        .expect("run history");
    assert!(output.status.success());

    let entries = stdout_json(&output);
    let entries = entries.as_array().expect("array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["payload"], "second post");
    assert_eq!(entries[1]["payload"], "first post");
}

#[test]
fn doctor_reports_json() {
    let dir = TempDir::new().expect("temp dir");

    let output = postcraft(dir.path())
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["config"]["status"], "ok");
    assert_eq!(report["llm"]["status"], "ok");
    assert_eq!(report["overall"], "ok");
}
