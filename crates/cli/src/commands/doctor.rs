//! Doctor command - validate configuration and show status

use anyhow::Result;
use postcraft_adapters::event_log::JsonlEventLog;
use postcraft_domain::{EventLog, StyleConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    style: CheckResult,
    log: CheckResult,
    llm: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        style: CheckResult::error("Not checked"),
        log: CheckResult::error("Not checked"),
        llm: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.style = check_style(config);
        report.log = check_log(&config.general.log_path).await;
        report.llm = check_llm(config);
    }

    // Determine overall status
    let checks = [&report.config, &report.style, &report.log, &report.llm];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_style(config: &AppConfig) -> CheckResult {
    match config.style.to_options().resolve(StyleConfig::default()) {
        Ok(style) => CheckResult::ok(format!(
            "{} / {} / {}, max {} chars",
            style.tone.as_str(),
            style.structure.as_str(),
            style.closing.as_str(),
            style.max_length
        )),
        Err(e) => CheckResult::error(format!("Invalid [style]: {}", e)),
    }
}

async fn check_log(path: &Path) -> CheckResult {
    if path.is_dir() {
        return CheckResult::error(format!("Log path is a directory: {}", path.display()));
    }

    if !path.exists() {
        return CheckResult::ok(format!(
            "{} (will be created on first publish)",
            path.display()
        ));
    }

    let log = match JsonlEventLog::new(path.to_path_buf()).await {
        Ok(log) => log,
        Err(e) => return CheckResult::error(format!("Failed to open log: {}", e)),
    };

    match log.read_all().await {
        Ok(entries) => {
            let latest = entries.last().map(|e| e.executed_at.to_string());
            CheckResult::ok(format!("{} ({} entries)", path.display(), entries.len()))
                .with_details(serde_json::json!({
                    "entries": entries.len(),
                    "latest_executed_at": latest,
                }))
        }
        Err(e) => CheckResult::error(format!("Failed to read log: {}", e)),
    }
}

fn check_llm(config: &AppConfig) -> CheckResult {
    let provider = &config.llm.provider;
    let model = &config.llm.model;

    // Check if API key env var is set (without revealing the value)
    let api_key_env = match provider.as_str() {
        "openai" => &config.llm.openai.api_key_env,
        "openai_compat" => {
            if config.llm.openai_compat.base_url.trim().is_empty() {
                return CheckResult::error("OpenAI-compatible base_url is empty");
            }
            &config.llm.openai_compat.api_key_env
        }
        "stub" => return CheckResult::ok("Provider: stub (offline)"),
        "none" => return CheckResult::ok("Provider: none (rule-based only)"),
        other => return CheckResult::error(format!("Unknown provider: {}", other)),
    };

    if api_key_env.is_empty() {
        return CheckResult::error(format!("No API key env var configured for {}", provider));
    }

    match std::env::var(api_key_env) {
        Ok(val) if !val.is_empty() => CheckResult::ok(format!(
            "Provider: {}, Model: {}, API key: {} (set)",
            provider, model, api_key_env
        )),
        _ => CheckResult::warn(format!(
            "Provider: {}, Model: {}, API key: {} (not set; --llm falls back to rule-based)",
            provider, model, api_key_env
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("postcraft Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Style", &report.style);
    print_check("Publish log", &report.log);
    print_check("LLM Provider", &report.llm);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
