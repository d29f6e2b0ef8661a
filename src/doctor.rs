// SPDX-License-Identifier: MIT
//! doctor.rs — connectivity checks for `agencyd doctor`.
//!
//! Probes the two external dependencies before the server is started, so a
//! bad key or URL shows up here instead of as a confusing 500 (or a silent
//! fallback payload) at request time.

use crate::ai::ReasoningClient;
use crate::config::AgencyConfig;
use crate::store::RestStore;

/// The result of a single diagnostic check.
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Run all diagnostic checks and return a list of results.
pub async fn run_doctor(config: &AgencyConfig) -> Vec<CheckResult> {
    vec![
        check_port_available(config),
        check_store_reachable(config).await,
        check_reasoning_reachable(config).await,
    ]
}

// ─── Individual checks ────────────────────────────────────────────────────────

/// Check 1: the configured API port is free.
fn check_port_available(config: &AgencyConfig) -> CheckResult {
    let passed =
        std::net::TcpListener::bind((config.bind_address.as_str(), config.port)).is_ok();
    CheckResult {
        name: "API port available",
        passed,
        detail: if passed {
            format!("port {} is free", config.port)
        } else {
            format!("port {} is in use by another process", config.port)
        },
    }
}

/// Check 2: the external store answers an authenticated request.
async fn check_store_reachable(config: &AgencyConfig) -> CheckResult {
    let name = "store reachable";
    let (url, key) = match (config.store_url.as_deref(), config.store_key.as_deref()) {
        (Some(u), Some(k)) => (u, k),
        _ => {
            return CheckResult {
                name,
                passed: false,
                detail: "SUPABASE_URL or SUPABASE_KEY not set".to_string(),
            }
        }
    };
    let store = match RestStore::new(url, key, config.http_timeout_secs) {
        Ok(s) => s,
        Err(e) => {
            return CheckResult {
                name,
                passed: false,
                detail: e.to_string(),
            }
        }
    };
    match store.probe().await {
        Ok(()) => CheckResult {
            name,
            passed: true,
            detail: format!("connected to {url}"),
        },
        Err(e) => CheckResult {
            name,
            passed: false,
            detail: e.to_string(),
        },
    }
}

/// Check 3: the reasoning service accepts the API key.
async fn check_reasoning_reachable(config: &AgencyConfig) -> CheckResult {
    let name = "reasoning service reachable";
    let key = match config.openai_api_key.as_deref() {
        Some(k) => k,
        None => {
            return CheckResult {
                name,
                passed: false,
                detail: "OPENAI_API_KEY not set".to_string(),
            }
        }
    };
    let client = match ReasoningClient::new(
        &config.openai_base_url,
        key,
        &config.model,
        config.http_timeout_secs,
    ) {
        Ok(c) => c,
        Err(e) => {
            return CheckResult {
                name,
                passed: false,
                detail: e.to_string(),
            }
        }
    };
    match client.probe().await {
        Ok(()) => CheckResult {
            name,
            passed: true,
            detail: format!("authenticated against {}", config.openai_base_url),
        },
        Err(e) => CheckResult {
            name,
            passed: false,
            detail: e.to_string(),
        },
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

pub fn print_doctor_results(results: &[CheckResult]) {
    println!();
    println!("{BOLD}agencyd doctor — connectivity checks{RESET}");
    println!("{}", "─".repeat(60));

    for r in results {
        let (symbol, color) = if r.passed { ("✓", GREEN) } else { ("✗", RED) };
        println!("  {color}{symbol}{RESET}  {:<30}  {}", r.name, r.detail);
    }

    println!("{}", "─".repeat(60));

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed == 0 {
        println!("{GREEN}All checks passed.{RESET}");
    } else {
        println!("{RED}{failed} check(s) failed. See above for details.{RESET}");
    }
    println!();
}
