//! Stamps the binary with the commit and date it was built from.

use std::env;
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNKNOWN: &str = "unknown";

fn main() {
    for watched in ["GITHUB_SHA", "SOURCE_DATE_EPOCH"] {
        println!("cargo:rerun-if-env-changed={watched}");
    }
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-env=NESTSCOPE_BUILD_COMMIT={}", commit());
    println!("cargo:rustc-env=NESTSCOPE_BUILD_DATE={}", build_date());
}

fn commit() -> String {
    non_empty(env::var("GITHUB_SHA").ok())
        .map(|sha| sha.chars().take(7).collect())
        .or_else(|| git(&["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Commit date when built from a checkout, otherwise the reproducible-build
/// epoch or the current time.
fn build_date() -> String {
    if let Some(date) = git(&["log", "-1", "--format=%cI"]) {
        return date;
    }
    let when = non_empty(env::var("SOURCE_DATE_EPOCH").ok())
        .and_then(|epoch| epoch.parse::<i64>().ok())
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);
    when.format(&Rfc3339).unwrap_or_else(|_| UNKNOWN.to_string())
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    non_empty(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
