// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=FILTERCAM_VERSION");

    let version = std::env::var("FILTERCAM_VERSION").unwrap_or_else(|_| describe_version());
    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version string from git, falling back to the crate version outside a checkout
///
/// - exact tag `v0.1.0` becomes `0.1.0`
/// - `v0.1.0-5-gabcdef1` becomes `0.1.0+5.abcdef1`
fn describe_version() -> String {
    let fallback = env!("CARGO_PKG_VERSION").to_string();

    let Some(described) = git(&["describe", "--tags", "--match", "v*"]) else {
        return match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) => format!("{}+{}", fallback, hash),
            None => fallback,
        };
    };

    let described = described.strip_prefix('v').unwrap_or(&described);
    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [hash, commits, base] => {
            let hash = hash.strip_prefix('g').unwrap_or(hash);
            format!("{}+{}.{}", base, commits, hash)
        }
        _ => described.to_string(),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
