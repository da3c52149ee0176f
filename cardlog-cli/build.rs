use std::process::Command;

/// Revision label for `--version`: an explicit `CARDLOG_BUILD_SHA` (set by
/// packagers building from a tarball) wins over asking git.
fn revision() -> Option<String> {
    if let Ok(sha) = std::env::var("CARDLOG_BUILD_SHA") {
        let sha = sha.trim();
        if !sha.is_empty() {
            return Some(sha.to_string());
        }
    }

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").ok()?;
    let out = Command::new("git")
        .current_dir(manifest_dir)
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let rev = String::from_utf8(out.stdout).ok()?;
    let rev = rev.trim();
    (!rev.is_empty()).then(|| rev.to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=CARDLOG_BUILD_SHA");
    let rev = revision().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CARDLOG_BUILD_SHA={rev}");
}
