use std::process::Command;

fn main() {
    // Short commit hash reported by the wasm surface
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output();

    let commit_hash = match output {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string()),
        _ => "unknown".to_string(),
    };

    println!("cargo:rustc-env=BUILD_COMMIT={}", commit_hash);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
