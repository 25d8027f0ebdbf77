use chinchon_advisor::session::{Command, Session};
use serde_json::json;
use std::io::{self, BufRead, Write};

/// Reads one JSON command per line and answers each with a JSON line:
/// the outcome on success, `{"denied": ...}` otherwise. Blank lines are skipped.
fn main() -> io::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!(
        "chinchon-advisor {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_COMMIT")
    );

    let mut session = Session::default();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let answer = match serde_json::from_str::<Command>(line) {
            Ok(command) => match session.apply(command) {
                Ok(outcome) => serde_json::to_value(&outcome)
                    .unwrap_or_else(|e| json!({ "error": e.to_string() })),
                Err(denial) => json!({ "denied": denial.to_string() }),
            },
            Err(e) => json!({ "error": format!("invalid command: {}", e) }),
        };
        writeln!(stdout, "{}", answer)?;
    }
    Ok(())
}
