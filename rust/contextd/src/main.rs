use clap::Parser;
use contextd::ipc;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Context daemon: line-delimited JSON requests on stdin, responses on stdout.
#[derive(Debug, Parser)]
#[command(name = "contextd", version)]
struct Cli {
    /// Workspace directory to open at startup.
    #[arg(long, env = "CONTEXTD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Log filter directives (tracing EnvFilter syntax).
    #[arg(long, env = "CONTEXTD_LOG", default_value = "contextd=info")]
    log_filter: String,
}

fn main() {
    let cli = Cli::parse();

    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_new(&cli.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut state = ipc::AppState::default();
    if let Some(path) = cli.workspace {
        if let Err(e) = state.open_workspace(&path) {
            tracing::error!(workspace = %path.display(), error = %e, "failed to open workspace");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "malformed request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
