//! Code Sandbox CLI
//!
//! Runs one Python fragment through the sandbox and prints the result as JSON.

use std::io::Read;

use code_sandbox::{strip_code_fence, IsolatedRunner, SandboxConfig};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries only the JSON result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 || args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: {} [FILE]", args[0]);
        eprintln!("\nRuns a Python fragment from FILE (or stdin) in the sandbox.");
        eprintln!("\nEnvironment variables:");
        eprintln!("  CODE_SANDBOX_CONFIG=<path>       TOML config file");
        eprintln!("  CODE_SANDBOX_TIMEOUT=<secs>      Deadline per run (default: 30)");
        eprintln!("  CODE_SANDBOX_PYTHON=<binary>     Interpreter (default: python3)");
        eprintln!("  CODE_SANDBOX_SCRATCH_DIR=<path>  Directory for generated scripts");
        std::process::exit(2);
    }

    let response = match read_input(args.get(1).map(String::as_str)) {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Failed to read program: {}", e);
            std::process::exit(2);
        }
    };

    let runner = match SandboxConfig::from_env().and_then(|c| IsolatedRunner::from_config(&c)) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Invalid sandbox configuration: {}", e);
            std::process::exit(2);
        }
    };

    tracing::info!(timeout = ?runner.timeout(), "running fragment");

    let result = runner.execute(strip_code_fence(&response)).await;

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            std::process::exit(2);
        }
    }

    if !result.succeeded {
        std::process::exit(1);
    }
}

fn read_input(path: Option<&str>) -> std::io::Result<String> {
    match path {
        Some("-") | None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path),
    }
}
