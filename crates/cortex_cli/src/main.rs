//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cortex_core` linkage.
//! - Echo capture parsing for quick local sanity checks.

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        println!("cortex_core version={}", cortex_core::core_version());
        return ExitCode::SUCCESS;
    }

    let capture = cortex_core::parse_capture(&args.join(" "));
    match serde_json::to_string_pretty(&capture) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("cannot render capture: {err}");
            ExitCode::FAILURE
        }
    }
}
