//! Kodegen Bundler Package - native installers from packaging parameters.
//!
//! Builds .rpm, .deb, .dmg and NSIS .exe installers from an application image
//! described by a flat set of parameters.

use kodegen_bundler_package::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  hint: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
