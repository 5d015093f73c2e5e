//! KODEGEN Bundler BFF - AIX installp package builder.
//!
//! Stages an install tree, generates the mkinstallp control file and builds
//! a .bff package, streaming tool output into the log.

use kodegen_bundler_bff::cli;
use kodegen_bundler_bff::cli::OutputManager;
use std::process;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new(false);
            output.error(&format!("Fatal error: {e}"));
            process::exit(1);
        }
    }
}
