//! insightdb CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Delegates parsing, dispatch and response output to `cli::run`
//! 2. Exits with non-zero on failure
//!
//! main.rs must NOT load configuration or open datasets itself.

use insightdb::cli;

fn main() {
    if cli::run().is_err() {
        std::process::exit(1);
    }
}
