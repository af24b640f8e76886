//! `quorum version`

use quorum::gov::params::{DEFAULT_QUORUM, DEFAULT_THRESHOLD, DEFAULT_VETO_THRESHOLD};

fn version_line() -> String {
    format!("quorum {}", env!("CARGO_PKG_VERSION"))
}

/// Print the engine version and the tally parameters a fresh chain starts with.
pub fn execute() {
    println!("{}", version_line());
    println!(
        "default tally: quorum {} / threshold {} / veto {}",
        DEFAULT_QUORUM, DEFAULT_THRESHOLD, DEFAULT_VETO_THRESHOLD
    );
}
