//! Output formatting for the nbgen binary
//!
//! User-facing progress lines. Diagnostics go through `tracing`.

use colored::Colorize;
use std::path::Path;

/// Output formatter
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        colored::control::set_override(use_color);
        Self { use_color }
    }

    /// Report a written artifact
    pub fn wrote(&self, path: &Path) {
        if self.use_color {
            println!("{} Wrote {}", "[+]".green().bold(), path.display());
        } else {
            println!("[+] Wrote {}", path.display());
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }
}
