use std::io::{IsTerminal, Write};

use colored::{ColoredString, Colorize};

/// Terminal styling for console output. Plain when colours are disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Colour only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::new(!no_color && std::io::stdout().is_terminal())
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |t| t.bold())
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_green())
    }

    pub fn success_banner(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_green().bold())
    }

    pub fn failure(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_red())
    }

    pub fn failure_banner(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_red().bold())
    }
}

/// Human-facing run log written to stdout.
///
/// Console output is best effort: a closed pipe must not fail the run.
pub struct Console<W: Write> {
    out: W,
    palette: Palette,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self { out, palette }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    pub fn step(&mut self, number: u8, text: &str) {
        let line = self.palette.heading(&format!("Step {number}: {text}"));
        self.line(&line);
    }

    pub fn saved(&mut self, label: &str, location: &str) {
        let line = self.palette.success(&format!("✓ {label} saved to {location}"));
        self.line(&line);
    }

    pub fn final_review(&mut self, summary: &str) {
        let heading = self.palette.heading("--- FINAL REVIEW ---");
        self.line("");
        self.line(&heading);
        self.line(summary);
    }

    pub fn failed(&mut self, violated_policies: u64) {
        let line = self.palette.failure_banner(&format!(
            "✖ FAIL: Found {violated_policies} policy violation(s)."
        ));
        self.line(&line);
    }

    pub fn passed(&mut self) {
        let line = self
            .palette
            .success_banner("✔ PASS: No vulnerabilities detected in valid Terraform code.");
        self.line(&line);
    }

    /// Distinctly marked line for run-terminating errors.
    pub fn fatal(&mut self, message: &str) {
        let line = self.palette.failure_banner(&format!("✖ ERROR: {message}"));
        self.line(&line);
    }

    pub fn warning(&mut self, message: &str) {
        let line = self.palette.failure(message);
        self.line(&line);
    }
}
