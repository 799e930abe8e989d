//! Console reporting of a finished competition.

use std::io::Write;
use std::sync::Mutex;

use anyhow::Result;
use competition::{CompetitionReport, ReportSink};
use tracing::warn;

/// Writes each report bucket under a heading.
#[derive(Debug)]
pub struct TextReportSink<W> {
    out: Mutex<W>,
}

impl<W: Write> TextReportSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn section(&self, heading: &str, text: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut block = format!("{}:\n", heading);
        for line in text.lines() {
            block.push_str("  ");
            block.push_str(line);
            block.push('\n');
        }
        if let Err(e) = out.write_all(block.as_bytes()) {
            warn!(error = %e, "Failed to write report section");
        }
    }
}

impl TextReportSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> ReportSink for TextReportSink<W> {
    fn report_execution_errors(&self, text: &str) {
        self.section("Execution errors", text);
    }

    fn report_assertions_failed(&self, text: &str) {
        self.section("Assertions failed", text);
    }

    fn report_warnings(&self, text: &str) {
        self.section("Warnings", text);
    }
}

/// Render the report for stdout, as pretty JSON or as the text summary.
pub fn render(report: &CompetitionReport, json: bool) -> Result<String> {
    if json {
        Ok(report.to_json()?)
    } else {
        Ok(report.summary())
    }
}
