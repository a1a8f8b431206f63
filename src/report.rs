use crate::bundle::checks::Check;
use crate::bundle::error::VerifyError;
use crate::bundle::layout::NodeSelection;
use crate::display::{ProgressBar, Terminal, format_elapsed};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// What a passing check looked at
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evidence {
    pub nodes: Vec<String>,
    pub detail: Option<String>,
}

impl Evidence {
    pub fn nodes(nodes: Vec<String>) -> Self {
        Self {
            nodes,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CheckStatus {
    Passed,
    Failed { reason: String },
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub check: Check,
    #[serde(flatten)]
    pub status: CheckStatus,
    pub nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckOutcome {
    pub fn passed(check: Check, evidence: Evidence) -> Self {
        Self {
            check,
            status: CheckStatus::Passed,
            nodes: evidence.nodes,
            detail: evidence.detail,
        }
    }

    pub fn failed(check: Check, error: &VerifyError) -> Self {
        Self {
            check,
            status: CheckStatus::Failed {
                reason: error.to_string(),
            },
            nodes: Vec::new(),
            detail: None,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// Outcomes of one pass over a plan
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub artifact_dir: PathBuf,
    pub selection: NodeSelection,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Pass number in wait mode, 1 otherwise
    pub attempt: u32,
    pub outcomes: Vec<CheckOutcome>,
    /// Why wait mode stopped before every check passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped: Option<String>,
}

impl Report {
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    /// An empty plan never succeeds
    pub fn is_success(&self) -> bool {
        !self.outcomes.is_empty() && self.failed_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.is_passed())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report, colored when the terminal supports it
    pub fn render_text(&self, terminal: &Terminal) -> String {
        let mut out = String::new();
        out.push_str(&format!("{:=^80}\n", " Diagnostic Bundle Verification "));
        out.push_str(&format!(
            "Artifacts: {} | Nodes: {} | Time: {}\n",
            self.artifact_dir.display(),
            self.selection,
            self.finished_at.format("%Y-%m-%d %H:%M:%S")
        ));
        if self.attempt > 1 {
            out.push_str(&format!("Attempt: {}\n", self.attempt));
        }
        out.push('\n');

        for outcome in &self.outcomes {
            let marker = match &outcome.status {
                CheckStatus::Passed => terminal.status_style(true).apply_to("PASS"),
                CheckStatus::Failed { .. } => terminal.status_style(false).apply_to("FAIL"),
            };
            out.push_str(&format!("  {}  {}", marker, outcome.check));
            if !outcome.nodes.is_empty() {
                out.push_str(&format!(" [{}]", outcome.nodes.join(", ")));
            }
            out.push('\n');

            match &outcome.status {
                CheckStatus::Failed { reason } => out.push_str(&format!("        {}\n", reason)),
                CheckStatus::Passed => {
                    if let Some(detail) = &outcome.detail {
                        out.push_str(&format!("        {}\n", detail));
                    }
                }
            }
        }

        let elapsed = (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default();
        out.push('\n');
        out.push_str(&format!(
            "Checks: {} | {} passed, {} failed in {}\n",
            ProgressBar::default()
                .with_terminal(*terminal)
                .render(self.passed_count(), self.outcomes.len()),
            self.passed_count(),
            self.failed_count(),
            format_elapsed(elapsed)
        ));
        if let Some(stopped) = &self.stopped {
            out.push_str(&format!("Stopped: {}\n", stopped));
        }
        out.push_str(&format!("{:=^80}\n", ""));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn report(outcomes: Vec<CheckOutcome>) -> Report {
        let now = Utc::now();
        Report {
            artifact_dir: PathBuf::from("/art"),
            selection: NodeSelection::First,
            started_at: now,
            finished_at: now,
            attempt: 1,
            outcomes,
            stopped: None,
        }
    }

    fn mixed() -> Report {
        report(vec![
            CheckOutcome::passed(Check::ArtifactsAvailable, Evidence::default()),
            CheckOutcome::passed(
                Check::MetricsParse,
                Evidence::nodes(vec!["n1".to_string()]).with_detail("12 beans".to_string()),
            ),
            CheckOutcome::failed(
                Check::Content {
                    file: "os-release".to_string(),
                },
                &VerifyError::missing_file("n2", Path::new("/art/nodes/n2/os-release")),
            ),
        ])
    }

    #[test]
    fn test_counts_and_verdict() {
        let report = mixed();
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_empty_report_is_not_success() {
        let report = report(Vec::new());
        assert!(!report.is_success());
    }

    #[test]
    fn test_render_text_without_colors() {
        let text = mixed().render_text(&Terminal::with_colors(false));
        assert!(text.contains("  PASS  artifacts are available\n"));
        assert!(
            text.contains("  PASS  metrics file of the first node parses [n1]\n        12 beans\n")
        );
        assert!(text.contains("  FAIL  content of os-release is valid\n"));
        assert!(text.contains("node n2 is missing /art/nodes/n2/os-release"));
        assert!(text.contains("Checks: [#############xxxxxxx] 2/3 | 2 passed, 1 failed"));
        assert!(!text.contains("Attempt:"));
        assert!(!text.contains("Stopped:"));
    }

    #[test]
    fn test_render_text_stopped_attempt() {
        let mut report = mixed();
        report.attempt = 4;
        report.stopped = Some("bundle verification timed out after 10s".to_string());
        let text = report.render_text(&Terminal::with_colors(false));
        assert!(text.contains("Attempt: 4\n"));
        assert!(text.contains("Stopped: bundle verification timed out after 10s\n"));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&mixed().to_json().unwrap()).unwrap();
        let outcomes = json["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0]["status"], "passed");
        assert_eq!(outcomes[0]["check"]["check"], "artifacts_available");
        assert_eq!(outcomes[1]["detail"], "12 beans");
        assert_eq!(outcomes[2]["status"], "failed");
        assert_eq!(outcomes[2]["check"]["file"], "os-release");
        assert!(outcomes[2]["reason"].as_str().unwrap().contains("n2"));
        assert_eq!(json["selection"]["mode"], "first");
    }
}
