//! Rendering of a measured change set.

use std::fmt;

use prsize_core::{ClassHistogram, FileStat, LineClass};
use serde::Serialize;

use crate::aggregate::AggregateResult;
use crate::filter::SkippedFile;
use crate::label::LabelPlan;

/// Stats of one measured file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub stat: FileStat,
}

/// A file whose stats could not be built; it contributes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Everything `prsize measure` reports.
///
/// # Examples
///
/// ```
/// use prsize_core::{FileStat, PrsizeConfig};
/// use prsize_difflens::aggregate::aggregate;
/// use prsize_difflens::filter::ExclusionPolicy;
/// use prsize_difflens::label::LabelTable;
/// use prsize_difflens::report::SizeReport;
///
/// let labels = LabelTable::new(PrsizeConfig::default_labels()).unwrap();
/// let result = aggregate(&[], &ExclusionPolicy::default(), &labels);
/// let report = SizeReport::new(result);
/// assert!(report.to_string().contains("Extra Small"));
/// assert!(report.to_markdown().contains("`0` changes"));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeReport {
    #[serde(flatten)]
    pub result: AggregateResult,
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    pub failed: Vec<FailedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_plan: Option<LabelPlan>,
}

impl SizeReport {
    pub fn new(result: AggregateResult) -> Self {
        Self {
            result,
            files: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            target: None,
            label_plan: None,
        }
    }

    /// Whether the change count is within the configured target, if any.
    pub fn within_target(&self) -> Option<bool> {
        self.target.map(|t| self.result.changes <= t)
    }

    /// Render the report as a pull-request comment body.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "## This pull request seems to have `{}` changes!\n\n",
            self.result.changes
        ));
        out.push_str(&format!("**Size:** {}\n\n", self.result.label.name));

        if let Some(target) = self.target {
            out.push_str(&format!(
                "Generally speaking it is best to aim for `{target}` or less to keep pull requests easy and quick to review!\n\n"
            ));
        }

        if !self.files.is_empty() {
            out.push_str("| File | + | - |\n");
            out.push_str("|------|---|---|\n");
            for file in &self.files {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    file.path,
                    file.stat.additions.total(),
                    file.stat.deletions.total()
                ));
            }
            out.push('\n');
        }

        out.push_str("### Detailed stats:\n```json\n");
        out.push_str(
            &serde_json::to_string_pretty(&self.result.stats).unwrap_or_else(|_| "{}".into()),
        );
        out.push_str("\n```\n");

        if !self.skipped.is_empty() {
            out.push_str(&format!(
                "\n_{} file(s) excluded by pattern._\n",
                self.skipped.len()
            ));
        }
        out
    }
}

fn histogram_row(f: &mut fmt::Formatter<'_>, name: &str, hist: &ClassHistogram) -> fmt::Result {
    write!(f, "{name:<10}")?;
    for class in LineClass::ALL {
        write!(f, " {:>9}", hist.get(class))?;
    }
    writeln!(f, " {:>9}", hist.total())
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size Report")?;
        writeln!(f, "===========")?;
        writeln!(
            f,
            "Label: {} ({} changes)\n",
            self.result.label.name, self.result.changes
        )?;

        write!(f, "{:<10}", "")?;
        for class in LineClass::ALL {
            write!(f, " {:>9}", class.to_string())?;
        }
        writeln!(f, " {:>9}", "total")?;
        writeln!(f, "{}", "-".repeat(70))?;
        histogram_row(f, "additions", &self.result.stats.additions)?;
        histogram_row(f, "deletions", &self.result.stats.deletions)?;

        if !self.files.is_empty() {
            writeln!(f, "\n{:<50} {:>8} {:>8}", "File", "+", "-")?;
            writeln!(f, "{}", "-".repeat(68))?;
            for file in &self.files {
                writeln!(
                    f,
                    "{:<50} {:>8} {:>8}",
                    file.path,
                    file.stat.additions.total(),
                    file.stat.deletions.total()
                )?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "\nExcluded:")?;
            for skipped in &self.skipped {
                writeln!(f, "  {skipped}")?;
            }
        }

        if !self.failed.is_empty() {
            writeln!(f, "\nNot measured:")?;
            for failed in &self.failed {
                writeln!(f, "  {} ({})", failed.path, failed.error)?;
            }
        }

        if let (Some(target), Some(within)) = (self.target, self.within_target()) {
            let verdict = if within { "within" } else { "over" };
            writeln!(f, "\nTarget: {target} changes ({verdict})")?;
        }

        if let Some(plan) = &self.label_plan {
            writeln!(f)?;
            if plan.is_noop() {
                writeln!(f, "Labels: up to date")?;
            } else {
                if let Some(add) = &plan.add {
                    writeln!(f, "Labels: add {add}")?;
                }
                for remove in &plan.remove {
                    writeln!(f, "Labels: remove {remove}")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prsize_core::Label;

    fn sample() -> SizeReport {
        let mut stats = FileStat::default();
        stats.additions.default = 40;
        stats.deletions.comment = 2;
        let mut report = SizeReport::new(AggregateResult {
            stats,
            changes: 42,
            label: Label::bounded("Small", 64),
        });
        report.files.push(FileReport {
            path: "src/lib.rs".into(),
            stat: stats,
        });
        report
    }

    #[test]
    fn text_report_lists_label_and_files() {
        let text = sample().to_string();
        assert!(text.contains("Label: Small (42 changes)"));
        assert!(text.contains("src/lib.rs"));
        assert!(!text.contains("Target:"));
    }

    #[test]
    fn markdown_mentions_target() {
        let mut report = sample();
        report.target = Some(256);
        let md = report.to_markdown();
        assert!(md.contains("`42` changes"));
        assert!(md.contains("`256` or less"));
        assert!(md.contains("\"comments\": 2"));
        assert_eq!(report.within_target(), Some(true));
    }

    #[test]
    fn json_flattens_result() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["changes"], 42);
        assert_eq!(json["label"]["name"], "Small");
        assert_eq!(json["stats"]["additions"]["default"], 40);
        assert!(json.get("target").is_none());
    }

    #[test]
    fn label_plan_is_rendered() {
        let mut report = sample();
        report.label_plan = Some(LabelPlan {
            add: Some("Small".into()),
            remove: vec!["Large".into()],
        });
        let text = report.to_string();
        assert!(text.contains("Labels: add Small"));
        assert!(text.contains("Labels: remove Large"));
    }
}
