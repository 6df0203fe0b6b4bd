//! Per-run summary, printed as terminal text or JSON

use colored::*;
use serde::Serialize;
use std::path::PathBuf;

use crate::migrate::TransformStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Unchanged,
    Migrated { transforms: Vec<TransformStats> },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn edit_count(&self) -> usize {
        match &self.status {
            FileStatus::Migrated { transforms } => transforms.iter().map(|t| t.edits).sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub files: Vec<FileOutcome>,
    /// Whether migrated text was written back
    pub written: bool,
}

impl Report {
    pub fn new(mut files: Vec<FileOutcome>, written: bool) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { files, written }
    }

    pub fn migrated_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Migrated { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed { .. }))
            .count()
    }

    pub fn total_edits(&self) -> usize {
        self.files.iter().map(FileOutcome::edit_count).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        for file in &self.files {
            let line = match &file.status {
                FileStatus::Unchanged => continue,
                FileStatus::Migrated { transforms } => {
                    let detail: Vec<String> = transforms
                        .iter()
                        .map(|t| format!("{} {}", t.name, t.edits))
                        .collect();
                    let verb = if self.written { "migrated" } else { "would migrate" };
                    format!(
                        "{} {} ({})",
                        verb.green().bold(),
                        file.path.display(),
                        detail.join(", ").dimmed()
                    )
                }
                FileStatus::Failed { error } => {
                    format!("{} {}: {}", "failed".red().bold(), file.path.display(), error)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str(&format!(
            "{} files scanned, {} {}, {} edits, {} failed\n",
            self.files.len(),
            self.migrated_count(),
            if self.written { "migrated" } else { "need migration" },
            self.total_edits(),
            self.failed_count()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::new(
            vec![
                FileOutcome {
                    path: PathBuf::from("b.js"),
                    status: FileStatus::Migrated {
                        transforms: vec![TransformStats {
                            name: "shape-extraction",
                            edits: 3,
                        }],
                    },
                },
                FileOutcome {
                    path: PathBuf::from("a.js"),
                    status: FileStatus::Unchanged,
                },
                FileOutcome {
                    path: PathBuf::from("c.js"),
                    status: FileStatus::Failed {
                        error: "overlapping edits".into(),
                    },
                },
            ],
            false,
        )
    }

    #[test]
    fn test_counts_and_order() {
        let report = sample();
        assert_eq!(report.files[0].path, PathBuf::from("a.js"));
        assert_eq!(report.migrated_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.total_edits(), 3);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["files"][1]["status"], "migrated");
        assert_eq!(json["files"][1]["transforms"][0]["edits"], 3);
        assert_eq!(json["files"][2]["error"], "overlapping edits");
        assert_eq!(json["written"], false);
    }

    #[test]
    fn test_terminal_summary() {
        colored::control::set_override(false);
        let text = sample().to_terminal();
        assert!(text.contains("would migrate b.js (shape-extraction 3)"));
        assert!(text.contains("failed c.js: overlapping edits"));
        assert!(!text.contains("a.js"));
        assert!(text.ends_with("3 files scanned, 1 need migration, 3 edits, 1 failed\n"));
    }
}
