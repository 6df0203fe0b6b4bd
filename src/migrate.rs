//! Migration driver
//!
//! Runs the transforms over one file's text in order. Each transform sees a
//! fresh parse of the previous transform's output, so every edit list is in
//! the coordinates of the text it was computed from.

use std::path::Path;

use serde::Serialize;

use crate::config::MigrateConfig;
use crate::core::Result;
use crate::parser::{detect_variant, has_parse_errors, parse_source};
use crate::patch::{apply_edits, Edit};
use crate::transformers::{default_transforms, Transform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub name: &'static str,
    pub edits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub text: String,
    /// Transforms that produced at least one edit, in run order
    pub applied: Vec<TransformStats>,
}

impl MigrationOutcome {
    pub fn is_changed(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn total_edits(&self) -> usize {
        self.applied.iter().map(|s| s.edits).sum()
    }
}

pub struct Migrator {
    transforms: Vec<Box<dyn Transform>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(default_transforms())
    }
}

impl Migrator {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn migrate(
        &self,
        source: &str,
        path: &Path,
        config: &MigrateConfig,
    ) -> Result<MigrationOutcome> {
        let variant = detect_variant(path);
        let line_ending = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let mut text = source.to_string();
        let mut applied = Vec::new();

        for (i, transform) in self.transforms.iter().enumerate() {
            let file = parse_source(&text, path, variant)?;
            if i == 0 && has_parse_errors(&file.tree) {
                log::warn!(
                    "{} has syntax errors; only well-formed sites will be rewritten",
                    path.display()
                );
            }

            let edits = transform.run(&file, config)?;
            if edits.is_empty() {
                continue;
            }
            log::debug!(
                "{}: {} produced {} edits",
                path.display(),
                transform.name(),
                edits.len()
            );

            let edits: Vec<Edit> = edits
                .into_iter()
                .map(|edit| edit.map_text(|fragment| tidy_fragment(fragment, line_ending)))
                .collect();
            text = apply_edits(&text, &edits)?;
            applied.push(TransformStats {
                name: transform.name(),
                edits: edits.len(),
            });
        }

        if applied.is_empty() {
            return Ok(MigrationOutcome {
                text: source.to_string(),
                applied,
            });
        }

        Ok(MigrationOutcome {
            text: match_final_newline(source, text, line_ending),
            applied,
        })
    }
}

/// Migrate one file's text with the default transforms
pub fn migrate_source(source: &str, path: &Path, config: &MigrateConfig) -> Result<MigrationOutcome> {
    Migrator::default().migrate(source, path, config)
}

/// Drop whitespace left before line breaks and use the file's line ending
fn tidy_fragment(fragment: &str, line_ending: &str) -> String {
    let lines: Vec<&str> = fragment.split('\n').collect();
    let last = lines.len() - 1;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == last {
                *line
            } else {
                line.trim_end_matches([' ', '\t', '\r'])
            }
        })
        .collect::<Vec<_>>()
        .join(line_ending)
}

fn match_final_newline(original: &str, mut text: String, line_ending: &str) -> String {
    let wants_newline = original.ends_with('\n');
    if wants_newline && !text.ends_with('\n') {
        text.push_str(line_ending);
    } else if !wants_newline {
        let end = text.trim_end_matches(['\r', '\n']).len();
        text.truncate(end);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFile;
    use pretty_assertions::assert_eq;

    struct Fixed(Vec<Edit>);

    impl Transform for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn run(&self, _file: &SourceFile, _config: &MigrateConfig) -> Result<Vec<Edit>> {
            Ok(self.0.clone())
        }
    }

    fn run_fixed(source: &str, edits: Vec<Edit>) -> MigrationOutcome {
        Migrator::new(vec![Box::new(Fixed(edits))])
            .migrate(source, Path::new("a.js"), &MigrateConfig::default())
            .unwrap()
    }

    #[test]
    fn test_tidy_fragment() {
        assert_eq!(tidy_fragment("a  \n  b \nc ", "\n"), "a\n  b\nc ");
        assert_eq!(tidy_fragment("x\ny", "\r\n"), "x\r\ny");
        assert_eq!(tidy_fragment("private ", "\n"), "private ");
    }

    #[test]
    fn test_final_newline_added_and_removed() {
        assert_eq!(match_final_newline("a\n", "b".into(), "\n"), "b\n");
        assert_eq!(match_final_newline("a", "b\n".into(), "\n"), "b");
        assert_eq!(match_final_newline("a", "b".into(), "\n"), "b");
    }

    #[test]
    fn test_no_edits_returns_original() {
        let outcome = run_fixed("const a = 1;  \n", vec![]);
        assert_eq!(outcome.text, "const a = 1;  \n");
        assert!(!outcome.is_changed());
    }

    #[test]
    fn test_crlf_fragments() {
        let outcome = run_fixed("a;\r\nb;\r\n", vec![Edit::insert(4, "x; \ny;\n")]);
        assert_eq!(outcome.text, "a;\r\nx;\r\ny;\r\nb;\r\n");
        assert_eq!(outcome.total_edits(), 1);
    }

    #[test]
    fn test_overlap_is_fatal() {
        let result = Migrator::new(vec![Box::new(Fixed(vec![
            Edit::delete(0..4),
            Edit::replace(2..6, "x"),
        ]))])
        .migrate("abcdefgh", Path::new("a.js"), &MigrateConfig::default());
        assert!(matches!(
            result,
            Err(crate::core::Error::OverlappingEdits { .. })
        ));
    }
}
