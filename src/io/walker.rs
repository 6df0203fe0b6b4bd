use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Extensions of files the migrator understands
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    ignore_patterns: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_patterns: vec![],
        }
    }

    /// Glob patterns matched against each candidate path; invalid ones are dropped
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        self.ignore_patterns = patterns
            .iter()
            .filter_map(|pattern| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("Ignoring invalid glob {:?}: {}", pattern, e);
                    None
                }
            })
            .collect();
        self
    }

    /// Matching files under the root, sorted; a file root is returned as is
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(|entry| entry.file_name() != "node_modules")
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext_str = ext.to_string_lossy();
        if !self.extensions.iter().any(|e| *e == ext_str) {
            return false;
        }
        // declaration files carry no code to migrate
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        if [".d.ts", ".d.mts", ".d.cts"].iter().any(|s| name.ends_with(s)) {
            return false;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self
            .ignore_patterns
            .iter()
            .any(|p| p.matches_path(path) || p.matches_path(relative))
    }
}

/// Source files under every root, deduplicated and in a stable order
pub fn find_source_files(roots: &[PathBuf], ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in roots {
        let found = FileWalker::new(root.clone())
            .with_ignore_patterns(ignore_patterns)
            .walk()?;
        files.extend(found);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_selects_source_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/a.js");
        touch(temp.path(), "src/b.tsx");
        touch(temp.path(), "src/types.d.ts");
        touch(temp.path(), "src/readme.md");
        touch(temp.path(), "node_modules/lib/index.js");

        let files = FileWalker::new(temp.path().to_path_buf()).walk().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.js", "b.tsx"]);
    }

    #[test]
    fn test_ignore_patterns() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "src/a.js");
        touch(temp.path(), "src/legacy/old.js");

        let files = FileWalker::new(temp.path().to_path_buf())
            .with_ignore_patterns(&["src/legacy/**".to_string()])
            .walk()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/a.js"));
    }

    #[test]
    fn test_file_root_and_dedup() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.js");
        let file = temp.path().join("a.js");

        let files = find_source_files(&[file.clone(), temp.path().to_path_buf()], &[]).unwrap();
        assert_eq!(files, vec![file]);
    }
}
