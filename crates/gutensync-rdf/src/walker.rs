//! A lazy, recursive directory walk that yields `.rdf` file paths.
//!
//! A custom `Iterator` instead of a general-purpose directory-walking
//! crate: each [`std::fs::ReadDir`] is itself a lazy OS-backed iterator,
//! so a stack of them gives recursive descent with O(depth) memory,
//! never O(file count).

use std::fs::ReadDir;
use std::path::PathBuf;

pub struct RdfWalker {
    stack: Vec<ReadDir>,
}

impl RdfWalker {
    pub fn new(root: &std::path::Path) -> std::io::Result<Self> {
        let first = std::fs::read_dir(root)?;
        Ok(Self { stack: vec![first] })
    }
}

impl Iterator for RdfWalker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Ok(entry)) => {
                    let path = entry.path();
                    if path.is_dir() {
                        if let Ok(subdir) = std::fs::read_dir(&path) {
                            self.stack.push(subdir);
                        }
                        continue;
                    }
                    let is_rdf = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("rdf"));
                    if is_rdf {
                        return Some(path);
                    }
                }
                Some(Err(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_nested_directories_and_skips_non_rdf_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("1/2/3/4/12345")).unwrap();
        fs::write(dir.path().join("1/2/3/4/12345/pg12345.rdf"), "").unwrap();
        fs::write(dir.path().join("1/2/3/4/12345/pg12345.txt"), "").unwrap();
        fs::write(dir.path().join("top-level.rdf"), "").unwrap();

        let mut found: Vec<_> = RdfWalker::new(dir.path())
            .unwrap()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        found.sort();

        assert_eq!(found, vec!["pg12345.rdf".to_string(), "top-level.rdf".to_string()]);
    }

    #[test]
    fn missing_root_directory_errors_immediately() {
        let missing = std::path::PathBuf::from("/nonexistent/path/for/gutensync/tests");
        assert!(RdfWalker::new(&missing).is_err());
    }
}
