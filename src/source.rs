//! Document sources
//!
//! The collaborator that hands the core a design file. Fetching from the
//! provider's API happens elsewhere; these read an already-fetched response.

use std::cell::RefCell;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::document::DesignFile;
use crate::error::Result;
use crate::limits::TraversalLimits;

pub trait DocumentSource {
    /// Short description for logs.
    fn describe(&self) -> String;
    fn load(&self, limits: &TraversalLimits) -> Result<DesignFile>;
}

/// A file response saved as JSON on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self, limits: &TraversalLimits) -> Result<DesignFile> {
        let content = fs::read_to_string(&self.path)?;
        DesignFile::from_json_str(&content, limits)
    }
}

/// A file response read from any [`Read`], e.g. stdin.
///
/// The reader is drained on the first `load`; later loads see an empty
/// stream and fail as invalid JSON.
pub struct ReaderSource<R> {
    label: String,
    reader: RefCell<R>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(label: impl Into<String>, reader: R) -> Self {
        Self {
            label: label.into(),
            reader: RefCell::new(reader),
        }
    }
}

impl<R: Read> DocumentSource for ReaderSource<R> {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load(&self, limits: &TraversalLimits) -> Result<DesignFile> {
        let mut content = String::new();
        self.reader.borrow_mut().read_to_string(&mut content)?;
        DesignFile::from_json_str(&content, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "Landing", "document": {{"name": "Root"}}}}"#).unwrap();

        let source = FileSource::new(file.path());
        let design = source.load(&TraversalLimits::default()).unwrap();
        assert_eq!(design.name.as_deref(), Some("Landing"));
        assert_eq!(design.document.name.as_deref(), Some("Root"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("missing.json"));
        let err = source.load(&TraversalLimits::default()).unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }

    #[test]
    fn test_reader_source_loads() {
        let json = r#"{"document": {"name": "Root", "children": [{"name": "Child"}]}}"#;
        let source = ReaderSource::new("stdin", json.as_bytes());
        let design = source.load(&TraversalLimits::default()).unwrap();
        assert_eq!(design.document.children[0].name.as_deref(), Some("Child"));
    }

    #[test]
    fn test_reader_source_rejects_garbage() {
        let source = ReaderSource::new("stdin", "not json".as_bytes());
        let err = source.load(&TraversalLimits::default()).unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
        assert_eq!(source.describe(), "stdin");
    }
}
