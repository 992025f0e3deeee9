//! Logical payload and its encrypted wire framing.

mod frame;

use std::fs;
use std::path::Path;

pub use frame::{PayloadEmbedder, PayloadExtractor};

use crate::error::{Result, StegoError};

/// One embedded file: base name, extension (without the dot) and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub extension: String,
    pub content: Vec<u8>,
}

impl FileEntry {
    /// File name with the extension re-attached, safe to create inside an
    /// output directory (path separators were rejected on construction).
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }
}

/// Content to hide: an optional text message plus any number of files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    pub text: Option<String>,
    pub files: Vec<FileEntry>,
}

impl Payload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Adds in-memory file data under the given file name, splitting the
    /// extension off the name.
    pub fn add_file_data(&mut self, file_name: &str, content: Vec<u8>) -> Result<&mut Self> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(StegoError::InvalidFileName);
        }
        let (name, extension) = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_owned(), ext.to_owned()),
            _ => (file_name.to_owned(), String::new()),
        };
        self.files.push(FileEntry {
            name,
            extension,
            content,
        });
        Ok(self)
    }

    /// Reads a file from disk into the payload.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(StegoError::InvalidFileName)?
            .to_owned();
        let content = fs::read(path).map_err(|source| StegoError::ReadError { source })?;
        self.add_file_data(&file_name, content)
    }

    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut payload = Self::empty();
        for path in paths {
            payload.add_file(path)?;
        }
        Ok(payload)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.files.is_empty()
    }
}
