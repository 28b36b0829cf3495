//! Source context for managing documents

use crate::file_info::FileInformation;
use crate::types::{Position, Uri};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Documents known to a run, keyed by URI.
///
/// Diagnostics only carry a [`Location`](crate::Location); rendering them
/// with source excerpts needs the text they point into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: HashMap<Uri, SourceFile>,
}

/// A source document with content and line index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub uri: Uri,
    /// Document text. When None, it is read from disk for `file://` URIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInformation>,
}

impl SourceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document.
    ///
    /// With `content` the text is kept in memory; without it a `file://`
    /// URI is read from disk once to build the line index. Registering the
    /// same URI again replaces the earlier entry.
    pub fn add_file(&mut self, uri: Uri, content: Option<String>) -> &SourceFile {
        let file_info = match &content {
            Some(c) => Some(FileInformation::new(c)),
            None => read_local(&uri).map(|c| FileInformation::new(&c)),
        };

        self.files.insert(
            uri.clone(),
            SourceFile {
                uri: uri.clone(),
                content,
                file_info,
            },
        );
        &self.files[&uri]
    }

    pub fn get_file(&self, uri: &Uri) -> Option<&SourceFile> {
        self.files.get(uri)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceFile {
    /// The document text, from memory or from disk.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Some(c) => Some(c.clone()),
            None => read_local(&self.uri),
        }
    }

    /// Character index of `position`, for span based renderers.
    pub fn char_index(&self, position: Position) -> Option<usize> {
        self.file_info.as_ref()?.char_index(position)
    }
}

fn read_local(uri: &Uri) -> Option<String> {
    match uri.parse() {
        ("file", path) | ("", path) => std::fs::read_to_string(path).ok(),
        _ => None,
    }
}
