//! Result categories: the buffer key and the UI section key.

use serde::{Deserialize, Serialize};

/// A named grouping of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    File,
    Folder,
    Picture,
    Audio,
    Video,
    Document,
    /// Files found by interpreting the query semantically.
    Inference,
}

impl Category {
    /// Stable key used in notifications and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::File => "file",
            Category::Folder => "folder",
            Category::Picture => "picture",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Document => "document",
            Category::Inference => "inference",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
