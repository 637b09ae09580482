use crate::errors::Result;
use std::fs;
use std::path::Path;

/// Class names, index-aligned with output vector positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// One entry per line. A missing terminator on the last line is fine, and
    /// `\r\n` endings are stripped.
    pub fn from_text(text: &str) -> Self {
        Self {
            labels: text.lines().map(str::to_owned).collect(),
        }
    }

    /// Like [`Self::from_text`], but a line that is not valid UTF-8 becomes an
    /// empty entry so only that row is dropped from results.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let labels = bytes
            .split_inclusive(|&b| b == b'\n')
            .map(|line| {
                let line = match line.strip_suffix(b"\n") {
                    Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
                    None => line,
                };
                std::str::from_utf8(line)
                    .map(str::to_owned)
                    .unwrap_or_default()
            })
            .collect();
        Self { labels }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::from_bytes(&fs::read(path)?);
        tracing::info!(path = %path.display(), labels = table.len(), "Labels loaded");
        Ok(table)
    }

    /// Label at `index`, or `None` when out of range or empty.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels
            .get(index)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}
