// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File intake: turns a candidate file list into a single selection

use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A file the user picked or dropped
///
/// The bytes are shared, so cloning a `SelectedFile` (and any preview derived
/// from it) never copies the image.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What intake tells the components downstream of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeEvent {
    Selected(SelectedFile),
    Cleared,
}

/// Holds the current selection
#[derive(Debug, Default)]
pub struct FileIntake {
    selected: Option<SelectedFile>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a candidate list. Only the first file is honored and nothing
    /// is validated here; the drop zone already filtered by type.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> IntakeEvent {
        let extra = files.len().saturating_sub(1);
        match files.into_iter().next() {
            Some(file) => {
                if extra > 0 {
                    debug!("Ignoring {} extra file(s), keeping {}", extra, file.name());
                }
                self.selected = Some(file.clone());
                IntakeEvent::Selected(file)
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) -> IntakeEvent {
        self.selected = None;
        IntakeEvent::Cleared
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn test_first_file_wins() {
        let mut intake = FileIntake::new();
        let event = intake.select_files(vec![jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")]);

        assert_eq!(event, IntakeEvent::Selected(jpeg("a.jpg")));
        assert_eq!(intake.selected().map(|f| f.name()), Some("a.jpg"));
    }

    #[test]
    fn test_empty_list_clears() {
        let mut intake = FileIntake::new();
        intake.select_files(vec![jpeg("a.jpg")]);

        assert_eq!(intake.select_files(Vec::new()), IntakeEvent::Cleared);
        assert!(intake.selected().is_none());
    }

    #[test]
    fn test_no_type_validation() {
        let mut intake = FileIntake::new();
        let odd = SelectedFile::new("notes.txt", "text/plain", Vec::new());
        assert_eq!(intake.select_files(vec![odd.clone()]), IntakeEvent::Selected(odd));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let rendered = format!("{:?}", jpeg("leaf.jpg"));
        assert!(rendered.contains("len: 3"));
        assert!(!rendered.contains("255"));
    }
}
