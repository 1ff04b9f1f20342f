use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use crate::form::SubmitError;

pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachedFile {
    pub name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

impl AttachedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents,
        }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UploadError {
    #[error("Only PDF and Word documents are allowed")]
    UnsupportedType(String),
    #[error("File size cannot exceed 10MB")]
    TooLarge { size: u64 },
}

impl From<UploadError> for SubmitError {
    fn from(error: UploadError) -> Self {
        SubmitError::with_source(error.to_string(), error)
    }
}

pub fn check_attachment(file: &AttachedFile) -> Result<(), UploadError> {
    if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(UploadError::UnsupportedType(file.mime_type.clone()));
    }
    if file.size() > MAX_ATTACHMENT_BYTES {
        return Err(UploadError::TooLarge { size: file.size() });
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
struct SlotState {
    file: Option<AttachedFile>,
    error: Option<String>,
    drag_active: bool,
}

/// The drop zone next to a form: holds at most one accepted document plus the
/// message for the last rejected one.
#[derive(Clone, Default)]
pub struct AttachmentSlot {
    state: Arc<RwLock<SlotState>>,
}

impl AttachmentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `file` if it passes the attachment policy. A rejected file
    /// leaves the previously accepted one in place.
    pub fn attach(&self, file: AttachedFile) -> Result<(), UploadError> {
        let mut state = self.write();
        if let Err(error) = check_attachment(&file) {
            debug!(file = %file.name, %error, "attachment rejected");
            state.error = Some(error.to_string());
            return Err(error);
        }
        debug!(file = %file.name, size = file.size(), "attachment accepted");
        state.file = Some(file);
        state.error = None;
        Ok(())
    }

    /// Handles a drop event; only the first dropped file is considered.
    pub fn drop_files(&self, files: Vec<AttachedFile>) -> Result<bool, UploadError> {
        self.write().drag_active = false;
        let Some(file) = files.into_iter().next() else {
            return Ok(false);
        };
        self.attach(file)?;
        Ok(true)
    }

    pub fn remove(&self) {
        self.write().file = None;
    }

    pub fn drag_enter(&self) {
        self.write().drag_active = true;
    }

    pub fn drag_leave(&self) {
        self.write().drag_active = false;
    }

    pub fn is_drag_active(&self) -> bool {
        self.read().drag_active
    }

    pub fn file(&self) -> Option<AttachedFile> {
        self.read().file.clone()
    }

    pub fn file_name(&self) -> Option<String> {
        self.read().file.as_ref().map(|file| file.name.clone())
    }

    pub fn has_file(&self) -> bool {
        self.read().file.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn clear(&self) {
        *self.write() = SlotState::default();
    }

    fn read(&self) -> RwLockReadGuard<'_, SlotState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SlotState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> AttachedFile {
        AttachedFile::new(name, "application/pdf", vec![0; size])
    }

    #[test]
    fn policy_accepts_pdf_and_word_only() {
        assert!(check_attachment(&pdf("syllabus.pdf", 10)).is_ok());
        let docx = AttachedFile::new("notes.docx", ALLOWED_MIME_TYPES[2], vec![1, 2, 3]);
        assert!(check_attachment(&docx).is_ok());

        let image = AttachedFile::new("cover.png", "image/png", vec![1]);
        let error = check_attachment(&image).expect_err("png is rejected");
        assert_eq!(error.to_string(), "Only PDF and Word documents are allowed");
    }

    #[test]
    fn policy_rejects_files_over_ten_mebibytes() {
        let limit = MAX_ATTACHMENT_BYTES as usize;
        assert!(check_attachment(&pdf("max.pdf", limit)).is_ok());
        let error = check_attachment(&pdf("big.pdf", limit + 1)).expect_err("too large");
        assert_eq!(error, UploadError::TooLarge { size: limit as u64 + 1 });
        assert_eq!(error.to_string(), "File size cannot exceed 10MB");
    }

    #[test]
    fn rejected_file_keeps_previous_attachment() {
        let slot = AttachmentSlot::new();
        slot.attach(pdf("a.pdf", 4)).expect("accept pdf");
        assert!(
            slot.attach(AttachedFile::new("b.txt", "text/plain", vec![1]))
                .is_err()
        );
        assert_eq!(slot.file_name().as_deref(), Some("a.pdf"));
        assert_eq!(
            slot.error().as_deref(),
            Some("Only PDF and Word documents are allowed")
        );

        slot.attach(pdf("c.pdf", 4)).expect("accept replacement");
        assert_eq!(slot.error(), None);
        slot.remove();
        assert!(!slot.has_file());
    }

    #[test]
    fn drop_takes_first_file_and_ends_drag() {
        let slot = AttachmentSlot::new();
        slot.drag_enter();
        assert!(slot.is_drag_active());
        let accepted = slot
            .drop_files(vec![pdf("first.pdf", 1), pdf("second.pdf", 1)])
            .expect("drop accepted");
        assert!(accepted);
        assert!(!slot.is_drag_active());
        assert_eq!(slot.file_name().as_deref(), Some("first.pdf"));
        assert!(!slot.drop_files(Vec::new()).expect("empty drop"));
    }
}
