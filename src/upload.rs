#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{path::Path, sync::Arc};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{error::SelectionError, locale::Locale};

/// An answer sheet chosen by the user: raw bytes plus the declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Display name, usually the file name.
    name:       String,
    /// Declared media type, e.g. `image/jpeg`.
    media_type: String,
    /// File contents, shared so attempts can move a copy into a task.
    bytes:      Arc<[u8]>,
}

impl SelectedFile {
    /// Wraps raw bytes with a declared media type.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name:       name.into(),
            media_type: media_type.into(),
            bytes:      Arc::from(bytes.into()),
        }
    }

    /// Reads a file from disk, inferring the declared type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SelectionError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, media_type_for_path(path), bytes))
    }

    /// Decodes a `data:<type>;base64,<payload>` URL.
    pub fn from_data_url(name: impl Into<String>, url: &str) -> Result<Self, SelectionError> {
        let header = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .map(|(header, _)| header)
            .ok_or_else(|| SelectionError::InvalidDataUrl("missing `data:` header".into()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| SelectionError::InvalidDataUrl("payload is not base64".into()))?;
        let bytes = STANDARD
            .decode(strip_data_url_prefix(url))
            .map_err(|e| SelectionError::InvalidDataUrl(e.to_string()))?;

        Ok(Self::new(name, media_type, bytes))
    }

    /// Display name of the file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the declared type is an image type.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Base64 payload without any data-URL header.
    pub fn base64_payload(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Display-ready `data:` URL.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64_payload())
    }
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Strips a `data:...,` header, returning only the payload. Strings without
/// a header are returned unchanged.
pub fn strip_data_url_prefix(value: &str) -> &str {
    match value.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, payload)| payload).unwrap_or(""),
        None => value,
    }
}

/// Declared media type for a path, based on its extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Input events the selector reacts to.
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    /// A file chosen through the picker.
    Picked(SelectedFile),
    /// A file dropped onto the drop zone.
    Dropped(SelectedFile),
    /// Something is being dragged over the drop zone.
    DragOver,
}

/// What happened in response to a [`SelectionEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The file replaced the previous selection and is handed to the caller.
    Selected(SelectedFile),
    /// The selector is disabled and the event was dropped.
    Ignored,
    /// Drag-over; the default navigation behaviour must not run.
    DefaultSuppressed,
}

/// Holds at most one selected image and its cached preview.
#[derive(Debug, Default)]
pub struct FileSelector {
    /// Current selection.
    selected: Option<SelectedFile>,
    /// Cached `data:` URL for the current selection.
    preview:  Option<String>,
    /// Whether picks and drops are currently refused.
    disabled: bool,
    /// Language for the rejection warning.
    locale:   Locale,
}

impl FileSelector {
    /// Creates an empty, enabled selector.
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    /// Handles a picker, drop or drag-over event.
    pub fn select(&mut self, event: SelectionEvent) -> Result<SelectionOutcome, SelectionError> {
        let file = match event {
            SelectionEvent::DragOver => return Ok(SelectionOutcome::DefaultSuppressed),
            SelectionEvent::Picked(_) | SelectionEvent::Dropped(_) if self.disabled => {
                tracing::debug!("Selector is disabled, ignoring file");
                return Ok(SelectionOutcome::Ignored);
            }
            SelectionEvent::Picked(file) | SelectionEvent::Dropped(file) => file,
        };

        if !file.is_image() {
            tracing::warn!(
                "{} ({}: {})",
                self.locale.images_only(),
                file.name(),
                file.media_type()
            );
            return Err(SelectionError::UnsupportedMediaType(file.media_type().to_string()));
        }

        tracing::info!(
            "Selected {} ({}, {} bytes)",
            file.name(),
            file.media_type(),
            file.bytes().len()
        );
        self.preview = None;
        self.selected = Some(file.clone());
        Ok(SelectionOutcome::Selected(file))
    }

    /// Decodes the current selection into a `data:` URL off the async
    /// executor, caching it until the selection changes.
    pub async fn load_preview(&mut self) -> Option<&str> {
        if self.preview.is_none() {
            let file = self.selected.clone()?;
            match tokio::task::spawn_blocking(move || file.data_url()).await {
                Ok(url) => self.preview = Some(url),
                Err(e) => {
                    tracing::warn!("Could not build preview: {e}");
                    return None;
                }
            }
        }
        self.preview.as_deref()
    }

    /// The cached preview, if one has been loaded.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// The current selection.
    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    /// Drops the selection and its preview.
    pub fn clear(&mut self) {
        self.selected = None;
        self.preview = None;
    }

    /// Enables or disables picks and drops.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether picks and drops are refused.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_the_header() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    }

    #[test]
    fn data_url_round_trips_through_the_selector_type() {
        let file = SelectedFile::new("a.png", "image/png", vec![1u8, 2, 3]);
        let back = SelectedFile::from_data_url("a.png", &file.data_url()).expect("decode");
        assert_eq!(back, file);
    }

    #[test]
    fn media_types_follow_extensions() {
        assert_eq!(media_type_for_path(Path::new("sheet.JPG")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("sheet.pdf")), "application/pdf");
        assert_eq!(media_type_for_path(Path::new("sheet")), "application/octet-stream");
    }

    #[test]
    fn drag_over_never_touches_state() {
        let mut selector = FileSelector::new(Locale::English);
        selector.set_disabled(true);
        let outcome = selector.select(SelectionEvent::DragOver).expect("drag over");
        assert_eq!(outcome, SelectionOutcome::DefaultSuppressed);
        assert!(selector.selected().is_none());
    }

    #[test]
    fn picks_are_ignored_while_disabled() {
        let mut selector = FileSelector::new(Locale::English);
        selector.set_disabled(true);
        let file = SelectedFile::new("a.png", "image/png", vec![0u8]);
        let outcome = selector.select(SelectionEvent::Picked(file)).expect("pick");
        assert_eq!(outcome, SelectionOutcome::Ignored);
        assert!(selector.selected().is_none());
    }

    #[tokio::test]
    async fn reads_files_from_disk() {
        let path = std::env::temp_dir().join(format!("inkgrade-{}.PNG", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, [0x89u8, 0x50, 0x4E, 0x47])
            .await
            .expect("write fixture");

        let file = SelectedFile::from_path(&path).await.expect("read");
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(file.media_type(), "image/png");
        assert_eq!(file.bytes(), &[0x89, 0x50, 0x4E, 0x47]);
        assert!(file.name().starts_with("inkgrade-"));
        assert!(file.is_image());
    }

    #[tokio::test]
    async fn missing_files_report_their_path() {
        let path = std::env::temp_dir()
            .join(format!("inkgrade-missing-{}.jpg", uuid::Uuid::new_v4()));

        let err = SelectedFile::from_path(&path).await.unwrap_err();

        match err {
            SelectionError::Io { path: reported, .. } => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn drops_are_ignored_while_disabled() {
        let mut selector = FileSelector::new(Locale::English);
        selector.set_disabled(true);
        let file = SelectedFile::new("a.png", "image/png", vec![0u8]);
        let outcome = selector.select(SelectionEvent::Dropped(file)).expect("drop");
        assert_eq!(outcome, SelectionOutcome::Ignored);
        assert!(selector.selected().is_none());
    }
}
