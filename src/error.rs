use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while editing or exporting a composition.
///
/// None of these are fatal: the workspace turns each one into a modal notice
/// and leaves the editor state as it was before the failing operation.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("could not open image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The crop rectangle does not overlap the chat image.
    #[error("the selected area is too small to crop")]
    SelectionTooSmall,

    #[error("no chat image is loaded")]
    NoChatImage,

    #[error("memory is full ({limit}/{limit}); export the stored images first")]
    MemoryFull { limit: usize },

    #[error("there are no images in memory to export")]
    MemoryEmpty,

    #[error("canvas width and height must be whole numbers from 1 to 10000 (got {width:?} x {height:?})")]
    InvalidCanvasSize { width: String, height: String },

    #[error("cannot export {requested} images, memory holds {available}")]
    InvalidExportCount { requested: usize, available: usize },

    #[error("stacking {count} images of height {height} is too tall to export")]
    SheetTooLarge { count: usize, height: u32 },
}

impl EditorError {
    /// Informational conditions are shown as notices rather than errors.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            EditorError::SelectionTooSmall | EditorError::MemoryFull { .. } | EditorError::MemoryEmpty
        )
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn informational_errors() {
        assert!(EditorError::SelectionTooSmall.is_informational());
        assert!(EditorError::MemoryFull { limit: 5 }.is_informational());
        assert!(EditorError::MemoryEmpty.is_informational());
        assert!(!EditorError::NoChatImage.is_informational());
        let e = EditorError::InvalidCanvasSize { width: "a".into(), height: "0".into() };
        assert!(!e.is_informational());
        assert!(e.to_string().contains("from 1 to 10000"));
    }

    #[test]
    fn memory_full_message_mentions_limit() {
        assert_eq!(
            EditorError::MemoryFull { limit: 5 }.to_string(),
            "memory is full (5/5); export the stored images first"
        );
    }
}
