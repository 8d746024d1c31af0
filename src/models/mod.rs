mod link_preview;

pub use link_preview::{PreviewMetadata, PreviewRecord};
