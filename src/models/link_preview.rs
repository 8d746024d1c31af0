use serde::{Deserialize, Serialize};

/// Metadata extracted from an origin page.
///
/// Keys match the format already stored in the cache, so entries written by
/// earlier deployments stay readable. Unset fields are omitted on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewMetadata {
    #[serde(rename = "custom-description", default, skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    #[serde(rename = "custom-image", default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    #[serde(rename = "og:image", default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(rename = "og:video:url", default, skip_serializing_if = "Option::is_none")]
    pub og_video_url: Option<String>,
    #[serde(rename = "twitter_player", default, skip_serializing_if = "Option::is_none")]
    pub twitter_player: Option<String>,
    #[serde(rename = "embedURL", default, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(rename = "metaDescription", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl PreviewMetadata {
    /// Returns `true` if no field has been extracted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of a batch response, keyed by the requested URL.
///
/// `found` is `true` after a cache hit or a successful origin fetch. A record
/// with `found == false` carries no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRecord {
    pub url: String,
    #[serde(default)]
    pub found: bool,
    #[serde(flatten)]
    pub metadata: PreviewMetadata,
}

impl PreviewRecord {
    /// An unresolved record for `url`.
    pub fn missing(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            found: false,
            metadata: PreviewMetadata::default(),
        }
    }

    /// Mark the record as resolved with the given metadata.
    pub fn resolve(&mut self, metadata: PreviewMetadata) {
        self.found = true;
        self.metadata = metadata;
    }
}
