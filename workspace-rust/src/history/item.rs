use serde::{Deserialize, Serialize};
use visionprompt_sdk::{GeneratedImage, GenerationSettings};

/// A persisted record of one completed image generation.
///
/// Local items carry a timestamp-derived id and cloud items a
/// backend-assigned document id. The two id spaces are unrelated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredHistoryItem")]
pub struct HistoryItem {
    pub id: String,
    pub idea_text: String,
    pub settings: GenerationSettings,
    pub advanced_prompt: String,
    pub images: Vec<GeneratedImage>,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl HistoryItem {
    /// Build a record for a generation that produced `urls` from
    /// `advanced_prompt`.
    #[must_use]
    pub fn from_generation(
        id: impl Into<String>,
        idea_text: impl Into<String>,
        settings: GenerationSettings,
        advanced_prompt: impl Into<String>,
        urls: &[String],
        created_at: i64,
    ) -> Self {
        let advanced_prompt = advanced_prompt.into();
        Self {
            id: id.into(),
            idea_text: idea_text.into(),
            settings,
            images: urls
                .iter()
                .map(|url| GeneratedImage::new(url.clone(), advanced_prompt.clone()))
                .collect(),
            advanced_prompt,
            created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredImage {
    Full(GeneratedImage),
    /// Older records kept only the URL.
    Legacy(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHistoryItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    idea_text: String,
    #[serde(default)]
    settings: GenerationSettings,
    #[serde(default)]
    advanced_prompt: String,
    #[serde(default)]
    images: Vec<StoredImage>,
    #[serde(default)]
    created_at: i64,
}

impl From<StoredHistoryItem> for HistoryItem {
    fn from(stored: StoredHistoryItem) -> Self {
        let images = stored
            .images
            .into_iter()
            .map(|image| match image {
                StoredImage::Full(image) => image,
                StoredImage::Legacy(url) => GeneratedImage::new(url, stored.advanced_prompt.clone()),
            })
            .collect();

        Self {
            id: stored.id,
            idea_text: stored.idea_text,
            settings: stored.settings,
            advanced_prompt: stored.advanced_prompt,
            images,
            created_at: stored.created_at,
        }
    }
}
