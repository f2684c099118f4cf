use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{GatewayError, GatewayResult};

/// Visual settings interpolated into an engineered image prompt.
///
/// Every field is a free-form string. The option lists returned by
/// [`SettingKey::suggested_options`] are suggestions for a settings panel
/// and are not enforced anywhere. Missing fields deserialize to their default
/// so an instance always has a value for every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    pub style: String,
    pub lighting: String,
    pub camera: String,
    pub lens: String,
    pub depth: String,
    pub mood: String,
    pub quality: String,
    pub color: String,
    pub environment: String,
    pub aspect_ratio: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            style: "Photorealistic".to_string(),
            lighting: "Cinematic Lighting".to_string(),
            camera: "Drone View".to_string(),
            lens: "35mm".to_string(),
            depth: "Shallow Depth of Field".to_string(),
            mood: "Epic".to_string(),
            quality: "8k, Masterpiece".to_string(),
            color: "Vibrant".to_string(),
            environment: "Auto (AI Decide)".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

impl GenerationSettings {
    #[must_use]
    pub fn get(&self, key: SettingKey) -> &str {
        match key {
            SettingKey::Style => &self.style,
            SettingKey::Lighting => &self.lighting,
            SettingKey::Camera => &self.camera,
            SettingKey::Lens => &self.lens,
            SettingKey::Depth => &self.depth,
            SettingKey::Mood => &self.mood,
            SettingKey::Quality => &self.quality,
            SettingKey::Color => &self.color,
            SettingKey::Environment => &self.environment,
            SettingKey::AspectRatio => &self.aspect_ratio,
        }
    }

    pub fn set(&mut self, key: SettingKey, value: impl Into<String>) {
        let slot = match key {
            SettingKey::Style => &mut self.style,
            SettingKey::Lighting => &mut self.lighting,
            SettingKey::Camera => &mut self.camera,
            SettingKey::Lens => &mut self.lens,
            SettingKey::Depth => &mut self.depth,
            SettingKey::Mood => &mut self.mood,
            SettingKey::Quality => &mut self.quality,
            SettingKey::Color => &mut self.color,
            SettingKey::Environment => &mut self.environment,
            SettingKey::AspectRatio => &mut self.aspect_ratio,
        };
        *slot = value.into();
    }
}

/// Names a single field of [`GenerationSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    Style,
    Lighting,
    Camera,
    Lens,
    Depth,
    Mood,
    Quality,
    Color,
    Environment,
    AspectRatio,
}

impl SettingKey {
    pub const ALL: [Self; 10] = [
        Self::Style,
        Self::Lighting,
        Self::Camera,
        Self::Lens,
        Self::Depth,
        Self::Mood,
        Self::Quality,
        Self::Color,
        Self::Environment,
        Self::AspectRatio,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Style => "Style",
            Self::Lighting => "Lighting",
            Self::Camera => "Camera Angle",
            Self::Lens => "Lens",
            Self::Depth => "Depth of Field",
            Self::Mood => "Mood",
            Self::Quality => "Quality",
            Self::Color => "Color Tone",
            Self::Environment => "Environment",
            Self::AspectRatio => "Aspect Ratio",
        }
    }

    #[must_use]
    pub fn suggested_options(self) -> &'static [&'static str] {
        match self {
            Self::Style => &[
                "Photorealistic",
                "Anime",
                "Cyberpunk",
                "Oil Painting",
                "3D Render",
                "Pixel Art",
                "Cinematic",
                "Minimalist",
            ],
            Self::Lighting => &[
                "Cinematic Lighting",
                "Natural Light",
                "Neon",
                "Volumetric",
                "Studio Lighting",
                "Golden Hour",
                "Moody",
            ],
            Self::Camera => &[
                "Eye-Level",
                "Low Angle",
                "High Angle",
                "Drone View",
                "Ultra-Wide",
                "Macro",
                "Dutch Angle",
            ],
            Self::Lens => &[
                "14mm (Ultra Wide)",
                "35mm (Standard)",
                "50mm (Portrait)",
                "85mm (Telephoto)",
                "Fisheye",
            ],
            Self::Depth => &[
                "Shallow Depth of Field",
                "Deep Focus",
                "Bokeh",
                "Blurred Background",
            ],
            Self::Mood => &[
                "Epic",
                "Dark",
                "Joyful",
                "Mysterious",
                "Ethereal",
                "Melancholic",
                "Serene",
            ],
            Self::Quality => &[
                "8k, Masterpiece",
                "Highly Detailed",
                "Award Winning",
                "Raw Photo",
                "Crisp",
            ],
            Self::Color => &[
                "Vibrant",
                "Desaturated",
                "Monochrome",
                "Pastel",
                "High Contrast",
                "Sepia",
            ],
            Self::Environment => &[
                "Auto (AI Decide)",
                "Sci-Fi Cityscape",
                "Lush Forest",
                "Interior",
                "Space Station",
                "Desert",
                "Underwater",
                "Studio",
            ],
            Self::AspectRatio => &["1:1", "16:9", "9:16", "4:3", "3:4", "21:9"],
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settings for video prompts. The field set does not overlap with
/// [`GenerationSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSettings {
    pub camera: String,
    pub shot_type: String,
    pub motion_speed: String,
    pub lighting: String,
    pub mood: String,
    pub duration: String,
    pub quality: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            camera: "Smooth Pan".to_string(),
            shot_type: "Establishing Shot".to_string(),
            motion_speed: "Normal".to_string(),
            lighting: "Cinematic Lighting".to_string(),
            mood: "Epic".to_string(),
            duration: "5 Seconds".to_string(),
            quality: "8k, Masterpiece".to_string(),
        }
    }
}

impl VideoSettings {
    #[must_use]
    pub fn get(&self, key: VideoSettingKey) -> &str {
        match key {
            VideoSettingKey::Camera => &self.camera,
            VideoSettingKey::ShotType => &self.shot_type,
            VideoSettingKey::MotionSpeed => &self.motion_speed,
            VideoSettingKey::Lighting => &self.lighting,
            VideoSettingKey::Mood => &self.mood,
            VideoSettingKey::Duration => &self.duration,
            VideoSettingKey::Quality => &self.quality,
        }
    }

    pub fn set(&mut self, key: VideoSettingKey, value: impl Into<String>) {
        let slot = match key {
            VideoSettingKey::Camera => &mut self.camera,
            VideoSettingKey::ShotType => &mut self.shot_type,
            VideoSettingKey::MotionSpeed => &mut self.motion_speed,
            VideoSettingKey::Lighting => &mut self.lighting,
            VideoSettingKey::Mood => &mut self.mood,
            VideoSettingKey::Duration => &mut self.duration,
            VideoSettingKey::Quality => &mut self.quality,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum VideoSettingKey {
    Camera,
    ShotType,
    MotionSpeed,
    Lighting,
    Mood,
    Duration,
    Quality,
}

impl VideoSettingKey {
    pub const ALL: [Self; 7] = [
        Self::Camera,
        Self::ShotType,
        Self::MotionSpeed,
        Self::Lighting,
        Self::Mood,
        Self::Duration,
        Self::Quality,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera Movement",
            Self::ShotType => "Shot Type",
            Self::MotionSpeed => "Motion Speed",
            Self::Lighting => "Lighting",
            Self::Mood => "Mood/Style",
            Self::Duration => "Duration",
            Self::Quality => "Quality",
        }
    }
}

/// A rendered artifact and the exact prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GeneratedImage {
    pub url: String,
    pub prompt: String,
}

impl GeneratedImage {
    pub fn new(url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prompt: prompt.into(),
        }
    }
}

/// Body of a prompt engineering request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EngineerPromptRequest {
    #[serde(default)]
    pub idea_text: String,
    #[serde(default)]
    pub settings: GenerationSettings,
    /// Base64 data URL of an image used to steer the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
}

impl EngineerPromptRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.idea_text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Idea text is required".to_string(),
            ));
        }
        Ok(())
    }

    /// The reference image, if one was supplied and is not blank.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference_image
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EngineeredPrompt {
    pub basic_prompt: String,
    pub advanced_prompt: String,
    pub negative_prompt: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EngineerVideoPromptRequest {
    #[serde(default)]
    pub idea_text: String,
    #[serde(default)]
    pub video_settings: VideoSettings,
}

impl EngineerVideoPromptRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.idea_text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Idea text is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct VideoPrompt {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

impl GenerateImageRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("Prompt is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct GeneratedImages {
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EditImageRequest {
    /// URL of the image being edited.
    #[serde(default)]
    pub image: String,
    /// The user's raw edit instruction.
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Prompt that produced `image`. The edited prompt extends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_prompt: Option<String>,
}

impl EditImageRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        if self.image.trim().is_empty() || self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Image and edit prompt are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EditedImage {
    pub images: Vec<String>,
    pub new_prompt: String,
}

fn default_aspect_ratio() -> String {
    GenerationSettings::default().aspect_ratio
}
