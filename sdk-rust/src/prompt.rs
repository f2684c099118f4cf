//! Deterministic text composition shared by every gateway implementation.

use crate::{GenerationSettings, VideoSettings};

/// Separator placed between a prompt and an edit instruction appended to it.
pub const EDIT_SEPARATOR: &str = " [EDIT]: ";

pub const IMAGE_SYSTEM_PROMPT: &str = "You are an expert AI prompt engineer specializing in \
extremely high-quality, professional image generation.

Your goal is to take a user's core idea, a set of visual settings, and optionally a reference \
image, and craft a single, masterfully engineered prompt string that an image generation AI will \
use to create stunning visuals. Use the reference image (if provided) to heavily inspire the \
colors, composition, and subject matter of the prompt, while still applying the exact settings \
the user requested.

CRITICAL RULES:
1. ONLY return the final prompt string. Do not include introductory text or explanations.
2. Structure the prompt as: [Subject/Action/Reference Inspiration] + [Setting/Context] + \
[Camera/Lighting Details] + [Style/Mood] + [Quality Enhancers] + [Aspect Ratio constraint].
3. Weave the provided settings into the prompt naturally.
4. Use highly descriptive, evocative language and precise photography terms.
5. End the prompt with the exact aspect ratio tag requested (e.g. \"--ar 16:9\").
6. The output should be a comma-separated list of highly descriptive phrases.";

pub const VIDEO_SYSTEM_PROMPT: &str = "You are an award-winning cinematic AI video prompt \
engineer. Translate the user's core idea and settings into a production-ready prompt for \
text-to-video models.

Follow this structure:
1. [SUBJECT]: the main focus, with specific physical traits and textures.
2. [ACTION & BACKGROUND MOTION]: movement of subject, foreground and background.
3. [ENVIRONMENT & SETTING]: the surrounding world, weather, atmosphere and time of day.
4. [CAMERA & LENS]: camera movement, shot type, focal length and equipment.
5. [LIGHTING]: the lighting setup, shadows and mood.
6. [FORMAT & HIGH-END TAGS]: the final aesthetic polish.

CRITICAL RULES:
1. ONLY return the final prompt string as a single paragraph. No Markdown.
2. Incorporate every selected setting exactly.
3. Paint a moving, dynamic picture instead of a static one.";

pub const SYNTHETIC_NEGATIVE_PROMPT: &str = "ugly, blurry, deformed, low quality, poorly drawn";
pub const UPSTREAM_NEGATIVE_PROMPT: &str = "low quality, bad anatomy, worst quality";

/// Trailing directive carrying the aspect ratio, e.g. `--ar 16:9`.
#[must_use]
pub fn aspect_ratio_tag(aspect_ratio: &str) -> String {
    format!("--ar {}", aspect_ratio.trim())
}

/// Append the aspect ratio directive to a prompt. The upstream image model has
/// no structured size parameter so the ratio travels in the text.
#[must_use]
pub fn with_aspect_ratio(prompt: &str, aspect_ratio: &str) -> String {
    format!("{} {}", prompt.trim_end(), aspect_ratio_tag(aspect_ratio))
}

/// Prompt lineage for an edit: the previous prompt, the separator, then the
/// raw edit instruction. Without a previous prompt the instruction stands alone.
#[must_use]
pub fn combine_edit_prompt(original_prompt: Option<&str>, edit_prompt: &str) -> String {
    match original_prompt.filter(|prompt| !prompt.is_empty()) {
        Some(original) => format!("{original}{EDIT_SEPARATOR}{edit_prompt}"),
        None => edit_prompt.to_string(),
    }
}

/// Structured instruction sent to the text model. Categories always appear in
/// the same order and the aspect ratio tag is last.
#[must_use]
pub fn compose_image_instruction(idea_text: &str, settings: &GenerationSettings) -> String {
    format!(
        "Core idea: {idea}

Settings to incorporate:
- Environment: {environment}
- Camera Angle: {camera}
- Lens/Focal Length: {lens}
- Depth of Field: {depth}
- Lighting: {lighting}
- Style: {style}
- Mood/Tone: {mood}
- Color Palette: {color}
- Quality/Resolution: {quality}
- Aspect Ratio: {ar_tag}

Generate the final, highly detailed optimized image prompt string now.",
        idea = idea_text.trim(),
        environment = settings.environment,
        camera = settings.camera,
        lens = settings.lens,
        depth = settings.depth,
        lighting = settings.lighting,
        style = settings.style,
        mood = settings.mood,
        color = settings.color,
        quality = settings.quality,
        ar_tag = aspect_ratio_tag(&settings.aspect_ratio),
    )
}

#[must_use]
pub fn compose_video_instruction(idea_text: &str, settings: &VideoSettings) -> String {
    format!(
        "Core idea: {idea}

Settings to incorporate:
- Camera Movement: {camera}
- Shot Type: {shot_type}
- Motion Speed: {motion_speed}
- Lighting: {lighting}
- Mood/Style: {mood}
- Duration: {duration}
- Quality: {quality}

Generate the final, highly detailed optimized video prompt string now.",
        idea = idea_text.trim(),
        camera = settings.camera,
        shot_type = settings.shot_type,
        motion_speed = settings.motion_speed,
        lighting = settings.lighting,
        mood = settings.mood,
        duration = settings.duration,
        quality = settings.quality,
    )
}

/// Advanced prompt produced without a model. Contains every settings value.
#[must_use]
pub fn synthetic_image_prompt(idea_text: &str, settings: &GenerationSettings) -> String {
    let prompt = format!(
        "{idea}, Environment: {environment}, Camera: {camera}, Lens: {lens}, Depth: {depth}, \
         Lighting: {lighting}, Style: {style}, Mood: {mood}, Color: {color}, Quality: {quality}. \
         Highly detailed, masterpiece, stunning visual, 8k resolution.",
        idea = idea_text.trim(),
        environment = settings.environment,
        camera = settings.camera,
        lens = settings.lens,
        depth = settings.depth,
        lighting = settings.lighting,
        style = settings.style,
        mood = settings.mood,
        color = settings.color,
        quality = settings.quality,
    );
    with_aspect_ratio(&prompt, &settings.aspect_ratio)
}

#[must_use]
pub fn synthetic_video_prompt(idea_text: &str, settings: &VideoSettings) -> String {
    format!(
        "A {shot_type} of {idea}, captured with a {camera}. The scene features {lighting} and \
         a {mood} atmosphere. Motion speed: {motion_speed}. Duration: {duration}. {quality}.",
        shot_type = settings.shot_type,
        idea = idea_text.trim(),
        camera = settings.camera,
        lighting = settings.lighting,
        mood = settings.mood,
        motion_speed = settings.motion_speed,
        duration = settings.duration,
        quality = settings.quality,
    )
}
