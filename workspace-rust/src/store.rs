use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;
use visionprompt_sdk::{
    GeneratedImage, GenerationSettings, SettingKey, VideoSettingKey, VideoSettings,
};

use crate::{history::HistoryItem, reference, WorkspaceError, WorkspaceResult};

pub const DEFAULT_GALLERY_CAP: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    #[default]
    Image,
    Video,
}

/// Position in the generation state machine, derived from the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationPhase {
    Idle,
    PromptPending,
    PromptReady,
    ImagePending,
    ImagesReady,
    EditPending,
}

/// Identifies which gateway call a busy flag tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Prompt,
    Image,
    Edit,
}

/// Everything a workspace session shows and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationState {
    pub idea_text: String,
    pub active_mode: GenerationMode,
    pub settings: GenerationSettings,
    pub video_settings: VideoSettings,
    pub basic_prompt: String,
    pub advanced_prompt: String,
    pub generated_images: Vec<GeneratedImage>,
    /// Edit target. Always a valid index into `generated_images`.
    pub editing_image_index: Option<usize>,
    pub edit_prompt: String,
    pub reference_image: Option<String>,
    pub is_fullscreen: bool,
    pub is_generating_prompt: bool,
    pub is_generating_image: bool,
    pub is_editing_image: bool,
    /// Bumped whenever the session is replaced; results issued under an
    /// older value are discarded.
    pub session: u64,
    /// Bumped whenever `generated_images` is replaced wholesale. Appends
    /// leave it unchanged.
    pub gallery: u64,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self {
            idea_text: String::new(),
            active_mode: GenerationMode::default(),
            settings: GenerationSettings::default(),
            video_settings: VideoSettings::default(),
            basic_prompt: String::new(),
            advanced_prompt: String::new(),
            generated_images: Vec::new(),
            editing_image_index: None,
            edit_prompt: String::new(),
            reference_image: None,
            is_fullscreen: false,
            is_generating_prompt: false,
            is_generating_image: false,
            is_editing_image: false,
            session: 0,
            gallery: 0,
        }
    }
}

impl GenerationState {
    #[must_use]
    pub fn phase(&self) -> GenerationPhase {
        if self.is_editing_image {
            GenerationPhase::EditPending
        } else if self.is_generating_image {
            GenerationPhase::ImagePending
        } else if self.is_generating_prompt {
            GenerationPhase::PromptPending
        } else if !self.generated_images.is_empty() {
            GenerationPhase::ImagesReady
        } else if !self.advanced_prompt.is_empty() {
            GenerationPhase::PromptReady
        } else {
            GenerationPhase::Idle
        }
    }

    /// Whether a call of `kind` issued under the current session is pending.
    ///
    /// Replacing the session clears these flags while the discarded call may
    /// still be outstanding; [`crate::WorkspaceOrchestrator::is_busy`] reports
    /// whether a new call of `kind` would be accepted.
    #[must_use]
    pub fn is_busy(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Prompt => self.is_generating_prompt,
            OperationKind::Image => self.is_generating_image,
            OperationKind::Edit => self.is_editing_image,
        }
    }

    fn any_pending(&self) -> bool {
        self.is_generating_prompt || self.is_generating_image || self.is_editing_image
    }

    fn set_busy(&mut self, kind: OperationKind, busy: bool) {
        match kind {
            OperationKind::Prompt => self.is_generating_prompt = busy,
            OperationKind::Image => self.is_generating_image = busy,
            OperationKind::Edit => self.is_editing_image = busy,
        }
    }

    fn clear_busy(&mut self) {
        self.is_generating_prompt = false;
        self.is_generating_image = false;
        self.is_editing_image = false;
    }

    fn replace_session(&mut self) {
        self.session += 1;
        self.clear_busy();
    }

    pub(crate) fn replace_gallery(&mut self, images: Vec<GeneratedImage>) {
        self.generated_images = images;
        self.editing_image_index = None;
        self.gallery += 1;
    }
}

/// Observable state of one workspace session.
///
/// Every update is applied in a single step, so a subscriber never sees a
/// partially applied composite update. Clones share the same state.
#[derive(Clone)]
pub struct GenerationStore {
    state: Arc<watch::Sender<GenerationState>>,
    gallery_cap: usize,
}

impl Default for GenerationStore {
    fn default() -> Self {
        Self::new(DEFAULT_GALLERY_CAP)
    }
}

impl GenerationStore {
    /// A store with default state holding at most `gallery_cap` images.
    #[must_use]
    pub fn new(gallery_cap: usize) -> Self {
        Self {
            state: Arc::new(watch::Sender::new(GenerationState::default())),
            gallery_cap,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn gallery_cap(&self) -> usize {
        self.gallery_cap
    }

    #[must_use]
    pub fn phase(&self) -> GenerationPhase {
        self.state.borrow().phase()
    }

    #[must_use]
    pub fn session(&self) -> u64 {
        self.state.borrow().session
    }

    fn update(&self, f: impl FnOnce(&mut GenerationState)) {
        self.state.send_modify(f);
    }

    pub fn set_idea_text(&self, idea_text: impl Into<String>) {
        let idea_text = idea_text.into();
        self.update(|state| state.idea_text = idea_text);
    }

    /// Switch mode. Switching while a call is pending replaces the session,
    /// so that call's result is discarded when it arrives.
    pub fn set_active_mode(&self, mode: GenerationMode) {
        self.update(|state| {
            if state.active_mode == mode {
                return;
            }
            if state.any_pending() {
                debug!(?mode, "mode switched with a pending call");
                state.replace_session();
            }
            state.active_mode = mode;
        });
    }

    pub fn update_setting(&self, key: SettingKey, value: impl Into<String>) {
        let value = value.into();
        self.update(|state| state.settings.set(key, value));
    }

    pub fn update_video_setting(&self, key: VideoSettingKey, value: impl Into<String>) {
        let value = value.into();
        self.update(|state| state.video_settings.set(key, value));
    }

    pub fn set_settings(&self, settings: GenerationSettings) {
        self.update(|state| state.settings = settings);
    }

    pub fn set_advanced_prompt(&self, advanced_prompt: impl Into<String>) {
        let advanced_prompt = advanced_prompt.into();
        self.update(|state| state.advanced_prompt = advanced_prompt);
    }

    pub fn set_prompts(&self, basic: impl Into<String>, advanced: impl Into<String>) {
        let (basic, advanced) = (basic.into(), advanced.into());
        self.update(|state| {
            state.basic_prompt = basic;
            state.advanced_prompt = advanced;
        });
    }

    /// Replace the gallery wholesale. Clears the edit target.
    pub fn set_generated_images(&self, mut images: Vec<GeneratedImage>) {
        images.truncate(self.gallery_cap);
        self.update(|state| state.replace_gallery(images));
    }

    /// Append one image to the gallery, failing when it is full.
    pub fn append_generated_image(&self, image: GeneratedImage) -> WorkspaceResult<()> {
        let cap = self.gallery_cap;
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            if state.generated_images.len() >= cap {
                result = Err(WorkspaceError::GalleryFull(cap));
                return false;
            }
            state.generated_images.push(image);
            true
        });
        result
    }

    /// Select (`Some`) or clear (`None`) the image being edited.
    pub fn set_editing_image_index(&self, index: Option<usize>) -> WorkspaceResult<()> {
        let mut result = Ok(());
        self.state.send_if_modified(|state| {
            if let Some(index) = index {
                let len = state.generated_images.len();
                if index >= len {
                    result = Err(WorkspaceError::InvalidIndex { index, len });
                    return false;
                }
            }
            state.editing_image_index = index;
            true
        });
        result
    }

    pub fn set_edit_prompt(&self, edit_prompt: impl Into<String>) {
        let edit_prompt = edit_prompt.into();
        self.update(|state| state.edit_prompt = edit_prompt);
    }

    /// Attach a reference image, superseding any previous one, or clear it.
    pub fn set_reference_image(&self, data_url: Option<String>) -> WorkspaceResult<()> {
        if let Some(data_url) = &data_url {
            reference::validate_reference_image(data_url)?;
        }
        self.update(|state| state.reference_image = data_url);
        Ok(())
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.update(|state| state.is_fullscreen = fullscreen);
    }

    /// Replace the session from a history record in one update. The
    /// restored session starts with nothing pending.
    pub fn restore(&self, item: &HistoryItem) -> u64 {
        let mut images = item.images.clone();
        images.truncate(self.gallery_cap);
        let mut session = 0;
        self.update(|state| {
            state.replace_session();
            state.idea_text.clone_from(&item.idea_text);
            state.active_mode = GenerationMode::Image;
            state.settings = item.settings.clone();
            state.basic_prompt.clone_from(&item.idea_text);
            state.advanced_prompt.clone_from(&item.advanced_prompt);
            state.replace_gallery(images);
            state.edit_prompt.clear();
            session = state.session;
        });
        session
    }

    /// Mark `kind` busy and return the session the call is issued under.
    pub(crate) fn begin(&self, kind: OperationKind) -> u64 {
        let mut session = 0;
        self.update(|state| {
            state.set_busy(kind, true);
            session = state.session;
        });
        session
    }

    /// Apply `f` and clear `kind`'s busy flag, only if `session` is still
    /// current. Returns whether it was applied.
    pub(crate) fn complete_if_current<R>(
        &self,
        session: u64,
        kind: OperationKind,
        f: impl FnOnce(&mut GenerationState) -> R,
    ) -> Option<R> {
        let mut output = None;
        self.state.send_if_modified(|state| {
            if state.session != session {
                return false;
            }
            state.set_busy(kind, false);
            output = Some(f(state));
            true
        });
        output
    }

    /// Clear `kind`'s busy flag for a call that ended without completing.
    pub(crate) fn abandon(&self, session: u64, kind: OperationKind) {
        self.state.send_if_modified(|state| {
            if state.session != session || !state.is_busy(kind) {
                return false;
            }
            state.set_busy(kind, false);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn images(n: usize) -> Vec<GeneratedImage> {
        (0..n)
            .map(|i| GeneratedImage::new(format!("https://cdn.example.com/{i}.png"), "prompt"))
            .collect()
    }

    #[test]
    fn defaults_are_populated() {
        let state = GenerationStore::default().snapshot();
        assert_eq!(state.settings, GenerationSettings::default());
        assert_eq!(state.video_settings, VideoSettings::default());
        assert_eq!(state.active_mode, GenerationMode::Image);
        assert_eq!(state.phase(), GenerationPhase::Idle);
    }

    #[test]
    fn replacing_images_clears_edit_target() {
        let store = GenerationStore::default();
        store.set_generated_images(images(2));
        store.set_editing_image_index(Some(1)).unwrap();
        store.set_generated_images(images(1));
        assert_eq!(store.snapshot().editing_image_index, None);
    }

    #[test]
    fn only_wholesale_replacement_bumps_gallery() {
        let store = GenerationStore::default();
        store.set_generated_images(images(1));
        let replaced = store.snapshot().gallery;
        assert_eq!(replaced, 1);

        store
            .append_generated_image(GeneratedImage::new("https://cdn.example.com/e.png", "edit"))
            .unwrap();
        assert_eq!(store.snapshot().gallery, replaced);

        store.restore(&HistoryItem::from_generation(
            "1",
            "idea",
            GenerationSettings::default(),
            "prompt",
            &["https://cdn.example.com/r.png".to_string()],
            1,
        ));
        assert_eq!(store.snapshot().gallery, replaced + 1);
    }

    #[test]
    fn editing_index_must_be_in_range() {
        let store = GenerationStore::default();
        store.set_generated_images(images(2));
        assert!(matches!(
            store.set_editing_image_index(Some(2)),
            Err(WorkspaceError::InvalidIndex { index: 2, len: 2 })
        ));
        assert_eq!(store.snapshot().editing_image_index, None);
    }

    #[test]
    fn append_respects_gallery_cap() {
        let store = GenerationStore::new(2);
        store.set_generated_images(images(3));
        assert_eq!(store.snapshot().generated_images.len(), 2);
        assert!(matches!(
            store.append_generated_image(GeneratedImage::new("u", "p")),
            Err(WorkspaceError::GalleryFull(2))
        ));
    }

    #[test]
    fn phase_follows_state() {
        let store = GenerationStore::default();
        store.set_prompts("idea", "engineered");
        assert_eq!(store.phase(), GenerationPhase::PromptReady);
        store.begin(OperationKind::Image);
        assert_eq!(store.phase(), GenerationPhase::ImagePending);
        let session = store.session();
        store.complete_if_current(session, OperationKind::Image, |state| {
            state.generated_images = images(2);
        });
        assert_eq!(store.phase(), GenerationPhase::ImagesReady);
    }

    #[test]
    fn mode_switch_while_pending_replaces_session() {
        let store = GenerationStore::default();
        let issued = store.begin(OperationKind::Prompt);
        store.set_active_mode(GenerationMode::Video);

        let state = store.snapshot();
        assert_ne!(state.session, issued);
        assert!(!state.is_generating_prompt);
        assert!(store
            .complete_if_current(issued, OperationKind::Prompt, |_| ())
            .is_none());
    }

    #[test]
    fn mode_switch_while_idle_keeps_session() {
        let store = GenerationStore::default();
        store.set_active_mode(GenerationMode::Video);
        assert_eq!(store.session(), 0);
    }

    #[test]
    fn invalid_reference_image_is_rejected() {
        let store = GenerationStore::default();
        assert!(store
            .set_reference_image(Some("https://cdn.example.com/cat.png".to_string()))
            .is_err());
        assert_eq!(store.snapshot().reference_image, None);
        store
            .set_reference_image(Some("data:image/png;base64,iVBORw0KGgo=".to_string()))
            .unwrap();
        store.set_reference_image(None).unwrap();
        assert_eq!(store.snapshot().reference_image, None);
    }
}
