use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use serde::Serialize;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};
use visionprompt_sdk::{
    EditImageRequest, EngineerPromptRequest, EngineerVideoPromptRequest, GatewayError,
    GenerateImageRequest, GeneratedImage, GenerationGateway,
};

use crate::{
    history::{HistoryItem, HistorySynchronizer},
    store::{GenerationMode, GenerationStore, OperationKind},
    PersistenceError, WorkspaceError, WorkspaceOptions, WorkspaceResult,
};

/// What a triggering action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The result was committed to the store.
    Applied,
    /// A call of the same kind is already in flight. Nothing was issued.
    Busy,
    /// Preconditions are not met (empty idea, no prompt, no edit target).
    NotReady,
    /// The session or, for an edit, the gallery was replaced while the call
    /// was in flight; its result was discarded.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// User-facing notification raised by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

type CloudWrite = JoinHandle<Result<String, PersistenceError>>;

/// Drives the generation state machine for one session: issues gateway
/// calls for user actions, commits results to the store and persists
/// completed generations.
pub struct WorkspaceOrchestrator {
    gateway: Arc<dyn GenerationGateway>,
    store: GenerationStore,
    history: Arc<HistorySynchronizer>,
    in_flight: [AtomicBool; 3],
    notices: broadcast::Sender<Notice>,
    cloud_writes: Mutex<Vec<CloudWrite>>,
}

/// Held for the lifetime of one gateway call. Releases the in-flight slot
/// and, if the call never completed, the store's busy flag.
struct Flight<'a> {
    slot: &'a AtomicBool,
    store: &'a GenerationStore,
    kind: OperationKind,
    session: Option<u64>,
}

impl Flight<'_> {
    fn begin(&mut self) -> u64 {
        let session = self.store.begin(self.kind);
        self.session = Some(session);
        session
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session {
            self.store.abandon(session, self.kind);
        }
        self.slot.store(false, Ordering::Release);
    }
}

impl WorkspaceOrchestrator {
    pub fn new(
        gateway: Arc<dyn GenerationGateway>,
        options: &WorkspaceOptions,
    ) -> WorkspaceResult<Self> {
        let history = Arc::new(options.build_history()?);
        Ok(Self::with_parts(
            gateway,
            GenerationStore::new(options.gallery_cap),
            history,
        ))
    }

    #[must_use]
    pub fn with_parts(
        gateway: Arc<dyn GenerationGateway>,
        store: GenerationStore,
        history: Arc<HistorySynchronizer>,
    ) -> Self {
        let (notices, _) = broadcast::channel(32);
        Self {
            gateway,
            store,
            history,
            in_flight: [AtomicBool::new(false), AtomicBool::new(false), AtomicBool::new(false)],
            notices,
            cloud_writes: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &GenerationStore {
        &self.store
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistorySynchronizer> {
        self.history.clone()
    }

    #[must_use]
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let _ = self.notices.send(Notice {
            level,
            message: message.into(),
        });
    }

    fn slot(&self, kind: OperationKind) -> &AtomicBool {
        match kind {
            OperationKind::Prompt => &self.in_flight[0],
            OperationKind::Image => &self.in_flight[1],
            OperationKind::Edit => &self.in_flight[2],
        }
    }

    /// Whether a call of `kind` is outstanding, including one whose result
    /// will be discarded. While this is true the action returns
    /// [`ActionOutcome::Busy`].
    #[must_use]
    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.slot(kind).load(Ordering::Acquire)
    }

    fn try_fly(&self, kind: OperationKind) -> Option<Flight<'_>> {
        let slot = self.slot(kind);
        slot.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()?;
        Some(Flight {
            slot,
            store: &self.store,
            kind,
            session: None,
        })
    }

    fn fail(
        &self,
        session: u64,
        kind: OperationKind,
        message: &str,
        error: WorkspaceError,
    ) -> WorkspaceResult<ActionOutcome> {
        if self
            .store
            .complete_if_current(session, kind, |_| ())
            .is_none()
        {
            debug!(?kind, %error, "discarding failure from a replaced session");
            return Ok(ActionOutcome::Stale);
        }
        warn!(?kind, %error, "generation action failed");
        self.notify(NoticeLevel::Error, message);
        Err(error)
    }

    /// Engineer a prompt from the current idea, using the image or video
    /// operation for the active mode.
    pub async fn engineer_prompt(&self) -> WorkspaceResult<ActionOutcome> {
        let kind = OperationKind::Prompt;
        let Some(mut flight) = self.try_fly(kind) else {
            return Ok(ActionOutcome::Busy);
        };
        let state = self.store.snapshot();
        if state.idea_text.trim().is_empty() {
            return Ok(ActionOutcome::NotReady);
        }
        let session = flight.begin();

        let result = match state.active_mode {
            GenerationMode::Image => self
                .gateway
                .engineer_prompt(EngineerPromptRequest {
                    idea_text: state.idea_text.clone(),
                    settings: state.settings.clone(),
                    reference_image: state.reference_image.clone(),
                })
                .await
                .map(|prompt| (prompt.basic_prompt, prompt.advanced_prompt)),
            GenerationMode::Video => self
                .gateway
                .engineer_video_prompt(EngineerVideoPromptRequest {
                    idea_text: state.idea_text.clone(),
                    video_settings: state.video_settings.clone(),
                })
                .await
                .map(|video| (state.idea_text.clone(), video.prompt)),
        };

        let (basic, advanced) = match result {
            Ok(prompts) => prompts,
            Err(error) => {
                let message = match state.active_mode {
                    GenerationMode::Image => "Failed to generate prompt. Please try again.",
                    GenerationMode::Video => "Failed to generate video prompt. Please try again.",
                };
                return self.fail(session, kind, message, error.into());
            }
        };

        let applied = self.store.complete_if_current(session, kind, |state| {
            state.basic_prompt = basic;
            state.advanced_prompt = advanced;
        });
        if applied.is_none() {
            debug!("discarding engineered prompt from a replaced session");
            return Ok(ActionOutcome::Stale);
        }
        self.notify(NoticeLevel::Success, "Prompt engineered successfully!");
        Ok(ActionOutcome::Applied)
    }

    /// Render the advanced prompt, replace the gallery with the result and
    /// persist the generation to history.
    pub async fn generate_image(&self) -> WorkspaceResult<ActionOutcome> {
        let kind = OperationKind::Image;
        let Some(mut flight) = self.try_fly(kind) else {
            return Ok(ActionOutcome::Busy);
        };
        let state = self.store.snapshot();
        if state.advanced_prompt.trim().is_empty() {
            return Ok(ActionOutcome::NotReady);
        }
        let session = flight.begin();

        let result = self
            .gateway
            .generate_image(GenerateImageRequest {
                prompt: state.advanced_prompt.clone(),
                aspect_ratio: state.settings.aspect_ratio.clone(),
            })
            .await
            .and_then(|generated| {
                if generated.images.is_empty() {
                    Err(GatewayError::Internal(
                        "image generation returned no images".to_string(),
                    ))
                } else {
                    Ok(generated.images)
                }
            });
        let urls = match result {
            Ok(urls) => urls,
            Err(error) => {
                return self.fail(
                    session,
                    kind,
                    "Failed to generate images. Please try again.",
                    error.into(),
                );
            }
        };

        let cap = self.store.gallery_cap();
        let gallery: Vec<GeneratedImage> = urls
            .iter()
            .take(cap)
            .map(|url| GeneratedImage::new(url.clone(), state.advanced_prompt.clone()))
            .collect();
        let applied = self.store.complete_if_current(session, kind, |state| {
            state.replace_gallery(gallery);
        });
        if applied.is_none() {
            debug!("discarding generated images from a replaced session");
            return Ok(ActionOutcome::Stale);
        }

        let item = HistoryItem::from_generation(
            String::new(),
            state.idea_text,
            state.settings,
            state.advanced_prompt,
            &urls,
            chrono::Utc::now().timestamp_millis(),
        );
        let receipt = self.history.persist(item);
        if receipt.local.is_err() {
            self.notify(
                NoticeLevel::Warning,
                "Images generated, but saving to local history failed.",
            );
        }
        if let Some(cloud) = receipt.cloud {
            if let Ok(mut writes) = self.cloud_writes.lock() {
                writes.retain(|write| !write.is_finished());
                writes.push(cloud);
            }
        }
        info!(images = urls.len(), local_id = %receipt.local_id, "images generated");
        self.notify(NoticeLevel::Success, "Images generated successfully!");
        Ok(ActionOutcome::Applied)
    }

    /// Open the edit dialog for the image at `index`.
    pub fn select_image_for_edit(&self, index: usize) -> WorkspaceResult<()> {
        self.store.set_editing_image_index(Some(index))?;
        self.store.set_edit_prompt("");
        Ok(())
    }

    pub fn cancel_edit(&self) -> WorkspaceResult<()> {
        self.store.set_editing_image_index(None)?;
        self.store.set_edit_prompt("");
        Ok(())
    }

    /// Edit the selected image and append the result to the gallery.
    ///
    /// The source image is left untouched. On failure the edit target and
    /// instruction stay in place so the dialog remains open. A result that
    /// arrives after the gallery was replaced is discarded.
    pub async fn submit_edit(&self) -> WorkspaceResult<ActionOutcome> {
        let kind = OperationKind::Edit;
        let Some(mut flight) = self.try_fly(kind) else {
            return Ok(ActionOutcome::Busy);
        };
        let state = self.store.snapshot();
        let Some(index) = state.editing_image_index else {
            return Ok(ActionOutcome::NotReady);
        };
        if state.edit_prompt.trim().is_empty() {
            return Ok(ActionOutcome::NotReady);
        }
        let cap = self.store.gallery_cap();
        if state.generated_images.len() >= cap {
            self.notify(
                NoticeLevel::Error,
                format!("The gallery is full ({cap} images)."),
            );
            return Err(WorkspaceError::GalleryFull(cap));
        }
        let source = state
            .generated_images
            .get(index)
            .cloned()
            .ok_or(WorkspaceError::InvalidIndex {
                index,
                len: state.generated_images.len(),
            })?;
        let issued_gallery = state.gallery;
        let session = flight.begin();

        let result = self
            .gateway
            .edit_image(EditImageRequest {
                image: source.url,
                prompt: state.edit_prompt.clone(),
                aspect_ratio: state.settings.aspect_ratio.clone(),
                original_prompt: Some(source.prompt),
            })
            .await
            .and_then(|edited| match edited.images.into_iter().next() {
                Some(url) => Ok(GeneratedImage::new(url, edited.new_prompt)),
                None => Err(GatewayError::Internal(
                    "image edit returned no images".to_string(),
                )),
            });
        let image = match result {
            Ok(image) => image,
            Err(error) => {
                return self.fail(
                    session,
                    kind,
                    "Failed to edit image. Please try again.",
                    error.into(),
                );
            }
        };

        let applied = self.store.complete_if_current(session, kind, |state| {
            if state.gallery != issued_gallery {
                return Ok(false);
            }
            if state.generated_images.len() >= cap {
                return Err(WorkspaceError::GalleryFull(cap));
            }
            state.generated_images.push(image);
            state.editing_image_index = None;
            state.edit_prompt.clear();
            Ok(true)
        });
        match applied {
            None => {
                debug!("discarding edited image from a replaced session");
                Ok(ActionOutcome::Stale)
            }
            Some(Ok(false)) => {
                debug!("discarding edited image for a replaced gallery");
                Ok(ActionOutcome::Stale)
            }
            Some(Err(error)) => {
                self.notify(NoticeLevel::Error, error.to_string());
                Err(error)
            }
            Some(Ok(true)) => {
                self.notify(NoticeLevel::Success, "Image edited successfully!");
                Ok(ActionOutcome::Applied)
            }
        }
    }

    /// Replace the session with a history record. Calls still in flight
    /// finish in the background and their results are discarded.
    pub fn restore(&self, item: &HistoryItem) -> ActionOutcome {
        let session = self.store.restore(item);
        debug!(session, id = %item.id, "session restored from history");
        ActionOutcome::Applied
    }

    pub fn set_active_mode(&self, mode: GenerationMode) {
        self.store.set_active_mode(mode);
    }

    /// Wait for every outstanding cloud history write.
    pub async fn flush_history(&self) -> Vec<Result<String, PersistenceError>> {
        let writes = match self.cloud_writes.lock() {
            Ok(mut writes) => std::mem::take(&mut *writes),
            Err(_) => Vec::new(),
        };

        let mut results = Vec::with_capacity(writes.len());
        for write in writes {
            results.push(
                write
                    .await
                    .unwrap_or_else(|error| Err(PersistenceError::Remote(error.to_string()))),
            );
        }
        results
    }
}
