//! Application stores: the shared catalog and per-browser view state
//!
//! The [`Catalog`] holds what every visitor sees alike: the fetched items
//! and the known people. Each browser owns a [`ViewState`] with its page,
//! filters, expanded item, draft, recorder and status banner. All view
//! mutation goes through [`ViewState::apply`].

use serde::Serialize;
use thiserror::Error;

use crate::draft::{Attachment, FormDraft, PersonChoice};
use crate::filter::{apply_filters, FilterSelection};
use crate::model::{Item, ItemId, People, Size, UploaderLabel};
use crate::recorder::{AudioRecorder, RecorderError};

/// Shown on the list page when nothing matches
pub const EMPTY_STATE_MESSAGE: &str = "No items yet. Click the + button to add your first memory!";

/// The two mutually exclusive pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    List,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Inline banner replacing blocking alerts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Items and people shared by every visitor
///
/// Written only by a refresh (items) and by successful submissions (people).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub items: Vec<Item>,
    pub people: People,
}

impl Catalog {
    pub fn new(people: People) -> Self {
        Self {
            items: Vec::new(),
            people,
        }
    }

    /// Replace the item list; every person named by an item becomes known
    pub fn load_items(&mut self, items: Vec<Item>) {
        for item in &items {
            self.people.add(&item.person);
        }
        self.items = items;
    }

    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Returns `true` if the person was not known before
    pub fn add_person(&mut self, name: &str) -> bool {
        self.people.add(name)
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }
}

/// Form fields posted by the page (audio is recorded separately)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftFields {
    pub title: String,
    pub person: PersonChoice,
    pub size: Size,
    pub description: String,
    pub audio_transcript: String,
    pub uploader: Vec<UploaderLabel>,
    pub new_images: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Switch pages; leaving the form discards the draft
    Navigate(Page),
    SetFilters(FilterSelection),
    /// Show this item's details (idempotent)
    Expand(ItemId),
    /// Hide this item's details if it is the expanded one (idempotent)
    Collapse(ItemId),
    /// The shared list could not be fetched
    ItemsLoadFailed(String),
    EditDraft(DraftFields),
    RemoveImage(usize),
    ToggleUploader(UploaderLabel),
    RecordingStarted { mime_type: Option<String> },
    RecordingChunk(Vec<u8>),
    RecordingStopped,
    MicrophoneDenied,
    DiscardAudio,
    ValidationFailed(String),
    SubmissionStarted,
    SubmissionSucceeded { title: String },
    SubmissionFailed(String),
    DismissStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error("An upload is already in progress")]
    Busy,
}

/// One browser's view of the vault
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub page: Page,
    pub filters: FilterSelection,
    pub expanded: Option<ItemId>,
    pub draft: FormDraft,
    pub recorder: AudioRecorder,
    pub uploading: bool,
    pub status: Option<StatusMessage>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items to show on the list page, filtered and ordered
    pub fn visible_items<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Item> {
        apply_filters(&catalog.items, &self.filters)
    }

    /// Apply one action. A rejected action leaves the state untouched.
    pub fn apply(&mut self, action: Action) -> Result<(), ActionError> {
        match action {
            Action::Navigate(page) => {
                if self.page == Page::Form && page == Page::List {
                    self.discard_draft();
                }
                self.page = page;
            }
            Action::SetFilters(filters) => {
                self.filters = filters;
            }
            Action::Expand(id) => {
                self.expanded = Some(id);
            }
            Action::Collapse(id) => {
                if self.expanded == Some(id) {
                    self.expanded = None;
                }
            }
            Action::ItemsLoadFailed(message) => {
                self.expanded = None;
                self.status = Some(StatusMessage::error(message));
            }
            Action::EditDraft(fields) => {
                let draft = &mut self.draft;
                draft.title = fields.title;
                draft.person = fields.person;
                draft.size = fields.size;
                draft.description = fields.description;
                draft.audio_transcript = fields.audio_transcript;
                draft.set_uploaders(fields.uploader);
                draft.add_images(fields.new_images);
            }
            Action::RemoveImage(index) => self.draft.remove_image(index),
            Action::ToggleUploader(label) => self.draft.toggle_uploader(label),
            Action::RecordingStarted { mime_type } => {
                self.recorder.start(mime_type.as_deref())?;
            }
            Action::RecordingChunk(chunk) => {
                self.recorder.push_chunk(chunk)?;
            }
            Action::RecordingStopped => {
                if let Some(clip) = self.recorder.stop() {
                    self.draft.audio = Some(clip);
                }
            }
            Action::MicrophoneDenied => {
                self.recorder.abort();
                self.status = Some(StatusMessage::error(
                    "Could not access microphone. Please allow microphone access.",
                ));
            }
            Action::DiscardAudio => {
                self.draft.audio = None;
            }
            Action::ValidationFailed(message) => {
                self.status = Some(StatusMessage::error(message));
            }
            Action::SubmissionStarted => {
                if self.uploading {
                    return Err(ActionError::Busy);
                }
                self.uploading = true;
                self.status = None;
            }
            Action::SubmissionSucceeded { title } => {
                self.uploading = false;
                self.discard_draft();
                self.page = Page::List;
                self.status = Some(StatusMessage::success(format!(
                    "\u{201c}{}\u{201d} uploaded successfully!",
                    title
                )));
            }
            Action::SubmissionFailed(message) => {
                self.uploading = false;
                self.status = Some(StatusMessage::error(message));
            }
            Action::DismissStatus => {
                self.status = None;
            }
        }
        Ok(())
    }

    fn discard_draft(&mut self) {
        self.draft = FormDraft::new();
        self.recorder.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::AudioClip;
    use crate::filter::SizeFilter;

    fn item(id: usize, title: &str, person: &str, size: &str, ts: &str) -> Item {
        let row: Vec<String> = [ts, title, person, size].iter().map(|s| s.to_string()).collect();
        Item::from_row(ItemId(id), &row, "sheet")
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(People::new(["Grammie", "Verna"]));
        catalog.load_items(vec![
            item(0, "Teapot", "Grammie", "Small", "2024-01-01"),
            item(1, "Lamp", "Verna", "Large", "2024-06-01"),
        ]);
        catalog
    }

    fn titles(view: &ViewState, catalog: &Catalog) -> Vec<String> {
        view.visible_items(catalog).iter().map(|i| i.title.clone()).collect()
    }

    #[test]
    fn test_visible_items_follow_filters() {
        let catalog = catalog();
        let mut view = ViewState::new();
        assert_eq!(titles(&view, &catalog), vec!["Lamp", "Teapot"]);

        view.apply(Action::SetFilters(FilterSelection {
            size: SizeFilter::Only(Size::Small),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(titles(&view, &catalog), vec!["Teapot"]);
    }

    #[test]
    fn test_views_filter_the_same_catalog_independently() {
        let catalog = catalog();
        let mut small_only = ViewState::new();
        small_only
            .apply(Action::SetFilters(FilterSelection {
                size: SizeFilter::Only(Size::Small),
                ..Default::default()
            }))
            .unwrap();
        let other = ViewState::new();

        assert_eq!(titles(&small_only, &catalog), vec!["Teapot"]);
        assert_eq!(titles(&other, &catalog), vec!["Lamp", "Teapot"]);
    }

    #[test]
    fn test_load_items_absorbs_people() {
        let mut catalog = Catalog::new(People::new(["Grammie"]));
        catalog.load_items(vec![
            item(0, "Quilt", "Aunt Rose", "Medium", "2024-01-01"),
            item(1, "Spoon", "Grammie", "Small", "2024-01-02"),
        ]);
        assert_eq!(catalog.people.iter().collect::<Vec<_>>(), vec!["Grammie", "Aunt Rose"]);
        assert!(catalog.contains_item(ItemId(1)));
        assert!(!catalog.contains_item(ItemId(2)));
    }

    #[test]
    fn test_add_person_is_idempotent() {
        let mut catalog = Catalog::new(People::new(["Grammie"]));
        assert!(catalog.add_person("Joyce"));
        assert!(!catalog.add_person("Joyce"));
        assert_eq!(catalog.people.len(), 2);
    }

    #[test]
    fn test_expand_and_collapse_are_idempotent() {
        let mut view = ViewState::new();
        view.apply(Action::Expand(ItemId(1))).unwrap();
        view.apply(Action::Expand(ItemId(1))).unwrap();
        assert_eq!(view.expanded, Some(ItemId(1)));

        view.apply(Action::Expand(ItemId(0))).unwrap();
        assert_eq!(view.expanded, Some(ItemId(0)));

        // Collapsing an item that is not expanded changes nothing
        view.apply(Action::Collapse(ItemId(1))).unwrap();
        assert_eq!(view.expanded, Some(ItemId(0)));

        view.apply(Action::Collapse(ItemId(0))).unwrap();
        view.apply(Action::Collapse(ItemId(0))).unwrap();
        assert_eq!(view.expanded, None);
    }

    #[test]
    fn test_load_failure_collapses_and_reports() {
        let mut view = ViewState::new();
        view.apply(Action::Expand(ItemId(0))).unwrap();
        view.apply(Action::ItemsLoadFailed("Could not load items".into())).unwrap();
        assert_eq!(view.expanded, None);
        assert_eq!(view.status.as_ref().unwrap().kind, StatusKind::Error);

        let mut catalog = catalog();
        catalog.clear_items();
        assert!(view.visible_items(&catalog).is_empty());
    }

    #[test]
    fn test_leaving_form_discards_draft_and_recording() {
        let mut view = ViewState::new();
        view.apply(Action::Navigate(Page::Form)).unwrap();
        view.apply(Action::EditDraft(DraftFields {
            title: "Quilt".into(),
            ..Default::default()
        }))
        .unwrap();
        view.apply(Action::RecordingStarted { mime_type: None }).unwrap();

        view.apply(Action::Navigate(Page::List)).unwrap();
        assert_eq!(view.page, Page::List);
        assert_eq!(view.draft, FormDraft::new());
        assert!(!view.recorder.is_recording());
    }

    #[test]
    fn test_recording_flow_stores_clip_in_draft() {
        let mut view = ViewState::new();
        view.apply(Action::RecordingStarted { mime_type: None }).unwrap();
        assert_eq!(
            view.apply(Action::RecordingStarted { mime_type: None }),
            Err(ActionError::Recorder(RecorderError::AlreadyRecording))
        );
        view.apply(Action::RecordingChunk(vec![1, 2])).unwrap();
        view.apply(Action::RecordingStopped).unwrap();

        assert_eq!(
            view.draft.audio,
            Some(AudioClip {
                mime_type: "audio/webm".into(),
                bytes: vec![1, 2]
            })
        );
    }

    #[test]
    fn test_microphone_denied_unsets_recording() {
        let mut view = ViewState::new();
        view.apply(Action::RecordingStarted { mime_type: None }).unwrap();
        view.apply(Action::MicrophoneDenied).unwrap();
        assert!(!view.recorder.is_recording());
        assert!(view.status.unwrap().text.contains("microphone"));
    }

    #[test]
    fn test_second_submission_while_uploading_is_busy() {
        let mut view = ViewState::new();
        view.apply(Action::SubmissionStarted).unwrap();
        assert_eq!(view.apply(Action::SubmissionStarted), Err(ActionError::Busy));
        view.apply(Action::SubmissionFailed("boom".into())).unwrap();
        assert!(!view.uploading);
        assert!(view.apply(Action::SubmissionStarted).is_ok());
    }

    #[test]
    fn test_success_clears_draft_and_returns_to_list() {
        let mut view = ViewState::new();
        view.apply(Action::Navigate(Page::Form)).unwrap();
        view.apply(Action::EditDraft(DraftFields {
            title: "Quilt".into(),
            ..Default::default()
        }))
        .unwrap();
        view.apply(Action::SubmissionStarted).unwrap();
        view.apply(Action::SubmissionSucceeded {
            title: "Quilt".into(),
        })
        .unwrap();

        assert_eq!(view.page, Page::List);
        assert!(!view.uploading);
        assert_eq!(view.draft, FormDraft::new());
        assert_eq!(view.status.as_ref().unwrap().kind, StatusKind::Success);
    }

    #[test]
    fn test_edit_draft_appends_images_and_keeps_audio() {
        let mut view = ViewState::new();
        view.draft.audio = Some(AudioClip {
            mime_type: "audio/webm".into(),
            bytes: vec![7],
        });
        let image = Attachment {
            file_name: "a.jpg".into(),
            mime_type: "image/jpeg".into(),
            bytes: vec![1],
        };
        for _ in 0..2 {
            view.apply(Action::EditDraft(DraftFields {
                title: "Quilt".into(),
                uploader: vec![UploaderLabel::Du],
                new_images: vec![image.clone()],
                ..Default::default()
            }))
            .unwrap();
        }
        assert_eq!(view.draft.images.len(), 2);
        assert!(view.draft.audio.is_some());
        assert_eq!(view.draft.uploader_string(), "DU");

        view.apply(Action::RemoveImage(0)).unwrap();
        assert_eq!(view.draft.images.len(), 1);
    }

    #[test]
    fn test_toggle_uploader_keeps_selection_order() {
        let mut view = ViewState::new();
        for label in [UploaderLabel::Mi, UploaderLabel::Er, UploaderLabel::Du] {
            view.apply(Action::ToggleUploader(label)).unwrap();
        }
        view.apply(Action::ToggleUploader(UploaderLabel::Er)).unwrap();
        assert_eq!(view.draft.uploader_string(), "MIDU");
    }
}
