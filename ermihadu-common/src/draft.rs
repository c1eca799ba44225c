//! Form draft for the item being composed
//!
//! The draft lives only in memory. It is validated before any network call
//! and turned into a [`Submission`] that the upload pipeline consumes.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::model::{Size, UploaderLabel};

/// Person selector value meaning "type a new name"
pub const NEW_PERSON_OPTION: &str = "new";

/// Prefix of every existing person's selector value, so that no name can
/// collide with [`NEW_PERSON_OPTION`] or the empty "unselected" value
pub const PERSON_OPTION_PREFIX: &str = "person:";

/// Selector value for an existing person
pub fn person_option_value(name: &str) -> String {
    format!("{}{}", PERSON_OPTION_PREFIX, name)
}

/// A selected image (or any binary asset) waiting to be uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// File extension for the uploaded name, derived from the mime type
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/heic" => "heic",
            _ => "jpg",
        }
    }
}

/// A finished audio recording
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Who gave the item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PersonChoice {
    #[default]
    Unselected,
    Existing(String),
    /// "+ Add new person" chosen; the name may still be empty
    New(String),
}

impl PersonChoice {
    /// Build from the selector value and the new-person text box
    ///
    /// A typed new name wins over the selector.
    pub fn from_form(selected: &str, new_person: &str) -> Self {
        let selected = selected.trim();
        let new_person = new_person.trim();

        if !new_person.is_empty() {
            PersonChoice::New(new_person.to_string())
        } else if selected == NEW_PERSON_OPTION {
            PersonChoice::New(String::new())
        } else {
            match selected.strip_prefix(PERSON_OPTION_PREFIX).map(str::trim) {
                Some(name) if !name.is_empty() => PersonChoice::Existing(name.to_string()),
                _ => PersonChoice::Unselected,
            }
        }
    }

    /// The name that would be recorded, if any
    pub fn resolved(&self) -> Option<&str> {
        match self {
            PersonChoice::Unselected => None,
            PersonChoice::Existing(name) | PersonChoice::New(name) => {
                let name = name.trim();
                (!name.is_empty()).then_some(name)
            }
        }
    }

    /// Value to preselect in the person dropdown
    pub fn selector_value(&self) -> String {
        match self {
            PersonChoice::Unselected => String::new(),
            PersonChoice::Existing(name) => person_option_value(name),
            PersonChoice::New(_) => NEW_PERSON_OPTION.to_string(),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, PersonChoice::New(_))
    }
}

/// Field that blocked a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredField {
    Title,
    Person,
    Uploader,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequiredField::Title => "title",
            RequiredField::Person => "person",
            RequiredField::Uploader => "uploader",
        })
    }
}

/// Submission rejected before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fill in title, person, and select uploader (missing: {})", list_fields(.missing))]
pub struct ValidationError {
    pub missing: Vec<RequiredField>,
}

fn list_fields(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The item being composed on the form page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDraft {
    pub images: Vec<Attachment>,
    pub title: String,
    pub person: PersonChoice,
    pub size: Size,
    pub description: String,
    pub audio: Option<AudioClip>,
    pub audio_transcript: String,
    uploader: Vec<UploaderLabel>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_images(&mut self, images: impl IntoIterator<Item = Attachment>) {
        self.images.extend(images);
    }

    /// Remove the image at `index`; out-of-range indices are ignored
    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    /// Select the label if unselected, unselect it otherwise
    pub fn toggle_uploader(&mut self, label: UploaderLabel) {
        if let Some(pos) = self.uploader.iter().position(|l| *l == label) {
            self.uploader.remove(pos);
        } else {
            self.uploader.push(label);
        }
    }

    /// Replace the selection, keeping first occurrences in the given order
    pub fn set_uploaders(&mut self, labels: impl IntoIterator<Item = UploaderLabel>) {
        self.uploader.clear();
        for label in labels {
            if !self.uploader.contains(&label) {
                self.uploader.push(label);
            }
        }
    }

    pub fn uploaders(&self) -> &[UploaderLabel] {
        &self.uploader
    }

    /// Selected labels concatenated in selection order
    pub fn uploader_string(&self) -> String {
        self.uploader.iter().map(|l| l.as_str()).collect()
    }

    /// Check required fields and produce the submission to upload
    pub fn validate(&self) -> Result<Submission, ValidationError> {
        let mut missing = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            missing.push(RequiredField::Title);
        }
        let person = self.person.resolved();
        if person.is_none() {
            missing.push(RequiredField::Person);
        }
        if self.uploader.is_empty() {
            missing.push(RequiredField::Uploader);
        }

        match person {
            Some(person) if missing.is_empty() => Ok(Submission {
                title: title.to_string(),
                person: person.to_string(),
                size: self.size,
                description: self.description.clone(),
                images: self.images.clone(),
                audio: self.audio.clone(),
                audio_transcript: self.audio_transcript.clone(),
                uploader: self.uploader_string(),
            }),
            _ => Err(ValidationError { missing }),
        }
    }
}

/// A validated draft, ready for the upload pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub title: String,
    pub person: String,
    pub size: Size,
    pub description: String,
    pub images: Vec<Attachment>,
    pub audio: Option<AudioClip>,
    pub audio_transcript: String,
    /// Non-empty concatenation of uploader labels
    pub uploader: String,
}
