//! Vault data model
//!
//! Items are rows of the `Items` sheet. They are created by a form submission
//! and never edited afterwards; the row position is the item's id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// People known before anyone submits anything
pub const INITIAL_PEOPLE: [&str; 4] = ["Grammie", "Verna", "Elaine", "Joyce"];

/// Column headers of the `Items` sheet, in row order
pub const ITEM_COLUMNS: [&str; 12] = [
    "Timestamp",
    "Title",
    "Person",
    "Size",
    "Description",
    "Image URLs",
    "Audio URL",
    "Transcript",
    "Uploader",
    "Drive Image IDs",
    "Drive Audio ID",
    "Sheet ID",
];

/// Physical size of a remembered object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

impl Size {
    pub const ALL: [Size; 4] = [Size::Small, Size::Medium, Size::Large, Size::Huge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
            Size::Huge => "Huge",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Size {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Size::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown size: {}", s)))
    }
}

/// Household member who performed a submission
///
/// The label set is fixed; an item's uploader string is the concatenation
/// of the selected labels in selection order (e.g. `"MIER"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploaderLabel {
    #[serde(rename = "ER")]
    Er,
    #[serde(rename = "MI")]
    Mi,
    #[serde(rename = "HA")]
    Ha,
    #[serde(rename = "DU")]
    Du,
}

impl UploaderLabel {
    pub const ALL: [UploaderLabel; 4] = [
        UploaderLabel::Er,
        UploaderLabel::Mi,
        UploaderLabel::Ha,
        UploaderLabel::Du,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploaderLabel::Er => "ER",
            UploaderLabel::Mi => "MI",
            UploaderLabel::Ha => "HA",
            UploaderLabel::Du => "DU",
        }
    }
}

impl fmt::Display for UploaderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploaderLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        UploaderLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown uploader label: {}", s)))
    }
}

/// Position of an item in the fetched list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single remembered object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Raw timestamp cell; parsed on demand for sorting
    pub timestamp: String,
    pub title: String,
    pub person: String,
    /// `None` when the cell holds something other than a known size
    pub size: Option<Size>,
    pub description: String,
    pub image_urls: Vec<String>,
    pub audio_url: String,
    pub audio_transcript: String,
    pub uploader: String,
    pub drive_image_ids: Vec<String>,
    pub drive_audio_id: String,
    pub sheet_id: String,
}

impl Item {
    /// Map a values-range row positionally onto the item columns
    ///
    /// Short rows are padded with empty cells; `fallback_sheet_id` fills an
    /// empty `Sheet ID` cell.
    pub fn from_row(id: ItemId, row: &[String], fallback_sheet_id: &str) -> Self {
        let cell = |idx: usize| row.get(idx).map(|s| s.as_str()).unwrap_or("");

        let sheet_id = match cell(11) {
            "" => fallback_sheet_id.to_string(),
            s => s.to_string(),
        };

        Self {
            id,
            timestamp: cell(0).to_string(),
            title: cell(1).to_string(),
            person: cell(2).to_string(),
            size: cell(3).parse().ok(),
            description: cell(4).to_string(),
            image_urls: split_list(cell(5)),
            audio_url: cell(6).to_string(),
            audio_transcript: cell(7).to_string(),
            uploader: cell(8).to_string(),
            drive_image_ids: split_list(cell(9)),
            drive_audio_id: cell(10).to_string(),
            sheet_id,
        }
    }

    /// Parsed timestamp, `None` if the cell is empty or malformed
    pub fn parsed_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        crate::time::parse_item_timestamp(&self.timestamp)
    }
}

/// Split a comma-joined list cell; an empty cell is an empty list
pub fn split_list(cell: &str) -> Vec<String> {
    if cell.trim().is_empty() {
        return Vec::new();
    }
    cell.split(',').map(|s| s.trim().to_string()).collect()
}

/// The row appended for one successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItemRow {
    pub timestamp: String,
    pub title: String,
    pub person: String,
    pub size: Size,
    pub description: String,
    pub image_urls: Vec<String>,
    pub audio_url: String,
    pub audio_transcript: String,
    pub uploader: String,
    pub drive_image_ids: Vec<String>,
    pub drive_audio_id: String,
    pub sheet_id: String,
}

impl NewItemRow {
    /// Cells in `ITEM_COLUMNS` order
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.title.clone(),
            self.person.clone(),
            self.size.to_string(),
            self.description.clone(),
            self.image_urls.join(","),
            self.audio_url.clone(),
            self.audio_transcript.clone(),
            self.uploader.clone(),
            self.drive_image_ids.join(","),
            self.drive_audio_id.clone(),
            self.sheet_id.clone(),
        ]
    }
}

/// Known people, in the order they became known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct People(Vec<String>);

impl People {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut people = Self(Vec::new());
        for name in names {
            people.add(name.into());
        }
        people
    }

    /// Add a name unless it is blank or already known
    ///
    /// Returns `true` if the list grew.
    pub fn add(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref().trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|p| p == name.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for People {
    fn default() -> Self {
        Self::new(INITIAL_PEOPLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_size_parse_is_case_insensitive() {
        assert_eq!("small".parse::<Size>().unwrap(), Size::Small);
        assert_eq!(" Huge ".parse::<Size>().unwrap(), Size::Huge);
        assert!("Enormous".parse::<Size>().is_err());
    }

    #[test]
    fn test_size_defaults_to_medium() {
        assert_eq!(Size::default(), Size::Medium);
    }

    #[test]
    fn test_uploader_label_serde_uses_letters() {
        let json = serde_json::to_string(&UploaderLabel::Ha).unwrap();
        assert_eq!(json, "\"HA\"");
        let label: UploaderLabel = serde_json::from_str("\"DU\"").unwrap();
        assert_eq!(label, UploaderLabel::Du);
    }

    #[test]
    fn test_from_row_full() {
        let item = Item::from_row(
            ItemId(3),
            &row(&[
                "2024-06-01T00:00:00.000Z",
                "Lamp",
                "Verna",
                "Large",
                "Brass lamp",
                "https://a,https://b",
                "https://audio",
                "it was in the attic",
                "ERMI",
                "a,b",
                "aud",
                "sheet-1",
            ]),
            "fallback",
        );

        assert_eq!(item.id, ItemId(3));
        assert_eq!(item.title, "Lamp");
        assert_eq!(item.size, Some(Size::Large));
        assert_eq!(item.image_urls, vec!["https://a", "https://b"]);
        assert_eq!(item.drive_image_ids, vec!["a", "b"]);
        assert_eq!(item.uploader, "ERMI");
        assert_eq!(item.sheet_id, "sheet-1");
    }

    #[test]
    fn test_from_row_short_row_is_padded() {
        let item = Item::from_row(ItemId(0), &row(&["2024-01-01", "Teapot", "Grammie"]), "sheet-x");

        assert_eq!(item.title, "Teapot");
        assert_eq!(item.size, None);
        assert!(item.image_urls.is_empty());
        assert!(item.audio_url.is_empty());
        assert_eq!(item.sheet_id, "sheet-x");
    }

    #[test]
    fn test_new_item_row_cells_follow_column_order() {
        let new_row = NewItemRow {
            timestamp: "2024-06-01T00:00:00.000Z".into(),
            title: "Lamp".into(),
            person: "Verna".into(),
            size: Size::Medium,
            description: String::new(),
            image_urls: vec!["u1".into(), "u2".into()],
            audio_url: String::new(),
            audio_transcript: String::new(),
            uploader: "HADU".into(),
            drive_image_ids: vec!["i1".into(), "i2".into()],
            drive_audio_id: String::new(),
            sheet_id: "s".into(),
        };

        let cells = new_row.to_cells();
        assert_eq!(cells.len(), ITEM_COLUMNS.len());
        assert_eq!(cells[3], "Medium");
        assert_eq!(cells[5], "u1,u2");
        assert_eq!(cells[8], "HADU");
        assert_eq!(cells[9], "i1,i2");

        // Reading the appended row back yields the same item fields
        let item = Item::from_row(ItemId(0), &cells, "");
        assert_eq!(item.image_urls, new_row.image_urls);
        assert_eq!(item.size, Some(Size::Medium));
    }

    #[test]
    fn test_people_add_is_idempotent() {
        let mut people = People::new(["Grammie", "Verna"]);
        assert!(people.add("Joyce"));
        assert!(!people.add("Joyce"));
        assert!(!people.add("  Joyce "));
        assert!(!people.add("   "));
        assert_eq!(people.iter().filter(|p| *p == "Joyce").count(), 1);
        assert_eq!(people.len(), 3);
    }

    #[test]
    fn test_people_default_seed() {
        let people = People::default();
        assert_eq!(people.iter().collect::<Vec<_>>(), INITIAL_PEOPLE.to_vec());
    }
}
