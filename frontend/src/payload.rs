//! Upload payload built from a form snapshot.
//!
//! The multipart body is the browser form itself plus two overridden text
//! fields: `playerName` and `dates`. `dates` is a JSON object mapping each
//! selected file name to its last-modified time in milliseconds.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::{FormSnapshot, SelectedFile};

/// File name to last-modified timestamp, in selection order.
///
/// A repeated name keeps its first position and takes the latest timestamp,
/// the way a JavaScript object literal would.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReplayDates {
    entries: Vec<(String, i64)>,
}

impl ReplayDates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a timestamp.
    pub fn insert(&mut self, name: impl Into<String>, last_modified: i64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = last_modified,
            None => self.entries.push((name, last_modified)),
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as the flat JSON object sent in the `dates` field.
    pub fn to_json(&self) -> String {
        // Keys are strings and values integers: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<'a> FromIterator<&'a SelectedFile> for ReplayDates {
    fn from_iter<I: IntoIterator<Item = &'a SelectedFile>>(iter: I) -> Self {
        let mut dates = ReplayDates::new();
        for file in iter {
            dates.insert(file.name.clone(), file.last_modified);
        }
        dates
    }
}

impl Serialize for ReplayDates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, ts) in &self.entries {
            map.serialize_entry(name, ts)?;
        }
        map.end()
    }
}

/// Text fields overriding the browser form before the request is sent.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadPayload {
    /// Value for the `playerName` field
    pub player_name: String,
    /// Value for the `dates` field
    pub dates: ReplayDates,
    /// Files attached through the replay input
    pub files: Vec<SelectedFile>,
}

impl UploadPayload {
    pub fn from_snapshot(snapshot: &FormSnapshot) -> Self {
        Self {
            player_name: snapshot.player_name.clone(),
            dates: snapshot.files.iter().collect(),
            files: snapshot.files.clone(),
        }
    }

    /// `(field, value)` pairs set on top of the form's own fields.
    pub fn text_fields(&self) -> [(&'static str, String); 2] {
        [
            (crate::config::PLAYER_NAME_FIELD, self.player_name.clone()),
            (crate::config::DATES_FIELD, self.dates.to_json()),
        ]
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
