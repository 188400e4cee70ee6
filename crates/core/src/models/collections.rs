//! Collections whose serialized form records what kind of collection they are.
//!
//! Ordered maps and sets would both collapse to plain JSON arrays, so they
//! carry a tag on the wire:
//!
//! * [`OrderedMap`] serializes as `{"dataType": "Map", "value": [[key, value], ...]}`
//! * [`TagSet`] serializes as `["__isSet", item, ...]`

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::de;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `dataType` tag written for ordered maps.
pub const MAP_TAG: &str = "Map";
/// Leading marker element written for sets.
pub const SET_MARKER: &str = "__isSet";

/// Insertion-ordered `name -> text` mapping used for abilities and rule
/// glossaries. Re-inserting a name overwrites its text in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap(IndexMap<String, String>);

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when `key` is not present yet.
    pub fn insert_missing(&mut self, key: &str, value: &str) {
        if !self.0.contains_key(key) {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.shift_remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.0.retain(|key, value| keep(key, value));
    }

    /// Copy every entry of `other` into this map.
    pub fn extend_from(&mut self, other: &OrderedMap) {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl Serialize for OrderedMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<(&str, &str)> = self.iter().collect();
        let mut state = serializer.serialize_struct("OrderedMap", 2)?;
        state.serialize_field("dataType", MAP_TAG)?;
        state.serialize_field("value", &entries)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for OrderedMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Tagged {
            data_type: String,
            #[serde(default)]
            value: Vec<(String, String)>,
        }

        let tagged = Tagged::deserialize(deserializer)?;
        if tagged.data_type != MAP_TAG {
            return Err(de::Error::custom(format!(
                "expected dataType '{MAP_TAG}', found '{}'",
                tagged.data_type
            )));
        }
        Ok(tagged.value.into_iter().collect())
    }
}

/// Unordered set of keyword strings, iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag`, returning whether it was new.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined rendering, e.g. `"Infantry, Grenades"`.
    pub fn joined(&self) -> String {
        self.iter().collect::<Vec<_>>().join(", ")
    }
}

impl<T: Into<String>> FromIterator<T> for TagSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for TagSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.0.len() + 1))?;
        seq.serialize_element(SET_MARKER)?;
        for tag in &self.0 {
            seq.serialize_element(tag)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(deserializer)?;
        let mut items = raw.into_iter();
        match items.next() {
            Some(marker) if marker == SET_MARKER => Ok(items.collect()),
            _ => Err(de::Error::custom(format!(
                "set must start with '{SET_MARKER}'"
            ))),
        }
    }
}
