//! JSON-object argument form.
//!
//! `serde_json::Value` keeps only the last of repeated keys, so the object is
//! read entry by entry instead and duplicates are left for the caller to
//! reject.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

/// Top-level entries of a JSON object, in document order.
#[derive(Debug, Default)]
pub(crate) struct JsonObject {
    pub(crate) entries: Vec<(String, serde_json::Value)>,
}

impl<'de> Deserialize<'de> for JsonObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = JsonObject;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<JsonObject, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
            entries.push(entry);
        }
        Ok(JsonObject { entries })
    }
}

/// Parse `text` as a single JSON object. `None` for anything else.
pub(crate) fn object(text: &str) -> Option<JsonObject> {
    serde_json::from_str(text).ok()
}
