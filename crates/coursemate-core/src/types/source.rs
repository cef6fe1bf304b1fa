//! Attribution records for retrieved content

use serde::{Deserialize, Serialize};

/// Where a piece of retrieved content came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Human-readable label, e.g. "Intro to ML - Lesson 2"
    pub label: String,
    /// Link to the lesson or course, when one is known
    #[serde(default)]
    pub link: Option<String>,
}

impl SourceRecord {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_absent_link_as_null() {
        let record = SourceRecord::new("Intro to ML");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"label":"Intro to ML","link":null}"#);
    }
}
