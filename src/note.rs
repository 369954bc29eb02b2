use crate::config::Number;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Note {
    pub path: String,
    pub title: String,
    pub content: String,
    #[serde(flatten)]
    pub metadata: NoteMetadata,
}

/// Optional client-side metadata, echoed back untouched on each result point.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point2D {
    pub x: Number,
    pub y: Number,
}

impl Point2D {
    pub fn new(x: Number, y: Number) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point2D) -> Number {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TermScore {
    pub term: String,
    pub score: Number,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResultPoint {
    pub x: Number,
    pub y: Number,
    pub title: String,
    pub path: String,
    pub top_terms: Vec<String>,
    pub cluster: i32,
    #[serde(rename = "distanceToCenter")]
    pub distance_to_center: Option<Number>,
    #[serde(flatten)]
    pub metadata: NoteMetadata,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProcessResult {
    pub points: Vec<ResultPoint>,
    pub feature_names: Vec<String>,
    pub clusters: usize,
    pub cluster_terms: BTreeMap<i32, Vec<TermScore>>,
    pub cluster_centers: BTreeMap<i32, Point2D>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_metadata_roundtrip_keeps_client_names() {
        let raw = serde_json::json!({
            "path": "a.md",
            "title": "A",
            "content": "alpha beta",
            "wordCount": 2,
            "readingTime": 1,
            "tags": ["x"],
            "contentPreview": "alpha beta",
            "mtime": 1700000000000.0
        });
        let note: Note = serde_json::from_value(raw).unwrap();
        assert_eq!(note.metadata.word_count, Some(2));
        assert_eq!(note.metadata.tags.as_deref(), Some(&["x".to_string()][..]));

        let back = serde_json::to_value(&note.metadata).unwrap();
        assert_eq!(back["contentPreview"], "alpha beta");
        assert_eq!(back["readingTime"], 1);
        assert!(back.get("ctime").is_none());
    }

    #[test]
    fn test_minimal_note() {
        let note: Note =
            serde_json::from_str(r#"{"path":"p","title":"t","content":"c"}"#).unwrap();
        assert_eq!(note.metadata, NoteMetadata::default());
    }

    #[test]
    fn test_noise_point_serializes_null_distance() {
        let point = ResultPoint {
            x: 0.0,
            y: 1.0,
            title: "t".into(),
            path: "p".into(),
            top_terms: vec![],
            cluster: -1,
            distance_to_center: None,
            metadata: NoteMetadata::default(),
        };
        let value = serde_json::to_value(&point).unwrap();
        assert!(value["distanceToCenter"].is_null());
        assert_eq!(value["cluster"], -1);
    }

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
