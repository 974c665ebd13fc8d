//! Validation task model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::TaskId;

/// A unit of validation work fetched from the task endpoint: an image link
/// plus the caption to score against it.
///
/// A Task is only constructible when `id`, `media_link`, and `text` are all
/// present and non-empty; candidates missing any of them are discarded at
/// the fetch step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned task identifier.
    pub id: TaskId,

    /// Task type (annotation metadata, opaque to the agent).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Model that produced the annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// URL of the image under validation. The wire format uses `link`.
    #[serde(alias = "link")]
    pub media_link: String,

    /// Caption to validate against the image.
    pub text: String,

    /// Positioning metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Value>,
}

impl Task {
    /// Parse one candidate task object.
    ///
    /// Returns `None` when the object is not a task shape or when any of
    /// the required fields is missing or empty.
    pub fn from_value(value: &Value) -> Option<Self> {
        let task: Task = serde_json::from_value(value.clone()).ok()?;
        if task.id.as_str().is_empty() || task.media_link.is_empty() || task.text.is_empty() {
            return None;
        }
        Some(task)
    }

    /// Parse a fetch response body, which may be a single task object or a
    /// list of them. Only fully-populated tasks are kept.
    pub fn from_response(body: &Value) -> Vec<Self> {
        match body {
            Value::Array(items) => items.iter().filter_map(Self::from_value).collect(),
            Value::Object(_) => Self::from_value(body).into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parses_fully_populated_task() {
        let value = json!({"id": "t1", "link": "http://x/i.jpg", "text": "cap"});
        let task = Task::from_value(&value).unwrap();
        assert_eq!(task.id.as_str(), "t1");
        assert_eq!(task.media_link, "http://x/i.jpg");
        assert_eq!(task.text, "cap");
    }

    #[test]
    fn test_accepts_media_link_field_name() {
        let value = json!({"id": "t1", "media_link": "http://x/i.jpg", "text": "cap"});
        assert!(Task::from_value(&value).is_some());
    }

    #[test]
    fn test_rejects_missing_or_empty_required_fields() {
        assert!(Task::from_value(&json!({"id": "t1", "text": "cap"})).is_none());
        assert!(Task::from_value(&json!({"id": "", "link": "http://x", "text": "cap"})).is_none());
        assert!(Task::from_value(&json!({"id": "t1", "link": "http://x", "text": ""})).is_none());
        assert!(Task::from_value(&json!("not an object")).is_none());
    }

    #[test]
    fn test_response_list_keeps_only_populated_tasks() {
        let body = json!([
            {"id": "t1", "link": "http://x/a.jpg", "text": "one"},
            {"id": "t2", "link": "", "text": "two"},
            {"id": "t3", "text": "three"},
            {"id": "t4", "link": "http://x/d.jpg", "text": "four"},
        ]);
        let tasks = Task::from_response(&body);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id.as_str(), "t1");
        assert_eq!(tasks[1].id.as_str(), "t4");
    }

    #[test]
    fn test_response_single_object() {
        let body = json!({"id": "t1", "link": "http://x/i.jpg", "text": "cap"});
        assert_eq!(Task::from_response(&body).len(), 1);
    }

    #[test]
    fn test_response_other_shapes_yield_nothing() {
        assert!(Task::from_response(&json!(null)).is_empty());
        assert!(Task::from_response(&json!(42)).is_empty());
    }

    #[test]
    fn test_optional_metadata_carried_through() {
        let value = json!({
            "id": "t1",
            "type": "caption",
            "model": "blip-2",
            "link": "http://x/i.jpg",
            "text": "cap",
            "offset": {"x": 1, "y": 2},
        });
        let task = Task::from_value(&value).unwrap();
        assert_eq!(task.kind.as_deref(), Some("caption"));
        assert_eq!(task.model.as_deref(), Some("blip-2"));
        assert!(task.offset.is_some());
        assert!(task.size.is_none());
    }
}
