use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::prompt::SpecField;

/// Language / platform / library triple for one side of the stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDraft {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub library: Option<String>,
}

/// Typed view over the JSON object a model returned.
///
/// Every field is optional: a regeneration reply carries only the fields
/// that were asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub frontend: StackDraft,
    #[serde(default)]
    pub backend: StackDraft,
}

impl ProjectDraft {
    /// Build a draft from a reply object, walking each dotted path.
    ///
    /// Numbers and booleans are rendered as text, arrays of scalars are
    /// joined with `", "`, and an object where text was expected becomes `""`.
    pub fn from_reply(reply: &Map<String, Value>) -> Self {
        let get = |path: &str| lookup(reply, path);
        Self {
            project_name: get("project_name"),
            description: get("description"),
            architecture: get("architecture"),
            frontend: StackDraft {
                language: get("frontend.language"),
                platform: get("frontend.platform"),
                library: get("frontend.library"),
            },
            backend: StackDraft {
                language: get("backend.language"),
                platform: get("backend.platform"),
                library: get("backend.library"),
            },
        }
    }

    pub fn get(&self, field: SpecField) -> Option<&str> {
        let v = match field {
            SpecField::Description => &self.description,
            SpecField::Architecture => &self.architecture,
            SpecField::FrontendLanguage => &self.frontend.language,
            SpecField::FrontendPlatform => &self.frontend.platform,
            SpecField::FrontendLibrary => &self.frontend.library,
            SpecField::BackendLanguage => &self.backend.language,
            SpecField::BackendPlatform => &self.backend.platform,
            SpecField::BackendLibrary => &self.backend.library,
        };
        v.as_deref()
    }
}

/// Resolve a dotted path like `frontend.language` against a reply object.
pub fn lookup(reply: &Map<String, Value>, path: &str) -> Option<String> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = reply.get(first)?;
    for part in parts {
        match current {
            Value::Object(map) => current = map.get(part)?,
            _ => return Some(String::new()),
        }
    }
    render(current)
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Object(_) | Value::Array(_) => None,
                    other => render(other),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => Some(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn full_reply_maps_every_field() {
        let reply = obj(json!({
            "project_name": "Kiosk",
            "description": "self-service",
            "architecture": "three tier",
            "frontend": {"language": "TypeScript", "platform": "Web", "library": "React"},
            "backend": {"language": "Rust", "platform": "Linux", "library": "Axum"}
        }));
        let draft = ProjectDraft::from_reply(&reply);
        assert_eq!(draft.project_name.as_deref(), Some("Kiosk"));
        assert_eq!(draft.get(SpecField::FrontendLibrary), Some("React"));
        assert_eq!(draft.get(SpecField::BackendLanguage), Some("Rust"));
    }

    #[test]
    fn partial_reply_leaves_other_fields_unset() {
        let draft = ProjectDraft::from_reply(&obj(json!({"backend": {"platform": "Axum"}})));
        assert_eq!(draft.get(SpecField::BackendPlatform), Some("Axum"));
        assert_eq!(draft.get(SpecField::Description), None);
        assert_eq!(draft.frontend, StackDraft::default());
    }

    #[test]
    fn odd_shapes_are_rendered_as_text() {
        let draft = ProjectDraft::from_reply(&obj(json!({
            "description": {"nested": true},
            "architecture": ["api", "worker"],
            "frontend": "not an object",
            "backend": {"language": 3}
        })));
        assert_eq!(draft.description.as_deref(), Some(""));
        assert_eq!(draft.architecture.as_deref(), Some("api, worker"));
        assert_eq!(draft.frontend.language.as_deref(), Some(""));
        assert_eq!(draft.backend.language.as_deref(), Some("3"));
    }

    #[test]
    fn empty_reply_is_empty_draft() {
        let draft = ProjectDraft::from_reply(&Map::new());
        assert_eq!(draft, ProjectDraft::default());
    }
}
