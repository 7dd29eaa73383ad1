//! The model's page plan and how it is recovered from free-form output.

use pagepilot_core::registry::{NavItem, RouteEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProxyError;

/// Instructions for the generation call.
pub const GENERATE_SYSTEM_PROMPT: &str = r#"You build pages for a React + TypeScript admin dashboard backed by a Parse datastore.
Reply with a single JSON object and nothing else:
{
  "plan": "one paragraph describing what you will build",
  "files": [{"path": "pages/Example.tsx", "content": "..."}],
  "route": {"path": "/example", "component": "pages/Example"},
  "navItem": {"label": "Example", "path": "/example", "icon": "Sparkles"},
  "schema": {"className": "Example", "fields": {"title": "String"}}
}
File paths are relative to the dashboard src/ directory. Omit route, navItem or schema when not needed."#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative to the dashboard `src/` directory.
    pub path: String,
    pub content: String,
}

/// A new datastore class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSpec {
    pub class_name: String,
    /// Field name to type, either `"String"` or `{"type": "String", ...}`.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlan {
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub files: Vec<GeneratedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_item: Option<NavItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaSpec>,
}

impl GeneratePlan {
    /// Parse the model's reply. Markdown code fences and prose around the
    /// object are tolerated.
    pub fn parse(reply: &str) -> Result<Self, ProxyError> {
        let json = extract_json(reply)
            .ok_or_else(|| ProxyError::InvalidPlan("no JSON object in model reply".into()))?;
        serde_json::from_str(json).map_err(|e| ProxyError::InvalidPlan(e.to_string()))
    }
}

/// The JSON object inside `text`: the body of the first fenced block when
/// present, otherwise the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        // Skip an info string such as `json`.
        let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if inner.starts_with('{') {
                return Some(inner);
            }
        }
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PLAN: &str = r#"{
        "plan": "A promo tracker",
        "files": [{"path": "pages/Promos.tsx", "content": "export default () => null;"}],
        "route": {"path": "/promos", "component": "pages/Promos"},
        "navItem": {"label": "Promos", "path": "/promos"},
        "schema": {"className": "Promo", "fields": {"title": "String"}}
    }"#;

    #[test]
    fn parses_bare_object() {
        let plan = GeneratePlan::parse(PLAN).unwrap();
        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.route.unwrap().path, "/promos");
        assert_eq!(plan.nav_item.unwrap().label, "Promos");
        assert_eq!(plan.schema.unwrap().class_name, "Promo");
    }

    #[test]
    fn parses_fenced_object_with_prose() {
        let reply = format!("Here is the page:\n```json\n{PLAN}\n```\nEnjoy!");
        let plan = GeneratePlan::parse(&reply).unwrap();
        assert_eq!(plan.plan, "A promo tracker");
    }

    #[test]
    fn optional_parts_may_be_absent() {
        let plan = GeneratePlan::parse(r#"{"plan": "tweak", "files": []}"#).unwrap();
        assert!(plan.route.is_none());
        assert!(plan.nav_item.is_none());
        assert!(plan.schema.is_none());
    }

    #[test]
    fn reply_without_json_is_invalid() {
        assert_matches!(
            GeneratePlan::parse("Sorry, I cannot help with that."),
            Err(ProxyError::InvalidPlan(_))
        );
    }

    #[test]
    fn malformed_json_is_invalid() {
        assert_matches!(
            GeneratePlan::parse(r#"{"plan": "x", "files": [}"#),
            Err(ProxyError::InvalidPlan(_))
        );
    }
}
