//! Declarative route and navigation registry for the admin dashboard.
//!
//! The dashboard shell renders its router and sidebar from a JSON document
//! (`src/registry.json`). Generated pages are wired in by editing that
//! document structurally instead of patching source files.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A client-side route: URL path to page component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub path: String,
    /// Component module path relative to the dashboard `src/` directory.
    pub component: String,
}

/// A sidebar navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub label: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub nav: Vec<NavItem>,
}

/// Whether a route registration added a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    Replaced,
    Unchanged,
}

impl Registry {
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::Validation(format!("Invalid registry document: {e}")))
    }

    pub fn to_json_pretty(&self) -> String {
        // A struct of strings and vectors always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Register a route, replacing any entry with the same path.
    pub fn add_route(&mut self, route: RouteEntry) -> Result<Registration, CoreError> {
        validate_path(&route.path)?;
        if route.component.trim().is_empty() {
            return Err(CoreError::Validation(
                "Route component must not be empty".to_string(),
            ));
        }
        Ok(upsert(&mut self.routes, route, |r| r.path.as_str()))
    }

    /// Register a nav item, replacing any entry with the same path.
    pub fn add_nav_item(&mut self, item: NavItem) -> Result<Registration, CoreError> {
        validate_path(&item.path)?;
        if item.label.trim().is_empty() {
            return Err(CoreError::Validation(
                "Nav item label must not be empty".to_string(),
            ));
        }
        Ok(upsert(&mut self.nav, item, |n| n.path.as_str()))
    }
}

fn upsert<T: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &str) -> Registration {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(idx) if items[idx] == item => Registration::Unchanged,
        Some(idx) => {
            items[idx] = item;
            Registration::Replaced
        }
        None => {
            items.push(item);
            Registration::Added
        }
    }
}

fn validate_path(path: &str) -> Result<(), CoreError> {
    if !path.starts_with('/') || path.contains(char::is_whitespace) {
        return Err(CoreError::Validation(format!(
            "Route path must start with '/' and contain no whitespace (got {path:?})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn route(path: &str, component: &str) -> RouteEntry {
        RouteEntry {
            path: path.to_string(),
            component: component.to_string(),
        }
    }

    fn nav(label: &str, path: &str) -> NavItem {
        NavItem {
            label: label.to_string(),
            path: path.to_string(),
            icon: None,
            section: None,
        }
    }

    #[test]
    fn add_route_appends_new_path() {
        let mut reg = Registry::default();
        assert_eq!(
            reg.add_route(route("/promos", "pages/Promos")).unwrap(),
            Registration::Added
        );
        assert_eq!(reg.routes.len(), 1);
    }

    #[test]
    fn add_route_replaces_same_path() {
        let mut reg = Registry::default();
        reg.add_route(route("/promos", "pages/Promos")).unwrap();
        assert_eq!(
            reg.add_route(route("/promos", "pages/PromosV2")).unwrap(),
            Registration::Replaced
        );
        assert_eq!(reg.routes.len(), 1);
        assert_eq!(reg.routes[0].component, "pages/PromosV2");
    }

    #[test]
    fn re_adding_identical_route_is_unchanged() {
        let mut reg = Registry::default();
        reg.add_route(route("/promos", "pages/Promos")).unwrap();
        assert_eq!(
            reg.add_route(route("/promos", "pages/Promos")).unwrap(),
            Registration::Unchanged
        );
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let mut reg = Registry::default();
        assert_matches!(
            reg.add_route(route("promos", "pages/Promos")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            reg.add_nav_item(nav("Promos", "/pro mos")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_label_is_rejected() {
        let mut reg = Registry::default();
        assert_matches!(
            reg.add_nav_item(nav("  ", "/promos")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let mut reg = Registry::default();
        reg.add_route(route("/b", "pages/B")).unwrap();
        reg.add_route(route("/a", "pages/A")).unwrap();
        reg.add_nav_item(nav("B", "/b")).unwrap();
        let parsed = Registry::from_json(&reg.to_json_pretty()).unwrap();
        assert_eq!(parsed, reg);
        assert_eq!(parsed.routes[0].path, "/b");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let reg = Registry::from_json("{}").unwrap();
        assert!(reg.routes.is_empty());
        assert!(reg.nav.is_empty());
    }
}
