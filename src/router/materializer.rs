//! Menu tree -> route table.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::registry::{ComponentRegistry, APP_SHELL, NOT_FOUND_VIEW};
use super::{normalize_path, RouteRecord, Router, APP_ROUTE_NAME, CATCH_ALL_NAME, CATCH_ALL_PATH};
use crate::menu::MenuNode;

/// Menu entry left out because its component isn't registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub label: String,
    pub link: String,
    pub component_reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedRoutes {
    /// One route per resolvable menu entry, in menu order.
    pub children: Vec<RouteRecord>,
    /// Where `/` redirects when no entry links to `/` itself.
    pub default_redirect: Option<String>,
    pub skipped: Vec<SkippedEntry>,
}

/// Route name for a link path: `/admin/roles` -> `admin-roles`, `/` -> `home`.
pub fn route_name(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "home".to_string();
    }
    trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

/// Walk the menu depth-first and turn every resolvable route candidate into
/// a child route. Grouping nodes contribute their descendants; entries with
/// an unknown component are skipped with a warning. Child paths and names
/// are unique; the first entry claiming either wins.
pub fn materialize(menus: &[MenuNode], registry: &ComponentRegistry, empty_path: &str) -> MaterializedRoutes {
    let mut children = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_paths = HashSet::new();
    let mut seen_names = HashSet::new();

    for root in menus {
        root.walk(&mut |node| {
            let (Some(link), Some(reference)) = (node.link(), node.component()) else {
                return;
            };

            let Some(component) = registry.resolve(reference) else {
                warn!(
                    "Skipping menu entry '{}': component '{}' not found for {}",
                    node.label, reference, link
                );
                skipped.push(SkippedEntry {
                    label: node.label.clone(),
                    link: link.to_string(),
                    component_reference: reference.to_string(),
                });
                return;
            };

            let path = normalize_path(link);
            let name = route_name(&path);
            if seen_paths.contains(&path) || seen_names.contains(&name) {
                debug!(
                    "Menu entry '{}' repeats route {} ({}), keeping the first",
                    node.label, path, name
                );
                return;
            }
            seen_paths.insert(path.clone());
            seen_names.insert(name.clone());
            children.push(RouteRecord::page(path, name, component));
        });
    }

    let default_redirect = if children.iter().any(|r| r.path == "/") {
        None
    } else {
        Some(
            children
                .first()
                .map(|r| r.path.clone())
                .unwrap_or_else(|| empty_path.to_string()),
        )
    };

    MaterializedRoutes {
        children,
        default_redirect,
        skipped,
    }
}

/// Register the app shell at `/` with the materialized children, then the
/// catch-all. Re-installing replaces both records.
pub fn install(router: &mut Router, routes: MaterializedRoutes) {
    router.add_route(RouteRecord {
        redirect: routes.default_redirect,
        children: routes.children,
        ..RouteRecord::page("/", APP_ROUTE_NAME, APP_SHELL)
    });
    router.add_route(RouteRecord::page(CATCH_ALL_PATH, CATCH_ALL_NAME, NOT_FOUND_VIEW));
}
