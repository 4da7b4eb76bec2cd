//! Route table: fixed public routes plus the routes materialized from the
//! user's menu after authentication.

pub mod materializer;
pub mod registry;
pub mod static_routes;

pub use materializer::{install, materialize, MaterializedRoutes, SkippedEntry};
pub use registry::{Component, ComponentRegistry, APP_SHELL, NOT_FOUND_VIEW};
pub use static_routes::static_routes;

/// Wildcard path matching anything no other route matches.
pub const CATCH_ALL_PATH: &str = "/:pathMatch(.*)*";
pub const CATCH_ALL_NAME: &str = "catch-all";
pub const APP_ROUTE_NAME: &str = "app";

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub component: Option<Component>,
    pub redirect: Option<String>,
    pub children: Vec<RouteRecord>,
    /// Reachable without authentication.
    pub public: bool,
}

impl RouteRecord {
    /// Route that requires an authenticated session.
    pub fn page(path: impl Into<String>, name: impl Into<String>, component: Component) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: Some(component),
            redirect: None,
            children: Vec::new(),
            public: false,
        }
    }

    pub fn public(path: impl Into<String>, name: impl Into<String>, component: Component) -> Self {
        Self {
            public: true,
            ..Self::page(path, name, component)
        }
    }

    pub fn is_catch_all(&self) -> bool {
        self.path == CATCH_ALL_PATH
    }

    fn child_path(&self, child: &RouteRecord) -> String {
        if child.path.starts_with('/') {
            normalize_path(&child.path)
        } else if child.path.is_empty() {
            normalize_path(&self.path)
        } else {
            normalize_path(&format!("{}/{}", self.path.trim_end_matches('/'), child.path))
        }
    }
}

/// Outcome of matching a path against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub path: String,
    /// Matched records from outermost (layout) to innermost.
    pub matched: Vec<RouteRecord>,
}

impl Resolved {
    pub fn leaf(&self) -> &RouteRecord {
        // matched is never empty; Router::resolve only builds non-empty chains
        &self.matched[self.matched.len() - 1]
    }

    pub fn name(&self) -> &str {
        &self.leaf().name
    }

    pub fn component(&self) -> Option<Component> {
        self.leaf().component
    }

    pub fn redirect(&self) -> Option<&str> {
        self.leaf().redirect.as_deref()
    }

    pub fn is_public(&self) -> bool {
        self.leaf().public
    }

    pub fn is_catch_all(&self) -> bool {
        self.leaf().is_catch_all()
    }
}

/// Strip query and fragment, force a leading slash, drop a trailing one.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("").trim();
    let mut out = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        out.push('/');
    }
    out.push_str(path);
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct Router {
    records: Vec<RouteRecord>,
}

impl Router {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }

    /// Table holding only the public routes.
    pub fn with_static_routes() -> Self {
        Self::new(static_routes())
    }

    /// Register a top-level record. A record with the same name or path is
    /// replaced in place, so registering twice leaves one entry.
    pub fn add_route(&mut self, record: RouteRecord) {
        let existing = self
            .records
            .iter()
            .position(|r| r.name == record.name || r.path == record.path);
        match existing {
            Some(pos) => {
                self.records
                    .retain(|r| r.name != record.name && r.path != record.path);
                self.records.insert(pos.min(self.records.len()), record);
            }
            None => self.records.push(record),
        }
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    /// Match `path`. Explicit routes win over the catch-all; a parent whose
    /// path matches but has no default child resolves to the parent itself
    /// so its redirect applies.
    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        let path = normalize_path(path);

        for record in self.records.iter().filter(|r| !r.is_catch_all()) {
            for child in &record.children {
                if record.child_path(child) == path {
                    return Some(Resolved {
                        path,
                        matched: vec![record.clone(), child.clone()],
                    });
                }
            }
            if normalize_path(&record.path) == path {
                return Some(Resolved {
                    path,
                    matched: vec![record.clone()],
                });
            }
        }

        self.records
            .iter()
            .find(|r| r.is_catch_all())
            .map(|record| Resolved {
                path,
                matched: vec![record.clone()],
            })
    }

    /// Every routable leaf as `(full path, name, component)`, in table order.
    pub fn flat_routes(&self) -> Vec<(String, String, Option<Component>)> {
        let mut out = Vec::new();
        for record in &self.records {
            if record.children.is_empty() {
                out.push((record.path.clone(), record.name.clone(), record.component));
            }
            for child in &record.children {
                out.push((record.child_path(child), child.name.clone(), child.component));
            }
        }
        out
    }
}
