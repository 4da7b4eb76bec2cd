//! Compile-time registry of view components, keyed by canonical virtual path.

use std::collections::BTreeMap;
use std::fmt;

/// Canonical prefix every view path is normalized to.
pub const VIEWS_ROOT: &str = "/src/views/";

/// A loadable view, identified by its canonical virtual path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component(&'static str);

impl Component {
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &'static str {
        self.0
    }

    /// File stem, e.g. `Items` for `/src/views/business/Items.vue`.
    pub fn name(&self) -> &'static str {
        let file = self.0.rsplit('/').next().unwrap_or(self.0);
        file.split('.').next().unwrap_or(file)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Authenticated app shell hosting every materialized route.
pub const APP_SHELL: Component = Component::new("/src/layout/AppLayout.vue");

pub const NOT_FOUND_VIEW: Component = Component::new("/src/views/pages/NotFound.vue");

/// Every view shipped with the console.
pub const BUILTIN_VIEWS: &[&str] = &[
    "/src/views/Dashboard.vue",
    "/src/views/business/Items.vue",
    "/src/views/business/Groups.vue",
    "/src/views/business/Applications.vue",
    "/src/views/business/Tasks.vue",
    "/src/views/business/TaskExecutions.vue",
    "/src/views/pages/Profile.vue",
    "/src/views/pages/Empty.vue",
    "/src/views/pages/Crud.vue",
    "/src/views/pages/Documentation.vue",
    "/src/views/pages/Landing.vue",
    "/src/views/pages/NotFound.vue",
    "/src/views/pages/admin/Celery.vue",
    "/src/views/pages/admin/Users.vue",
    "/src/views/pages/admin/Settings.vue",
    "/src/views/pages/admin/Roles.vue",
    "/src/views/pages/admin/Menus.vue",
    "/src/views/pages/admin/Apis.vue",
    "/src/views/pages/auth/Login.vue",
    "/src/views/pages/auth/Register.vue",
    "/src/views/pages/auth/ForgotPassword.vue",
    "/src/views/pages/auth/ResetPassword.vue",
    "/src/views/pages/auth/Access.vue",
    "/src/views/pages/auth/Error.vue",
    "/src/views/utilities/Blocks.vue",
    "/src/views/uikit/FormLayout.vue",
    "/src/views/uikit/InputDoc.vue",
    "/src/views/uikit/ButtonDoc.vue",
    "/src/views/uikit/TableDoc.vue",
    "/src/views/uikit/ListDoc.vue",
    "/src/views/uikit/TreeDoc.vue",
    "/src/views/uikit/PanelsDoc.vue",
    "/src/views/uikit/OverlayDoc.vue",
    "/src/views/uikit/MediaDoc.vue",
    "/src/views/uikit/MessagesDoc.vue",
    "/src/views/uikit/FileDoc.vue",
    "/src/views/uikit/MenuDoc.vue",
    "/src/views/uikit/ChartDoc.vue",
    "/src/views/uikit/MiscDoc.vue",
    "/src/views/uikit/TimelineDoc.vue",
];

/// Normalize a component reference to its canonical virtual path.
///
/// Accepted spellings for the same view:
/// `@/views/business/Items.vue`, `views/business/Items.vue`,
/// `/src/views/business/Items.vue`, `src/views/business/Items.vue` and
/// `business/Items.vue`; a missing `.vue` extension is added. References that
/// try to leave the views tree return `None`.
pub fn normalize(reference: &str) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut rest = trimmed.replace('\\', "/");
    for prefix in ["@/views/", "/src/views/", "src/views/", "views/", "/"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped.to_string();
            break;
        }
    }

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == ".." || *s == ".") {
        return None;
    }

    let mut path = format!("{}{}", VIEWS_ROOT, segments.join("/"));
    let has_extension = segments
        .last()
        .map_or(false, |file| file.contains('.'));
    if !has_extension {
        path.push_str(".vue");
    }
    Some(path)
}

/// Read-only mapping from canonical path to component.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<&'static str, Component>,
}

impl ComponentRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::from_paths(BUILTIN_VIEWS.iter().copied())
    }

    pub fn from_paths(paths: impl IntoIterator<Item = &'static str>) -> Self {
        let mut registry = Self::empty();
        for path in paths {
            registry.register(Component::new(path));
        }
        registry
    }

    pub fn register(&mut self, component: Component) {
        self.components.insert(component.path(), component);
    }

    /// Look up a reference in any accepted spelling. Pure lookup; unknown
    /// references are `None`.
    pub fn resolve(&self, reference: &str) -> Option<Component> {
        let canonical = normalize(reference)?;
        self.components.get(canonical.as_str()).copied()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.resolve(reference).is_some()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
