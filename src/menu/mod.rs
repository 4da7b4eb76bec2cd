//! Navigation menu tree as delivered by `GET /users/me/menu`.

use serde::{Deserialize, Deserializer, Serialize};

/// One node of the per-user navigation tree.
///
/// Nodes with both a link path and a component reference are route
/// candidates; everything else only groups its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuNode {
    #[serde(default)]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "to", alias = "link_path")]
    pub link_path: Option<String>,
    /// External link, rendered as-is and never routed.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, rename = "component", alias = "component_reference")]
    pub component_reference: Option<String>,
    #[serde(default)]
    pub clazz: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, rename = "items", alias = "children", deserialize_with = "null_as_empty")]
    pub children: Vec<MenuNode>,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MenuNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MenuNode>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MenuNode {
    pub fn group(id: impl Into<String>, label: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            link_path: None,
            url: None,
            target: None,
            component_reference: None,
            clazz: None,
            is_hidden: false,
            parent_id: None,
            children,
            visible: true,
        }
    }

    pub fn page(
        id: impl Into<String>,
        label: impl Into<String>,
        link_path: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            link_path: Some(link_path.into()),
            component_reference: Some(component.into()),
            ..Self::group(id, label, Vec::new())
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Link path, if present and non-empty.
    pub fn link(&self) -> Option<&str> {
        self.link_path.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// Component reference, if present and non-empty.
    pub fn component(&self) -> Option<&str> {
        self.component_reference.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Has both a link target and a component reference. Whether the
    /// component actually resolves is the registry's call.
    pub fn is_route_candidate(&self) -> bool {
        self.link().is_some() && self.component().is_some()
    }

    /// Depth-first, pre-order visit of this node and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MenuNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Depth-first, pre-order list of every node in the forest.
pub fn flatten(nodes: &[MenuNode]) -> Vec<&MenuNode> {
    let mut out = Vec::new();
    for node in nodes {
        node.walk(&mut |n| out.push(n));
    }
    out
}

/// Derive `visible = !is_hidden` on every node, recursively.
pub fn apply_visibility(nodes: Vec<MenuNode>) -> Vec<MenuNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.visible = !node.is_hidden;
            node.children = apply_visibility(std::mem::take(&mut node.children));
            node
        })
        .collect()
}

/// Entries every user sees, authenticated or not, ahead of the
/// server-delivered tree.
pub fn public_menu() -> Vec<MenuNode> {
    vec![MenuNode::group(
        "home",
        "Home",
        vec![MenuNode::page("dashboard", "Dashboard", "/", "Dashboard.vue").with_icon("pi pi-fw pi-home")],
    )
    .with_icon("pi pi-fw pi-home")]
}

/// Public entries followed by the server tree with visibility applied.
pub fn merge_with_public(server: Vec<MenuNode>) -> Vec<MenuNode> {
    let mut menus = public_menu();
    menus.extend(apply_visibility(server));
    menus
}

/// Indented text rendering of the visible part of a menu forest.
pub fn render_tree(nodes: &[MenuNode]) -> String {
    fn render(out: &mut String, node: &MenuNode, depth: usize) {
        if !node.visible {
            return;
        }
        out.push_str(&"  ".repeat(depth));
        out.push_str(&node.label);
        if let Some(link) = node.link() {
            out.push_str(" -> ");
            out.push_str(link);
        } else if let Some(url) = node.url.as_deref() {
            out.push_str(" -> ");
            out.push_str(url);
        }
        out.push('\n');
        for child in &node.children {
            render(out, child, depth + 1);
        }
    }

    let mut out = String::new();
    for node in nodes {
        render(&mut out, node, 0);
    }
    out
}
