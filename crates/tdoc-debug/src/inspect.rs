//! Widget graph inspection
//!
//! A host exposes its live widgets through [`Inspectable`]; [`WidgetTree::walk`]
//! turns that graph into a flat snapshot keyed by synthetic names. Failures on one
//! node are logged and the walk carries on with what it could read.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::InspectError;

/// Read-only reflection over one live widget
pub trait Inspectable {
    /// Concrete type name (`Button`, `Screen`)
    fn type_name(&self) -> &str;

    /// Stable identity of the instance for the session
    fn identity(&self) -> u64;

    /// DOM id
    ///
    /// # Errors
    /// [`InspectError::Attribute`] when the attribute cannot be read.
    fn dom_id(&self) -> Result<Option<String>, InspectError> {
        Ok(None)
    }

    /// CSS classes
    ///
    /// # Errors
    /// [`InspectError::Attribute`] when the attribute cannot be read.
    fn classes(&self) -> Result<Vec<String>, InspectError> {
        Ok(Vec::new())
    }

    /// Whether the widget is displayed
    fn is_visible(&self) -> bool {
        true
    }

    /// Size in cells
    fn size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Direct children in display order
    ///
    /// # Errors
    /// [`InspectError::Children`] when the child sequence cannot be read.
    fn children(&self) -> Result<Vec<&dyn Inspectable>, InspectError>;
}

/// Snapshot of one widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetInfo {
    /// Synthetic key, `<type>_<identity>`
    pub name: String,
    /// Type name
    pub widget_type: String,
    /// DOM id
    pub id: Option<String>,
    /// CSS classes, deduplicated, in order read
    pub classes: Vec<String>,
    /// Parent key; `None` for roots
    pub parent: Option<String>,
    /// Child keys in display order
    pub children: Vec<String>,
    /// Size in cells
    pub size: Option<(u32, u32)>,
    /// Displayed
    pub visible: bool,
}

impl WidgetInfo {
    /// Create root snapshot with no attributes
    #[must_use]
    pub fn new(widget_type: impl Into<String>, identity: u64) -> Self {
        let widget_type = widget_type.into();
        Self {
            name: format!("{widget_type}_{identity}"),
            widget_type,
            id: None,
            classes: Vec::new(),
            parent: None,
            children: Vec::new(),
            size: None,
            visible: true,
        }
    }

    /// With DOM id
    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// With classes; duplicates dropped
    #[must_use]
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = String>) -> Self {
        for class in classes {
            if !self.classes.contains(&class) {
                self.classes.push(class);
            }
        }
        self
    }

    /// With parent key
    #[must_use]
    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }
}

/// Flat widget snapshot forming a forest
///
/// Every `parent` names a node in the same tree, and a node's `children` are exactly
/// the nodes naming it as parent, in insertion order. [`WidgetTree::add`] maintains
/// both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetTree {
    nodes: Vec<WidgetInfo>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl WidgetTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the graph below `root`
    ///
    /// Instances already visited are skipped, so shared or cyclic references
    /// cannot loop.
    #[must_use]
    pub fn walk(root: &dyn Inspectable) -> Self {
        let mut tree = Self::new();
        let mut visited = HashSet::new();
        tree.visit(root, None, &mut visited);
        tracing::debug!("walked {} widget(s)", tree.len());
        tree
    }

    fn visit(
        &mut self,
        node: &dyn Inspectable,
        parent: Option<&str>,
        visited: &mut HashSet<u64>,
    ) {
        if !visited.insert(node.identity()) {
            tracing::warn!(
                "{}_{} reached twice; skipping",
                node.type_name(),
                node.identity()
            );
            return;
        }

        let id = node.dom_id().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            None
        });
        let classes = node.classes().unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Vec::new()
        });

        let mut info = WidgetInfo::new(node.type_name(), node.identity())
            .with_id(id)
            .with_classes(classes)
            .with_parent(parent.map(str::to_string));
        info.size = node.size();
        info.visible = node.is_visible();

        let name = info.name.clone();
        if self.add(info).is_none() {
            return;
        }

        match node.children() {
            Ok(children) => {
                for child in children {
                    self.visit(child, Some(&name), visited);
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    /// Insert a node, linking it under its parent
    ///
    /// A parent not in the tree is dropped and the node becomes a root. Returns the
    /// node's position, or `None` when the name is already taken.
    pub fn add(&mut self, mut info: WidgetInfo) -> Option<usize> {
        if self.index.contains_key(&info.name) {
            tracing::warn!("duplicate widget name {}; skipping", info.name);
            return None;
        }

        info.children.clear();
        let parent_idx = info.parent.as_ref().and_then(|p| self.index.get(p).copied());
        if parent_idx.is_none() {
            info.parent = None;
        }

        let idx = self.nodes.len();
        if let Some(p) = parent_idx {
            self.nodes[p].children.push(info.name.clone());
        }
        self.index.insert(info.name.clone(), idx);
        self.nodes.push(info);
        Some(idx)
    }

    /// Number of widgets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All widgets in insertion order
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[WidgetInfo] {
        &self.nodes
    }

    /// Widget by key
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&WidgetInfo> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Widgets without a parent
    #[must_use]
    pub fn roots(&self) -> Vec<&WidgetInfo> {
        self.nodes.iter().filter(|n| n.parent.is_none()).collect()
    }

    /// Direct children of `name`
    #[must_use]
    pub fn children_of(&self, name: &str) -> Vec<&WidgetInfo> {
        self.get(name)
            .map(|n| n.children.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default()
    }

    /// Ancestors of `name`; 0 for roots
    #[must_use]
    pub fn depth_of(&self, name: &str) -> usize {
        let mut depth = 0;
        let mut current = self.get(name).and_then(|n| n.parent.as_deref());
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).and_then(|n| n.parent.as_deref());
        }
        depth
    }

    /// Deepest nesting below any root; 0 when empty
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| self.depth_of(&n.name))
            .max()
            .unwrap_or(0)
    }
}
