use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::geometry::{Axis, Edges, Side, Size};

use super::theme::Theme;

/// Handle of an element in an [`ElementTree`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of an element. The theme derives natural sizes of decoration
/// elements from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Widget,
    Container,
    Slot,
    Spacer,
    ExpandWrapper,
    CaptionWrap,
    Caption,
    CaptionText,
    Icon,
    RequiredIndicator,
    ErrorIndicator,
}

/// Requested size along one axis. Pixel and percent sizes describe the
/// border box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Dimension {
    #[default]
    Auto,
    Px(i32),
    Percent(f64),
}

impl Dimension {
    pub fn is_auto(&self) -> bool {
        matches!(self, Dimension::Auto)
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Dimension::Percent(_))
    }
}

/// Optional per-side pixel overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideValues {
    pub top: Option<i32>,
    pub right: Option<i32>,
    pub bottom: Option<i32>,
    pub left: Option<i32>,
}

impl SideValues {
    pub fn get(&self, side: Side) -> Option<i32> {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<i32> {
        match side {
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
        }
    }

    pub fn is_empty(&self) -> bool {
        Side::ALL.iter().all(|side| self.get(*side).is_none())
    }

    /// Resolve against defaults; unset sides take the default value.
    pub fn or(&self, defaults: Edges) -> Edges {
        let mut edges = defaults;
        for side in Side::ALL {
            if let Some(value) = self.get(side) {
                edges.set_side(side, value);
            }
        }
        edges
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Style {
    pub width: Dimension,
    pub height: Dimension,
    pub padding: SideValues,
    pub margin: SideValues,
}

impl Style {
    pub fn dimension(&self, axis: Axis) -> Dimension {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElementKind,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: Style,
    pub border: Edges,
    /// Axis children are stacked along.
    pub flow: Axis,
    /// Natural content size of widgets; decoration kinds use the theme.
    pub intrinsic: Option<Size>,
    pub text: Option<String>,
    pub hidden: bool,
}

impl Element {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            classes: BTreeSet::new(),
            attributes: BTreeMap::new(),
            style: Style::default(),
            border: Edges::ZERO,
            flow: Axis::Vertical,
            intrinsic: None,
            text: None,
            hidden: false,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

/// Serializable view of one element, used for fingerprints and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct ElementSnapshot {
    pub id: ElementId,
    pub kind: ElementKind,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: Style,
    pub hidden: bool,
    pub children: Vec<ElementId>,
}

/// Retained element arena the engine mutates.
///
/// Every mutator compares before writing; [`ElementTree::revision`] only
/// advances when something actually changed.
#[derive(Debug, Clone, Default)]
pub struct ElementTree {
    nodes: Vec<Option<Element>>,
    theme: Theme,
    revision: u64,
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create(&mut self, kind: ElementKind) -> ElementId {
        let id = ElementId(self.nodes.len() as u32);
        self.nodes.push(Some(Element::new(kind)));
        self.revision += 1;
        id
    }

    /// Create a leaf widget with a natural content size.
    pub fn create_widget(&mut self, intrinsic: Size) -> ElementId {
        let id = self.create(ElementKind::Widget);
        if let Some(Some(element)) = self.nodes.get_mut(id.0 as usize) {
            element.intrinsic = Some(intrinsic);
        }
        id
    }

    pub fn contains(&self, id: ElementId) -> bool {
        matches!(self.nodes.get(id.0 as usize), Some(Some(_)))
    }

    pub fn get(&self, id: ElementId) -> Result<&Element> {
        self.nodes
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(LayoutError::ElementNotFound(id))
    }

    fn node_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(LayoutError::ElementNotFound(id))
    }

    /// Apply `change`, which reports whether it modified the element.
    fn update<F>(&mut self, id: ElementId, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Element) -> bool,
    {
        let changed = change(self.node_mut(id)?);
        if changed {
            self.revision += 1;
        }
        Ok(changed)
    }

    pub fn parent(&self, id: ElementId) -> Result<Option<ElementId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: ElementId) -> Result<&[ElementId]> {
        Ok(&self.get(id)?.children)
    }

    pub fn first_child(&self, id: ElementId) -> Result<Option<ElementId>> {
        Ok(self.get(id)?.children.first().copied())
    }

    pub fn index_in_parent(&self, id: ElementId) -> Result<Option<usize>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        Ok(self.children(parent)?.iter().position(|child| *child == id))
    }

    /// True when `id` is `root` or one of its descendants.
    pub fn is_within(&self, id: ElementId, root: ElementId) -> Result<bool> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == root {
                return Ok(true);
            }
            cursor = self.parent(current)?;
        }
        Ok(false)
    }

    pub fn detach(&mut self, id: ElementId) -> Result<()> {
        let Some(parent) = self.parent(id)? else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|child| *child != id);
        self.node_mut(id)?.parent = None;
        self.revision += 1;
        Ok(())
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let len = self.children(parent)?.len();
        let already_last = self.parent(child)? == Some(parent)
            && self.children(parent)?.last() == Some(&child);
        if already_last {
            return Ok(());
        }
        let index = if self.parent(child)? == Some(parent) {
            len - 1
        } else {
            len
        };
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` among `parent`'s children, moving it if it
    /// already lives elsewhere. The index counts children after removal.
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> Result<()> {
        self.get(parent)?;
        if self.parent(child)? == Some(parent) && self.index_in_parent(child)? == Some(index) {
            return Ok(());
        }
        self.detach(child)?;
        let node = self.node_mut(parent)?;
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.revision += 1;
        Ok(())
    }

    /// Insert `element` immediately before `reference` in the reference's parent.
    pub fn insert_before(&mut self, reference: ElementId, element: ElementId) -> Result<()> {
        let Some(parent) = self.parent(reference)? else {
            return Ok(());
        };
        if self.parent(element)? == Some(parent) {
            let children = self.children(parent)?;
            let position = children.iter().position(|c| *c == element);
            let reference_position = children.iter().position(|c| *c == reference);
            if let (Some(position), Some(reference_position)) = (position, reference_position) {
                if position + 1 == reference_position {
                    return Ok(());
                }
            }
        }
        self.detach(element)?;
        let index = self
            .index_in_parent(reference)?
            .ok_or(LayoutError::NotAChild {
                parent,
                child: reference,
            })?;
        self.insert_child(parent, index, element)
    }

    /// Remove an element and its whole subtree.
    pub fn remove(&mut self, id: ElementId) -> Result<()> {
        self.detach(id)?;
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.nodes.get_mut(current.0 as usize) {
                if let Some(element) = slot.take() {
                    pending.extend(element.children);
                }
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Make `parent`'s children exactly `desired`, in order. Elements that
    /// drop out are detached, not destroyed.
    pub fn sync_children(&mut self, parent: ElementId, desired: &[ElementId]) -> Result<()> {
        if self.children(parent)? == desired {
            return Ok(());
        }
        let stale: Vec<ElementId> = self
            .children(parent)?
            .iter()
            .filter(|child| !desired.contains(child))
            .copied()
            .collect();
        for child in stale {
            self.detach(child)?;
        }
        for (index, child) in desired.iter().enumerate() {
            self.insert_child(parent, index, *child)?;
        }
        Ok(())
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) -> Result<()> {
        self.update(id, |element| element.classes.insert(class.to_string()))?;
        Ok(())
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) -> Result<()> {
        self.update(id, |element| element.classes.remove(class))?;
        Ok(())
    }

    pub fn set_class(&mut self, id: ElementId, class: &str, enabled: bool) -> Result<()> {
        if enabled {
            self.add_class(id, class)
        } else {
            self.remove_class(id, class)
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> Result<bool> {
        Ok(self.get(id)?.has_class(class))
    }

    /// Drop every class matching `predicate`.
    pub fn retain_classes<F>(&mut self, id: ElementId, mut predicate: F) -> Result<()>
    where
        F: FnMut(&str) -> bool,
    {
        self.update(id, |element| {
            let before = element.classes.len();
            element.classes.retain(|class| predicate(class));
            before != element.classes.len()
        })?;
        Ok(())
    }

    pub fn attribute(&self, id: ElementId, key: &str) -> Result<Option<&str>> {
        Ok(self.get(id)?.attributes.get(key).map(String::as_str))
    }

    pub fn set_attribute(&mut self, id: ElementId, key: &str, value: Option<&str>) -> Result<()> {
        self.update(id, |element| match value {
            Some(value) => {
                if element.attributes.get(key).map(String::as_str) == Some(value) {
                    false
                } else {
                    element.attributes.insert(key.to_string(), value.to_string());
                    true
                }
            }
            None => element.attributes.remove(key).is_some(),
        })?;
        Ok(())
    }

    pub fn style(&self, id: ElementId) -> Result<&Style> {
        Ok(&self.get(id)?.style)
    }

    pub fn set_dimension(&mut self, id: ElementId, axis: Axis, value: Dimension) -> Result<()> {
        self.update(id, |element| {
            let slot = match axis {
                Axis::Horizontal => &mut element.style.width,
                Axis::Vertical => &mut element.style.height,
            };
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        })?;
        Ok(())
    }

    pub fn set_width(&mut self, id: ElementId, value: Dimension) -> Result<()> {
        self.set_dimension(id, Axis::Horizontal, value)
    }

    pub fn set_height(&mut self, id: ElementId, value: Dimension) -> Result<()> {
        self.set_dimension(id, Axis::Vertical, value)
    }

    pub fn set_padding(&mut self, id: ElementId, side: Side, value: Option<i32>) -> Result<()> {
        self.update(id, |element| {
            let slot = element.style.padding.slot_mut(side);
            let changed = *slot != value;
            *slot = value;
            changed
        })?;
        Ok(())
    }

    pub fn set_margin(&mut self, id: ElementId, side: Side, value: Option<i32>) -> Result<()> {
        self.update(id, |element| {
            let slot = element.style.margin.slot_mut(side);
            let changed = *slot != value;
            *slot = value;
            changed
        })?;
        Ok(())
    }

    pub fn clear_padding(&mut self, id: ElementId) -> Result<()> {
        for side in Side::ALL {
            self.set_padding(id, side, None)?;
        }
        Ok(())
    }

    pub fn clear_margin(&mut self, id: ElementId) -> Result<()> {
        for side in Side::ALL {
            self.set_margin(id, side, None)?;
        }
        Ok(())
    }

    pub fn set_flow(&mut self, id: ElementId, flow: Axis) -> Result<()> {
        self.update(id, |element| {
            let changed = element.flow != flow;
            element.flow = flow;
            changed
        })?;
        Ok(())
    }

    pub fn set_intrinsic(&mut self, id: ElementId, size: Option<Size>) -> Result<()> {
        self.update(id, |element| {
            let changed = element.intrinsic != size;
            element.intrinsic = size;
            changed
        })?;
        Ok(())
    }

    pub fn set_text(&mut self, id: ElementId, text: Option<&str>) -> Result<()> {
        self.update(id, |element| {
            if element.text.as_deref() == text {
                false
            } else {
                element.text = text.map(str::to_string);
                true
            }
        })?;
        Ok(())
    }

    pub fn set_border(&mut self, id: ElementId, border: Edges) -> Result<()> {
        self.update(id, |element| {
            let changed = element.border != border;
            element.border = border;
            changed
        })?;
        Ok(())
    }

    pub fn set_hidden(&mut self, id: ElementId, hidden: bool) -> Result<()> {
        self.update(id, |element| {
            let changed = element.hidden != hidden;
            element.hidden = hidden;
            changed
        })?;
        Ok(())
    }

    /// Padding after theme rules: explicit overrides win, containers get the
    /// theme margin on each side flagged by a `margin-<side>` class.
    pub fn computed_padding(&self, id: ElementId) -> Result<Edges> {
        let element = self.get(id)?;
        let mut defaults = Edges::ZERO;
        if element.kind == ElementKind::Container {
            for side in Side::ALL {
                if element.has_class(margin_class(side)) {
                    defaults.set_side(side, self.theme.margin);
                }
            }
        }
        Ok(element.style.padding.or(defaults))
    }

    pub fn computed_margin(&self, id: ElementId) -> Result<Edges> {
        Ok(self.get(id)?.style.margin.or(Edges::ZERO))
    }

    /// Pre-order snapshot of the subtree rooted at `root`.
    pub fn snapshot(&self, root: ElementId) -> Result<Vec<ElementSnapshot>> {
        let mut out = Vec::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            let element = self.get(id)?;
            out.push(ElementSnapshot {
                id,
                kind: element.kind,
                classes: element.classes.iter().cloned().collect(),
                attributes: element.attributes.clone(),
                style: element.style.clone(),
                hidden: element.hidden,
                children: element.children.clone(),
            });
            pending.extend(element.children.iter().rev().copied());
        }
        Ok(out)
    }
}

/// Class flagging a container margin on `side`.
pub fn margin_class(side: Side) -> &'static str {
    match side {
        Side::Top => "margin-top",
        Side::Right => "margin-right",
        Side::Bottom => "margin-bottom",
        Side::Left => "margin-left",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_writes_keep_revision() {
        let mut tree = ElementTree::new();
        let id = tree.create(ElementKind::Widget);
        tree.add_class(id, "a").unwrap();
        tree.set_width(id, Dimension::Px(10)).unwrap();
        let revision = tree.revision();

        tree.add_class(id, "a").unwrap();
        tree.set_width(id, Dimension::Px(10)).unwrap();
        tree.set_padding(id, Side::Left, None).unwrap();
        assert_eq!(tree.revision(), revision);

        tree.set_width(id, Dimension::Percent(50.0)).unwrap();
        assert!(tree.revision() > revision);
    }

    #[test]
    fn insert_before_and_sync_children() {
        let mut tree = ElementTree::new();
        let parent = tree.create(ElementKind::Container);
        let a = tree.create(ElementKind::Widget);
        let b = tree.create(ElementKind::Widget);
        let c = tree.create(ElementKind::Widget);
        tree.append_child(parent, a).unwrap();
        tree.append_child(parent, b).unwrap();
        tree.insert_before(b, c).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[a, c, b]);

        tree.sync_children(parent, &[b, a]).unwrap();
        assert_eq!(tree.children(parent).unwrap(), &[b, a]);
        assert_eq!(tree.parent(c).unwrap(), None);
        assert!(tree.contains(c));
    }

    #[test]
    fn remove_drops_subtree() {
        let mut tree = ElementTree::new();
        let root = tree.create(ElementKind::Container);
        let wrap = tree.create(ElementKind::CaptionWrap);
        let caption = tree.create(ElementKind::Caption);
        tree.append_child(root, wrap).unwrap();
        tree.append_child(wrap, caption).unwrap();

        tree.remove(wrap).unwrap();
        assert!(!tree.contains(wrap));
        assert!(!tree.contains(caption));
        assert!(tree.children(root).unwrap().is_empty());
        assert_eq!(
            tree.get(caption).unwrap_err(),
            LayoutError::ElementNotFound(caption)
        );
    }

    #[test]
    fn container_margin_classes_become_padding() {
        let mut tree = ElementTree::with_theme(Theme {
            margin: 10,
            ..Theme::default()
        });
        let root = tree.create(ElementKind::Container);
        tree.add_class(root, margin_class(Side::Left)).unwrap();
        tree.set_padding(root, Side::Top, Some(3)).unwrap();
        assert_eq!(tree.computed_padding(root).unwrap(), Edges::new(3, 0, 0, 10));
    }
}
