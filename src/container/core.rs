use std::collections::{HashMap, HashSet};

use crate::error::{LayoutError, Result};
use crate::geometry::{Axis, Side};
use crate::measure::MeasurementProvider;
use crate::slot::{Alignment, CaptionPosition, CaptionSpec, Slot};
use crate::surface::{Dimension, ElementId, ElementKind, ElementTree, margin_class};

use super::margins::Margins;

/// Ordered-axis box container.
///
/// Owns one [`Slot`] per managed child, keyed by the child's id. Slot order
/// always matches child order; moving a child reuses its slot.
#[derive(Debug, Clone)]
pub struct BoxContainer {
    pub(super) element: ElementId,
    pub(super) orientation: Axis,
    pub(super) slots: HashMap<ElementId, Slot>,
    pub(super) order: Vec<ElementId>,
    spacing: bool,
    margins: Margins,
    width: Dimension,
    height: Dimension,
    pub(super) expand_wrapper: Option<ElementId>,
}

impl BoxContainer {
    /// Create the container element. `orientation` is the stacking axis.
    pub fn new(tree: &mut ElementTree, orientation: Axis) -> Result<Self> {
        let element = tree.create(ElementKind::Container);
        tree.set_flow(element, orientation)?;
        tree.add_class(element, orientation.name())?;
        Ok(Self {
            element,
            orientation,
            slots: HashMap::new(),
            order: Vec::new(),
            spacing: false,
            margins: Margins::NONE,
            width: Dimension::Auto,
            height: Dimension::Auto,
            expand_wrapper: None,
        })
    }

    pub fn horizontal(tree: &mut ElementTree) -> Result<Self> {
        Self::new(tree, Axis::Horizontal)
    }

    pub fn vertical(tree: &mut ElementTree) -> Result<Self> {
        Self::new(tree, Axis::Vertical)
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn orientation(&self) -> Axis {
        self.orientation
    }

    pub fn secondary_axis(&self) -> Axis {
        self.orientation.cross()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Managed children in slot order.
    pub fn children(&self) -> &[ElementId] {
        &self.order
    }

    pub fn slot(&self, child: ElementId) -> Option<&Slot> {
        self.slots.get(&child)
    }

    /// Slots in order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.order.iter().filter_map(|child| self.slots.get(child))
    }

    pub fn expand_wrapper(&self) -> Option<ElementId> {
        self.expand_wrapper
    }

    pub fn spacing(&self) -> bool {
        self.spacing
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Size declared by the owner along `axis`, independent of what a layout
    /// pass applied.
    pub fn declared(&self, axis: Axis) -> Dimension {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    pub fn is_defined(&self, axis: Axis) -> bool {
        !self.declared(axis).is_auto()
    }

    /// True when the owner fixed the primary size; expansion then governs
    /// the primary axis instead of content.
    pub fn defined_primary_size(&self) -> bool {
        self.is_defined(self.orientation)
    }

    /// Element slot elements currently live in.
    pub(crate) fn slot_parent(&self) -> ElementId {
        self.expand_wrapper.unwrap_or(self.element)
    }

    pub(crate) fn slot_mut(&mut self, child: ElementId) -> Result<&mut Slot> {
        self.slots
            .get_mut(&child)
            .ok_or(LayoutError::NoSuchSlot(child))
    }

    /// Add `child` at `index`, or move its existing slot there.
    pub fn add_or_move_slot(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        index: usize,
    ) -> Result<()> {
        let len = self.order.len();
        match self.order.iter().position(|managed| *managed == child) {
            Some(current) => {
                if current == index {
                    return Ok(());
                }
                if index >= len {
                    return Err(LayoutError::InvalidIndex { index, len });
                }
                self.order.remove(current);
                self.order.insert(index, child);
            }
            None => {
                if index > len {
                    return Err(LayoutError::InvalidIndex { index, len });
                }
                let slot = Slot::new(tree, child)?;
                self.slots.insert(child, slot);
                self.order.insert(index, child);
            }
        }
        self.place_slots(tree)
    }

    /// Destroy the slot of `child`; the child itself is detached and kept.
    pub fn remove_slot_for_child(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
    ) -> Result<Slot> {
        let mut slot = self
            .slots
            .remove(&child)
            .ok_or(LayoutError::NoSuchSlot(child))?;
        self.order.retain(|managed| *managed != child);
        slot.destroy(tree)?;
        self.place_slots(tree)?;
        Ok(slot)
    }

    /// Make the managed children exactly `children`, in order. Slots of
    /// retained children are reused; the rest are removed.
    pub fn sync_children(&mut self, tree: &mut ElementTree, children: &[ElementId]) -> Result<()> {
        let mut seen = HashSet::new();
        let desired: Vec<ElementId> = children
            .iter()
            .copied()
            .filter(|child| seen.insert(*child))
            .collect();

        let stale: Vec<ElementId> = self
            .order
            .iter()
            .copied()
            .filter(|child| !seen.contains(child))
            .collect();
        for child in stale {
            if let Some(mut slot) = self.slots.remove(&child) {
                slot.destroy(tree)?;
            }
        }

        let spacing = self.spacing;
        self.spacing = false;
        self.order.clear();
        for child in &desired {
            if !self.slots.contains_key(child) {
                let slot = Slot::new(tree, *child)?;
                self.slots.insert(*child, slot);
            }
            self.order.push(*child);
        }
        self.place_slots(tree)?;
        self.spacing = spacing;
        self.place_slots(tree)
    }

    /// Bring spacers and slot element order in line with `order`.
    pub(super) fn place_slots(&mut self, tree: &mut ElementTree) -> Result<()> {
        let parent = self.slot_parent();
        let mut desired = Vec::with_capacity(self.order.len() * 2);
        for (index, child) in self.order.iter().enumerate() {
            let Some(slot) = self.slots.get_mut(child) else {
                continue;
            };
            slot.set_spacing(tree, self.spacing && index > 0)?;
            desired.extend(slot.spacer());
            desired.push(slot.element());
        }
        tree.sync_children(parent, &desired)
    }

    pub fn set_spacing(&mut self, tree: &mut ElementTree, enabled: bool) -> Result<()> {
        self.spacing = enabled;
        tree.set_class(self.element, "spacing", enabled)?;
        self.place_slots(tree)
    }

    pub fn set_margins(&mut self, tree: &mut ElementTree, margins: Margins) -> Result<()> {
        self.margins = margins;
        for side in Side::ALL {
            tree.set_class(self.element, margin_class(side), margins.is_enabled(side))?;
        }
        Ok(())
    }

    pub fn set_width(&mut self, tree: &mut ElementTree, width: Dimension) -> Result<()> {
        self.width = width;
        tree.set_width(self.element, width)
    }

    pub fn set_height(&mut self, tree: &mut ElementTree, height: Dimension) -> Result<()> {
        self.height = height;
        tree.set_height(self.element, height)
    }

    pub fn set_alignment(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        alignment: Alignment,
    ) -> Result<()> {
        self.slot_mut(child)?.set_alignment(tree, alignment)
    }

    pub fn set_expand_ratio(&mut self, child: ElementId, ratio: f64) -> Result<()> {
        self.slot_mut(child)?.set_expand_ratio(ratio);
        Ok(())
    }

    pub fn set_caption(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        spec: &CaptionSpec,
    ) -> Result<()> {
        self.slot_mut(child)?.set_caption(tree, spec)
    }

    pub fn set_caption_position(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        position: CaptionPosition,
    ) -> Result<()> {
        self.slot_mut(child)?.set_caption_position(tree, position)
    }

    pub fn set_relative_width(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        relative: bool,
    ) -> Result<()> {
        self.slot_mut(child)?.set_relative_width(tree, relative)
    }

    pub fn set_relative_height(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        relative: bool,
    ) -> Result<()> {
        self.slot_mut(child)?.set_relative_height(tree, relative)
    }

    /// Derive every slot's relative-size flags from its child's style.
    pub fn refresh_relative_sizes(&mut self, tree: &mut ElementTree) -> Result<()> {
        for child in &self.order {
            let Some(slot) = self.slots.get_mut(child) else {
                continue;
            };
            let style = tree.style(*child)?.clone();
            slot.set_relative_width(tree, style.width.is_relative())?;
            slot.set_relative_height(tree, style.height.is_relative())?;
        }
        Ok(())
    }

    pub fn set_slot_style_names(
        &mut self,
        tree: &mut ElementTree,
        child: ElementId,
        names: &[&str],
    ) -> Result<()> {
        self.slot_mut(child)?.set_style_names(tree, names)
    }

    /// Forward an icon load of `child`'s caption; see [`Slot::icon_loaded`].
    pub fn icon_loaded<M>(&mut self, child: ElementId, provider: &mut M) -> Result<bool>
    where
        M: MeasurementProvider + ?Sized,
    {
        Ok(self.slot_mut(child)?.icon_loaded(provider))
    }
}
