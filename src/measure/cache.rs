use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::geometry::{Axis, Rect, Size};
use crate::surface::{ElementId, ElementTree, resolve};

use super::core::{MeasuredSize, MeasurementProvider};

/// Outer sizes a container reported for itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportedSize {
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Measurement provider backed by resolved surface geometry.
///
/// Re-measure and layout requests are deduplicated until taken.
#[derive(Debug, Default)]
pub struct MeasurementCache {
    measured: HashMap<ElementId, MeasuredSize>,
    reported: HashMap<ElementId, ReportedSize>,
    needs_measure: BTreeSet<ElementId>,
    layout_requested: bool,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, element: ElementId, measured: MeasuredSize) {
        self.measured.insert(element, measured);
    }

    pub fn invalidate(&mut self, element: ElementId) {
        self.measured.remove(&element);
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }

    /// Resolve the subtree under `root` and record every element's geometry.
    /// Satisfied re-measure requests are dropped.
    pub fn measure_tree(
        &mut self,
        tree: &ElementTree,
        root: ElementId,
        viewport: Size,
    ) -> Result<HashMap<ElementId, Rect>> {
        let rects = resolve(tree, root, viewport)?;
        for (id, rect) in &rects {
            let measured = MeasuredSize {
                size: rect.size(),
                border: tree.get(*id)?.border,
                padding: tree.computed_padding(*id)?,
                margin: tree.computed_margin(*id)?,
            };
            self.measured.insert(*id, measured);
            self.needs_measure.remove(id);
        }
        Ok(rects)
    }

    pub fn reported(&self, element: ElementId) -> Option<ReportedSize> {
        self.reported.get(&element).copied()
    }

    pub fn pending_measure(&self) -> impl Iterator<Item = &ElementId> {
        self.needs_measure.iter()
    }

    pub fn take_needs_measure(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.needs_measure).into_iter().collect()
    }

    pub fn layout_requested(&self) -> bool {
        self.layout_requested
    }

    /// Consume the pending layout request, if any.
    pub fn take_layout_request(&mut self) -> bool {
        std::mem::replace(&mut self.layout_requested, false)
    }

    fn record_report(&mut self, element: ElementId, axis: Axis, outer: i32) {
        let entry = self.reported.entry(element).or_default();
        match axis {
            Axis::Horizontal => entry.width = Some(outer),
            Axis::Vertical => entry.height = Some(outer),
        }
        if let Some(measured) = self.measured.get_mut(&element) {
            let border_box = (outer - measured.margin.along(axis)).max(0);
            measured.size.set_along(axis, border_box);
        }
    }
}

impl MeasurementProvider for MeasurementCache {
    fn measure(&self, element: ElementId) -> Option<MeasuredSize> {
        self.measured.get(&element).copied()
    }

    fn report_outer_width(&mut self, element: ElementId, outer_width: i32) {
        self.record_report(element, Axis::Horizontal, outer_width);
    }

    fn report_outer_height(&mut self, element: ElementId, outer_height: i32) {
        self.record_report(element, Axis::Vertical, outer_height);
    }

    fn set_needs_measure(&mut self, element: ElementId) {
        self.needs_measure.insert(element);
    }

    fn schedule_layout(&mut self) {
        self.layout_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edges, Side};
    use crate::surface::{Dimension, ElementKind};

    #[test]
    fn measure_tree_records_outer_and_inner_sizes() {
        let mut tree = ElementTree::new();
        let root = tree.create(ElementKind::Container);
        tree.set_width(root, Dimension::Px(100)).unwrap();
        tree.set_padding(root, Side::Left, Some(10)).unwrap();
        tree.set_border(root, Edges::uniform(1)).unwrap();
        let child = tree.create_widget(Size::new(20, 5));
        tree.set_margin(child, Side::Top, Some(4)).unwrap();
        tree.append_child(root, child).unwrap();

        let mut cache = MeasurementCache::new();
        cache
            .measure_tree(&tree, root, Size::new(800, 600))
            .unwrap();

        assert_eq!(cache.outer_width(root), Some(100));
        assert_eq!(cache.inner_width(root), Some(88));
        assert_eq!(cache.border_width(root), Some(2));
        assert_eq!(cache.padding_left(root), Some(10));
        assert_eq!(cache.outer_height(child), Some(9));
        assert_eq!(cache.margin_height(child), Some(4));
    }

    #[test]
    fn requests_are_deduplicated() {
        let mut tree = ElementTree::new();
        let id = tree.create(ElementKind::Widget);
        let mut cache = MeasurementCache::new();

        cache.set_needs_measure(id);
        cache.set_needs_measure(id);
        cache.schedule_layout();
        cache.schedule_layout();

        assert_eq!(cache.take_needs_measure(), vec![id]);
        assert!(cache.take_layout_request());
        assert!(!cache.take_layout_request());
        assert_eq!(cache.measure(id), None);
    }

    #[test]
    fn invalidated_entries_fall_back_to_raw_measurement() {
        let mut tree = ElementTree::new();
        let id = tree.create_widget(Size::new(30, 12));
        let mut cache = MeasurementCache::new();
        cache.insert(
            id,
            MeasuredSize {
                size: Size::new(99, 99),
                ..MeasuredSize::default()
            },
        );
        assert_eq!(cache.outer_width(id), Some(99));

        cache.invalidate(id);
        assert_eq!(cache.measure(id), None);
        let raw = crate::measure::measure_or_raw(&cache, &tree, id).unwrap();
        assert_eq!(raw.size, Size::new(30, 12));

        cache.insert(id, raw);
        cache.clear();
        assert_eq!(cache.measure(id), None);
    }

    #[test]
    fn reports_update_measured_size() {
        let mut tree = ElementTree::new();
        let root = tree.create(ElementKind::Container);
        let mut cache = MeasurementCache::new();
        cache.measure_tree(&tree, root, Size::new(10, 10)).unwrap();

        cache.report_outer_height(root, 42);
        assert_eq!(cache.outer_height(root), Some(42));
        assert_eq!(
            cache.reported(root),
            Some(ReportedSize {
                width: None,
                height: Some(42)
            })
        );
    }
}
