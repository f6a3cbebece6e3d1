use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};

use crate::container::{BoxContainer, ExpandOutcome};
use crate::error::{LayoutError, Result};
use crate::geometry::Axis;
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::measure::MeasurementProvider;
use crate::metrics::LayoutMetrics;
use crate::slot::{Captionable, Expandable, Measurable};
use crate::surface::{Dimension, ElementId, ElementTree};

use super::audit::{LayoutAuditEventBuilder, LayoutAuditStage};
use super::caption::{clear_caption_offset, update_caption_offset};
use super::config::DriverConfig;

/// Where a container is within its layout cycle.
///
/// `PrimaryApplied` means the primary axis is laid out and the secondary axis
/// has not run since. A finished secondary axis returns the container to
/// `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPhase {
    #[default]
    Idle,
    PrimaryMeasuring,
    PrimaryApplied,
    SecondaryMeasuring,
    SecondaryApplied,
}

impl PassPhase {
    fn measuring(primary: bool) -> Self {
        if primary {
            PassPhase::PrimaryMeasuring
        } else {
            PassPhase::SecondaryMeasuring
        }
    }

    fn applied(primary: bool) -> Self {
        if primary {
            PassPhase::PrimaryApplied
        } else {
            PassPhase::SecondaryApplied
        }
    }
}

/// Outcome of a completed layout of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub container: ElementId,
    /// Outer width reported upward, if the width was laid out and
    /// content-driven.
    pub outer_width: Option<i32>,
    pub outer_height: Option<i32>,
    /// Digest of the container subtree after the pass.
    pub fingerprint: blake3::Hash,
    /// False when the subtree is identical to the previous pass.
    pub changed: bool,
}

impl PassReport {
    /// Fold a later report for the same container into this one.
    fn then(self, later: PassReport) -> PassReport {
        PassReport {
            container: later.container,
            outer_width: later.outer_width.or(self.outer_width),
            outer_height: later.outer_height.or(self.outer_height),
            fingerprint: later.fingerprint,
            changed: self.changed || later.changed,
        }
    }
}

#[derive(Debug, Default)]
struct PassState {
    phase: PassPhase,
    fingerprint: Option<blake3::Hash>,
}

/// Runs layout passes over box containers.
///
/// Each axis is laid out independently, so a scheduler may re-run only the
/// axis that went stale. An axis reports its outer size to the measurement
/// provider once its sizes are applied; nothing is reported while an axis is
/// still measuring or after it failed.
pub struct LayoutDriver {
    config: DriverConfig,
    passes: HashMap<ElementId, PassState>,
    started: Instant,
}

impl Default for LayoutDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutDriver {
    pub fn new() -> Self {
        Self::with_config(DriverConfig::default())
    }

    pub fn with_config(config: DriverConfig) -> Self {
        Self {
            config,
            passes: HashMap::new(),
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DriverConfig {
        &mut self.config
    }

    pub fn phase(&self, container: ElementId) -> PassPhase {
        self.passes
            .get(&container)
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    /// Number of containers with pass state.
    pub fn tracked(&self) -> usize {
        self.passes.len()
    }

    /// Drop the pass state of a container that is going away.
    pub fn forget(&mut self, container: ElementId) -> bool {
        self.passes.remove(&container).is_some()
    }

    /// Drop pass state for every container no longer in `tree`.
    pub fn prune(&mut self, tree: &ElementTree) -> usize {
        let before = self.passes.len();
        self.passes.retain(|element, _| tree.contains(*element));
        before - self.passes.len()
    }

    /// Lay out the width of `container`; primary or secondary depending on
    /// its orientation.
    pub fn layout_horizontally<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        self.layout_axis(container, tree, provider, Axis::Horizontal)
    }

    pub fn layout_vertically<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        self.layout_axis(container, tree, provider, Axis::Vertical)
    }

    pub fn layout_primary<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        let axis = container.orientation();
        self.layout_axis(container, tree, provider, axis)
    }

    pub fn layout_secondary<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        let axis = container.secondary_axis();
        self.layout_axis(container, tree, provider, axis)
    }

    /// Full pass: primary axis, then secondary axis.
    pub fn run_pass<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        let primary = self.layout_primary(container, tree, provider)?;
        let secondary = self.layout_secondary(container, tree, provider)?;
        Ok(primary.then(secondary))
    }

    /// Log a metrics snapshot if both a logger and metrics are configured.
    pub fn emit_metrics(&self) {
        let Some(logger) = self.config.logger.as_ref() else {
            return;
        };
        let Some(metrics) = self.config.metrics.as_ref() else {
            return;
        };
        if let Ok(guard) = metrics.lock() {
            let event = guard
                .snapshot(self.started.elapsed())
                .to_log_event(&self.config.log_target);
            let _ = logger.log_event(event);
        }
    }

    fn layout_axis<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
        axis: Axis,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        let element = container.element();
        let primary = axis == container.orientation();
        let measuring = PassPhase::measuring(primary);
        {
            let state = self.passes.entry(element).or_default();
            if state.phase == measuring {
                return Err(LayoutError::ReentrantLayout { element, axis });
            }
            state.phase = measuring;
        }
        let stage = if primary {
            LayoutAuditStage::PrimaryMeasuring
        } else {
            LayoutAuditStage::SecondaryMeasuring
        };
        self.audit(stage, element, [("axis", json!(axis.name()))]);
        self.with_metrics(LayoutMetrics::record_axis_layout);

        let outer = match self.apply_axis(container, tree, provider, axis, primary) {
            Ok(outer) => outer,
            Err(err) => {
                self.set_phase(element, PassPhase::Idle);
                let reason = err.to_string();
                self.audit(LayoutAuditStage::PassAborted, element, [("error", json!(reason))]);
                self.log(LogLevel::Warn, "layout_aborted", element, [json_kv("error", reason)]);
                return Err(err);
            }
        };

        self.set_phase(element, PassPhase::applied(primary));
        let stage = if primary {
            LayoutAuditStage::PrimaryApplied
        } else {
            LayoutAuditStage::SecondaryApplied
        };
        self.audit(stage, element, [("axis", json!(axis.name())), ("outer", json!(outer))]);
        self.log(
            LogLevel::Debug,
            "axis_applied",
            element,
            [json_kv("axis", axis.name()), json_kv("outer", json!(outer))],
        );

        self.finish_pass(tree, provider, element, axis, outer)
    }

    fn set_phase(&mut self, element: ElementId, phase: PassPhase) {
        self.passes.entry(element).or_default().phase = phase;
    }

    fn apply_axis<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
        axis: Axis,
        primary: bool,
    ) -> Result<Option<i32>>
    where
        M: MeasurementProvider + ?Sized,
    {
        let outer = if primary {
            self.layout_primary_axis(container, tree, provider, axis)?
        } else {
            self.layout_secondary_axis(container, tree, provider, axis)?
        };
        self.update_captions(container, tree, &*provider, axis)?;
        Ok(outer)
    }

    fn layout_primary_axis<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
        axis: Axis,
    ) -> Result<Option<i32>>
    where
        M: MeasurementProvider + ?Sized,
    {
        let element = container.element();
        let chrome = chrome(tree, element, axis)?;

        if container.defined_primary_size() {
            let declared = container.declared(axis);
            tree.set_dimension(element, axis, declared)?;
            let allocated = provider
                .measure(element)
                .map(|measured| measured.inner(axis))
                .or(match declared {
                    Dimension::Px(px) => Some((px - chrome).max(0)),
                    _ => None,
                })
                .unwrap_or(0);
            let outcome = container.update_expand(tree, provider, Some(allocated))?;
            if let ExpandOutcome::Distributed { reserved } = outcome {
                self.with_metrics(LayoutMetrics::record_expansion);
                self.log(
                    LogLevel::Trace,
                    "expansion_distributed",
                    element,
                    [json_kv("reserved", reserved), json_kv("allocated", allocated)],
                );
            }
            return Ok(None);
        }

        let total = match container.update_expand(tree, provider, None)? {
            ExpandOutcome::Natural { total } => total,
            ExpandOutcome::Distributed { reserved } => reserved,
        };
        let outer = total + chrome;
        tree.set_dimension(element, axis, Dimension::Px(outer))?;
        Ok(Some(outer))
    }

    fn layout_secondary_axis<M>(
        &mut self,
        container: &mut BoxContainer,
        tree: &mut ElementTree,
        provider: &mut M,
        axis: Axis,
    ) -> Result<Option<i32>>
    where
        M: MeasurementProvider + ?Sized,
    {
        let element = container.element();
        for slot in container.slots() {
            let dimension = if slot.is_relative_in(axis) {
                Dimension::Percent(100.0)
            } else {
                Dimension::Auto
            };
            tree.set_dimension(slot.element(), axis, dimension)?;
        }

        if container.is_defined(axis) {
            tree.set_dimension(element, axis, container.declared(axis))?;
            return Ok(None);
        }

        let needs_size = container
            .slots()
            .any(|slot| slot.is_relative_in(axis) || slot.alignment().is_off_start(axis));
        if !needs_size {
            tree.set_dimension(element, axis, Dimension::Auto)?;
            return Ok(None);
        }

        // Relative children only size the container when nothing else does.
        let mut fixed: Option<i32> = None;
        let mut relative: Option<i32> = None;
        for slot in container.slots() {
            let extent = slot.natural_extent(tree, &*provider, axis)?;
            let bucket = if slot.is_relative_in(axis) {
                &mut relative
            } else {
                &mut fixed
            };
            *bucket = Some(bucket.map_or(extent, |current| current.max(extent)));
        }
        let outer = fixed.or(relative).unwrap_or(0) + chrome(tree, element, axis)?;
        tree.set_dimension(element, axis, Dimension::Px(outer))?;
        Ok(Some(outer))
    }

    fn update_captions<M>(
        &self,
        container: &BoxContainer,
        tree: &mut ElementTree,
        provider: &M,
        axis: Axis,
    ) -> Result<()>
    where
        M: MeasurementProvider + ?Sized,
    {
        for slot in container.slots() {
            let Some(caption) = slot.caption_element() else {
                continue;
            };
            let Some(position) = slot.caption_position() else {
                continue;
            };
            if position.axis() != axis {
                continue;
            }
            if slot.is_relative_in(axis) {
                if update_caption_offset(tree, provider, caption)? > 0 {
                    self.with_metrics(LayoutMetrics::record_caption_offset);
                }
            } else {
                clear_caption_offset(tree, caption)?;
            }
        }
        Ok(())
    }

    fn finish_pass<M>(
        &mut self,
        tree: &ElementTree,
        provider: &mut M,
        element: ElementId,
        axis: Axis,
        outer: Option<i32>,
    ) -> Result<PassReport>
    where
        M: MeasurementProvider + ?Sized,
    {
        if let Some(outer) = outer {
            provider.report_outer(element, axis, outer);
        }
        let fingerprint = fingerprint(tree, element)?;
        let state = self.passes.entry(element).or_default();
        let changed = state.fingerprint != Some(fingerprint);
        state.fingerprint = Some(fingerprint);
        if state.phase == PassPhase::SecondaryApplied {
            state.phase = PassPhase::Idle;
        }

        let mut report = PassReport {
            container: element,
            outer_width: None,
            outer_height: None,
            fingerprint,
            changed,
        };
        match axis {
            Axis::Horizontal => report.outer_width = outer,
            Axis::Vertical => report.outer_height = outer,
        }

        let count = usize::from(outer.is_some());
        self.with_metrics(|metrics| {
            metrics.record_pass(changed);
            metrics.record_reports(count);
        });
        self.audit(
            LayoutAuditStage::PassCompleted,
            element,
            [("axis", json!(axis.name())), ("changed", json!(changed)), ("reports", json!(count))],
        );
        self.log(
            LogLevel::Debug,
            "pass_completed",
            element,
            [
                json_kv("axis", axis.name()),
                json_kv("changed", changed),
                json_kv("outer", json!(outer)),
                json_kv("fingerprint", fingerprint.to_hex().to_string()),
            ],
        );
        Ok(report)
    }

    fn audit<const N: usize>(
        &self,
        stage: LayoutAuditStage,
        element: ElementId,
        details: [(&str, Value); N],
    ) {
        let mut builder = LayoutAuditEventBuilder::new(stage, element);
        for (key, value) in details {
            builder.detail(key, value);
        }
        self.config.audit.record(builder.finish());
    }

    fn log<const N: usize>(
        &self,
        level: LogLevel,
        message: &str,
        element: ElementId,
        fields: [(String, Value); N],
    ) {
        let Some(logger) = self.config.logger.as_ref() else {
            return;
        };
        if !logger.enabled(level) {
            return;
        }
        let fields = std::iter::once(json_kv("container", element.to_string())).chain(fields);
        let event = event_with_fields(level, &self.config.log_target, message, fields);
        let _ = logger.log_event(event);
    }

    fn with_metrics<F>(&self, update: F)
    where
        F: FnOnce(&mut LayoutMetrics),
    {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }
}

/// Border plus padding of `element` along `axis`.
fn chrome(tree: &ElementTree, element: ElementId, axis: Axis) -> Result<i32> {
    Ok(tree.get(element)?.border.along(axis) + tree.computed_padding(element)?.along(axis))
}

/// blake3 digest of the serialized subtree snapshot.
pub fn fingerprint(tree: &ElementTree, root: ElementId) -> Result<blake3::Hash> {
    let snapshot = tree.snapshot(root)?;
    let bytes =
        serde_json::to_vec(&snapshot).map_err(|err| LayoutError::Snapshot(err.to_string()))?;
    Ok(blake3::hash(&bytes))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::driver::audit::RecordingAudit;
    use crate::geometry::{Rect, Side, Size};
    use crate::logging::{Logger, MemorySink};
    use crate::measure::MeasurementCache;
    use crate::container::Margins;
    use crate::slot::{Alignment, CaptionSpec, HorizontalAlign, NO_EXPAND, VerticalAlign};
    use crate::surface::resolve;

    const VIEWPORT: Size = Size::new(1000, 1000);

    fn row(tree: &mut ElementTree, sizes: &[(i32, i32)]) -> (BoxContainer, Vec<ElementId>) {
        let mut container = BoxContainer::horizontal(tree).unwrap();
        let mut children = Vec::new();
        for (index, (width, height)) in sizes.iter().enumerate() {
            let child = tree.create_widget(Size::new(*width, *height));
            container.add_or_move_slot(tree, child, index).unwrap();
            children.push(child);
        }
        (container, children)
    }

    fn slot_rects(tree: &ElementTree, container: &BoxContainer) -> Vec<Rect> {
        let rects = resolve(tree, container.element(), VIEWPORT).unwrap();
        container.slots().map(|slot| rects[&slot.element()]).collect()
    }

    #[test]
    fn intrinsic_pass_reports_natural_primary_size() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let (mut container, _) = row(&mut tree, &[(40, 10), (60, 20), (30, 15)]);
        container.set_spacing(&mut tree, true).unwrap();
        container
            .set_margins(&mut tree, Margins::new(false, true, false, true))
            .unwrap();

        let report = LayoutDriver::new()
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        let margin = tree.theme().margin;
        let spacing = tree.theme().spacing;
        let expected = 40 + 60 + 30 + 2 * spacing + 2 * margin;
        assert_eq!(report.outer_width, Some(expected));
        assert_eq!(report.outer_height, None);
        assert_eq!(cache.reported(container.element()).unwrap().width, Some(expected));
        assert_eq!(
            tree.style(container.element()).unwrap().width,
            Dimension::Px(expected)
        );
        assert_eq!(tree.style(container.element()).unwrap().height, Dimension::Auto);
    }

    #[test]
    fn intrinsic_size_round_trips_through_a_fixed_copy() {
        let sizes = [(40, 10), (60, 20), (30, 15)];
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();

        let (mut intrinsic, _) = row(&mut tree, &sizes);
        intrinsic.set_spacing(&mut tree, true).unwrap();
        intrinsic.set_margins(&mut tree, Margins::ALL).unwrap();
        let report = driver
            .run_pass(&mut intrinsic, &mut tree, &mut cache)
            .unwrap();
        let width = report.outer_width.unwrap();

        let (mut fixed, _) = row(&mut tree, &sizes);
        fixed.set_spacing(&mut tree, true).unwrap();
        fixed.set_margins(&mut tree, Margins::ALL).unwrap();
        fixed.set_width(&mut tree, Dimension::Px(width)).unwrap();
        let fixed_report = driver.run_pass(&mut fixed, &mut tree, &mut cache).unwrap();
        assert_eq!(fixed_report.outer_width, None);

        assert_eq!(slot_rects(&tree, &intrinsic), slot_rects(&tree, &fixed));
    }

    #[test]
    fn repeated_passes_are_idempotent() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut container, children) = row(&mut tree, &[(50, 20), (50, 20), (50, 20)]);
        container.set_spacing(&mut tree, true).unwrap();
        container.set_expand_ratio(children[1], 2.0).unwrap();
        container.set_expand_ratio(children[2], 1.0).unwrap();
        container.set_width(&mut tree, Dimension::Px(300)).unwrap();
        container
            .set_caption(&mut tree, children[0], &CaptionSpec::text("First"))
            .unwrap();

        let first = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(first.changed);
        let revision = tree.revision();

        let second = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(!second.changed);
        assert_eq!(second.fingerprint, first.fingerprint);
        assert_eq!(tree.revision(), revision);

        container.set_expand_ratio(children[2], 2.0).unwrap();
        let third = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(third.changed);
    }

    #[test]
    fn expansion_example_distributes_leftover_width() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let (mut container, children) = row(&mut tree, &[(50, 20), (10, 20), (10, 20)]);
        container.set_spacing(&mut tree, true).unwrap();
        container.set_expand_ratio(children[0], -1.0).unwrap();
        container.set_expand_ratio(children[1], 2.0).unwrap();
        container.set_expand_ratio(children[2], 1.0).unwrap();
        container.set_width(&mut tree, Dimension::Px(300)).unwrap();

        LayoutDriver::new()
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        cache
            .measure_tree(&tree, container.element(), VIEWPORT)
            .unwrap();

        let widths: Vec<Option<i32>> = container
            .slots()
            .map(|slot| {
                cache
                    .measure(slot.element())
                    .map(|measured| measured.border_box(Axis::Horizontal))
            })
            .collect();
        assert_eq!(widths, vec![Some(50), Some(156), Some(78)]);
        assert_eq!(cache.outer_width(container.element()), Some(300));
    }

    #[test]
    fn single_axis_passes_report_every_time() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut container, children) = row(&mut tree, &[(10, 10), (20, 10)]);
        let element = container.element();

        let first = driver
            .layout_horizontally(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(first.outer_width, Some(30));
        assert_eq!(first.outer_height, None);
        assert_eq!(cache.reported(element).unwrap().width, Some(30));
        assert_eq!(driver.phase(element), PassPhase::PrimaryApplied);

        tree.set_intrinsic(children[1], Some(Size::new(35, 10)))
            .unwrap();
        let second = driver
            .layout_horizontally(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(second.changed);
        assert_eq!(second.outer_width, Some(45));
        assert_eq!(cache.reported(element).unwrap().width, Some(45));

        let third = driver
            .layout_horizontally(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(!third.changed);
        assert_eq!(third.fingerprint, second.fingerprint);

        driver
            .layout_vertically(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(driver.phase(element), PassPhase::Idle);
        let again = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(again.outer_width, Some(45));
    }

    #[test]
    fn axis_still_measuring_is_rejected() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut container, _) = row(&mut tree, &[(10, 10)]);
        let element = container.element();
        driver.set_phase(element, PassPhase::PrimaryMeasuring);

        assert_eq!(
            driver
                .layout_horizontally(&mut container, &mut tree, &mut cache)
                .unwrap_err(),
            LayoutError::ReentrantLayout {
                element,
                axis: Axis::Horizontal
            }
        );
        assert_eq!(cache.reported(element), None);

        let report = driver
            .layout_vertically(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(report.outer_width, None);
    }

    #[test]
    fn pass_state_is_dropped_for_removed_containers() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut kept, _) = row(&mut tree, &[(10, 10)]);
        let (mut dropped, _) = row(&mut tree, &[(10, 10)]);
        driver.run_pass(&mut kept, &mut tree, &mut cache).unwrap();
        driver
            .run_pass(&mut dropped, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(driver.tracked(), 2);

        tree.remove(dropped.element()).unwrap();
        assert_eq!(driver.prune(&tree), 1);
        assert_eq!(driver.tracked(), 1);

        assert!(driver.forget(kept.element()));
        assert!(!driver.forget(kept.element()));
        assert_eq!(driver.tracked(), 0);
    }

    #[test]
    fn column_expands_along_height() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let mut container = BoxContainer::vertical(&mut tree).unwrap();
        let mut children = Vec::new();
        for (index, height) in [50, 10, 10].into_iter().enumerate() {
            let child = tree.create_widget(Size::new(20, height));
            container.add_or_move_slot(&mut tree, child, index).unwrap();
            children.push(child);
        }
        container.set_spacing(&mut tree, true).unwrap();
        container
            .set_caption(&mut tree, children[0], &CaptionSpec::text("Name"))
            .unwrap();
        let line = tree.theme().line_height;
        let spacing = tree.theme().spacing;

        let intrinsic = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(intrinsic.outer_height, Some(50 + line + 10 + 10 + 2 * spacing));
        assert_eq!(intrinsic.outer_width, None);
        assert_eq!(tree.style(container.element()).unwrap().width, Dimension::Auto);

        container.set_expand_ratio(children[1], 2.0).unwrap();
        container.set_expand_ratio(children[2], 1.0).unwrap();
        container.set_height(&mut tree, Dimension::Px(300)).unwrap();
        let report = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(report.outer_height, None);

        let first = 50 + line;
        let left = 300 - first - 2 * spacing;
        let spans: Vec<(i32, i32)> = slot_rects(&tree, &container)
            .iter()
            .map(|rect| (rect.y, rect.height))
            .collect();
        assert_eq!(
            spans,
            vec![
                (0, first),
                (first + spacing, left * 2 / 3),
                (first + 2 * spacing + left * 2 / 3, left / 3),
            ]
        );
        let wrapper = container.expand_wrapper().unwrap();
        assert_eq!(tree.style(wrapper).unwrap().padding.top, Some(first + 2 * spacing));
    }

    #[test]
    fn ratio_toggle_restores_fingerprint() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut container, children) = row(&mut tree, &[(50, 20), (10, 20), (10, 20)]);
        container.set_spacing(&mut tree, true).unwrap();
        container.set_width(&mut tree, Dimension::Px(300)).unwrap();

        let before = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(container.expand_wrapper().is_none());

        container.set_expand_ratio(children[1], 1.0).unwrap();
        let expanded = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(expanded.changed);
        assert!(container.expand_wrapper().is_some());

        container.set_expand_ratio(children[1], NO_EXPAND).unwrap();
        let after = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert!(after.changed);
        assert!(container.expand_wrapper().is_none());
        assert_eq!(after.fingerprint, before.fingerprint);
    }

    #[test]
    fn relative_cross_children_use_fixed_extent() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let mut driver = LayoutDriver::new();
        let (mut container, children) = row(&mut tree, &[(10, 20), (10, 40)]);
        tree.set_height(children[1], Dimension::Percent(100.0))
            .unwrap();
        container.refresh_relative_sizes(&mut tree).unwrap();

        let report = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(report.outer_height, Some(20));
        let relative_slot = container.slot(children[1]).unwrap().element();
        assert_eq!(
            tree.style(relative_slot).unwrap().height,
            Dimension::Percent(100.0)
        );

        let rects = resolve(&tree, container.element(), VIEWPORT).unwrap();
        assert_eq!(rects[&children[1]].height, 20);
    }

    #[test]
    fn off_start_alignment_sizes_the_cross_axis() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let (mut container, children) = row(&mut tree, &[(10, 20), (10, 40)]);
        container
            .set_alignment(
                &mut tree,
                children[0],
                Alignment::new(HorizontalAlign::Left, VerticalAlign::Middle),
            )
            .unwrap();

        let report = LayoutDriver::new()
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        assert_eq!(report.outer_height, Some(40));
    }

    #[test]
    fn relative_child_below_top_caption_is_offset() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let (mut container, children) = row(&mut tree, &[(60, 10)]);
        container.set_height(&mut tree, Dimension::Px(100)).unwrap();
        container
            .set_caption(&mut tree, children[0], &CaptionSpec::text("Label"))
            .unwrap();
        tree.set_height(children[0], Dimension::Percent(100.0))
            .unwrap();
        container.refresh_relative_sizes(&mut tree).unwrap();

        LayoutDriver::new()
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();

        let line = tree.theme().line_height;
        let slot = container.slot(children[0]).unwrap();
        let wrap = slot.caption_wrap().unwrap();
        let caption = slot.caption_element().unwrap();
        assert_eq!(tree.style(wrap).unwrap().padding.get(Side::Top), Some(line));
        assert_eq!(tree.style(caption).unwrap().margin.get(Side::Top), Some(-line));

        let rects = resolve(&tree, container.element(), VIEWPORT).unwrap();
        assert_eq!(rects[&caption].y, 0);
        assert_eq!(rects[&children[0]].y, line);
        assert_eq!(rects[&children[0]].height, 100 - line);
    }

    #[test]
    fn pass_emits_audit_log_and_metrics() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let audit = Arc::new(RecordingAudit::new());
        let sink = Arc::new(MemorySink::new());
        let mut config = DriverConfig::default()
            .with_logger(Logger::from_shared(sink.clone()))
            .with_audit(audit.clone());
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        let mut driver = LayoutDriver::with_config(config);
        let (mut container, _) = row(&mut tree, &[(10, 10), (20, 10)]);

        driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap();
        driver.emit_metrics();

        assert_eq!(
            &audit.stages()[..6],
            &[
                LayoutAuditStage::PrimaryMeasuring,
                LayoutAuditStage::PrimaryApplied,
                LayoutAuditStage::PassCompleted,
                LayoutAuditStage::SecondaryMeasuring,
                LayoutAuditStage::SecondaryApplied,
                LayoutAuditStage::PassCompleted,
            ]
        );
        let messages = sink.messages();
        assert!(messages.iter().any(|message| message == "pass_completed"));
        assert_eq!(messages.last().map(String::as_str), Some("layout_metrics"));
        assert!(
            sink.events()
                .iter()
                .all(|event| event.target == "slotbox::driver")
        );

        let snapshot = metrics.lock().unwrap().snapshot(std::time::Duration::ZERO);
        assert_eq!(snapshot.passes, 4);
        assert_eq!(snapshot.unchanged_passes, 3);
        assert_eq!(snapshot.axis_layouts, 4);
        assert_eq!(snapshot.reports, 2);
    }

    #[test]
    fn failed_axis_aborts_the_pass() {
        let mut tree = ElementTree::new();
        let mut cache = MeasurementCache::new();
        let audit = Arc::new(RecordingAudit::new());
        let config = DriverConfig::default().with_audit(audit.clone());
        let mut driver = LayoutDriver::with_config(config);
        let (mut container, children) = row(&mut tree, &[(10, 10)]);
        container
            .set_caption(&mut tree, children[0], &CaptionSpec::text("Name"))
            .unwrap();
        container
            .set_caption_position(&mut tree, children[0], crate::slot::CaptionPosition::Left)
            .unwrap();
        tree.set_width(children[0], Dimension::Percent(100.0))
            .unwrap();
        container.refresh_relative_sizes(&mut tree).unwrap();
        let wrap = container.slot(children[0]).unwrap().caption_wrap().unwrap();
        tree.set_attribute(wrap, crate::slot::CAPTION_POSITION_ATTR, None)
            .unwrap();

        let err = driver
            .run_pass(&mut container, &mut tree, &mut cache)
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownCaptionPosition(_)));
        assert_eq!(driver.phase(container.element()), PassPhase::Idle);
        assert_eq!(audit.stages().last(), Some(&LayoutAuditStage::PassAborted));
    }
}
