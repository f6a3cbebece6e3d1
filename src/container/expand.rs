use serde::Serialize;

use crate::error::Result;
use crate::measure::MeasurementProvider;
use crate::slot::{Expandable, Measurable};
use crate::surface::{Dimension, ElementId, ElementKind, ElementTree};

use super::core::BoxContainer;

/// Result of one expansion update along the primary axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpandOutcome {
    /// No distribution; children keep their natural size. `total` is the
    /// sum of slot extents and spacers.
    Natural { total: i32 },
    /// Expanding slots share what is left after `reserved`.
    Distributed { reserved: i32 },
}

/// Percentage share of each ratio, or `None` when the ratios do not sum to
/// a positive value.
pub fn distribute_ratios(ratios: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = ratios.iter().filter(|ratio| ratio.is_finite()).map(|r| r.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    Some(
        ratios
            .iter()
            .map(|ratio| {
                if ratio.is_finite() {
                    100.0 * ratio.max(0.0) / total
                } else {
                    0.0
                }
            })
            .collect(),
    )
}

impl BoxContainer {
    /// Recompute expansion along the primary axis.
    ///
    /// `allocated` is the inner primary size available to the slots, `None`
    /// when the container sizes itself to content.
    pub fn update_expand<M>(
        &mut self,
        tree: &mut ElementTree,
        provider: &mut M,
        allocated: Option<i32>,
    ) -> Result<ExpandOutcome>
    where
        M: MeasurementProvider + ?Sized,
    {
        let expanding: Vec<ElementId> = self
            .order
            .iter()
            .copied()
            .filter(|child| self.slots.get(child).is_some_and(|slot| slot.is_expanding()))
            .collect();
        let ratios: Vec<f64> = expanding
            .iter()
            .filter_map(|child| self.slots.get(child))
            .map(|slot| slot.expand_ratio())
            .collect();

        let shares = match allocated {
            Some(_) if !expanding.is_empty() => distribute_ratios(&ratios),
            _ => None,
        };
        match shares {
            Some(shares) => self.distribute(tree, provider, &expanding, &shares),
            None => self.clear_expand(tree, provider),
        }
    }

    fn ensure_wrapper(&mut self, tree: &mut ElementTree) -> Result<ElementId> {
        if let Some(wrapper) = self.expand_wrapper {
            return Ok(wrapper);
        }
        let wrapper = tree.create(ElementKind::ExpandWrapper);
        tree.add_class(wrapper, "expand")?;
        tree.set_flow(wrapper, self.orientation)?;
        tree.set_width(wrapper, Dimension::Percent(100.0))?;
        tree.set_height(wrapper, Dimension::Percent(100.0))?;
        let elements = tree.children(self.element)?.to_vec();
        tree.sync_children(wrapper, &elements)?;
        tree.append_child(self.element, wrapper)?;
        self.expand_wrapper = Some(wrapper);
        Ok(wrapper)
    }

    fn clear_expand<M>(&mut self, tree: &mut ElementTree, provider: &mut M) -> Result<ExpandOutcome>
    where
        M: MeasurementProvider + ?Sized,
    {
        let axis = self.orientation;
        if let Some(wrapper) = self.expand_wrapper.take() {
            let elements = tree.children(wrapper)?.to_vec();
            tree.sync_children(self.element, &elements)?;
            tree.remove(wrapper)?;
        }

        let mut total = 0;
        for child in &self.order {
            let Some(slot) = self.slots.get(child) else {
                continue;
            };
            tree.set_dimension(slot.element(), axis, Dimension::Auto)?;
            tree.set_margin(slot.element(), axis.start_side(), None)?;
            tree.set_hidden(slot.element(), false)?;
            total += slot.natural_extent(tree, &*provider, axis)?;
            total += slot.spacing_extent(tree, &*provider, axis)?;
        }
        Ok(ExpandOutcome::Natural { total })
    }

    fn distribute<M>(
        &mut self,
        tree: &mut ElementTree,
        provider: &mut M,
        expanding: &[ElementId],
        shares: &[f64],
    ) -> Result<ExpandOutcome>
    where
        M: MeasurementProvider + ?Sized,
    {
        let axis = self.orientation;
        let start = axis.start_side();
        let wrapper = self.ensure_wrapper(tree)?;
        let first = tree.first_child(wrapper)?;

        let mut reserved = 0;
        for child in &self.order {
            let Some(slot) = self.slots.get(child) else {
                continue;
            };
            reserved += slot.spacing_extent(tree, &*provider, axis)?;
            if first != Some(slot.element()) {
                tree.set_margin(slot.element(), start, None)?;
            }
            if slot.is_expanding() {
                continue;
            }
            if slot.is_relative_in(axis) {
                tree.set_dimension(slot.element(), axis, Dimension::Px(0))?;
                tree.set_hidden(slot.element(), true)?;
                continue;
            }
            tree.set_dimension(slot.element(), axis, Dimension::Auto)?;
            tree.set_hidden(slot.element(), false)?;
            reserved += slot.natural_extent(tree, &*provider, axis)?;
        }

        let previous = tree.style(wrapper)?.padding.get(start).unwrap_or(0);
        tree.set_padding(wrapper, start, Some(reserved))?;
        if let Some(first) = first {
            let margin = if reserved == 0 { None } else { Some(-reserved) };
            tree.set_margin(first, start, margin)?;
        }

        for (child, share) in expanding.iter().zip(shares) {
            let Some(slot) = self.slots.get(child) else {
                continue;
            };
            let share = Dimension::Percent(*share);
            if tree.style(slot.element())?.dimension(axis) != share {
                tree.set_dimension(slot.element(), axis, share)?;
                if slot.is_relative_in(axis) {
                    provider.set_needs_measure(self.element);
                }
            }
            tree.set_hidden(slot.element(), false)?;
            if previous != reserved {
                provider.set_needs_measure(slot.child());
            }
        }

        Ok(ExpandOutcome::Distributed { reserved })
    }
}
