use crate::error::Result;
use crate::geometry::Axis;
use crate::measure::{MeasurementProvider, measure_or_raw};
use crate::surface::{Dimension, ElementId, ElementKind, ElementTree};
use crate::width::is_blank;

use super::alignment::Alignment;
use super::caption::{CAPTION_POSITION_ATTR, CaptionParts, CaptionPosition, CaptionSpec, IconState};
use super::{Captionable, Expandable, Measurable};

/// Expand ratio of a slot that does not take part in expansion.
pub const NO_EXPAND: f64 = -1.0;

const NBSP: &str = "\u{a0}";
const ALIGN_CLASSES: [&str; 4] = ["align-center", "align-right", "align-middle", "align-bottom"];

/// Wrapper around one child of a box container.
///
/// A slot owns the slot element, the optional spacer placed before it and the
/// optional caption wrapper. The child element itself is only borrowed: it is
/// detached, never destroyed, when the slot goes away.
#[derive(Debug, Clone)]
pub struct Slot {
    child: ElementId,
    element: ElementId,
    spacer: Option<ElementId>,
    caption: Option<CaptionParts>,
    caption_position: CaptionPosition,
    explicit_position: bool,
    alignment: Alignment,
    expand_ratio: f64,
    relative_width: bool,
    relative_height: bool,
    style_names: Vec<String>,
}

impl Slot {
    pub(crate) fn new(tree: &mut ElementTree, child: ElementId) -> Result<Self> {
        tree.get(child)?;
        let element = tree.create(ElementKind::Slot);
        tree.add_class(element, "slot")?;
        tree.append_child(element, child)?;
        Ok(Self {
            child,
            element,
            spacer: None,
            caption: None,
            caption_position: CaptionPosition::default(),
            explicit_position: false,
            alignment: Alignment::default(),
            expand_ratio: NO_EXPAND,
            relative_width: false,
            relative_height: false,
            style_names: Vec::new(),
        })
    }

    pub fn child(&self) -> ElementId {
        self.child
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn spacer(&self) -> Option<ElementId> {
        self.spacer
    }

    pub fn has_caption(&self) -> bool {
        self.caption.is_some()
    }

    pub fn caption_wrap(&self) -> Option<ElementId> {
        self.caption.as_ref().map(|parts| parts.wrap)
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn has_relative_width(&self) -> bool {
        self.relative_width
    }

    pub fn has_relative_height(&self) -> bool {
        self.relative_height
    }

    pub fn style_names(&self) -> &[String] {
        &self.style_names
    }

    pub fn set_expand_ratio(&mut self, ratio: f64) {
        self.expand_ratio = if ratio.is_finite() && ratio >= 0.0 {
            ratio
        } else {
            NO_EXPAND
        };
    }

    pub fn set_alignment(&mut self, tree: &mut ElementTree, alignment: Alignment) -> Result<()> {
        self.alignment = alignment;
        let wanted = [alignment.horizontal_class(), alignment.vertical_class()];
        for class in ALIGN_CLASSES {
            tree.set_class(self.element, class, wanted.contains(&Some(class)))?;
        }
        Ok(())
    }

    /// Replace the extra `slot-<name>` classes of the slot element.
    pub fn set_style_names(&mut self, tree: &mut ElementTree, names: &[&str]) -> Result<()> {
        let classes: Vec<String> = names
            .iter()
            .map(|name| format!("slot-{name}"))
            .collect();
        tree.retain_classes(self.element, |class| {
            !class.starts_with("slot-") || classes.iter().any(|wanted| wanted == class)
        })?;
        for class in &classes {
            tree.add_class(self.element, class)?;
        }
        self.style_names = names.iter().map(|name| name.to_string()).collect();
        Ok(())
    }

    /// Create the spacer in front of the slot element, or destroy it.
    /// Callers pass `false` for the first slot.
    pub fn set_spacing(&mut self, tree: &mut ElementTree, enabled: bool) -> Result<()> {
        if enabled {
            let spacer = match self.spacer {
                Some(spacer) => spacer,
                None => {
                    let spacer = tree.create(ElementKind::Spacer);
                    tree.add_class(spacer, "spacing")?;
                    self.spacer = Some(spacer);
                    spacer
                }
            };
            tree.insert_before(self.element, spacer)?;
        } else if let Some(spacer) = self.spacer.take() {
            tree.remove(spacer)?;
        }
        Ok(())
    }

    /// Create, update or destroy the caption.
    pub fn set_caption(&mut self, tree: &mut ElementTree, spec: &CaptionSpec) -> Result<()> {
        let wanted = spec.needs_caption();
        let mut created = false;

        if wanted && self.caption.is_none() {
            let wrap = tree.create(ElementKind::CaptionWrap);
            tree.add_class(wrap, "has-caption")?;
            let caption = tree.create(ElementKind::Caption);
            tree.set_flow(caption, Axis::Horizontal)?;
            tree.append_child(self.element, wrap)?;
            tree.append_child(wrap, self.child)?;
            self.caption = Some(CaptionParts::new(wrap, caption));
            created = true;
        } else if !wanted {
            if let Some(parts) = self.caption.take() {
                tree.append_child(self.element, self.child)?;
                tree.remove(parts.wrap)?;
                self.caption_position = CaptionPosition::default();
                self.explicit_position = false;
            }
            return Ok(());
        }

        let Some(parts) = self.caption.as_mut() else {
            return Ok(());
        };

        match spec.text.as_deref() {
            Some(text) => {
                let id = match parts.text {
                    Some(id) => id,
                    None => {
                        let id = tree.create(ElementKind::CaptionText);
                        tree.add_class(id, "captiontext")?;
                        parts.text = Some(id);
                        id
                    }
                };
                let shown = if is_blank(text) { NBSP } else { text };
                tree.set_text(id, Some(shown))?;
            }
            None => {
                if let Some(id) = parts.text.take() {
                    tree.remove(id)?;
                }
            }
        }

        match spec.icon_url.as_deref() {
            Some(url) => {
                if parts.icon.is_none() {
                    let element = tree.create(ElementKind::Icon);
                    tree.add_class(element, "icon")?;
                    parts.icon = Some(IconState {
                        element,
                        url: String::new(),
                        loaded: false,
                    });
                }
                if let Some(icon) = parts.icon.as_mut() {
                    if icon.url != url {
                        icon.url = url.to_string();
                        icon.loaded = false;
                    }
                    tree.set_attribute(icon.element, "src", Some(url))?;
                }
            }
            None => {
                if let Some(icon) = parts.icon.take() {
                    tree.remove(icon.element)?;
                }
            }
        }

        sync_indicator(
            tree,
            &mut parts.required,
            spec.required,
            ElementKind::RequiredIndicator,
            "required-indicator",
            "*",
        )?;
        sync_indicator(
            tree,
            &mut parts.error,
            spec.shows_error(),
            ElementKind::ErrorIndicator,
            "error-indicator",
            "",
        )?;

        let order = parts.ordered();
        tree.sync_children(parts.caption, &order)?;

        let classes = spec.classes();
        tree.retain_classes(parts.caption, |class| classes.iter().any(|c| c == class))?;
        for class in &classes {
            tree.add_class(parts.caption, class)?;
        }

        let position = if self.explicit_position {
            self.caption_position
        } else if spec.has_label() {
            CaptionPosition::Top
        } else {
            CaptionPosition::Right
        };
        self.apply_caption_position(tree, position)?;

        if created {
            let (width, height) = (self.relative_width, self.relative_height);
            self.mirror_relative_size(tree, Axis::Horizontal, width)?;
            self.mirror_relative_size(tree, Axis::Vertical, height)?;
        }
        Ok(())
    }

    /// Pin the caption position. Ignored while there is no caption.
    pub fn set_caption_position(
        &mut self,
        tree: &mut ElementTree,
        position: CaptionPosition,
    ) -> Result<()> {
        if self.caption.is_none() {
            return Ok(());
        }
        self.explicit_position = true;
        self.apply_caption_position(tree, position)
    }

    fn apply_caption_position(
        &mut self,
        tree: &mut ElementTree,
        position: CaptionPosition,
    ) -> Result<()> {
        let Some(parts) = &self.caption else {
            return Ok(());
        };
        if self.caption_position != position {
            tree.remove_class(parts.wrap, self.caption_position.class())?;
        }
        self.caption_position = position;

        if position.is_before_child() {
            tree.insert_child(parts.wrap, 0, parts.caption)?;
        } else {
            tree.append_child(parts.wrap, parts.caption)?;
        }
        tree.set_flow(parts.wrap, position.axis())?;
        tree.add_class(parts.wrap, position.class())?;
        tree.set_attribute(parts.wrap, CAPTION_POSITION_ATTR, Some(position.as_str()))
    }

    pub fn set_relative_width(&mut self, tree: &mut ElementTree, relative: bool) -> Result<()> {
        self.relative_width = relative;
        self.mirror_relative_size(tree, Axis::Horizontal, relative)
    }

    pub fn set_relative_height(&mut self, tree: &mut ElementTree, relative: bool) -> Result<()> {
        self.relative_height = relative;
        self.mirror_relative_size(tree, Axis::Vertical, relative)
    }

    pub fn set_relative(
        &mut self,
        tree: &mut ElementTree,
        axis: Axis,
        relative: bool,
    ) -> Result<()> {
        match axis {
            Axis::Horizontal => self.set_relative_width(tree, relative),
            Axis::Vertical => self.set_relative_height(tree, relative),
        }
    }

    fn mirror_relative_size(
        &self,
        tree: &mut ElementTree,
        axis: Axis,
        relative: bool,
    ) -> Result<()> {
        let Some(parts) = &self.caption else {
            return Ok(());
        };
        let class = match axis {
            Axis::Horizontal => "has-width",
            Axis::Vertical => "has-height",
        };
        if relative {
            let dimension = tree.style(self.child)?.dimension(axis);
            tree.set_dimension(parts.wrap, axis, dimension)?;
            tree.add_class(parts.wrap, class)?;
        } else {
            tree.set_dimension(parts.wrap, axis, Dimension::Auto)?;
            tree.remove_class(parts.wrap, class)?;
            tree.clear_padding(parts.wrap)?;
            tree.clear_margin(parts.caption)?;
        }
        Ok(())
    }

    /// Signal that the caption icon finished loading. Only the first signal
    /// per icon URL schedules a layout pass.
    pub fn icon_loaded<M>(&mut self, provider: &mut M) -> bool
    where
        M: MeasurementProvider + ?Sized,
    {
        let Some(icon) = self.caption.as_mut().and_then(|parts| parts.icon.as_mut()) else {
            return false;
        };
        if icon.loaded {
            return false;
        }
        icon.loaded = true;
        provider.schedule_layout();
        true
    }

    /// Tear down every element the slot owns and hand the child back detached.
    pub(crate) fn destroy(&mut self, tree: &mut ElementTree) -> Result<()> {
        if let Some(spacer) = self.spacer.take() {
            tree.remove(spacer)?;
        }
        tree.detach(self.child)?;
        self.caption = None;
        tree.remove(self.element)
    }
}

fn sync_indicator(
    tree: &mut ElementTree,
    slot: &mut Option<ElementId>,
    wanted: bool,
    kind: ElementKind,
    class: &str,
    text: &str,
) -> Result<()> {
    match (wanted, *slot) {
        (true, None) => {
            let id = tree.create(kind);
            tree.add_class(id, class)?;
            tree.set_text(id, Some(text))?;
            *slot = Some(id);
        }
        (false, Some(id)) => {
            tree.remove(id)?;
            *slot = None;
        }
        _ => {}
    }
    Ok(())
}

impl Measurable for Slot {
    fn natural_extent<M>(&self, tree: &ElementTree, provider: &M, axis: Axis) -> Result<i32>
    where
        M: MeasurementProvider + ?Sized,
    {
        let child = measure_or_raw(provider, tree, self.child)?.outer(axis).max(0);
        let Some(parts) = &self.caption else {
            return Ok(child);
        };
        let caption = measure_or_raw(provider, tree, parts.caption)?
            .border_box(axis)
            .max(0);
        Ok(if self.caption_position.axis() == axis {
            child + caption
        } else {
            child.max(caption)
        })
    }

    fn spacing_extent<M>(&self, tree: &ElementTree, provider: &M, axis: Axis) -> Result<i32>
    where
        M: MeasurementProvider + ?Sized,
    {
        match self.spacer {
            Some(spacer) => Ok(measure_or_raw(provider, tree, spacer)?.outer(axis).max(0)),
            None => Ok(0),
        }
    }
}

impl Captionable for Slot {
    fn caption_element(&self) -> Option<ElementId> {
        self.caption.as_ref().map(|parts| parts.caption)
    }

    fn caption_position(&self) -> Option<CaptionPosition> {
        self.caption.as_ref().map(|_| self.caption_position)
    }
}

impl Expandable for Slot {
    fn expand_ratio(&self) -> f64 {
        self.expand_ratio
    }

    fn is_relative_in(&self, axis: Axis) -> bool {
        match axis {
            Axis::Horizontal => self.relative_width,
            Axis::Vertical => self.relative_height,
        }
    }
}
