use std::collections::HashMap;

use crate::error::Result;
use crate::geometry::{Axis, Rect, Size};

use super::tree::{Dimension, ElementId, ElementTree};

/// Resolve the subtree rooted at `root` into border-box rectangles keyed by
/// element id. Root percentages resolve against `viewport`.
pub fn resolve(
    tree: &ElementTree,
    root: ElementId,
    viewport: Size,
) -> Result<HashMap<ElementId, Rect>> {
    let style = tree.style(root)?;
    let definite = (
        is_definite(style.width, true),
        is_definite(style.height, true),
    );
    let width = sized(tree, root, Axis::Horizontal, viewport.width, true)?;
    let height = sized(tree, root, Axis::Vertical, viewport.height, true)?;
    let margin = tree.computed_margin(root)?;

    let mut rects = HashMap::new();
    solve_node(
        tree,
        root,
        Rect::new(margin.left, margin.top, width, height),
        definite,
        &mut rects,
    )?;
    Ok(rects)
}

/// Content-driven border-box size of an element. Percentages count as auto.
pub fn natural_size(tree: &ElementTree, id: ElementId) -> Result<Size> {
    let parent_flow = match tree.parent(id)? {
        Some(parent) => Some(tree.get(parent)?.flow),
        None => None,
    };
    natural(tree, id, parent_flow)
}

/// `percent` of `base`, rounded to whole pixels.
pub fn percent_of(percent: f64, base: i32) -> i32 {
    (base as f64 * percent / 100.0).round() as i32
}

fn natural(tree: &ElementTree, id: ElementId, parent_flow: Option<Axis>) -> Result<Size> {
    let element = tree.get(id)?;
    let content = if element.children.is_empty() {
        tree.theme().leaf_size(element, parent_flow)
    } else {
        let flow = element.flow;
        let cross = flow.cross();
        let mut main_extent = 0;
        let mut cross_extent = 0;
        for child in &element.children {
            let margin = tree.computed_margin(*child)?;
            let size = natural(tree, *child, Some(flow))?;
            main_extent += margin.start(flow) + size.along(flow) + margin.end(flow);
            cross_extent =
                cross_extent.max(margin.start(cross) + size.along(cross) + margin.end(cross));
        }
        let mut size = Size::default();
        size.set_along(flow, main_extent.max(0));
        size.set_along(cross, cross_extent.max(0));
        size
    };

    let padding = tree.computed_padding(id)?;
    let mut size = Size::default();
    for axis in [Axis::Horizontal, Axis::Vertical] {
        let value = match element.style.dimension(axis) {
            Dimension::Px(px) => px.max(0),
            _ => content.along(axis) + padding.along(axis) + element.border.along(axis),
        };
        size.set_along(axis, value);
    }
    Ok(size)
}

fn sized(
    tree: &ElementTree,
    id: ElementId,
    axis: Axis,
    base: i32,
    base_definite: bool,
) -> Result<i32> {
    Ok(match tree.style(id)?.dimension(axis) {
        Dimension::Px(px) => px.max(0),
        Dimension::Percent(percent) if base_definite => percent_of(percent, base).max(0),
        _ => natural_size(tree, id)?.along(axis),
    })
}

fn is_definite(dimension: Dimension, base_definite: bool) -> bool {
    match dimension {
        Dimension::Auto => false,
        Dimension::Px(_) => true,
        Dimension::Percent(_) => base_definite,
    }
}

fn solve_node(
    tree: &ElementTree,
    id: ElementId,
    rect: Rect,
    definite: (bool, bool),
    accum: &mut HashMap<ElementId, Rect>,
) -> Result<()> {
    accum.insert(id, rect);

    let element = tree.get(id)?;
    if element.children.is_empty() {
        return Ok(());
    }

    let padding = tree.computed_padding(id)?;
    let border = element.border;
    let content = Rect::new(
        rect.x + border.left + padding.left,
        rect.y + border.top + padding.top,
        (rect.width - border.horizontal() - padding.horizontal()).max(0),
        (rect.height - border.vertical() - padding.vertical()).max(0),
    );

    let flow = element.flow;
    let cross = flow.cross();
    let mut cursor = content.origin_along(flow);

    for child in &element.children {
        let margin = tree.computed_margin(*child)?;
        let style = tree.style(*child)?;
        let width = sized(tree, *child, Axis::Horizontal, content.width, definite.0)?;
        let height = sized(tree, *child, Axis::Vertical, content.height, definite.1)?;
        let size = Size::new(width, height);

        let main_pos = cursor + margin.start(flow);
        let cross_pos = content.origin_along(cross) + margin.start(cross);
        let (x, y) = match flow {
            Axis::Horizontal => (main_pos, cross_pos),
            Axis::Vertical => (cross_pos, main_pos),
        };
        cursor = main_pos + size.along(flow) + margin.end(flow);

        let child_definite = (
            is_definite(style.width, definite.0),
            is_definite(style.height, definite.1),
        );
        solve_node(tree, *child, Rect::new(x, y, width, height), child_definite, accum)?;
    }

    Ok(())
}
