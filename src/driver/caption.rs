use crate::error::{LayoutError, Result};
use crate::geometry::Side;
use crate::measure::{MeasurementProvider, measure_or_raw};
use crate::slot::{CAPTION_POSITION_ATTR, CaptionPosition};
use crate::surface::{ElementId, ElementTree};

/// Pull a caption out of its wrapper's flow so a relatively sized child can
/// fill the wrapper: the wrapper gets padding equal to the caption's border
/// box on the caption side and the caption the same negative margin.
///
/// The position comes from the wrapper's explicit position attribute; a
/// missing or unparseable value is an error after the old offset is cleared.
/// Returns the applied offset, zero when nothing was applied.
pub fn update_caption_offset<M>(
    tree: &mut ElementTree,
    provider: &M,
    caption: ElementId,
) -> Result<i32>
where
    M: MeasurementProvider + ?Sized,
{
    let Some(wrap) = tree.parent(caption)? else {
        return Ok(0);
    };
    let position = match caption_position(tree, wrap) {
        Ok(position) => position,
        Err(err) => {
            apply_offset(tree, wrap, caption, None)?;
            return Err(err);
        }
    };
    let extent = measure_or_raw(provider, tree, caption)?
        .border_box(position.axis())
        .max(0);
    let offset = (extent > 0).then_some((position.side(), extent));
    apply_offset(tree, wrap, caption, offset)?;
    Ok(extent)
}

/// Remove every caption offset from the wrapper around `caption`.
pub fn clear_caption_offset(tree: &mut ElementTree, caption: ElementId) -> Result<()> {
    match tree.parent(caption)? {
        Some(wrap) => apply_offset(tree, wrap, caption, None),
        None => Ok(()),
    }
}

fn caption_position(tree: &ElementTree, wrap: ElementId) -> Result<CaptionPosition> {
    tree.attribute(wrap, CAPTION_POSITION_ATTR)?
        .ok_or_else(|| LayoutError::UnknownCaptionPosition(String::new()))?
        .parse()
}

fn apply_offset(
    tree: &mut ElementTree,
    wrap: ElementId,
    caption: ElementId,
    offset: Option<(Side, i32)>,
) -> Result<()> {
    for side in Side::ALL {
        let value = offset.and_then(|(target, extent)| (target == side).then_some(extent));
        tree.set_padding(wrap, side, value)?;
        tree.set_margin(caption, side, value.map(|extent| -extent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::measure::MeasurementCache;
    use crate::slot::{CaptionSpec, Captionable, Slot};
    use crate::surface::Theme;

    fn captioned(tree: &mut ElementTree, spec: &CaptionSpec, position: CaptionPosition) -> Slot {
        let child = tree.create_widget(Size::new(100, 30));
        let mut slot = Slot::new(tree, child).unwrap();
        slot.set_caption(tree, spec).unwrap();
        slot.set_caption_position(tree, position).unwrap();
        slot
    }

    #[test]
    fn left_caption_offsets_are_symmetric() {
        let mut tree = ElementTree::new();
        let cache = MeasurementCache::new();
        let slot = captioned(&mut tree, &CaptionSpec::text("Label"), CaptionPosition::Left);
        let caption = slot.caption_element().unwrap();
        let wrap = slot.caption_wrap().unwrap();

        let width = update_caption_offset(&mut tree, &cache, caption).unwrap();
        assert_eq!(width, 5 * tree.theme().glyph_width);
        assert_eq!(tree.style(wrap).unwrap().padding.left, Some(width));
        assert_eq!(tree.style(caption).unwrap().margin.left, Some(-width));
        assert_eq!(tree.style(wrap).unwrap().padding.top, None);

        let revision = tree.revision();
        update_caption_offset(&mut tree, &cache, caption).unwrap();
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn zero_width_caption_applies_nothing() {
        let mut tree = ElementTree::with_theme(Theme {
            indicator_width: 0,
            ..Theme::default()
        });
        let cache = MeasurementCache::new();
        let slot = captioned(&mut tree, &CaptionSpec::new().required(true), CaptionPosition::Left);
        let caption = slot.caption_element().unwrap();
        let wrap = slot.caption_wrap().unwrap();

        assert_eq!(update_caption_offset(&mut tree, &cache, caption).unwrap(), 0);
        assert!(tree.style(wrap).unwrap().padding.is_empty());
        assert!(tree.style(caption).unwrap().margin.is_empty());
    }

    #[test]
    fn missing_position_is_an_error_and_clears() {
        let mut tree = ElementTree::new();
        let cache = MeasurementCache::new();
        let slot = captioned(&mut tree, &CaptionSpec::text("Label"), CaptionPosition::Top);
        let caption = slot.caption_element().unwrap();
        let wrap = slot.caption_wrap().unwrap();
        update_caption_offset(&mut tree, &cache, caption).unwrap();
        assert!(tree.style(wrap).unwrap().padding.top.is_some());

        tree.set_attribute(wrap, CAPTION_POSITION_ATTR, Some("sideways"))
            .unwrap();
        assert_eq!(
            update_caption_offset(&mut tree, &cache, caption).unwrap_err(),
            LayoutError::UnknownCaptionPosition("sideways".into())
        );
        assert!(tree.style(wrap).unwrap().padding.is_empty());

        tree.set_attribute(wrap, CAPTION_POSITION_ATTR, None)
            .unwrap();
        assert!(matches!(
            update_caption_offset(&mut tree, &cache, caption),
            Err(LayoutError::UnknownCaptionPosition(_))
        ));
    }
}
