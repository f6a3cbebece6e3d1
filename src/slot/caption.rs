use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::LayoutError;
use crate::geometry::{Axis, Side};
use crate::surface::ElementId;

/// Wrapper attribute holding the explicit caption position.
pub const CAPTION_POSITION_ATTR: &str = "caption-position";

/// Where a caption sits relative to its child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    Top,
    #[default]
    Right,
    Bottom,
    Left,
}

impl CaptionPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            CaptionPosition::Top => "top",
            CaptionPosition::Right => "right",
            CaptionPosition::Bottom => "bottom",
            CaptionPosition::Left => "left",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            CaptionPosition::Top => "caption-on-top",
            CaptionPosition::Right => "caption-on-right",
            CaptionPosition::Bottom => "caption-on-bottom",
            CaptionPosition::Left => "caption-on-left",
        }
    }

    /// Axis caption and child are stacked along.
    pub fn axis(self) -> Axis {
        match self {
            CaptionPosition::Top | CaptionPosition::Bottom => Axis::Vertical,
            CaptionPosition::Left | CaptionPosition::Right => Axis::Horizontal,
        }
    }

    pub fn side(self) -> Side {
        match self {
            CaptionPosition::Top => Side::Top,
            CaptionPosition::Right => Side::Right,
            CaptionPosition::Bottom => Side::Bottom,
            CaptionPosition::Left => Side::Left,
        }
    }

    /// True when the caption precedes the child in document order.
    pub fn is_before_child(self) -> bool {
        matches!(self, CaptionPosition::Top | CaptionPosition::Left)
    }
}

impl fmt::Display for CaptionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptionPosition {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(CaptionPosition::Top),
            "right" => Ok(CaptionPosition::Right),
            "bottom" => Ok(CaptionPosition::Bottom),
            "left" => Ok(CaptionPosition::Left),
            _ => Err(LayoutError::UnknownCaptionPosition(value.to_string())),
        }
    }
}

/// Everything a caption can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSpec {
    pub text: Option<String>,
    pub icon_url: Option<String>,
    pub styles: Vec<String>,
    pub error: Option<String>,
    pub show_error: bool,
    pub required: bool,
    pub enabled: bool,
}

impl Default for CaptionSpec {
    fn default() -> Self {
        Self {
            text: None,
            icon_url: None,
            styles: Vec::new(),
            error: None,
            show_error: false,
            required: false,
            enabled: true,
        }
    }
}

impl CaptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.styles.push(style.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>, show: bool) -> Self {
        self.error = Some(message.into());
        self.show_error = show;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn shows_error(&self) -> bool {
        self.error.is_some() && self.show_error
    }

    /// True when any part of the caption would render.
    pub fn needs_caption(&self) -> bool {
        self.text.is_some() || self.icon_url.is_some() || self.shows_error() || self.required
    }

    /// Text or icon present; such captions default to the top.
    pub fn has_label(&self) -> bool {
        self.text.is_some() || self.icon_url.is_some()
    }

    pub(crate) fn classes(&self) -> Vec<String> {
        let mut classes = vec!["caption".to_string()];
        classes.extend(self.styles.iter().map(|style| format!("caption-{style}")));
        if !self.enabled {
            classes.push("disabled".to_string());
        }
        classes
    }
}

#[derive(Debug, Clone)]
pub(crate) struct IconState {
    pub element: ElementId,
    pub url: String,
    pub loaded: bool,
}

/// Elements making up a materialised caption.
#[derive(Debug, Clone)]
pub(crate) struct CaptionParts {
    pub wrap: ElementId,
    pub caption: ElementId,
    pub text: Option<ElementId>,
    pub icon: Option<IconState>,
    pub required: Option<ElementId>,
    pub error: Option<ElementId>,
}

impl CaptionParts {
    pub fn new(wrap: ElementId, caption: ElementId) -> Self {
        Self {
            wrap,
            caption,
            text: None,
            icon: None,
            required: None,
            error: None,
        }
    }

    /// Sub-elements in rendering order.
    pub fn ordered(&self) -> Vec<ElementId> {
        [
            self.icon.as_ref().map(|icon| icon.element),
            self.text,
            self.required,
            self.error,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positions_strictly() {
        assert_eq!("top".parse::<CaptionPosition>().unwrap(), CaptionPosition::Top);
        assert_eq!(" Left ".parse::<CaptionPosition>().unwrap(), CaptionPosition::Left);
        assert_eq!(
            "middle".parse::<CaptionPosition>().unwrap_err(),
            LayoutError::UnknownCaptionPosition("middle".into())
        );
        assert_eq!(CaptionPosition::Bottom.to_string(), "bottom");
    }

    #[test]
    fn caption_presence_rules() {
        assert!(!CaptionSpec::new().needs_caption());
        assert!(CaptionSpec::new().required(true).needs_caption());
        assert!(!CaptionSpec::new().with_error("bad", false).needs_caption());
        assert!(CaptionSpec::new().with_error("bad", true).needs_caption());
        assert!(CaptionSpec::text("").has_label());
    }

    #[test]
    fn classes_follow_styles_and_enabled() {
        let spec = CaptionSpec::text("Name").with_style("big").enabled(false);
        assert_eq!(spec.classes(), vec!["caption", "caption-big", "disabled"]);
    }
}
