use thiserror::Error;

use crate::geometry::Axis;
use crate::surface::ElementId;

/// Unified result type for the slotbox crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by the box layout engine.
///
/// Degenerate expansion and unmeasured elements are recovered locally and
/// never show up here.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("slot index {index} is out of range for {len} slots")]
    InvalidIndex { index: usize, len: usize },
    #[error("no slot manages element {0}")]
    NoSuchSlot(ElementId),
    #[error("element {0} does not exist")]
    ElementNotFound(ElementId),
    #[error("element {child} is not a child of {parent}")]
    NotAChild { parent: ElementId, child: ElementId },
    #[error("{axis:?} layout of {element} already ran in this pass")]
    ReentrantLayout { element: ElementId, axis: Axis },
    #[error("caption position `{0}` is not recognised")]
    UnknownCaptionPosition(String),
    #[error("failed to serialize layout snapshot: {0}")]
    Snapshot(String),
}
