//! Retained element surface the engine lays out.
//!
//! The engine only talks to elements through [`ElementTree`]; the reference
//! resolver turns a tree into pixel rectangles so measurements can be fed
//! back through [`crate::measure::MeasurementCache`].

mod resolve;
mod theme;
mod tree;

pub use resolve::{natural_size, percent_of, resolve};
pub use theme::Theme;
pub use tree::{
    Dimension, Element, ElementId, ElementKind, ElementSnapshot, ElementTree, SideValues, Style,
    margin_class,
};
