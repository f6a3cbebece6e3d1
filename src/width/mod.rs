//! Text width helpers used when the surface measures caption text.

mod utils;

pub use utils::{display_width, is_blank};
