// src/view/mod.rs
// =============================================================================
// Everything between the controller and the screen.
//
// Submodules:
// - trigger: loads the next page when the last row becomes visible
// - viewport: the terminal's notion of "visible" (a scroll window over rows)
// - render: tables, detail cards and JSON output
// =============================================================================

mod render;
mod trigger;
mod viewport;

pub use render::{print_detail, print_results, print_table, status_line};
pub use trigger::{ItemKey, ScrollTrigger, Sighting};
pub use viewport::Viewport;
