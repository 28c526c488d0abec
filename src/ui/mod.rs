//! Terminal UI rendering using ratatui.
//!
//! Each page is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`twins`]: List of all digital twins
//! - [`detail`]: Current property values of the selected twin
//! - [`live`]: Property list and live line chart
//! - [`query`]: Query builder form and the generated query overlay
//! - [`common`]: Shared components (header, tabs, status bar, search input, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` calls into these modules based on the current view:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (twins/detail/live/query::render)    │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - query::render_generated
//!    - common::render_help
//! ```

pub mod common;
pub mod detail;
pub mod live;
pub mod query;
pub mod theme;
pub mod twins;

pub use theme::Theme;

use ratatui::layout::Rect;

/// A rectangle of at most `width` x `height` centered in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 40, 10), Rect::new(20, 7, 40, 10));
        assert_eq!(centered(area, 200, 50), area);
    }
}
