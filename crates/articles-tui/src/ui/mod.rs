//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, status bar and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `screens`: Per-route content (login form, article list and editor)

pub mod input;
pub mod render;
pub mod styles;
pub mod screens;
