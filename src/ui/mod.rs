//! UI rendering modules for Skycast
//!
//! This module contains the rendering code for the dashboard, organized
//! around the application states defined in `app.rs`.

mod dashboard;

pub use dashboard::render;
