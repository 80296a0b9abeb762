//! HTTP API handlers for ecosort-web

pub mod analyze;
pub mod health;
pub mod history;
pub mod ui;

pub use analyze::analyze_routes;
pub use health::health_routes;
pub use history::history_routes;
pub use ui::ui_routes;
