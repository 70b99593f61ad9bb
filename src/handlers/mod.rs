mod content;
mod health;
mod images;
mod metrics;

pub use content::{layout_handler, profile_handler, widgets_handler};
pub use health::health_handler;
pub use images::{image_handler, image_path_required};
pub use metrics::metrics_handler;
