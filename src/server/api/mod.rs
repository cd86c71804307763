pub mod content_controller;
pub mod download_controller;
pub mod health_controller;
