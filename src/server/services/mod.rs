pub mod app_services;
pub mod catalog_services;
pub mod download_services;
pub mod token_services;

pub use catalog_services::DynCatalogService;
