pub mod model;
pub mod pager;
pub mod redis_catalog_repository;

pub use model::*;
pub use pager::*;
pub use redis_catalog_repository::RedisCatalogRepository;
