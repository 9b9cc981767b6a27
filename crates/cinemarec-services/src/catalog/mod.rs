pub mod proxy;
pub mod tmdb;

pub use proxy::ProxyCatalogClient;
pub use tmdb::TmdbCatalogClient;
