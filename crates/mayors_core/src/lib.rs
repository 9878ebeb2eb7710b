pub mod config;
pub mod email;
pub mod extract;
pub mod fetch;
pub mod schema;
pub mod scrape;
pub mod subdivision;
pub mod writer;
