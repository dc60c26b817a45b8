pub mod client;
pub mod rate_limit;
pub mod resource;
pub mod types;
