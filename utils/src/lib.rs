pub mod query_url;
pub mod surf_logging;
