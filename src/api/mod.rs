pub mod client;
pub mod config;
pub mod pagination;

pub use client::{EntityApi, Fetched, ListQuery, Page, RestEntityApi, TOTAL_COUNT_HEADER};
pub use config::ClientConfig;
pub use pagination::{Links, load_more_data_when_scrolled, parse_header_for_links};
