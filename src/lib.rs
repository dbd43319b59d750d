// ============================================================================
// Book Slice Library
// ============================================================================

pub mod api;
pub mod core;
pub mod scenario;
pub mod slice;

// Re-export main types for convenience
pub use api::{
    ClientConfig, EntityApi, Fetched, Links, ListQuery, Page, RestEntityApi,
    load_more_data_when_scrolled, parse_header_for_links,
};
pub use core::{
    Book, ClientError, ConfigError, Entity, EntityId, LinkHeaderError, Result, SerializedError,
    clean_entity,
};
pub use scenario::{BookScenario, ScenarioError, ScenarioReport, StepReport};
pub use slice::{
    Action, BookSlice, BookState, EntitySlice, EntityState, OperationResult, Phase, Store, reduce,
};
