use crate::api::pagination::Links;
use crate::core::{Book, Entity};
use serde::Serialize;

/// Client-side state for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState<T> {
    pub loading: bool,
    pub error_message: Option<String>,
    pub entities: Vec<T>,
    pub entity: T,
    pub links: Links,
    pub updating: bool,
    pub total_items: u64,
    pub update_success: bool,
}

impl<T: Entity> EntityState<T> {
    pub fn initial() -> Self {
        Self {
            loading: false,
            error_message: None,
            entities: Vec::new(),
            entity: T::default(),
            links: Links::initial(),
            updating: false,
            total_items: 0,
            update_success: false,
        }
    }
}

impl<T: Entity> Default for EntityState<T> {
    fn default() -> Self {
        Self::initial()
    }
}

pub type BookState = EntityState<Book>;
