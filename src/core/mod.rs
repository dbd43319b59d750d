pub mod entity;
pub mod error;

pub use entity::{Book, Entity, EntityId, clean_entity};
pub use error::{ClientError, ConfigError, LinkHeaderError, Result, SerializedError};
