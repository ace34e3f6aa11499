pub mod core;
pub use self::core::*;

pub mod schema;
pub use schema::{Schema, SchemaType};
