//! Vector index implementations

mod factory;
mod in_memory;
mod redis;
mod search_reply;

pub use factory::{VectorIndexBackend, VectorIndexConfig, VectorIndexFactory};
pub use in_memory::InMemoryVectorIndex;
pub use redis::{open_connection, RedisVectorIndex, RedisVectorIndexConfig};
