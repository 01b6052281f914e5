pub mod memory;
pub mod redis;
pub mod store;

pub use memory::MemoryBuffer;
pub use redis::RedisBuffer;
pub use store::BufferStore;
