pub mod error;
pub mod memory;
pub mod postgrest;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use postgrest::PostgrestStore;
