pub mod error;
pub mod memory;
pub mod query;
pub mod store;
pub mod supabase;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Collection, Filter, ListQuery, Order};
pub use store::{Database, DocumentStore, Record};
pub use supabase::{SupabaseClient, SupabaseStore};
