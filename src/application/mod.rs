pub mod coordinator;
pub mod push_retry;
pub mod serializer;
pub mod state_store;
