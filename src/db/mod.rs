//! Database layer
//!
//! MongoDB client, typed schemas, and the `StoreReader`/`StoreWriter`
//! implementations the pipeline writes through.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::InMemoryStore;
pub use mongo::{MongoClient, MongoStore};
pub use schemas::{DeityDoc, Metadata, PrarthanaDoc, ShlokDoc, StotraDoc};
pub use store::{InsertFailure, InsertOutcome, StoreReader, StoreWriter};
