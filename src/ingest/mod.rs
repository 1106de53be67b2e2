//! Ingestion pipeline
//!
//! ```text
//! RowSource -> Row Decoder -> Id Registry -> Reference Resolver -> Batch Writer -> store
//! ```

pub mod decoder;
pub mod duration;
pub mod kind;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod writer;

pub use decoder::{decode_sheet, ColumnMap, RowDecoder, DEFAULT_LIST_DELIMITER};
pub use kind::{Kind, Phase};
pub use model::{Draft, Reference, Resolved};
pub use orchestrator::{
    IngestionRun, KindReport, Pipeline, PipelineConfig, ReferencePolicy, RunReport,
};
pub use registry::{IdRegistry, Origin};
pub use resolver::Resolver;
pub use writer::{BatchWriter, WriteReport};
