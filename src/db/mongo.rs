//! MongoDB client and store implementation

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{error::ErrorKind, options::IndexOptions, Client, Collection, IndexModel};
use tracing::{debug, info};

use crate::db::schemas::{
    DeityDoc, Metadata, PrarthanaDoc, ShlokDoc, StotraDoc, DEITY_COLLECTION, PRARTHANA_COLLECTION,
    SHLOK_COLLECTION, STOTRA_COLLECTION,
};
use crate::db::store::{InsertFailure, InsertOutcome, StoreReader, StoreWriter};
use crate::ingest::Kind;
use crate::types::{IngestError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| IngestError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| IngestError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Untyped collection backing a content kind
    pub fn collection(&self, kind: Kind) -> Collection<Document> {
        self.client
            .database(&self.db_name)
            .collection::<Document>(kind.collection())
    }

    /// Apply schema-defined indexes to a collection
    pub async fn apply_indexes<T: IntoIndexes>(&self, collection_name: &str) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.client
            .database(&self.db_name)
            .collection::<Document>(collection_name)
            .create_indexes(indices)
            .await
            .map_err(|e| IngestError::Database(format!("Failed to create indexes: {}", e)))?;

        debug!(collection = collection_name, "Indexes applied");
        Ok(())
    }

    /// Apply indexes for all four content collections
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.apply_indexes::<DeityDoc>(DEITY_COLLECTION).await?;
        self.apply_indexes::<ShlokDoc>(SHLOK_COLLECTION).await?;
        self.apply_indexes::<StotraDoc>(STOTRA_COLLECTION).await?;
        self.apply_indexes::<PrarthanaDoc>(PRARTHANA_COLLECTION).await?;
        Ok(())
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// `StoreReader`/`StoreWriter` over MongoDB
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
}

impl MongoStore {
    pub fn new(client: MongoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StoreReader for MongoStore {
    async fn find_all(&self, kind: Kind, fields: &[&str]) -> Result<Vec<Document>> {
        let mut projection = Document::new();
        for field in fields {
            projection.insert(*field, 1);
        }

        let cursor = self
            .client
            .collection(kind)
            .find(doc! {})
            .projection(projection)
            .await
            .map_err(|e| IngestError::Database(format!("Find on {} failed: {}", kind.collection(), e)))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| IngestError::Database(format!("Cursor on {} failed: {}", kind.collection(), e)))?;

        debug!(kind = %kind, count = documents.len(), "Loaded persisted documents");
        Ok(documents)
    }
}

#[async_trait::async_trait]
impl StoreWriter for MongoStore {
    async fn insert_many(&self, kind: Kind, documents: Vec<Document>) -> Result<InsertOutcome> {
        if documents.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let total = documents.len();
        let err = match self
            .client
            .collection(kind)
            .insert_many(documents)
            .ordered(true)
            .await
        {
            Ok(result) => {
                return Ok(InsertOutcome {
                    inserted: result.inserted_ids.len(),
                    failures: Vec::new(),
                })
            }
            Err(err) => err,
        };

        // Per-document rejections (duplicate key, validation) become an
        // outcome; anything else is a transport failure.
        let rejected: Option<Vec<InsertFailure>> = match err.kind.as_ref() {
            ErrorKind::InsertMany(failure) => failure.write_errors.as_ref().map(|errors| {
                errors
                    .iter()
                    .map(|e| InsertFailure {
                        index: e.index,
                        message: format!("{} (code {})", e.message, e.code),
                    })
                    .collect()
            }),
            _ => None,
        };

        match rejected {
            Some(failures) if !failures.is_empty() => {
                let inserted = failures.iter().map(|f| f.index).min().unwrap_or(total);
                Ok(InsertOutcome { inserted, failures })
            }
            _ => Err(IngestError::Database(format!(
                "Insert into {} failed: {}",
                kind.collection(),
                err
            ))),
        }
    }
}
