// src/store.rs
//! Record helpers over a MongoDB collection.
//!
//! Every operation validates the database and collection names, opens its own
//! client, performs one operation and shuts the client down again. Nothing is
//! pooled or cached between calls.

use crate::error::{RecordStoreError, Result};
use bson::{doc, Document, RawDocumentBuf};
use futures::TryStreamExt;
use log::debug;
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection};
use serde::Serialize;
use std::future::Future;

const APP_NAME: &str = "recstore";

/// Shape of a [`find`] result, selected by its `unique` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum FindResult {
    One(Document),
    Many(Vec<Document>),
}

impl FindResult {
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            FindResult::One(doc) => vec![doc],
            FindResult::Many(docs) => docs,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FindResult::One(_) => 1,
            FindResult::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of an [`update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateCounts {
    pub matched: u64,
    pub modified: u64,
}

/// How many documents matched an existence query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    Absent,
    Single,
    Multiple(u64),
}

impl Existence {
    pub fn from_count(count: u64) -> Self {
        match count {
            0 => Existence::Absent,
            1 => Existence::Single,
            n => Existence::Multiple(n),
        }
    }

    /// Maps a match count onto the answer of [`exists_and_unique`].
    ///
    /// Duplicates are an error only when the caller asked for uniqueness.
    pub fn classify(count: u64, unique: bool) -> Result<bool> {
        match Existence::from_count(count) {
            Existence::Absent => Ok(false),
            Existence::Single => Ok(true),
            Existence::Multiple(count) if unique => Err(RecordStoreError::IllegalRecords { count }),
            Existence::Multiple(_) => Ok(true),
        }
    }
}

/// Inserts `document` into `database.collection`.
///
/// The document is stored as given: `$`-prefixed sub-documents such as
/// `{"$oid": ...}` are kept as plain fields.
pub async fn insert(
    url: &str,
    database: &str,
    collection: &str,
    document: Document,
) -> Result<()> {
    validate(database, collection)?;
    let raw = encode(&document)?;

    run(url, database, collection, "insert", move |coll| async move {
        coll.clone_with_type::<RawDocumentBuf>()
            .insert_one(raw)
            .await
            .map(|_| ())
    })
    .await
}

/// Inserts an application record, serialized with its `Serialize` impl.
pub async fn insert_record<T: Serialize>(
    url: &str,
    database: &str,
    collection: &str,
    record: &T,
) -> Result<()> {
    validate(database, collection)?;
    let document = bson::to_document(record)?;
    insert(url, database, collection, document).await
}

/// Sets each field of `values` on the first document matching `key`.
///
/// Fields not named in `values` are left untouched. A key that matches nothing
/// is not an error; the returned counts are then zero.
pub async fn update(
    url: &str,
    database: &str,
    collection: &str,
    key: Document,
    values: Document,
) -> Result<UpdateCounts> {
    validate(database, collection)?;
    let modification = set_fields(values);

    run(url, database, collection, "update", move |coll| async move {
        let result = coll.update_one(key, modification).await?;
        Ok::<_, mongodb::error::Error>(UpdateCounts {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    })
    .await
}

/// Looks up documents matching `key`.
///
/// With `unique` set at most one document is returned, and an empty match is
/// reported as [`RecordStoreError::NotFound`]. Otherwise every match is
/// returned, possibly none. The flag only picks the result shape; use
/// [`exists_and_unique`] to enforce uniqueness.
pub async fn find(
    url: &str,
    database: &str,
    collection: &str,
    key: Document,
    unique: bool,
) -> Result<FindResult> {
    validate(database, collection)?;

    if unique {
        let found = run(url, database, collection, "find_one", move |coll| async move {
            coll.find_one(key).await
        })
        .await?;
        found.map(FindResult::One).ok_or(RecordStoreError::NotFound)
    } else {
        run(url, database, collection, "find", move |coll| async move {
            let docs: Vec<Document> = coll.find(key).await?.try_collect().await?;
            Ok::<_, mongodb::error::Error>(docs)
        })
        .await
        .map(FindResult::Many)
    }
}

/// Reports whether any document matches `query`.
///
/// When `unique` is set, more than one match yields
/// [`RecordStoreError::IllegalRecords`].
pub async fn exists_and_unique(
    url: &str,
    database: &str,
    collection: &str,
    query: Document,
    unique: bool,
) -> Result<bool> {
    validate(database, collection)?;

    let count = run(url, database, collection, "count", move |coll| async move {
        coll.count_documents(query).await
    })
    .await?;
    Existence::classify(count, unique)
}

fn validate(database: &str, collection: &str) -> Result<()> {
    if database.is_empty() {
        return Err(RecordStoreError::InvalidArgument("database name"));
    }
    if collection.is_empty() {
        return Err(RecordStoreError::InvalidArgument("collection name"));
    }
    Ok(())
}

fn set_fields(values: Document) -> Document {
    doc! { "$set": values }
}

// Encodes field by field; a serde round trip would turn `{"$oid": ..}`-shaped
// sub-documents into BSON types.
fn encode(document: &Document) -> Result<RawDocumentBuf> {
    Ok(RawDocumentBuf::from_document(document)?)
}

async fn connect(url: &str) -> Result<Client> {
    let mut client_options = ClientOptions::parse(url)
        .await
        .map_err(RecordStoreError::Connection)?;
    if client_options.app_name.is_none() {
        client_options.app_name = Some(APP_NAME.to_string());
    }
    client_options.selection_criteria =
        Some(SelectionCriteria::ReadPreference(ReadPreference::Primary));

    let client = Client::with_options(client_options).map_err(RecordStoreError::Connection)?;

    // The driver connects lazily; ping so an unreachable server is a connection error.
    if let Err(e) = client.database("admin").run_command(doc! { "ping": 1 }).await {
        client.shutdown().await;
        return Err(RecordStoreError::Connection(e));
    }
    Ok(client)
}

/// Opens a client, hands `op` the target collection and shuts the client down
/// whatever `op` returned.
async fn run<T, F, Fut>(
    url: &str,
    database: &str,
    collection: &str,
    name: &str,
    op: F,
) -> Result<T>
where
    F: FnOnce(Collection<Document>) -> Fut,
    Fut: Future<Output = mongodb::error::Result<T>>,
{
    let client = connect(url).await?;
    debug!("{} on {}.{}", name, database, collection);

    let handle = client.database(database).collection::<Document>(collection);
    let outcome = op(handle).await.map_err(RecordStoreError::Operation);

    client.shutdown().await;
    debug!("closed connection after {}", name);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    // Nothing listens on port 1, so reaching the network here would fail with
    // a connection error rather than the expected one.
    const UNREACHABLE: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";

    #[test]
    fn empty_names_are_rejected() {
        assert!(validate("db", "coll").is_ok());
        assert!(validate("", "coll").unwrap_err().is(ErrorKind::InvalidArgument));
        assert!(validate("db", "").unwrap_err().is(ErrorKind::InvalidArgument));
        assert!(validate("", "").unwrap_err().is(ErrorKind::InvalidArgument));
    }

    #[test]
    fn classify_follows_count_and_uniqueness() {
        assert!(!Existence::classify(0, true).unwrap());
        assert!(!Existence::classify(0, false).unwrap());
        assert!(Existence::classify(1, true).unwrap());
        assert!(Existence::classify(1, false).unwrap());
        assert!(Existence::classify(2, false).unwrap());

        let err = Existence::classify(2, true).unwrap_err();
        assert!(matches!(err, RecordStoreError::IllegalRecords { count: 2 }));
    }

    #[test]
    fn update_values_are_wrapped_in_set() {
        let values = doc! { "name": "ada", "age": 36 };
        assert_eq!(
            set_fields(values),
            doc! { "$set": { "name": "ada", "age": 36 } }
        );
    }

    #[test]
    fn dollar_keyed_fields_are_encoded_verbatim() {
        let original = doc! {
            "meta": { "$numberLong": "5" },
            "x": { "$oid": "65a1b2c3d4e5f60718293a4b" },
            "when": { "$date": "2024-01-01T00:00:00Z" },
        };

        let raw = encode(&original).unwrap();
        let decoded = raw.to_document().unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.get_document("meta").unwrap().get_str("$numberLong").unwrap(), "5");
        assert!(decoded.get_object_id("x").is_err());
    }

    #[test]
    fn find_result_flattens() {
        let one = FindResult::One(doc! { "a": 1 });
        assert_eq!(one.len(), 1);
        assert_eq!(one.into_documents(), vec![doc! { "a": 1 }]);

        let none = FindResult::Many(Vec::new());
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn validation_happens_before_connecting() {
        let doc = doc! { "k": 1 };

        let err = insert(UNREACHABLE, "", "c", doc.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = update(UNREACHABLE, "d", "", doc.clone(), doc.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = find(UNREACHABLE, "", "", doc.clone(), true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = exists_and_unique(UNREACHABLE, "", "c", doc, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let err = find("not a mongodb url", "d", "c", doc! {}, false)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let err = exists_and_unique(UNREACHABLE, "d", "c", doc! {}, true)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn non_document_record_fails_to_serialize() {
        let err = insert_record(UNREACHABLE, "d", "c", &42_i32).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
