//! Encoding of the catalog into its storage slot.
//!
//! Current format: `{"version": 1, "books": [BookRecord, ...]}`. The earlier format, a bare
//! array of records, is still accepted on decode. Each record is rebuilt through
//! [`Book::new`], so defaults and coercion apply to stored data too.

use serde::{Deserialize, Serialize};

use crate::modules::books::error::StorageError;
use crate::modules::books::models::{Book, BookRecord, NewBook, QuantityInput};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct CatalogDocument {
    version: u32,
    books: Vec<BookRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredCatalog {
    Versioned {
        version: u32,
        books: Vec<serde_json::Value>,
    },
    Legacy(Vec<serde_json::Value>),
}

/// A stored record before normalization. Everything is optional or loosely typed
/// so one bad field costs one record, not the whole load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBook {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    isbn: String,
    #[serde(default)]
    publication_year: Option<serde_json::Value>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    quantity: Option<QuantityInput>,
    #[serde(default)]
    borrowed_copies: Option<serde_json::Value>,
}

impl StoredBook {
    fn into_book(self) -> Result<Book, String> {
        let publication_year = match self.publication_year {
            Some(serde_json::Value::String(year)) => Some(year),
            Some(serde_json::Value::Number(year)) => Some(year.to_string()),
            _ => None,
        };
        let borrowed = self.borrowed_copies.as_ref().map_or(0, count_from_json);

        let input = NewBook {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publication_year,
            genre: self.genre,
            quantity: self.quantity,
        };

        Book::new(input)
            .map(|book| book.with_borrowed_copies(borrowed))
            .map_err(|e| e.to_string())
    }
}

fn count_from_json(value: &serde_json::Value) -> u32 {
    let count = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.trunc() as u64)),
        serde_json::Value::String(text) => crate::utils::leading_integer(text)
            .and_then(|n| u64::try_from(n).ok()),
        _ => None,
    };
    count.map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
}

/// Result of decoding a slot: the books that survived and how many records were dropped.
#[derive(Debug, Default)]
pub struct DecodedCatalog {
    pub books: Vec<Book>,
    pub skipped: usize,
}

/// Serialize the collection in its current order.
pub fn encode(books: &[Book]) -> Result<String, StorageError> {
    let document = CatalogDocument {
        version: SCHEMA_VERSION,
        books: books.iter().map(Book::to_record).collect(),
    };
    serde_json::to_string_pretty(&document).map_err(StorageError::Encode)
}

/// Rebuild the collection from a slot's contents.
///
/// Malformed records, records missing a required field, and repeats of an ISBN already
/// seen are skipped with a warning. Only an unreadable document or an unknown schema
/// version fails the load.
pub fn decode(payload: &str) -> Result<DecodedCatalog, StorageError> {
    if payload.trim().is_empty() {
        return Ok(DecodedCatalog::default());
    }

    let stored =
        serde_json::from_str::<StoredCatalog>(payload).map_err(StorageError::Decode)?;
    let records = match stored {
        StoredCatalog::Versioned { version, books } if version <= SCHEMA_VERSION => books,
        StoredCatalog::Versioned { version, .. } => {
            return Err(StorageError::UnsupportedVersion(version))
        }
        StoredCatalog::Legacy(books) => {
            tracing::info!(records = books.len(), "decoding unversioned catalog");
            books
        }
    };

    let mut decoded = DecodedCatalog::default();
    for (index, record) in records.into_iter().enumerate() {
        let book = serde_json::from_value::<StoredBook>(record)
            .map_err(|e| e.to_string())
            .and_then(StoredBook::into_book);

        match book {
            Ok(book) if decoded.books.iter().any(|b| b.isbn() == book.isbn()) => {
                tracing::warn!(index, isbn = book.isbn(), "skipping duplicate stored record");
                decoded.skipped += 1;
            }
            Ok(book) => decoded.books.push(book),
            Err(reason) => {
                tracing::warn!(index, %reason, "skipping malformed stored record");
                decoded.skipped += 1;
            }
        }
    }

    Ok(decoded)
}
