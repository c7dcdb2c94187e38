use std::fmt;

use super::error::{LibraryError, LibraryResult, StorageError};
use super::models::Book;
use super::storage::{codec, SlotStore, STORAGE_KEY};

/// Name used when none is configured.
pub const DEFAULT_LIBRARY_NAME: &str = "The Community Digital Library";

/// The catalog: an ordered collection of books, unique by ISBN, saved to its storage
/// slot after every successful change.
///
/// Lookups are linear scans; catalogs are expected to stay small.
pub struct Library {
    name: String,
    books: Vec<Book>,
    store: Box<dyn SlotStore>,
    unsaved: bool,
}

/// Result of [`Library::add_book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// `true` when the ISBN already existed and only its quantity grew
    pub updated: bool,
    /// The stored book after the operation
    pub book: Book,
}

impl Library {
    /// An empty library. Nothing is written until the first change.
    pub fn new(name: Option<&str>, store: impl SlotStore + 'static) -> Self {
        Self {
            name: crate::utils::non_blank(name).unwrap_or_else(|| DEFAULT_LIBRARY_NAME.to_string()),
            books: Vec::new(),
            store: Box::new(store),
            unsaved: false,
        }
    }

    /// Load the library from its storage slot; an empty slot gives an empty library.
    pub fn restore(name: Option<&str>, store: impl SlotStore + 'static) -> LibraryResult<Self> {
        let mut library = Self::new(name, store);

        let Some(payload) = library.store.read(STORAGE_KEY).map_err(StorageError::from)? else {
            tracing::info!(library = %library.name, "no saved catalog, starting empty");
            return Ok(library);
        };

        let decoded = codec::decode(&payload)?;
        if decoded.skipped > 0 {
            tracing::warn!(
                library = %library.name,
                skipped = decoded.skipped,
                "some stored records could not be restored"
            );
        }
        library.books = decoded.books;

        tracing::info!(
            library = %library.name,
            books = library.books.len(),
            "catalog restored"
        );
        Ok(library)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Books in insertion order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Add a book, or grow the stock of the book already holding its ISBN.
    pub fn add_book(&mut self, book: Book) -> LibraryResult<AddOutcome> {
        let outcome = match self.position(book.isbn()) {
            Some(index) => {
                let existing = &mut self.books[index];
                existing.add_stock(book.quantity());
                tracing::info!(
                    isbn = existing.isbn(),
                    added = book.quantity(),
                    quantity = existing.quantity(),
                    "stock increased"
                );
                AddOutcome {
                    updated: true,
                    book: existing.clone(),
                }
            }
            None => {
                tracing::info!(isbn = book.isbn(), title = book.title(), "book added");
                self.books.push(book.clone());
                AddOutcome {
                    updated: false,
                    book,
                }
            }
        };

        self.persist()?;
        Ok(outcome)
    }

    pub fn find_by_isbn(&self, isbn: &str) -> Option<&Book> {
        self.position(isbn).map(|index| &self.books[index])
    }

    /// Remove a book and hand it back.
    pub fn delete_by_isbn(&mut self, isbn: &str) -> LibraryResult<Book> {
        let index = self.position(isbn).ok_or_else(|| not_found(isbn))?;
        let removed = self.books.remove(index);
        tracing::info!(isbn = removed.isbn(), title = removed.title(), "book deleted");

        self.persist()?;
        Ok(removed)
    }

    /// Check out one copy. Fails with `NotFound` or `Unavailable`; only success is saved.
    pub fn borrow_by_isbn(&mut self, isbn: &str) -> LibraryResult<Book> {
        let index = self.position(isbn).ok_or_else(|| not_found(isbn))?;
        let book = &mut self.books[index];

        if !book.borrow_copy() {
            tracing::debug!(isbn = book.isbn(), "no copies available to borrow");
            return Err(LibraryError::Unavailable {
                isbn: book.isbn().to_string(),
                title: book.title().to_string(),
            });
        }
        let snapshot = book.clone();
        tracing::info!(
            isbn = snapshot.isbn(),
            available = snapshot.available_copies(),
            "copy borrowed"
        );

        self.persist()?;
        Ok(snapshot)
    }

    /// Check one copy back in. Fails with `NotFound` or `NothingToReturn`.
    pub fn return_by_isbn(&mut self, isbn: &str) -> LibraryResult<Book> {
        let index = self.position(isbn).ok_or_else(|| not_found(isbn))?;
        let book = &mut self.books[index];

        if !book.return_copy() {
            tracing::debug!(isbn = book.isbn(), "no borrowed copies to return");
            return Err(LibraryError::NothingToReturn {
                isbn: book.isbn().to_string(),
                title: book.title().to_string(),
            });
        }
        let snapshot = book.clone();
        tracing::info!(
            isbn = snapshot.isbn(),
            available = snapshot.available_copies(),
            "copy returned"
        );

        self.persist()?;
        Ok(snapshot)
    }

    /// Case-insensitive substring search over title, author, ISBN and genre.
    ///
    /// A blank query matches everything. Results keep insertion order.
    pub fn search(&self, query: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.books.iter().collect();
        }

        self.books
            .iter()
            .filter(|book| {
                [book.title(), book.author(), book.isbn(), book.genre()]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Whether the last save failed, leaving the slot behind the in-memory catalog.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Write the whole collection to the storage slot.
    pub fn persist(&mut self) -> LibraryResult<()> {
        let saved = codec::encode(&self.books).and_then(|payload| {
            self.store
                .write(STORAGE_KEY, &payload)
                .map_err(StorageError::from)
        });
        self.unsaved = saved.is_err();
        saved?;

        tracing::debug!(books = self.books.len(), "catalog persisted");
        Ok(())
    }

    fn position(&self, isbn: &str) -> Option<usize> {
        let isbn = isbn.trim();
        self.books.iter().position(|book| book.isbn() == isbn)
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("books", &self.books)
            .field("unsaved", &self.unsaved)
            .finish_non_exhaustive()
    }
}

fn not_found(isbn: &str) -> LibraryError {
    LibraryError::NotFound {
        isbn: isbn.trim().to_string(),
    }
}
