use serde::{Deserialize, Serialize};

use super::error::LibraryError;
use super::library::AddOutcome;
use super::models::Book;

/// Shown when a listing or search has nothing to display.
pub const EMPTY_LISTING: &str = "No books found matching your criteria.";

/// Title and message shown to the user after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn added(outcome: &AddOutcome) -> Self {
        let book = &outcome.book;
        if outcome.updated {
            Self::new(
                "Book Updated",
                format!(
                    "Quantity for \"{}\" increased. New total: {}.",
                    book.title(),
                    book.quantity()
                ),
            )
        } else {
            Self::new(
                "Book Added!",
                format!("\"{}\" has been successfully added.", book.title()),
            )
        }
    }

    /// A quantity was given but does not read as at least one copy.
    pub fn invalid_quantity() -> Self {
        Self::new(
            "Input Error",
            "Quantity must be a valid number and at least 1.",
        )
    }

    pub fn borrowed(book: &Book) -> Self {
        Self::new(
            "Book Borrowed",
            format!("One copy of \"{}\" has been borrowed.", book.title()),
        )
    }

    pub fn returned(book: &Book) -> Self {
        Self::new(
            "Book Returned",
            format!("One copy of \"{}\" has been returned.", book.title()),
        )
    }

    pub fn deleted(book: &Book) -> Self {
        Self::new(
            "Book Deleted",
            format!("\"{}\" has been removed from the library.", book.title()),
        )
    }
}

impl From<&LibraryError> for Notice {
    fn from(error: &LibraryError) -> Self {
        match error {
            LibraryError::Validation { .. } => Notice::new(
                "Input Error",
                "Please ensure Title, Author, and ISBN are filled out.",
            ),
            LibraryError::NotFound { isbn } => Notice::new(
                "Not Found",
                format!("No book with ISBN \"{}\" is in the catalog.", isbn),
            ),
            LibraryError::Unavailable { title, .. } => Notice::new(
                "Unavailable",
                format!("Sorry, no more copies of \"{}\" are available.", title),
            ),
            LibraryError::NothingToReturn { title, .. } => Notice::new(
                "Error",
                format!("No copies of \"{}\" were recorded as borrowed.", title),
            ),
            LibraryError::Storage(_) => Notice::new("Error", "The catalog could not be saved."),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::NewBook;

    fn hobbit(quantity: u32) -> Book {
        Book::new(NewBook::new("The Hobbit", "J.R.R. Tolkien", "111").quantity(quantity)).unwrap()
    }

    #[test]
    fn add_notices_distinguish_merge() {
        let added = Notice::added(&AddOutcome {
            updated: false,
            book: hobbit(1),
        });
        assert_eq!(added.title, "Book Added!");
        assert_eq!(added.message, "\"The Hobbit\" has been successfully added.");

        let merged = Notice::added(&AddOutcome {
            updated: true,
            book: hobbit(4),
        });
        assert_eq!(merged.title, "Book Updated");
        assert_eq!(
            merged.message,
            "Quantity for \"The Hobbit\" increased. New total: 4."
        );
    }

    #[test]
    fn failure_notices_carry_title() {
        let notice = Notice::from(&LibraryError::Unavailable {
            isbn: "111".to_string(),
            title: "The Hobbit".to_string(),
        });
        assert_eq!(
            notice.to_string(),
            "Unavailable: Sorry, no more copies of \"The Hobbit\" are available."
        );

        let notice = Notice::from(&LibraryError::NothingToReturn {
            isbn: "111".to_string(),
            title: "The Hobbit".to_string(),
        });
        assert_eq!(
            notice.message,
            "No copies of \"The Hobbit\" were recorded as borrowed."
        );
    }

    #[test]
    fn invalid_quantity_is_an_input_error() {
        assert_eq!(
            Notice::invalid_quantity().to_string(),
            "Input Error: Quantity must be a valid number and at least 1."
        );
    }

    #[test]
    fn not_found_names_the_isbn() {
        let notice = Notice::from(&LibraryError::NotFound {
            isbn: "999".to_string(),
        });
        assert_eq!(notice.title, "Not Found");
        assert!(notice.message.contains("\"999\""));
    }

    #[test]
    fn success_notices() {
        let book = hobbit(1);
        assert_eq!(Notice::borrowed(&book).title, "Book Borrowed");
        assert_eq!(Notice::returned(&book).title, "Book Returned");
        assert_eq!(
            Notice::deleted(&book).message,
            "\"The Hobbit\" has been removed from the library."
        );
    }
}
