use serde::{Deserialize, Serialize};

use super::error::{LibraryError, LibraryResult};
use crate::utils;

/// Sentinel stored when a book has no publication year or genre.
pub const NOT_AVAILABLE: &str = "N/A";

/// A catalog entry plus its copy bookkeeping.
///
/// Counters are private so `borrowed_copies <= quantity` can only change through
/// [`Book::borrow_copy`], [`Book::return_copy`] and [`Book::add_stock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    title: String,
    author: String,
    isbn: String,
    publication_year: String,
    genre: String,
    quantity: u32,
    borrowed_copies: u32,
}

impl Book {
    /// Build a book from raw input, applying the field defaults.
    ///
    /// Title, author and ISBN are required; blank optional fields become `"N/A"` and a
    /// missing or invalid quantity becomes 1.
    pub fn new(input: NewBook) -> LibraryResult<Self> {
        let title = utils::non_blank(Some(input.title.as_str()));
        let author = utils::non_blank(Some(input.author.as_str()));
        let isbn = utils::non_blank(Some(input.isbn.as_str()));

        let (Some(title), Some(author), Some(isbn)) = (title.clone(), author.clone(), isbn.clone())
        else {
            let missing = [("title", title), ("author", author), ("isbn", isbn)]
                .into_iter()
                .filter(|(_, value)| value.is_none())
                .map(|(field, _)| field)
                .collect();
            return Err(LibraryError::Validation { missing });
        };

        Ok(Self {
            title,
            author,
            isbn,
            publication_year: utils::non_blank(input.publication_year.as_deref())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            genre: utils::non_blank(input.genre.as_deref())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            quantity: input.quantity.map_or(1, |q| q.coerce()),
            borrowed_copies: 0,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }

    pub fn publication_year(&self) -> &str {
        &self.publication_year
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn borrowed_copies(&self) -> u32 {
        self.borrowed_copies
    }

    /// Copies currently on the shelf; never negative.
    pub fn available_copies(&self) -> u32 {
        self.quantity.saturating_sub(self.borrowed_copies)
    }

    /// Check out one copy. Returns `false` and changes nothing when none is available.
    pub fn borrow_copy(&mut self) -> bool {
        if self.available_copies() == 0 {
            return false;
        }
        self.borrowed_copies += 1;
        true
    }

    /// Check a copy back in. Returns `false` and changes nothing when none is out.
    pub fn return_copy(&mut self) -> bool {
        if self.borrowed_copies == 0 {
            return false;
        }
        self.borrowed_copies -= 1;
        true
    }

    /// Grow the stock, e.g. when the same ISBN is added again.
    pub fn add_stock(&mut self, copies: u32) {
        self.quantity = self.quantity.saturating_add(copies);
    }

    /// Restore a saved borrow count, clamped to what the stock allows.
    pub(crate) fn with_borrowed_copies(mut self, borrowed: u32) -> Self {
        self.borrowed_copies = borrowed.min(self.quantity);
        self
    }

    /// Plain attribute view used for persistence and display.
    pub fn to_record(&self) -> BookRecord {
        BookRecord {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publication_year: self.publication_year.clone(),
            genre: self.genre.clone(),
            quantity: self.quantity,
            borrowed_copies: self.borrowed_copies,
            available_copies: self.available_copies(),
        }
    }
}

/// Input for [`Book::new`]. Optional fields fall back to `"N/A"` / 1 copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub publication_year: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub quantity: Option<QuantityInput>,
}

/// Accept `"1965"` and `1965` alike; the year is kept as text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            ..Self::default()
        }
    }

    pub fn publication_year(mut self, year: impl Into<String>) -> Self {
        self.publication_year = Some(year.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn quantity(mut self, quantity: impl Into<QuantityInput>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

/// Copy count as it arrives from a form or a stored record: a number or numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Count(i64),
    Fraction(f64),
    Text(String),
}

impl QuantityInput {
    /// The integer this input reads as, if any. Text is read up to the first non-digit.
    pub fn value(&self) -> Option<i64> {
        match self {
            QuantityInput::Count(count) => Some(*count),
            QuantityInput::Fraction(value) if value.is_finite() => Some(value.trunc() as i64),
            QuantityInput::Fraction(_) => None,
            QuantityInput::Text(text) => utils::leading_integer(text),
        }
    }

    /// Whether the input reads as at least one copy.
    pub fn is_valid(&self) -> bool {
        self.value().is_some_and(|count| count >= 1)
    }

    /// Quantity after coercion: anything unreadable or below 1 becomes 1.
    pub fn coerce(&self) -> u32 {
        match self.value() {
            Some(count) if count >= 1 => u32::try_from(count).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}

impl From<i64> for QuantityInput {
    fn from(count: i64) -> Self {
        QuantityInput::Count(count)
    }
}

impl From<u32> for QuantityInput {
    fn from(count: u32) -> Self {
        QuantityInput::Count(i64::from(count))
    }
}

impl From<&str> for QuantityInput {
    fn from(text: &str) -> Self {
        QuantityInput::Text(text.to_string())
    }
}

/// Serialized form of a book, including the derived available count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: String,
    pub genre: String,
    pub quantity: u32,
    pub borrowed_copies: u32,
    pub available_copies: u32,
}
