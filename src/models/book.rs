//! Book model and the form-side types derived from it.
//!
//! `Book` is the server-owned record (it carries the `id`); `BookFormData` is the
//! editable subset used by both the create and the edit flows. Wire format is the
//! camelCase JSON of the REST API.

use std::fmt;

use chrono::{Datelike, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub type BookId = i64;

fn default_true() -> bool {
    true
}

/// Persisted book as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub quantity: i32,
    pub publication_year: i32,
    pub category: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Book {
    /// Badge label shown in list rows
    pub fn status_label(&self) -> &'static str {
        if self.is_available {
            "Available"
        } else {
            "Unavailable"
        }
    }

    /// Case-insensitive substring match on the searchable fields
    pub fn matches(&self, needle: &str, fields: &[SearchField]) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        fields.iter().any(|field| {
            let haystack = match field {
                SearchField::Title => &self.title,
                SearchField::Author => &self.author,
                SearchField::Category => &self.category,
            };
            haystack.to_lowercase().contains(&needle)
        })
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Editable book fields (no `id`), used for create and edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookFormData {
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Author is required"))]
    pub author: String,
    #[validate(custom(function = "not_blank", message = "ISBN is required"))]
    pub isbn: String,
    #[validate(custom(function = "not_blank", message = "Publisher is required"))]
    pub publisher: String,
    pub quantity: i32,
    pub publication_year: i32,
    #[validate(custom(function = "not_blank", message = "Category is required"))]
    pub category: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Default for BookFormData {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            publisher: String::new(),
            quantity: 1,
            publication_year: Local::now().year(),
            category: String::new(),
            is_available: true,
        }
    }
}

impl From<&Book> for BookFormData {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            publisher: book.publisher.clone(),
            quantity: book.quantity,
            publication_year: book.publication_year,
            category: book.category.clone(),
            is_available: book.is_available,
        }
    }
}

impl BookFormData {
    /// Presence check on the required text fields.
    ///
    /// Quantity and publication year are deliberately left unchecked.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        let Err(validation) = self.validate() else {
            return errors;
        };
        let by_field = validation.field_errors();
        for field in BookField::ALL {
            if let Some(list) = by_field.get(field.ident()) {
                let message = list
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is required", field.label()));
                errors.insert(field, message);
            }
        }
        errors
    }
}

/// Form field kinds, mirroring the input types of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Checkbox,
}

/// Every field of `BookFormData`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BookField {
    Title,
    Author,
    Isbn,
    Publisher,
    Quantity,
    PublicationYear,
    Category,
    IsAvailable,
}

impl BookField {
    pub const ALL: [BookField; 8] = [
        BookField::Title,
        BookField::Author,
        BookField::Isbn,
        BookField::Publisher,
        BookField::Category,
        BookField::Quantity,
        BookField::PublicationYear,
        BookField::IsAvailable,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            BookField::Quantity | BookField::PublicationYear => FieldKind::Number,
            BookField::IsAvailable => FieldKind::Checkbox,
            _ => FieldKind::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Isbn => "ISBN",
            BookField::Publisher => "Publisher",
            BookField::Quantity => "Quantity",
            BookField::PublicationYear => "Publication Year",
            BookField::Category => "Category",
            BookField::IsAvailable => "Available for checkout",
        }
    }

    /// JSON / form input name
    pub fn name(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Isbn => "isbn",
            BookField::Publisher => "publisher",
            BookField::Quantity => "quantity",
            BookField::PublicationYear => "publicationYear",
            BookField::Category => "category",
            BookField::IsAvailable => "isAvailable",
        }
    }

    /// Rust field identifier, as reported by `validator`
    fn ident(self) -> &'static str {
        match self {
            BookField::PublicationYear => "publication_year",
            BookField::IsAvailable => "is_available",
            other => other.name(),
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for BookField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "title" => Ok(BookField::Title),
            "author" => Ok(BookField::Author),
            "isbn" => Ok(BookField::Isbn),
            "publisher" => Ok(BookField::Publisher),
            "quantity" => Ok(BookField::Quantity),
            "publicationyear" | "year" => Ok(BookField::PublicationYear),
            "category" => Ok(BookField::Category),
            "isavailable" | "available" => Ok(BookField::IsAvailable),
            _ => Err(format!("Unknown book field: {}", s)),
        }
    }
}

/// Field name to human-readable message, in form order. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(IndexMap<BookField, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: BookField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn remove(&mut self, field: BookField) -> Option<String> {
        self.0.shift_remove(&field)
    }

    pub fn get(&self, field: BookField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: BookField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BookField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Merge `other` into `self`, keeping existing entries
    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Changed fields only, sent as the PATCH body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    (before != after).then(|| after.clone())
}

impl BookPatch {
    /// Fields of `current` that differ from `initial`
    pub fn between(initial: &BookFormData, current: &BookFormData) -> Self {
        Self {
            title: changed(&initial.title, &current.title),
            author: changed(&initial.author, &current.author),
            isbn: changed(&initial.isbn, &current.isbn),
            publisher: changed(&initial.publisher, &current.publisher),
            quantity: changed(&initial.quantity, &current.quantity),
            publication_year: changed(&initial.publication_year, &current.publication_year),
            category: changed(&initial.category, &current.category),
            is_available: changed(&initial.is_available, &current.is_available),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == BookPatch::default()
    }

    /// Apply the patch on top of an existing record
    pub fn apply(&self, book: &mut Book) {
        if let Some(ref v) = self.title {
            book.title = v.clone();
        }
        if let Some(ref v) = self.author {
            book.author = v.clone();
        }
        if let Some(ref v) = self.isbn {
            book.isbn = v.clone();
        }
        if let Some(ref v) = self.publisher {
            book.publisher = v.clone();
        }
        if let Some(v) = self.quantity {
            book.quantity = v;
        }
        if let Some(v) = self.publication_year {
            book.publication_year = v;
        }
        if let Some(ref v) = self.category {
            book.category = v.clone();
        }
        if let Some(v) = self.is_available {
            book.is_available = v;
        }
    }
}

/// Acknowledgement returned by DELETE /books/{id}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Fields the server-side search may look into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Title,
    Author,
    Category,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Title, SearchField::Author, SearchField::Category];
}

/// Body of POST /books/search/books
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<SearchField>>,
}

/// Search results come either bare or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    List(Vec<Book>),
    Wrapped { data: Vec<Book> },
}

impl SearchResponse {
    /// Interpret an arbitrary JSON body; `None` when the shape is unknown
    pub fn from_value(value: serde_json::Value) -> Option<Vec<Book>> {
        match serde_json::from_value::<SearchResponse>(value) {
            Ok(SearchResponse::List(books)) | Ok(SearchResponse::Wrapped { data: books }) => Some(books),
            Err(_) => None,
        }
    }
}
