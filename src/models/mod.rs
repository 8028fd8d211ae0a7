//! Data models for Bookshelf

pub mod auth;
pub mod book;

// Re-export commonly used types
pub use auth::{LoginRequest, LoginResponse, RegisterForm, RegisterRequest};
pub use book::{
    Book, BookField, BookFormData, BookId, BookPatch, DeleteAck, FieldErrors, FieldKind,
    SearchField, SearchRequest, SearchResponse,
};
