//! Single-book lookup for the edit flow

use std::sync::{Arc, Mutex};

use super::{form::BookForm, lock};
use crate::{
    api::BookApi,
    models::{Book, BookId},
    nav::Route,
};

pub const LOAD_FAILED: &str = "Failed to load book data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Loaded(Book),
    /// Recoverable: `fetch` may be called again, or the user returns to the list
    Failed(String),
}

pub struct BookDetailFetcher {
    api: Arc<dyn BookApi>,
    id: BookId,
    state: Mutex<DetailState>,
}

impl BookDetailFetcher {
    pub fn new(api: Arc<dyn BookApi>, id: BookId) -> Self {
        Self {
            api,
            id,
            state: Mutex::new(DetailState::Loading),
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn state(&self) -> DetailState {
        lock(&self.state).clone()
    }

    /// Resolve the book; a zero or negative id is never requested
    pub async fn fetch(&self) -> DetailState {
        if self.id <= 0 {
            tracing::warn!("Refusing to fetch book with invalid id {}", self.id);
            return self.set(DetailState::Failed(LOAD_FAILED.to_string()));
        }

        self.set(DetailState::Loading);
        match self.api.get_book(self.id).await {
            Ok(book) => self.set(DetailState::Loaded(book)),
            Err(e) => {
                tracing::error!("Failed to fetch book {}: {}", self.id, e);
                self.set(DetailState::Failed(LOAD_FAILED.to_string()))
            }
        }
    }

    /// Edit form for the loaded record
    pub fn form(&self) -> Option<BookForm> {
        match &*lock(&self.state) {
            DetailState::Loaded(book) => Some(BookForm::for_edit(book)),
            _ => None,
        }
    }

    /// "Return to Books"
    pub fn back(&self) -> Route {
        Route::Books
    }

    fn set(&self, state: DetailState) -> DetailState {
        *lock(&self.state) = state.clone();
        state
    }
}
