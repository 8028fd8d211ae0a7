//! View models driving the client screens

pub mod auth;
pub mod detail;
pub mod form;
pub mod list;
pub mod modal;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use crate::{
    api::{ApiClient, AuthApi, BookApi},
    config::AppConfig,
    error::AppResult,
    models::BookId,
    session::SharedSession,
};

/// Container for everything a screen needs
#[derive(Clone)]
pub struct Services {
    pub books: Arc<dyn BookApi>,
    pub auth: Arc<AuthGateway>,
    pub session: SharedSession,
    pub config: Arc<AppConfig>,
}

pub use auth::AuthGateway;
pub use detail::BookDetailFetcher;
pub use form::BookForm;
pub use list::BookListView;

impl Services {
    /// Wire the HTTP client, the session and the gateways together
    pub fn new(config: AppConfig, session: SharedSession) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(&config.api, Some(session.clone()))?);
        Ok(Self::with_apis(config, session, client.clone(), client))
    }

    /// Same wiring over arbitrary API implementations
    pub fn with_apis(
        config: AppConfig,
        session: SharedSession,
        books: Arc<dyn BookApi>,
        auth: Arc<dyn AuthApi>,
    ) -> Self {
        Self {
            books,
            auth: Arc::new(AuthGateway::new(auth, session.clone())),
            session,
            config: Arc::new(config),
        }
    }

    pub fn book_list(&self) -> BookListView {
        BookListView::from_config(self.books.clone(), &self.config.list)
    }

    pub fn book_detail(&self, id: BookId) -> BookDetailFetcher {
        BookDetailFetcher::new(self.books.clone(), id)
    }

    pub fn create_handler(&self) -> form::CreateBook {
        form::CreateBook::new(self.books.clone())
    }

    pub fn update_handler(&self, id: BookId) -> form::UpdateBook {
        form::UpdateBook::new(self.books.clone(), id)
    }
}

/// Lock a view-model mutex; a poisoned lock still holds usable state
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Held while an operation is in flight; released on drop
pub(crate) struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    /// `None` when the flag is already taken
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
