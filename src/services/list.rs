//! Book list view: collection cache, search, delete and the inline editor

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use super::{
    detail::{BookDetailFetcher, DetailState},
    form::{BookForm, CreateBook, SubmitHandler, SubmitOutcome, UpdateBook},
    lock,
    modal::ModalHost,
    InFlight,
};
use crate::{
    api::BookApi,
    config::{ListConfig, SearchMode, DEFAULT_WIDE_BREAKPOINT},
    error::{AppError, AppResult},
    models::{Book, BookId, SearchField, SearchRequest},
};

pub const EMPTY_PLACEHOLDER: &str = "No books found matching your search";
pub const LOADING: &str = "Loading books...";
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this book?";

/// How a non-blank query is answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStrategy {
    /// POST the raw query (and optionally the field list) to the server
    Server { fields: Option<Vec<SearchField>> },
    /// Fetch the full list and filter it here
    Client { fields: Vec<SearchField> },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        SearchStrategy::Server {
            fields: Some(SearchField::ALL.to_vec()),
        }
    }
}

impl SearchStrategy {
    pub fn from_config(config: &ListConfig) -> Self {
        match config.search_strategy {
            SearchMode::Server => SearchStrategy::Server {
                fields: (!config.search_fields.is_empty()).then(|| config.search_fields.clone()),
            },
            SearchMode::Client => SearchStrategy::Client {
                fields: if config.search_fields.is_empty() {
                    SearchField::ALL.to_vec()
                } else {
                    config.search_fields.clone()
                },
            },
        }
    }
}

/// Interactive yes/no prompt
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    /// The collection was replaced with this many books
    Applied(usize),
    /// A newer request was issued meanwhile; this response was dropped
    Stale,
    /// The previous collection is still shown
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent
    Cancelled,
    Deleted,
    /// The server answered `success: false`
    Rejected(String),
    /// The request did not complete
    Failed(String),
    Busy,
}

/// Result of submitting the inline editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalOutcome {
    NotOpen,
    Submitted(SubmitOutcome),
}

/// Form hosted by the modal, with the record it edits (if any)
#[derive(Debug, Clone)]
pub struct InlineEditor {
    pub form: Arc<BookForm>,
    pub target: Option<BookId>,
}

#[derive(Debug, Default)]
struct ListState {
    books: Vec<Book>,
    query: String,
    loading: bool,
    banner: Option<String>,
}

pub struct BookListView {
    api: Arc<dyn BookApi>,
    strategy: SearchStrategy,
    wide_breakpoint: usize,
    state: Mutex<ListState>,
    latest_ticket: AtomicU64,
    deleting: AtomicBool,
    modal: Mutex<ModalHost<InlineEditor>>,
}

impl BookListView {
    pub fn new(api: Arc<dyn BookApi>, strategy: SearchStrategy) -> Self {
        Self {
            api,
            strategy,
            wide_breakpoint: DEFAULT_WIDE_BREAKPOINT,
            state: Mutex::new(ListState::default()),
            latest_ticket: AtomicU64::new(0),
            deleting: AtomicBool::new(false),
            modal: Mutex::new(ModalHost::new()),
        }
    }

    pub fn from_config(api: Arc<dyn BookApi>, config: &ListConfig) -> Self {
        let mut view = Self::new(api, SearchStrategy::from_config(config));
        view.wide_breakpoint = config.wide_breakpoint;
        view
    }

    pub fn books(&self) -> Vec<Book> {
        lock(&self.state).books.clone()
    }

    pub fn query(&self) -> String {
        lock(&self.state).query.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn banner(&self) -> Option<String> {
        lock(&self.state).banner.clone()
    }

    pub fn dismiss_banner(&self) {
        lock(&self.state).banner = None;
    }

    /// Fetch the collection, or search it when `query` is not blank.
    ///
    /// Each call takes a ticket; a response that comes back after a newer call was
    /// issued is discarded so the latest request always wins.
    pub async fn list(&self, query: Option<&str>) -> ListOutcome {
        let query = query.unwrap_or_default().to_string();
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = lock(&self.state);
            state.query = query.clone();
            state.loading = true;
        }

        let searching = !query.trim().is_empty();
        let result = if searching {
            self.search(&query).await
        } else {
            self.api.list_books().await
        };

        if self.latest_ticket.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Discarding stale response for request #{}", ticket);
            return ListOutcome::Stale;
        }

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok(books) => {
                let count = books.len();
                state.books = books;
                state.banner = None;
                ListOutcome::Applied(count)
            }
            Err(e) => {
                let message = if searching {
                    tracing::error!("Search failed: {}", e);
                    "Failed to search books. Please try again."
                } else {
                    tracing::error!("Failed to fetch books: {}", e);
                    "Failed to fetch books. Please try again."
                };
                state.banner = Some(message.to_string());
                ListOutcome::Failed(message.to_string())
            }
        }
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Book>> {
        match &self.strategy {
            SearchStrategy::Server { fields } => {
                let request = SearchRequest {
                    query: query.to_string(),
                    search_fields: fields.clone(),
                };
                self.api.search_books(&request).await
            }
            SearchStrategy::Client { fields } => {
                let books = self.api.list_books().await?;
                Ok(books
                    .into_iter()
                    .filter(|book| book.matches(query, fields))
                    .collect())
            }
        }
    }

    /// Delete after confirmation; the cache only changes on a positive acknowledgement
    pub async fn delete(&self, id: BookId, confirm: &dyn Confirm) -> DeleteOutcome {
        if !confirm.confirm(DELETE_PROMPT) {
            tracing::debug!("Delete of book {} cancelled", id);
            return DeleteOutcome::Cancelled;
        }

        let Some(_guard) = InFlight::acquire(&self.deleting) else {
            return DeleteOutcome::Busy;
        };

        match self.api.delete_book(id).await {
            Ok(ack) if ack.success => {
                let mut state = lock(&self.state);
                state.books.retain(|book| book.id != id);
                tracing::info!("Deleted book {}", id);
                DeleteOutcome::Deleted
            }
            Ok(ack) => {
                let message = format!(
                    "Delete failed: {}",
                    ack.message.unwrap_or_else(|| "Unknown error".to_string())
                );
                tracing::warn!("{}", message);
                lock(&self.state).banner = Some(message.clone());
                DeleteOutcome::Rejected(message)
            }
            Err(e) => {
                tracing::error!("Delete failed: {}", e);
                let message = format!("Delete failed: {}", e.user_message());
                lock(&self.state).banner = Some(message.clone());
                DeleteOutcome::Failed(message)
            }
        }
    }

    /// Put a saved record into the cache: replace by id, or append
    pub fn apply_saved(&self, book: Book) {
        let mut state = lock(&self.state);
        match state.books.iter_mut().find(|b| b.id == book.id) {
            Some(existing) => *existing = book,
            None => state.books.push(book),
        }
    }

    // Inline editor (single-page variant)

    pub fn modal_is_open(&self) -> bool {
        lock(&self.modal).is_open()
    }

    pub fn modal_form(&self) -> Option<Arc<BookForm>> {
        lock(&self.modal).content().map(|editor| editor.form.clone())
    }

    pub fn open_create(&self) -> Arc<BookForm> {
        let form = Arc::new(BookForm::for_create());
        lock(&self.modal).open(
            "Add New Book",
            InlineEditor {
                form: form.clone(),
                target: None,
            },
        );
        form
    }

    /// Open the editor on a cached record, fetching it when it is not cached
    pub async fn open_edit(&self, id: BookId) -> AppResult<Arc<BookForm>> {
        let cached = lock(&self.state).books.iter().find(|b| b.id == id).cloned();
        let book = match cached {
            Some(book) => book,
            None => {
                let fetcher = BookDetailFetcher::new(self.api.clone(), id);
                match fetcher.fetch().await {
                    DetailState::Loaded(book) => book,
                    DetailState::Failed(message) => return Err(AppError::NotFound(message)),
                    DetailState::Loading => return Err(AppError::Internal("Book still loading".into())),
                }
            }
        };

        let form = Arc::new(BookForm::for_edit(&book));
        lock(&self.modal).open(
            "Edit Book",
            InlineEditor {
                form: form.clone(),
                target: Some(id),
            },
        );
        Ok(form)
    }

    pub fn close_modal(&self) {
        lock(&self.modal).close();
    }

    /// Submit the hosted form; on success patch the cache and close the modal
    pub async fn submit_modal(&self) -> ModalOutcome {
        let Some(editor) = lock(&self.modal).content().cloned() else {
            return ModalOutcome::NotOpen;
        };

        let handler: Box<dyn SubmitHandler> = match editor.target {
            Some(id) => Box::new(UpdateBook::new(self.api.clone(), id)),
            None => Box::new(CreateBook::new(self.api.clone())),
        };

        let outcome = editor.form.submit(handler.as_ref()).await;
        if let SubmitOutcome::Saved { ref book, .. } = outcome {
            self.apply_saved(book.clone());
            self.close_modal();
        }
        ModalOutcome::Submitted(outcome)
    }

    /// Text rendering: table at or above the breakpoint, cards below it
    pub fn render(&self, width: usize) -> String {
        let state = lock(&self.state);
        let mut out = String::new();

        if let Some(ref banner) = state.banner {
            out.push_str(&format!("! {}\n\n", banner));
        }

        if state.loading {
            out.push_str(LOADING);
        } else if state.books.is_empty() {
            out.push_str(EMPTY_PLACEHOLDER);
        } else if width >= self.wide_breakpoint {
            out.push_str(&render_table(&state.books));
        } else {
            out.push_str(&render_cards(&state.books));
        }
        drop(state);

        let modal = lock(&self.modal);
        if let Some(editor) = modal.content() {
            if let Some(frame) = modal.render(&editor.form.render()) {
                out.push_str("\n\n");
                out.push_str(&frame);
            }
        }
        out
    }
}

const TABLE_HEADERS: [&str; 6] = ["ID", "Title", "Author", "Category", "Year", "Status"];

fn render_table(books: &[Book]) -> String {
    let rows: Vec<[String; 6]> = books
        .iter()
        .map(|b| {
            [
                b.id.to_string(),
                b.title.clone(),
                b.author.clone(),
                b.category.clone(),
                b.publication_year.to_string(),
                b.status_label().to_string(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = TABLE_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut lines = vec![format_row(&header[..])];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.extend(rows.iter().map(|row| format_row(&row[..])));
    lines.join("\n")
}

fn render_cards(books: &[Book]) -> String {
    books
        .iter()
        .map(|b| {
            format!(
                "{} (#{})\n  Author:   {}\n  Category: {}\n  Year:     {}\n  Status:   {}",
                b.title,
                b.id,
                b.author,
                b.category,
                b.publication_year,
                b.status_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
