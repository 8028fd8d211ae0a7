//! Book form shared by the create and edit flows

use std::sync::{atomic::AtomicBool, Arc, Mutex};

use async_trait::async_trait;

use super::{lock, InFlight};
use crate::{
    api::BookApi,
    error::AppResult,
    models::{Book, BookField, BookFormData, BookId, BookPatch, FieldErrors, FieldKind},
    nav::Route,
};

/// Raw input coming from a form control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Checked(b)
    }
}

/// Caller-supplied action run with a validated form
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// `initial` is what the form was opened with, `data` what it holds now
    async fn submit(&self, initial: &BookFormData, data: &BookFormData) -> AppResult<Book>;

    /// Banner shown when `submit` fails without a server message
    fn failure_message(&self) -> &'static str;
}

/// POST /books
pub struct CreateBook {
    api: Arc<dyn BookApi>,
}

impl CreateBook {
    pub fn new(api: Arc<dyn BookApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SubmitHandler for CreateBook {
    async fn submit(&self, _initial: &BookFormData, data: &BookFormData) -> AppResult<Book> {
        self.api.create_book(data).await
    }

    fn failure_message(&self) -> &'static str {
        "Failed to add book. Please try again."
    }
}

/// PATCH /books/{id} with the fields that changed since the form was opened
pub struct UpdateBook {
    api: Arc<dyn BookApi>,
    id: BookId,
}

impl UpdateBook {
    pub fn new(api: Arc<dyn BookApi>, id: BookId) -> Self {
        Self { api, id }
    }
}

#[async_trait]
impl SubmitHandler for UpdateBook {
    async fn submit(&self, initial: &BookFormData, data: &BookFormData) -> AppResult<Book> {
        let patch = BookPatch::between(initial, data);
        self.api.update_book(self.id, &patch).await
    }

    fn failure_message(&self) -> &'static str {
        "Failed to update book. Please try again."
    }
}

/// Result of a submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Client-side validation failed, nothing was sent
    Invalid(FieldErrors),
    /// The handler succeeded
    Saved { book: Book, redirect: Route },
    /// The handler failed; the form keeps its data
    Failed(String),
    /// Another submission is still running
    Busy,
}

#[derive(Debug)]
struct FormState {
    initial: BookFormData,
    data: BookFormData,
    errors: FieldErrors,
    /// Rejected numeric input, kept until a valid value replaces it
    coercion_errors: FieldErrors,
    banner: Option<String>,
}

/// Controlled form bound to a `BookFormData`
#[derive(Debug)]
pub struct BookForm {
    state: Mutex<FormState>,
    submitting: AtomicBool,
    submit_label: String,
    is_edit: bool,
}

impl BookForm {
    pub fn new(initial: BookFormData, submit_label: impl Into<String>, is_edit: bool) -> Self {
        Self {
            state: Mutex::new(FormState {
                initial: initial.clone(),
                data: initial,
                errors: FieldErrors::default(),
                coercion_errors: FieldErrors::default(),
                banner: None,
            }),
            submitting: AtomicBool::new(false),
            submit_label: submit_label.into(),
            is_edit,
        }
    }

    /// Empty form for the add flow
    pub fn for_create() -> Self {
        Self::new(BookFormData::default(), "Add Book", false)
    }

    /// Form pre-filled from a fetched record
    pub fn for_edit(book: &Book) -> Self {
        Self::new(BookFormData::from(book), "Update Book", true)
    }

    pub fn is_edit(&self) -> bool {
        self.is_edit
    }

    pub fn data(&self) -> BookFormData {
        lock(&self.state).data.clone()
    }

    /// Errors from the last validation, plus pending coercion errors
    pub fn errors(&self) -> FieldErrors {
        let state = lock(&self.state);
        let mut errors = state.errors.clone();
        errors.extend(state.coercion_errors.clone());
        errors
    }

    pub fn banner(&self) -> Option<String> {
        lock(&self.state).banner.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn submit_label(&self) -> String {
        if self.is_submitting() {
            "Saving...".to_string()
        } else {
            self.submit_label.clone()
        }
    }

    /// Store a control's value according to the field's input type.
    ///
    /// Numeric fields only accept integers: anything else keeps the previous
    /// value and records `<Label> must be a number`.
    pub fn on_field_change(&self, field: BookField, value: impl Into<FieldValue>) {
        let value = value.into();
        let mut state = lock(&self.state);

        match (field.kind(), value) {
            (FieldKind::Checkbox, FieldValue::Checked(checked)) => state.data.is_available = checked,
            (FieldKind::Checkbox, FieldValue::Text(raw)) => match parse_flag(&raw) {
                Some(checked) => state.data.is_available = checked,
                None => tracing::warn!("Ignoring non-boolean value for {}", field),
            },
            (FieldKind::Number, FieldValue::Text(raw)) => match raw.trim().parse::<i32>() {
                Ok(n) => {
                    match field {
                        BookField::Quantity => state.data.quantity = n,
                        _ => state.data.publication_year = n,
                    }
                    state.coercion_errors.remove(field);
                }
                Err(_) => {
                    tracing::debug!("Rejected non-numeric input for {}", field);
                    state
                        .coercion_errors
                        .insert(field, format!("{} must be a number", field.label()));
                }
            },
            (FieldKind::Text, FieldValue::Text(raw)) => match field {
                BookField::Title => state.data.title = raw,
                BookField::Author => state.data.author = raw,
                BookField::Isbn => state.data.isbn = raw,
                BookField::Publisher => state.data.publisher = raw,
                _ => state.data.category = raw,
            },
            (_, FieldValue::Checked(_)) => {
                tracing::warn!("Ignoring checkbox value for {}", field);
            }
        }
    }

    /// Required-field check; stores and returns the error map
    pub fn validate(&self) -> FieldErrors {
        let mut state = lock(&self.state);
        state.errors = state.data.field_errors();
        let mut errors = state.errors.clone();
        errors.extend(state.coercion_errors.clone());
        errors
    }

    /// Validate, then run `handler` with the current data
    pub async fn submit(&self, handler: &dyn SubmitHandler) -> SubmitOutcome {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!("Form has {} invalid field(s), not submitting", errors.len());
            return SubmitOutcome::Invalid(errors);
        }

        let Some(_guard) = InFlight::acquire(&self.submitting) else {
            return SubmitOutcome::Busy;
        };

        let (initial, data) = {
            let mut state = lock(&self.state);
            state.banner = None;
            (state.initial.clone(), state.data.clone())
        };

        match handler.submit(&initial, &data).await {
            Ok(book) => {
                tracing::info!("Book {} saved", book.id);
                lock(&self.state).initial = BookFormData::from(&book);
                SubmitOutcome::Saved {
                    book,
                    redirect: Route::Books,
                }
            }
            Err(e) => {
                tracing::error!("Form submission failed: {}", e);
                let message = e
                    .server_message()
                    .map_or_else(|| handler.failure_message().to_string(), str::to_string);
                lock(&self.state).banner = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Cancel goes back to the list without saving
    pub fn cancel(&self) -> Route {
        Route::Books
    }

    pub fn render(&self) -> String {
        let state = lock(&self.state);
        let mut errors = state.errors.clone();
        errors.extend(state.coercion_errors.clone());
        let data = &state.data;

        let mut out = String::new();
        if let Some(ref banner) = state.banner {
            out.push_str(&format!("! {}\n", banner));
        }
        for field in BookField::ALL {
            let value = match field {
                BookField::Title => data.title.clone(),
                BookField::Author => data.author.clone(),
                BookField::Isbn => data.isbn.clone(),
                BookField::Publisher => data.publisher.clone(),
                BookField::Category => data.category.clone(),
                BookField::Quantity => data.quantity.to_string(),
                BookField::PublicationYear => data.publication_year.to_string(),
                BookField::IsAvailable => (if data.is_available { "[x]" } else { "[ ]" }).to_string(),
            };
            out.push_str(&format!("{:<22} {}\n", format!("{}:", field.label()), value));
            if let Some(message) = errors.get(field) {
                out.push_str(&format!("{:<22} ^ {}\n", "", message));
            }
        }
        drop(state);
        out.push_str(&format!("[Cancel] [{}]", self.submit_label()));
        out
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" | "" => Some(false),
        _ => None,
    }
}
