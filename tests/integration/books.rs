//! Book screens over real HTTP

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use bookshelf::{
    api::BookApi,
    models::BookField,
    nav::Route,
    services::{
        detail::DetailState,
        form::{BookForm, SubmitOutcome},
        list::{DeleteOutcome, ListOutcome},
    },
    AppError,
};

use crate::server::{book, FakeApi};

fn fill_dune(form: &BookForm) {
    form.on_field_change(BookField::Title, "Dune");
    form.on_field_change(BookField::Author, "Herbert");
    form.on_field_change(BookField::Isbn, "123");
    form.on_field_change(BookField::Publisher, "Ace");
    form.on_field_change(BookField::Category, "SciFi");
    form.on_field_change(BookField::Quantity, "1");
    form.on_field_change(BookField::PublicationYear, "1965");
    form.on_field_change(BookField::IsAvailable, true);
}

#[tokio::test]
async fn test_create_posts_exact_form_data() {
    let api = FakeApi::start().await;
    let services = api.services();

    let form = BookForm::for_create();
    fill_dune(&form);
    let outcome = form.submit(&services.create_handler()).await;

    let SubmitOutcome::Saved { book, redirect } = outcome else {
        panic!("create did not succeed: {:?}", outcome);
    };
    assert_eq!(redirect, Route::Books);
    assert_eq!(book.title, "Dune");
    assert!(book.id > 0);

    let post = api.last_request("POST").expect("POST /books");
    assert_eq!(post.path, "/books");
    assert_eq!(
        post.body,
        json!({
            "title": "Dune",
            "author": "Herbert",
            "isbn": "123",
            "publisher": "Ace",
            "quantity": 1,
            "publicationYear": 1965,
            "category": "SciFi",
            "isAvailable": true
        })
    );

    let view = services.book_list();
    assert_eq!(view.list(None).await, ListOutcome::Applied(1));
    let listed = &view.books()[0];
    assert_eq!(listed.id, book.id);
    assert_eq!(listed.author, "Herbert");
    assert_eq!(listed.category, "SciFi");
    assert_eq!(listed.status_label(), "Available");
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let api = FakeApi::start().await;
    let services = api.services();

    let form = BookForm::for_create();
    form.on_field_change(BookField::Title, "Dune");
    let outcome = form.submit(&services.create_handler()).await;

    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.get(BookField::Author), Some("Author is required"));
    assert!(errors.get(BookField::Title).is_none());
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let api = FakeApi::start().await;
    let services = api.services();

    let form = BookForm::for_create();
    fill_dune(&form);
    let created = match form.submit(&services.create_handler()).await {
        SubmitOutcome::Saved { book, .. } => book,
        other => panic!("unexpected {:?}", other),
    };

    let fetched = assert_ok!(services.books.get_book(created.id).await);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_server_error_message_shown_verbatim() {
    let api = FakeApi::start().await;
    let services = api.services();

    let form = BookForm::for_create();
    fill_dune(&form);
    form.on_field_change(BookField::Isbn, "duplicate");

    let outcome = form.submit(&services.create_handler()).await;
    assert_eq!(outcome, SubmitOutcome::Failed("isbn must be unique".into()));
    assert_eq!(form.banner().as_deref(), Some("isbn must be unique"));
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn test_edit_sends_only_changed_fields() {
    let api = FakeApi::start().await;
    api.seed(vec![book("Dune", "Frank Herbert", "Sci-Fi")]);
    let services = api.services();

    let fetcher = services.book_detail(1);
    assert!(matches!(fetcher.fetch().await, DetailState::Loaded(_)));
    let form = fetcher.form().expect("loaded form");
    assert_eq!(form.submit_label(), "Update Book");

    form.on_field_change(BookField::Quantity, "7");
    let outcome = form.submit(&services.update_handler(1)).await;
    let SubmitOutcome::Saved { book, .. } = outcome else {
        panic!("update did not succeed");
    };
    assert_eq!(book.quantity, 7);
    assert_eq!(book.title, "Dune");

    let patch = api.last_request("PATCH").expect("PATCH request");
    assert_eq!(patch.path, "/books/1");
    assert_eq!(patch.body, json!({"quantity": 7}));
}

#[tokio::test]
async fn test_missing_book_fails_to_load() {
    let api = FakeApi::start().await;
    let services = api.services();

    let err = assert_err!(services.books.get_book(99).await);
    assert!(err.is_not_found());
    assert!(matches!(err, AppError::Api { status: 404, message: Some(ref m) } if m == "Book not found"));

    let fetcher = services.book_detail(99);
    assert_eq!(
        fetcher.fetch().await,
        DetailState::Failed("Failed to load book data".into())
    );
}

#[tokio::test]
async fn test_update_of_vanished_book_shows_server_message() {
    let api = FakeApi::start().await;
    api.seed(vec![book("Dune", "Frank Herbert", "Sci-Fi")]);
    let services = api.services();

    let fetcher = services.book_detail(1);
    assert!(matches!(fetcher.fetch().await, DetailState::Loaded(_)));
    let form = fetcher.form().expect("loaded form");
    api.state.lock().unwrap().books.clear();

    form.on_field_change(BookField::Quantity, "4");
    let outcome = form.submit(&services.update_handler(1)).await;
    assert_eq!(outcome, SubmitOutcome::Failed("Book not found".into()));
    assert_eq!(form.data().quantity, 4);
}

#[tokio::test]
async fn test_blank_search_equals_list() {
    let api = FakeApi::start().await;
    api.seed(vec![
        book("Dune", "Frank Herbert", "Sci-Fi"),
        book("Emma", "Jane Austen", "Classic"),
    ]);
    let services = api.services();
    let view = services.book_list();

    assert_eq!(view.list(None).await, ListOutcome::Applied(2));
    let listed = view.books();

    assert_eq!(view.list(Some("   ")).await, ListOutcome::Applied(2));
    assert_eq!(view.books(), listed);
    assert!(api.requests().iter().all(|r| r.path == "/books"));
}

#[tokio::test]
async fn test_server_search_unwraps_data() {
    let api = FakeApi::start().await;
    api.seed(vec![
        book("Dune", "Frank Herbert", "Sci-Fi"),
        book("Emma", "Jane Austen", "Classic"),
    ]);
    let services = api.services();
    let view = services.book_list();

    assert_eq!(view.list(Some("austen")).await, ListOutcome::Applied(1));
    assert_eq!(view.books()[0].title, "Emma");
    assert_eq!(view.query(), "austen");

    let search = api.last_request("POST").expect("search request");
    assert_eq!(search.path, "/books/search/books");
    assert_eq!(search.body["query"], "austen");
}

#[tokio::test]
async fn test_delete_removes_row() {
    let api = FakeApi::start().await;
    api.seed(vec![
        book("Dune", "Frank Herbert", "Sci-Fi"),
        book("Emma", "Jane Austen", "Classic"),
    ]);
    let services = api.services();
    let view = services.book_list();
    view.list(None).await;

    assert_eq!(view.delete(1, &|_: &str| true).await, DeleteOutcome::Deleted);
    assert_eq!(view.books().len(), 1);
    assert_eq!(view.books()[0].id, 2);
    assert_eq!(api.last_request("DELETE").map(|r| r.path).as_deref(), Some("/books/1"));
}

#[tokio::test]
async fn test_delete_refused_keeps_row() {
    let api = FakeApi::start().await;
    api.seed(vec![book("Dune", "Frank Herbert", "Sci-Fi")]);
    api.state.lock().unwrap().refuse_delete = Some("Book is on loan".into());
    let services = api.services();
    let view = services.book_list();
    view.list(None).await;

    let outcome = view.delete(1, &|_: &str| true).await;
    assert_eq!(outcome, DeleteOutcome::Rejected("Delete failed: Book is on loan".into()));
    assert_eq!(view.books().len(), 1);
    assert_eq!(view.banner().as_deref(), Some("Delete failed: Book is on loan"));
}

#[tokio::test]
async fn test_cancelled_delete_sends_nothing() {
    let api = FakeApi::start().await;
    api.seed(vec![book("Dune", "Frank Herbert", "Sci-Fi")]);
    let services = api.services();
    let view = services.book_list();
    view.list(None).await;

    assert_eq!(view.delete(1, &|_: &str| false).await, DeleteOutcome::Cancelled);
    assert!(api.last_request("DELETE").is_none());
}

#[tokio::test]
async fn test_inline_modal_create_updates_cache() {
    let api = FakeApi::start().await;
    let services = api.services();
    let view = services.book_list();
    view.list(None).await;

    let form = view.open_create();
    fill_dune(&form);
    view.submit_modal().await;

    assert!(!view.modal_is_open());
    assert_eq!(view.books().len(), 1);
    assert_eq!(view.books()[0].title, "Dune");
}

#[tokio::test]
async fn test_unreachable_server_is_connectivity_error() {
    let api = FakeApi::start().await;
    let mut config = api.config();
    // port 9 (discard) is not served by anything here
    config.api.base_url = "http://127.0.0.1:9".to_string();
    let services = bookshelf::Services::new(config, bookshelf::Session::in_memory()).unwrap();

    let err = assert_err!(services.books.list_books().await);
    assert!(err.is_connectivity());

    let view = services.book_list();
    assert_eq!(
        view.list(None).await,
        ListOutcome::Failed("Failed to fetch books. Please try again.".into())
    );
}
