//! Routes and the navbar model

use std::fmt;

use crate::models::BookId;

/// Screens of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Books,
    AddBook,
    EditBook(BookId),
    Login,
    Register,
}

impl Route {
    /// Parse a path such as `/books/12/edit`
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [""] => Some(Route::Home),
            ["books"] => Some(Route::Books),
            ["books", "add"] => Some(Route::AddBook),
            ["books", id, "edit"] => id.parse().ok().map(Route::EditBook),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Books => "/books".to_string(),
            Route::AddBook => "/books/add".to_string(),
            Route::EditBook(id) => format!("/books/{}/edit", id),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
        }
    }

    /// The home page only forwards to the book list
    pub fn resolve(self) -> Route {
        match self {
            Route::Home => Route::Books,
            other => other,
        }
    }

    pub fn is_auth_page(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Top bar: brand, current user and the add action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navbar {
    pub username: String,
    pub current: Route,
}

impl Navbar {
    pub fn new(username: impl Into<String>, current: Route) -> Self {
        Self {
            username: username.into(),
            current,
        }
    }

    /// "Add Book" is hidden on the login and register pages
    pub fn shows_add_book(&self) -> bool {
        !self.current.is_auth_page()
    }

    pub fn render(&self) -> String {
        let mut line = format!("Library Management | {}", self.username);
        if self.shows_add_book() {
            line.push_str(&format!(" | + Add Book ({})", Route::AddBook));
        }
        line
    }
}
