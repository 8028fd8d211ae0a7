//! Bookshelf - Library catalog client
//!
//! Command-line front end over the Bookshelf view models.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookshelf::{
    config::AppConfig,
    models::{BookField, BookId},
    nav::{Navbar, Route},
    services::{
        auth::AuthOutcome,
        detail::DetailState,
        form::{BookForm, SubmitHandler, SubmitOutcome},
        list::{DeleteOutcome, ListOutcome},
    },
    Services, Session,
};

#[derive(Parser)]
#[command(name = "bookshelf", version, about = "Library catalog client")]
struct Cli {
    /// Terminal width used to pick the table or card layout
    #[arg(long, global = true, env = "COLUMNS", default_value_t = 120)]
    width: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List books, or search them
    List {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show one book
    Show { id: BookId },
    /// Add a book
    Add(BookArgs),
    /// Edit a book; only the given fields change
    Edit {
        id: BookId,
        #[command(flatten)]
        fields: BookArgs,
    },
    /// Delete a book
    Delete {
        id: BookId,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Sign in and store the token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Forget the stored token
    Logout,
    /// Show who is signed in
    Whoami,
}

/// Form fields, passed through the form's change handler as raw text
#[derive(Args, Default)]
struct BookArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    isbn: Option<String>,
    #[arg(long)]
    publisher: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    quantity: Option<String>,
    #[arg(long = "year")]
    publication_year: Option<String>,
    /// true or false
    #[arg(long)]
    available: Option<String>,
}

impl BookArgs {
    fn apply(self, form: &BookForm) {
        let values = [
            (BookField::Title, self.title),
            (BookField::Author, self.author),
            (BookField::Isbn, self.isbn),
            (BookField::Publisher, self.publisher),
            (BookField::Category, self.category),
            (BookField::Quantity, self.quantity),
            (BookField::PublicationYear, self.publication_year),
            (BookField::IsAvailable, self.available),
        ];
        for (field, value) in values {
            if let Some(value) = value {
                form.on_field_change(field, value);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookshelf={}", config.logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }

    tracing::debug!("Bookshelf v{} against {}", env!("CARGO_PKG_VERSION"), config.api.base_url);

    let cli = Cli::parse();
    let session = Session::from_path(&config.session.path).context("Failed to open session")?;
    let services = Services::new(config, session)?;

    run(cli, &services).await
}

async fn run(cli: Cli, services: &Services) -> anyhow::Result<()> {
    let width = cli.width;
    match cli.command {
        Command::List { query } => show_list(services, query.as_deref(), width).await,
        Command::Show { id } => {
            let fetcher = services.book_detail(id);
            match fetcher.fetch().await {
                DetailState::Loaded(book) => {
                    println!("{}", serde_json::to_string_pretty(&book)?);
                    Ok(())
                }
                DetailState::Failed(message) => bail!(message),
                DetailState::Loading => Ok(()),
            }
        }
        Command::Add(fields) => {
            let form = BookForm::for_create();
            fields.apply(&form);
            let handler = services.create_handler();
            submit(services, &form, &handler, width).await
        }
        Command::Edit { id, fields } => {
            let fetcher = services.book_detail(id);
            if let DetailState::Failed(message) = fetcher.fetch().await {
                bail!("{} (return to {})", message, fetcher.back());
            }
            let Some(form) = fetcher.form() else {
                bail!("Book {} is not loaded", id);
            };
            fields.apply(&form);
            let handler = services.update_handler(id);
            submit(services, &form, &handler, width).await
        }
        Command::Delete { id, yes } => {
            let view = services.book_list();
            view.list(None).await;
            let confirm = |message: &str| yes || ask(message);
            match view.delete(id, &confirm).await {
                DeleteOutcome::Deleted => {
                    println!("Book {} deleted", id);
                    println!("{}", view.render(width));
                    Ok(())
                }
                DeleteOutcome::Cancelled => Ok(()),
                DeleteOutcome::Rejected(message) | DeleteOutcome::Failed(message) => bail!(message),
                DeleteOutcome::Busy => bail!("A delete is already in progress"),
            }
        }
        Command::Login { email, password } => {
            println!("{}", services.auth.login_label());
            match services.auth.login(&email, &password).await {
                AuthOutcome::Redirect(route) => navigate(services, route, width).await,
                AuthOutcome::Rejected(message) => bail!(message),
                AuthOutcome::Busy => Ok(()),
            }
        }
        Command::Register {
            name,
            email,
            password,
            confirm,
        } => match services.auth.register(&name, &email, &password, &confirm).await {
            AuthOutcome::Redirect(route) => {
                println!("Account created, please sign in ({})", route);
                Ok(())
            }
            AuthOutcome::Rejected(message) => bail!(message),
            AuthOutcome::Busy => Ok(()),
        },
        Command::Logout => {
            let route = services.auth.logout()?;
            println!("Signed out ({})", route);
            Ok(())
        }
        Command::Whoami => {
            println!("{}", Navbar::new(services.session.username(), Route::Books).render());
            Ok(())
        }
    }
}

async fn submit(
    services: &Services,
    form: &BookForm,
    handler: &dyn SubmitHandler,
    width: usize,
) -> anyhow::Result<()> {
    match form.submit(handler).await {
        SubmitOutcome::Saved { book, redirect } => {
            println!("Saved \"{}\" (#{})", book.title, book.id);
            navigate(services, redirect, width).await
        }
        SubmitOutcome::Invalid(_) => {
            println!("{}", form.render());
            bail!("Please fix the highlighted fields")
        }
        SubmitOutcome::Failed(message) => bail!(message),
        SubmitOutcome::Busy => Ok(()),
    }
}

async fn navigate(services: &Services, route: Route, width: usize) -> anyhow::Result<()> {
    match route.resolve() {
        Route::Books => show_list(services, None, width).await,
        other => {
            println!("-> {}", other);
            Ok(())
        }
    }
}

async fn show_list(services: &Services, query: Option<&str>, width: usize) -> anyhow::Result<()> {
    let view = services.book_list();
    println!("{}\n", Navbar::new(services.session.username(), Route::Books).render());
    let outcome = view.list(query).await;
    println!("{}", view.render(width));
    if let ListOutcome::Failed(message) = outcome {
        bail!(message);
    }
    Ok(())
}

fn ask(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
