//! booknote CLI
//!
//! Offline access to the normalizers and the renderer: feed it provider
//! payloads or book records saved as JSON files.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use booknote_core::config::{system_locale, BooknoteConfig};
use booknote_core::sources::{
    CalibreSource, GoodreadsPage, GoodreadsSource, GoogleBooksSource, OpenLibrarySource, QueryOptions,
    DEFAULT_LIBRARY_ID,
};
use booknote_core::{create_book_tags, make_file_name_now, render_note, Book, ServiceProvider};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "booknote")]
#[command(version, about = "Normalize book metadata and render book notes", long_about = None)]
#[command(after_help = "EXAMPLES:
    booknote normalize --provider google volumes.json
    booknote render --config booknote.toml dune.json
    booknote tags dune.json")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize a saved provider payload into book records (JSON)
    Normalize {
        /// google, openlibrary, calibre or goodreads
        #[arg(short, long)]
        provider: ServiceProvider,

        /// Target language for Google Books results (defaults to the system locale)
        #[arg(long)]
        locale: Option<String>,

        /// Calibre content server URL used for cover links
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,

        /// Calibre library id
        #[arg(long, default_value = DEFAULT_LIBRARY_ID)]
        library: String,

        /// Calibre book id of the detail payload
        #[arg(long, default_value = "0")]
        id: String,

        /// Provider payload; for goodreads, an extracted page as JSON
        #[arg(value_name = "PAYLOAD")]
        payload: PathBuf,
    },

    /// Render the note for a book record
    Render {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Template note, overriding the configured template file
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Book record (JSON)
        #[arg(value_name = "BOOK")]
        book: PathBuf,
    },

    /// Print the tags derived for a book record
    Tags {
        /// Book record (JSON)
        #[arg(value_name = "BOOK")]
        book: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Normalize {
            provider,
            locale,
            server,
            library,
            id,
            payload,
        } => {
            let json = fs::read_to_string(&payload)?;
            let books = normalize(provider, &json, locale, &server, &library, &id)?;
            info!("Normalized {} book(s) from {}", books.len(), provider.display_name());
            println!("{}", serde_json::to_string_pretty(&books)?);
        }
        Command::Render { config, template, book } => {
            let mut config = match config {
                Some(path) => BooknoteConfig::from_toml(&fs::read_to_string(path)?)?,
                None => BooknoteConfig::default(),
            };
            config.validate()?;
            if let Some(path) = &template {
                config.template_file = path.display().to_string();
            }
            let template_text = read_template(&config.template_file)?;
            let template_config = config.template_config(template_text);

            let book = read_book(&book)?;
            let file_name = make_file_name_now(&book, Some(config.file_name_format.as_str()));
            let rendered = render_note(&book, &template_config, None).await;
            println!("{}\n\n{}", file_name, rendered);
        }
        Command::Tags { book } => {
            for tag in create_book_tags(&read_book(&book)?) {
                println!("{}", tag);
            }
        }
    }

    Ok(())
}

fn normalize(
    provider: ServiceProvider,
    json: &str,
    locale: Option<String>,
    server: &str,
    library: &str,
    id: &str,
) -> Result<Vec<Book>, Box<dyn Error>> {
    Ok(match provider {
        ServiceProvider::Google => {
            let source = GoogleBooksSource::new(system_locale(), true, None);
            let options = QueryOptions { locale };
            source.parse_search_response(json, &source.target_language(&options))?
        }
        ServiceProvider::OpenLibrary => OpenLibrarySource::parse_search_response(json)?,
        ServiceProvider::Calibre => vec![CalibreSource::new(server, library).parse_book_detail(json, id)?],
        ServiceProvider::Goodreads => {
            let page: GoodreadsPage = serde_json::from_str(json)?;
            let link = page.canonical_url.clone().unwrap_or_default();
            vec![GoodreadsSource::normalize_page(&page, &link)]
        }
    })
}

fn read_book(path: &Path) -> Result<Book, Box<dyn Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn read_template(path: &str) -> Result<Option<String>, Box<dyn Error>> {
    if path.trim().is_empty() {
        return Ok(None);
    }
    debug!("Reading template {}", path);
    Ok(Some(fs::read_to_string(path)?))
}
