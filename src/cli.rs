use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_PLACEHOLDER_TITLE, TitlePolicy};
use crate::fetch::DEFAULT_USER_AGENT;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Harvest every book of a catalog into one JSON file.
    Harvest(HarvestArgs),
    /// Harvest a single book and print its record to stdout.
    Book(BookArgs),
    /// Print the navigation scraped from a live book page.
    Nav(NavArgs),
}

#[derive(Debug, Args)]
pub struct HarvestArgs {
    /// Input catalog (YAML list of html_url/code_url/release/toc_path).
    #[arg(long, default_value = "books.yml")]
    pub catalog: String,

    /// Output file path for the harvested chapters.
    #[arg(long, short, default_value = "chapters.json")]
    pub out: String,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub title: TitleArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Published root page of the book.
    #[arg(long)]
    pub html_url: String,

    /// Repository URL (GitHub or GitLab).
    #[arg(long)]
    pub code_url: String,

    /// Tag the live site was built from, or `main`.
    #[arg(long, default_value = "main")]
    pub release: String,

    /// Repository-relative path to the ToC descriptor.
    #[arg(long, default_value = "book/_toc.yml")]
    pub toc_path: String,

    #[command(flatten)]
    pub title: TitleArgs,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Debug, Args)]
pub struct NavArgs {
    /// Live book page (must be http/https).
    #[arg(long)]
    pub url: String,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Debug, Args)]
pub struct TitleArgs {
    /// Config title that is replaced by the repository name.
    #[arg(long, default_value = DEFAULT_PLACEHOLDER_TITLE)]
    pub placeholder_title: String,

    /// Keep config titles as written, even the placeholder.
    #[arg(long, conflicts_with = "placeholder_title")]
    pub keep_placeholder_title: bool,
}

impl TitleArgs {
    pub fn policy(&self) -> TitlePolicy {
        if self.keep_placeholder_title {
            TitlePolicy::Keep
        } else {
            TitlePolicy::ReplacePlaceholder(self.placeholder_title.clone())
        }
    }
}

#[derive(Debug, Args)]
pub struct HttpArgs {
    /// Timeout of each HTTP request.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}
