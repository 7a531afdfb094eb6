//! CLI argument definitions for `locus`.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Autocomplete suggestions for partial input |
//! | `geocode` | Best match for a full address |
//! | `reverse` | Address at a coordinate |
//! | `validate` | USPS validation of a structured address |
//! | `zip` | City and state for a ZIP code |
//! | `status` | Configured backends and their health |
//!
//! Backends are configured through `LOCUS_*` environment variables, which are
//! also read from a `.env` file in the working directory.

use clap::{Args, Parser, Subcommand};

use locus_address::DEFAULT_SEARCH_LIMIT;

/// Address lookup and USPS validation from the command line.
#[derive(Debug, Parser)]
#[command(name = "locus", author, version, about)]
pub struct Cli {
    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Autocomplete suggestions for partial input.
    Search(SearchArgs),
    /// Best match for a full address.
    Geocode(GeocodeArgs),
    /// Address at a coordinate.
    Reverse(ReverseArgs),
    /// Validate and standardize an address with USPS.
    Validate(ValidateArgs),
    /// City and state for a five-digit ZIP code.
    Zip(ZipArgs),
    /// Show configured backends and their health.
    Status,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Partial address, at least three characters.
    pub query: String,

    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct GeocodeArgs {
    /// Full address. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub address: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReverseArgs {
    #[arg(allow_negative_numbers = true)]
    pub latitude: f64,

    #[arg(allow_negative_numbers = true)]
    pub longitude: f64,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long)]
    pub street: String,

    /// Apartment, suite or unit.
    #[arg(long)]
    pub secondary: Option<String>,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub zip: String,
}

#[derive(Debug, Args)]
pub struct ZipArgs {
    pub zip: String,
}
