use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::parse_date;

#[derive(Parser)]
#[command(name = "tracker")]
#[command(version)]
#[command(about = "Turns application emails into a monthly job-search report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, reconcile and export a mail export end to end
    Run {
        /// JSON export of the mailbox
        #[arg(short, long)]
        mails: PathBuf,

        /// Only mails received on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_since)]
        since: Option<NaiveDate>,

        /// Subject keyword; repeat for several. Replaces SEARCH_TERMS
        #[arg(short, long = "term")]
        terms: Vec<String>,

        /// Group by employer and job title instead of employer only
        #[arg(long)]
        include_role: bool,

        /// Never ask for missing job titles or addresses
        #[arg(long)]
        non_interactive: bool,

        /// xlsx report template. Replaces TABLE_XLSX
        #[arg(long)]
        template: Option<PathBuf>,

        /// Directory for the report workbooks
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Also write the merged records as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// Reconcile a JSON list of observations without calling the model
    Reconcile {
        #[arg(short, long)]
        input: PathBuf,

        /// Output file; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        include_role: bool,
    },

    /// Start the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn parse_since(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}
