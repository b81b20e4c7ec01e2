use clap::{Args, Parser, Subcommand};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, time};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use trawl_common::TrawlError;
use trawl_config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Parser)]
#[command(name = "trawl")]
#[command(about = "Page through a Mastodon instance and write what it finds to CSV", long_about = None)]
pub struct Cli {
    /// Credentials and settings file
    #[arg(long, env = "TRAWL_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Snapshot the account that owns the access token
    Account {
        /// Output CSV (default: <output_dir>/my_account.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Collect timeline statuses posted inside a date range
    Statuses {
        #[command(flatten)]
        range: RangeArgs,
        /// Output CSV (default: <output_dir>/statuses.csv)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 40)]
        page_size: u32,
        /// Stop after this many statuses were kept
        #[arg(long)]
        max_posts: Option<NonZeroUsize>,
        /// Append to the CSV every N kept statuses instead of once at the end
        #[arg(long)]
        flush_every: Option<NonZeroUsize>,
    },
    /// Collect up to QUOTA statuses for every day of a date range
    Daily {
        #[command(flatten)]
        range: RangeArgs,
        /// Statuses to keep per UTC day
        #[arg(long)]
        quota: NonZeroUsize,
        /// Output CSV (default: <output_dir>/statuses_daily.csv)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 40)]
        page_size: u32,
    },
    /// Collect every follower of an account
    ///
    /// Paging assumes followers come back in descending account-id order.
    /// Servers that list followers by follow time make the run stop with an
    /// out-of-order error instead of writing an incomplete list.
    Followers {
        /// Account id; defaults to the authenticated account
        account_id: Option<String>,
        /// Output CSV (default: <output_dir>/followers_<id>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 80)]
        page_size: u32,
    },
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Oldest timestamp to keep (RFC 3339, or YYYY-MM-DD for the start of that day)
    #[arg(long, value_parser = parse_since)]
    pub since: OffsetDateTime,
    /// Newest timestamp to keep (RFC 3339, or YYYY-MM-DD for the end of that day)
    #[arg(long, value_parser = parse_until)]
    pub until: OffsetDateTime,
    /// Read the local timeline instead of the federated one
    #[arg(long)]
    pub local: bool,
}

pub fn parse_since(raw: &str) -> Result<OffsetDateTime, TrawlError> {
    parse_bound(raw, Time::MIDNIGHT)
}

pub fn parse_until(raw: &str) -> Result<OffsetDateTime, TrawlError> {
    parse_bound(raw, time!(23:59:59))
}

/// RFC 3339 timestamps are taken as given; bare dates are pinned to `at`, UTC.
fn parse_bound(raw: &str, at: Time) -> Result<OffsetDateTime, TrawlError> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).map_err(|_| {
        TrawlError::InvalidArgument(format!(
            "{raw:?} is neither an RFC 3339 timestamp nor a YYYY-MM-DD date"
        ))
    })?;
    Ok(PrimitiveDateTime::new(date, at).assume_utc())
}
