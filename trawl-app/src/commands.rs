use crate::cli::{Command, RangeArgs};
use anyhow::{Context, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use trawl_common::TrawlError;
use trawl_pager::{
    CsvSink, DailyOptions, RecordSink, StreamOptions, WalkReport, Window, collect_all,
    collect_daily, collect_window,
};
use trawl_social::mastodon::extract::account_record;
use trawl_social::mastodon::{Followers, MastodonApi, PublicTimeline};

pub async fn run(api: MastodonApi, output_dir: &Path, command: Command) -> Result<()> {
    match command {
        Command::Account { out } => {
            let path = output_path(out, output_dir, "my_account.csv")?;
            account(&api, &path).await
        }
        Command::Statuses {
            range,
            out,
            page_size,
            max_posts,
            flush_every,
        } => {
            let path = output_path(out, output_dir, "statuses.csv")?;
            let opts = StreamOptions {
                page_size,
                flush_every,
                max_records: max_posts,
            };
            statuses(api, &range, &opts, &path).await
        }
        Command::Daily {
            range,
            quota,
            out,
            page_size,
        } => {
            let path = output_path(out, output_dir, "statuses_daily.csv")?;
            daily(api, &range, quota, page_size, &path).await
        }
        Command::Followers {
            account_id,
            out,
            page_size,
        } => {
            let account_id = match account_id {
                Some(id) => id,
                None => own_account_id(&api).await?,
            };
            let path = output_path(out, output_dir, &format!("followers_{account_id}.csv"))?;
            followers(api, &account_id, page_size, &path).await
        }
    }
}

/// `out` if given, else `default_name` under `output_dir`. The parent
/// directory is created either way.
pub fn output_path(
    out: Option<PathBuf>,
    output_dir: &Path,
    default_name: &str,
) -> Result<PathBuf, TrawlError> {
    let path = out.unwrap_or_else(|| output_dir.join(default_name));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| TrawlError::Output {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(path)
}

async fn account(api: &MastodonApi, path: &Path) -> Result<()> {
    let me = api.verify_credentials().await?;
    let row = account_record(&me)?;
    let mut sink = CsvSink::new(path);
    sink.write_batch(std::slice::from_ref(&row))?;
    tracing::info!(id = %row.id, acct = ?row.acct, path = %path.display(), "account.saved");
    Ok(())
}

async fn own_account_id(api: &MastodonApi) -> Result<String> {
    let me = api.verify_credentials().await?;
    me.id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| TrawlError::Config("token's account has no id".into()))
        .context("resolving the authenticated account")
}

async fn statuses(
    api: MastodonApi,
    range: &RangeArgs,
    opts: &StreamOptions,
    path: &Path,
) -> Result<()> {
    let window = Window::new(range.since, range.until)?;
    let feed = PublicTimeline::new(api, range.local);
    let mut sink = CsvSink::new(path);
    let report = collect_window(&feed, &window, opts, &mut sink).await?;
    summarize("statuses", path, &report);
    Ok(())
}

async fn daily(
    api: MastodonApi,
    range: &RangeArgs,
    quota: NonZeroUsize,
    page_size: u32,
    path: &Path,
) -> Result<()> {
    let window = Window::new(range.since, range.until)?;
    let feed = PublicTimeline::new(api, range.local);
    let mut sink = CsvSink::new(path);
    let opts = DailyOptions { page_size, quota };
    let report = collect_daily(&feed, &window, &opts, &mut sink).await?;
    summarize("daily", path, &report);
    Ok(())
}

async fn followers(api: MastodonApi, account_id: &str, page_size: u32, path: &Path) -> Result<()> {
    let feed = Followers::new(api, account_id);
    let mut sink = CsvSink::new(path);
    let report = collect_all(&feed, page_size, &mut sink)
        .await
        .with_context(|| format!("collecting followers of {account_id}"))?;
    summarize("followers", path, &report);
    Ok(())
}

fn summarize(kind: &str, path: &Path, report: &WalkReport) {
    if report.records_written == 0 {
        tracing::warn!(kind, pages = report.pages_fetched, "nothing matched; no file written");
    } else {
        tracing::info!(
            kind,
            path = %path.display(),
            pages = report.pages_fetched,
            seen = report.records_seen,
            written = report.records_written,
            stop = ?report.stop,
            "collection.done"
        );
    }
    if report.is_partial() {
        tracing::warn!(
            kind,
            unfilled_days = ?report.unfilled_days,
            "feed ran out before the requested range was covered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_lands_in_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data/raw");
        let path = output_path(None, &dir, "statuses.csv").unwrap();
        assert_eq!(path, dir.join("statuses.csv"));
        assert!(dir.is_dir());
    }

    #[test]
    fn explicit_path_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("elsewhere/x.csv");
        let path = output_path(Some(out.clone()), tmp.path(), "statuses.csv").unwrap();
        assert_eq!(path, out);
        assert!(tmp.path().join("elsewhere").is_dir());
    }

    #[test]
    fn blocked_parent_is_an_output_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, "").unwrap();
        let err = output_path(None, &file.join("sub"), "statuses.csv").unwrap_err();
        assert!(matches!(err, TrawlError::Output { .. }));
    }
}
