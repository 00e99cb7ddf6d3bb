use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::cli::{BookArgs, HarvestArgs, HttpArgs};
use crate::config::{TitlePolicy, config_from_code};
use crate::descriptor::toc_from_code;
use crate::error::HarvestError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::formats::{CatalogItem, CatalogItemWithToc};
use crate::host;
use crate::merge::{SkippedSection, merge_tocs};
use crate::nav::toc_from_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookHarvest {
    pub record: CatalogItemWithToc,
    pub skipped: Vec<SkippedSection>,
}

pub async fn enrich_catalog_item(
    fetcher: &dyn Fetcher,
    item: CatalogItem,
    title_policy: &TitlePolicy,
) -> Result<BookHarvest, HarvestError> {
    let toc_yml = toc_from_code(fetcher, &item).await?;
    let toc_html = toc_from_html(fetcher, &item.html_url).await?;
    let config = config_from_code(fetcher, &item).await?;
    let merged = merge_tocs(&item, &toc_yml, &toc_html)?;

    let config = title_policy.apply(config, host::repository_name(&item.code_url));
    let mut toc = merged.toc;
    if toc.title.is_empty() {
        toc.title = config.title.clone();
    }

    Ok(BookHarvest {
        record: CatalogItemWithToc { item, config, toc },
        skipped: merged.skipped,
    })
}

/// Harvests the books one after another. The first failing book aborts the run.
pub async fn harvest_catalog(
    fetcher: &dyn Fetcher,
    catalog: Vec<CatalogItem>,
    title_policy: &TitlePolicy,
) -> anyhow::Result<Vec<CatalogItemWithToc>> {
    let mut records = Vec::with_capacity(catalog.len());
    for item in catalog {
        let html_url = item.html_url.clone();
        let book = harvest_one(fetcher, item, title_policy)
            .await
            .with_context(|| format!("harvest {html_url}"))?;
        records.push(book);
    }
    Ok(records)
}

async fn harvest_one(
    fetcher: &dyn Fetcher,
    item: CatalogItem,
    title_policy: &TitlePolicy,
) -> anyhow::Result<CatalogItemWithToc> {
    tracing::info!(html_url = %item.html_url, release = %item.release, "processing book");
    let harvest = enrich_catalog_item(fetcher, item, title_policy).await?;
    report_skipped(&harvest.record.item.html_url, &harvest.skipped);
    tracing::info!(
        title = %harvest.record.config.title,
        entries = harvest.record.toc.node_count(),
        "harvested book"
    );
    Ok(harvest.record)
}

fn report_skipped(html_url: &str, skipped: &[SkippedSection]) {
    for section in skipped {
        tracing::warn!(
            html_url,
            section = %section.node,
            chapter = %section.chapter,
            reparented = section.reparented,
            "section missing from live navigation; attached its sections to the chapter"
        );
    }
}

pub fn read_catalog(path: &Path) -> anyhow::Result<Vec<CatalogItem>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read catalog: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parse catalog: {}", path.display()))
}

pub(crate) fn http_fetcher(args: &HttpArgs) -> anyhow::Result<HttpFetcher> {
    HttpFetcher::new(Duration::from_secs(args.timeout_secs), args.user_agent.clone())
}

pub async fn run(args: HarvestArgs) -> anyhow::Result<()> {
    let catalog_path = PathBuf::from(&args.catalog);
    let out_path = PathBuf::from(&args.out);

    if out_path.exists() && !args.force {
        anyhow::bail!("output already exists: {}", out_path.display());
    }

    let catalog = read_catalog(&catalog_path).context("read catalog")?;
    tracing::info!(books = catalog.len(), catalog = %catalog_path.display(), "loaded catalog");

    let fetcher = http_fetcher(&args.http)?;
    let records = harvest_catalog(&fetcher, catalog, &args.title.policy()).await?;

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&records).context("serialize chapters json")?;

    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut out = options
        .open(&out_path)
        .with_context(|| format!("open output: {}", out_path.display()))?;
    out.write_all(json.as_bytes())
        .with_context(|| format!("write output: {}", out_path.display()))?;
    out.write_all(b"\n").context("write output newline")?;
    out.flush().context("flush output")?;

    tracing::info!(books = records.len(), out = %out_path.display(), "wrote chapters");
    Ok(())
}

pub async fn book(args: BookArgs) -> anyhow::Result<()> {
    let item = CatalogItem {
        html_url: args.html_url,
        code_url: args.code_url,
        release: args.release,
        toc_path: args.toc_path,
    };
    let fetcher = http_fetcher(&args.http)?;
    let record = harvest_one(&fetcher, item, &args.title.policy()).await?;

    let json = serde_json::to_string_pretty(&record).context("serialize book json")?;
    println!("{json}");
    Ok(())
}
