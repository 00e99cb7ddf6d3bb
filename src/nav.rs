use std::sync::LazyLock;

use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::cli::NavArgs;
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::formats::{NavIndex, NavLink};

/// Identifier (and, on older themes, class) of the sidebar navigation of
/// sphinx-book-theme sites.
pub const NAV_CONTAINER: &str = "bd-docs-nav";

static NAV_BY_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("#{NAV_CONTAINER}")).expect("nav id selector"));
static NAV_BY_CLASS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!(".{NAV_CONTAINER}")).expect("nav class selector"));
static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

pub async fn run(args: NavArgs) -> anyhow::Result<()> {
    let url = Url::parse(&args.url).context("parse --url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("--url must be http/https: {url}");
    }

    let fetcher = crate::harvest::http_fetcher(&args.http)?;
    let nav = toc_from_html(&fetcher, url.as_str()).await?;
    tracing::info!(links = nav.len(), "scraped navigation");

    let json = serde_json::to_string_pretty(&nav).context("serialize navigation json")?;
    println!("{json}");
    Ok(())
}

pub async fn toc_from_html(fetcher: &dyn Fetcher, url: &str) -> Result<NavIndex, HarvestError> {
    let html = fetcher.get_text(url).await?;
    parse_nav(&html).ok_or_else(|| HarvestError::NavNotFound {
        url: url.to_owned(),
    })
}

/// Extracts every `(href, text)` pair of the navigation container in
/// document order. Returns `None` when the page has no such container.
pub fn parse_nav(html: &str) -> Option<NavIndex> {
    let document = Html::parse_document(html);
    let container = document
        .select(&NAV_BY_ID)
        .next()
        .or_else(|| document.select(&NAV_BY_CLASS).next())?;

    let links = container
        .select(&ANCHORS)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let title = anchor_text(anchor);
            if href.is_empty() || title.is_empty() {
                return None;
            }
            Some(NavLink::new(href, title))
        })
        .collect();
    Some(links)
}

fn anchor_text(anchor: ElementRef<'_>) -> String {
    anchor.text().collect::<String>().trim().to_owned()
}

pub fn find_link<'a>(nav: &'a [NavLink], lookup: &str) -> Option<&'a NavLink> {
    nav.iter().find(|link| link.path == lookup)
}
