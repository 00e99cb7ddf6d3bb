use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_yaml::Value;

use crate::descriptor::{self, RawToc, children, describe, str_field};
use crate::error::{HarvestError, UnsupportedContent};
use crate::formats::{CatalogItem, NavLink, TocEntry};
use crate::host;
use crate::nav::find_link;

pub const HTML_EXTENSION: &str = "html";

/// Navigation path of the site's own root page.
pub const ROOT_ANCHOR: &str = "#";

/// Characters left as-is when encoding a navigation lookup path.
const NAV_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Nesting below a part: chapters, sections, subsections, sub-subsections.
const PART_LEVELS: &[&str] = &["chapters", "sections", "sections", "sections"];
/// Index in [`PART_LEVELS`] of the section level.
const PART_SECTION_LEVEL: usize = 1;
/// Nesting below the root of a book without parts: chapters, sections.
const FLAT_LEVELS: &[&str] = &["chapters", "sections"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedToc {
    /// Root entry with an empty title; the caller fills it from the config.
    pub toc: TocEntry,
    pub skipped: Vec<SkippedSection>,
}

/// A section missing from the navigation whose own sections were attached
/// to `chapter` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSection {
    pub node: String,
    pub chapter: String,
    pub reparented: usize,
}

#[derive(Debug)]
pub struct Resolver<'a> {
    item: &'a CatalogItem,
    nav: &'a [NavLink],
    site_base: String,
}

impl<'a> Resolver<'a> {
    pub fn new(item: &'a CatalogItem, nav: &'a [NavLink], root_file: &str) -> Self {
        let root_page = host::with_extension(root_file, HTML_EXTENSION);
        Self {
            item,
            nav,
            site_base: site_base(&item.html_url, &root_page),
        }
    }

    /// Turns one descriptor node into a childless entry.
    pub fn content_entry(&self, node: &Value) -> Result<TocEntry, HarvestError> {
        if let Some(file) = str_field(node, "file") {
            let lookup = nav_lookup_path(file);
            let Some(link) = find_link(self.nav, &lookup) else {
                return Err(HarvestError::TitleNotFound {
                    file: file.to_owned(),
                    lookup,
                });
            };
            let external_url = host::browse_url(
                &self.item.code_url,
                &self.item.release,
                &host::beside(&self.item.toc_path, file),
            )?;
            return Ok(TocEntry::content(
                link.title.clone(),
                format!("{}{}", self.site_base, link.path),
                Some(external_url),
            ));
        }

        if let (Some(url), Some(title)) = (str_field(node, "url"), str_field(node, "title")) {
            return Ok(TocEntry::content(title, url, None));
        }

        if let Some(external) = node.get("external") {
            let external = external
                .as_str()
                .map_or_else(|| describe(external), str::to_owned);
            return Err(HarvestError::UnsupportedContentKind(
                UnsupportedContent::External(external),
            ));
        }

        Err(HarvestError::UnsupportedContentKind(
            UnsupportedContent::Unknown(describe(node)),
        ))
    }
}

pub fn merge_tocs(
    item: &CatalogItem,
    toc: &RawToc,
    nav: &[NavLink],
) -> Result<MergedToc, HarvestError> {
    let resolver = Resolver::new(item, nav, toc.root());
    let root_path = host::beside(&item.toc_path, toc.root());
    let mut root = TocEntry::content(
        "",
        item.html_url.clone(),
        Some(host::browse_url(&item.code_url, &item.release, &root_path)?),
    );

    let mut walk = Walk {
        resolver: &resolver,
        levels: FLAT_LEVELS,
        reparent_level: None,
        skipped: Vec::new(),
    };

    match toc.parts() {
        Some(parts) => {
            walk.levels = PART_LEVELS;
            walk.reparent_level = Some(PART_SECTION_LEVEL);
            for part in parts {
                let caption = str_field(part, "caption").unwrap_or_default();
                if children(part, PART_LEVELS[0]).is_empty() {
                    return Err(descriptor::malformed(
                        toc.source(),
                        format!("part {caption:?} has no `chapters`"),
                    ));
                }
                let mut group = TocEntry::group(caption);
                walk.attach(&mut group, part, 0)?;
                root.children.push(group);
            }
        }
        None => {
            for chapter in toc.chapters() {
                let mut entry = resolver.content_entry(chapter)?;
                walk.attach(&mut entry, chapter, 1)?;
                root.children.push(entry);
            }
        }
    }

    Ok(MergedToc {
        toc: root,
        skipped: walk.skipped,
    })
}

struct Walk<'r, 'a> {
    resolver: &'r Resolver<'a>,
    /// Child key of each nesting level.
    levels: &'static [&'static str],
    /// Level whose unresolvable nodes are dropped instead of failing.
    reparent_level: Option<usize>,
    skipped: Vec<SkippedSection>,
}

impl Walk<'_, '_> {
    /// Resolves the children `node` lists at `level` and appends them to
    /// `parent`, descending until the levels run out.
    fn attach(
        &mut self,
        parent: &mut TocEntry,
        node: &Value,
        level: usize,
    ) -> Result<(), HarvestError> {
        let levels = self.levels;
        let Some(key) = levels.get(level) else {
            return Ok(());
        };

        for child in children(node, key) {
            match self.resolver.content_entry(child) {
                Ok(mut entry) => {
                    self.attach(&mut entry, child, level + 1)?;
                    parent.children.push(entry);
                }
                Err(err) if err.is_title_not_found() && self.reparent_level == Some(level) => {
                    let before = parent.children.len();
                    self.attach(parent, child, level + 1)?;
                    self.skipped.push(SkippedSection {
                        node: describe(child),
                        chapter: parent.title.clone(),
                        reparented: parent.children.len() - before,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Navigation path a descriptor file is rendered at: the file with an
/// `.html` extension, URL-encoded. `#` stands for the root page itself.
pub fn nav_lookup_path(file: &str) -> String {
    if file == ROOT_ANCHOR {
        return ROOT_ANCHOR.to_owned();
    }
    let html_path = host::with_extension(file, HTML_EXTENSION);
    utf8_percent_encode(&html_path, NAV_PATH).to_string()
}

/// Live root URL without its root page.
fn site_base(html_url: &str, root_page: &str) -> String {
    if let Some(base) = html_url.strip_suffix(root_page) {
        return base.to_owned();
    }
    if html_url.ends_with('/') {
        html_url.to_owned()
    } else {
        format!("{html_url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "https://interactivetextbooks.tudelft.nl/risk-reliability/";
    const CODE: &str = "https://gitlab.tudelft.nl/interactivetextbooks-citg/risk-and-reliability";

    fn item() -> CatalogItem {
        CatalogItem {
            html_url: format!("{HTML}intro.html"),
            code_url: CODE.to_owned(),
            release: "v0.1".to_owned(),
            toc_path: "book/_toc.yml".to_owned(),
        }
    }

    fn nav(links: &[(&str, &str)]) -> Vec<NavLink> {
        links
            .iter()
            .map(|(path, title)| NavLink::new(*path, *title))
            .collect()
    }

    fn toc(yaml: &str) -> RawToc {
        RawToc::from_yaml("_toc.yml", yaml).expect("parse toc fixture")
    }

    fn node(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).expect("parse node fixture")
    }

    fn page(title: &str, path: &str, file: &str) -> TocEntry {
        TocEntry::content(
            title,
            format!("{HTML}{path}"),
            Some(format!("{CODE}/-/blob/v0.1/book/{file}")),
        )
    }

    fn with_children(mut entry: TocEntry, children: Vec<TocEntry>) -> TocEntry {
        entry.children = children;
        entry
    }

    const PARTS_TOC: &str = r#"
format: jb-book
root: intro.md
parts:
  - caption: Contents
    chapters:
      - file: prob-design/overview.md
        sections:
          - file: prob-design/01-one-random-variable.md
      - file: credits.md
"#;

    fn parts_nav() -> Vec<NavLink> {
        nav(&[
            ("#", "Risk and Reliability for Engineers"),
            ("prob-design/overview.html", "Probabilistic Design"),
            ("prob-design/01-one-random-variable.html", "One Random Variable"),
            ("credits.html", "Credits and License"),
        ])
    }

    #[test]
    fn merge_tocs_builds_parts_tree_in_descriptor_order() -> anyhow::Result<()> {
        let merged = merge_tocs(&item(), &toc(PARTS_TOC), &parts_nav())?;

        let expected = TocEntry {
            title: String::new(),
            html_url: Some(format!("{HTML}intro.html")),
            external_url: Some(format!("{CODE}/-/blob/v0.1/book/intro.md")),
            children: vec![with_children(
                TocEntry::group("Contents"),
                vec![
                    with_children(
                        page(
                            "Probabilistic Design",
                            "prob-design/overview.html",
                            "prob-design/overview.md",
                        ),
                        vec![page(
                            "One Random Variable",
                            "prob-design/01-one-random-variable.html",
                            "prob-design/01-one-random-variable.md",
                        )],
                    ),
                    page("Credits and License", "credits.html", "credits.md"),
                ],
            )],
        };
        assert_eq!(merged.toc, expected);
        assert!(merged.skipped.is_empty());
        Ok(())
    }

    #[test]
    fn merge_tocs_is_deterministic() -> anyhow::Result<()> {
        let toc = toc(PARTS_TOC);
        let nav = parts_nav();
        let first = merge_tocs(&item(), &toc, &nav)?;
        for _ in 0..5 {
            assert_eq!(merge_tocs(&item(), &toc, &nav)?, first);
        }
        Ok(())
    }

    #[test]
    fn group_nodes_always_have_children() -> anyhow::Result<()> {
        fn check(entry: &TocEntry) {
            if entry.is_group() {
                assert!(!entry.children.is_empty(), "empty group {:?}", entry.title);
            }
            entry.children.iter().for_each(check);
        }
        let merged = merge_tocs(&item(), &toc(PARTS_TOC), &parts_nav())?;
        check(&merged.toc);
        assert_eq!(merged.toc.node_count(), 5);
        Ok(())
    }

    #[test]
    fn part_without_chapters_is_malformed() {
        let nav = parts_nav();
        for yaml in [
            r#"
root: intro.md
parts:
  - caption: Contents
    chapter:
      - file: credits.md
"#,
            r#"
root: intro.md
parts:
  - caption: Contents
    chapters: []
"#,
            r#"
root: intro.md
parts:
  - caption: Contents
    chapters:
      - file: credits.md
  - caption: Appendix
"#,
        ] {
            let err = merge_tocs(&item(), &toc(yaml), &nav).unwrap_err();
            assert!(matches!(err, HarvestError::MalformedDescriptor { .. }), "{err}");
            assert!(err.to_string().contains("_toc.yml"), "{err}");
            assert!(err.to_string().contains("has no `chapters`"), "{err}");
        }
    }

    #[test]
    fn flat_chapters_resolve_sections_only() -> anyhow::Result<()> {
        let toc = toc(
            r#"
root: intro
chapters:
  - file: a
    sections:
      - file: a/one
        sections:
          - file: a/one/deep
  - url: https://example.org/extra
    title: Extra Reading
"#,
        );
        let nav = nav(&[("a.html", "A"), ("a/one.html", "A One")]);
        let merged = merge_tocs(&item(), &toc, &nav)?;

        assert_eq!(
            merged.toc.children,
            vec![
                with_children(
                    page("A", "a.html", "a.md"),
                    vec![page("A One", "a/one.html", "a/one.md")],
                ),
                TocEntry::content("Extra Reading", "https://example.org/extra", None),
            ]
        );
        Ok(())
    }

    #[test]
    fn flat_chapters_fail_on_missing_section() {
        let toc = toc(
            r#"
root: intro.md
chapters:
  - file: a.md
    sections:
      - file: gone.md
"#,
        );
        let nav = nav(&[("a.html", "A")]);
        let err = merge_tocs(&item(), &toc, &nav).unwrap_err();
        assert!(err.is_title_not_found(), "{err}");
    }

    #[test]
    fn subsections_and_subsubsections_nest_under_parts() -> anyhow::Result<()> {
        let toc = toc(
            r#"
root: intro.md
parts:
  - caption: Part
    chapters:
      - file: ch.md
        sections:
          - file: sec.md
            sections:
              - file: sub.md
                sections:
                  - file: subsub.md
                    sections:
                      - file: too-deep.md
"#,
        );
        let nav = nav(&[
            ("ch.html", "Chapter"),
            ("sec.html", "Section"),
            ("sub.html", "Subsection"),
            ("subsub.html", "Subsubsection"),
        ]);
        let merged = merge_tocs(&item(), &toc, &nav)?;

        let subsub = page("Subsubsection", "subsub.html", "subsub.md");
        let sub = with_children(page("Subsection", "sub.html", "sub.md"), vec![subsub]);
        let sec = with_children(page("Section", "sec.html", "sec.md"), vec![sub]);
        let ch = with_children(page("Chapter", "ch.html", "ch.md"), vec![sec]);
        assert_eq!(merged.toc.children, vec![with_children(TocEntry::group("Part"), vec![ch])]);
        Ok(())
    }

    #[test]
    fn unresolved_section_reparents_its_sections_to_the_chapter() -> anyhow::Result<()> {
        let toc = toc(
            r#"
root: intro.md
parts:
  - caption: Contents
    chapters:
      - file: ch.md
        sections:
          - file: first.md
          - file: missing.md
            sections:
              - file: orphan-a.md
                sections:
                  - file: orphan-a-child.md
              - file: orphan-b.md
          - file: last.md
"#,
        );
        let nav = nav(&[
            ("ch.html", "Chapter"),
            ("first.html", "First"),
            ("orphan-a.html", "Orphan A"),
            ("orphan-a-child.html", "Orphan A Child"),
            ("orphan-b.html", "Orphan B"),
            ("last.html", "Last"),
        ]);
        let merged = merge_tocs(&item(), &toc, &nav)?;

        let chapter = &merged.toc.children[0].children[0];
        let titles = chapter
            .children
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["First", "Orphan A", "Orphan B", "Last"]);
        assert_eq!(chapter.children[1].children[0].title, "Orphan A Child");

        assert_eq!(
            merged.skipped,
            vec![SkippedSection {
                node: concat!(
                    r#"{"file":"missing.md","sections":["#,
                    r#"{"file":"orphan-a.md","sections":[{"file":"orphan-a-child.md"}]},"#,
                    r#"{"file":"orphan-b.md"}]}"#,
                )
                .to_owned(),
                chapter: "Chapter".to_owned(),
                reparented: 2,
            }]
        );
        Ok(())
    }

    #[test]
    fn unresolved_chapter_or_subsection_is_fatal() {
        let missing_chapter = toc(
            r#"
root: intro.md
parts:
  - caption: P
    chapters:
      - file: gone.md
"#,
        );
        let err = merge_tocs(&item(), &missing_chapter, &[]).unwrap_err();
        assert!(err.is_title_not_found(), "{err}");

        let missing_sub = toc(
            r#"
root: intro.md
parts:
  - caption: P
    chapters:
      - file: ch.md
        sections:
          - file: sec.md
            sections:
              - file: gone.md
"#,
        );
        let nav = nav(&[("ch.html", "Ch"), ("sec.html", "Sec")]);
        let err = merge_tocs(&item(), &missing_sub, &nav).unwrap_err();
        assert!(err.to_string().contains("gone.md"), "{err}");
    }

    #[test]
    fn unknown_section_shape_is_not_reparented() {
        let toc = toc(
            r#"
root: intro.md
parts:
  - caption: P
    chapters:
      - file: ch.md
        sections:
          - glob: notes/*
"#,
        );
        let nav = nav(&[("ch.html", "Ch")]);
        let err = merge_tocs(&item(), &toc, &nav).unwrap_err();
        assert!(matches!(
            err,
            HarvestError::UnsupportedContentKind(UnsupportedContent::Unknown(_))
        ));
    }

    #[test]
    fn root_anchor_is_looked_up_literally() -> anyhow::Result<()> {
        let nav = nav(&[("#.html", "Wrong"), ("#", "Book Home")]);
        let item = item();
        let resolver = Resolver::new(&item, &nav, "intro.md");
        let entry = resolver.content_entry(&node("file: '#'"))?;
        assert_eq!(entry.title, "Book Home");
        assert_eq!(entry.html_url.as_deref(), Some(format!("{HTML}#").as_str()));
        Ok(())
    }

    #[test]
    fn file_without_extension_is_markdown_source() -> anyhow::Result<()> {
        let nav = nav(&[("references.html", "References")]);
        let item = item();
        let resolver = Resolver::new(&item, &nav, "intro.md");
        let entry = resolver.content_entry(&node("file: references"))?;
        assert_eq!(
            entry.external_url.as_deref(),
            Some(format!("{CODE}/-/blob/v0.1/book/references.md").as_str())
        );
        Ok(())
    }

    #[test]
    fn notebook_keeps_its_extension_in_source_url() -> anyhow::Result<()> {
        let nav = nav(&[("rc/contamination.html", "Contaminant Transport")]);
        let item = item();
        let resolver = Resolver::new(&item, &nav, "intro.md");
        let entry = resolver.content_entry(&node("file: rc/contamination.ipynb"))?;
        assert_eq!(entry.title, "Contaminant Transport");
        assert_eq!(
            entry.external_url.as_deref(),
            Some(format!("{CODE}/-/blob/v0.1/book/rc/contamination.ipynb").as_str())
        );
        Ok(())
    }

    #[test]
    fn lookup_path_is_url_encoded() {
        assert_eq!(nav_lookup_path("Week 1/ä intro.md"), "Week%201/%C3%A4%20intro.html");
        assert_eq!(nav_lookup_path("a_b-c~d/e.ipynb"), "a_b-c~d/e.html");
        assert_eq!(nav_lookup_path("#"), "#");
    }

    #[test]
    fn missing_title_reports_file_and_lookup() {
        let item = item();
        let resolver = Resolver::new(&item, &[], "intro.md");
        let err = resolver.content_entry(&node("file: credits.md")).unwrap_err();
        match err {
            HarvestError::TitleNotFound { file, lookup } => {
                assert_eq!(file, "credits.md");
                assert_eq!(lookup, "credits.html");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn external_provenance_is_unsupported() {
        let item = item();
        let resolver = Resolver::new(&item, &[], "intro.md");
        let err = resolver
            .content_entry(&node(concat!(
                "external: https://github.com/EXCITED-CO2/workshop_tutorial",
                "/blob/v1.0.0/book/ARCO-ERA5.ipynb",
            )))
            .unwrap_err();
        assert!(matches!(
            err,
            HarvestError::UnsupportedContentKind(UnsupportedContent::External(ref url))
                if url.ends_with("ARCO-ERA5.ipynb")
        ));
    }

    #[test]
    fn url_without_title_is_unknown() {
        let item = item();
        let resolver = Resolver::new(&item, &[], "intro.md");
        let err = resolver
            .content_entry(&node("url: https://example.org"))
            .unwrap_err();
        assert!(err.to_string().contains("unknown type of content entry"), "{err}");
    }

    #[test]
    fn site_base_strips_root_page_or_ensures_slash() {
        assert_eq!(site_base(&format!("{HTML}intro.html"), "intro.html"), HTML);
        let base = "https://example.org/book/";
        assert_eq!(site_base(base, "index.html"), base);
        assert_eq!(site_base("https://example.org/book", "index.html"), base);
    }
}
