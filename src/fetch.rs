use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Anchor-text keywords that suggest a line sheet or catalog page.
const CATALOG_KEYWORDS: &[&str] = &["line sheet", "product", "catalog", "equipment", "brand"];

/// Tags whose text a select-all-and-copy would never surface.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript"];

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const WINDOW_SIZE: (u32, u32) = (1920, 1080);
const NAV_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("no extractable text at {0}")]
    EmptyPage(String),
}

/// Visible text of one (or two, when a catalog link was followed) pages.
pub struct ScrapedPage {
    pub url: String,
    pub raw_text: String,
}

/// An anchor as seen on the page: visible text plus raw href.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// Load `url` in a headless browser and return its visible text. When an
/// anchor looks like a catalog link, that one extra page is loaded and its
/// text appended. The Chrome handle is scoped to this call and torn down on
/// every exit path.
pub fn fetch(url: &str) -> Result<ScrapedPage, FetchError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .sandbox(false)
        .window_size(Some(WINDOW_SIZE))
        .build()
        .map_err(|e| FetchError::Launch(e.to_string()))?;
    let browser = Browser::new(options).map_err(|e| FetchError::Launch(e.to_string()))?;

    let html = load_page(&browser, url)?;
    let mut raw_text = html_to_text(&html);

    let anchors = collect_anchors(&html);
    if let Some(anchor) = find_catalog_link(&anchors) {
        match resolve_href(url, &anchor.href) {
            Some(target) => {
                info!("Following catalog link {:?} -> {}", anchor.text, target);
                match load_page(&browser, target.as_str()) {
                    Ok(second_html) => {
                        let more = html_to_text(&second_html);
                        if !more.is_empty() {
                            raw_text.push(' ');
                            raw_text.push_str(&more);
                        }
                    }
                    // The primary page already loaded; the follow-up is best effort.
                    Err(e) => warn!("Catalog link fetch failed: {}", e),
                }
            }
            None => debug!("Unresolvable catalog href: {:?}", anchor.href),
        }
    }

    if raw_text.is_empty() {
        return Err(FetchError::EmptyPage(url.to_string()));
    }
    info!("Extracted {} characters from {}", raw_text.len(), url);
    Ok(ScrapedPage {
        url: url.to_string(),
        raw_text,
    })
}

/// Navigate a fresh tab to `url` and return the rendered HTML.
fn load_page(browser: &Browser, url: &str) -> Result<String, FetchError> {
    let nav = |e: &dyn std::fmt::Display| FetchError::Navigation {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let tab = browser.new_tab().map_err(|e| nav(&e))?;
    tab.set_default_timeout(NAV_TIMEOUT);
    tab.set_user_agent(USER_AGENT, None, None)
        .map_err(|e| nav(&e))?;
    tab.navigate_to(url).map_err(|e| nav(&e))?;
    tab.wait_until_navigated().map_err(|e| nav(&e))?;
    tab.get_content().map_err(|e| nav(&e))
}

/// Extract visible text, skipping script/style content and collapsing all
/// whitespace runs to single spaces.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut buf = String::new();
    collect_text(document.root_element(), &mut buf);
    buf.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef, buf: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            buf.push_str(text);
            buf.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child_el.value().name()) {
                collect_text(child_el, buf);
            }
        }
    }
}

/// All anchors on the page as (visible text, href) pairs.
pub fn collect_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").unwrap();
    document
        .select(&selector)
        .map(|el| Anchor {
            text: el
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            href: el.value().attr("href").unwrap_or_default().trim().to_string(),
        })
        .collect()
}

/// Pure scan over the page's anchors: the first one whose visible text
/// mentions a catalog-like keyword (case-insensitive) and that has a
/// navigable target wins.
pub fn find_catalog_link(anchors: &[Anchor]) -> Option<&Anchor> {
    anchors.iter().find(|a| {
        let text = a.text.to_lowercase();
        CATALOG_KEYWORDS.iter().any(|kw| text.contains(kw)) && has_target(&a.href)
    })
}

fn has_target(href: &str) -> bool {
    !href.is_empty()
        && !href.starts_with('#')
        && !href.starts_with("javascript:")
        && !href.starts_with("mailto:")
}

/// Resolve an href (possibly relative) against the page it appeared on.
pub fn resolve_href(base: &str, href: &str) -> Option<Url> {
    Url::parse(base).ok()?.join(href).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(text: &str, href: &str) -> Anchor {
        Anchor {
            text: text.to_string(),
            href: href.to_string(),
        }
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let anchors = vec![
            anchor("About Us", "/about"),
            anchor("Our Catalog", "/catalog"),
        ];
        let found = find_catalog_link(&anchors).unwrap();
        assert_eq!(found.href, "/catalog");
    }

    #[test]
    fn first_match_wins() {
        let anchors = vec![
            anchor("Line Sheet", "/line-sheet"),
            anchor("Products", "/products"),
        ];
        assert_eq!(find_catalog_link(&anchors).unwrap().href, "/line-sheet");
    }

    #[test]
    fn substring_match() {
        let anchors = vec![anchor("All Equipment Lines", "/equipment")];
        assert!(find_catalog_link(&anchors).is_some());
    }

    #[test]
    fn no_match_returns_none() {
        let anchors = vec![anchor("Contact", "/contact"), anchor("Home", "/")];
        assert!(find_catalog_link(&anchors).is_none());
    }

    #[test]
    fn anchors_without_target_are_skipped() {
        let anchors = vec![
            anchor("Products", ""),
            anchor("Products", "#top"),
            anchor("Products", "javascript:void(0)"),
            anchor("Products", "/products"),
        ];
        assert_eq!(find_catalog_link(&anchors).unwrap().href, "/products");
    }

    #[test]
    fn resolves_relative_href() {
        let url = resolve_href("https://example.com/about/", "../catalog").unwrap();
        assert_eq!(url.as_str(), "https://example.com/catalog");
    }

    #[test]
    fn resolves_absolute_href() {
        let url = resolve_href("https://example.com/", "https://other.com/sheet").unwrap();
        assert_eq!(url.as_str(), "https://other.com/sheet");
    }

    #[test]
    fn text_extraction_strips_script_and_style() {
        let html = "<html><head><style>body { color: red; }</style></head>\
                    <body><p>Hello</p><script>var x = 1;</script><p>world</p></body></html>";
        assert_eq!(html_to_text(html), "Hello world");
    }

    #[test]
    fn text_extraction_collapses_whitespace() {
        let html = "<body><p>a\n\n   b</p>\t<div>c</div></body>";
        assert_eq!(html_to_text(html), "a b c");
    }

    #[test]
    fn collects_anchor_text_and_href() {
        let html = r##"<body><a href="/catalog">Our <b>Catalog</b></a><a>no href</a></body>"##;
        let anchors = collect_anchors(html);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].text, "Our Catalog");
        assert_eq!(anchors[0].href, "/catalog");
        assert_eq!(anchors[1].href, "");
    }
}
