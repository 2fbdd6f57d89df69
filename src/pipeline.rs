use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Local;
use regex::Regex;
use tracing::info;
use url::Url;

use crate::config::ModelConfig;
use crate::export;
use crate::fetch;
use crate::model::ModelClient;
use crate::parse;

static NON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Run the whole fetch → categorize → parse → export pipeline for one rep
/// firm and return the path of the spreadsheet written.
///
/// `rep_firm_name` falls back to a name derived from the URL host and
/// `output` to a generated firm-name + timestamp filename.
pub async fn scrape_rep_firm_line_sheet(
    url: &str,
    rep_firm_name: Option<&str>,
    output: Option<&Path>,
) -> Result<PathBuf> {
    // Credential problems must surface before any network traffic.
    let config = ModelConfig::from_env()?;
    let client = ModelClient::new(config)?;

    let firm_name = match rep_firm_name {
        Some(name) => name.to_string(),
        None => derive_firm_name(url),
    };
    info!("Scraping line sheet for {} from {}", firm_name, url);

    let page = {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || fetch::fetch(&url))
            .await
            .context("browser task panicked")??
    };

    info!(
        "Categorizing {} characters from {}",
        page.raw_text.len(),
        page.url
    );
    let reply = client.categorize(&page.raw_text, &firm_name).await?;
    let rows = parse::parse_response(&reply, &firm_name);
    info!("Parsed {} catalog rows", rows.len());

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_output_name(&firm_name)),
    };
    let written = export::write_rows(&rows, &path)?;
    Ok(written)
}

/// Firm name derived from the site's host:
/// "https://www.acme-process.com" -> "Acme Process".
fn derive_firm_name(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string());
    let label = host.trim_start_matches("www.").split('.').next().unwrap_or("");
    let name = title_case(&label.replace('-', " "));
    if name.is_empty() {
        host
    } else {
        name
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Standardized output name: sanitized firm name plus a timestamp.
fn default_output_name(firm_name: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let clean = sanitize_name(firm_name);
    if clean.is_empty() {
        format!("rep_firm_line_sheet_{}.csv", timestamp)
    } else {
        format!("{}_line_sheet_{}.csv", clean, timestamp)
    }
}

/// Keep word characters, collapse separator runs to underscores.
fn sanitize_name(name: &str) -> String {
    let kept = NON_NAME_RE.replace_all(name, "");
    SEPARATOR_RE
        .replace_all(kept.trim(), "_")
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firm_name_from_host() {
        assert_eq!(derive_firm_name("https://www.shapecal.com/"), "Shapecal");
    }

    #[test]
    fn firm_name_hyphens_become_spaces() {
        assert_eq!(
            derive_firm_name("https://acme-process.com/equipment/"),
            "Acme Process"
        );
    }

    #[test]
    fn sanitize_drops_punctuation() {
        assert_eq!(sanitize_name("ShapeCal, Inc."), "ShapeCal_Inc");
    }

    #[test]
    fn sanitize_collapses_separators() {
        assert_eq!(sanitize_name("Acme  -  Process Reps"), "Acme_Process_Reps");
    }

    #[test]
    fn default_name_carries_firm_and_extension() {
        let name = default_output_name("Acme Process");
        assert!(name.starts_with("Acme_Process_line_sheet_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn default_name_without_firm() {
        let name = default_output_name("!!!");
        assert!(name.starts_with("rep_firm_line_sheet_"));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_network() {
        std::env::remove_var(crate::config::KEY_ENV);
        let err = scrape_rep_firm_line_sheet("https://example.com", None, None)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<crate::config::ConfigError>().is_some());
    }
}
