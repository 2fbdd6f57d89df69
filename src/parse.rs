use tracing::debug;

use crate::export::CatalogRow;

/// Minimum fields a response line must carry: brand, product, space.
const MIN_FIELDS: usize = 3;

/// Header spellings the model sometimes emits despite instructions.
const HEADER_TOKENS: &[&str] = &["brand", "brand carried", "rep firm name"];

/// Turn the model's reply into catalog rows. Never fails: lines that do not
/// decompose into at least three pipe-delimited fields are dropped with a
/// debug log, as are header and separator rows. Output order follows the
/// order of appearance in the reply.
pub fn parse_response(response_text: &str, rep_firm_name: &str) -> Vec<CatalogRow> {
    let mut rows = Vec::new();

    for raw_line in response_text.lines() {
        let line = raw_line.trim().trim_start_matches(['-', '*']).trim_start();
        if line.is_empty() {
            continue;
        }

        let fields = split_fields(line);
        if fields.len() < MIN_FIELDS {
            debug!("Skipping malformed line: {:?}", raw_line);
            continue;
        }
        if is_header(&fields) || is_separator(&fields) {
            continue;
        }

        rows.push(CatalogRow {
            rep_firm_name: rep_firm_name.to_string(),
            brand: fields[0].to_string(),
            product: fields[1].to_string(),
            space_category: fields[2].to_string(),
        });
    }

    rows
}

/// Split on the pipe delimiter, trimming each token and dropping the empty
/// edge tokens a markdown table row ("| a | b | c |") produces.
fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split('|').map(str::trim).collect();
    while fields.first().is_some_and(|f| f.is_empty()) {
        fields.remove(0);
    }
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

fn is_header(fields: &[&str]) -> bool {
    let first = fields[0].to_lowercase();
    HEADER_TOKENS.contains(&first.as_str())
        || fields.iter().any(|f| f.eq_ignore_ascii_case("rep firm name"))
}

fn is_separator(fields: &[&str]) -> bool {
    fields
        .iter()
        .all(|f| !f.is_empty() && f.chars().all(|c| matches!(c, '-' | ':' | ' ')))
}
