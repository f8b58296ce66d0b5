//! HTML row tokenizer for the wiki compare endpoint's diff table (ambient
//! collaborator, §10). This module only turns markup into [`DiffRow`]
//! cells; classifying those rows into unedited/added/removed/etc. is the
//! core's job (`crate::diffrow::classify`), not this one's.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::diffrow::{Cell, DiffRow};

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").unwrap());
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<td\b([^>]*)>(.*?)</td>"#).unwrap());
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"class="([^"]*)""#).unwrap());
static ANCHOR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\s+name="([^"]+)""#).unwrap());
static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r##"href="#([^"]+)""##).unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());

fn strip_tags(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, "");
    without_tags
        .replace("&#160;", " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .trim()
        .to_string()
}

fn first_class(attrs: &str) -> String {
    CLASS_RE
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().next().unwrap_or("").to_string())
        .unwrap_or_default()
}

/// Maps every `<a name="...">` anchor in the document to the plain text of
/// the cell that carries it — the other half of a moved-paragraph pair.
/// A moved-right row only carries an `href` back to this name; recovering
/// the original text (to fingerprint it and find the block it continues) is
/// this lookup's job.
fn index_anchor_text(html: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for cell_caps in CELL_RE.captures_iter(html) {
        let inner = cell_caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if let Some(name) = ANCHOR_NAME_RE.captures(inner).and_then(|c| c.get(1)) {
            map.insert(name.as_str().to_string(), strip_tags(inner));
        }
    }
    map
}

/// Parses a compare-endpoint HTML fragment (the `compare["*"]` field of the
/// MediaWiki API response) into an ordered sequence of [`DiffRow`]s, one per
/// `<tr>`. The header row (column titles) is skipped.
pub fn parse_diff_rows(html: &str) -> Vec<DiffRow> {
    let anchor_text = index_anchor_text(html);

    ROW_RE
        .captures_iter(html)
        .skip(1) // header row
        .map(|row_caps| {
            let row_html = row_caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let cells = CELL_RE
                .captures_iter(row_html)
                .map(|cell_caps| {
                    let attrs = cell_caps.get(1).map(|m| m.as_str()).unwrap_or("");
                    let inner = cell_caps.get(2).map(|m| m.as_str()).unwrap_or("");
                    let mut cell = Cell::new(first_class(attrs), strip_tags(inner));
                    // The left half of a move carries the anchor *target*
                    // (`<a name="...">`, no href) marking it as the paired
                    // side; the right half carries the `href` back to it,
                    // which resolves through `anchor_text` to the original
                    // paragraph. A cell never carries both.
                    if let Some(name) = ANCHOR_NAME_RE.captures(inner).and_then(|c| c.get(1)) {
                        cell = cell.with_anchor(name.as_str().to_string());
                    } else if let Some(referenced) = ANCHOR_HREF_RE
                        .captures(inner)
                        .and_then(|c| c.get(1))
                        .and_then(|m| anchor_text.get(m.as_str()))
                    {
                        cell = cell.with_anchor(referenced.clone());
                    }
                    cell
                })
                .collect();
            DiffRow::new(cells)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_new_content_row() {
        let html = r#"
            <table>
            <tr><td colspan="2">header</td></tr>
            <tr>
                <td class="diff-empty">&#160;</td>
                <td class="diff-lineno">1</td>
                <td class="diff-addedline"><div class="diffchange">Hello.</div></td>
            </tr>
            </table>
        "#;
        let rows = parse_diff_rows(html);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells.len(), 3);
        assert_eq!(rows[0].cells[2].class, "diff-addedline");
        assert_eq!(rows[0].cells[2].text, "Hello.");
    }

    #[test]
    fn parses_an_unedited_row_with_identical_text() {
        let html = r#"
            <tr><td>header</td></tr>
            <tr>
                <td class="diff-lineno">1</td>
                <td class="diff-context"><div>Unchanged line</div></td>
                <td class="diff-lineno">1</td>
                <td class="diff-context"><div>Unchanged line</div></td>
            </tr>
        "#;
        let rows = parse_diff_rows(html);
        assert_eq!(rows[0].cells[1].text, rows[0].cells[3].text);
    }

    #[test]
    fn resolves_moved_right_anchor_to_the_original_paragraph_text() {
        let html = r##"
            <tr><td>header</td></tr>
            <tr>
                <td class="diff-lineno">3</td>
                <td class="diff-deletedline"><a name="moved_para_1_lhs"></a><div>Hello, world.</div></td>
                <td class="diff-empty">&#160;</td>
            </tr>
            <tr>
                <td class="diff-empty">&#160;</td>
                <td class="diff-lineno"><a href="#moved_para_1_lhs">moved</a></td>
                <td class="diff-addedline"><div>Hello, world.</div></td>
            </tr>
        "##;
        let rows = parse_diff_rows(html);
        assert_eq!(
            rows[1].cells[1].anchor.as_deref(),
            Some("Hello, world.")
        );
    }

    #[test]
    fn moved_left_cell_carrying_only_an_anchor_name_is_marked() {
        let html = r##"
            <tr><td>header</td></tr>
            <tr>
                <td class="diff-lineno">3</td>
                <td class="diff-deletedline"><a name="moved_para_1_lhs"></a><div>Hello, world.</div></td>
                <td class="diff-empty">&#160;</td>
            </tr>
        "##;
        let rows = parse_diff_rows(html);
        assert!(rows[0].cells[1].anchor.is_some());
    }
}
