//! HTML and XML rendering of result pages.
//!
//! Every entity module exposes the same pair of functions,
//! `html(&ResultPage, &RenderOptions) -> String` and
//! `xml(&ResultPage, &RenderOptions) -> String`, which the entity
//! descriptors reference. All hit values pass through [`escape`] or
//! [`escape_attr`] before they reach the output.

pub mod annotation;
pub mod artist;
pub mod cdstub;
pub mod freedb;
pub mod label;
pub mod release;
pub mod release_group;
pub mod track;

use crate::model::Hit;

/// Options for rendering result pages.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Local tagger port; rows get an "open in tagger" link when set.
    pub tagger_port: u16,

    /// Add a relationship-editor link column (ignored when a tagger link is shown)
    pub show_relationship_link: bool,

    /// Length of the track being looked up, for colour-coding track lengths.
    pub duration_ms: Option<u64>,

    /// Timestamp embedded in tagger links; defaults to the current time.
    pub link_timestamp: Option<i64>,
}

/// The optional last column of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkColumn {
    Tagger(u16),
    Relationship,
    None,
}

impl RenderOptions {
    pub fn link_column(&self) -> LinkColumn {
        if self.tagger_port > 0 {
            LinkColumn::Tagger(self.tagger_port)
        } else if self.show_relationship_link {
            LinkColumn::Relationship
        } else {
            LinkColumn::None
        }
    }

    fn timestamp(&self) -> i64 {
        self.link_timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

/// Escape text content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (double-quoted).
pub fn escape_attr(text: &str) -> String {
    escape(text).replace('"', "&quot;")
}

/// Row parity class suffix by position within the page.
pub fn parity(index: usize) -> &'static str {
    if index % 2 == 0 { "even" } else { "odd" }
}

/// `<div><table ...><tr class="searchresultsheader">...` with one cell per header.
fn table_open(out: &mut String, table_id: Option<&str>, headers: &[&str]) {
    match table_id {
        Some(id) => out.push_str(&format!(
            r#"<div><table class="searchresults" id="{id}">"#
        )),
        None => out.push_str(r#"<div><table class="searchresults">"#),
    }
    out.push_str(r#"<tr class="searchresultsheader">"#);
    for header in headers {
        out.push_str(header);
    }
    out.push_str("</tr>");
}

fn table_close(out: &mut String) {
    out.push_str("</table></div>");
}

fn row_open(out: &mut String, index: usize, hit: &Hit) {
    out.push_str(&format!(
        r#"<tr class="searchresults{}"><td>{}</td>"#,
        parity(index),
        hit.score
    ));
}

fn header_for(column: LinkColumn) -> Option<&'static str> {
    match column {
        LinkColumn::Tagger(_) => Some("<td>Tagger</td>"),
        LinkColumn::Relationship => Some("<td>Rel</td>"),
        LinkColumn::None => None,
    }
}

pub fn tagger_link(port: u16, mbid: &str, timestamp: i64) -> String {
    format!(
        concat!(
            r#"<a href="http://127.0.0.1:{port}/openalbum?id={id}&amp;t={ts}" "#,
            r#" target="hiddeniframe" title="Open in Tagger" border="0"><img  "#,
            r#" src="/images/mblookup-tagger.png" border="0" alt="Open in tagger"></a>"#
        ),
        port = port,
        id = escape_attr(mbid),
        ts = timestamp
    )
}

/// Trailing tagger / relationship cell for one row, if the page has that column.
fn link_cell(out: &mut String, options: &RenderOptions, rel_path: &str, id: &str, tagger_id: Option<&str>) {
    match options.link_column() {
        LinkColumn::Tagger(port) => {
            let target = tagger_id.unwrap_or(id);
            out.push_str(&format!(
                r#"<td style="white-space: nowrap">{}</td>"#,
                tagger_link(port, target, options.timestamp())
            ));
        }
        LinkColumn::Relationship => out.push_str(&format!(
            r#"<td><a href="{rel_path}{}&amp;addrel=1">rel</a></td>"#,
            escape_attr(id)
        )),
        LinkColumn::None => {}
    }
}

/// `good` / `ok` / `bad` by distance from the expected duration; empty when
/// either side is unknown.
pub fn track_length_class(expected_ms: Option<u64>, actual_ms: u64) -> &'static str {
    let Some(expected) = expected_ms.filter(|d| *d > 0) else {
        return "";
    };
    if actual_ms == 0 {
        return "";
    }
    match expected.abs_diff(actual_ms) {
        d if d < 5_000 => "good",
        d if d < 15_000 => "ok",
        _ => "bad",
    }
}

/// `m:ss`.
pub fn format_duration(ms: u64) -> String {
    format!("{}:{:02}", ms / 60_000, (ms % 60_000) / 1_000)
}

/// Capitalize the first letter of every word (`"original production"` → `"Original Production"`).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

/// `<{tag}-list count=".." offset="..">`
fn list_open(out: &mut String, tag: &str, total: usize, offset: usize) {
    out.push_str(&format!(r#"<{tag}-list count="{total}" offset="{offset}">"#));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::model::{Hit, ResultPage};

    pub fn page(hits: Vec<Hit>) -> ResultPage {
        let estimated_total = hits.len();
        ResultPage {
            hits,
            estimated_total,
            offset: 0,
        }
    }

    pub const SCRIPT: &str = "<script>alert(\"x\")</script>";

    /// Every declared field of an entity filled with a hostile value.
    pub fn hostile_hit(fields: &[&str]) -> Hit {
        fields
            .iter()
            .fold(Hit::new(42), |hit, f| hit.with(f, SCRIPT))
    }

    /// Rendered output contains no markup that came from a hit value.
    pub fn assert_escaped(out: &str) {
        assert!(!out.contains("<script>"), "raw tag leaked: {out}");
        assert!(!out.contains("</script>"), "raw tag leaked: {out}");
        assert!(out.contains("&lt;script&gt;"), "value missing: {out}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_covers_markup_and_quotes() {
        assert_eq!(escape("a & <b>"), "a &amp; &lt;b&gt;");
        assert_eq!(escape("\"quoted\""), "\"quoted\"");
        assert_eq!(escape_attr("say \"hi\" <now>"), "say &quot;hi&quot; &lt;now&gt;");
    }

    #[test]
    fn tagger_link_beats_relationship_link() {
        let mut options = RenderOptions {
            show_relationship_link: true,
            ..Default::default()
        };
        assert_eq!(options.link_column(), LinkColumn::Relationship);
        options.tagger_port = 8000;
        assert_eq!(options.link_column(), LinkColumn::Tagger(8000));
    }

    #[test]
    fn track_length_classes() {
        assert_eq!(track_length_class(Some(200_000), 204_999), "good");
        assert_eq!(track_length_class(Some(200_000), 185_001), "ok");
        assert_eq!(track_length_class(Some(200_000), 215_000), "bad");
        assert_eq!(track_length_class(None, 215_000), "");
        assert_eq!(track_length_class(Some(200_000), 0), "");
    }

    #[test]
    fn durations_and_titles() {
        assert_eq!(format_duration(245_000), "4:05");
        assert_eq!(format_duration(59_999), "0:59");
        assert_eq!(title_case("original production"), "Original Production");
        assert_eq!(title_case("pseudo-release"), "Pseudo-Release");
    }

    #[test]
    fn tagger_link_has_port_id_and_timestamp() {
        let link = tagger_link(8000, "abc", 1_200_000_000);
        assert!(link.contains("http://127.0.0.1:8000/openalbum?id=abc&amp;t=1200000000"));
    }
}
