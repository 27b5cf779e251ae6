use crate::model::ResultPage;

use super::{RenderOptions, escape, escape_attr, list_open, row_open, table_close, table_open};

pub fn html(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    table_open(
        &mut out,
        None,
        &[
            "<td>Score</td>",
            "<td>Type</td>",
            "<td>Name</td>",
            "<td>Annotation</td>",
        ],
    );
    for (i, hit) in page.hits.iter().enumerate() {
        let kind = hit.text("type");
        row_open(&mut out, i, hit);
        out.push_str(&format!("<td>{}</td>", escape(kind)));
        out.push_str(&format!(
            r#"<td><a href="/{}/{}.html">{}</a></td>"#,
            escape_attr(kind),
            escape_attr(hit.text("mbid")),
            escape(hit.text("name"))
        ));
        // The site expands the text between the wiki markers.
        out.push_str(&format!(
            "<td>%WIKIBEGIN%{}%WIKIEND%</td>",
            escape(hit.text("text"))
        ));
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "annotation", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(
            r#"<annotation type="{}" ext:score="{}">"#,
            escape_attr(hit.text("type")),
            hit.score
        ));
        out.push_str(&format!(
            "<entity>{}</entity><name>{}</name><text>{}</text>",
            escape(hit.text("mbid")),
            escape(hit.text("name")),
            escape(hit.text("text"))
        ));
        out.push_str("</annotation>");
    }
    out.push_str("</annotation-list>");
    out
}
