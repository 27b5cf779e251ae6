use crate::model::ResultPage;

use super::{RenderOptions, escape, escape_attr, list_open, row_open, table_close, table_open};

pub fn html(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    table_open(
        &mut out,
        None,
        &["<td>Score</td>", "<td>CD</td>", "<td>Artist</td>", "<td>Tracks</td>"],
    );
    for (i, hit) in page.hits.iter().enumerate() {
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><a href="/show/cdstub/index.html?discid={}">{}</a></td>"#,
            escape_attr(hit.text("discid")),
            escape(hit.text("title"))
        ));
        out.push_str(&format!("<td>{}</td>", escape(hit.text("artist"))));
        out.push_str(&format!(
            "<td>{}</td>",
            escape(hit.get("tracks").unwrap_or("0"))
        ));
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "cdstub", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(
            r#"<cdstub id="{}" ext:score="{}">"#,
            escape_attr(hit.text("discid")),
            hit.score
        ));
        out.push_str(&format!("<title>{}</title>", escape(hit.text("title"))));
        out.push_str(&format!("<artist>{}</artist>", escape(hit.text("artist"))));
        if let Some(barcode) = hit.get("barcode") {
            out.push_str(&format!("<barcode>{}</barcode>", escape(barcode)));
        }
        if let Some(comment) = hit.get("comment") {
            out.push_str(&format!("<comment>{}</comment>", escape(comment)));
        }
        if let Some(tracks) = hit.get("tracks") {
            out.push_str(&format!(r#"<track-list count="{}"/>"#, escape_attr(tracks)));
        }
        out.push_str("</cdstub>");
    }
    out.push_str("</cdstub-list>");
    out
}
