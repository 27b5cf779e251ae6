use crate::model::ResultPage;

use super::{RenderOptions, escape, escape_attr, list_open, row_open, table_close, table_open};

pub fn html(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    table_open(
        &mut out,
        None,
        &[
            "<td>Score</td>",
            "<td>Title</td>",
            "<td>Artist</td>",
            "<td>Tracks</td>",
            "<td>Discid</td>",
            "<td>Year</td>",
            "<td>Action</td>",
        ],
    );
    for (i, hit) in page.hits.iter().enumerate() {
        let (cat, discid) = (hit.text("cat"), hit.text("discid"));
        row_open(&mut out, i, hit);
        for field in ["title", "artist", "tracks"] {
            out.push_str(&format!("<td>{}</td>", escape(hit.text(field))));
        }
        out.push_str(&format!("<td>{} / {}</td>", escape(cat), escape(discid)));
        out.push_str(&format!("<td>{}</td>", escape(hit.text("year"))));
        out.push_str(&format!(
            r#"<td><a href="/freedb/import.html?catid={}/{}">import</a></td>"#,
            escape_attr(cat),
            escape_attr(discid)
        ));
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "release", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(r#"<release ext:score="{}">"#, hit.score));
        out.push_str(&format!("<title>{}</title>", escape(hit.text("title"))));
        out.push_str(&format!(
            "<artist><name>{}</name></artist>",
            escape(hit.text("artist"))
        ));
        if let Some(tracks) = hit.get("tracks") {
            out.push_str(&format!(r#"<track-list count="{}"/>"#, escape_attr(tracks)));
        }
        out.push_str(&format!(
            "<freedbid>{}</freedbid><category>{}</category><year>{}</year>",
            escape(hit.text("discid")),
            escape(hit.text("cat")),
            escape(hit.text("year"))
        ));
        out.push_str("</release>");
    }
    out.push_str("</release-list>");
    out
}
