use crate::model::ResultPage;

use super::{
    RenderOptions, escape, escape_attr, header_for, link_cell, list_open, row_open, table_close,
    table_open, title_case,
};

pub fn html(page: &ResultPage, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut headers = vec![
        "<td>Score</td>",
        "<td>Release Group</td>",
        "<td>Artist</td>",
        "<td>Type</td>",
    ];
    headers.extend(header_for(options.link_column()));
    table_open(&mut out, None, &headers);

    for (i, hit) in page.hits.iter().enumerate() {
        let rgid = hit.text("rgid");
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><a href="/release-group/{}.html">{}</a></td>"#,
            escape_attr(rgid),
            escape(hit.text("releasegroup"))
        ));
        out.push_str(&format!(
            r#"<td><a href="/artist/{}.html">{}</a></td>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist"))
        ));
        out.push_str(&format!(
            r#"<td align="center">{}</td>"#,
            escape(hit.text("type"))
        ));
        link_cell(
            &mut out,
            options,
            "/show/release-group/relationships.html?releasegroupid=",
            rgid,
            None,
        );
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "release-group", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(
            r#"<release-group id="{}""#,
            escape_attr(hit.text("rgid"))
        ));
        if let Some(kind) = hit.get("type") {
            out.push_str(&format!(r#" type="{}""#, escape_attr(&title_case(kind))));
        }
        out.push_str(&format!(r#" ext:score="{}">"#, hit.score));
        out.push_str(&format!(
            "<title>{}</title>",
            escape(hit.text("releasegroup"))
        ));
        out.push_str(&format!(
            r#"<artist id="{}"><name>{}</name></artist>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist"))
        ));
        out.push_str("</release-group>");
    }
    out.push_str("</release-group-list>");
    out
}
