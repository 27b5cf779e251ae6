use crate::model::ResultPage;

use super::{
    RenderOptions, escape, escape_attr, header_for, link_cell, list_open, row_open, table_close,
    table_open, title_case,
};

pub fn html(page: &ResultPage, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut headers = vec![
        "<td>Score</td>",
        "<td>Artist</td>",
        "<td>Sortname</td>",
        "<td>Type</td>",
        "<td>Begin</td>",
        "<td>End</td>",
    ];
    headers.extend(header_for(options.link_column()));
    table_open(&mut out, None, &headers);

    for (i, hit) in page.hits.iter().enumerate() {
        let arid = hit.text("arid");
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><span class="linkartist-icon"><a href="/artist/{}.html">{}</a></span>"#,
            escape_attr(arid),
            escape(hit.text("artist"))
        ));
        if let Some(comment) = hit.get("comment") {
            out.push_str(&format!(" ({})", escape(comment)));
        }
        out.push_str("</td>");
        for field in ["sortname", "type", "begin", "end"] {
            out.push_str(&format!("<td>{}</td>", escape(hit.text(field))));
        }
        link_cell(
            &mut out,
            options,
            "/show/artist/relationships.html?artistid=",
            arid,
            None,
        );
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "artist", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(r#"<artist id="{}""#, escape_attr(hit.text("arid"))));
        if let Some(kind) = hit.get("type") {
            out.push_str(&format!(r#" type="{}""#, escape_attr(&title_case(kind))));
        }
        out.push_str(&format!(r#" ext:score="{}">"#, hit.score));
        out.push_str(&format!("<name>{}</name>", escape(hit.text("artist"))));
        if let Some(sortname) = hit.get("sortname") {
            out.push_str(&format!("<sort-name>{}</sort-name>", escape(sortname)));
        }
        let (begin, end) = (hit.get("begin"), hit.get("end"));
        if begin.is_some() || end.is_some() {
            out.push_str("<life-span");
            if let Some(begin) = begin {
                out.push_str(&format!(r#" begin="{}""#, escape_attr(begin)));
            }
            if let Some(end) = end {
                out.push_str(&format!(r#" end="{}""#, escape_attr(end)));
            }
            out.push_str("/>");
        }
        if let Some(comment) = hit.get("comment") {
            out.push_str(&format!(
                "<disambiguation>{}</disambiguation>",
                escape(comment)
            ));
        }
        out.push_str("</artist>");
    }
    out.push_str("</artist-list>");
    out
}
