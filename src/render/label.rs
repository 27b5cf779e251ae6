use crate::model::ResultPage;

use super::{
    RenderOptions, escape, escape_attr, header_for, link_cell, list_open, row_open, table_close,
    table_open, title_case,
};

const KNOWN_TYPES: [&str; 8] = [
    "unknown",
    "distributor",
    "holding",
    "production",
    "original production",
    "reissue production",
    "publisher",
    "bootleg production",
];

/// XML type attribute: `original production` → `OriginalProduction`; unknown values pass through.
fn xml_type(kind: &str) -> String {
    if KNOWN_TYPES.contains(&kind) {
        title_case(kind).replace(' ', "")
    } else {
        kind.to_string()
    }
}

pub fn html(page: &ResultPage, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut headers = vec![
        "<td>Score</td>",
        "<td>Label</td>",
        "<td>Sortname</td>",
        "<td>Code</td>",
        "<td>Type</td>",
        "<td>Begin</td>",
        "<td>End</td>",
    ];
    headers.extend(header_for(options.link_column()));
    table_open(&mut out, None, &headers);

    for (i, hit) in page.hits.iter().enumerate() {
        let laid = hit.text("laid");
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><span class="linklabel-icon"><a href="/label/{}.html">{}</a></span>"#,
            escape_attr(laid),
            escape(hit.text("label"))
        ));
        if let Some(comment) = hit.get("comment") {
            out.push_str(&format!(" ({})", escape(comment)));
        }
        out.push_str("</td>");
        for field in ["sortname", "code", "type", "begin", "end"] {
            out.push_str(&format!("<td>{}</td>", escape(hit.text(field))));
        }
        link_cell(
            &mut out,
            options,
            "/show/label/relationships.html?labelid=",
            laid,
            None,
        );
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "label", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(r#"<label id="{}""#, escape_attr(hit.text("laid"))));
        if let Some(kind) = hit.get("type") {
            out.push_str(&format!(r#" type="{}""#, escape_attr(&xml_type(kind))));
        }
        out.push_str(&format!(r#" ext:score="{}">"#, hit.score));
        out.push_str(&format!("<name>{}</name>", escape(hit.text("label"))));
        if let Some(sortname) = hit.get("sortname") {
            out.push_str(&format!("<sort-name>{}</sort-name>", escape(sortname)));
        }
        if let Some(code) = hit.get("code") {
            out.push_str(&format!("<label-code>{}</label-code>", escape(code)));
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
        out.push_str("</label>");
    }
    out.push_str("</label-list>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Hit;
    use crate::render::fixtures::{assert_escaped, hostile_hit, page};

    fn warp() -> Hit {
        Hit::new(100)
            .with("laid", "46f0f4cd-8aab-4b33-b698-f459faf64190")
            .with("label", "Warp")
            .with("sortname", "Warp Records")
            .with("code", "2070")
            .with("type", "original production")
            .with("begin", "1989")
            .with("comment", "Sheffield")
    }

    #[test]
    fn html_shows_code_and_comment() {
        let out = html(&page(vec![warp()]), &RenderOptions::default());
        assert!(out.contains(r#"<a href="/label/46f0f4cd-8aab-4b33-b698-f459faf64190.html">Warp</a></span> (Sheffield)</td>"#));
        assert!(out.contains("<td>Warp Records</td><td>2070</td><td>original production</td><td>1989</td><td></td>"));
    }

    #[test]
    fn xml_uses_display_type_names() {
        let out = xml(&page(vec![warp()]), &RenderOptions::default());
        assert!(out.contains(r#"type="OriginalProduction" ext:score="100">"#));
        assert!(out.contains("<label-code>2070</label-code>"));
        assert!(out.contains(r#"<life-span begin="1989"/>"#));
        assert_eq!(xml_type("imprint"), "imprint");
    }

    #[test]
    fn hostile_values_are_escaped() {
        let hit = hostile_hit(&["laid", "label", "sortname", "code", "type", "begin", "end", "comment"]);
        let options = RenderOptions {
            show_relationship_link: true,
            ..Default::default()
        };
        assert_escaped(&html(&page(vec![hit.clone()]), &options));
        assert_escaped(&xml(&page(vec![hit]), &options));
    }
}
