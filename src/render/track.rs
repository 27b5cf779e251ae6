use crate::model::{Hit, ResultPage};

use super::{
    RenderOptions, escape, escape_attr, format_duration, header_for, link_cell, list_open,
    row_open, table_close, table_open, track_length_class,
};

fn number(hit: &Hit, field: &str) -> u64 {
    hit.get(field)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

pub fn html(page: &ResultPage, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut headers = vec![
        "<td>Score</td>",
        "<td>Artist</td>",
        "<td>Release</td>",
        "<td>Track</td>",
        "<td>Num</td>",
        "<td>Length</td>",
        "<td>Tracks</td>",
        "<td>Type</td>",
    ];
    headers.extend(header_for(options.link_column()));
    table_open(&mut out, Some("TagLookupTrackResults"), &headers);

    for (i, hit) in page.hits.iter().enumerate() {
        let trid = hit.text("trid");
        let reid = hit.text("reid");
        let dur = number(hit, "dur");
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><span class="linkartist-icon"><a href="/artist/{}.html">{}</a></span></td>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist"))
        ));
        out.push_str(&format!(
            r#"<td><span class="linkrelease-icon"><a href="/release/{}.html">{}</a></span></td>"#,
            escape_attr(reid),
            escape(hit.text("release"))
        ));
        out.push_str(&format!(
            r#"<td><span class="linktrack-icon"><a href="/track/{}.html">{}</a></span></td>"#,
            escape_attr(trid),
            escape(hit.text("track"))
        ));
        out.push_str(&format!(
            r#"<td align="center">{}</td>"#,
            escape(hit.text("tnum"))
        ));
        out.push_str(&format!(
            r#"<td align="center" class="tlen {}">"#,
            track_length_class(options.duration_ms, dur)
        ));
        if dur > 0 {
            out.push_str(&format_duration(dur));
        } else {
            out.push_str("&nbsp;");
        }
        out.push_str("</td>");
        out.push_str(&format!(
            r#"<td align="center">{}</td>"#,
            escape(hit.text("tracks"))
        ));
        out.push_str(&format!("<td>{}</td>", escape(hit.text("type"))));
        link_cell(
            &mut out,
            options,
            "/show/track/relationships.html?trackid=",
            trid,
            Some(reid),
        );
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "track", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(
            r#"<track id="{}" ext:score="{}">"#,
            escape_attr(hit.text("trid")),
            hit.score
        ));
        out.push_str(&format!("<title>{}</title>", escape(hit.text("track"))));
        if let Some(dur) = hit.get("dur") {
            out.push_str(&format!("<duration>{}</duration>", escape(dur)));
        }
        out.push_str(&format!(
            r#"<artist id="{}"><name>{}</name><sort-name>{}</sort-name></artist>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist")),
            escape(hit.text("sortname"))
        ));
        out.push_str(&format!(
            r#"<release-list><release id="{}"><title>{}</title>"#,
            escape_attr(hit.text("reid")),
            escape(hit.text("release"))
        ));
        let (tnum, tracks) = (number(hit, "tnum"), number(hit, "tracks"));
        if tnum > 0 {
            if tracks > 0 {
                out.push_str(&format!(
                    r#"<track-list offset="{}" count="{tracks}"/>"#,
                    tnum - 1
                ));
            } else {
                out.push_str(&format!(r#"<track-list offset="{}"/>"#, tnum - 1));
            }
        }
        out.push_str("</release></release-list></track>");
    }
    out.push_str("</track-list>");
    out
}
