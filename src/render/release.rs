use crate::model::{Hit, ResultPage};

use super::{
    RenderOptions, escape, escape_attr, header_for, link_cell, list_open, row_open, table_close,
    table_open, title_case,
};

/// Language and script with a `?` standing in for whichever one is missing.
fn lang_script(hit: &Hit) -> Option<(&str, &str)> {
    match (hit.get("lang"), hit.get("script")) {
        (None, None) => None,
        (lang, script) => Some((lang.unwrap_or("?"), script.unwrap_or("?"))),
    }
}

fn nth<'a>(values: &'a [String], i: usize) -> &'a str {
    values.get(i).map(|s| s.trim()).unwrap_or("")
}

pub fn html(page: &ResultPage, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut headers = vec![
        "<td>Score</td>",
        "<td>Album</td>",
        "<td>Artist</td>",
        "<td>Tracks</td>",
        r#"<td style="white-space: nowrap">CD ids</td>"#,
        "<td>Date</td>",
        "<td>Type</td>",
        r#"<td style="white-space: nowrap">Lang/script</td>"#,
    ];
    headers.extend(header_for(options.link_column()));
    table_open(&mut out, None, &headers);

    for (i, hit) in page.hits.iter().enumerate() {
        let reid = hit.text("reid");
        row_open(&mut out, i, hit);
        out.push_str(&format!(
            r#"<td><a href="/release/{}.html">{}</a></td>"#,
            escape_attr(reid),
            escape(hit.text("release"))
        ));
        out.push_str(&format!(
            r#"<td><a href="/artist/{}.html">{}</a></td>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist"))
        ));
        out.push_str(&format!(
            r#"<td align="center">{}</td><td align="center">{}</td>"#,
            escape(hit.text("tracks")),
            escape(hit.text("discids"))
        ));

        out.push_str("<td>");
        let countries = hit.values("country");
        for (j, date) in hit.values("date").iter().enumerate() {
            out.push_str(&format!(
                "{} {} ",
                escape(nth(countries, j)),
                escape(date.trim())
            ));
        }
        out.push_str("</td>");

        out.push_str(&format!(
            r#"<td align="center">{}</td>"#,
            escape(hit.text("type"))
        ));
        match lang_script(hit) {
            Some((lang, script)) => out.push_str(&format!(
                r#"<td align="center">{} / {}</td>"#,
                escape(lang),
                escape(&script.to_lowercase())
            )),
            None => out.push_str("<td></td>"),
        }
        link_cell(
            &mut out,
            options,
            "/show/release/relationships.html?releaseid=",
            reid,
            None,
        );
        out.push_str("</tr>");
    }
    table_close(&mut out);
    out
}

pub fn xml(page: &ResultPage, _options: &RenderOptions) -> String {
    let mut out = String::new();
    list_open(&mut out, "release", page.estimated_total, page.offset);
    for hit in &page.hits {
        out.push_str(&format!(r#"<release id="{}""#, escape_attr(hit.text("reid"))));
        let kind = format!("{} {}", hit.text("type"), hit.text("status"));
        let kind = kind.trim();
        if !kind.is_empty() {
            out.push_str(&format!(r#" type="{}""#, escape_attr(&title_case(kind))));
        }
        out.push_str(&format!(r#" ext:score="{}">"#, hit.score));
        out.push_str(&format!("<title>{}</title>", escape(hit.text("release"))));

        let (lang, script) = (hit.get("lang"), hit.get("script"));
        if lang.is_some() || script.is_some() {
            out.push_str("<text-representation");
            if let Some(lang) = lang {
                out.push_str(&format!(r#" language="{}""#, escape_attr(&lang.to_uppercase())));
            }
            if let Some(script) = script {
                out.push_str(&format!(r#" script="{}""#, escape_attr(script)));
            }
            out.push_str("/>");
        }
        if let Some(asin) = hit.get("asin").map(str::trim).filter(|a| !a.is_empty()) {
            out.push_str(&format!("<asin>{}</asin>", escape(&asin.to_uppercase())));
        }

        out.push_str(&format!(
            r#"<artist id="{}"><name>{}</name></artist>"#,
            escape_attr(hit.text("arid")),
            escape(hit.text("artist"))
        ));

        let dates = hit.values("date");
        if !dates.is_empty() {
            let (countries, labels, catnos, barcodes) = (
                hit.values("country"),
                hit.values("label"),
                hit.values("catno"),
                hit.values("barcode"),
            );
            out.push_str("<release-event-list>");
            for (j, date) in dates.iter().enumerate() {
                out.push_str(&format!(
                    r#"<event date="{}" country="{}" label="{}" catno="{}" barcode="{}"/>"#,
                    escape_attr(date.trim()),
                    escape_attr(&nth(countries, j).to_uppercase()),
                    escape_attr(nth(labels, j)),
                    escape_attr(nth(catnos, j)),
                    escape_attr(nth(barcodes, j)),
                ));
            }
            out.push_str("</release-event-list>");
        }
        if let Some(discids) = hit.get("discids") {
            out.push_str(&format!(r#"<disc-list count="{}"/>"#, escape_attr(discids)));
        }
        if let Some(tracks) = hit.get("tracks") {
            out.push_str(&format!(r#"<track-list count="{}"/>"#, escape_attr(tracks)));
        }
        out.push_str("</release>");
    }
    out.push_str("</release-list>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures::{assert_escaped, hostile_hit, page};

    fn nevermind() -> Hit {
        Hit::new(97)
            .with("reid", "1b022e01-4da6-387b-8658-8678046e4cef")
            .with("release", "Nevermind")
            .with("arid", "5b11f4ce-a62d-471e-81fc-a69a8278c7da")
            .with("artist", "Nirvana")
            .with("type", "album")
            .with("status", "official")
            .with("tracks", "13")
            .with("discids", "4")
            .with("lang", "eng")
            .with("date", "1991-09-24")
            .with("country", "us")
            .with("label", "DGC")
            .with("catno", "DGCD-24425")
            .with("barcode", "720642442524")
            .with("date", "1991-10-01")
            .with("country", "gb")
    }

    #[test]
    fn html_row_has_events_and_language_placeholder() {
        let out = html(&page(vec![nevermind()]), &RenderOptions::default());
        assert!(out.contains(r#"<a href="/release/1b022e01-4da6-387b-8658-8678046e4cef.html">Nevermind</a>"#));
        assert!(out.contains("<td>us 1991-09-24 gb 1991-10-01 </td>"));
        assert!(out.contains(r#"<td align="center">eng / ?</td>"#));
        assert!(out.contains(r#"<td align="center">13</td><td align="center">4</td>"#));
    }

    #[test]
    fn tagger_column_uses_release_id() {
        let options = RenderOptions {
            tagger_port: 8000,
            show_relationship_link: true,
            link_timestamp: Some(7),
            ..Default::default()
        };
        let out = html(&page(vec![nevermind()]), &options);
        assert!(out.contains("<td>Tagger</td>"));
        assert!(!out.contains("<td>Rel</td>"));
        assert!(out.contains("openalbum?id=1b022e01-4da6-387b-8658-8678046e4cef&amp;t=7"));
        assert!(!out.contains("addrel=1"));
    }

    #[test]
    fn xml_lists_release_events() {
        let out = xml(&page(vec![nevermind()]), &RenderOptions::default());
        assert!(out.contains(r#"<release id="1b022e01-4da6-387b-8658-8678046e4cef" type="Album Official" ext:score="97">"#));
        assert!(out.contains(r#"<text-representation language="ENG"/>"#));
        assert!(out.contains(r#"<event date="1991-09-24" country="US" label="DGC" catno="DGCD-24425" barcode="720642442524"/>"#));
        assert!(out.contains(r#"<event date="1991-10-01" country="GB" label="" catno="" barcode=""/>"#));
        assert!(out.contains(r#"<disc-list count="4"/><track-list count="13"/></release>"#));
    }

    #[test]
    fn hostile_values_are_escaped() {
        let hit = hostile_hit(&[
            "reid", "release", "arid", "artist", "type", "status", "tracks", "discids", "lang",
            "script", "asin", "date", "country", "label", "catno", "barcode",
        ]);
        let options = RenderOptions {
            tagger_port: 1,
            ..Default::default()
        };
        assert_escaped(&html(&page(vec![hit.clone()]), &options));
        assert_escaped(&xml(&page(vec![hit]), &options));
    }
}
