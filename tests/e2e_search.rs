//! Facade queries against a real published generation.

mod util;

use mbsearch::indexer::GenerationLayout;
use mbsearch::model::{EntityType, OutputFormat, SearchOutcome};
use mbsearch::search::facade::{EntitySearch, SearchOptions};
use mbsearch::search::{QueryError, SearchFailure};
use util::{FixtureCatalog, LITHIUM_ID, NEVERMIND_ID, NIRVANA_ID, TestTracing};

fn facade(catalog: &FixtureCatalog, entity: EntityType) -> EntitySearch<mbsearch::search::tantivy::TantivyBackend> {
    let layout = GenerationLayout::new(&catalog.indexes_root);
    EntitySearch::open_current(&layout, &catalog.label, entity, SearchOptions::default())
        .expect("open current generation")
}

fn html(facade: &EntitySearch<mbsearch::search::tantivy::TantivyBackend>, query: &str) -> String {
    String::from_utf8(facade.search(query.as_bytes(), 25, 0, OutputFormat::Html).unwrap()).unwrap()
}

#[test]
fn single_artist_match_redirects_to_its_id() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    let out = html(&artists, "beyonce");
    assert!(out.starts_with("<!--\nhits=1\noffset=0\nredirect=9fdaa16b-a6c4-4831-b87c-bc9ca8ce7eaa\n-->"), "{out}");
    assert!(out.contains("Beyoncé"));
}

#[test]
fn track_redirect_prefers_track_id() {
    let catalog = FixtureCatalog::build();
    let tracks = facade(&catalog, EntityType::Track);
    match tracks.query(b"lithium", 25, 0).unwrap() {
        SearchOutcome::Redirect { id, page } => {
            assert_eq!(id, LITHIUM_ID);
            assert_eq!(page.hits[0].get("reid"), Some(NEVERMIND_ID));
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[test]
fn several_matches_render_a_page_without_redirect() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    let out = html(&artists, "nirvana");
    assert!(out.starts_with("<!--\nhits=2\noffset=0\n-->"), "{out}");
    assert!(out.contains(&format!(r#"<a href="/artist/{NIRVANA_ID}.html">Nirvana</a>"#)));
    assert!(out.contains(r#"<tr class="searchresultseven"><td>100</td>"#));
}

#[test]
fn legacy_ordinals_and_operators_reach_the_index() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    match artists.query(b"type:1 AND beyonce", 25, 0).unwrap() {
        SearchOutcome::Redirect { id, .. } => assert_eq!(id, "9fdaa16b-a6c4-4831-b87c-bc9ca8ce7eaa"),
        other => panic!("expected redirect, got {other:?}"),
    }
    let releases = facade(&catalog, EntityType::Release);
    match releases.query(b"type:1 AND artist:nirvana", 25, 0).unwrap() {
        SearchOutcome::Redirect { id, .. } => assert_eq!(id, NEVERMIND_ID),
        other => panic!("expected redirect, got {other:?}"),
    }
    // Leading zeros are dropped from barcodes on both sides.
    assert!(matches!(
        releases.query(b"barcode:00012345", 25, 0).unwrap(),
        SearchOutcome::Redirect { .. }
    ));
}

#[test]
fn acronyms_apostrophes_and_uuids_match_stored_forms() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    assert!(matches!(artists.query(b"R.E.M.", 25, 0).unwrap(), SearchOutcome::Redirect { .. }));
    assert!(matches!(artists.query(b"guns n' roses", 25, 0).unwrap(), SearchOutcome::Redirect { .. }));
    let query = format!("arid:{}", NIRVANA_ID.to_uppercase());
    match artists.query(query.as_bytes(), 25, 0).unwrap() {
        SearchOutcome::Redirect { id, .. } => assert_eq!(id, NIRVANA_ID),
        other => panic!("expected redirect, got {other:?}"),
    }
    assert!(matches!(artists.query("坂本龍一".as_bytes(), 25, 0).unwrap(), SearchOutcome::Redirect { .. }));
}

#[test]
fn no_match_is_no_results_not_an_empty_page() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    let err = artists.search(b"metallica", 25, 0, OutputFormat::Html).unwrap_err();
    assert!(matches!(err, SearchFailure::NoResults));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn rejected_queries_are_query_errors() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    let err = artists.query(b"(nirvana", 25, 0).unwrap_err();
    assert!(matches!(err, SearchFailure::Query(QueryError::UnbalancedParens)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn stored_markup_is_escaped_in_both_formats() {
    let catalog = FixtureCatalog::build();
    let artists = facade(&catalog, EntityType::Artist);
    for format in [OutputFormat::Html, OutputFormat::Xml] {
        let out = String::from_utf8(artists.search(b"alert", 25, 0, format).unwrap()).unwrap();
        assert!(!out.contains("<script>"), "{out}");
        assert!(out.contains("&lt;script&gt;alert(1)&lt;/script&gt;"), "{out}");
    }
}

#[test]
fn xml_pages_report_total_and_offset() {
    let catalog = FixtureCatalog::build();
    let labels = facade(&catalog, EntityType::Label);
    let out = String::from_utf8(labels.search(b"type:4", 1, 1, OutputFormat::Xml).unwrap()).unwrap();
    assert!(out.starts_with(r#"<label-list count="2" offset="1">"#), "{out}");
    assert_eq!(out.matches("<label ").count(), 1);
}

#[test]
fn slow_queries_are_logged_on_the_query_log_target() {
    let catalog = FixtureCatalog::build();
    let tracing = TestTracing::new();
    let _guard = tracing.install();
    let layout = GenerationLayout::new(&catalog.indexes_root);
    let options = SearchOptions {
        slow_query: std::time::Duration::ZERO,
        ..SearchOptions::default()
    };
    let artists = EntitySearch::open_current(&layout, &catalog.label, EntityType::Artist, options).unwrap();
    artists.query(b"nirvana", 25, 0).unwrap();
    tracing.assert_contains("mbsearch::query_log");
    tracing.assert_contains("slow_query");
}

#[test]
fn unknown_label_has_no_index() {
    let catalog = FixtureCatalog::build();
    let layout = GenerationLayout::new(&catalog.indexes_root);
    let err = EntitySearch::open_current(&layout, "missing", EntityType::Artist, SearchOptions::default())
        .err()
        .expect("no generation");
    assert!(matches!(err, SearchFailure::NoSuchIndex { .. }));
    assert_eq!(err.exit_code(), 1);
}
