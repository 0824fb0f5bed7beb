mod common;

use feedsync_core::{normalize, FeedKind, SyncError};

use common::{sample_atom, sample_rdf, sample_rss};

#[test]
fn rss_feed_is_fully_normalized() {
    let normalized = normalize(sample_rss().as_bytes(), "https://news.example.pl/feed").unwrap();
    let feed = &normalized.feed;

    assert_eq!(feed.self_url, "https://news.example.pl/feed");
    assert_eq!(feed.meta.kind, FeedKind::Rss);
    assert_eq!(feed.meta.version, "2.0");
    assert_eq!(feed.title.as_deref(), Some("Test Feed"));
    assert_eq!(feed.url.as_deref(), Some("http://example.com/"));
    assert_eq!(feed.language, "pl-PL");
    assert!(feed.copyright.is_none());
    assert!(feed.generator.is_none());
    assert!(feed.image.is_none());
    assert_eq!(feed.categories.len(), 1);
    assert_eq!(feed.categories[0].term, "News");

    assert_eq!(normalized.items.len(), 2);
    let first = &normalized.items[0];
    assert_eq!(first.guid, "1");
    assert!(first.published.is_some());
    let terms: Vec<_> = first.categories.iter().map(|c| c.term.as_str()).collect();
    assert_eq!(terms, ["World"]);
    assert!(first.media.is_empty());
    assert!(first.updated.is_none());
}

#[test]
fn missing_guid_falls_back_to_item_url() {
    let a = normalize(sample_rss().as_bytes(), "https://example.com/feed").unwrap();
    let b = normalize(sample_rss().as_bytes(), "https://example.com/feed").unwrap();

    let second = &a.items[1];
    assert_eq!(second.guid, "http://example.com/2");
    assert_eq!(second.guid, b.items[1].guid);
    assert_eq!(second.authors[0].name.as_deref(), Some("Jane Doe"));
    assert_eq!(second.media.len(), 1);
    assert_eq!(second.media[0].mimetype.as_deref(), Some("image/jpeg"));
    assert_eq!(second.media[0].kind.as_deref(), Some("image"));
    assert_eq!(second.media[0].length, Some(1024));
    assert_eq!(
        second.image.as_ref().map(|i| i.url.as_str()),
        Some("http://example.com/2.jpg")
    );
}

#[test]
fn generic_tld_without_language_is_undetermined() {
    let normalized = normalize(sample_rss().as_bytes(), "https://example.com/feed").unwrap();
    assert_eq!(normalized.feed.language, "und-UND");
}

#[test]
fn atom_feed_maps_to_same_shape() {
    let normalized = normalize(sample_atom().as_bytes(), "http://example.org/feed.atom").unwrap();
    let feed = &normalized.feed;

    assert_eq!(feed.meta.kind, FeedKind::Atom);
    assert_eq!(feed.meta.version, "1.0");
    assert_eq!(feed.title.as_deref(), Some("Atom Test"));
    assert_eq!(feed.description.as_deref(), Some("All the things"));
    assert_eq!(feed.url.as_deref(), Some("http://example.org/"));
    assert_eq!(feed.language, "en-GB");
    assert_eq!(feed.authors.len(), 1);
    assert_eq!(feed.authors[0].email.as_deref(), Some("john@example.org"));
    let generator = feed.generator.as_ref().unwrap();
    assert_eq!(generator.label.as_deref(), Some("Gen"));
    assert_eq!(generator.version.as_deref(), Some("1.2"));
    assert_eq!(feed.categories.len(), 1);
    assert_eq!(feed.categories[0].label.as_deref(), Some("Technology"));
    assert!(feed.updated.is_some());

    let entry = &normalized.items[0];
    assert_eq!(entry.guid, "urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a");
    assert_eq!(entry.url.as_deref(), Some("http://example.org/2024/10/21/atom"));
    assert_eq!(entry.description.as_deref(), Some("Some text."));
    assert!(entry.published.is_some());
    assert_eq!(entry.media.len(), 1);
    assert_eq!(entry.media[0].kind.as_deref(), Some("audio"));
    assert_eq!(entry.media[0].length, Some(4096));
    assert!(entry.image.is_none());
}

#[test]
fn rss_1_0_keeps_origin_version() {
    let normalized = normalize(sample_rdf().as_bytes(), "http://example.net/index.rdf").unwrap();
    assert_eq!(normalized.feed.meta.kind, FeedKind::Rss);
    assert_eq!(normalized.feed.meta.version, "1.0");
    assert_eq!(normalized.feed.title.as_deref(), Some("RDF Feed"));
}

#[test]
fn html_page_is_a_parse_error() {
    let err = normalize(
        b"<!DOCTYPE html><html><body>Not a feed</body></html>",
        "https://example.com/",
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::Parse { .. }));
}

#[test]
fn broken_rss_is_a_parse_error() {
    let err = normalize(b"<rss version=\"2.0\"><title>oops", "https://example.com/").unwrap_err();
    assert!(matches!(err, SyncError::Parse { .. }));
}
