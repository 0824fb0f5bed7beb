#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use feedsync_core::{FeedSource, FetchError};
use url::Url;

pub fn sample_rss() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Test Feed</title>
    <link>http://example.com/</link>
    <description>Test description</description>
    <category>undefined</category>
    <category>News</category>
    <item>
      <title>Item 1</title>
      <link>http://example.com/1</link>
      <guid>1</guid>
      <pubDate>Mon, 21 Oct 2024 07:28:00 GMT</pubDate>
      <description>First</description>
      <category>null</category>
      <category>World</category>
    </item>
    <item>
      <title>Item 2</title>
      <link>http://example.com/2</link>
      <pubDate>Mon, 21 Oct 2024 08:00:00 GMT</pubDate>
      <description>Second</description>
      <dc:creator>Jane Doe</dc:creator>
      <enclosure url="http://example.com/2.jpg" length="1024" type="image/jpeg"/>
    </item>
  </channel>
</rss>"#
        .to_string()
}

pub fn sample_atom() -> String {
    r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-gb">
  <title>Atom Test</title>
  <subtitle>All the things</subtitle>
  <link href="http://example.org/"/>
  <link rel="self" href="http://example.org/feed.atom"/>
  <updated>2024-10-21T18:30:02Z</updated>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <author><name>John Doe</name><email>john@example.org</email></author>
  <generator uri="https://example.org/gen" version="1.2">Gen</generator>
  <category term="undefined"/>
  <category term="tech" label="Technology"/>
  <entry>
    <title>Atom entry</title>
    <link href="http://example.org/2024/10/21/atom"/>
    <link rel="enclosure" type="audio/mpeg" length="4096" href="http://example.org/ep.mp3"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-10-21T18:30:02Z</updated>
    <published>2024-10-21T17:00:00Z</published>
    <summary>Some text.</summary>
  </entry>
</feed>"#
        .to_string()
}

pub fn sample_rdf() -> String {
    r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="http://example.net/">
    <title>RDF Feed</title>
    <link>http://example.net/</link>
    <description>Legacy feed</description>
  </channel>
  <item rdf:about="http://example.net/a">
    <title>Legacy item</title>
    <link>http://example.net/a</link>
  </item>
</rdf:RDF>"#
        .to_string()
}

/// A per-test scratch directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("{prefix}_{}", uuid::Uuid::new_v4()));
    dir
}

/// Feed source that serves a fixed body and records how many fetches
/// overlap.
#[derive(Clone)]
pub struct CountingSource {
    body: Bytes,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(body: impl Into<String>, delay: Duration) -> Self {
        Self {
            body: Bytes::from(body.into()),
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeedSource for CountingSource {
    async fn fetch(&self, _url: &Url) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}
