//! Parses raw RSS/Atom payloads into the canonical [`FeedData`]/[`ItemData`]
//! shape. All format variance is absorbed here.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::error::SyncError;
use crate::language::normalize_language;
use crate::models::{
    Author, Category, FeedData, FeedKind, FeedMeta, Generator, Image, ItemData, Media,
};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFeed {
    pub feed: FeedData,
    pub items: Vec<ItemData>,
}

/// Root element information read before handing the payload to a parser.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RootInfo {
    kind: FeedKind,
    version: &'static str,
    lang: Option<String>,
}

pub fn normalize(raw: &[u8], source_url: &str) -> Result<NormalizedFeed, SyncError> {
    let parse_error = |message: String| SyncError::Parse {
        url: source_url.to_owned(),
        message,
    };
    let root = sniff_root(raw)
        .ok_or_else(|| parse_error("content is neither an RSS nor an Atom document".into()))?;

    let normalized = match root.kind {
        FeedKind::Rss => {
            let channel = rss::Channel::read_from(raw).map_err(|e| parse_error(e.to_string()))?;
            from_rss(&channel, &root, source_url)
        }
        FeedKind::Atom => {
            let feed = atom_syndication::Feed::read_from(raw)
                .map_err(|e| parse_error(e.to_string()))?;
            from_atom(&feed, &root, source_url)
        }
    };
    debug!(
        url = source_url,
        kind = ?root.kind,
        version = root.version,
        items = normalized.items.len(),
        "normalized feed"
    );
    Ok(normalized)
}

fn sniff_root(raw: &[u8]) -> Option<RootInfo> {
    let head = String::from_utf8_lossy(&raw[..raw.len().min(8192)]);
    let mut rest = head.trim_start_matches('\u{feff}');
    loop {
        let start = rest.find('<')?;
        rest = &rest[start..];
        if rest.starts_with("<!--") {
            rest = &rest[rest.find("-->")? + 3..];
        } else if rest.starts_with("<?") || rest.starts_with("<!") {
            rest = &rest[rest.find('>')? + 1..];
        } else {
            break;
        }
    }
    let tag = &rest[1..rest.find('>')?];
    let name = tag
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    let local = name.rsplit(':').next().unwrap_or(name);
    let lang = attribute(tag, "xml:lang").and_then(non_empty);

    match local {
        "rss" => {
            let version = match attribute(tag, "version").as_deref() {
                Some(v) if v.starts_with("0.9") => "0.9",
                _ => "2.0",
            };
            Some(RootInfo { kind: FeedKind::Rss, version, lang })
        }
        "RDF" => {
            let version = if tag.contains("my.netscape.com/rdf/simple/0.9") {
                "0.9"
            } else {
                "1.0"
            };
            Some(RootInfo { kind: FeedKind::Rss, version, lang })
        }
        "feed" => {
            let version = if tag.contains("purl.org/atom/ns#") { "0.3" } else { "1.0" };
            Some(RootInfo { kind: FeedKind::Atom, version, lang })
        }
        _ => None,
    }
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    let mut search = tag;
    while let Some(pos) = search.find(name) {
        let preceded_ok = pos == 0 || search[..pos].ends_with(char::is_whitespace);
        let after = search[pos + name.len()..].trim_start();
        if preceded_ok {
            if let Some(value) = after.strip_prefix('=') {
                let value = value.trim_start();
                let quote = value.chars().next()?;
                if quote == '"' || quote == '\'' {
                    let body = &value[1..];
                    return body.find(quote).map(|end| body[..end].to_owned());
                }
            }
        }
        search = &search[pos + name.len()..];
    }
    None
}

fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Keeps real categories only; some generators emit the literal strings
/// "undefined" or "null" as terms.
fn category(term: &str, label: Option<&str>, url: Option<&str>) -> Option<Category> {
    let term = non_empty(term)?;
    if term.eq_ignore_ascii_case("undefined") || term.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(Category {
        label: label.and_then(non_empty),
        term,
        url: url.and_then(non_empty),
    })
}

/// Splits the RSS `"jane@example.com (Jane Doe)"` author convention.
fn parse_rss_person(raw: &str) -> Option<Author> {
    let raw = non_empty(raw)?;
    if let (Some(open), true) = (raw.find('('), raw.ends_with(')')) {
        let email = non_empty(&raw[..open]);
        let name = non_empty(&raw[open + 1..raw.len() - 1]);
        return Some(Author { name, email, url: None });
    }
    if raw.contains('@') && !raw.contains(' ') {
        return Some(Author { name: None, email: Some(raw), url: None });
    }
    Some(Author { name: Some(raw), email: None, url: None })
}

fn push_unique_author(authors: &mut Vec<Author>, author: Author) {
    if !authors.contains(&author) {
        authors.push(author);
    }
}

fn medium_from_mime(mime: Option<&str>) -> Option<String> {
    mime.and_then(|m| m.split('/').next()).and_then(non_empty)
}

// --- extension access, shared by the rss and atom extension types ---

trait ExtensionView: Sized {
    fn value(&self) -> Option<&str>;
    fn attrs(&self) -> &BTreeMap<String, String>;
    fn children(&self) -> &BTreeMap<String, Vec<Self>>;
}

impl ExtensionView for rss::extension::Extension {
    fn value(&self) -> Option<&str> {
        rss::extension::Extension::value(self)
    }
    fn attrs(&self) -> &BTreeMap<String, String> {
        rss::extension::Extension::attrs(self)
    }
    fn children(&self) -> &BTreeMap<String, Vec<Self>> {
        rss::extension::Extension::children(self)
    }
}

impl ExtensionView for atom_syndication::extension::Extension {
    fn value(&self) -> Option<&str> {
        atom_syndication::extension::Extension::value(self)
    }
    fn attrs(&self) -> &BTreeMap<String, String> {
        atom_syndication::extension::Extension::attrs(self)
    }
    fn children(&self) -> &BTreeMap<String, Vec<Self>> {
        atom_syndication::extension::Extension::children(self)
    }
}

type Extensions<E> = BTreeMap<String, BTreeMap<String, Vec<E>>>;

fn media_content<E: ExtensionView>(ext: &E) -> Option<Media> {
    let attrs = ext.attrs();
    let url = attrs.get("url").and_then(non_empty)?;
    let mimetype = attrs.get("type").and_then(non_empty);
    let kind = attrs
        .get("medium")
        .and_then(non_empty)
        .or_else(|| medium_from_mime(mimetype.as_deref()));
    let title = ext
        .children()
        .get("title")
        .and_then(|t| t.first())
        .and_then(|t| t.value())
        .and_then(non_empty);
    let image = ext
        .children()
        .get("thumbnail")
        .and_then(|t| t.first())
        .and_then(|t| t.attrs().get("url"))
        .and_then(non_empty);
    Some(Media {
        url,
        kind,
        mimetype,
        length: attrs.get("fileSize").and_then(|l| l.trim().parse().ok()),
        title,
        image,
    })
}

fn media_from_extensions<E: ExtensionView>(extensions: &Extensions<E>) -> (Vec<Media>, Option<Image>) {
    let Some(media_ns) = extensions.get("media") else {
        return (Vec::new(), None);
    };
    let mut media: Vec<Media> = media_ns
        .get("content")
        .into_iter()
        .flatten()
        .filter_map(media_content)
        .collect();
    for group in media_ns.get("group").into_iter().flatten() {
        media.extend(
            group
                .children()
                .get("content")
                .into_iter()
                .flatten()
                .filter_map(media_content),
        );
    }
    let thumbnail = media_ns
        .get("thumbnail")
        .and_then(|t| t.first())
        .and_then(|t| t.attrs().get("url"))
        .and_then(non_empty)
        .map(|url| Image { title: None, url });
    (media, thumbnail)
}

/// Picks the item image: explicit thumbnail, else first image-typed media.
fn item_image(thumbnail: Option<Image>, media: &[Media], title: Option<&str>) -> Option<Image> {
    thumbnail
        .or_else(|| {
            media
                .iter()
                .find(|m| m.kind.as_deref() == Some("image"))
                .map(|m| Image { title: None, url: m.url.clone() })
        })
        .or_else(|| {
            media.iter().find_map(|m| {
                m.image.clone().map(|url| Image { title: None, url })
            })
        })
        .map(|mut image| {
            image.title = title.and_then(non_empty);
            image
        })
}

// --- RSS ---

fn from_rss(channel: &rss::Channel, root: &RootInfo, source_url: &str) -> NormalizedFeed {
    let dc = channel.dublin_core_ext();

    let mut authors = Vec::new();
    for raw in [channel.managing_editor(), channel.webmaster()].into_iter().flatten() {
        if let Some(author) = parse_rss_person(raw) {
            push_unique_author(&mut authors, author);
        }
    }
    for creator in dc.map(|dc| dc.creators()).unwrap_or_default() {
        if let Some(author) = parse_rss_person(creator) {
            push_unique_author(&mut authors, author);
        }
    }

    let mut categories: Vec<Category> = channel
        .categories()
        .iter()
        .filter_map(|c| category(c.name(), None, c.domain()))
        .collect();
    for subject in dc.map(|dc| dc.subjects()).unwrap_or_default() {
        categories.extend(category(subject, None, None));
    }

    let declared_language = channel
        .language()
        .map(str::to_owned)
        .or_else(|| dc.and_then(|dc| dc.languages().first().cloned()))
        .or_else(|| root.lang.clone());

    let published = channel
        .pub_date()
        .and_then(parse_date)
        .or_else(|| dc.and_then(|dc| dc.dates().first()).and_then(|d| parse_date(d)));

    let feed = FeedData {
        self_url: source_url.to_owned(),
        url: non_empty(channel.link()),
        title: non_empty(channel.title()),
        description: non_empty(channel.description()),
        language: normalize_language(declared_language.as_deref(), source_url),
        copyright: channel
            .copyright()
            .and_then(non_empty)
            .or_else(|| dc.and_then(|dc| dc.rights().first()).and_then(non_empty)),
        authors,
        categories,
        generator: channel.generator().and_then(non_empty).map(|label| Generator {
            label: Some(label),
            url: None,
            version: None,
        }),
        image: channel.image().and_then(|image| {
            non_empty(image.url()).map(|url| Image {
                title: non_empty(image.title()),
                url,
            })
        }),
        meta: FeedMeta {
            kind: FeedKind::Rss,
            version: root.version.to_owned(),
        },
        published,
        updated: channel.last_build_date().and_then(parse_date),
    };

    let items = channel
        .items()
        .iter()
        .filter_map(|item| rss_item(item, source_url))
        .collect();

    NormalizedFeed { feed, items }
}

fn rss_item(item: &rss::Item, source_url: &str) -> Option<ItemData> {
    let url = item.link().and_then(non_empty);
    let Some(guid) = item
        .guid()
        .and_then(|guid| non_empty(guid.value()))
        .or_else(|| url.clone())
    else {
        debug!(feed = source_url, title = ?item.title(), "skipping item without guid or link");
        return None;
    };
    let dc = item.dublin_core_ext();

    let mut authors = Vec::new();
    if let Some(author) = item.author().and_then(parse_rss_person) {
        authors.push(author);
    }
    for creator in dc.map(|dc| dc.creators()).unwrap_or_default() {
        if let Some(author) = parse_rss_person(creator) {
            push_unique_author(&mut authors, author);
        }
    }

    let mut categories: Vec<Category> = item
        .categories()
        .iter()
        .filter_map(|c| category(c.name(), None, c.domain()))
        .collect();
    for subject in dc.map(|dc| dc.subjects()).unwrap_or_default() {
        categories.extend(category(subject, None, None));
    }

    let (mut media, thumbnail) = media_from_extensions(item.extensions());
    if let Some(enclosure) = item.enclosure() {
        if let Some(url) = non_empty(enclosure.url()) {
            let mimetype = non_empty(enclosure.mime_type());
            media.push(Media {
                url,
                kind: medium_from_mime(mimetype.as_deref()),
                mimetype,
                length: enclosure.length().trim().parse().ok(),
                title: None,
                image: None,
            });
        }
    }

    let title = item.title().and_then(non_empty);
    let published = item
        .pub_date()
        .and_then(parse_date)
        .or_else(|| dc.and_then(|dc| dc.dates().first()).and_then(|d| parse_date(d)));

    Some(ItemData {
        guid,
        image: item_image(thumbnail, &media, title.as_deref()),
        title,
        description: item.description().and_then(non_empty),
        content: item.content().and_then(non_empty),
        url,
        authors,
        categories,
        media,
        published,
        updated: None,
    })
}

// --- Atom ---

fn atom_person(person: &atom_syndication::Person) -> Author {
    Author {
        name: non_empty(person.name()),
        email: person.email().and_then(non_empty),
        url: person.uri().and_then(non_empty),
    }
}

fn alternate_link(links: &[atom_syndication::Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| links.iter().find(|l| l.rel() != "self" && l.rel() != "enclosure"))
        .and_then(|l| non_empty(l.href()))
}

fn from_atom(feed: &atom_syndication::Feed, root: &RootInfo, source_url: &str) -> NormalizedFeed {
    let data = FeedData {
        self_url: source_url.to_owned(),
        url: alternate_link(feed.links()),
        title: non_empty(feed.title().as_str()),
        description: feed.subtitle().and_then(|t| non_empty(t.as_str())),
        language: normalize_language(root.lang.as_deref(), source_url),
        copyright: feed.rights().and_then(|t| non_empty(t.as_str())),
        authors: feed.authors().iter().map(atom_person).collect(),
        categories: feed
            .categories()
            .iter()
            .filter_map(|c| category(c.term(), c.label(), c.scheme()))
            .collect(),
        generator: feed.generator().map(|g| Generator {
            label: non_empty(g.value()),
            url: g.uri().and_then(non_empty),
            version: g.version().and_then(non_empty),
        }),
        image: feed
            .logo()
            .or_else(|| feed.icon())
            .and_then(non_empty)
            .map(|url| Image { title: None, url }),
        meta: FeedMeta {
            kind: FeedKind::Atom,
            version: root.version.to_owned(),
        },
        published: None,
        updated: Some(feed.updated().with_timezone(&Utc)),
    };

    let items = feed
        .entries()
        .iter()
        .filter_map(|entry| atom_entry(entry, source_url))
        .collect();

    NormalizedFeed { feed: data, items }
}

fn atom_entry(entry: &atom_syndication::Entry, source_url: &str) -> Option<ItemData> {
    let url = alternate_link(entry.links());
    let Some(guid) = non_empty(entry.id()).or_else(|| url.clone()) else {
        debug!(feed = source_url, "skipping entry without id or link");
        return None;
    };

    let (mut media, thumbnail) = media_from_extensions(entry.extensions());
    for link in entry.links().iter().filter(|l| l.rel() == "enclosure") {
        if let Some(href) = non_empty(link.href()) {
            let mimetype = link.mime_type().and_then(non_empty);
            media.push(Media {
                url: href,
                kind: medium_from_mime(mimetype.as_deref()),
                mimetype,
                length: link.length().and_then(|l| l.trim().parse().ok()),
                title: link.title().and_then(non_empty),
                image: None,
            });
        }
    }

    let title = non_empty(entry.title().as_str());
    Some(ItemData {
        guid,
        image: item_image(thumbnail, &media, title.as_deref()),
        title,
        description: entry.summary().and_then(|s| non_empty(s.as_str())),
        content: entry.content().and_then(|c| c.value()).and_then(non_empty),
        url,
        authors: entry.authors().iter().map(atom_person).collect(),
        categories: entry
            .categories()
            .iter()
            .filter_map(|c| category(c.term(), c.label(), c.scheme()))
            .collect(),
        media,
        published: entry.published().map(|d| d.with_timezone(&Utc)),
        updated: Some(entry.updated().with_timezone(&Utc)),
    })
}
