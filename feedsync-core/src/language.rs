//! Language tag normalization for feeds.
//!
//! Declared languages are normalized to `ll-RR`. Feeds without a declared
//! language get a tag inferred from the country-code TLD of their URL, or the
//! `und-UND` sentinel.

use url::{Host, Url};

pub const UNDETERMINED: &str = "und-UND";

const IGNORED_TLDS: &[&str] = &["com", "org", "net", "info", "gov", "edu"];

const LANGUAGE_TAGS: &[(&str, &str)] = &[
    ("pl", "pl-PL"),
    ("en", "en-US"),
    ("de", "de-DE"),
    ("fr", "fr-FR"),
    ("ru", "ru-RU"),
    ("it", "it-IT"),
    ("es", "es-ES"),
    ("uk", "uk-UA"),
    ("cs", "cs-CZ"),
    ("sk", "sk-SK"),
    // Country codes commonly declared in place of a language.
    ("gb", "en-GB"),
    ("cz", "cs-CZ"),
];

// Country TLDs whose language code differs from the TLD itself.
const TLD_TAGS: &[(&str, &str)] = &[
    ("pl", "pl-PL"),
    ("de", "de-DE"),
    ("fr", "fr-FR"),
    ("ru", "ru-RU"),
    ("it", "it-IT"),
    ("es", "es-ES"),
    ("sk", "sk-SK"),
    ("us", "en-US"),
    ("gb", "en-GB"),
    ("uk", "en-GB"),
    ("ua", "uk-UA"),
    ("cz", "cs-CZ"),
];

fn lookup(table: &[(&str, &str)], key: &str) -> Option<String> {
    table
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, tag)| (*tag).to_owned())
}

fn is_alpha(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn normalize_language(declared: Option<&str>, source_url: &str) -> String {
    declared
        .and_then(normalize_declared)
        .or_else(|| infer_from_url(source_url))
        .unwrap_or_else(|| UNDETERMINED.to_owned())
}

fn normalize_declared(raw: &str) -> Option<String> {
    let lang = raw.trim().to_ascii_lowercase().replace('_', "-");
    if lang.is_empty() {
        return None;
    }

    let mut subtags = lang.split('-');
    let primary = subtags.next().filter(|p| is_alpha(p, 2, 3))?;
    let region = subtags.last().filter(|r| is_alpha(r, 2, 2));

    Some(match region {
        Some(region) => format!("{primary}-{}", region.to_ascii_uppercase()),
        None => lookup(LANGUAGE_TAGS, primary)
            .unwrap_or_else(|| format!("{primary}-{}", primary.to_ascii_uppercase())),
    })
}

fn infer_from_url(source_url: &str) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    let Some(Host::Domain(domain)) = url.host() else {
        return None;
    };
    let tld = domain.trim_end_matches('.').rsplit('.').next()?.to_ascii_lowercase();
    if IGNORED_TLDS.contains(&tld.as_str()) || !is_alpha(&tld, 2, 2) {
        return None;
    }
    Some(lookup(TLD_TAGS, &tld).unwrap_or_else(|| format!("{tld}-{}", tld.to_ascii_uppercase())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_use_mapping() {
        assert_eq!(normalize_language(Some("pl"), ""), "pl-PL");
        assert_eq!(normalize_language(Some(" EN "), ""), "en-US");
        assert_eq!(normalize_language(Some("uk"), ""), "uk-UA");
    }

    #[test]
    fn country_codes_declared_as_language() {
        assert_eq!(normalize_language(Some("gb"), ""), "en-GB");
        assert_eq!(normalize_language(Some("CZ"), ""), "cs-CZ");
    }

    #[test]
    fn regioned_tags_get_uppercase_region() {
        assert_eq!(normalize_language(Some("en-gb"), ""), "en-GB");
        assert_eq!(normalize_language(Some("pt_br"), ""), "pt-BR");
        assert_eq!(normalize_language(Some("de-DE"), ""), "de-DE");
    }

    #[test]
    fn unmapped_codes_are_doubled() {
        assert_eq!(normalize_language(Some("ja"), ""), "ja-JA");
    }

    #[test]
    fn declared_language_wins_over_tld() {
        assert_eq!(
            normalize_language(Some("en"), "https://www.tvn24.pl/najnowsze.xml"),
            "en-US"
        );
    }

    #[test]
    fn infers_from_country_tld() {
        assert_eq!(normalize_language(None, "https://antyweb.pl/feed"), "pl-PL");
        assert_eq!(
            normalize_language(Some("  "), "https://feeds.bbci.co.uk/news/world/rss.xml"),
            "en-GB"
        );
        assert_eq!(normalize_language(None, "https://www.chip.de/rss.xml"), "de-DE");
    }

    #[test]
    fn generic_tlds_and_ips_are_undetermined() {
        assert_eq!(normalize_language(None, "https://techcrunch.com/feed/"), UNDETERMINED);
        assert_eq!(normalize_language(None, "https://www.wired.org/feed"), UNDETERMINED);
        assert_eq!(normalize_language(None, "http://127.0.0.1:8080/feed"), UNDETERMINED);
        assert_eq!(normalize_language(None, "not a url"), UNDETERMINED);
    }

    #[test]
    fn garbage_declared_language_falls_back_to_url() {
        assert_eq!(normalize_language(Some("1234"), "https://boop.pl/rss"), "pl-PL");
    }
}
