//! Built-in list of known-good feeds used to seed an empty store.

use std::collections::HashSet;

pub const CURATED_FEEDS: &[&str] = &[
    // Germany
    "https://newsfeed.zeit.de/autoren/S/Helmut_Schmidt/index.xml",
    "https://www.spiegel.de/international/index.rss",
    "https://www.chip.de/rss/chip_komplett.xml",
    // Hong Kong
    "https://www.scmp.com/rss/91/feed",
    // Poland
    "https://businessinsider.com.pl/.feed",
    "https://www.polsatnews.pl/rss/biznes.xml",
    "https://boop.pl/rss",
    "https://gry.interia.pl/feed",
    "https://naekranie.pl/feed/all.xml",
    "https://planetagracza.pl/feed/",
    "https://www.eurogamer.pl/feed",
    "https://www.gry-online.pl/rss/news.xml",
    "https://policja.pl/dokumenty/rss/1-rss-1.rss",
    "https://rss.nbp.pl/kursy/TabelaA.xml",
    "https://stat.gov.pl/rss/pl/5438/rss.xml",
    "https://www.sejm.gov.pl/rss.nsf/feed.xsp?symbol=NEWS",
    "https://ipn.gov.pl/dokumenty/rss/1-rss-48.rss",
    "https://defence24.pl/_rss",
    "https://android.com.pl/feed/",
    "https://antyweb.pl/feed",
    "https://bezprawnik.pl/feed/",
    "https://ciekawostkihistoryczne.pl/feed/",
    "https://fakty.interia.pl/feed",
    "https://kurierlubelski.pl/rss",
    "https://lowcygier.pl/feed/",
    "https://lowcygier.pl/polecane/feed/",
    "https://lowcygier.pl/tylko-promocje/feed/",
    "https://natemat.pl/rss/wszystkie",
    "https://next.gazeta.pl/pub/next/rssnext.htm",
    "https://pap-mediaroom.pl/rss.xml",
    "https://radiotvrepublika.pl/feed/",
    "https://rss.gazeta.pl/pub/rss/gazetawyborcza_kraj.xml",
    "https://rss.gazeta.pl/pub/rss/gazetawyborcza_swiat.xml",
    "https://tygodnik.interia.pl/feed",
    "https://wiadomosci.gazeta.pl/pub/rss/wiadomosci.xml",
    "https://www.dziennikwschodni.pl/rss",
    "https://www.infor.pl/.feed",
    "https://www.polsatnews.pl/rss/polska.xml",
    "https://www.polsatnews.pl/rss/swiat.xml",
    "https://www.polsatnews.pl/rss/wszystkie.xml",
    "https://www.pudelek.pl/rss2.xml",
    "https://www.purepc.pl/rss_all.xml",
    "https://www.rmf24.pl/ekonomia/feed",
    "https://www.rmf24.pl/fakty/feed",
    "https://www.rmf24.pl/fakty/polska/feed",
    "https://www.rmf24.pl/fakty/swiat/feed",
    "https://www.rmf24.pl/nauka/feed",
    "https://www.tvn24.pl/najnowsze.xml",
    "https://www.tvn24.pl/najwazniejsze.xml",
    "https://www.tvn24.pl/wiadomosci-z-kraju,3.xml",
    "https://ithardware.pl/feed",
    "https://spidersweb.pl/api/post/feed/feed-gn",
    "https://www.benchmark.pl/rss/aktualnosci-pliki.xml",
    "https://www.tvn24.pl/internet-hi-tech-media,40.xml",
    // Russia
    "https://www.rogerebert.com/feed",
    "https://rt.com/rss/",
    "https://www.themoscowtimes.com/rss/news",
    // Uk
    "https://feeds.bbci.co.uk/news/world/rss.xml",
    "https://www.theguardian.com/world/rss",
    // Usa
    "https://feeds.npr.org/1004/rss.xml",
    "https://feeds.npr.org/1008/rss.xml",
    "https://feeds.npr.org/1045/rss.xml",
    "https://moxie.foxnews.com/google-publisher/latest.xml",
    "https://www.nytimes.com/svc/collections/v1/publish/https://www.nytimes.com/section/world/rss.xml",
    "http://rss.cnn.com/rss/edition_sport.rss",
    // Uganda
    "https://www.watchdoguganda.com/feed",
    // World
    "https://www.fxstreet.com/rss",
    "https://www.artnews.com/feed/",
    "https://www.rollingstone.com/feed/",
    "https://www.eurogamer.net/feed",
    "https://feeds.feedburner.com/BeMyTravelMuse",
    "https://feeds.feedburner.com/Theblondeabroad/ScWo",
    "https://feeds.feedburner.com/craftbeercom",
    "https://feeds.feedburner.com/media2",
    "https://feeds.feedburner.com/sekurak_full",
    "https://feeds.propublica.org/propublica/main",
    "https://theconversation.com/us/articles.atom",
    "https://www.babypips.com/feed.rss",
    "https://www.theverge.com/rss/index.xml",
    "https://www.vox.com/rss/index.xml",
    "https://www.winespectator.com/rss/rss?t=news",
    "https://feeds.arstechnica.com/arstechnica/index/",
    "https://spectrum.ieee.org/rss/blog/tech-talk/fulltext",
    "https://tealtech.com/feed/",
    "https://techcrunch.com/feed/",
    "https://www.wired.com/feed",
];

/// The curated list with duplicates removed, order preserved.
pub fn curated_feed_links() -> Vec<String> {
    let mut seen = HashSet::new();
    CURATED_FEEDS
        .iter()
        .filter(|url| seen.insert(**url))
        .map(|url| (*url).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::validate_feed_url;

    #[test]
    fn curated_links_are_unique_and_valid() {
        let links = curated_feed_links();
        assert!(links.len() > 50);
        let unique: HashSet<_> = links.iter().collect();
        assert_eq!(unique.len(), links.len());
        for link in &links {
            assert!(validate_feed_url(link).is_ok(), "{link}");
        }
    }
}
