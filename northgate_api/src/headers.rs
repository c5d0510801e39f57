//! Browser-like header profiles.
//!
//! Each profile is built fresh for every request and never mutated after
//! construction, so one call site cannot leak headers into another.

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,\
image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const ACCEPT_ENCODING: &str = "gzip, deflate";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

/// An ordered, immutable set of request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeaders {
    pairs: Vec<(&'static str, String)>,
}

impl RequestHeaders {
    /// Builds a header set from explicit name/value pairs.
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    /// Headers for a plain page load, as a browser arriving from `referer`.
    pub fn browser(referer: &str) -> Self {
        Self::from_pairs([
            ("accept", ACCEPT.to_string()),
            ("accept-encoding", ACCEPT_ENCODING.to_string()),
            ("accept-language", ACCEPT_LANGUAGE.to_string()),
            ("referer", referer.to_string()),
            ("user-agent", USER_AGENT.to_string()),
        ])
    }

    /// Headers for a WebForms postback submitted from `referer` on `origin`.
    pub fn postback(origin: &str, referer: &str) -> Self {
        Self::from_pairs([
            ("accept", ACCEPT.to_string()),
            ("accept-encoding", ACCEPT_ENCODING.to_string()),
            ("accept-language", ACCEPT_LANGUAGE.to_string()),
            ("origin", origin.to_string()),
            ("referer", referer.to_string()),
            ("cache-control", "max-age=0".to_string()),
            (
                "content-type",
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("user-agent", USER_AGENT.to_string()),
        ])
    }

    /// Looks up a header value by (lowercase) name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
