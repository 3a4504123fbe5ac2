//! Text cleaning — symbol stripping, whitespace collapse, stopword removal.
//!
//! The cleaned form is what the categorizer and gazetteer match against and
//! the key deduplication compares on, so it has to be stable:
//! `clean(clean(x)) == clean(x)` for every input.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use url::Url;

use crate::error::Result;

static BUNDLED_STOPWORDS: &str = include_str!("../resources/stopwords_vi.txt");

// Everything outside letters, marks, digits, punctuation and separators,
// plus emoji variation selectors and the combining keycap.
static NON_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{L}\p{M}\p{N}\p{P}\p{Z}]|[\x{FE00}-\x{FE0F}\x{20E3}]").unwrap()
});

/// Replace emoji, pictographs and other non-text symbols with a space.
pub fn strip_symbols(text: &str) -> String {
    NON_TEXT.replace_all(text, " ").into_owned()
}

/// Comparison key for a single token: lowercase letters and digits only,
/// so `"Và,"` and `"và"` compare equal.
fn token_key(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_url(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(token).is_ok()
    } else if lower.starts_with("www.") {
        Url::parse(&format!("http://{token}")).is_ok()
    } else {
        false
    }
}

// ── Stopwords ───────────────────────────────────────────────────────

/// A set of stopword phrases, each one or more whitespace-separated tokens.
///
/// Phrases are stored lowercased; matching is on whole tokens, never on
/// substrings of a longer word.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    phrases: HashSet<String>,
    longest: usize,
}

impl Stopwords {
    /// The Vietnamese/English list shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_lines(BUNDLED_STOPWORDS.lines())
    }

    /// Build from one phrase per item. Blank items are skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stopwords = Self::default();
        for line in lines {
            stopwords.insert(line.as_ref());
        }
        stopwords
    }

    /// Read one phrase per line.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut stopwords = Self::default();
        for line in BufReader::new(reader).lines() {
            stopwords.insert(&line?);
        }
        Ok(stopwords)
    }

    /// Load a stopword file (UTF-8, one phrase per line).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stopwords = Self::from_reader(File::open(path)?)?;
        info!(path = %path.display(), count = stopwords.len(), "Loaded stopwords");
        Ok(stopwords)
    }

    fn insert(&mut self, phrase: &str) {
        let keys: Vec<String> = phrase
            .split_whitespace()
            .map(token_key)
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return;
        }
        self.longest = self.longest.max(keys.len());
        self.phrases.insert(keys.join(" "));
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Whether `phrase` (compared by token keys) is a stopword entry.
    pub fn contains(&self, phrase: &str) -> bool {
        let key = phrase
            .split_whitespace()
            .map(token_key)
            .collect::<Vec<String>>()
            .join(" ");
        self.phrases.contains(&key)
    }

    /// Number of tokens at the head of `keys` covered by the longest matching
    /// phrase, if any.
    fn match_len(&self, keys: &[String]) -> Option<usize> {
        if keys.first().map_or(true, |k| k.is_empty()) {
            return None;
        }
        let max = self.longest.min(keys.len());
        (1..=max)
            .rev()
            .find(|&n| self.phrases.contains(&keys[..n].join(" ")))
    }

    /// One left-to-right pass removing the longest phrase match at each position.
    fn strip<'a>(&self, tokens: &[&'a str]) -> Vec<&'a str> {
        let keys: Vec<String> = tokens.iter().map(|t| token_key(t)).collect();
        let mut kept = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            match self.match_len(&keys[i..]) {
                Some(n) => i += n,
                None => {
                    kept.push(tokens[i]);
                    i += 1;
                }
            }
        }
        kept
    }
}

// ── Cleaner ─────────────────────────────────────────────────────────

/// Cleans raw scraped text into the canonical form used downstream.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    stopwords: Stopwords,
    strip_urls: bool,
}

impl Default for TextCleaner {
    fn default() -> Self {
        Self::new(Stopwords::bundled())
    }
}

impl TextCleaner {
    pub fn new(stopwords: Stopwords) -> Self {
        Self {
            stopwords,
            strip_urls: false,
        }
    }

    /// Also drop tokens that are absolute http(s) or `www.` URLs.
    pub fn with_url_stripping(mut self, strip_urls: bool) -> Self {
        self.strip_urls = strip_urls;
        self
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Clean `text`. `None` and whitespace-only input yield `""`.
    pub fn clean<'a>(&self, text: impl Into<Option<&'a str>>) -> String {
        let text = match text.into() {
            Some(t) if !t.trim().is_empty() => t,
            _ => return String::new(),
        };

        let stripped = strip_symbols(text);
        let mut tokens: Vec<&str> = stripped
            .split_whitespace()
            .filter(|t| !(self.strip_urls && is_url(t)))
            .collect();

        // Removing a phrase can make two neighbours form a new one.
        loop {
            let next = self.stopwords.strip(&tokens);
            if next.len() == tokens.len() {
                break;
            }
            tokens = next;
        }

        tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_emoji_and_spaces() {
        let cleaner = TextCleaner::default();
        let result = cleaner.clean("Bão Yagi 😱 !!!     Ngập lụt khắp nơi...  ");
        assert!(!result.contains('😱'));
        assert!(!result.contains("  "));
        assert!(result.contains("Bão Yagi"));
        assert!(result.ends_with("nơi..."));
    }

    #[test]
    fn test_clean_null_and_blank() {
        let cleaner = TextCleaner::default();
        assert_eq!(cleaner.clean(None), "");
        assert_eq!(cleaner.clean("   "), "");
        assert_eq!(cleaner.clean(""), "");
    }

    #[test]
    fn test_clean_removes_stopwords() {
        let cleaner = TextCleaner::default();
        let result = cleaner.clean("Bão Yagi và lũ lụt là những thảm họa của thiên nhiên");
        assert_eq!(result, "Bão Yagi lũ lụt thảm họa thiên nhiên");
    }

    #[test]
    fn test_stopwords_whole_tokens_only() {
        let cleaner = TextCleaner::new(Stopwords::from_lines(["an"]));
        // "an" inside "Giang" or "Thanh" is untouched
        assert_eq!(cleaner.clean("Thanh Hóa an toàn"), "Thanh Hóa toàn");
    }

    #[test]
    fn test_stopwords_ignore_case_and_punctuation() {
        let cleaner = TextCleaner::new(Stopwords::from_lines(["và"]));
        assert_eq!(cleaner.clean("Mưa lớn, Và gió mạnh và, lạnh"), "Mưa lớn, gió mạnh lạnh");
    }

    #[test]
    fn test_multi_word_phrase() {
        let cleaner = TextCleaner::new(Stopwords::from_lines(["tuy nhiên", "tuy"]));
        assert_eq!(cleaner.clean("Tuy nhiên nước rút"), "nước rút");
        assert_eq!(cleaner.clean("tuy mưa"), "mưa");
    }

    #[test]
    fn test_removal_reaches_fixpoint() {
        let cleaner = TextCleaner::new(Stopwords::from_lines(["bởi vì", "của"]));
        let once = cleaner.clean("ngập bởi của vì mưa");
        assert_eq!(once, "ngập mưa");
        assert_eq!(cleaner.clean(once.as_str()), once);
    }

    #[test]
    fn test_idempotent() {
        let cleaner = TextCleaner::default().with_url_stripping(true);
        let samples = [
            "Bão Yagi 😱 !!!     Ngập lụt khắp nơi...  ",
            "  và   là của  ",
            "😱https://example.com/a cứu trợ 🙏🏻 ở Hà Nội",
            "Cây đổ ở Hà Nội ❤️❤️",
            "Ủng hộ 100.000đ cho bà con #Yagi",
        ];
        for s in samples {
            let once = cleaner.clean(s);
            assert_eq!(cleaner.clean(once.as_str()), once, "input: {s}");
        }
    }

    #[test]
    fn test_url_stripping() {
        let cleaner = TextCleaner::new(Stopwords::default()).with_url_stripping(true);
        assert_eq!(
            cleaner.clean("Xem thêm https://vnexpress.net/bao-yagi-123.html tại đây"),
            "Xem thêm tại đây"
        );
        assert_eq!(cleaner.clean("link www.dantri.com.vn nhé"), "link nhé");

        let keep = TextCleaner::new(Stopwords::default());
        assert!(keep.clean("https://vnexpress.net").contains("vnexpress"));
    }

    #[test]
    fn test_diacritics_preserved() {
        let cleaner = TextCleaner::new(Stopwords::default());
        assert_eq!(cleaner.clean("Đắk Lắk, Thừa Thiên Huế!"), "Đắk Lắk, Thừa Thiên Huế!");
    }

    #[test]
    fn test_stopwords_from_reader() {
        let data = "và\n\n  Là  \nbởi vì\n";
        let stopwords = Stopwords::from_reader(data.as_bytes()).unwrap();
        assert_eq!(stopwords.len(), 3);
        assert!(stopwords.contains("là"));
        assert!(stopwords.contains("Bởi  Vì"));
        assert!(!stopwords.contains("bởi"));
    }

    #[test]
    fn test_bundled_list_loaded() {
        assert!(Stopwords::bundled().contains("những"));
    }
}
