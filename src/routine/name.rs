//! # Default routine names.
//!
//! A routine spawned without an explicit name gets a short, human-readable tag derived from
//! its call site: the SHA-256 of `file:line:column` is folded into two bytes, and each byte
//! picks a word from a 256-word list (`"texas-uncle"`, `"moon-robin"`, ...).
//!
//! The same call site always yields the same name, so log lines of repeated spawns from one
//! place group together.

use std::panic::Location;

use sha2::{Digest, Sha256};

/// Number of words in a generated name.
const NAME_WORDS: usize = 2;
/// Separator between generated words.
const NAME_SEPARATOR: &str = "-";

#[rustfmt::skip]
const WORDLIST: [&str; 256] = [
    "ack", "alabama", "alanine", "alaska", "alpha", "angel", "apart", "april",
    "arizona", "arkansas", "artist", "asparagus", "aspen", "august", "autumn", "avocado",
    "bacon", "bakerloo", "batman", "beer", "berlin", "beryllium", "black", "blossom",
    "blue", "bluebird", "bravo", "bulldog", "burger", "butter", "california", "carbon",
    "cardinal", "carolina", "carpet", "cat", "ceiling", "charlie", "chicken", "coffee",
    "cola", "cold", "colorado", "comet", "connecticut", "crazy", "cup", "dakota",
    "december", "delaware", "delta", "diet", "don", "double", "early", "earth",
    "east", "echo", "edward", "eight", "eighteen", "eleven", "emma", "enemy",
    "equal", "failed", "fanta", "fifteen", "fillet", "finch", "fish", "five",
    "fix", "floor", "florida", "football", "four", "fourteen", "foxtrot", "freddie",
    "friend", "fruit", "gee", "georgia", "glucose", "golf", "green", "grey",
    "hamper", "happy", "harry", "hawaii", "helium", "high", "hot", "hotel",
    "hydrogen", "idaho", "illinois", "india", "indigo", "ink", "iowa", "island",
    "item", "jersey", "jig", "johnny", "juliet", "july", "jupiter", "kansas",
    "kentucky", "kilo", "king", "kitten", "lactose", "lake", "lamp", "lemon",
    "leopard", "lima", "lion", "lithium", "london", "louisiana", "low", "magazine",
    "magnesium", "maine", "mango", "march", "mars", "maryland", "massachusetts", "may",
    "mexico", "michigan", "mike", "minnesota", "mirror", "mississippi", "missouri", "mobile",
    "mockingbird", "monkey", "montana", "moon", "mountain", "muppet", "music", "nebraska",
    "neptune", "network", "nevada", "nine", "nineteen", "nitrogen", "north", "november",
    "nuts", "october", "ohio", "oklahoma", "one", "orange", "oranges", "oregon",
    "oscar", "oven", "oxygen", "papa", "paris", "pasta", "pennsylvania", "pip",
    "pizza", "pluto", "potato", "princess", "purple", "quebec", "queen", "quiet",
    "red", "river", "robert", "robin", "romeo", "rugby", "sad", "salami",
    "saturn", "september", "seven", "seventeen", "shade", "sierra", "single", "sink",
    "six", "sixteen", "skylark", "snake", "social", "sodium", "solar", "south",
    "spaghetti", "speaker", "spring", "stairway", "steak", "stream", "summer", "sweet",
    "table", "tango", "ten", "tennessee", "tennis", "texas", "thirteen", "three",
    "timing", "triple", "twelve", "twenty", "two", "uncle", "undress", "uniform",
    "uranus", "utah", "vegan", "venus", "vermont", "victor", "video", "violet",
    "virginia", "washington", "west", "whiskey", "white", "william", "winner", "winter",
    "wisconsin", "wolfram", "wyoming", "xray", "yankee", "yellow", "zebra", "zulu",
];

/// Generates the default name for the given call site.
pub(crate) fn for_location(location: &Location<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}:{}:{}",
        location.file(),
        location.line(),
        location.column()
    ));
    humanize(&hasher.finalize(), NAME_WORDS, NAME_SEPARATOR)
}

/// Folds `digest` into `words` bytes (XOR per segment) and maps each to a word.
///
/// The last segment absorbs the remainder when the digest length is not divisible by `words`.
fn humanize(digest: &[u8], words: usize, separator: &str) -> String {
    let words = words.clamp(1, digest.len().max(1));
    let segment = digest.len() / words;

    (0..words)
        .map(|i| {
            let start = i * segment;
            let end = if i + 1 == words { digest.len() } else { start + segment };
            let byte = digest[start..end].iter().fold(0u8, |acc, b| acc ^ b);
            WORDLIST[usize::from(byte)]
        })
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn here() -> &'static Location<'static> {
        Location::caller()
    }

    #[test]
    fn test_same_site_same_name() {
        let loc = here();
        assert_eq!(for_location(loc), for_location(loc));
    }

    #[test]
    fn test_name_shape() {
        let name = for_location(here());
        let parts: Vec<&str> = name.split(NAME_SEPARATOR).collect();
        assert_eq!(parts.len(), NAME_WORDS);
        assert!(parts.iter().all(|p| WORDLIST.contains(p)));
    }

    #[test]
    fn test_humanize_xors_segments() {
        // [1 ^ 2, 4 ^ 8 ^ 16]
        let digest = [1u8, 2, 4, 8, 16];
        assert_eq!(humanize(&digest, 2, "-"), format!("{}-{}", WORDLIST[3], WORDLIST[28]));
        assert_eq!(humanize(&[0u8, 255], 2, "+"), "ack+zulu");
    }
}
