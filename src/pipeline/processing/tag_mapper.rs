//! Mapping of free-text export tags onto the canonical tag vocabulary.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

/// The closed set of tag names a stored station can carry
pub const CANONICAL_TAGS: [&str; 48] = [
    "50s",
    "60s",
    "70s",
    "80s",
    "90s",
    "2000s",
    "2010s",
    "2020s",
    "alternative",
    "ambient",
    "blues",
    "chill",
    "classic",
    "country",
    "culture",
    "dance",
    "disco",
    "downtempo",
    "dubstep",
    "electronic",
    "entertainment",
    "folk",
    "funk",
    "groove",
    "hard rock",
    "hits",
    "house",
    "indie",
    "jazz",
    "kpop",
    "latin",
    "lounge",
    "metal",
    "news",
    "phonk",
    "pop",
    "progressive",
    "rap",
    "reggae",
    "religious",
    "rock",
    "schlager",
    "sleep",
    "soul",
    "sports",
    "storytelling",
    "techno",
    "trance",
];

// raw tag -> canonical tag
const TAG_ALIASES: &[(&str, &str)] = &[
    ("alt rock", "alternative"),
    ("alternative rock", "alternative"),
    ("grunge", "alternative"),
    ("ambient music", "ambient"),
    ("space", "ambient"),
    ("blues rock", "blues"),
    ("chillout", "chill"),
    ("chill out", "chill"),
    ("chillhop", "chill"),
    ("lofi", "chill"),
    ("lo-fi", "chill"),
    ("relax", "chill"),
    ("relaxing", "chill"),
    ("easy listening", "chill"),
    ("classical", "classic"),
    ("classical music", "classic"),
    ("klassik", "classic"),
    ("oldies", "classic"),
    ("classic hits", "classic"),
    ("country music", "country"),
    ("americana", "country"),
    ("bluegrass", "country"),
    ("kultur", "culture"),
    ("arts", "culture"),
    ("dance music", "dance"),
    ("eurodance", "dance"),
    ("italo disco", "disco"),
    ("disco music", "disco"),
    ("downbeat", "downtempo"),
    ("trip hop", "downtempo"),
    ("trip-hop", "downtempo"),
    ("electro", "electronic"),
    ("electronica", "electronic"),
    ("edm", "electronic"),
    ("electronic music", "electronic"),
    ("dnb", "electronic"),
    ("drum and bass", "electronic"),
    ("comedy", "entertainment"),
    ("talk show", "entertainment"),
    ("folk music", "folk"),
    ("folklore", "folk"),
    ("traditional", "folk"),
    ("funky", "funk"),
    ("hardrock", "hard rock"),
    ("hard-rock", "hard rock"),
    ("hit", "hits"),
    ("top 40", "hits"),
    ("top40", "hits"),
    ("charts", "hits"),
    ("top hits", "hits"),
    ("deep house", "house"),
    ("tech house", "house"),
    ("indie rock", "indie"),
    ("indie pop", "indie"),
    ("smooth jazz", "jazz"),
    ("jazz music", "jazz"),
    ("k-pop", "kpop"),
    ("latino", "latin"),
    ("latina", "latin"),
    ("salsa", "latin"),
    ("reggaeton", "latin"),
    ("bachata", "latin"),
    ("cumbia", "latin"),
    ("heavy metal", "metal"),
    ("death metal", "metal"),
    ("black metal", "metal"),
    ("talk", "news"),
    ("news talk", "news"),
    ("information", "news"),
    ("nachrichten", "news"),
    ("pop music", "pop"),
    ("progressive rock", "progressive"),
    ("progressive house", "progressive"),
    ("prog", "progressive"),
    ("hip hop", "rap"),
    ("hip-hop", "rap"),
    ("hiphop", "rap"),
    ("trap", "rap"),
    ("dancehall", "reggae"),
    ("ska", "reggae"),
    ("dub", "reggae"),
    ("christian", "religious"),
    ("christian music", "religious"),
    ("gospel", "religious"),
    ("catholic", "religious"),
    ("religion", "religious"),
    ("islamic", "religious"),
    ("quran", "religious"),
    ("classic rock", "rock"),
    ("rock n roll", "rock"),
    ("rock'n'roll", "rock"),
    ("punk", "rock"),
    ("punk rock", "rock"),
    ("volksmusik", "schlager"),
    ("deutsch schlager", "schlager"),
    ("sleep music", "sleep"),
    ("r&b", "soul"),
    ("rnb", "soul"),
    ("motown", "soul"),
    ("soul music", "soul"),
    ("sport", "sports"),
    ("football", "sports"),
    ("soccer", "sports"),
    ("audiobook", "storytelling"),
    ("audiobooks", "storytelling"),
    ("radio drama", "storytelling"),
    ("hörspiel", "storytelling"),
    ("minimal techno", "techno"),
    ("techno music", "techno"),
    ("psytrance", "trance"),
    ("trance music", "trance"),
];

static ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| TAG_ALIASES.iter().copied().collect());

// "1980s", "80's", "80er", "1990"
static DECADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(19|20)?([0-9])0('?s|er)?$").expect("decade pattern is valid")
});

/// Maps a raw tag to at most one canonical tag.
///
/// Implementations must be deterministic and total: unknown input maps to
/// `None`, never to an error, and every `Some` is a member of [`CANONICAL_TAGS`].
pub trait TagMapper: Send + Sync {
    fn map(&self, raw: &str) -> Option<String>;

    /// Map a batch of raw tags, collapsing duplicates in the output.
    fn map_many(&self, raws: &[String]) -> BTreeSet<String> {
        raws.iter().filter_map(|raw| self.map(raw)).collect()
    }
}

/// Vocabulary lookup, then the alias table, then decade spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularyTagMapper;

impl VocabularyTagMapper {
    pub fn new() -> Self {
        Self
    }
}

impl TagMapper for VocabularyTagMapper {
    fn map(&self, raw: &str) -> Option<String> {
        let tag = raw.trim().to_lowercase();
        if tag.is_empty() {
            return None;
        }
        if is_canonical(&tag) {
            return Some(tag);
        }
        if let Some(canonical) = ALIASES.get(tag.as_str()) {
            return Some((*canonical).to_string());
        }
        map_decade(&tag)
    }
}

pub fn is_canonical(tag: &str) -> bool {
    CANONICAL_TAGS.contains(&tag)
}

fn map_decade(tag: &str) -> Option<String> {
    let caps = DECADE.captures(tag)?;
    let century = caps.get(1).map(|m| m.as_str());
    let digit = caps.get(2)?.as_str();
    // "80" on its own is too ambiguous to read as a decade
    if century.is_none() && caps.get(3).is_none() {
        return None;
    }
    let decade = match (century, digit) {
        (Some("19") | None, "5" | "6" | "7" | "8" | "9") => format!("{digit}0s"),
        (Some("20"), "0" | "1" | "2") | (None, "0" | "1") => format!("20{digit}0s"),
        // "20s" and "20er" name the 1920s
        _ => return None,
    };
    is_canonical(&decade).then_some(decade)
}
