//! Keyword and domain lists consulted by the validators and tier calculator.
//!
//! All entries are lowercase; callers lowercase their input before matching.

/// Domains whose content is generally reliable.
///
/// Entries starting with `.` match a host suffix, entries without a dot (or
/// ending in one) match anywhere in the host, others match the domain and
/// its subdomains.
pub const TRUSTED_DOMAINS: &[&str] = &[
    ".gov",
    ".gov.uk",
    ".gc.ca",
    ".gov.au",
    ".mil",
    ".edu",
    "wikipedia.org",
    "wikimedia.org",
    "wikidata.org",
    "openstreetmap.org",
    "nrpa.org",
    "tripadvisor.com",
    "yelp.com",
    "maps.google.com",
    "foursquare.com",
    "playgroundbuddy.com",
    "kaboom.org",
    "parks.",
    "parksandrec",
    "cityof",
];

/// Domains that rarely describe a public playground accurately.
pub const SUSPICIOUS_DOMAINS: &[&str] = &[
    "zillow.com",
    "realtor.com",
    "redfin.com",
    "trulia.com",
    "apartments.com",
    "homes.com",
    "airbnb.com",
    "booking.com",
    "hotels.com",
    "expedia.com",
    "shutterstock.com",
    "gettyimages.com",
    "istockphoto.com",
    "alamy.com",
    "dreamstime.com",
    "123rf.com",
    "depositphotos.com",
    "pinterest.com",
    "instagram.com",
    "facebook.com",
    "tiktok.com",
    "twitter.com",
    "x.com",
    "reddit.com",
];

/// URL fragments suggesting a page about parks and play areas.
pub const URL_KEYWORDS: &[&str] = &["playground", "park", "recreation", "parks-and-rec", "play-area", "tot-lot"];

/// Equipment and facilities specific to playgrounds.
pub const CORE_KEYWORDS: &[&str] = &[
    "swing",
    "slide",
    "climbing structure",
    "climbing wall",
    "climber",
    "sandbox",
    "sand pit",
    "sandpit",
    "jungle gym",
    "monkey bars",
    "seesaw",
    "teeter",
    "merry-go-round",
    "spring rider",
    "splash pad",
    "spray ground",
    "zip line",
    "play structure",
    "tot lot",
];

/// Contextual words common in descriptions of family amenities.
pub const SECONDARY_KEYWORDS: &[&str] = &[
    "playground",
    "children",
    "kids",
    "toddler",
    "family",
    "families",
    "park",
    "accessible",
    "inclusive",
    "shade",
    "shaded",
    "fenced",
    "bench",
    "picnic",
    "restroom",
    "rubber",
    "mulch",
    "ages",
];

/// Terms that suggest the content is about something other than a playground.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "real estate",
    "for sale",
    "for rent",
    "square feet",
    "sq ft",
    "bedroom",
    "mortgage",
    "listing",
    "hotel",
    "resort",
    "check-in",
    "room rate",
    "vacation rental",
];

/// Words that soften a location mention into a comparison.
pub const HEDGE_WORDS: &[&str] = &["near", "like", "similar"];

/// Major cities whose mention usually means the content describes another place.
pub const MAJOR_CITIES: &[&str] = &[
    "new york",
    "los angeles",
    "chicago",
    "houston",
    "phoenix",
    "philadelphia",
    "san antonio",
    "san diego",
    "dallas",
    "san jose",
    "austin",
    "jacksonville",
    "san francisco",
    "columbus",
    "indianapolis",
    "seattle",
    "denver",
    "washington",
    "boston",
    "nashville",
    "detroit",
    "portland",
    "las vegas",
    "memphis",
    "louisville",
    "baltimore",
    "milwaukee",
    "albuquerque",
    "atlanta",
    "miami",
    "minneapolis",
    "new orleans",
    "london",
    "paris",
    "toronto",
    "sydney",
];

pub const STATES: &[&str] = &[
    "alabama",
    "alaska",
    "arizona",
    "arkansas",
    "california",
    "colorado",
    "connecticut",
    "delaware",
    "florida",
    "georgia",
    "hawaii",
    "idaho",
    "illinois",
    "indiana",
    "iowa",
    "kansas",
    "kentucky",
    "louisiana",
    "maine",
    "maryland",
    "massachusetts",
    "michigan",
    "minnesota",
    "mississippi",
    "missouri",
    "montana",
    "nebraska",
    "nevada",
    "new hampshire",
    "new jersey",
    "new mexico",
    "north carolina",
    "north dakota",
    "ohio",
    "oklahoma",
    "oregon",
    "pennsylvania",
    "rhode island",
    "south carolina",
    "south dakota",
    "tennessee",
    "texas",
    "utah",
    "vermont",
    "virginia",
    "west virginia",
    "wisconsin",
    "wyoming",
];

/// Accessibility terms counted toward a richer tier.
pub const ACCESSIBILITY_KEYWORDS: &[&str] = &[
    "wheelchair",
    "ramp",
    "ada",
    "inclusive",
    "accessible",
    "sensory",
    "transfer station",
    "rubber surfacing",
    "poured-in-place",
    "unitary surface",
    "braille",
];

/// Wording signalling an exceptional, destination-level playground.
pub const AWARD_KEYWORDS: &[&str] = &[
    "award",
    "award-winning",
    "best playground",
    "top-rated",
    "nationally recognized",
    "destination playground",
    "renowned",
];

/// Wording signalling a distinctive or themed playground.
pub const DISTINCT_KEYWORDS: &[&str] = &[
    "unique",
    "themed",
    "one-of-a-kind",
    "pirate ship",
    "castle",
    "dinosaur",
    "treehouse",
    "water play",
    "splash pad",
    "zip line",
    "musical",
    "nature play",
];

/// Whether `host` matches a domain list entry. See [`TRUSTED_DOMAINS`].
pub fn host_matches(host: &str, entry: &str) -> bool {
    if entry.starts_with('.') {
        host.ends_with(entry)
    } else if !entry.contains('.') || entry.ends_with('.') {
        host.contains(entry)
    } else {
        host == entry || host.strip_suffix(entry).is_some_and(|sub| sub.ends_with('.'))
    }
}

/// Count how many of `keywords` occur in `haystack` as whole words.
///
/// `haystack` must already be lowercase.
pub fn count_matches(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|keyword| contains_word(haystack, keyword)).count()
}

/// Whole-word containment. Trailing plural `s`/`es` is tolerated.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(offset) = haystack[from..].find(word) {
        let start = from + offset;
        let end = start + word.len();
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let rest = &haystack[end..];
        let after = rest
            .strip_prefix("es")
            .filter(|r| r.chars().next().is_none_or(|c| !c.is_alphanumeric()))
            .or_else(|| rest.strip_prefix('s'))
            .unwrap_or(rest);
        let after_ok = after.chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}
