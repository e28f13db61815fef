//! City directory: canonical names, aliases, and airport codes.
//!
//! Alias order inside each entry does not matter; matches are reported by
//! position in the message so "delhi to mumbai" yields delhi first.

/// (canonical name, IATA code, recognized aliases)
const CITIES: &[(&str, &str, &[&str])] = &[
    ("mumbai", "BOM", &["mumbai", "bombay", "bom"]),
    ("delhi", "DEL", &["delhi", "new delhi", "del", "ncr"]),
    ("bangalore", "BLR", &["bangalore", "bengaluru", "blr"]),
    ("chennai", "MAA", &["chennai", "madras", "maa"]),
    ("hyderabad", "HYD", &["hyderabad", "hyd"]),
    ("kolkata", "CCU", &["kolkata", "calcutta", "ccu"]),
    ("ahmedabad", "AMD", &["ahmedabad", "amd"]),
    ("pune", "PNQ", &["pune", "pnq"]),
    ("kochi", "COK", &["kochi", "cochin", "cok"]),
    ("goa", "GOI", &["goa", "goi", "panaji"]),
    ("jaipur", "JAI", &["jaipur", "pink city"]),
    ("lucknow", "LKO", &["lucknow", "lko"]),
    ("guwahati", "GAU", &["guwahati", "gau"]),
    ("chandigarh", "IXC", &["chandigarh", "ixc"]),
    ("indore", "IDR", &["indore", "idr"]),
    ("bhopal", "BHO", &["bhopal", "bho"]),
    ("coimbatore", "CJB", &["coimbatore", "covai", "cjb"]),
    ("nagpur", "NAG", &["nagpur", "nag"]),
    ("amritsar", "ATQ", &["amritsar", "atq"]),
    ("varanasi", "VNS", &["varanasi", "banaras", "kashi"]),
    ("udaipur", "UDR", &["udaipur", "udr"]),
    ("agra", "AGR", &["agra", "taj city"]),
    ("srinagar", "SXR", &["srinagar", "kashmir"]),
    ("dubai", "DXB", &["dubai", "dxb"]),
    ("singapore", "SIN", &["singapore", "sin"]),
    ("bangkok", "BKK", &["bangkok", "bkk"]),
    ("london", "LHR", &["london", "lhr"]),
    ("new york", "JFK", &["new york", "nyc", "jfk"]),
    ("paris", "CDG", &["paris", "cdg"]),
    ("tokyo", "NRT", &["tokyo", "nrt"]),
];

/// Fraction of edits shared with a known alias before we offer it as a
/// correction.
const SUGGESTION_CUTOFF: f64 = 0.6;

const MAX_SUGGESTIONS: usize = 3;

#[derive(Clone, Debug, Default)]
pub struct CityDirectory;

impl CityDirectory {
    pub fn new() -> Self {
        Self
    }

    /// Canonical cities mentioned in the text, ordered by where their first
    /// alias match appears. Each city is reported once.
    pub fn find_in_text(&self, text_lower: &str) -> Vec<&'static str> {
        let mut hits: Vec<(usize, &'static str)> = Vec::new();
        for (canonical, _, aliases) in CITIES {
            let earliest = aliases.iter().filter_map(|alias| text_lower.find(alias)).min();
            if let Some(position) = earliest {
                hits.push((position, canonical));
            }
        }
        hits.sort_by_key(|(position, _)| *position);
        hits.into_iter().map(|(_, canonical)| canonical).collect()
    }

    pub fn airport_code(&self, city: &str) -> Option<&'static str> {
        let lowered = city.trim().to_lowercase();
        CITIES
            .iter()
            .find(|(canonical, _, aliases)| {
                *canonical == lowered || aliases.contains(&lowered.as_str())
            })
            .map(|(_, code, _)| *code)
    }

    pub fn is_known(&self, city: &str) -> bool {
        self.airport_code(city).is_some()
    }

    /// Close canonical names for a misspelled city, best match first.
    pub fn suggest_similar(&self, input: &str) -> Vec<&'static str> {
        let lowered = input.trim().to_lowercase();
        if lowered.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &'static str)> = CITIES
            .iter()
            .filter_map(|(canonical, _, aliases)| {
                let best = aliases
                    .iter()
                    .map(|alias| similarity(&lowered, alias))
                    .fold(0.0, f64::max);
                (best >= SUGGESTION_CUTOFF).then_some((best, *canonical))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(MAX_SUGGESTIONS);
        scored.into_iter().map(|(_, canonical)| canonical).collect()
    }
}

/// Normalized edit-distance similarity in `[0.0, 1.0]`.
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::{similarity, CityDirectory};

    #[test]
    fn finds_cities_in_message_order() {
        let directory = CityDirectory::new();
        assert_eq!(
            directory.find_in_text("flights delhi to mumbai tomorrow"),
            vec!["delhi", "mumbai"]
        );
        assert_eq!(
            directory.find_in_text("from bombay to bengaluru"),
            vec!["mumbai", "bangalore"]
        );
    }

    #[test]
    fn each_city_is_reported_once() {
        let directory = CityDirectory::new();
        assert_eq!(directory.find_in_text("delhi delhi delhi"), vec!["delhi"]);
    }

    #[test]
    fn airport_codes_resolve_for_canonicals_and_aliases() {
        let directory = CityDirectory::new();
        assert_eq!(directory.airport_code("mumbai"), Some("BOM"));
        assert_eq!(directory.airport_code("Calcutta"), Some("CCU"));
        assert_eq!(directory.airport_code("atlantis"), None);
    }

    #[test]
    fn misspellings_get_close_suggestions() {
        let directory = CityDirectory::new();
        let suggestions = directory.suggest_similar("mumbia");
        assert_eq!(suggestions.first(), Some(&"mumbai"));

        assert!(directory.suggest_similar("xqzzw").is_empty());
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        assert_eq!(similarity("delhi", "delhi"), 1.0);
        let forward = similarity("delhi", "dehli");
        let backward = similarity("dehli", "delhi");
        assert_eq!(forward, backward);
        assert!(forward > 0.5 && forward < 1.0);
    }
}
