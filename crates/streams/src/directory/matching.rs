//! Matching free-form country names (as shown by a map widget) against
//! directory keys.

/// Lowercases and keeps only ASCII letters and digits.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Finds the directory key for `display_name`.
///
/// Precedence: exact match, then a key starting with the name, then a key
/// containing the name, then the longest key contained in the name. All
/// comparisons use [`normalize`]d strings; ties go to the first key in
/// iteration order.
pub fn match_key<'a, I>(display_name: &str, keys: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let name = normalize(display_name);
    if name.is_empty() {
        return None;
    }

    let keys: Vec<(&str, String)> = keys
        .into_iter()
        .map(|key| (key, normalize(key)))
        .filter(|(_, normalized)| !normalized.is_empty())
        .collect();

    let find = |predicate: &dyn Fn(&str) -> bool| {
        keys.iter()
            .find(|(_, normalized)| predicate(normalized))
            .map(|(key, _)| *key)
    };

    find(&|key: &str| key == name)
        .or_else(|| find(&|key: &str| key.starts_with(&name)))
        .or_else(|| find(&|key: &str| key.contains(&name)))
        .or_else(|| {
            keys.iter()
                .filter(|(_, normalized)| name.contains(normalized.as_str()))
                // first longest wins on ties
                .fold(None::<&(&str, String)>, |best, candidate| match best {
                    Some(best) if best.1.len() >= candidate.1.len() => Some(best),
                    _ => Some(candidate),
                })
                .map(|(key, _)| *key)
        })
}

/// Case-insensitive substring suggestions, in key order.
pub fn suggest<'a, I>(query: &str, keys: I, limit: usize) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return vec![];
    }

    keys.into_iter()
        .filter(|key| key.to_lowercase().contains(&query))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "Bosnia and Herzegovina",
        "Congo",
        "Democratic Republic of the Congo",
        "India",
        "Indonesia",
        "United Kingdom",
        "United States",
    ];

    fn keys() -> impl Iterator<Item = &'static str> {
        KEYS.iter().copied()
    }

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize("Côte d'Ivoire"), "ctedivoire");
        assert_eq!(normalize("  United-States  "), "unitedstates");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn exact_match_wins() {
        assert_eq!(match_key("india", keys()), Some("India"));
        assert_eq!(match_key("Congo", keys()), Some("Congo"));
        assert_eq!(match_key("united states", keys()), Some("United States"));
    }

    #[test]
    fn prefix_beats_substring() {
        assert_eq!(match_key("Bosnia", keys()), Some("Bosnia and Herzegovina"));
        assert_eq!(match_key("Indo", keys()), Some("Indonesia"));
        assert_eq!(match_key("Republic of the", keys()), Some("Democratic Republic of the Congo"));
    }

    #[test]
    fn reverse_substring_picks_longest_key() {
        assert_eq!(
            match_key("United States of America", keys()),
            Some("United States")
        );
        assert_eq!(
            match_key("The Democratic Republic of the Congo (Kinshasa)", keys()),
            Some("Democratic Republic of the Congo")
        );
    }

    #[test]
    fn no_match_and_empty_input() {
        assert_eq!(match_key("Atlantis", keys()), None);
        assert_eq!(match_key("", keys()), None);
        assert_eq!(match_key("!!", keys()), None);
    }

    #[test]
    fn suggestions_are_limited() {
        assert_eq!(suggest("united", keys(), 8), vec!["United Kingdom", "United States"]);
        assert_eq!(suggest("IN", keys(), 2), vec!["Bosnia and Herzegovina", "India"]);
        assert!(suggest(" ", keys(), 8).is_empty());
    }
}
