// helpers for slicing the free-text category field into browsable facets
use crate::database::catalog::model::ContentMeta;

/// categories that describe the file rather than the content, filtered out of
/// the genre facet
const TECHNICAL_CATEGORIES: [&str; 16] = [
    "480p",
    "720p",
    "1080p",
    "4K",
    "HD",
    "Full HD",
    "Hindi Dubbed Movies",
    "Telugu",
    "Tamil",
    "Malayalam",
    "English Movies",
    "Bollywood",
    "Hollywood",
    "WEB-DL",
    "BluRay",
    "DVDRip",
];

const LANGUAGES: [&str; 7] = [
    "Hindi",
    "Telugu",
    "Tamil",
    "Malayalam",
    "English",
    "Punjabi",
    "Gujarati",
];

const QUALITY_TAGS: [&str; 6] = ["480p", "720p", "1080p", "4K", "HD", "Full HD"];

pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|cat| cat.trim())
        .filter(|cat| !cat.is_empty())
        .map(|cat| cat.to_string())
        .collect()
}

fn is_year(cat: &str) -> bool {
    cat.len() == 4 && cat.chars().all(|c| c.is_ascii_digit())
}

pub fn extract_genres(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .filter(|cat| !TECHNICAL_CATEGORIES.iter().any(|tech| cat.contains(tech)))
        .filter(|cat| !is_year(cat))
        .cloned()
        .collect()
}

pub fn extract_release_year(categories: &[String]) -> Option<u16> {
    categories
        .iter()
        .find(|cat| is_year(cat))
        .and_then(|cat| cat.parse().ok())
}

pub fn extract_languages(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .filter(|cat| LANGUAGES.iter().any(|lang| cat.contains(lang)))
        .cloned()
        .collect()
}

pub fn extract_qualities(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .filter(|cat| QUALITY_TAGS.iter().any(|quality| cat.contains(quality)))
        .cloned()
        .collect()
}

/// rough size-to-MB conversion for quality bucketing, 0 when unparseable
pub fn parse_size_to_mb(size: &str) -> f64 {
    let number: String = size
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let Ok(value) = number.parse::<f64>() else {
        return 0.0;
    };

    let lower = size.to_lowercase();
    if lower.contains("tb") {
        value * 1024.0 * 1024.0
    } else if lower.contains("gb") {
        value * 1024.0
    } else if lower.contains("mb") {
        value
    } else if lower.contains("kb") {
        value / 1024.0
    } else {
        0.0
    }
}

/// the content column is either a JSON array of [description, duration, rating]
/// or plain prose; both shapes collapse into ContentMeta
pub fn parse_content_metadata(raw: Option<&str>) -> Option<ContentMeta> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Array(parts)) = serde_json::from_str::<serde_json::Value>(raw) {
        if parts.len() >= 3 {
            let field = |i: usize| parts[i].as_str().map(|s| s.to_string());
            return Some(ContentMeta {
                description: field(0),
                duration: field(1),
                rating: field(2),
            });
        }
    }

    Some(ContentMeta {
        description: Some(raw.to_string()),
        duration: None,
        rating: None,
    })
}
