// best-effort parsers for the human-authored link fields. The upstream data
// entry tooling concatenates records with no separator and formats episode
// lists inconsistently, so non-matching text yields partial or empty results
// rather than an error.
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::database::catalog::model::{DownloadLink, Episode};
use crate::server::utils::catalog_facets::parse_size_to_mb;

/// movie links field: "url,title,sizeurl,title,size..." with the next record
/// glued straight onto the previous size
static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(https://[^,]+\?download),([^,]+),(\d+(?:\.\d+)?(?:MB|GB|TB))")
        .expect("link pattern should compile")
});

static QUALITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(480p|720p|1080p|2160p|4K)").expect("quality pattern should compile"));

/// episode blobs mark entries as "Episode 12:"
static EPISODE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Episode\s+(\d+)\s*:").expect("episode marker should compile"));

/// urls show up either bracketed or bare at the start of a chunk
static EPISODE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]|^(https?://[^\s,]+)").expect("episode url pattern should compile")
});

/// ",720p,229.05 MB" style quality/size pair
static QUALITY_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i),\s*([^,]*(?:p|bit|K)[^,]*)\s*,\s*([^,\r\n]+)")
        .expect("quality-size pattern should compile")
});

static SIZE_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?\s*(?:MB|GB|KB|TB))").expect("size pattern should compile")
});

fn normalize_quality(raw: &str) -> String {
    let upper = raw.to_uppercase();
    if upper == "2160P" { "4K".to_string() } else { upper }
}

/// lower rank sorts first
fn quality_rank(quality: &str) -> u8 {
    match quality {
        "480P" => 2,
        "720P" => 4,
        "HD" => 5,
        "1080P" => 6,
        "4K" => 8,
        _ => 10,
    }
}

/// quality bucket when the title doesn't carry one, inferred from file size
fn quality_from_size(size: &str) -> String {
    let mb = parse_size_to_mb(size);
    if mb >= 1500.0 {
        "1080P".to_string()
    } else if mb >= 800.0 {
        "720P".to_string()
    } else if mb > 0.0 {
        "480P".to_string()
    } else {
        "HD".to_string()
    }
}

pub fn parse_download_links(raw: &str) -> Vec<DownloadLink> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut links: Vec<DownloadLink> = LINK_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| {
            let url = caps.get(1)?.as_str().trim();
            let title = caps.get(2)?.as_str().trim();
            let size = caps.get(3)?.as_str().trim();

            let quality = match QUALITY_PATTERN.find(title) {
                Some(m) => normalize_quality(m.as_str()),
                None => quality_from_size(size),
            };

            Some(DownloadLink {
                url: url.to_string(),
                quality,
                size: size.to_string(),
                description: title.to_string(),
            })
        })
        .collect();

    links.sort_by_key(|link| quality_rank(&link.quality));

    debug!("parsed {} download links from {} chars", links.len(), raw.len());
    links
}

/// splits a season blob into episodes. Episodes whose chunk yields no usable
/// links are skipped entirely.
pub fn parse_season_episodes(raw: &str) -> Vec<Episode> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    // (episode number, marker start, marker end)
    let markers: Vec<(u32, usize, usize)> = EPISODE_MARKER
        .captures_iter(raw)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((number, whole.start(), whole.end()))
        })
        .collect();

    let mut episodes = Vec::new();
    for (i, (number, _, body_start)) in markers.iter().enumerate() {
        let body_end = markers
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(raw.len());
        let body = &raw[*body_start..body_end];

        let links = parse_episode_links(body, *number);
        if !links.is_empty() {
            episodes.push(Episode {
                number: *number,
                title: format!("Episode {}", number),
                links,
            });
        }
    }

    episodes
}

fn parse_episode_links(body: &str, episode_number: u32) -> Vec<DownloadLink> {
    let mut links = Vec::new();

    // " : " separates the quality variants of one episode
    for part in body.split(" : ") {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(url) = EPISODE_URL
            .captures(trimmed)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };

        // strip the url so quality/size matching only sees the trailing text
        let remaining = trimmed
            .replace(&format!("[{}]", url), "")
            .replace(&url, "");

        let (quality, size) = match QUALITY_SIZE.captures(&remaining) {
            Some(caps) => {
                let quality = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                let size = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
                (
                    if quality.is_empty() { "HD".to_string() } else { quality.to_string() },
                    if size.is_empty() { "Unknown".to_string() } else { size.to_string() },
                )
            }
            None => {
                let quality = QUALITY_PATTERN
                    .find(&remaining)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "HD".to_string());
                let size = SIZE_FALLBACK
                    .find(&remaining)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                (quality, size)
            }
        };

        // trailing junk after the first query parameter is data-entry noise
        let clean_url = match url.split_once('?') {
            Some((base, query)) => {
                let first_param = query.split(',').next().unwrap_or(query);
                format!("{}?{}", base, first_param)
            }
            None => url.clone(),
        };

        links.push(DownloadLink {
            url: clean_url,
            quality: quality.clone(),
            size,
            description: format!("Episode {} - {}", episode_number, quality),
        });
    }

    links
}
