//! Reduction of search candidates to one result per artist.

use std::collections::{HashMap, HashSet};

use super::SearchResult;

/// Bucket used for results without an artist.
const UNKNOWN_ARTIST: &str = "Unknown";

/// Keep the best candidate per artist.
///
/// Artists are compared case-insensitively, with a blank artist going to an
/// "Unknown" bucket. Within a bucket [`prefers`] decides which candidate is
/// kept. Buckets come out in first-seen order.
pub fn filter_top_results(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut best: Vec<SearchResult> = Vec::new();

    for candidate in results {
        let key = artist_key(&candidate.artist);
        match index.get(&key) {
            Some(&i) => {
                if prefers(&candidate, &best[i]) {
                    best[i] = candidate;
                }
            }
            None => {
                index.insert(key, best.len());
                best.push(candidate);
            }
        }
    }

    best
}

/// Whether `candidate` should displace `incumbent` in the same artist bucket.
///
/// A chords result always beats a non-chords one. Otherwise a strictly higher
/// rating wins, but only between results of the same kind; a non-chords
/// result never displaces a chords one.
pub fn prefers(candidate: &SearchResult, incumbent: &SearchResult) -> bool {
    match (candidate.is_chords(), incumbent.is_chords()) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.rating > incumbent.rating,
    }
}

/// Remove results whose id was already seen, keeping the first.
pub fn dedup_by_id(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

/// Drop results whose difficulty is known and differs from `difficulty`.
pub fn filter_by_difficulty(results: Vec<SearchResult>, difficulty: &str) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| match r.difficulty.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.eq_ignore_ascii_case(difficulty),
            _ => true,
        })
        .collect()
}

fn artist_key(artist: &str) -> String {
    let artist = artist.trim();
    if artist.is_empty() {
        UNKNOWN_ARTIST.to_lowercase()
    } else {
        artist.to_lowercase()
    }
}
