//! Lexical relevance search over an [`IndexSnapshot`].
//!
//! # Scoring
//!
//! 1. Extract the query's keyword set with the ingestion tokenizer.
//! 2. For each query keyword with a posting list of length `df`, compute
//!    `weight = ln(total_chunks / df) + 1`.
//! 3. Add `weight` to every chunk in that posting list.
//! 4. Sort by accumulated score, descending; equal scores keep index
//!    order.
//! 5. Truncate to `max_results`.
//!
//! A keyword counts once per chunk however often it occurs there, and
//! once per query however often the query repeats it. Query keywords
//! missing from the index add nothing.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::index::IndexSnapshot;
use crate::keywords::extract_keywords;
use crate::models::SearchHit;

/// Inverse-document-frequency weight of a keyword found in `df` of
/// `total` chunks.
pub fn idf_weight(total: usize, df: usize) -> f64 {
    (total as f64 / df as f64).ln() + 1.0
}

/// Rank the snapshot's chunks against `query`.
///
/// Returns an empty list for an empty index, a query without keywords,
/// or `max_results == 0`.
pub fn search(snapshot: &IndexSnapshot, query: &str, max_results: usize) -> Vec<SearchHit> {
    if snapshot.is_empty() || max_results == 0 {
        return Vec::new();
    }

    let query_keywords = extract_keywords(query);
    if query_keywords.is_empty() {
        return Vec::new();
    }

    let total = snapshot.chunks().len();
    let mut scores: HashMap<usize, f64> = HashMap::new();

    for keyword in &query_keywords {
        let Some(positions) = snapshot.postings(keyword) else {
            continue;
        };
        let weight = idf_weight(total, positions.len());
        for &position in positions {
            *scores.entry(position).or_insert(0.0) += weight;
        }
    }

    let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(max_results);

    ranked
        .into_iter()
        .map(|(position, score)| {
            let chunk = &snapshot.chunks()[position];
            SearchHit {
                chunk_id: chunk.id.clone(),
                doc_path: chunk.doc_path.clone(),
                title: chunk.title.clone(),
                text: chunk.text.clone(),
                score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceDoc;

    fn snapshot(docs: &[(&str, &str)], chunk_size: usize) -> IndexSnapshot {
        let sources: Vec<SourceDoc> = docs
            .iter()
            .map(|(id, text)| SourceDoc::new(*id, *text))
            .collect();
        IndexSnapshot::build(&sources, chunk_size)
    }

    #[test]
    fn test_idf_weight() {
        assert!((idf_weight(10, 10) - 1.0).abs() < 1e-12);
        assert!((idf_weight(10, 1) - (10f64.ln() + 1.0)).abs() < 1e-12);
        assert!(idf_weight(10, 1) > idf_weight(10, 5));
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let snap = snapshot(&[("a.md", "refund policy")], 1000);
        assert!(search(&snap, "", 5).is_empty());
        assert!(search(&snap, "how do I", 5).is_empty());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let snap = IndexSnapshot::empty();
        assert!(search(&snap, "refund policy", 5).is_empty());
    }

    #[test]
    fn test_zero_max_results() {
        let snap = snapshot(&[("a.md", "refund policy")], 1000);
        assert!(search(&snap, "refund", 0).is_empty());
    }

    #[test]
    fn test_unknown_keywords_ignored() {
        let snap = snapshot(&[("a.md", "refund policy")], 1000);
        let hits = search(&snap, "refund zeppelin", 5);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scores_sum_per_keyword() {
        let snap = snapshot(
            &[
                ("a.md", "# A\nrefund policy"),
                ("b.md", "# B\nrefund"),
                ("c.md", "# C\nunrelated words"),
            ],
            1000,
        );
        let hits = search(&snap, "refund policy", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_path, "a.md");
        let expected = idf_weight(3, 2) + idf_weight(3, 1);
        assert!((hits[0].score - expected).abs() < 1e-12);
        assert!((hits[1].score - idf_weight(3, 2)).abs() < 1e-12);
    }

    #[test]
    fn test_more_distinct_keywords_rank_higher() {
        let snap = snapshot(
            &[
                ("one.md", "# One\nbilling"),
                ("two.md", "# Two\nbilling invoice"),
                ("three.md", "# Three\nbilling invoice receipt"),
            ],
            1000,
        );
        let hits = search(&snap, "billing invoice receipt", 3);
        let order: Vec<&str> = hits.iter().map(|h| h.doc_path.as_str()).collect();
        assert_eq!(order, vec!["three.md", "two.md", "one.md"]);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_repeated_terms_not_weighted() {
        let snap = snapshot(
            &[("a.md", "# A\nrefund refund refund"), ("b.md", "# B\nrefund")],
            1000,
        );
        let hits = search(&snap, "refund refund", 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].score, hits[1].score);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let snap = snapshot(
            &[
                ("z.md", "# Z\nshipping"),
                ("a.md", "# A\nshipping"),
                ("m.md", "# M\nshipping"),
            ],
            1000,
        );
        let hits = search(&snap, "shipping", 5);
        let order: Vec<&str> = hits.iter().map(|h| h.doc_path.as_str()).collect();
        assert_eq!(order, vec!["z.md", "a.md", "m.md"]);
    }

    #[test]
    fn test_truncates_to_max_results() {
        let docs: Vec<(String, String)> = (0..10)
            .map(|i| (format!("d{}.md", i), "# D\nshipping".to_string()))
            .collect();
        let borrowed: Vec<(&str, &str)> =
            docs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let snap = snapshot(&borrowed, 1000);
        assert_eq!(search(&snap, "shipping", 3).len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let snap = snapshot(
            &[
                ("a.md", "# A\nalpha bravo charlie"),
                ("b.md", "# B\nbravo charlie delta"),
                ("c.md", "# C\ncharlie delta echo"),
            ],
            1000,
        );
        let first = search(&snap, "bravo charlie delta", 3);
        for _ in 0..10 {
            assert_eq!(search(&snap, "bravo charlie delta", 3), first);
        }
    }
}
