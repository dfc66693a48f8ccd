//! Pure list-merging primitives used by the recommendation orchestrator.
//!
//! Blending is interleave → stable dedup → truncate. The three steps are
//! deliberately separate functions so each is testable on plain sequences,
//! independent of any store or transport.

use std::collections::HashSet;

use crate::models::TrackId;

/// Interleaves two candidate lists online-first: `n1, o1, n2, o2, …`.
///
/// When one list runs out the remainder of the other is appended in its own
/// order. The online-first start is the documented contract of the blend,
/// guaranteeing online signal is visible in every prefix of the result.
pub fn interleave(online: &[TrackId], offline: &[TrackId]) -> Vec<TrackId> {
    let common = online.len().min(offline.len());
    let mut merged = Vec::with_capacity(online.len() + offline.len());

    for i in 0..common {
        merged.push(online[i]);
        merged.push(offline[i]);
    }
    merged.extend_from_slice(&online[common..]);
    merged.extend_from_slice(&offline[common..]);

    merged
}

/// Removes duplicate track IDs, keeping the first occurrence of each and
/// preserving relative order. A stable set-reduction, not a re-sort.
pub fn dedup_stable(tracks: Vec<TrackId>) -> Vec<TrackId> {
    let mut seen = HashSet::with_capacity(tracks.len());
    tracks.into_iter().filter(|t| seen.insert(*t)).collect()
}

/// Truncates to the first `k` items.
pub fn take_prefix(mut tracks: Vec<TrackId>, k: usize) -> Vec<TrackId> {
    tracks.truncate(k);
    tracks
}

/// The full blend: interleave online-first, dedup keeping earliest
/// occurrence, cap at `k`.
pub fn merge(online: &[TrackId], offline: &[TrackId], k: usize) -> Vec<TrackId> {
    take_prefix(dedup_stable(interleave(online, offline)), k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_online_first() {
        let online = vec![11, 12];
        let offline = vec![21, 22, 23];
        assert_eq!(interleave(&online, &offline), vec![11, 21, 12, 22, 23]);
    }

    #[test]
    fn test_interleave_appends_online_remainder() {
        let online = vec![11, 12, 13, 14];
        let offline = vec![21];
        assert_eq!(interleave(&online, &offline), vec![11, 21, 12, 13, 14]);
    }

    #[test]
    fn test_interleave_empty_sides() {
        assert_eq!(interleave(&[], &[1, 2]), vec![1, 2]);
        assert_eq!(interleave(&[3, 4], &[]), vec![3, 4]);
        assert!(interleave(&[], &[]).is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        assert_eq!(dedup_stable(vec![5, 3, 5, 1, 3, 2]), vec![5, 3, 1, 2]);
    }

    #[test]
    fn test_take_prefix_caps_length() {
        assert_eq!(take_prefix(vec![1, 2, 3], 2), vec![1, 2]);
        assert_eq!(take_prefix(vec![1, 2], 5), vec![1, 2]);
        assert!(take_prefix(vec![1, 2], 0).is_empty());
    }

    #[test]
    fn test_merge_matches_contract_example() {
        // offline = [o1,o2,o3], online = [n1,n2], k = 5
        let offline = vec![201, 202, 203];
        let online = vec![101, 102];
        assert_eq!(merge(&online, &offline, 5), vec![101, 201, 102, 202, 203]);
    }

    #[test]
    fn test_merge_cross_list_duplicate_keeps_first() {
        // o2 == n1: dedup keeps the earlier (online) position.
        let offline = vec![201, 101, 203];
        let online = vec![101, 102];
        assert_eq!(merge(&online, &offline, 5), vec![101, 201, 102, 203]);
    }

    #[test]
    fn test_merge_respects_k() {
        let offline = vec![201, 202, 203];
        let online = vec![101, 102, 103];
        let merged = merge(&online, &offline, 3);
        assert_eq!(merged, vec![101, 201, 102]);
    }
}
