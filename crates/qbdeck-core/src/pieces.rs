//! Downsampling of piece states into a fixed number of visual cells.

use serde::Serialize;

use crate::model::PieceState;

/// Upper bound on the number of buckets produced by [`summarize_pieces`].
pub const MAX_PIECE_BUCKETS: usize = 512;

/// Summary of a contiguous run of pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieceBucket {
    /// At least one piece of the run is being downloaded.
    InProgress,
    /// No piece is in flight; `downloaded` of `total` pieces are complete.
    Completed {
        /// Downloaded pieces in the run.
        downloaded: usize,
        /// Pieces in the run.
        total: usize,
    },
}

impl PieceBucket {
    /// Share of downloaded pieces, `None` for in-progress buckets.
    #[must_use]
    pub fn fraction(self) -> Option<f64> {
        match self {
            Self::InProgress => None,
            Self::Completed { total: 0, .. } => Some(0.0),
            #[allow(clippy::cast_precision_loss)]
            Self::Completed { downloaded, total } => Some(downloaded as f64 / total as f64),
        }
    }
}

/// Summarize `states` into at most [`MAX_PIECE_BUCKETS`] buckets.
#[must_use]
pub fn summarize_pieces(states: &[PieceState]) -> Vec<PieceBucket> {
    summarize_pieces_with(states, MAX_PIECE_BUCKETS)
}

/// Summarize `states` into at most `max_buckets` buckets.
///
/// Runs have `ceil(n / max_buckets)` pieces each; the last run may be
/// shorter. A `max_buckets` of zero is treated as one.
#[must_use]
pub fn summarize_pieces_with(states: &[PieceState], max_buckets: usize) -> Vec<PieceBucket> {
    if states.is_empty() {
        return Vec::new();
    }
    let group = states.len().div_ceil(max_buckets.max(1));
    states.chunks(group).map(summarize_run).collect()
}

fn summarize_run(run: &[PieceState]) -> PieceBucket {
    if run.contains(&PieceState::Downloading) {
        return PieceBucket::InProgress;
    }
    PieceBucket::Completed {
        downloaded: run
            .iter()
            .filter(|state| **state == PieceState::Downloaded)
            .count(),
        total: run.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pieces_yield_no_buckets() {
        assert!(summarize_pieces(&[]).is_empty());
    }

    #[test]
    fn small_torrents_map_one_to_one() {
        let buckets = summarize_pieces(&[
            PieceState::Downloading,
            PieceState::Downloaded,
            PieceState::Downloaded,
        ]);
        assert_eq!(
            buckets,
            vec![
                PieceBucket::InProgress,
                PieceBucket::Completed {
                    downloaded: 1,
                    total: 1
                },
                PieceBucket::Completed {
                    downloaded: 1,
                    total: 1
                },
            ]
        );
    }

    #[test]
    fn alternating_pieces_halve_into_half_full_buckets() {
        let states: Vec<_> = (0..1024)
            .map(|index| {
                if index % 2 == 0 {
                    PieceState::Downloaded
                } else {
                    PieceState::NotDownloaded
                }
            })
            .collect();
        let buckets = summarize_pieces(&states);
        assert_eq!(buckets.len(), 512);
        assert!(buckets.iter().all(|bucket| bucket.fraction() == Some(0.5)));
    }

    #[test]
    fn bucket_count_follows_group_size() {
        for n in [1_usize, 511, 512, 513, 1000, 1025, 4097, 100_000] {
            let states = vec![PieceState::NotDownloaded; n];
            let group = n.div_ceil(MAX_PIECE_BUCKETS);
            let buckets = summarize_pieces(&states);
            assert_eq!(buckets.len(), n.div_ceil(group), "n = {n}");
            assert!(buckets.len() <= MAX_PIECE_BUCKETS);
        }
    }

    #[test]
    fn downloading_piece_dominates_its_run() {
        let mut states = vec![PieceState::Downloaded; 1024];
        states[3] = PieceState::Downloading;
        let buckets = summarize_pieces(&states);
        assert_eq!(buckets[1], PieceBucket::InProgress);
        assert_eq!(buckets[0].fraction(), Some(1.0));
    }

    #[test]
    fn last_run_may_be_shorter() {
        let states = vec![PieceState::Downloaded; 1025];
        let buckets = summarize_pieces(&states);
        assert_eq!(buckets.len(), 342);
        assert_eq!(
            buckets.last(),
            Some(&PieceBucket::Completed {
                downloaded: 2,
                total: 2
            })
        );
    }
}
