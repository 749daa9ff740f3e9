//! Nearest-color search from tile colors to library entries

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::color::{AverageColor, Comparison};
use crate::error::{MosaicError, Result};
use crate::index::ColorIndex;

/// Strategy that finds the library entry closest to a color
///
/// Implementations must be deterministic: the same color against the same
/// index always yields the same position.
pub trait ColorSearch: Sync {
    /// Position in the index of the entry closest to `color`
    fn nearest(&self, color: AverageColor) -> usize;
}

/// Full linear scan over the index for every query
#[derive(Debug)]
pub struct LinearScan {
    colors: Vec<AverageColor>,
    comparison: Comparison,
}

impl LinearScan {
    /// Prepare a scan over `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexMismatch` if the index has no entries.
    pub fn new(index: &ColorIndex, comparison: Comparison) -> Result<Self> {
        if index.is_empty() {
            return Err(MosaicError::IndexMismatch {
                library: index.library.clone(),
                reason: "index has no entries".to_string(),
            });
        }
        Ok(Self {
            colors: index.entries.iter().map(|entry| entry.color).collect(),
            comparison,
        })
    }
}

impl ColorSearch for LinearScan {
    fn nearest(&self, color: AverageColor) -> usize {
        let mut best: Option<(usize, [u8; 3])> = None;
        for (i, &candidate) in self.colors.iter().enumerate() {
            let diff = candidate.abs_diff(color);
            let replaces = best.map_or(true, |(_, best_diff)| {
                self.comparison.improves(diff, best_diff)
            });
            if replaces {
                best = Some((i, diff));
            }
        }
        best.map_or(0, |(i, _)| i)
    }
}

/// Resolve every tile color to a library identifier, preserving order
///
/// # Errors
///
/// Returns `IndexMismatch` if the index is empty or `search` points outside it.
pub fn match_tiles<'a, S: ColorSearch + ?Sized>(
    colors: &[AverageColor],
    index: &'a ColorIndex,
    search: &S,
    progress: &ProgressBar,
) -> Result<Vec<&'a str>> {
    if index.is_empty() {
        return Err(MosaicError::IndexMismatch {
            library: index.library.clone(),
            reason: "index has no entries".to_string(),
        });
    }
    progress.set_length(colors.len() as u64);
    let matches = colors
        .par_iter()
        .map(|&color| {
            let position = search.nearest(color);
            progress.inc(1);
            index.name(position).ok_or_else(|| MosaicError::IndexMismatch {
                library: index.library.clone(),
                reason: format!("search returned position {position} of {}", index.len()),
            })
        })
        .collect::<Result<Vec<_>>>()
        .inspect_err(|_| progress.finish_and_clear())?;
    progress.finish_and_clear();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;

    fn index(colors: &[[u8; 3]]) -> ColorIndex {
        ColorIndex {
            library: "fixture".to_string(),
            probe_size: 1,
            entries: colors
                .iter()
                .enumerate()
                .map(|(i, &rgb)| IndexEntry {
                    name: format!("{i}.png"),
                    color: AverageColor(rgb),
                })
                .collect(),
        }
    }

    fn run(idx: &ColorIndex, comparison: Comparison, colors: &[[u8; 3]]) -> Vec<String> {
        let scan = LinearScan::new(idx, comparison).unwrap();
        let colors: Vec<_> = colors.iter().map(|&c| AverageColor(c)).collect();
        match_tiles(&colors, idx, &scan, &ProgressBar::hidden())
            .unwrap()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_black_white_library() {
        let idx = index(&[[0, 0, 0], [255, 255, 255]]);
        let names = run(&idx, Comparison::Mean, &[[10, 10, 10], [245, 245, 245]]);
        assert_eq!(names, vec!["0.png", "1.png"]);
    }

    #[test]
    fn test_ties_keep_first_entry() {
        let idx = index(&[[0, 0, 0], [20, 20, 20], [20, 20, 20]]);
        let names = run(&idx, Comparison::Mean, &[[10, 10, 10], [20, 20, 20]]);
        assert_eq!(names, vec!["0.png", "1.png"]);
    }

    #[test]
    fn test_repeated_matches_allowed() {
        let idx = index(&[[0, 0, 0], [255, 255, 255]]);
        let names = run(&idx, Comparison::Mean, &[[1, 1, 1], [2, 2, 2], [3, 3, 3]]);
        assert_eq!(names, vec!["0.png"; 3]);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let idx = index(&[[12, 200, 40], [90, 90, 90], [250, 10, 10], [0, 0, 128]]);
        let tiles = [[100, 100, 100], [240, 0, 30], [5, 5, 100], [20, 190, 50]];
        let first = run(&idx, Comparison::Mean, &tiles);
        let second = run(&idx, Comparison::Mean, &tiles);
        assert_eq!(first, second);
        assert_eq!(first, vec!["1.png", "2.png", "3.png", "0.png"]);
    }

    // Fixture where the legacy green-channel baseline diverges from the mean.
    // Tile (0, 0, 0):
    //   entry 0 (0, 100, 0): seeds best, diff (0, 100, 0), mean 33.3
    //   entry 1 (90, 90, 90): mean 90; legacy baseline is 100, so 90 < 100 wins
    //   entry 2 (60, 0, 60): mean 40; legacy baseline is green 90, so it wins again
    //   entry 3 (30, 30, 30): mean 30; legacy baseline is green 0, so it loses
    // Mean picks entry 3, legacy picks entry 2.
    #[test]
    fn test_legacy_comparison_differs_from_mean() {
        let idx = index(&[[0, 100, 0], [90, 90, 90], [60, 0, 60], [30, 30, 30]]);
        assert_eq!(run(&idx, Comparison::Mean, &[[0, 0, 0]]), vec!["3.png"]);
        assert_eq!(run(&idx, Comparison::Legacy, &[[0, 0, 0]]), vec!["2.png"]);
    }

    #[test]
    fn test_legacy_agrees_on_black_white_library() {
        let idx = index(&[[0, 0, 0], [255, 255, 255]]);
        let names = run(&idx, Comparison::Legacy, &[[10, 10, 10], [245, 245, 245]]);
        assert_eq!(names, vec!["0.png", "1.png"]);
    }

    #[test]
    fn test_empty_index_is_rejected() {
        let idx = index(&[]);
        assert!(matches!(
            LinearScan::new(&idx, Comparison::Mean),
            Err(MosaicError::IndexMismatch { .. })
        ));
    }

    struct Always(usize);

    impl ColorSearch for Always {
        fn nearest(&self, _color: AverageColor) -> usize {
            self.0
        }
    }

    #[test]
    fn test_custom_search_strategy() {
        let idx = index(&[[0, 0, 0], [255, 255, 255]]);
        let colors = [AverageColor([0, 0, 0]); 2];
        let names = match_tiles(&colors, &idx, &Always(1), &ProgressBar::hidden()).unwrap();
        assert_eq!(names, vec!["1.png", "1.png"]);

        let bar = ProgressBar::hidden();
        let result = match_tiles(&colors, &idx, &Always(7), &bar);
        assert!(matches!(result, Err(MosaicError::IndexMismatch { .. })));
        assert!(bar.is_finished());
    }
}
