//! Average colors and the distance used to compare them

use clap::{builder::PossibleValue, ValueEnum};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Mean color of an image region, channels in (R, G, B) order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AverageColor(pub [u8; 3]);

impl AverageColor {
    /// Per-channel absolute difference `|self - other|`
    pub fn abs_diff(self, other: Self) -> [u8; 3] {
        let Self(a) = self;
        let Self(b) = other;
        [a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2])]
    }

    /// Mean of the per-channel absolute differences
    pub fn distance(self, other: Self) -> f64 {
        channel_sum(self.abs_diff(other)) as f64 / 3.0
    }
}

impl From<Rgb<u8>> for AverageColor {
    fn from(Rgb(rgb): Rgb<u8>) -> Self {
        Self(rgb)
    }
}

impl From<AverageColor> for Rgb<u8> {
    fn from(AverageColor(rgb): AverageColor) -> Self {
        Rgb(rgb)
    }
}

/// Sum of the three channels of a difference vector
pub(crate) fn channel_sum(diff: [u8; 3]) -> u32 {
    diff.iter().map(|&c| u32::from(c)).sum()
}

/// Average the `width x height` block whose top-left corner is `(x, y)`
///
/// Channels are rounded to the nearest integer. An empty block averages to black.
pub fn average_block(image: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> AverageColor {
    let mut sums = [0u64; 3];
    for py in y..y + height {
        for px in x..x + width {
            let Rgb(rgb) = image.get_pixel(px, py);
            for (sum, &c) in sums.iter_mut().zip(rgb) {
                *sum += u64::from(c);
            }
        }
    }
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return AverageColor::default();
    }
    AverageColor(sums.map(|sum| ((sum + count / 2) / count) as u8))
}

/// Average every pixel of an image
pub fn average_image(image: &RgbImage) -> AverageColor {
    average_block(image, 0, 0, image.width(), image.height())
}

/// How a candidate distance is compared against the running best
///
/// Both modes scan candidates in index order and replace the best only on a
/// strict improvement, so ties keep the lowest index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Comparison {
    /// Candidate mean against the running best's mean
    #[default]
    Mean,
    /// Candidate mean against the green channel of the running best's raw
    /// difference vector. The first candidate seeds the best unconditionally.
    /// Kept for output parity with earlier mosaics; it is not a
    /// nearest-neighbour search.
    Legacy,
}

impl Comparison {
    /// Whether `candidate` replaces `best` as the running best difference
    pub fn improves(self, candidate: [u8; 3], best: [u8; 3]) -> bool {
        // Compare sums against scaled baselines to keep the means exact
        match self {
            Comparison::Mean => channel_sum(candidate) < channel_sum(best),
            Comparison::Legacy => channel_sum(candidate) < 3 * u32::from(best[1]),
        }
    }
}

impl ValueEnum for Comparison {
    fn value_variants<'a>() -> &'a [Self] {
        &[Comparison::Mean, Comparison::Legacy]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Comparison::Mean => PossibleValue::new("mean")
                .help("Pick the library image with the smallest mean channel difference."),
            Comparison::Legacy => PossibleValue::new("legacy")
                .help("Compare against the green difference of the best match so far."),
        })
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_mean_abs_difference() {
        let a = AverageColor([10, 20, 30]);
        let b = AverageColor([13, 14, 30]);
        assert_eq!(a.abs_diff(b), [3, 6, 0]);
        assert!((a.distance(b) - 3.0).abs() < f64::EPSILON);
        assert!((b.distance(a) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_block_rounds_to_nearest() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([0, 10, 255]));
        image.put_pixel(1, 0, Rgb([1, 11, 254]));
        // 0.5 rounds up, 10.5 rounds up, 254.5 rounds up
        assert_eq!(average_image(&image), AverageColor([1, 11, 255]));
    }

    #[test]
    fn test_average_block_region() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        for y in 2..4 {
            for x in 2..4 {
                image.put_pixel(x, y, Rgb([10, 20, 30]));
            }
        }
        assert_eq!(average_block(&image, 2, 2, 2, 2), AverageColor([10, 20, 30]));
        assert_eq!(average_block(&image, 0, 0, 2, 2), AverageColor([200, 200, 200]));
    }

    #[test]
    fn test_empty_block_is_black() {
        let image = RgbImage::new(2, 2);
        assert_eq!(average_block(&image, 0, 0, 0, 2), AverageColor([0, 0, 0]));
    }

    #[test]
    fn test_mean_comparison_is_strict() {
        assert!(Comparison::Mean.improves([1, 1, 1], [2, 1, 1]));
        assert!(!Comparison::Mean.improves([2, 1, 1], [1, 2, 1]));
    }

    #[test]
    fn test_legacy_comparison_uses_green_baseline() {
        // Mean 10 is worse than best mean 4, but beats best green channel 12
        assert!(Comparison::Legacy.improves([10, 10, 10], [0, 12, 0]));
        assert!(!Comparison::Mean.improves([10, 10, 10], [0, 12, 0]));
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&AverageColor([1, 2, 3])).unwrap();
        assert_eq!(json, "[1,2,3]");
    }
}
