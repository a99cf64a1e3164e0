use std::fmt;

use ndarray::Array2;

use crate::{FatigueError, Result};

/// Window title of every plot of the data set.
pub const WINDOW_TITLE: &str = "Mouse Fatigue Estimation by HRS";

/// Density ramp, from empty to the most populated cell.
const RAMP: &[u8] = b" .:-=+*#%@";

/// The text around a plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub window_title: String,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
}

impl Labels {
    /// Labels for plotting `x_label` against `y_label`, titled after the x axis.
    pub fn new(x_label: &str, y_label: &str) -> Self {
        Self {
            window_title: WINDOW_TITLE.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            title: x_label.to_string(),
        }
    }
}

/// A two dimensional histogram over evenly spaced bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    x_edges: Vec<f32>,
    y_edges: Vec<f32>,
    counts: Array2<usize>,
}

impl Histogram2d {
    /// Counts the `(x, y)` pairs falling in each cell of a `bins_x` by `bins_y` grid.
    ///
    /// The grid spans the range of the data on each axis. The last bin of each axis is closed on
    /// both ends so the maximum is counted, and an axis where every value is equal is widened by
    /// half a unit on both sides. Non finite pairs are ignored.
    ///
    /// # Arguments
    /// * `xs` - The values on the x axis.
    /// * `ys` - The values on the y axis, paired by index with `xs`.
    /// * `bins_x` - The amount of bins on the x axis.
    /// * `bins_y` - The amount of bins on the y axis.
    pub fn compute(xs: &[f32], ys: &[f32], bins_x: usize, bins_y: usize) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(FatigueError::ColumnLength {
                column: "y".to_string(),
                got: ys.len(),
                expected: xs.len(),
            });
        }

        if bins_x == 0 || bins_y == 0 {
            return Err(FatigueError::InvalidConfig(
                "histogram bins must be greater than 0".to_string(),
            ));
        }

        let pairs: Vec<_> = xs
            .iter()
            .zip(ys)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect();

        let x_edges = edges(pairs.iter().map(|p| p.0), bins_x);
        let y_edges = edges(pairs.iter().map(|p| p.1), bins_y);
        let mut counts = Array2::zeros((bins_x, bins_y));

        for (x, y) in pairs {
            counts[(bin_of(x, &x_edges), bin_of(y, &y_edges))] += 1;
        }

        Ok(Self {
            x_edges,
            y_edges,
            counts,
        })
    }

    pub fn x_edges(&self) -> &[f32] {
        &self.x_edges
    }

    pub fn y_edges(&self) -> &[f32] {
        &self.y_edges
    }

    /// The counts, indexed by `(x bin, y bin)`.
    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    /// Renders the histogram as a text heat map with a colour bar.
    pub fn render(&self, labels: &Labels) -> String {
        Plot { hist: self, labels }.to_string()
    }
}

struct Plot<'a> {
    hist: &'a Histogram2d,
    labels: &'a Labels,
}

impl fmt::Display for Plot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Histogram2d {
            x_edges,
            y_edges,
            counts,
        } = self.hist;
        let labels = self.labels;

        let max = counts.iter().copied().max().unwrap_or(0);
        let (bins_x, bins_y) = counts.dim();
        let width = bins_x * 2;

        writeln!(f, "[{}]", labels.window_title)?;
        writeln!(f, "{:>12}{:^width$}", "", labels.title)?;
        writeln!(f, "{}", labels.y_label)?;

        for j in (0..bins_y).rev() {
            let mid = (y_edges[j] + y_edges[j + 1]) / 2.0;
            write!(f, "{mid:>10.3} |")?;

            for i in 0..bins_x {
                let shade = shade(counts[(i, j)], max) as char;
                write!(f, "{shade}{shade}")?;
            }

            writeln!(f, "|")?;
        }

        writeln!(f, "{:>12}{}+", "+", "-".repeat(width))?;
        writeln!(f, "{:>12}{:.3} .. {:.3}", "", x_edges[0], x_edges[bins_x])?;
        writeln!(f, "{:>12}{:^width$}", "", labels.x_label)?;

        write!(f, "colour bar:")?;
        for (level, &c) in RAMP.iter().enumerate() {
            if let Some(count) = lowest_count(level, max) {
                write!(f, " '{}'>={count}", c as char)?;
            }
        }

        writeln!(f)
    }
}

/// `bins + 1` evenly spaced edges spanning the values.
fn edges<I: Iterator<Item = f32>>(values: I, bins: usize) -> Vec<f32> {
    let (mut min, mut max) = values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if min > max {
        (min, max) = (0.0, 1.0);
    } else if min == max {
        (min, max) = (min - 0.5, max + 0.5);
    }

    let step = (max - min) / bins as f32;
    (0..=bins)
        .map(|i| if i == bins { max } else { min + step * i as f32 })
        .collect()
}

fn bin_of(value: f32, edges: &[f32]) -> usize {
    let bins = edges.len() - 1;
    let (min, max) = (edges[0], edges[bins]);
    let bin = ((value - min) / (max - min) * bins as f32).floor() as usize;

    bin.min(bins - 1)
}

fn level(count: usize, max: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }

    (count * (RAMP.len() - 1)).div_ceil(max).min(RAMP.len() - 1)
}

fn shade(count: usize, max: usize) -> u8 {
    RAMP[level(count, max)]
}

/// The smallest count drawn with the shade at `level`, if any count is.
fn lowest_count(shade_level: usize, max: usize) -> Option<usize> {
    if shade_level == 0 {
        return Some(0);
    }

    let count = (shade_level - 1) * max / (RAMP.len() - 1) + 1;
    (count <= max && level(count, max) == shade_level).then_some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_matches_cell_shades() {
        for max in [1, 5, 9, 16, 100] {
            let bounds: Vec<(usize, u8)> = (0..RAMP.len())
                .filter_map(|l| lowest_count(l, max).map(|c| (c, RAMP[l])))
                .collect();

            for count in 0..=max {
                let legend = bounds.iter().rev().find(|(c, _)| *c <= count).unwrap().1;
                assert_eq!(shade(count, max), legend, "count {count} of {max}");
            }
        }

        assert_eq!(shade(2, 16), b':');
        assert_eq!(lowest_count(2, 16), Some(2));
    }

    #[test]
    fn counts_every_pair_once() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [0.0, 0.0, 1.0, 2.0, 2.0];
        let hist = Histogram2d::compute(&xs, &ys, 4, 2).unwrap();

        assert_eq!(hist.counts().sum(), 5);
        assert_eq!(hist.x_edges(), [0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.y_edges(), [0.0, 1.0, 2.0]);
    }

    #[test]
    fn maximum_lands_in_the_last_bin() {
        let hist = Histogram2d::compute(&[0.0, 10.0], &[0.0, 10.0], 10, 10).unwrap();

        assert_eq!(hist.counts()[(0, 0)], 1);
        assert_eq!(hist.counts()[(9, 9)], 1);
    }

    #[test]
    fn constant_axis_is_widened() {
        let hist = Histogram2d::compute(&[1.0, 1.0], &[2.0, 3.0], 2, 2).unwrap();

        assert_eq!(hist.x_edges(), [0.5, 1.0, 1.5]);
        assert_eq!(hist.counts()[(1, 0)], 1);
        assert_eq!(hist.counts()[(1, 1)], 1);
    }

    #[test]
    fn non_finite_pairs_are_skipped() {
        let hist = Histogram2d::compute(&[1.0, f32::NAN, 2.0], &[0.0, 1.0, 1.0], 2, 2).unwrap();
        assert_eq!(hist.counts().sum(), 2);
    }

    #[test]
    fn mismatched_columns_fail() {
        assert!(Histogram2d::compute(&[1.0], &[], 2, 2).is_err());
        assert!(Histogram2d::compute(&[1.0], &[1.0], 0, 2).is_err());
    }

    #[test]
    fn render_shows_titles_and_densest_cell() {
        let hist = Histogram2d::compute(&[500.0, 500.0, 900.0], &[0.0, 0.0, 2.0], 3, 3).unwrap();
        let plot = hist.render(&Labels::new("HRS", "Soreness"));

        assert!(plot.starts_with("[Mouse Fatigue Estimation by HRS]"));
        assert!(plot.contains("HRS"));
        assert!(plot.contains("Soreness"));
        assert!(plot.contains("@@"));
        assert!(plot.contains("colour bar:"));
    }
}
