//! Equal-width and explicit-edge histograms with density normalisation.
//!
//! Bin assignment reproduces numpy: `histogram` uses its uniform fast path
//! (with the same edge corrections), `histogram_2d` uses `histogramdd`'s
//! search-sorted assignment. In both the last bin is closed on the right.

use ndarray::{Array1, Array2};

/// `bins + 1` equally spaced edges from `lo` to `hi`, last edge exactly `hi`.
///
/// A zero-width range is widened to `[lo - 0.5, hi + 0.5]`.
pub fn uniform_edges(lo: f64, hi: f64, bins: usize) -> Array1<f64> {
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let step = (hi - lo) / bins as f64;
    let mut edges: Array1<f64> = (0..=bins).map(|i| i as f64 * step + lo).collect();
    edges[bins] = hi;
    edges
}

/// Bin centres, the midpoints of consecutive edges.
pub fn bin_centers(edges: &Array1<f64>) -> Array1<f64> {
    edges
        .windows(2)
        .into_iter()
        .map(|w| (w[0] + w[1]) / 2.0)
        .collect()
}

/// Bin of `value` among equally spaced `edges`, or `None` outside them.
fn uniform_bin(value: f64, edges: &Array1<f64>) -> Option<usize> {
    let bins = edges.len() - 1;
    let first = edges[0];
    let last = edges[bins];
    if !(value >= first && value <= last) {
        return None;
    }
    let mut index = ((value - first) / (last - first) * bins as f64) as usize;
    if index == bins {
        index -= 1;
    }
    // floating point can land one bin off the true edge
    if value < edges[index] {
        index -= 1;
    } else if index != bins - 1 && value >= edges[index + 1] {
        index += 1;
    }
    Some(index)
}

/// Bin of `value` among sorted `edges`, last edge inclusive.
fn sorted_bin(value: f64, edges: &[f64]) -> Option<usize> {
    let n_edges = edges.len();
    let mut count = edges.partition_point(|&e| e <= value);
    if value == edges[n_edges - 1] {
        count -= 1;
    }
    if count == 0 || count == n_edges {
        return None;
    }
    Some(count - 1)
}

/// Raw counts of `values` over `bins` equal-width bins spanning `[lo, hi]`.
///
/// Returns the counts and the `bins + 1` edges.
pub fn histogram(values: &Array1<f64>, bins: usize, lo: f64, hi: f64) -> (Array1<f64>, Array1<f64>) {
    let edges = uniform_edges(lo, hi, bins);
    let mut counts = Array1::<f64>::zeros(bins);
    for &v in values {
        if let Some(i) = uniform_bin(v, &edges) {
            counts[i] += 1.0;
        }
    }
    (counts, edges)
}

/// Scales counts so that `sum(density * bin_width) == 1`.
pub fn to_density(counts: &Array1<f64>, edges: &Array1<f64>) -> Array1<f64> {
    let total = counts.sum();
    counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| c / total / (w[1] - w[0]))
        .collect()
}

/// Raw 2D counts of paired samples over the given edges, shaped
/// `(x_edges.len() - 1, y_edges.len() - 1)`. Pairs outside either edge set are
/// dropped.
pub fn histogram_2d(
    x: &Array1<f64>,
    y: &Array1<f64>,
    x_edges: &Array1<f64>,
    y_edges: &Array1<f64>,
) -> Array2<f64> {
    let mut counts = Array2::<f64>::zeros((x_edges.len() - 1, y_edges.len() - 1));
    let (x_edges, y_edges) = (x_edges.to_vec(), y_edges.to_vec());
    for (&xv, &yv) in x.iter().zip(y.iter()) {
        if let (Some(i), Some(j)) = (sorted_bin(xv, &x_edges), sorted_bin(yv, &y_edges)) {
            counts[[i, j]] += 1.0;
        }
    }
    counts
}

/// Scales 2D counts so that they integrate to one over the cell areas.
pub fn to_density_2d(
    counts: &Array2<f64>,
    x_edges: &Array1<f64>,
    y_edges: &Array1<f64>,
) -> Array2<f64> {
    let total = counts.sum();
    let mut density = counts / total;
    for ((i, j), d) in density.indexed_iter_mut() {
        *d /= (x_edges[i + 1] - x_edges[i]) * (y_edges[j + 1] - y_edges[j]);
    }
    density
}
