use crate::analysis::stats::{nullity_distance, nullity_indicator, pearson};
use crate::error::Result;
use crate::table::Table;
use polars::prelude::*;

/// Where values are absent in a table, plus the derived column relationships
/// drawn by the missing-data plots.
#[derive(Debug, Clone)]
pub struct MissingSummary {
    pub columns: Vec<String>,
    pub row_count: usize,
    /// `present[row][column]`
    pub present: Vec<Vec<bool>>,
    /// Non-missing cells per column
    pub present_counts: Vec<usize>,
    /// Nullity correlation; `None` unless both columns are partially missing
    pub correlation: Vec<Vec<Option<f64>>>,
    pub dendrogram: Dendrogram,
}

/// One agglomeration step. Ids below the column count are columns; step `k`
/// creates cluster `column_count + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dendrogram {
    pub merges: Vec<Merge>,
    /// Columns left to right as the tree is drawn
    pub leaf_order: Vec<usize>,
}

impl MissingSummary {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns with at least one missing and at least one present value
    pub fn is_partial(&self, column: usize) -> bool {
        let present = self.present_counts[column];
        present > 0 && present < self.row_count
    }
}

pub fn analyze_missing(table: &Table) -> Result<MissingSummary> {
    let frame = table.frame();
    let row_count = frame.height();
    let series: Vec<&Series> = frame
        .get_columns()
        .iter()
        .map(Column::as_materialized_series)
        .collect();

    let presence: Vec<BooleanChunked> = series.iter().map(|s| s.is_not_null()).collect();
    let present_counts: Vec<usize> = series.iter().map(|s| row_count - s.null_count()).collect();
    let present: Vec<Vec<bool>> = (0..row_count)
        .map(|row| {
            presence
                .iter()
                .map(|column| column.get(row).unwrap_or(false))
                .collect()
        })
        .collect();

    let column_count = series.len();
    let partial: Vec<bool> = present_counts
        .iter()
        .map(|&count| count > 0 && count < row_count)
        .collect();

    // Missing indicators (1.0 = missing), only needed for partial columns
    let indicators: Vec<Option<Float64Chunked>> = series
        .iter()
        .zip(&partial)
        .map(|(s, &is_partial)| is_partial.then(|| nullity_indicator(s)).transpose())
        .collect::<Result<_>>()?;

    let mut correlation = vec![vec![None; column_count]; column_count];
    for i in 0..column_count {
        for j in 0..column_count {
            if let (Some(a), Some(b)) = (&indicators[i], &indicators[j]) {
                correlation[i][j] = pearson(a, b)?;
            }
        }
    }

    let mut distances = vec![vec![0.0; column_count]; column_count];
    for i in 0..column_count {
        for j in (i + 1)..column_count {
            let d = nullity_distance(&presence[i], &presence[j]);
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }

    Ok(MissingSummary {
        columns: table.columns(),
        row_count,
        present,
        present_counts,
        correlation,
        dendrogram: cluster_columns(&distances),
    })
}

/// Average-linkage agglomerative clustering over a symmetric matrix of
/// leaf distances.
///
/// Ties go to the lowest pair of cluster ids.
pub fn cluster_columns(leaf_distance: &[Vec<f64>]) -> Dendrogram {
    let n = leaf_distance.len();
    if n == 0 {
        return Dendrogram::default();
    }

    // (cluster id, member leaves)
    let mut active: Vec<(usize, Vec<usize>)> = (0..n).map(|i| (i, vec![i])).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    while active.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for a in 0..active.len() {
            for b in (a + 1)..active.len() {
                let d = average_distance(leaf_distance, &active[a].1, &active[b].1);
                let better = match best {
                    None => true,
                    Some((_, _, best_d)) => d < best_d,
                };
                if better {
                    best = Some((a, b, d));
                }
            }
        }

        let Some((a, b, distance)) = best else { break };
        // b > a, so removing b first keeps a's index valid
        let (right_id, right_members) = active.remove(b);
        let (left_id, left_members) = active.remove(a);
        let mut members = left_members;
        members.extend(right_members);

        let id = n + merges.len();
        merges.push(Merge {
            left: left_id,
            right: right_id,
            distance,
            size: members.len(),
        });
        active.push((id, members));
    }

    let leaf_order = leaf_order(n, &merges);
    Dendrogram { merges, leaf_order }
}

fn average_distance(leaf_distance: &[Vec<f64>], left: &[usize], right: &[usize]) -> f64 {
    let mut total = 0.0;
    for &l in left {
        for &r in right {
            total += leaf_distance[l][r];
        }
    }
    total / (left.len() * right.len()) as f64
}

fn leaf_order(n: usize, merges: &[Merge]) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n).collect();
    }
    let mut order = Vec::with_capacity(n);
    let mut stack = vec![n + merges.len() - 1];
    while let Some(id) = stack.pop() {
        if id < n {
            order.push(id);
        } else {
            let merge = &merges[id - n];
            // Right pushed first so the left subtree is emitted first
            stack.push(merge.right);
            stack.push(merge.left);
        }
    }
    order
}
