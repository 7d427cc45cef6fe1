//! Splits the full point array into rank-sorted, coordinate-bounded chunks.
//!
//! Mirrors `original_source/dll.cpp`'s `SearchContext` constructor and
//! `splitAll`/`splitEqualPointsOnX`/`splitEqualPointsOnY`. The original's
//! `goto nosplitX`/`nosplitY` bailout becomes a single conditional at the
//! bottom of `bisect`: emit one unsplit chunk, or two, depending on
//! whether a valid split point was found.

use tracing::debug;

use crate::chunk::{Chunk, SortOrder};
use crate::config::BuildConfig;
use crate::point::PtRec;

pub(crate) struct BuildOutput {
    pub points: Vec<PtRec>,
    pub chunks: Vec<Chunk>,
}

/// Axis a bisection pass splits on.
#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn coord(self, p: &PtRec) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    fn sort_order(self) -> SortOrder {
        match self {
            Axis::X => SortOrder::X,
            Axis::Y => SortOrder::Y,
        }
    }
}

pub(crate) fn build(points: Vec<PtRec>, config: &BuildConfig) -> BuildOutput {
    let n = points.len();
    if n == 0 {
        return BuildOutput {
            points,
            chunks: Vec::new(),
        };
    }

    let mut points = points;
    let mut chunks = vec![Chunk::new(&points, 0, n, SortOrder::None)];

    for _ in 0..config.x_splits {
        chunks = split_pass(chunks, &mut points, Axis::X, config.split_threshold);
    }
    for _ in 0..config.y_splits {
        chunks = split_pass(chunks, &mut points, Axis::Y, config.split_threshold);
    }

    debug!(chunk_count = chunks.len(), n_points = n, "split pass complete");

    for c in &mut chunks {
        c.update_rect(&points);
        c.update_rank(&mut points);
    }

    chunks.sort_unstable_by_key(|c| c.best_rank);

    for c in &mut chunks {
        c.build_mirror(&points);
    }

    BuildOutput { points, chunks }
}

fn split_pass(chunks: Vec<Chunk>, points: &mut [PtRec], axis: Axis, threshold: usize) -> Vec<Chunk> {
    let mut out = Vec::with_capacity(chunks.len());
    for c in chunks {
        if c.size() > threshold {
            bisect(c, points, axis, &mut out);
        } else {
            out.push(c);
        }
    }
    out
}

/// Bisect `c` along `axis`. Sorts `c`'s range by `axis` first if it isn't
/// already. Finds the median index and advances past any run of points
/// sharing the same coordinate, so equal coordinates never straddle the
/// split — required for the half-open overlap predicates to stay exact.
/// If no valid split point exists (all-equal axis, or the scan runs off
/// the end), `c` is kept unchanged.
fn bisect(mut c: Chunk, points: &mut [PtRec], axis: Axis, out: &mut Vec<Chunk>) {
    let want = axis.sort_order();
    if c.order != want {
        points[c.beg..c.end].sort_unstable_by(|a, b| axis.coord(a).partial_cmp(&axis.coord(b)).unwrap());
        c.order = want;
    }

    let first = axis.coord(&points[c.beg]);
    let last = axis.coord(&points[c.end - 1]);

    if last <= first {
        out.push(c);
        return;
    }

    let mut mid = c.beg + c.size() / 2;
    while mid + 1 < c.end && axis.coord(&points[mid]) == axis.coord(&points[mid + 1]) {
        mid += 1;
    }
    // advancing past equal-coordinate runs can push mid to end - 1 (last
    // valid split point) or past it if the whole upper half is one value.
    if mid + 1 >= c.end || mid == c.beg {
        out.push(c);
        return;
    }

    let split_at = mid + 1;
    out.push(Chunk::new(points, c.beg, split_at, want));
    out.push(Chunk::new(points, split_at, c.end, want));
}
