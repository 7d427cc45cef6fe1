//! A `Chunk` is a contiguous, rank-sorted subrange of the point array, with
//! a cached bounding rectangle (two variants) and a parallel coordinate-only
//! mirror used by the per-point rectangle scan.

use serde::{Deserialize, Serialize};

use crate::point::{next_up, PtRec, Rect};
use crate::results::Results;

/// Which coordinate a chunk's point range is currently sorted by. Lets the
/// splitter skip a redundant sort when a chunk is already ordered on the
/// axis it's about to split on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum SortOrder {
    X,
    Y,
    Rank,
    None,
}

/// `(x, y)` pair mirroring a `PtRec`'s coordinates, 8 bytes, used to feed
/// the packed rectangle scan without touching full `PtRec`s.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Xy {
    pub x: f32,
    pub y: f32,
}

/// A chunk's bounding rectangle fields, laid out first in `Chunk` with
/// 16-byte alignment so the overlap/containment predicates can load all
/// four floats from one aligned base.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct Bounds {
    /// Exclusive bounding rect: `hx`/`hy` are the next representable f32
    /// after the true maxima, so membership is `lx <= x < hx`.
    rc_exc: Rect,
    /// Inclusive bounding rect: true minima/maxima.
    rc_inc: Rect,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Chunk {
    bounds: Bounds,
    /// Range into the index's point array, `[beg, end)`.
    pub beg: usize,
    pub end: usize,
    /// Best (smallest) rank among this chunk's points; equals the first
    /// point's rank once the chunk is rank-sorted.
    pub best_rank: i32,
    pub order: SortOrder,
    /// Coordinate mirror, same order as the points in `[beg, end)`.
    pub mirror: Vec<Xy>,
}

impl Chunk {
    /// Build a chunk over `points[beg..end]`, computing its bounding
    /// rectangle immediately. `order` records what axis, if any, the
    /// range is already sorted by.
    pub fn new(points: &[PtRec], beg: usize, end: usize, order: SortOrder) -> Self {
        let bounds = Self::compute_bounds(&points[beg..end]);
        Chunk {
            bounds,
            beg,
            end,
            best_rank: i32::MAX,
            order,
            mirror: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.end - self.beg
    }

    fn compute_bounds(pts: &[PtRec]) -> Bounds {
        let mut lx = f32::INFINITY;
        let mut ly = f32::INFINITY;
        let mut hx = f32::NEG_INFINITY;
        let mut hy = f32::NEG_INFINITY;
        for p in pts {
            lx = lx.min(p.x);
            ly = ly.min(p.y);
            hx = hx.max(p.x);
            hy = hy.max(p.y);
        }
        let rc_inc = Rect { lx, ly, hx, hy };
        let rc_exc = Rect {
            lx,
            ly,
            hx: next_up(hx),
            hy: next_up(hy),
        };
        Bounds { rc_exc, rc_inc }
    }

    /// Recompute the cached bounding rectangle from `points[self.beg..self.end]`.
    pub fn update_rect(&mut self, points: &[PtRec]) {
        self.bounds = Self::compute_bounds(&points[self.beg..self.end]);
    }

    /// Sort this chunk's range by rank and cache the resulting best rank.
    pub fn update_rank(&mut self, points: &mut [PtRec]) {
        points[self.beg..self.end].sort_unstable_by_key(|p| p.rank);
        self.order = SortOrder::Rank;
        self.best_rank = points[self.beg].rank;
    }

    /// Populate the coordinate mirror from the (already rank-sorted) points.
    pub fn build_mirror(&mut self, points: &[PtRec]) {
        self.mirror = points[self.beg..self.end]
            .iter()
            .map(|p| Xy { x: p.x, y: p.y })
            .collect();
    }

    /// Does this chunk's tight bounding box intersect the half-open query
    /// rectangle?
    #[inline]
    pub fn overlaps(&self, query_exc: &Rect) -> bool {
        let c = &self.bounds.rc_exc;
        c.lx < query_exc.hx && c.ly < query_exc.hy && c.hx > query_exc.lx && c.hy > query_exc.ly
    }

    /// Is this chunk's inclusive box entirely inside the half-open query
    /// rectangle? If true, every point in the chunk matches and the
    /// per-point scan can be skipped.
    #[inline]
    pub fn contained(&self, query_exc: &Rect) -> bool {
        let c = &self.bounds.rc_inc;
        c.lx >= query_exc.lx && c.ly >= query_exc.ly && c.hx < query_exc.hx && c.hy < query_exc.hy
    }

    /// Admit every point in this chunk (rank order) up to `min(size, k)`
    /// or until `Results::admit` rejects one, whichever comes first. Used
    /// on the containment fast path, where no per-point geometry test is
    /// needed.
    pub fn admit_all(&self, points: &[PtRec], k: usize, results: &mut Results) {
        let n = self.size().min(k);
        for p in &points[self.beg..self.beg + n] {
            if !results.admit(*p) {
                break;
            }
        }
    }

    /// Scan this chunk's coordinate mirror against `query_exc`, admitting
    /// every point whose coordinates fall inside. Points are visited in
    /// ascending rank (index) order so that the first rejection proves
    /// every later point in the chunk is also rejected.
    pub fn scan(&self, points: &[PtRec], query_exc: &Rect, results: &mut Results) {
        let pts = &points[self.beg..self.end];
        for (i, xy) in self.mirror.iter().enumerate() {
            let inside = xy.x < query_exc.hx
                && xy.y < query_exc.hy
                && xy.x >= query_exc.lx
                && xy.y >= query_exc.ly;
            if inside && !results.admit(pts[i]) {
                break;
            }
        }
    }
}
