//! Bounded best-K accumulator. Mirrors `original_source/dll.cpp`'s
//! `Results` class: a fixed-capacity, rank-sorted buffer whose last real
//! slot (`back`) caches the current admission threshold.

use crate::point::{Point, PtRec};

/// Accumulates the K lowest-rank points seen so far.
///
/// Backed by a `K`-slot buffer seeded with sentinels (reference:
/// `dll.cpp:91`, `back = front + nSize; --back;` — `back` is the last of
/// the `K` real slots, not a spare one beyond them). `worst_rank()` is
/// `buf[back].rank`, i.e. the rank of the current K-th best point.
///
/// `K = 0` is handled with a single scratch slot that is never drained,
/// matching the reference's behaviour of always allocating at least one
/// slot regardless of the requested count.
pub(crate) struct Results {
    buf: Vec<PtRec>,
    k: usize,
    back: usize,
    worst_rank: i32,
}

impl Results {
    pub fn new(k: usize) -> Self {
        let cap = k.max(1);
        let buf = vec![PtRec::sentinel(); cap];
        let back = cap - 1;
        let worst_rank = buf[back].rank;
        Results {
            buf,
            k,
            back,
            worst_rank,
        }
    }

    /// Current worst admitted rank; `i32::MAX` while fewer than `k` real
    /// points have been admitted.
    #[inline]
    pub fn worst_rank(&self) -> i32 {
        self.worst_rank
    }

    /// Try to admit `p`. Returns `false` (and does nothing) if `p.rank` is
    /// not strictly better than the current worst admitted rank.
    ///
    /// Because chunks are scanned in ascending rank order, the first
    /// rejection within a chunk proves every later point in that chunk is
    /// also rejected — that's the caller's early-termination signal.
    #[inline]
    pub fn admit(&mut self, p: PtRec) -> bool {
        if p.rank >= self.worst_rank {
            return false;
        }

        let pos = self.buf[..self.back].partition_point(|r| r.rank < p.rank);
        self.buf.copy_within(pos..self.back, pos + 1);
        self.buf[pos] = p;
        self.worst_rank = self.buf[self.back].rank;
        true
    }

    /// Write up to `k` admitted records into `out`, skipping sentinels.
    /// Returns the number written.
    pub fn drain(&self, out: &mut [Point]) -> usize {
        let mut n = 0;
        for rec in &self.buf[..self.k] {
            if n >= out.len() {
                break;
            }
            if rec.write_to_point(&mut out[n]) {
                n += 1;
            } else {
                break;
            }
        }
        n
    }
}
