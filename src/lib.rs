//! # rankrect — static rank-ordered rectangle top-K index
//!
//! ## Problem
//!
//! Given a static set of 2D points, each carrying a globally unique `i32`
//! rank (smaller is better), find the K lowest-rank points inside an
//! axis-aligned query rectangle. Construction happens once; queries are
//! many, latency-critical, and read-only.
//!
//! ## Memory layout: chunks over one contiguous point array
//!
//! All points live in a single `Vec<PtRec>`. A naive per-point tree
//! (k-d tree, quadtree) chases pointers: each descent is a fresh heap
//! address, thrashing the cache. Instead this index partitions the array
//! into a flat table of `Chunk`s — contiguous ranges, each internally
//! sorted by rank and tagged with a cached bounding rectangle. A chunk
//! scan walks its coordinate mirror (a parallel `Vec<Xy>`, 8 bytes per
//! point) sequentially, so the inner loop never leaves the chunk's own
//! cache lines.
//!
//! ## Why `#[repr(align(16))]` and two bounding-rect variants
//!
//! Every `Chunk` caches both an exclusive rectangle (`hx`/`hy` bumped to
//! the next representable f32, used for the half-open overlap test) and
//! an inclusive rectangle (true maxima, used for the containment test).
//! Both are laid out as 16-byte-aligned four-float records so the
//! overlap/containment predicates read as four scalar comparisons that
//! map directly onto a single packed load, whether or not SIMD is
//! actually used for the comparison.
//!
//! ## Pruning order
//!
//! The chunk table is sorted ascending by each chunk's best (smallest)
//! rank. A query walks it in that order, applying three gates per chunk:
//! a best-rank gate (stop once no later chunk can beat the current
//! worst-admitted rank), an overlap test, and a containment test. Only
//! chunks that overlap but aren't fully contained fall through to the
//! per-point scan.
//!
//! ## No allocation on the query path
//!
//! `search`/`search_parallel` never allocate: the `Results` accumulator is
//! a fixed-size stack buffer sized to the caller's `k`, and chunk/point/
//! mirror storage is read-only after build.
//!
//! ## Global allocator
//!
//! `mimalloc` replaces the system allocator for the whole process. Build
//! makes many small allocations (one `Vec<Xy>` mirror per chunk); its
//! per-thread, size-segregated free lists keep that cheap without
//! affecting the (allocation-free) query path.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod builder;
mod chunk;
mod config;
mod index;
mod point;
mod results;

pub use config::{BuildConfig, MAX_K};
pub use index::{Error, RankRectIndex};
pub use point::{Point, Rect};
