//! The public build/query surface: `RankRectIndex`.
//!
//! Grounded on the teacher's `Abkve`/`AbkveInner` split — a thin
//! `RwLock`-guarded wrapper around an inner, unsynchronized store. Build
//! and destroy are exclusive; queries only ever take a read lock, so
//! multiple readers can query concurrently (spec §5).

use std::io::{self, Read, Write};

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::builder;
use crate::chunk::Chunk;
use crate::config::{BuildConfig, MAX_K};
use crate::point::{Point, PtRec, Rect};
use crate::results::Results;

#[derive(Debug, Error)]
pub enum Error {
    #[error("requested k={requested} exceeds the maximum supported k={max}")]
    KTooLarge { requested: usize, max: usize },
    #[error("output buffer has capacity {have}, need at least {need}")]
    OutputBufferTooSmall { have: usize, need: usize },
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// A static, read-only spatial index over a rank-ordered point set.
///
/// Build once (`RankRectIndex::build`), then query many times
/// (`search`/`search_parallel`). Queries never mutate the index: repeated
/// identical queries return byte-identical output, and serializing the
/// index before and after a query yields identical bytes.
pub struct RankRectIndex {
    inner: RwLock<IndexInner>,
}

#[derive(Serialize, Deserialize)]
struct IndexInner {
    points: Vec<PtRec>,
    chunks: Vec<Chunk>,
}

impl RankRectIndex {
    /// Build an index from an immutable sequence of points. Empty input
    /// yields a valid index that always returns zero results.
    pub fn build(points: impl IntoIterator<Item = Point>) -> Self {
        Self::build_with_config(points, &BuildConfig::default())
    }

    /// Build with explicit splitter tuning constants.
    pub fn build_with_config(points: impl IntoIterator<Item = Point>, config: &BuildConfig) -> Self {
        let ptrecs: Vec<PtRec> = points.into_iter().map(PtRec::from).collect();
        let n = ptrecs.len();
        info!(n_points = n, "building index");
        let output = builder::build(ptrecs, config);
        debug!(n_chunks = output.chunks.len(), "index build complete");
        RankRectIndex {
            inner: RwLock::new(IndexInner {
                points: output.points,
                chunks: output.chunks,
            }),
        }
    }

    /// Run one query: write up to `k` points (ascending rank) into `out`,
    /// return the count written. `out` must have capacity >= `k`.
    pub fn search(&self, rect: Rect, k: usize, out: &mut [Point]) -> Result<usize, Error> {
        validate_query(k, out.len())?;
        if k == 0 {
            return Ok(0);
        }

        let inner = self.inner.read();
        let query_exc = rect.to_half_open();
        let mut results = Results::new(k);

        for chunk in &inner.chunks {
            if chunk.best_rank > results.worst_rank() {
                // Chunk table is rank-sorted: every remaining chunk is
                // also worse, so we can stop the whole traversal.
                break;
            }
            if !chunk.overlaps(&query_exc) {
                continue;
            }
            if chunk.contained(&query_exc) {
                chunk.admit_all(&inner.points, k, &mut results);
            } else {
                chunk.scan(&inner.points, &query_exc, &mut results);
            }
        }

        Ok(results.drain(out))
    }

    /// Parallel variant: each chunk's scan runs independently (read-only,
    /// no shared mutable state), partial result sets are merged at the
    /// end. Preferred once the chunk table is large enough to amortize
    /// the per-chunk dispatch cost.
    pub fn search_parallel(&self, rect: Rect, k: usize, out: &mut [Point]) -> Result<usize, Error> {
        validate_query(k, out.len())?;
        if k == 0 {
            return Ok(0);
        }

        let inner = self.inner.read();
        let query_exc = rect.to_half_open();

        let merged = inner
            .chunks
            .par_iter()
            .filter(|c| c.overlaps(&query_exc))
            .map(|chunk| {
                let mut local = Results::new(k);
                if chunk.contained(&query_exc) {
                    chunk.admit_all(&inner.points, k, &mut local);
                } else {
                    chunk.scan(&inner.points, &query_exc, &mut local);
                }
                let mut buf = vec![
                    Point {
                        id: 0,
                        rank: 0,
                        x: 0.0,
                        y: 0.0
                    };
                    k
                ];
                let n = local.drain(&mut buf);
                buf.truncate(n);
                buf
            })
            .reduce(Vec::new, |mut a, b| {
                a.extend(b);
                a
            });

        // Merge order doesn't matter: `admit` inserts in sorted position
        // regardless of arrival order, so feeding per-chunk winners in
        // any order still yields the correct global top-k.
        let mut results = Results::new(k);
        for p in merged {
            results.admit(PtRec::from(p));
        }

        Ok(results.drain(out))
    }

    /// Number of points in the index.
    pub fn len(&self) -> usize {
        self.inner.read().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the whole index (points, chunk table, coordinate mirrors).
    pub fn save<W: Write>(&self, writer: W) -> Result<(), Error> {
        let inner = self.inner.read();
        bincode::serialize_into(writer, &*inner).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a previously-saved index.
    pub fn load<R: Read>(reader: R) -> Result<Self, Error> {
        let inner: IndexInner =
            bincode::deserialize_from(reader).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(RankRectIndex {
            inner: RwLock::new(inner),
        })
    }
}

fn validate_query(k: usize, out_len: usize) -> Result<(), Error> {
    if k > MAX_K {
        return Err(Error::KTooLarge {
            requested: k,
            max: MAX_K,
        });
    }
    if out_len < k {
        return Err(Error::OutputBufferTooSmall {
            have: out_len,
            need: k,
        });
    }
    Ok(())
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(id: i8, rank: i32, x: f32, y: f32) -> Point {
        Point { id, rank, x, y }
    }

    #[test]
    fn scenario_a() {
        let idx = RankRectIndex::build(vec![
            pt(1, 10, 0.0, 0.0),
            pt(2, 5, 1.0, 1.0),
            pt(3, 7, 2.0, 2.0),
        ]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); 10];
        let n = idx
            .search(
                Rect {
                    lx: 0.0,
                    ly: 0.0,
                    hx: 1.0,
                    hy: 1.0,
                },
                10,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(out[0].id, 2);
        assert_eq!(out[1].id, 1);
    }

    #[test]
    fn scenario_b() {
        let idx = RankRectIndex::build(vec![
            pt(1, 10, 0.0, 0.0),
            pt(2, 5, 1.0, 1.0),
            pt(3, 7, 2.0, 2.0),
        ]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); 2];
        let n = idx
            .search(
                Rect {
                    lx: 0.0,
                    ly: 0.0,
                    hx: 2.0,
                    hy: 2.0,
                },
                2,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(out[0].id, 2);
        assert_eq!(out[1].id, 3);
    }

    #[test]
    fn scenario_c() {
        let idx = RankRectIndex::build(vec![
            pt(1, 10, 0.0, 0.0),
            pt(2, 5, 1.0, 1.0),
            pt(3, 7, 2.0, 2.0),
        ]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); 5];
        let n = idx
            .search(
                Rect {
                    lx: 1.0001,
                    ly: 1.0001,
                    hx: 2.0,
                    hy: 2.0,
                },
                5,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(out[0].id, 3);
    }

    #[test]
    fn scenario_d_degenerate_point_rect() {
        let idx = RankRectIndex::build(vec![pt(9, 0, 0.0, 0.0)]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); 5];
        let n = idx
            .search(
                Rect {
                    lx: 0.0,
                    ly: 0.0,
                    hx: 0.0,
                    hy: 0.0,
                },
                5,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(out[0].id, 9);
    }

    #[test]
    fn scenario_e_empty_index() {
        let idx = RankRectIndex::build(Vec::new());
        let mut out = vec![pt(0, 0, 0.0, 0.0); 5];
        let n = idx
            .search(
                Rect {
                    lx: -1e9,
                    ly: -1e9,
                    hx: 1e9,
                    hy: 1e9,
                },
                5,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn inverted_rect_returns_zero() {
        let idx = RankRectIndex::build(vec![pt(1, 0, 0.0, 0.0)]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); 5];
        let n = idx
            .search(
                Rect {
                    lx: 5.0,
                    ly: 5.0,
                    hx: -5.0,
                    hy: -5.0,
                },
                5,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn k_zero_returns_zero() {
        let idx = RankRectIndex::build(vec![pt(1, 0, 0.0, 0.0)]);
        let mut out: Vec<Point> = Vec::new();
        let n = idx
            .search(
                Rect {
                    lx: -1.0,
                    ly: -1.0,
                    hx: 1.0,
                    hy: 1.0,
                },
                0,
                &mut out,
            )
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn k_too_large_rejected() {
        let idx = RankRectIndex::build(vec![pt(1, 0, 0.0, 0.0)]);
        let mut out = vec![pt(0, 0, 0.0, 0.0); MAX_K + 1];
        let err = idx
            .search(
                Rect {
                    lx: -1.0,
                    ly: -1.0,
                    hx: 1.0,
                    hy: 1.0,
                },
                MAX_K + 1,
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(err, Error::KTooLarge { .. }));
    }

    #[test]
    fn save_load_roundtrip() {
        let idx = RankRectIndex::build(vec![
            pt(1, 10, 0.0, 0.0),
            pt(2, 5, 1.0, 1.0),
            pt(3, 7, 2.0, 2.0),
        ]);
        let mut buf = Vec::new();
        idx.save(&mut buf).unwrap();
        let loaded = RankRectIndex::load(buf.as_slice()).unwrap();
        assert_eq!(loaded.len(), 3);

        let mut out_a = vec![pt(0, 0, 0.0, 0.0); 10];
        let mut out_b = vec![pt(0, 0, 0.0, 0.0); 10];
        let rect = Rect {
            lx: -1.0,
            ly: -1.0,
            hx: 5.0,
            hy: 5.0,
        };
        let na = idx.search(rect, 10, &mut out_a).unwrap();
        let nb = loaded.search(rect, 10, &mut out_b).unwrap();
        assert_eq!(na, nb);
        assert_eq!(out_a[..na], out_b[..nb]);
    }

    #[test]
    fn query_does_not_mutate_index() {
        let idx = RankRectIndex::build(vec![
            pt(1, 10, 0.0, 0.0),
            pt(2, 5, 1.0, 1.0),
            pt(3, 7, 2.0, 2.0),
        ]);
        let mut before = Vec::new();
        idx.save(&mut before).unwrap();

        let mut out = vec![pt(0, 0, 0.0, 0.0); 10];
        idx.search(
            Rect {
                lx: -1.0,
                ly: -1.0,
                hx: 5.0,
                hy: 5.0,
            },
            10,
            &mut out,
        )
        .unwrap();

        let mut after = Vec::new();
        idx.save(&mut after).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn sequential_and_parallel_search_agree() {
        let pts: Vec<Point> = (0..300)
            .map(|i| pt(0, i as i32, (i % 17) as f32, (i % 13) as f32))
            .collect();
        let idx = RankRectIndex::build(pts);
        let rect = Rect {
            lx: 0.0,
            ly: 0.0,
            hx: 16.0,
            hy: 12.0,
        };

        let mut seq_out = vec![pt(0, 0, 0.0, 0.0); 20];
        let mut par_out = vec![pt(0, 0, 0.0, 0.0); 20];
        let n_seq = idx.search(rect, 20, &mut seq_out).unwrap();
        let n_par = idx.search_parallel(rect, 20, &mut par_out).unwrap();
        assert_eq!(n_seq, n_par);
        assert_eq!(seq_out[..n_seq], par_out[..n_par]);
    }
}
