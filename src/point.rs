//! Point records: the caller-visible wire format and the internal,
//! alignment-padded record the index actually stores and sorts.

use serde::{Deserialize, Serialize};

/// Sentinel rank marking an empty `Results` slot. Never emitted as output.
pub const SENTINEL_RANK: i32 = i32::MAX;

/// Caller-visible point record, bit-compatible with the external wire
/// format described in the interface spec: `{id, rank, x, y}`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: i8,
    pub rank: i32,
    pub x: f32,
    pub y: f32,
}

/// A closed axis-aligned query rectangle: `lx <= x <= hx`, `ly <= y <= hy`.
/// `lx > hx` or `ly > hy` is a valid, degenerate rectangle matching zero
/// points.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub lx: f32,
    pub ly: f32,
    pub hx: f32,
    pub hy: f32,
}

impl Rect {
    /// Convert this closed rectangle into its half-open form by bumping
    /// `hx`/`hy` to the next representable f32. All internal membership
    /// tests use this half-open form so they can use strict `<`.
    pub(crate) fn to_half_open(self) -> Rect {
        Rect {
            lx: self.lx,
            ly: self.ly,
            hx: next_up(self.hx),
            hy: next_up(self.hy),
        }
    }
}

/// Smallest f32 strictly greater than `x` (`+inf`/`NaN` pass through).
/// Rust's `f32::next_up` stabilized in 1.86; we keep a hand-rolled
/// version here to match the exact semantics `_nextafterf(x, FLT_MAX)`
/// has in the reference implementation without pinning an MSRV.
pub(crate) fn next_up(x: f32) -> f32 {
    if x.is_nan() || x == f32::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f32::from_bits(1);
    }
    let bits = x.to_bits();
    let next = if x > 0.0 { bits + 1 } else { bits - 1 };
    f32::from_bits(next)
}

/// Internal, alignment-padded point record. A single aligned 16-byte load
/// brings in the whole record: `rank: i32, id: i32 (narrowed from i8),
/// x: f32, y: f32`.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PtRec {
    pub rank: i32,
    pub id: i32,
    pub x: f32,
    pub y: f32,
}

impl PtRec {
    pub fn sentinel() -> Self {
        PtRec {
            rank: SENTINEL_RANK,
            id: 0,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.rank == SENTINEL_RANK
    }

    /// Write this record out as a caller-facing `Point`, returning `false`
    /// without writing if this is a sentinel.
    pub fn write_to_point(&self, out: &mut Point) -> bool {
        if self.is_sentinel() {
            return false;
        }
        out.id = self.id as i8;
        out.rank = self.rank;
        out.x = self.x;
        out.y = self.y;
        true
    }
}

impl From<Point> for PtRec {
    fn from(p: Point) -> Self {
        PtRec {
            rank: p.rank,
            id: p.id as i32,
            x: p.x,
            y: p.y,
        }
    }
}
