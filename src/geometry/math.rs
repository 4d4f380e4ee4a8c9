use crate::model::Vec2;

use super::tolerance::EPS_DENOM;

/// Squared distance from `p` to segment `a..b` plus the clamped parameter.
pub fn seg_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> (f32, f32) {
    let v = b - a;
    let w = p - a;
    let vv = v.length_sq();
    let mut t = if vv > 0.0 { w.dot(v) / vv } else { 0.0 };
    if t < 0.0 {
        t = 0.0;
    } else if t > 1.0 {
        t = 1.0;
    }
    let proj = a + v * t;
    ((p - proj).length_sq(), t)
}

pub fn dist_point_to_seg(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    seg_distance_sq(p, a, b).0.sqrt()
}

/// Smallest signed difference `a - b`, normalized to (-pi, pi].
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let mut d = a - b;
    while d > std::f32::consts::PI {
        d -= std::f32::consts::TAU;
    }
    while d <= -std::f32::consts::PI {
        d += std::f32::consts::TAU;
    }
    d
}

#[inline]
pub fn safe_div(num: f32, den: f32, fallback: f32) -> f32 {
    if den.abs() <= EPS_DENOM {
        fallback
    } else {
        num / den
    }
}

/// Deterministic per-index jitter in [0, 1). FNV-1a over both words, so the
/// same (index, salt) pair always produces the same value regardless of the
/// RNG stream position.
pub fn hash01(index: u32, salt: u32) -> f32 {
    let mut hash: u32 = 0x811C_9DC5;
    for b in index.to_le_bytes().iter().chain(salt.to_le_bytes().iter()) {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash >> 8) as f32 / (1u32 << 24) as f32
}
