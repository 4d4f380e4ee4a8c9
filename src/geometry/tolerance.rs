// Centralized tolerances and traversal caps for robust geometry

pub const EPS_POS: f32 = 1e-4; // point coincidence threshold (world units)
pub const EPS_LEN: f32 = 1e-6; // zero-length vector threshold
pub const EPS_DENOM: f32 = 1e-8; // denominator guard for ratios
pub const EPS_AREA: f32 = 1e-2; // tiny polygon area threshold
pub const EPS_ANG: f32 = 1e-6; // angle compare slack (radians)

// Hard caps; traversals return a partial/empty result instead of hanging.
pub const MAX_TRACE_STEPS: usize = 512; // face-walk step cap
pub const MAX_CHAIN_NODES: usize = 64; // filament rewind/forward cap
pub const MAX_CLEANUP_ITERS: usize = 8; // graph-repair loop cap
pub const MAX_SUBDIVIDE_DEPTH: usize = 12; // lot-partition recursion cap

// Miter/offset guards
pub const MITER_LIMIT: f32 = 4.0; // bisector scale cap at sharp corners
pub const SHRINK_SPIKE_FACTOR: f32 = 3.0; // clamp offset corners past this multiple

#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

#[inline]
pub fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

#[inline]
pub fn near_zero(x: f32, eps: f32) -> bool {
    x.abs() <= eps
}
