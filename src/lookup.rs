//! Wave falloff lookup table.
//!
//! The orbital displacement shader weights each wave by an asymmetric
//! falloff curve over one phase cycle (fast drop after the crest, slow
//! recovery). Evaluating the piecewise interpolation per texel per wave
//! would be wasteful, so the curve is baked into a (size, 1) single-channel
//! texture and sampled instead.

use std::f32::consts::PI;

use crate::interp::lin_interp;

/// Phase-domain control points of the falloff curve.
const FALLOFF_X: [f32; 4] = [-PI, -PI / 3.0, 7.0 * PI / 8.0, PI];
const FALLOFF_Y: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Sample the falloff curve at `size` evenly spaced points across
/// phase in [-pi, pi].
pub fn lookup_samples(size: u32) -> Vec<f32> {
    assert!(size >= 2, "lookup table needs at least 2 samples");
    (0..size)
        .map(|i| {
            let t = i as f32 / (size - 1) as f32;
            let phase = -PI + 2.0 * PI * t;
            lin_interp(phase, &FALLOFF_X, &FALLOFF_Y)
        })
        .collect()
}

/// CPU side of the lookup table: caches the sampled curve and rebuilds only
/// when the requested size changes. The GPU texture upload is owned by the
/// displacement simulator, keyed off the rebuild count reported here.
#[derive(Debug, Default)]
pub struct LookupTableCache {
    size: u32,
    samples: Vec<f32>,
    rebuilds: u32,
}

impl LookupTableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the cached table match `size`. Returns true when the table was
    /// rebuilt. Requests below 2 samples are ignored and the prior table,
    /// if any, stays in place.
    pub fn ensure(&mut self, size: u32) -> bool {
        if size < 2 {
            return false;
        }
        if !self.samples.is_empty() && self.size == size {
            return false;
        }
        self.size = size;
        self.samples = lookup_samples(size);
        self.rebuilds += 1;
        true
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples quantized to 8-bit for the R8Unorm lookup texture.
    pub fn samples_u8(&self) -> Vec<u8> {
        self.samples
            .iter()
            .map(|s| (s.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    pub fn is_built(&self) -> bool {
        !self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_matches_size() {
        assert_eq!(lookup_samples(5).len(), 5);
        assert_eq!(lookup_samples(128).len(), 128);
    }

    #[test]
    fn test_endpoints_hit_curve_extremes() {
        let samples = lookup_samples(9);
        // Phase -pi and +pi both sit at full weight
        assert_eq!(samples[0], 1.0);
        assert_eq!(samples[8], 1.0);
    }

    #[test]
    fn test_interior_is_flat_zero() {
        // Mid-domain (phase 0) lies on the flat zero segment of the curve
        let samples = lookup_samples(129);
        assert_eq!(samples[64], 0.0);
    }

    #[test]
    fn test_rebuild_skipped_for_same_size() {
        let mut cache = LookupTableCache::new();
        assert!(cache.ensure(5));
        assert!(!cache.ensure(5));
        assert_eq!(cache.rebuilds(), 1);
    }

    #[test]
    fn test_rebuild_on_size_change() {
        let mut cache = LookupTableCache::new();
        cache.ensure(5);
        assert!(cache.ensure(8));
        assert_eq!(cache.rebuilds(), 2);
        assert_eq!(cache.samples().len(), 8);
    }

    #[test]
    fn test_undersized_request_is_a_noop() {
        let mut cache = LookupTableCache::new();
        assert!(!cache.ensure(1));
        assert!(!cache.is_built());

        // An undersized request after a valid build keeps the old table
        cache.ensure(16);
        assert!(!cache.ensure(0));
        assert_eq!(cache.size(), 16);
        assert_eq!(cache.rebuilds(), 1);
    }

    #[test]
    fn test_u8_quantization_range() {
        let mut cache = LookupTableCache::new();
        cache.ensure(64);
        let bytes = cache.samples_u8();
        assert_eq!(bytes[0], 255);
        assert!(bytes.contains(&0));
    }
}
