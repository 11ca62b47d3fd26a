// SIMD kernels for feature-row arithmetic
// AVX2/FMA on x86_64 for wide rows, two-accumulator scalar code otherwise

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

// Player feature rows are short; below this width the scalar path wins
#[cfg(target_arch = "x86_64")]
const MIN_DIM_SIZE_AVX: usize = 32;

/// Dot product of two equally sized rows
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_AVX
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { dot_avx2(a, b) };
        }
    }

    dot_scalar(a, b)
}

/// Squared Euclidean distance of two equally sized rows
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= MIN_DIM_SIZE_AVX
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            return unsafe { squared_l2_avx2(a, b) };
        }
    }

    squared_l2_scalar(a, b)
}

/// Euclidean norm of a row
#[inline]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Dot product accumulated in f64, for rows whose f32 sums overflow
pub fn dot_wide(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum()
}

pub fn norm_wide(v: &[f32]) -> f64 {
    dot_wide(v, v).sqrt()
}

/// Squared Euclidean distance accumulated in f64
pub fn squared_l2_wide(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum()
}

/// In-place element-wise product `row[i] *= weights[i]`
#[inline]
pub fn scale_in_place(row: &mut [f32], weights: &[f32]) {
    debug_assert_eq!(row.len(), weights.len());
    for (x, w) in row.iter_mut().zip(weights) {
        *x *= *w;
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;
    let mut sum1 = _mm256_setzero_ps();
    let mut sum2 = _mm256_setzero_ps();

    while i + 15 < dim {
        let a1 = _mm256_loadu_ps(a.as_ptr().add(i));
        let b1 = _mm256_loadu_ps(b.as_ptr().add(i));
        let a2 = _mm256_loadu_ps(a.as_ptr().add(i + 8));
        let b2 = _mm256_loadu_ps(b.as_ptr().add(i + 8));
        sum1 = _mm256_fmadd_ps(a1, b1, sum1);
        sum2 = _mm256_fmadd_ps(a2, b2, sum2);
        i += 16;
    }

    let mut acc = hsum256(_mm256_add_ps(sum1, sum2));
    while i < dim {
        acc += a[i] * b[i];
        i += 1;
    }
    acc
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn squared_l2_avx2(a: &[f32], b: &[f32]) -> f32 {
    let dim = a.len();
    let mut i = 0;
    let mut sum1 = _mm256_setzero_ps();
    let mut sum2 = _mm256_setzero_ps();

    while i + 15 < dim {
        let d1 = _mm256_sub_ps(
            _mm256_loadu_ps(a.as_ptr().add(i)),
            _mm256_loadu_ps(b.as_ptr().add(i)),
        );
        let d2 = _mm256_sub_ps(
            _mm256_loadu_ps(a.as_ptr().add(i + 8)),
            _mm256_loadu_ps(b.as_ptr().add(i + 8)),
        );
        sum1 = _mm256_fmadd_ps(d1, d1, sum1);
        sum2 = _mm256_fmadd_ps(d2, d2, sum2);
        i += 16;
    }

    let mut acc = hsum256(_mm256_add_ps(sum1, sum2));
    while i < dim {
        let d = a[i] - b[i];
        acc += d * d;
        i += 1;
    }
    acc
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn hsum256(v: __m256) -> f32 {
    let high = _mm256_extractf128_ps(v, 1);
    let low = _mm256_castps256_ps128(v);
    let mut sum = _mm_add_ps(high, low);
    sum = _mm_hadd_ps(sum, sum);
    sum = _mm_hadd_ps(sum, sum);
    _mm_cvtss_f32(sum)
}

#[inline]
fn dot_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut acc0 = 0.0f32;
    let mut acc1 = 0.0f32;

    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail = a_chunks.remainder().len();

    for (x, y) in a_chunks.zip(b_chunks) {
        acc0 += x[0] * y[0] + x[1] * y[1];
        acc1 += x[2] * y[2] + x[3] * y[3];
    }
    for i in (a.len() - tail)..a.len() {
        acc0 += a[i] * b[i];
    }

    acc0 + acc1
}

#[inline]
fn squared_l2_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut acc0 = 0.0f32;
    let mut acc1 = 0.0f32;

    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail = a_chunks.remainder().len();

    for (x, y) in a_chunks.zip(b_chunks) {
        let d0 = x[0] - y[0];
        let d1 = x[1] - y[1];
        let d2 = x[2] - y[2];
        let d3 = x[3] - y[3];
        acc0 += d0 * d0 + d1 * d1;
        acc1 += d2 * d2 + d3 * d3;
    }
    for i in (a.len() - tail)..a.len() {
        let d = a[i] - b[i];
        acc0 += d * d;
    }

    acc0 + acc1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dot_small() {
        assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_dot_wide_matches_naive() {
        let a: Vec<f32> = (0..70).map(|i| (i as f32 * 0.37).sin()).collect();
        let b: Vec<f32> = (0..70).map(|i| (i as f32 * 0.11).cos()).collect();
        assert!((dot(&a, &b) - naive_dot(&a, &b)).abs() < 1e-4);
    }

    #[test]
    fn test_squared_l2() {
        assert!((squared_l2(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
        let a: Vec<f32> = (0..40).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..40).map(|i| i as f32 + 1.0).collect();
        assert!((squared_l2(&a, &b) - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_wide_accumulation_survives_f32_overflow() {
        let big = [3.0e19f32, 3.0e19];
        assert!(!dot(&big, &big).is_finite());
        assert!((dot_wide(&big, &big) - 1.8e39).abs() / 1.8e39 < 1e-6);
        assert!((norm_wide(&big) - 3.0e19 * 2f64.sqrt()).abs() / 4.2e19 < 1e-6);
        assert!((squared_l2_wide(&big, &[-3.0e19, 3.0e19]) - 3.6e39).abs() / 3.6e39 < 1e-6);
    }

    #[test]
    fn test_norm_and_scale() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        let mut row = vec![1.0, 2.0, 3.0];
        scale_in_place(&mut row, &[1.5, 1.0, 0.5]);
        assert_eq!(row, vec![1.5, 2.0, 1.5]);
    }
}
