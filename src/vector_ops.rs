use crate::config::{Number, EPSILON};
use wide::f32x8;

/// Squared Euclidean distance between two equal-length vectors using SIMD lanes.
/// Returns `None` when the lengths differ.
pub fn squared_euclidean_simd(a: &[Number], b: &[Number]) -> Option<Number> {
    if a.len() != b.len() {
        return None;
    }

    let mut acc = f32x8::splat(0.0);

    let len = a.len();
    let simd_len = len - (len % 8);

    for i in (0..simd_len).step_by(8) {
        let va = f32x8::new([
            a[i],
            a[i + 1],
            a[i + 2],
            a[i + 3],
            a[i + 4],
            a[i + 5],
            a[i + 6],
            a[i + 7],
        ]);
        let vb = f32x8::new([
            b[i],
            b[i + 1],
            b[i + 2],
            b[i + 3],
            b[i + 4],
            b[i + 5],
            b[i + 6],
            b[i + 7],
        ]);
        let diff = va - vb;
        acc += diff * diff;
    }

    let mut sum = acc.reduce_add();

    // Handle remaining elements
    for i in simd_len..len {
        let d = a[i] - b[i];
        sum += d * d;
    }

    Some(sum)
}

pub fn normalize_vector(vector: &mut [Number]) {
    let magnitude: Number = vector.iter().map(|&x| x * x).sum::<Number>().sqrt();
    if magnitude > EPSILON {
        for x in vector.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// Column-wise sum of the selected rows.
pub fn column_sums(rows: &[Vec<Number>], indices: &[usize], width: usize) -> Vec<Number> {
    let mut sums = vec![0.0; width];
    for &i in indices {
        for (acc, &v) in sums.iter_mut().zip(rows[i].iter()) {
            *acc += v;
        }
    }
    sums
}

/// Indices of the `k` largest strictly positive entries, in ascending order of value.
///
/// Ties keep their original column order.
pub fn top_positive_indices(values: &[Number], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let start = order.len().saturating_sub(k);
    order[start..]
        .iter()
        .copied()
        .filter(|&i| values[i] > 0.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_euclidean_matches_scalar() {
        let a: Vec<Number> = (0..19).map(|i| i as Number * 0.5).collect();
        let b: Vec<Number> = (0..19).map(|i| (19 - i) as Number * 0.25).collect();
        let expected: Number = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
        let got = squared_euclidean_simd(&a, &b).unwrap();
        assert!((got - expected).abs() < 1e-3);
    }

    #[test]
    fn test_squared_euclidean_length_mismatch() {
        assert!(squared_euclidean_simd(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_normalize_vector() {
        let mut v = vec![3.0, 4.0];
        normalize_vector(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize_vector(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_top_positive_indices() {
        let values = vec![0.0, 0.3, 0.1, 0.0, 0.9, 0.3];
        assert_eq!(top_positive_indices(&values, 3), vec![1, 5, 4]);
        // Only three entries are positive.
        assert_eq!(top_positive_indices(&values, 5), vec![2, 1, 5, 4]);
        assert!(top_positive_indices(&[0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_top_positive_indices_with_nan() {
        let values = vec![0.2, Number::NAN, 0.7, 0.0, Number::NAN, 0.4];
        let top = top_positive_indices(&values, 5);
        // NaN never passes the positivity filter.
        assert_eq!(top, vec![0, 5, 2]);
    }

    #[test]
    fn test_column_sums() {
        let rows = vec![vec![1.0, 0.0], vec![0.5, 2.0], vec![9.0, 9.0]];
        assert_eq!(column_sums(&rows, &[0, 1], 2), vec![1.5, 2.0]);
    }
}
