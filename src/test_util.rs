// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Test-only assertion helpers shared across the crate's unit tests.

/// Asserts that two values differ by no more than `max_error`.
#[macro_export]
macro_rules! assert_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        match (&$left, &$right) {
            (left_val, right_val) => {
                let diff = if *left_val > *right_val {
                    *left_val - *right_val
                } else {
                    *right_val - *left_val
                };
                if !(diff <= $max_error) {
                    panic!(
                        "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`",
                        left_val, right_val, $max_error
                    );
                }
            }
        }
    };
}

/// Asserts that every element of two equal-length slices differs by no
/// more than `max_error`, pairwise.
#[macro_export]
macro_rules! assert_all_almost_eq {
    ($left:expr, $right:expr, $max_error:expr $(,)?) => {
        let left_val = &$left;
        let right_val = &$right;
        assert_eq!(left_val.len(), right_val.len(), "slice length mismatch");
        for (i, (l, r)) in left_val.iter().zip(right_val.iter()).enumerate() {
            let diff = if *l > *r { *l - *r } else { *r - *l };
            if !(diff <= $max_error) {
                panic!(
                    "assertion failed at index {}: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n max_error: `{:?}`",
                    i, l, r, $max_error
                );
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use test_log::test;

    #[test]
    fn test_with_floats() {
        assert_almost_eq!(1.0000001f64, 1.0000002, 0.000001);
        assert_almost_eq!(1.0, 1.1, 0.2);
    }

    #[test]
    fn test_all_almost_eq() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [1.01f32, 1.99, 3.0];
        assert_all_almost_eq!(a, b, 0.02);
    }

    #[test]
    fn test_panic() {
        use std::panic;
        let result = panic::catch_unwind(|| {
            assert_almost_eq!(1.0, 1.2, 0.1);
        });
        assert!(result.is_err(), "expected assert_almost_eq! to panic");
    }
}
