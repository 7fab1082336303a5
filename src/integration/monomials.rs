// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Monomial basis up to total degree six
//!
//! Graded order: `1, x, y, z, x^2, xy, xz, y^2, yz, z^2, x^3, ...`. Within a
//! degree the x exponent falls first, then the y exponent.

use nalgebra::Point3;

/// Number of monomials of total degree <= 6
pub const MONOMIAL_COUNT: usize = 84;

/// Exponents `[a, b, c]` of `x^a y^b z^c`
pub const MONOMIALS: [[u32; 3]; MONOMIAL_COUNT] = [
    // degree 0
    [0, 0, 0],
    // degree 1
    [1, 0, 0], [0, 1, 0], [0, 0, 1],
    // degree 2
    [2, 0, 0], [1, 1, 0], [1, 0, 1], [0, 2, 0], [0, 1, 1], [0, 0, 2],
    // degree 3
    [3, 0, 0], [2, 1, 0], [2, 0, 1], [1, 2, 0], [1, 1, 1], [1, 0, 2],
    [0, 3, 0], [0, 2, 1], [0, 1, 2], [0, 0, 3],
    // degree 4
    [4, 0, 0], [3, 1, 0], [3, 0, 1], [2, 2, 0], [2, 1, 1], [2, 0, 2],
    [1, 3, 0], [1, 2, 1], [1, 1, 2], [1, 0, 3], [0, 4, 0], [0, 3, 1],
    [0, 2, 2], [0, 1, 3], [0, 0, 4],
    // degree 5
    [5, 0, 0], [4, 1, 0], [4, 0, 1], [3, 2, 0], [3, 1, 1], [3, 0, 2],
    [2, 3, 0], [2, 2, 1], [2, 1, 2], [2, 0, 3], [1, 4, 0], [1, 3, 1],
    [1, 2, 2], [1, 1, 3], [1, 0, 4], [0, 5, 0], [0, 4, 1], [0, 3, 2],
    [0, 2, 3], [0, 1, 4], [0, 0, 5],
    // degree 6
    [6, 0, 0], [5, 1, 0], [5, 0, 1], [4, 2, 0], [4, 1, 1], [4, 0, 2],
    [3, 3, 0], [3, 2, 1], [3, 1, 2], [3, 0, 3], [2, 4, 0], [2, 3, 1],
    [2, 2, 2], [2, 1, 3], [2, 0, 4], [1, 5, 0], [1, 4, 1], [1, 3, 2],
    [1, 2, 3], [1, 1, 4], [1, 0, 5], [0, 6, 0], [0, 5, 1], [0, 4, 2],
    [0, 3, 3], [0, 2, 4], [0, 1, 5], [0, 0, 6],
];

/// Number of monomials of total degree <= `degree`
pub fn monomial_count(degree: usize) -> usize {
    (degree + 1) * (degree + 2) * (degree + 3) / 6
}

/// Total degree of a table entry
pub fn degree_of(index: usize) -> usize {
    MONOMIALS[index].iter().sum::<u32>() as usize
}

/// Table position of `x^a y^b z^c`, total degree <= 6
pub fn monomial_index(exponents: [u32; 3]) -> usize {
    let [a, b, c] = exponents.map(|e| e as usize);
    let degree = a + b + c;
    let offset = (degree - a) * (degree - a + 1) / 2 + (degree - a - b);
    degree * (degree + 1) * (degree + 2) / 6 + offset
}

pub fn evaluate(index: usize, p: &Point3<f64>) -> f64 {
    let [a, b, c] = MONOMIALS[index];
    p.x.powi(a as i32) * p.y.powi(b as i32) * p.z.powi(c as i32)
}

/// All monomials up to `degree` at a point
pub fn evaluate_all(degree: usize, p: &Point3<f64>) -> Vec<f64> {
    (0..monomial_count(degree)).map(|i| evaluate(i, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_graded_and_complete() {
        assert_eq!(monomial_count(6), MONOMIAL_COUNT);
        let mut seen = std::collections::HashSet::new();
        for (i, e) in MONOMIALS.iter().enumerate() {
            assert!(seen.insert(*e));
            if i > 0 {
                assert!(degree_of(i) >= degree_of(i - 1));
            }
        }
        for d in 0..=6 {
            assert_eq!(degree_of(monomial_count(d) - 1), d);
        }
        assert_eq!(MONOMIALS[5], [1, 1, 0]);
        assert_eq!(MONOMIALS[9], [0, 0, 2]);
    }

    #[test]
    fn test_index_inverts_table() {
        for (i, e) in MONOMIALS.iter().enumerate() {
            assert_eq!(monomial_index(*e), i, "{e:?}");
        }
    }
}
