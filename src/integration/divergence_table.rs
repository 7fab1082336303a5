// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed-form y-antiderivatives for direct-divergence facet integrals
//!
//! Entry `i` integrates `x^(a+1) / (a+1) y^b z^c` along y on the plane
//! `x = α0 + α1 y + α2 z`, where `[a, b, c] = MONOMIALS[i]`. Write
//! `β = α0 + α2 z` and `w = β + α1 y`. Every entry has two forms: one for
//! `α1` numerically zero, where x does not depend on y, and the general one,
//! which divides by powers of `α1`.

/// y-antiderivative of table entry `index` at `(y, z)`
pub fn y_antiderivative(
    index: usize,
    alpha: &[f64; 3],
    y: f64,
    z: f64,
    zero_tolerance: f64,
) -> f64 {
    let a1 = alpha[1];
    let beta = alpha[0] + alpha[2] * z;
    let w = beta + a1 * y;
    let zero = a1.abs() < zero_tolerance;

    match index {
        0 => {
            // 1
            if zero {
                beta * y
            } else {
                w.powi(2) / (2.0 * a1)
            }
        }
        1 => {
            // x
            if zero {
                beta.powi(2) * y / 2.0
            } else {
                w.powi(3) / (6.0 * a1)
            }
        }
        2 => {
            // y
            if zero {
                beta * y.powi(2) / 2.0
            } else {
                y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2))
            }
        }
        3 => {
            // z
            if zero {
                beta * y * z
            } else {
                z * w.powi(2) / (2.0 * a1)
            }
        }
        4 => {
            // x^2
            if zero {
                beta.powi(3) * y / 3.0
            } else {
                w.powi(4) / (12.0 * a1)
            }
        }
        5 => {
            // x y
            if zero {
                beta.powi(2) * y.powi(2) / 4.0
            } else {
                y * w.powi(3) / (6.0 * a1)
                    - w.powi(4) / (24.0 * a1.powi(2))
            }
        }
        6 => {
            // x z
            if zero {
                beta.powi(2) * y * z / 2.0
            } else {
                z * w.powi(3) / (6.0 * a1)
            }
        }
        7 => {
            // y^2
            if zero {
                beta * y.powi(3) / 3.0
            } else {
                y.powi(2) * w.powi(2) / (2.0 * a1)
                    - y * w.powi(3) / (3.0 * a1.powi(2))
                    + w.powi(4) / (12.0 * a1.powi(3))
            }
        }
        8 => {
            // y z
            if zero {
                beta * y.powi(2) * z / 2.0
            } else {
                z * (y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2)))
            }
        }
        9 => {
            // z^2
            if zero {
                beta * y * z.powi(2)
            } else {
                z.powi(2) * w.powi(2) / (2.0 * a1)
            }
        }
        10 => {
            // x^3
            if zero {
                beta.powi(4) * y / 4.0
            } else {
                w.powi(5) / (20.0 * a1)
            }
        }
        11 => {
            // x^2 y
            if zero {
                beta.powi(3) * y.powi(2) / 6.0
            } else {
                y * w.powi(4) / (12.0 * a1)
                    - w.powi(5) / (60.0 * a1.powi(2))
            }
        }
        12 => {
            // x^2 z
            if zero {
                beta.powi(3) * y * z / 3.0
            } else {
                z * w.powi(4) / (12.0 * a1)
            }
        }
        13 => {
            // x y^2
            if zero {
                beta.powi(2) * y.powi(3) / 6.0
            } else {
                y.powi(2) * w.powi(3) / (6.0 * a1)
                    - y * w.powi(4) / (12.0 * a1.powi(2))
                    + w.powi(5) / (60.0 * a1.powi(3))
            }
        }
        14 => {
            // x y z
            if zero {
                beta.powi(2) * y.powi(2) * z / 4.0
            } else {
                z * (y * w.powi(3) / (6.0 * a1)
                    - w.powi(4) / (24.0 * a1.powi(2)))
            }
        }
        15 => {
            // x z^2
            if zero {
                beta.powi(2) * y * z.powi(2) / 2.0
            } else {
                z.powi(2) * w.powi(3) / (6.0 * a1)
            }
        }
        16 => {
            // y^3
            if zero {
                beta * y.powi(4) / 4.0
            } else {
                y.powi(3) * w.powi(2) / (2.0 * a1)
                    - y.powi(2) * w.powi(3) / (2.0 * a1.powi(2))
                    + y * w.powi(4) / (4.0 * a1.powi(3))
                    - w.powi(5) / (20.0 * a1.powi(4))
            }
        }
        17 => {
            // y^2 z
            if zero {
                beta * y.powi(3) * z / 3.0
            } else {
                z * (y.powi(2) * w.powi(2) / (2.0 * a1)
                    - y * w.powi(3) / (3.0 * a1.powi(2))
                    + w.powi(4) / (12.0 * a1.powi(3)))
            }
        }
        18 => {
            // y z^2
            if zero {
                beta * y.powi(2) * z.powi(2) / 2.0
            } else {
                z.powi(2) * (y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2)))
            }
        }
        19 => {
            // z^3
            if zero {
                beta * y * z.powi(3)
            } else {
                z.powi(3) * w.powi(2) / (2.0 * a1)
            }
        }
        20 => {
            // x^4
            if zero {
                beta.powi(5) * y / 5.0
            } else {
                w.powi(6) / (30.0 * a1)
            }
        }
        21 => {
            // x^3 y
            if zero {
                beta.powi(4) * y.powi(2) / 8.0
            } else {
                y * w.powi(5) / (20.0 * a1)
                    - w.powi(6) / (120.0 * a1.powi(2))
            }
        }
        22 => {
            // x^3 z
            if zero {
                beta.powi(4) * y * z / 4.0
            } else {
                z * w.powi(5) / (20.0 * a1)
            }
        }
        23 => {
            // x^2 y^2
            if zero {
                beta.powi(3) * y.powi(3) / 9.0
            } else {
                y.powi(2) * w.powi(4) / (12.0 * a1)
                    - y * w.powi(5) / (30.0 * a1.powi(2))
                    + w.powi(6) / (180.0 * a1.powi(3))
            }
        }
        24 => {
            // x^2 y z
            if zero {
                beta.powi(3) * y.powi(2) * z / 6.0
            } else {
                z * (y * w.powi(4) / (12.0 * a1)
                    - w.powi(5) / (60.0 * a1.powi(2)))
            }
        }
        25 => {
            // x^2 z^2
            if zero {
                beta.powi(3) * y * z.powi(2) / 3.0
            } else {
                z.powi(2) * w.powi(4) / (12.0 * a1)
            }
        }
        26 => {
            // x y^3
            if zero {
                beta.powi(2) * y.powi(4) / 8.0
            } else {
                y.powi(3) * w.powi(3) / (6.0 * a1)
                    - y.powi(2) * w.powi(4) / (8.0 * a1.powi(2))
                    + y * w.powi(5) / (20.0 * a1.powi(3))
                    - w.powi(6) / (120.0 * a1.powi(4))
            }
        }
        27 => {
            // x y^2 z
            if zero {
                beta.powi(2) * y.powi(3) * z / 6.0
            } else {
                z * (y.powi(2) * w.powi(3) / (6.0 * a1)
                    - y * w.powi(4) / (12.0 * a1.powi(2))
                    + w.powi(5) / (60.0 * a1.powi(3)))
            }
        }
        28 => {
            // x y z^2
            if zero {
                beta.powi(2) * y.powi(2) * z.powi(2) / 4.0
            } else {
                z.powi(2) * (y * w.powi(3) / (6.0 * a1)
                    - w.powi(4) / (24.0 * a1.powi(2)))
            }
        }
        29 => {
            // x z^3
            if zero {
                beta.powi(2) * y * z.powi(3) / 2.0
            } else {
                z.powi(3) * w.powi(3) / (6.0 * a1)
            }
        }
        30 => {
            // y^4
            if zero {
                beta * y.powi(5) / 5.0
            } else {
                y.powi(4) * w.powi(2) / (2.0 * a1)
                    - 2.0 * y.powi(3) * w.powi(3) / (3.0 * a1.powi(2))
                    + y.powi(2) * w.powi(4) / (2.0 * a1.powi(3))
                    - y * w.powi(5) / (5.0 * a1.powi(4))
                    + w.powi(6) / (30.0 * a1.powi(5))
            }
        }
        31 => {
            // y^3 z
            if zero {
                beta * y.powi(4) * z / 4.0
            } else {
                z * (y.powi(3) * w.powi(2) / (2.0 * a1)
                    - y.powi(2) * w.powi(3) / (2.0 * a1.powi(2))
                    + y * w.powi(4) / (4.0 * a1.powi(3))
                    - w.powi(5) / (20.0 * a1.powi(4)))
            }
        }
        32 => {
            // y^2 z^2
            if zero {
                beta * y.powi(3) * z.powi(2) / 3.0
            } else {
                z.powi(2) * (y.powi(2) * w.powi(2) / (2.0 * a1)
                    - y * w.powi(3) / (3.0 * a1.powi(2))
                    + w.powi(4) / (12.0 * a1.powi(3)))
            }
        }
        33 => {
            // y z^3
            if zero {
                beta * y.powi(2) * z.powi(3) / 2.0
            } else {
                z.powi(3) * (y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2)))
            }
        }
        34 => {
            // z^4
            if zero {
                beta * y * z.powi(4)
            } else {
                z.powi(4) * w.powi(2) / (2.0 * a1)
            }
        }
        35 => {
            // x^5
            if zero {
                beta.powi(6) * y / 6.0
            } else {
                w.powi(7) / (42.0 * a1)
            }
        }
        36 => {
            // x^4 y
            if zero {
                beta.powi(5) * y.powi(2) / 10.0
            } else {
                y * w.powi(6) / (30.0 * a1)
                    - w.powi(7) / (210.0 * a1.powi(2))
            }
        }
        37 => {
            // x^4 z
            if zero {
                beta.powi(5) * y * z / 5.0
            } else {
                z * w.powi(6) / (30.0 * a1)
            }
        }
        38 => {
            // x^3 y^2
            if zero {
                beta.powi(4) * y.powi(3) / 12.0
            } else {
                y.powi(2) * w.powi(5) / (20.0 * a1)
                    - y * w.powi(6) / (60.0 * a1.powi(2))
                    + w.powi(7) / (420.0 * a1.powi(3))
            }
        }
        39 => {
            // x^3 y z
            if zero {
                beta.powi(4) * y.powi(2) * z / 8.0
            } else {
                z * (y * w.powi(5) / (20.0 * a1)
                    - w.powi(6) / (120.0 * a1.powi(2)))
            }
        }
        40 => {
            // x^3 z^2
            if zero {
                beta.powi(4) * y * z.powi(2) / 4.0
            } else {
                z.powi(2) * w.powi(5) / (20.0 * a1)
            }
        }
        41 => {
            // x^2 y^3
            if zero {
                beta.powi(3) * y.powi(4) / 12.0
            } else {
                y.powi(3) * w.powi(4) / (12.0 * a1)
                    - y.powi(2) * w.powi(5) / (20.0 * a1.powi(2))
                    + y * w.powi(6) / (60.0 * a1.powi(3))
                    - w.powi(7) / (420.0 * a1.powi(4))
            }
        }
        42 => {
            // x^2 y^2 z
            if zero {
                beta.powi(3) * y.powi(3) * z / 9.0
            } else {
                z * (y.powi(2) * w.powi(4) / (12.0 * a1)
                    - y * w.powi(5) / (30.0 * a1.powi(2))
                    + w.powi(6) / (180.0 * a1.powi(3)))
            }
        }
        43 => {
            // x^2 y z^2
            if zero {
                beta.powi(3) * y.powi(2) * z.powi(2) / 6.0
            } else {
                z.powi(2) * (y * w.powi(4) / (12.0 * a1)
                    - w.powi(5) / (60.0 * a1.powi(2)))
            }
        }
        44 => {
            // x^2 z^3
            if zero {
                beta.powi(3) * y * z.powi(3) / 3.0
            } else {
                z.powi(3) * w.powi(4) / (12.0 * a1)
            }
        }
        45 => {
            // x y^4
            if zero {
                beta.powi(2) * y.powi(5) / 10.0
            } else {
                y.powi(4) * w.powi(3) / (6.0 * a1)
                    - y.powi(3) * w.powi(4) / (6.0 * a1.powi(2))
                    + y.powi(2) * w.powi(5) / (10.0 * a1.powi(3))
                    - y * w.powi(6) / (30.0 * a1.powi(4))
                    + w.powi(7) / (210.0 * a1.powi(5))
            }
        }
        46 => {
            // x y^3 z
            if zero {
                beta.powi(2) * y.powi(4) * z / 8.0
            } else {
                z * (y.powi(3) * w.powi(3) / (6.0 * a1)
                    - y.powi(2) * w.powi(4) / (8.0 * a1.powi(2))
                    + y * w.powi(5) / (20.0 * a1.powi(3))
                    - w.powi(6) / (120.0 * a1.powi(4)))
            }
        }
        47 => {
            // x y^2 z^2
            if zero {
                beta.powi(2) * y.powi(3) * z.powi(2) / 6.0
            } else {
                z.powi(2) * (y.powi(2) * w.powi(3) / (6.0 * a1)
                    - y * w.powi(4) / (12.0 * a1.powi(2))
                    + w.powi(5) / (60.0 * a1.powi(3)))
            }
        }
        48 => {
            // x y z^3
            if zero {
                beta.powi(2) * y.powi(2) * z.powi(3) / 4.0
            } else {
                z.powi(3) * (y * w.powi(3) / (6.0 * a1)
                    - w.powi(4) / (24.0 * a1.powi(2)))
            }
        }
        49 => {
            // x z^4
            if zero {
                beta.powi(2) * y * z.powi(4) / 2.0
            } else {
                z.powi(4) * w.powi(3) / (6.0 * a1)
            }
        }
        50 => {
            // y^5
            if zero {
                beta * y.powi(6) / 6.0
            } else {
                y.powi(5) * w.powi(2) / (2.0 * a1)
                    - 5.0 * y.powi(4) * w.powi(3) / (6.0 * a1.powi(2))
                    + 5.0 * y.powi(3) * w.powi(4) / (6.0 * a1.powi(3))
                    - y.powi(2) * w.powi(5) / (2.0 * a1.powi(4))
                    + y * w.powi(6) / (6.0 * a1.powi(5))
                    - w.powi(7) / (42.0 * a1.powi(6))
            }
        }
        51 => {
            // y^4 z
            if zero {
                beta * y.powi(5) * z / 5.0
            } else {
                z * (y.powi(4) * w.powi(2) / (2.0 * a1)
                    - 2.0 * y.powi(3) * w.powi(3) / (3.0 * a1.powi(2))
                    + y.powi(2) * w.powi(4) / (2.0 * a1.powi(3))
                    - y * w.powi(5) / (5.0 * a1.powi(4))
                    + w.powi(6) / (30.0 * a1.powi(5)))
            }
        }
        52 => {
            // y^3 z^2
            if zero {
                beta * y.powi(4) * z.powi(2) / 4.0
            } else {
                z.powi(2) * (y.powi(3) * w.powi(2) / (2.0 * a1)
                    - y.powi(2) * w.powi(3) / (2.0 * a1.powi(2))
                    + y * w.powi(4) / (4.0 * a1.powi(3))
                    - w.powi(5) / (20.0 * a1.powi(4)))
            }
        }
        53 => {
            // y^2 z^3
            if zero {
                beta * y.powi(3) * z.powi(3) / 3.0
            } else {
                z.powi(3) * (y.powi(2) * w.powi(2) / (2.0 * a1)
                    - y * w.powi(3) / (3.0 * a1.powi(2))
                    + w.powi(4) / (12.0 * a1.powi(3)))
            }
        }
        54 => {
            // y z^4
            if zero {
                beta * y.powi(2) * z.powi(4) / 2.0
            } else {
                z.powi(4) * (y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2)))
            }
        }
        55 => {
            // z^5
            if zero {
                beta * y * z.powi(5)
            } else {
                z.powi(5) * w.powi(2) / (2.0 * a1)
            }
        }
        56 => {
            // x^6
            if zero {
                beta.powi(7) * y / 7.0
            } else {
                w.powi(8) / (56.0 * a1)
            }
        }
        57 => {
            // x^5 y
            if zero {
                beta.powi(6) * y.powi(2) / 12.0
            } else {
                y * w.powi(7) / (42.0 * a1)
                    - w.powi(8) / (336.0 * a1.powi(2))
            }
        }
        58 => {
            // x^5 z
            if zero {
                beta.powi(6) * y * z / 6.0
            } else {
                z * w.powi(7) / (42.0 * a1)
            }
        }
        59 => {
            // x^4 y^2
            if zero {
                beta.powi(5) * y.powi(3) / 15.0
            } else {
                y.powi(2) * w.powi(6) / (30.0 * a1)
                    - y * w.powi(7) / (105.0 * a1.powi(2))
                    + w.powi(8) / (840.0 * a1.powi(3))
            }
        }
        60 => {
            // x^4 y z
            if zero {
                beta.powi(5) * y.powi(2) * z / 10.0
            } else {
                z * (y * w.powi(6) / (30.0 * a1)
                    - w.powi(7) / (210.0 * a1.powi(2)))
            }
        }
        61 => {
            // x^4 z^2
            if zero {
                beta.powi(5) * y * z.powi(2) / 5.0
            } else {
                z.powi(2) * w.powi(6) / (30.0 * a1)
            }
        }
        62 => {
            // x^3 y^3
            if zero {
                beta.powi(4) * y.powi(4) / 16.0
            } else {
                y.powi(3) * w.powi(5) / (20.0 * a1)
                    - y.powi(2) * w.powi(6) / (40.0 * a1.powi(2))
                    + y * w.powi(7) / (140.0 * a1.powi(3))
                    - w.powi(8) / (1120.0 * a1.powi(4))
            }
        }
        63 => {
            // x^3 y^2 z
            if zero {
                beta.powi(4) * y.powi(3) * z / 12.0
            } else {
                z * (y.powi(2) * w.powi(5) / (20.0 * a1)
                    - y * w.powi(6) / (60.0 * a1.powi(2))
                    + w.powi(7) / (420.0 * a1.powi(3)))
            }
        }
        64 => {
            // x^3 y z^2
            if zero {
                beta.powi(4) * y.powi(2) * z.powi(2) / 8.0
            } else {
                z.powi(2) * (y * w.powi(5) / (20.0 * a1)
                    - w.powi(6) / (120.0 * a1.powi(2)))
            }
        }
        65 => {
            // x^3 z^3
            if zero {
                beta.powi(4) * y * z.powi(3) / 4.0
            } else {
                z.powi(3) * w.powi(5) / (20.0 * a1)
            }
        }
        66 => {
            // x^2 y^4
            if zero {
                beta.powi(3) * y.powi(5) / 15.0
            } else {
                y.powi(4) * w.powi(4) / (12.0 * a1)
                    - y.powi(3) * w.powi(5) / (15.0 * a1.powi(2))
                    + y.powi(2) * w.powi(6) / (30.0 * a1.powi(3))
                    - y * w.powi(7) / (105.0 * a1.powi(4))
                    + w.powi(8) / (840.0 * a1.powi(5))
            }
        }
        67 => {
            // x^2 y^3 z
            if zero {
                beta.powi(3) * y.powi(4) * z / 12.0
            } else {
                z * (y.powi(3) * w.powi(4) / (12.0 * a1)
                    - y.powi(2) * w.powi(5) / (20.0 * a1.powi(2))
                    + y * w.powi(6) / (60.0 * a1.powi(3))
                    - w.powi(7) / (420.0 * a1.powi(4)))
            }
        }
        68 => {
            // x^2 y^2 z^2
            if zero {
                beta.powi(3) * y.powi(3) * z.powi(2) / 9.0
            } else {
                z.powi(2) * (y.powi(2) * w.powi(4) / (12.0 * a1)
                    - y * w.powi(5) / (30.0 * a1.powi(2))
                    + w.powi(6) / (180.0 * a1.powi(3)))
            }
        }
        69 => {
            // x^2 y z^3
            if zero {
                beta.powi(3) * y.powi(2) * z.powi(3) / 6.0
            } else {
                z.powi(3) * (y * w.powi(4) / (12.0 * a1)
                    - w.powi(5) / (60.0 * a1.powi(2)))
            }
        }
        70 => {
            // x^2 z^4
            if zero {
                beta.powi(3) * y * z.powi(4) / 3.0
            } else {
                z.powi(4) * w.powi(4) / (12.0 * a1)
            }
        }
        71 => {
            // x y^5
            if zero {
                beta.powi(2) * y.powi(6) / 12.0
            } else {
                y.powi(5) * w.powi(3) / (6.0 * a1)
                    - 5.0 * y.powi(4) * w.powi(4) / (24.0 * a1.powi(2))
                    + y.powi(3) * w.powi(5) / (6.0 * a1.powi(3))
                    - y.powi(2) * w.powi(6) / (12.0 * a1.powi(4))
                    + y * w.powi(7) / (42.0 * a1.powi(5))
                    - w.powi(8) / (336.0 * a1.powi(6))
            }
        }
        72 => {
            // x y^4 z
            if zero {
                beta.powi(2) * y.powi(5) * z / 10.0
            } else {
                z * (y.powi(4) * w.powi(3) / (6.0 * a1)
                    - y.powi(3) * w.powi(4) / (6.0 * a1.powi(2))
                    + y.powi(2) * w.powi(5) / (10.0 * a1.powi(3))
                    - y * w.powi(6) / (30.0 * a1.powi(4))
                    + w.powi(7) / (210.0 * a1.powi(5)))
            }
        }
        73 => {
            // x y^3 z^2
            if zero {
                beta.powi(2) * y.powi(4) * z.powi(2) / 8.0
            } else {
                z.powi(2) * (y.powi(3) * w.powi(3) / (6.0 * a1)
                    - y.powi(2) * w.powi(4) / (8.0 * a1.powi(2))
                    + y * w.powi(5) / (20.0 * a1.powi(3))
                    - w.powi(6) / (120.0 * a1.powi(4)))
            }
        }
        74 => {
            // x y^2 z^3
            if zero {
                beta.powi(2) * y.powi(3) * z.powi(3) / 6.0
            } else {
                z.powi(3) * (y.powi(2) * w.powi(3) / (6.0 * a1)
                    - y * w.powi(4) / (12.0 * a1.powi(2))
                    + w.powi(5) / (60.0 * a1.powi(3)))
            }
        }
        75 => {
            // x y z^4
            if zero {
                beta.powi(2) * y.powi(2) * z.powi(4) / 4.0
            } else {
                z.powi(4) * (y * w.powi(3) / (6.0 * a1)
                    - w.powi(4) / (24.0 * a1.powi(2)))
            }
        }
        76 => {
            // x z^5
            if zero {
                beta.powi(2) * y * z.powi(5) / 2.0
            } else {
                z.powi(5) * w.powi(3) / (6.0 * a1)
            }
        }
        77 => {
            // y^6
            if zero {
                beta * y.powi(7) / 7.0
            } else {
                y.powi(6) * w.powi(2) / (2.0 * a1)
                    - y.powi(5) * w.powi(3) / a1.powi(2)
                    + 5.0 * y.powi(4) * w.powi(4) / (4.0 * a1.powi(3))
                    - y.powi(3) * w.powi(5) / a1.powi(4)
                    + y.powi(2) * w.powi(6) / (2.0 * a1.powi(5))
                    - y * w.powi(7) / (7.0 * a1.powi(6))
                    + w.powi(8) / (56.0 * a1.powi(7))
            }
        }
        78 => {
            // y^5 z
            if zero {
                beta * y.powi(6) * z / 6.0
            } else {
                z * (y.powi(5) * w.powi(2) / (2.0 * a1)
                    - 5.0 * y.powi(4) * w.powi(3) / (6.0 * a1.powi(2))
                    + 5.0 * y.powi(3) * w.powi(4) / (6.0 * a1.powi(3))
                    - y.powi(2) * w.powi(5) / (2.0 * a1.powi(4))
                    + y * w.powi(6) / (6.0 * a1.powi(5))
                    - w.powi(7) / (42.0 * a1.powi(6)))
            }
        }
        79 => {
            // y^4 z^2
            if zero {
                beta * y.powi(5) * z.powi(2) / 5.0
            } else {
                z.powi(2) * (y.powi(4) * w.powi(2) / (2.0 * a1)
                    - 2.0 * y.powi(3) * w.powi(3) / (3.0 * a1.powi(2))
                    + y.powi(2) * w.powi(4) / (2.0 * a1.powi(3))
                    - y * w.powi(5) / (5.0 * a1.powi(4))
                    + w.powi(6) / (30.0 * a1.powi(5)))
            }
        }
        80 => {
            // y^3 z^3
            if zero {
                beta * y.powi(4) * z.powi(3) / 4.0
            } else {
                z.powi(3) * (y.powi(3) * w.powi(2) / (2.0 * a1)
                    - y.powi(2) * w.powi(3) / (2.0 * a1.powi(2))
                    + y * w.powi(4) / (4.0 * a1.powi(3))
                    - w.powi(5) / (20.0 * a1.powi(4)))
            }
        }
        81 => {
            // y^2 z^4
            if zero {
                beta * y.powi(3) * z.powi(4) / 3.0
            } else {
                z.powi(4) * (y.powi(2) * w.powi(2) / (2.0 * a1)
                    - y * w.powi(3) / (3.0 * a1.powi(2))
                    + w.powi(4) / (12.0 * a1.powi(3)))
            }
        }
        82 => {
            // y z^5
            if zero {
                beta * y.powi(2) * z.powi(5) / 2.0
            } else {
                z.powi(5) * (y * w.powi(2) / (2.0 * a1)
                    - w.powi(3) / (6.0 * a1.powi(2)))
            }
        }
        83 => {
            // z^6
            if zero {
                beta * y * z.powi(6)
            } else {
                z.powi(6) * w.powi(2) / (2.0 * a1)
            }
        }
        _ => unreachable!("monomial index {index} is beyond degree six"),
    }
}
