//! Exact coordinate arithmetic.
//!
//! The sweep never compares floating-point numbers. Input points are snapped
//! onto a per-axis power-of-two grid and carried as [`malachite::Integer`]s
//! from then on; every ordering predicate downstream is a sign test on
//! integer products. The helpers here are the only places where rounding
//! happens, and each one pins down its rounding direction explicitly because
//! the sweep's ordering arguments depend on them.

use kurbo::Point;
use malachite::num::arithmetic::traits::DivMod;
use malachite::Integer;

/// Maps between `f64` input coordinates and the integer grid.
///
/// Each axis gets its own grid spacing of `2^exp`, with `exp` chosen from
/// the largest binary exponent appearing on that axis so that the full
/// 53-bit significand of the largest coordinates survives the snap.
/// Smaller coordinates may lose low bits; they are rounded to the nearest
/// grid line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Quantizer {
    x_exp: i32,
    y_exp: i32,
}

impl Quantizer {
    /// Chooses grid exponents covering all of `points`.
    ///
    /// Zeros, subnormals and non-finite values don't contribute to the
    /// exponent choice; an axis with no normal coordinate at all falls back
    /// to a grid spacing of one.
    pub fn new(points: &[Point]) -> Self {
        let mut x_exp = i32::MIN;
        let mut y_exp = i32::MIN;
        for p in points {
            if p.x.is_normal() {
                x_exp = x_exp.max(exponent(p.x));
            }
            if p.y.is_normal() {
                y_exp = y_exp.max(exponent(p.y));
            }
        }
        Quantizer {
            x_exp: if x_exp == i32::MIN { 0 } else { x_exp - 53 },
            y_exp: if y_exp == i32::MIN { 0 } else { y_exp - 53 },
        }
    }

    /// Snaps a point onto the integer grid.
    pub fn to_grid(&self, p: Point) -> (Integer, Integer) {
        (quantize(p.x, self.x_exp), quantize(p.y, self.y_exp))
    }

    /// Maps a grid point back into the input coordinate frame.
    pub fn from_grid(&self, x: &Integer, y: &Integer) -> Point {
        // unwrap: grid coordinates are bounded by the input bounding box,
        // which quantizes to at most 53 significant bits per axis.
        let x = i64::try_from(x).unwrap();
        let y = i64::try_from(y).unwrap();
        Point::new(ldexp(x as f64, self.x_exp), ldexp(y as f64, self.y_exp))
    }
}

/// The binary exponent of a normal, finite `v`, such that
/// `2^(e-1) <= |v| < 2^e`.
fn exponent(v: f64) -> i32 {
    debug_assert!(v.is_normal());
    ((v.to_bits() >> 52) & 0x7ff) as i32 - 1022
}

/// `v * 2^e`, without precision loss in the scale factor.
///
/// Splitting the exponent keeps both partial scale factors representable
/// even when `e` alone would overflow or underflow `f64`'s exponent range.
fn ldexp(v: f64, e: i32) -> f64 {
    let half = e / 2;
    v * 2.0f64.powi(half) * 2.0f64.powi(e - half)
}

/// Rounds `v / 2^exp` to the nearest integer, ties toward positive infinity.
pub(crate) fn quantize(v: f64, exp: i32) -> Integer {
    if v == 0.0 {
        return Integer::from(0);
    }
    let bits = v.to_bits();
    let negative = v.is_sign_negative();
    let exp_field = ((bits >> 52) & 0x7ff) as i32;
    let (mantissa, pow) = if exp_field == 0 {
        (bits & ((1u64 << 52) - 1), -1074)
    } else {
        ((bits & ((1u64 << 52) - 1)) | (1u64 << 52), exp_field - 1075)
    };
    let shift = pow - exp;
    let magnitude = if shift >= 0 {
        Integer::from(mantissa) << (shift as u32)
    } else {
        let r = -shift as u32;
        if r >= 64 {
            // The whole value is far below half a grid step.
            return Integer::from(0);
        }
        let half = 1u64 << (r - 1);
        // Round the magnitude: ties go up for positive values and down for
        // negative ones, so that ties always land toward positive infinity.
        let rounded = if negative {
            (mantissa + half - 1) >> r
        } else {
            (mantissa + half) >> r
        };
        Integer::from(rounded)
    };
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// `num / den` rounded to the nearest integer, ties toward positive
/// infinity. `den` must be positive.
pub(crate) fn div_round_nearest(num: Integer, den: &Integer) -> Integer {
    debug_assert!(*den > 0);
    let (mut quot, rem) = num.div_mod(den);
    if (&rem << 1u32) >= *den {
        quot += Integer::from(1);
    }
    quot
}

/// `num / den` rounded toward negative infinity. `den` must be positive.
pub(crate) fn div_floor(num: Integer, den: &Integer) -> Integer {
    debug_assert!(*den > 0);
    num.div_mod(den).0
}
