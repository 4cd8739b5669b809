#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

mod list;
mod num;
mod sweep;
mod tree;

use kurbo::Point;

use num::Quantizer;
use sweep::Sweeper;

/// A fill rule tells us which side of the input segments counts as "inside".
///
/// The winding number of a point is the signed sum of the windings of all
/// segments passing below it; the fill rule turns that number into a
/// yes-or-no answer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FillRule {
    /// The point is "inside" if its winding number is odd.
    EvenOdd,
    /// The point is "inside" if its winding number is non-zero.
    NonZero,
}

/// The input was faulty.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// The flat list of segment endpoints had odd length.
    UnpairedPoint,
    /// There wasn't exactly one winding per segment.
    WindingMismatch,
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs was not a number.
    NaN,
}

/// A triangle mesh in the input coordinate frame.
///
/// Each entry of `triangles` indexes three distinct entries of `points`.
/// Triangles never overlap each other; together they cover exactly the
/// filled region of the input.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Triangulation {
    /// The mesh vertices.
    pub points: Vec<Point>,
    /// Vertex index triples, one per triangle.
    pub triangles: Vec<[u32; 3]>,
}

/// Triangulates the filled region of a set of signed segments.
///
/// `segments` is a flat list of endpoints: each consecutive pair
/// `(segments[2i], segments[2i + 1])` is one oriented segment, and
/// `windings[i]` is its signed winding contribution. Segments may cross,
/// overlap, share endpoints or be vertical; the mesh comes out valid
/// regardless. Segments with a winding of zero are skipped (zero is how
/// the sweep marks its own internal helper edges), and two coincident
/// segments with opposite windings cancel — both are behavior, not errors.
///
/// # Errors
///
/// Fails if `segments` has odd length, if `windings` doesn't have one entry
/// per segment, or if any coordinate is infinite or NaN.
///
/// # Examples
///
/// ```
/// use kurbo::Point;
/// use sweeptess::{triangulate, FillRule};
///
/// let segments = [
///     Point::new(0.0, 0.0), Point::new(1.0, 0.0),
///     Point::new(1.0, 0.0), Point::new(1.0, 1.0),
///     Point::new(1.0, 1.0), Point::new(0.0, 1.0),
///     Point::new(0.0, 1.0), Point::new(0.0, 0.0),
/// ];
/// let mesh = triangulate(&segments, &[1, 1, 1, 1], FillRule::NonZero)?;
/// assert_eq!(mesh.triangles.len(), 2);
/// # Ok::<(), sweeptess::Error>(())
/// ```
pub fn triangulate(
    segments: &[Point],
    windings: &[i32],
    fill_rule: FillRule,
) -> Result<Triangulation, Error> {
    if segments.len() % 2 != 0 {
        return Err(Error::UnpairedPoint);
    }
    if segments.len() / 2 != windings.len() {
        return Err(Error::WindingMismatch);
    }
    for p in segments {
        if p.x.is_nan() || p.y.is_nan() {
            return Err(Error::NaN);
        }
        if p.x.is_infinite() || p.y.is_infinite() {
            return Err(Error::Infinity);
        }
    }

    let quantizer = Quantizer::new(segments);
    let mut sweeper = Sweeper::new(fill_rule);
    sweeper.ingest(segments, windings, &quantizer);
    sweeper.run();
    Ok(sweeper.finish(&quantizer))
}
