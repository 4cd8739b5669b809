use kurbo::Point;
use sweeptess::{triangulate, FillRule, Triangulation};

/// Turns closed loops (vertex lists) into the flat segment/winding input.
fn loops_to_input(loops: &[(&[(f64, f64)], i32)]) -> (Vec<Point>, Vec<i32>) {
    let mut segments = Vec::new();
    let mut windings = Vec::new();
    for &(vertices, winding) in loops {
        for i in 0..vertices.len() {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % vertices.len()];
            segments.push(Point::new(x0, y0));
            segments.push(Point::new(x1, y1));
            windings.push(winding);
        }
    }
    (segments, windings)
}

fn fill(loops: &[(&[(f64, f64)], i32)], rule: FillRule) -> Triangulation {
    let (segments, windings) = loops_to_input(loops);
    triangulate(&segments, &windings, rule).unwrap()
}

fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() / 2.0
}

/// Total covered area. Valid as a region measure because the emitted
/// triangles never overlap.
fn covered_area(mesh: &Triangulation) -> f64 {
    mesh.triangles
        .iter()
        .map(|t| {
            let [a, b, c] = t.map(|i| mesh.points[i as usize]);
            triangle_area(a, b, c)
        })
        .sum()
}

/// Is `(x, y)` inside some (closed) triangle of the mesh? Points on a
/// shared internal edge count as covered.
fn covers(mesh: &Triangulation, x: f64, y: f64) -> bool {
    mesh.triangles.iter().any(|t| {
        let [a, b, c] = t.map(|i| mesh.points[i as usize]);
        let s0 = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
        let s1 = (c.x - b.x) * (y - b.y) - (c.y - b.y) * (x - b.x);
        let s2 = (a.x - c.x) * (y - c.y) - (a.y - c.y) * (x - c.x);
        (s0 >= 0.0 && s1 >= 0.0 && s2 >= 0.0) || (s0 <= 0.0 && s1 <= 0.0 && s2 <= 0.0)
    })
}

/// The mesh as an unordered set of coordinate triangles, for comparing runs.
fn canonical(mesh: &Triangulation) -> Vec<[(f64, f64); 3]> {
    let mut triangles: Vec<[(f64, f64); 3]> = mesh
        .triangles
        .iter()
        .map(|t| {
            let mut corners = t.map(|i| {
                let p = mesh.points[i as usize];
                (p.x, p.y)
            });
            corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
            corners
        })
        .collect();
    triangles.sort_by(|a, b| a.partial_cmp(b).unwrap());
    triangles
}

fn assert_distinct_indices(mesh: &Triangulation) {
    for t in &mesh.triangles {
        assert!(t[0] != t[1] && t[0] != t[2] && t[1] != t[2], "{t:?}");
        assert!(t.iter().all(|&i| (i as usize) < mesh.points.len()));
    }
}

const SQUARE: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

#[test]
fn unit_square_non_zero() {
    let mesh = fill(&[(SQUARE, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(mesh.triangles.len(), 2);
    assert_eq!(covered_area(&mesh), 1.0);
    for p in &mesh.points {
        assert!(SQUARE.contains(&(p.x, p.y)));
    }
    assert!(covers(&mesh, 0.5, 0.5));
    assert!(!covers(&mesh, 1.5, 0.5));
}

#[test]
fn unit_square_clockwise_even_odd() {
    // Same geometry, traversed with negative winding: the fill is the same.
    let mesh = fill(&[(SQUARE, -1)], FillRule::EvenOdd);
    assert_distinct_indices(&mesh);
    assert_eq!(mesh.triangles.len(), 2);
    assert_eq!(covered_area(&mesh), 1.0);
}

#[test]
fn square_with_hole() {
    let outer: &[(f64, f64)] = &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
    // The inner square runs clockwise, cancelling the outer winding.
    let inner: &[(f64, f64)] = &[(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)];
    let mesh = fill(&[(outer, 1), (inner, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(covered_area(&mesh), 12.0);
    assert!(covers(&mesh, 0.5, 2.0));
    assert!(covers(&mesh, 3.5, 2.0));
    assert!(covers(&mesh, 2.0, 0.5));
    assert!(covers(&mesh, 2.0, 3.5));
    assert!(!covers(&mesh, 2.0, 2.0));
}

#[test]
fn bowtie_even_odd() {
    let segments = [
        Point::new(0.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(1.0, 1.0),
    ];
    let mesh = triangulate(&segments, &[1, 1, 1, 1], FillRule::EvenOdd).unwrap();
    assert_distinct_indices(&mesh);
    assert_eq!(mesh.triangles.len(), 2);
    assert_eq!(covered_area(&mesh), 0.5);
    // One triangle per lobe, neither spanning the crossing; the crossing
    // itself becomes a mesh vertex.
    assert!(covers(&mesh, 0.5, 0.1));
    assert!(covers(&mesh, 0.5, 0.9));
    assert!(!covers(&mesh, 0.2, 0.5));
    assert!(!covers(&mesh, 0.8, 0.5));
    assert!(mesh.points.iter().any(|p| (p.x, p.y) == (0.5, 0.5)));
}

#[test]
fn notched_block() {
    // A block with a rectangular notch cut into its top. The two concave
    // corners at the notch bottom force helper diagonals.
    let outline: &[(f64, f64)] = &[
        (0.0, 0.0),
        (3.0, 0.0),
        (3.0, 3.0),
        (2.0, 3.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 3.0),
        (0.0, 3.0),
    ];
    let mesh = fill(&[(outline, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(covered_area(&mesh), 7.0);
    assert!(covers(&mesh, 0.5, 1.2));
    assert!(covers(&mesh, 2.5, 1.2));
    assert!(covers(&mesh, 1.5, 0.5));
    assert!(!covers(&mesh, 1.5, 2.0));
    for p in &mesh.points {
        assert!(outline.contains(&(p.x, p.y)), "unexpected vertex {p:?}");
    }
}

#[test]
fn off_grid_crossing_rounds_cleanly() {
    // The hypotenuses cross at (11/5, 4/5), which is not representable on
    // the binary grid; the intersection vertex is rounded but the mesh
    // still covers the union to within the grid spacing.
    let a: &[(f64, f64)] = &[(0.0, 0.0), (3.0, 0.0), (0.0, 3.0)];
    let b: &[(f64, f64)] = &[(1.0, 0.0), (4.0, 2.0), (1.0, 2.0)];
    let mesh = fill(&[(a, 1), (b, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert!((covered_area(&mesh) - 6.3).abs() < 1e-9);
    assert!(covers(&mesh, 2.0, 0.5));
    assert!(covers(&mesh, 2.0, 1.5));
    assert!(covers(&mesh, 0.5, 0.5));
    assert!(!covers(&mesh, 3.5, 0.5));
}

#[test]
fn pentagram_fill_rules_differ() {
    // A five-pointed star drawn as one self-intersecting loop. The core
    // pentagon has winding two: non-zero keeps it, even-odd drops it.
    let mut outer = Vec::new();
    for i in 0..5 {
        let angle = std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::TAU / 5.0;
        outer.push((2.0 * angle.cos(), 2.0 * angle.sin()));
    }
    let star: Vec<(f64, f64)> = (0..5).map(|i| outer[(2 * i) % 5]).collect();
    let non_zero = fill(&[(&star[..], 1)], FillRule::NonZero);
    let even_odd = fill(&[(&star[..], 1)], FillRule::EvenOdd);
    assert_distinct_indices(&non_zero);
    assert_distinct_indices(&even_odd);
    assert!(covers(&non_zero, 0.0, 0.0));
    assert!(!covers(&even_odd, 0.0, 0.0));
    // The star points belong to both fills.
    assert!(covers(&non_zero, 0.0, 1.7));
    assert!(covers(&even_odd, 0.0, 1.7));
    let core = covered_area(&non_zero) - covered_area(&even_odd);
    assert!(core > 0.0);
    assert!(covered_area(&even_odd) > core);
}

#[test]
fn overlapping_rectangles_cancel() {
    // The second rectangle is the right half of the first, with opposite
    // winding; only the left half survives. The shared right edge, the
    // collinear top/bottom runs and the coincident verticals all overlap.
    let big: &[(f64, f64)] = &[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)];
    let half: &[(f64, f64)] = &[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)];
    let mesh = fill(&[(big, 1), (half, -1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(covered_area(&mesh), 1.0);
    assert!(covers(&mesh, 0.5, 0.5));
    assert!(!covers(&mesh, 1.5, 0.5));
}

#[test]
fn triangle_with_cevians() {
    // Three concurrent cevians through the centroid subdivide the triangle
    // into its six median triangles, and the mesh follows that subdivision.
    let (mut segments, mut windings) = loops_to_input(&[(
        &[(0.0, 0.0), (6.0, 0.0), (3.0, 6.0)] as &[(f64, f64)],
        1,
    )]);
    let cevians = [
        ((0.0, 0.0), (4.5, 3.0)),
        ((1.5, 3.0), (6.0, 0.0)),
        ((3.0, 6.0), (3.0, 0.0)),
    ];
    for ((x0, y0), (x1, y1)) in cevians {
        segments.push(Point::new(x0, y0));
        segments.push(Point::new(x1, y1));
        windings.push(1);
    }
    let mesh = triangulate(&segments, &windings, FillRule::NonZero).unwrap();
    assert_distinct_indices(&mesh);
    assert_eq!(mesh.triangles.len(), 6);
    assert_eq!(covered_area(&mesh), 18.0);
    let expected = [
        (0.0, 0.0),
        (6.0, 0.0),
        (3.0, 6.0),
        (3.0, 0.0),
        (4.5, 3.0),
        (1.5, 3.0),
        (3.0, 2.0),
    ];
    for p in &mesh.points {
        assert!(expected.contains(&(p.x, p.y)), "unexpected vertex {p:?}");
    }
}

#[test]
fn coincident_opposite_segments_cancel() {
    let (mut segments, mut windings) = loops_to_input(&[(SQUARE, 1)]);
    let (more_segments, _) = loops_to_input(&[(SQUARE, 1)]);
    segments.extend(more_segments);
    windings.extend([-1, -1, -1, -1]);
    let mesh = triangulate(&segments, &windings, FillRule::NonZero).unwrap();
    assert!(mesh.triangles.is_empty());
}

#[test]
fn coincident_identical_segments_add() {
    // Doubling every segment doubles the winding; even-odd then sees an
    // even count everywhere and fills nothing, while non-zero still fills.
    let (mut segments, mut windings) = loops_to_input(&[(SQUARE, 1)]);
    let (more_segments, more_windings) = loops_to_input(&[(SQUARE, 1)]);
    segments.extend(more_segments);
    windings.extend(more_windings);
    let even_odd = triangulate(&segments, &windings, FillRule::EvenOdd).unwrap();
    assert_eq!(covered_area(&even_odd), 0.0);
    let non_zero = triangulate(&segments, &windings, FillRule::NonZero).unwrap();
    assert_eq!(covered_area(&non_zero), 1.0);
}

#[test]
fn collinear_segments_are_empty() {
    let segments = [
        Point::new(0.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(0.5, 0.0),
        Point::new(2.5, 0.0),
    ];
    let mesh = triangulate(&segments, &[1, 1, 1], FillRule::NonZero).unwrap();
    assert!(mesh.triangles.is_empty());
}

#[test]
fn single_segment_is_empty() {
    let segments = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    let mesh = triangulate(&segments, &[1], FillRule::NonZero).unwrap();
    assert!(mesh.triangles.is_empty());
    assert!(mesh.points.is_empty());
}

#[test]
fn vertical_segments_are_markers_not_edges() {
    // A sliver between two verticals and two near-horizontal edges; the
    // verticals only contribute through the points they pin down.
    let quad: &[(f64, f64)] = &[(0.0, 0.0), (2.0, 0.0), (2.0, 3.0), (0.0, 1.0)];
    let mesh = fill(&[(quad, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(covered_area(&mesh), 4.0);
    assert!(covers(&mesh, 1.0, 0.5));
    assert!(!covers(&mesh, 1.0, 2.5));
}

#[test]
fn endpoint_crossings_add_no_vertices() {
    // Two triangles meeting exactly at (1, 1): the mesh introduces no
    // vertex besides the input corners.
    let lower: &[(f64, f64)] = &[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0)];
    let upper: &[(f64, f64)] = &[(1.0, 1.0), (2.0, 2.0), (0.0, 2.0)];
    let mesh = fill(&[(lower, 1), (upper, 1)], FillRule::NonZero);
    assert_distinct_indices(&mesh);
    assert_eq!(covered_area(&mesh), 2.0);
    let inputs: Vec<(f64, f64)> = lower.iter().chain(upper).copied().collect();
    for p in &mesh.points {
        assert!(inputs.contains(&(p.x, p.y)), "unexpected vertex {p:?}");
    }
}

#[test]
fn crossing_squares_non_zero() {
    // Two unit squares overlapping in a 1x1 corner region; non-zero keeps
    // the union, even-odd drops the doubly-wound overlap.
    let a: &[(f64, f64)] = &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
    let b: &[(f64, f64)] = &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)];
    let non_zero = fill(&[(a, 1), (b, 1)], FillRule::NonZero);
    assert_distinct_indices(&non_zero);
    assert_eq!(covered_area(&non_zero), 7.0);
    let even_odd = fill(&[(a, 1), (b, 1)], FillRule::EvenOdd);
    assert_eq!(covered_area(&even_odd), 6.0);
    assert!(!covers(&even_odd, 1.5, 1.5));
    assert!(covers(&non_zero, 1.5, 1.5));
}

#[test]
fn uniform_scaling_scales_the_mesh() {
    let mesh = fill(&[(SQUARE, 1)], FillRule::NonZero);
    let scaled_input: Vec<(f64, f64)> = SQUARE.iter().map(|&(x, y)| (4.0 * x, 4.0 * y)).collect();
    let scaled = fill(&[(&scaled_input[..], 1)], FillRule::NonZero);
    let expected: Vec<[(f64, f64); 3]> = canonical(&mesh)
        .into_iter()
        .map(|t| t.map(|(x, y)| (4.0 * x, 4.0 * y)))
        .collect();
    assert_eq!(canonical(&scaled), expected);
}

#[test]
fn deterministic_across_runs() {
    let loops: &[(&[(f64, f64)], i32)] = &[
        (&[(0.0, 0.0), (5.0, 1.0), (4.0, 4.0), (1.0, 3.0)], 1),
        (&[(2.0, 1.0), (3.0, 1.0), (3.0, 2.0), (2.0, 2.0)], 1),
    ];
    let first = fill(loops, FillRule::NonZero);
    let second = fill(loops, FillRule::NonZero);
    assert_eq!(first, second);
}
