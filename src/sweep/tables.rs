//! Entity tables and the exact geometric predicates over them.
//!
//! Slices, points, edges and vertical markers are stored in typed vectors
//! and cross-linked by handles. Slices and points are interned: looking one
//! up by coordinate either finds the existing record or inserts a new one
//! in order. All predicates reduce to the sign of
//! `y * dir_x - x * dir_y - cross`, evaluated in exact integer arithmetic;
//! positive means the query point is above the edge's line.

use malachite::Integer;

use crate::num::{div_floor, div_round_nearest};
use crate::tree::NIL;

use super::Sweeper;

/// An index into the slice table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SliceIdx(pub u32);

/// A vector indexed by slices.
#[derive(Clone)]
pub(crate) struct SliceVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(SliceVec, SliceIdx, "sl");

/// An index into the point table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct PointIdx(pub u32);

/// A vector indexed by points.
#[derive(Clone)]
pub(crate) struct PointVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(PointVec, PointIdx, "p");

/// An index into the edge table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeIdx(pub u32);

/// A vector indexed by edges.
#[derive(Clone)]
pub(crate) struct EdgeVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(EdgeVec, EdgeIdx, "e");

/// An index into the vertical-marker table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct VerticalIdx(pub u32);

/// A vector indexed by vertical markers.
#[derive(Clone)]
pub(crate) struct VerticalVec<T> {
    inner: Vec<T>,
}

impl_typed_vec!(VerticalVec, VerticalIdx, "v");

/// An event column: everything that happens at one distinguished x.
#[derive(Debug)]
pub(crate) struct SliceRec {
    pub x: Integer,
    /// Points of this slice, ordered by y (simple tree).
    pub points_tree: u32,
    /// Paired start/end vertical markers, ordered by y (simple tree).
    pub vertical_tree: u32,
    /// Edges that need another look when the sweep reaches this slice.
    pub check_list: u32,
}

/// An event vertex on some slice.
#[derive(Debug)]
pub(crate) struct PointRec {
    pub slice: SliceIdx,
    pub x: Integer,
    pub y: Integer,
    /// Edges arriving at this point this slice, ordered by their old
    /// position in the active tree (simple tree).
    pub incoming_tree: u32,
    /// Edges leaving this point this slice, ordered by their new position
    /// in the active tree (simple tree).
    pub outgoing_tree: u32,
    /// Output vertex number plus one; 0 until the point is first emitted.
    pub used: u32,
}

/// A non-vertical oriented segment with `dir_x > 0`.
#[derive(Debug)]
pub(crate) struct EdgeRec {
    pub point_start: PointIdx,
    pub point_end: PointIdx,
    /// The most recent point that emitted this edge outgoingly; serves as
    /// the third vertex of this edge's trapezoid-cap triangles.
    pub point_outgoing: PointIdx,
    pub treenode_edges: u32,
    pub treenode_incoming: u32,
    pub treenode_outgoing: u32,
    pub listnode_incoming: u32,
    pub listnode_outgoing: u32,
    pub listnode_check: u32,
    /// The next slice at which this edge must be re-examined.
    pub next_check: SliceIdx,
    pub dir_x: Integer,
    pub dir_y: Integer,
    /// `y_start * dir_x - x_start * dir_y`; the line through the edge is
    /// exactly the set of points where `y * dir_x - x * dir_y` equals this.
    pub cross: Integer,
    pub min_y: Integer,
    pub max_y: Integer,
}

/// One end of a vertical input segment, resident in a slice's vertical tree.
#[derive(Debug)]
pub(crate) struct VerticalRec {
    pub y: Integer,
    pub is_start: bool,
}

impl Sweeper {
    /// Interns the slice at abscissa `x`.
    pub(super) fn add_slice(&mut self, x: Integer) -> SliceIdx {
        let mut insert_after = self.slices_tree;
        let mut current = self.tree[self.slices_tree].current.right;
        if current != NIL {
            loop {
                let slice = SliceIdx(self.tree[current].element);
                match x.cmp(&self.slices[slice].x) {
                    std::cmp::Ordering::Less => {
                        if self.tree[current].current.left != NIL {
                            current = self.tree[current].current.left;
                            continue;
                        }
                        insert_after = self.tree[current].current.prev;
                        break;
                    }
                    std::cmp::Ordering::Greater => {
                        if self.tree[current].current.right != NIL {
                            current = self.tree[current].current.right;
                            continue;
                        }
                        insert_after = current;
                        break;
                    }
                    std::cmp::Ordering::Equal => return slice,
                }
            }
        }
        let idx = self.slices.next_idx();
        let points_tree = self.tree.create(0, 0);
        let vertical_tree = self.tree.create(0, 0);
        let check_list = self.lists.create(0);
        let node = self.tree.create(idx.0, 0);
        self.tree.insert_simple(node, insert_after);
        self.slices.push(SliceRec {
            x,
            points_tree,
            vertical_tree,
            check_list,
        })
    }

    /// Interns the point at height `y` on `slice`.
    pub(super) fn add_point(&mut self, slice: SliceIdx, y: Integer) -> PointIdx {
        let points_tree = self.slices[slice].points_tree;
        let mut insert_after = points_tree;
        let mut current = self.tree[points_tree].current.right;
        if current != NIL {
            loop {
                let point = PointIdx(self.tree[current].element);
                match y.cmp(&self.points[point].y) {
                    std::cmp::Ordering::Less => {
                        if self.tree[current].current.left != NIL {
                            current = self.tree[current].current.left;
                            continue;
                        }
                        insert_after = self.tree[current].current.prev;
                        break;
                    }
                    std::cmp::Ordering::Greater => {
                        if self.tree[current].current.right != NIL {
                            current = self.tree[current].current.right;
                            continue;
                        }
                        insert_after = current;
                        break;
                    }
                    std::cmp::Ordering::Equal => return point,
                }
            }
        }
        let idx = self.points.next_idx();
        let incoming_tree = self.tree.create(0, 0);
        let outgoing_tree = self.tree.create(0, 0);
        let node = self.tree.create(idx.0, 0);
        self.tree.insert_simple(node, insert_after);
        let x = self.slices[slice].x.clone();
        self.points.push(PointRec {
            slice,
            x,
            y,
            incoming_tree,
            outgoing_tree,
            used: 0,
        })
    }

    /// Creates an edge from `start` to `end` and queues it for its start
    /// slice. `start` must lie strictly left of `end`.
    pub(super) fn add_edge(&mut self, start: PointIdx, end: PointIdx, winding: i32) {
        let idx = self.edges.next_idx();
        let dir_x = &self.points[end].x - &self.points[start].x;
        let dir_y = &self.points[end].y - &self.points[start].y;
        debug_assert!(dir_x > 0);
        let (min_y, max_y) = if dir_y >= 0 {
            (self.points[start].y.clone(), self.points[end].y.clone())
        } else {
            (self.points[end].y.clone(), self.points[start].y.clone())
        };
        let cross = &self.points[start].y * &dir_x - &self.points[start].x * &dir_y;
        let start_slice = self.points[start].slice;
        let edge = EdgeRec {
            point_start: start,
            point_end: end,
            point_outgoing: start,
            treenode_edges: self.tree.create(idx.0, winding),
            treenode_incoming: self.tree.create(idx.0, 0),
            treenode_outgoing: self.tree.create(idx.0, 0),
            listnode_incoming: self.lists.create(idx.0),
            listnode_outgoing: self.lists.create(idx.0),
            listnode_check: self.lists.create(idx.0),
            next_check: start_slice,
            dir_x,
            dir_y,
            cross,
            min_y,
            max_y,
        };
        let check_node = edge.listnode_check;
        self.edges.push(edge);
        let check_list = self.slices[start_slice].check_list;
        self.lists.insert(check_node, check_list);
    }

    /// Records a vertical input segment as a start/end marker pair on its
    /// slice, merging with any spans it touches or swallows.
    pub(super) fn add_vertical(&mut self, slice: SliceIdx, y_start: Integer, y_end: Integer) {
        debug_assert!(y_start < y_end);
        let vertical_tree = self.slices[slice].vertical_tree;
        let start;
        let mut current = self.tree[vertical_tree].current.right;
        if current == NIL {
            let idx = self.verticals.push(VerticalRec {
                y: y_start,
                is_start: true,
            });
            start = self.tree.create(idx.0, 0);
            self.tree.insert_simple(start, vertical_tree);
        } else {
            loop {
                let marker = VerticalIdx(self.tree[current].element);
                match y_start.cmp(&self.verticals[marker].y) {
                    std::cmp::Ordering::Less => {
                        if self.tree[current].current.left != NIL {
                            current = self.tree[current].current.left;
                            continue;
                        }
                        if self.verticals[marker].is_start {
                            // A gap precedes `current`; open our own span.
                            let after = self.tree[current].current.prev;
                            let idx = self.verticals.push(VerticalRec {
                                y: y_start,
                                is_start: true,
                            });
                            start = self.tree.create(idx.0, 0);
                            self.tree.insert_simple(start, after);
                        } else {
                            // We begin inside an existing span; reuse its start.
                            start = self.tree[current].current.prev;
                        }
                        break;
                    }
                    std::cmp::Ordering::Greater => {
                        if self.tree[current].current.right != NIL {
                            current = self.tree[current].current.right;
                            continue;
                        }
                        if !self.verticals[marker].is_start {
                            let idx = self.verticals.push(VerticalRec {
                                y: y_start,
                                is_start: true,
                            });
                            start = self.tree.create(idx.0, 0);
                            self.tree.insert_simple(start, current);
                        } else {
                            start = current;
                        }
                        break;
                    }
                    std::cmp::Ordering::Equal => {
                        start = if self.verticals[marker].is_start {
                            current
                        } else {
                            self.tree[current].current.prev
                        };
                        break;
                    }
                }
            }
        }
        // Swallow every marker up to our end, merging any spans in between.
        while self.tree[start].current.next != vertical_tree {
            let next = self.tree[start].current.next;
            let marker = VerticalIdx(self.tree[next].element);
            match y_end.cmp(&self.verticals[marker].y) {
                std::cmp::Ordering::Less => break,
                std::cmp::Ordering::Equal if !self.verticals[marker].is_start => break,
                _ => self.tree.remove_simple(next),
            }
        }
        let next = self.tree[start].current.next;
        if next == vertical_tree || self.verticals[VerticalIdx(self.tree[next].element)].is_start {
            let idx = self.verticals.push(VerticalRec {
                y: y_end,
                is_start: false,
            });
            let node = self.tree.create(idx.0, 0);
            self.tree.insert_simple(node, start);
        }
    }

    /// Does `point` land on `edge` once the edge's exact position is
    /// rounded to the grid? Evaluated at the point's x, or one to its right
    /// with `next_x`. Rounding is to nearest, with the half-way case going
    /// up, so each x has exactly one rounded y.
    pub(super) fn is_point_on_edge(&self, point: PointIdx, edge: EdgeIdx, next_x: bool) -> bool {
        let e = &self.edges[edge];
        let p = &self.points[point];
        let mut x = p.x.clone();
        if next_x {
            x += Integer::from(1);
        }
        let twice = (&p.y * &e.dir_x - &x * &e.dir_y - &e.cross) << 1u32;
        twice <= e.dir_x && &twice + &e.dir_x > 0
    }

    /// The edge's y at abscissa `x`, rounded to nearest with ties up.
    pub(super) fn edge_y_at(&self, edge: EdgeIdx, x: &Integer) -> Integer {
        let e = &self.edges[edge];
        div_round_nearest(x * &e.dir_y + &e.cross, &e.dir_x)
    }

    /// The y of the crossing of two non-parallel edges, rounded to nearest
    /// with ties up. `e1` must currently run below `e2` with the steeper
    /// slope, so the denominator is positive.
    pub(super) fn intersection_y(&self, e1: EdgeIdx, e2: EdgeIdx) -> Integer {
        let a = &self.edges[e1];
        let b = &self.edges[e2];
        let total = &b.cross * &a.dir_y - &a.cross * &b.dir_y;
        let factor = &a.dir_y * &b.dir_x - &b.dir_y * &a.dir_x;
        div_round_nearest(total, &factor)
    }

    /// Finds the last active edge whose line passes strictly below `(x, y)`,
    /// or the tree anchor if there is none.
    pub(super) fn edge_before(&self, x: &Integer, y: &Integer) -> u32 {
        let mut current = self.tree[self.edges_tree].current.right;
        if current == NIL {
            return self.edges_tree;
        }
        loop {
            let e = &self.edges[EdgeIdx(self.tree[current].element)];
            let cross = y * &e.dir_x - x * &e.dir_y - &e.cross;
            if cross > 0 {
                if self.tree[current].current.right != NIL {
                    current = self.tree[current].current.right;
                    continue;
                }
                return current;
            }
            if cross < 0 && self.tree[current].current.left != NIL {
                current = self.tree[current].current.left;
                continue;
            }
            return self.tree[current].current.prev;
        }
    }

    /// Like [`Sweeper::edge_before`], but breaks ties among edges through
    /// `(x, y)` by the heading toward `(end_x, end_y)`, so a starting edge
    /// lands between the collinear edges it slots among.
    pub(super) fn edge_before_with_heading(
        &self,
        x: &Integer,
        y: &Integer,
        end_x: &Integer,
        end_y: &Integer,
    ) -> u32 {
        let mut current = self.tree[self.edges_tree].current.right;
        if current == NIL {
            return self.edges_tree;
        }
        let a_x = end_x - x;
        let a_y = end_y - y;
        loop {
            let e = &self.edges[EdgeIdx(self.tree[current].element)];
            let cross = y * &e.dir_x - x * &e.dir_y - &e.cross;
            if cross > 0 {
                if self.tree[current].current.right != NIL {
                    current = self.tree[current].current.right;
                    continue;
                }
                return current;
            }
            if cross < 0 {
                if self.tree[current].current.left != NIL {
                    current = self.tree[current].current.left;
                    continue;
                }
                return self.tree[current].current.prev;
            }
            // Best effort, since edges are not guaranteed to be sorted by
            // their endpoints.
            let end = &self.points[e.point_end];
            let cross = &a_y * &(&end.x - x) - &a_x * &(&end.y - y);
            if cross > 0 {
                if self.tree[current].current.right != NIL {
                    current = self.tree[current].current.right;
                    continue;
                }
                return current;
            }
            if cross < 0 && self.tree[current].current.left != NIL {
                current = self.tree[current].current.left;
                continue;
            }
            return self.tree[current].current.prev;
        }
    }

    /// [`Sweeper::edge_before`] evaluated against the active tree as it was
    /// when `slice` began.
    pub(super) fn edge_before_previous(&self, slice: SliceIdx, y: &Integer) -> u32 {
        let version = slice.0;
        let mut current = self.tree.view(self.edges_tree, version).right;
        if current == NIL {
            return self.edges_tree;
        }
        let x = &self.slices[slice].x;
        loop {
            let e = &self.edges[EdgeIdx(self.tree[current].element)];
            let cross = y * &e.dir_x - x * &e.dir_y - &e.cross;
            let links = self.tree.view(current, version);
            if cross > 0 {
                if links.right != NIL {
                    current = links.right;
                    continue;
                }
                return current;
            }
            if cross < 0 && links.left != NIL {
                current = links.left;
                continue;
            }
            return links.prev;
        }
    }

    /// Finds the last point of `slice` on or below `edge`'s line, or the
    /// points-tree anchor if every point lies above it.
    pub(super) fn point_before_edge(&self, slice: SliceIdx, edge: EdgeIdx, next_x: bool) -> u32 {
        let points_tree = self.slices[slice].points_tree;
        let mut current = self.tree[points_tree].current.right;
        if current == NIL {
            return points_tree;
        }
        let e = &self.edges[edge];
        let mut x = self.slices[slice].x.clone();
        if next_x {
            x += Integer::from(1);
        }
        loop {
            let p = &self.points[PointIdx(self.tree[current].element)];
            let cross = &p.y * &e.dir_x - &x * &e.dir_y - &e.cross;
            if cross > 0 {
                if self.tree[current].current.left != NIL {
                    current = self.tree[current].current.left;
                    continue;
                }
                return self.tree[current].current.prev;
            }
            if cross < 0 && self.tree[current].current.right != NIL {
                current = self.tree[current].current.right;
                continue;
            }
            return current;
        }
    }

    /// Finds the node in `point`'s incoming tree after which an edge with
    /// previous-view position `index` belongs.
    pub(super) fn incoming_slot(&self, point: PointIdx, index: u32) -> u32 {
        let incoming_tree = self.points[point].incoming_tree;
        let mut current = self.tree[incoming_tree].current.right;
        if current == NIL {
            return incoming_tree;
        }
        loop {
            let member = EdgeIdx(self.tree[current].element);
            let member_index = self.tree[self.edges[member].treenode_edges].previous.index;
            if index > member_index {
                if self.tree[current].current.right != NIL {
                    current = self.tree[current].current.right;
                    continue;
                }
                return current;
            }
            if index < member_index && self.tree[current].current.left != NIL {
                current = self.tree[current].current.left;
                continue;
            }
            return self.tree[current].current.prev;
        }
    }

    /// Finds the node in `point`'s outgoing tree after which an edge with
    /// current position `index` belongs.
    pub(super) fn outgoing_slot(&self, point: PointIdx, index: u32) -> u32 {
        let outgoing_tree = self.points[point].outgoing_tree;
        let mut current = self.tree[outgoing_tree].current.right;
        if current == NIL {
            return outgoing_tree;
        }
        loop {
            let member = EdgeIdx(self.tree[current].element);
            let member_index = self.tree[self.edges[member].treenode_edges].current.index;
            if index > member_index {
                if self.tree[current].current.right != NIL {
                    current = self.tree[current].current.right;
                    continue;
                }
                return current;
            }
            if index < member_index && self.tree[current].current.left != NIL {
                current = self.tree[current].current.left;
                continue;
            }
            return self.tree[current].current.prev;
        }
    }

    /// Checks whether the edge at `treenode_edge` crosses its upward
    /// neighbour before either of them is next examined anyway, and if so
    /// schedules the crossing slice. The crossing x is rounded toward
    /// negative infinity so the two edges still sort in their current order
    /// at the slice where the swap check fires.
    pub(super) fn schedule_crossing(&mut self, treenode_edge: u32) {
        debug_assert!(
            treenode_edge != self.edges_tree
                && self.tree[treenode_edge].current.next != self.edges_tree
        );
        let e1 = EdgeIdx(self.tree[treenode_edge].element);
        let e2 = EdgeIdx(self.tree[self.tree[treenode_edge].current.next].element);
        let x = {
            let a = &self.edges[e1];
            let b = &self.edges[e2];
            if a.max_y < b.min_y || a.point_start == b.point_start {
                return;
            }
            let horizon = (&self.slices[a.next_check].x).min(&self.slices[b.next_check].x);
            if (horizon * &b.dir_y + &b.cross) * &a.dir_x
                >= (horizon * &a.dir_y + &a.cross) * &b.dir_x
            {
                return;
            }
            let total = &b.cross * &a.dir_x - &a.cross * &b.dir_x;
            let factor = &a.dir_y * &b.dir_x - &b.dir_y * &a.dir_x;
            div_floor(total, &factor)
        };
        let slice = self.add_slice(x);
        self.edges[e1].next_check = slice;
        let check_node = self.edges[e1].listnode_check;
        let check_list = self.slices[slice].check_list;
        self.lists.insert(check_node, check_list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FillRule;

    fn int(v: i64) -> Integer {
        Integer::from(v)
    }

    fn sweeper() -> Sweeper {
        Sweeper::new(FillRule::NonZero)
    }

    fn slice_xs(s: &Sweeper) -> Vec<i64> {
        let mut out = Vec::new();
        let mut iter = s.tree[s.slices_tree].current.next;
        while iter != s.slices_tree {
            let slice = SliceIdx(s.tree[iter].element);
            out.push(i64::try_from(&s.slices[slice].x).unwrap());
            iter = s.tree[iter].current.next;
        }
        out
    }

    fn markers(s: &Sweeper, slice: SliceIdx) -> Vec<(i64, bool)> {
        let mut out = Vec::new();
        let mut iter = s.tree[s.slices[slice].vertical_tree].current.next;
        while iter != s.slices[slice].vertical_tree {
            let v = &s.verticals[VerticalIdx(s.tree[iter].element)];
            out.push((i64::try_from(&v.y).unwrap(), v.is_start));
            iter = s.tree[iter].current.next;
        }
        out
    }

    #[test]
    fn slices_intern_in_order() {
        let mut s = sweeper();
        let a = s.add_slice(int(5));
        let b = s.add_slice(int(-3));
        let c = s.add_slice(int(9));
        assert_eq!(s.add_slice(int(5)), a);
        assert_eq!(s.add_slice(int(-3)), b);
        assert_eq!(s.add_slice(int(9)), c);
        assert_eq!(slice_xs(&s), vec![-3, 5, 9]);
    }

    #[test]
    fn points_intern_per_slice() {
        let mut s = sweeper();
        let sl = s.add_slice(int(0));
        let p1 = s.add_point(sl, int(4));
        let p2 = s.add_point(sl, int(-1));
        assert_eq!(s.add_point(sl, int(4)), p1);
        assert!(p1 != p2);
        // The same y on a different slice is a different point.
        let other = s.add_slice(int(7));
        assert!(s.add_point(other, int(4)) != p1);
    }

    #[test]
    fn vertical_spans_merge() {
        let mut s = sweeper();
        let sl = s.add_slice(int(0));
        s.add_vertical(sl, int(0), int(2));
        s.add_vertical(sl, int(5), int(8));
        assert_eq!(
            markers(&s, sl),
            vec![(0, true), (2, false), (5, true), (8, false)]
        );

        // Overlapping the first span extends it.
        s.add_vertical(sl, int(1), int(3));
        assert_eq!(
            markers(&s, sl),
            vec![(0, true), (3, false), (5, true), (8, false)]
        );

        // Touching spans merge into one.
        s.add_vertical(sl, int(3), int(5));
        assert_eq!(markers(&s, sl), vec![(0, true), (8, false)]);

        // A span swallowed whole changes nothing.
        s.add_vertical(sl, int(2), int(6));
        assert_eq!(markers(&s, sl), vec![(0, true), (8, false)]);
    }

    /// Builds an edge from `(x0, y0)` to `(x1, y1)` and returns its index.
    fn edge(s: &mut Sweeper, x0: i64, y0: i64, x1: i64, y1: i64) -> EdgeIdx {
        let start = {
            let sl = s.add_slice(int(x0));
            s.add_point(sl, int(y0))
        };
        let end = {
            let sl = s.add_slice(int(x1));
            s.add_point(sl, int(y1))
        };
        let idx = s.edges.next_idx();
        s.add_edge(start, end, 1);
        idx
    }

    #[test]
    fn edge_y_rounds_to_nearest_ties_up() {
        let mut s = sweeper();
        let e = edge(&mut s, 0, 0, 2, 1);
        assert_eq!(s.edge_y_at(e, &int(0)), int(0));
        // Exactly half-way rounds up.
        assert_eq!(s.edge_y_at(e, &int(1)), int(1));
        assert_eq!(s.edge_y_at(e, &int(2)), int(1));

        let down = edge(&mut s, 0, 1, 2, 0);
        assert_eq!(s.edge_y_at(down, &int(1)), int(1));
    }

    #[test]
    fn point_on_edge_accepts_one_row_per_x() {
        let mut s = sweeper();
        let e = edge(&mut s, 0, 0, 2, 1);
        let sl = s.add_slice(int(1));
        let above = s.add_point(sl, int(1));
        let below = s.add_point(sl, int(0));
        let far = s.add_point(sl, int(2));
        assert!(s.is_point_on_edge(above, e, false));
        assert!(!s.is_point_on_edge(below, e, false));
        assert!(!s.is_point_on_edge(far, e, false));
    }

    #[test]
    fn intersection_y_of_crossing_edges() {
        let mut s = sweeper();
        // Crosses at (2, 2): rising from below, falling from above.
        let lo = edge(&mut s, 0, 0, 4, 4);
        let hi = edge(&mut s, 0, 4, 4, 0);
        assert_eq!(s.intersection_y(lo, hi), int(2));
    }
}
