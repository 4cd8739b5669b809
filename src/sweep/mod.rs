//! The plane sweep.
//!
//! The sweep walks event columns ("slices") left to right, keeping the
//! edges that cross the current abscissa in a y-ordered active tree. Each
//! slice runs a fixed sequence of phases: edges ending here are retired,
//! vertical segments split the edges they cross, edges starting here are
//! admitted, order inversions are resolved into intersection points, edges
//! are attached to the points they pass through, trapezoid-cap triangles
//! are emitted for the filled columns, helper diagonals are synthesized
//! under concave features, and upcoming crossings are scheduled.
//!
//! The active tree is the weighted, partially persistent flavour, and the
//! slice is the persistence version: triangle emission and incoming-edge
//! bookkeeping read the tree *as it stood when the slice began*, even
//! though earlier phases of the same slice have already reshuffled it.

mod tables;

use kurbo::Point;
use malachite::Integer;

use crate::list::ListPool;
use crate::num::Quantizer;
use crate::tree::{TreePool, NIL};
use crate::{FillRule, Triangulation};

use tables::{EdgeIdx, PointIdx, SliceIdx, VerticalIdx};
use tables::{EdgeRec, EdgeVec, PointRec, PointVec, SliceRec, SliceVec, VerticalRec, VerticalVec};

/// The whole sweep state for one triangulation run.
pub(crate) struct Sweeper {
    tree: TreePool,
    lists: ListPool,
    slices: SliceVec<SliceRec>,
    points: PointVec<PointRec>,
    edges: EdgeVec<EdgeRec>,
    verticals: VerticalVec<VerticalRec>,
    /// Anchor of the tree holding all slices in x order.
    slices_tree: u32,
    /// Anchor of the active-edge tree (weighted, persistent).
    edges_tree: u32,
    /// Transient queue of edges arriving at a point this slice.
    incoming_list: u32,
    /// Transient queue of edges leaving a point this slice.
    outgoing_list: u32,
    fill_rule: FillRule,
    /// Emitted triangles, as point-handle triples.
    triangles: Vec<PointIdx>,
}

impl Sweeper {
    pub fn new(fill_rule: FillRule) -> Self {
        let mut tree = TreePool::new();
        let mut lists = ListPool::new();
        let edges_tree = tree.create(0, 0);
        let slices_tree = tree.create(0, 0);
        let incoming_list = lists.create(0);
        let outgoing_list = lists.create(0);
        Sweeper {
            tree,
            lists,
            slices: SliceVec::default(),
            points: PointVec::default(),
            edges: EdgeVec::default(),
            verticals: VerticalVec::default(),
            slices_tree,
            edges_tree,
            incoming_list,
            outgoing_list,
            fill_rule,
            triangles: Vec::new(),
        }
    }

    /// Loads the input segments, normalizing each one so that edges run in
    /// increasing x (flipping the winding as needed) and vertical segments
    /// become marker pairs.
    pub fn ingest(&mut self, segments: &[Point], windings: &[i32], quantizer: &Quantizer) {
        for (i, &winding) in windings.iter().enumerate() {
            if winding == 0 {
                // Zero windings are reserved for internal helper edges, so
                // they cannot come from the caller.
                continue;
            }
            let (start_x, start_y) = quantizer.to_grid(segments[2 * i]);
            let (end_x, end_y) = quantizer.to_grid(segments[2 * i + 1]);
            match start_x.cmp(&end_x) {
                std::cmp::Ordering::Less => {
                    let start_slice = self.add_slice(start_x);
                    let start = self.add_point(start_slice, start_y);
                    let end_slice = self.add_slice(end_x);
                    let end = self.add_point(end_slice, end_y);
                    self.add_edge(start, end, winding);
                }
                std::cmp::Ordering::Greater => {
                    let start_slice = self.add_slice(end_x);
                    let start = self.add_point(start_slice, end_y);
                    let end_slice = self.add_slice(start_x);
                    let end = self.add_point(end_slice, start_y);
                    self.add_edge(start, end, -winding);
                }
                std::cmp::Ordering::Equal => match start_y.cmp(&end_y) {
                    std::cmp::Ordering::Less => {
                        let slice = self.add_slice(start_x);
                        self.add_vertical(slice, start_y, end_y);
                    }
                    std::cmp::Ordering::Greater => {
                        let slice = self.add_slice(start_x);
                        self.add_vertical(slice, end_y, start_y);
                    }
                    // A degenerate point contributes nothing.
                    std::cmp::Ordering::Equal => {}
                },
            }
        }
    }

    /// Runs the sweep over every slice, including the ones discovered along
    /// the way.
    pub fn run(&mut self) {
        let mut slice_iter = self.tree[self.slices_tree].current.next;
        while slice_iter != self.slices_tree {
            let slice = SliceIdx(self.tree[slice_iter].element);

            self.retire_ending(slice);
            self.cross_verticals(slice);
            self.admit_starting(slice);
            self.resolve_inversions(slice);
            self.attach_incoming(slice);
            self.attach_outgoing(slice);
            self.drop_unused_points(slice);
            self.force_passthrough(slice);
            self.emit_triangles(slice);
            self.update_outgoing_anchors(slice);
            self.insert_helpers(slice);
            self.schedule_crossings(slice);
            self.clear_point_trees(slice);

            debug_assert!(self.lists[self.incoming_list].next == self.incoming_list);
            debug_assert!(self.lists[self.outgoing_list].next == self.outgoing_list);
            #[cfg(feature = "slow-asserts")]
            {
                self.tree.check_invariants(self.edges_tree, true);
                self.tree.check_invariants(self.slices_tree, false);
            }

            slice_iter = self.tree[slice_iter].current.next;
        }
        debug_assert!(self.tree[self.edges_tree].current.right == NIL);
    }

    /// Phase 1: retire every queued edge whose end point sits on this
    /// slice, queueing its tree predecessor for a fresh neighbour check.
    fn retire_ending(&mut self, slice: SliceIdx) {
        let check_list = self.slices[slice].check_list;
        let mut check_iter = self.lists[check_list].next;
        while check_iter != check_list {
            let edge = EdgeIdx(self.lists[check_iter].element);
            debug_assert!(self.edges[edge].next_check == slice);
            let check_iter_next = self.lists[check_iter].next;
            if self.points[self.edges[edge].point_end].slice == slice {
                let prev = self.tree[self.edges[edge].treenode_edges].current.prev;
                if prev != self.edges_tree {
                    let prev_edge = EdgeIdx(self.tree[prev].element);
                    self.edges[prev_edge].next_check = slice;
                    let node = self.edges[prev_edge].listnode_check;
                    self.lists.insert(node, check_list);
                }
                let node = self.edges[edge].listnode_incoming;
                self.lists.insert(node, self.incoming_list);
                let treenode = self.edges[edge].treenode_edges;
                self.tree.remove_weighted(treenode, slice.0);
                self.lists.remove(check_iter);
            }
            check_iter = check_iter_next;
        }
    }

    /// Phase 2: for each vertical span on this slice, intern a point on
    /// every active edge crossing the span and queue those edges as both
    /// incoming and outgoing, so the verticals show up in the mesh.
    fn cross_verticals(&mut self, slice: SliceIdx) {
        let vertical_tree = self.slices[slice].vertical_tree;
        let mut vertical_iter = self.tree[vertical_tree].current.next;
        while vertical_iter != vertical_tree {
            let start = VerticalIdx(self.tree[vertical_iter].element);
            debug_assert!(self.verticals[start].is_start);
            let mut treenode_edge =
                self.edge_before(&self.slices[slice].x, &self.verticals[start].y);
            vertical_iter = self.tree[vertical_iter].current.next;
            debug_assert!(vertical_iter != vertical_tree);
            let end = VerticalIdx(self.tree[vertical_iter].element);
            debug_assert!(!self.verticals[end].is_start);
            loop {
                let next = self.tree[treenode_edge].current.next;
                if next == self.edges_tree {
                    break;
                }
                treenode_edge = next;
                let edge = EdgeIdx(self.tree[treenode_edge].element);
                {
                    let e = &self.edges[edge];
                    let end_y = &self.verticals[end].y;
                    let cross = end_y * &e.dir_x - &self.slices[slice].x * &e.dir_y - &e.cross;
                    // Stop at the first edge that reaches the span's top.
                    if cross <= 0 {
                        break;
                    }
                }
                let y = self.edge_y_at(edge, &self.slices[slice].x);
                let point = self.add_point(slice, y);
                debug_assert!(self.is_point_on_edge(point, edge, false));
                let node = self.edges[edge].listnode_incoming;
                self.lists.insert(node, self.incoming_list);
                let node = self.edges[edge].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
            }
            vertical_iter = self.tree[vertical_iter].current.next;
        }
    }

    /// Phase 3: admit every queued edge whose start point sits on this
    /// slice, inserting it at its y position (slope-tie-broken) and
    /// queueing its new predecessor.
    fn admit_starting(&mut self, slice: SliceIdx) {
        let check_list = self.slices[slice].check_list;
        let mut check_iter = self.lists[check_list].next;
        while check_iter != check_list {
            let edge = EdgeIdx(self.lists[check_iter].element);
            debug_assert!(self.edges[edge].next_check == slice);
            if self.points[self.edges[edge].point_start].slice == slice {
                let cursor = {
                    let start = &self.points[self.edges[edge].point_start];
                    let end = &self.points[self.edges[edge].point_end];
                    self.edge_before_with_heading(&self.slices[slice].x, &start.y, &end.x, &end.y)
                };
                let node = self.edges[edge].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
                let treenode = self.edges[edge].treenode_edges;
                self.tree.insert_weighted(treenode, cursor, slice.0);
                if cursor != self.edges_tree {
                    let prev_edge = EdgeIdx(self.tree[cursor].element);
                    self.edges[prev_edge].next_check = slice;
                    let node = self.edges[prev_edge].listnode_check;
                    self.lists.insert(node, check_list);
                }
            }
            check_iter = self.lists[check_iter].next;
        }
    }

    /// Phase 4: drain the check list, comparing each edge against its
    /// upward neighbour one abscissa ahead. Pairs that would be out of
    /// order there meet at an intersection on this slice: helper edges are
    /// retired on the spot, real pairs swap places.
    fn resolve_inversions(&mut self, slice: SliceIdx) {
        let x_next = &self.slices[slice].x + Integer::from(1);
        let check_list = self.slices[slice].check_list;
        while self.lists[check_list].next != check_list {
            let edge = EdgeIdx(self.lists[self.lists[check_list].next].element);
            debug_assert!(self.edges[edge].next_check == slice);
            // Reset the next check to the edge's end; a found intersection
            // will pull it closer again.
            let end_slice = self.points[self.edges[edge].point_end].slice;
            self.edges[edge].next_check = end_slice;
            let node = self.edges[edge].listnode_check;
            let end_check_list = self.slices[end_slice].check_list;
            self.lists.insert(node, end_check_list);
            let treenode_next = self.tree[self.edges[edge].treenode_edges].current.next;
            if treenode_next == self.edges_tree {
                continue;
            }
            let edge_next = EdgeIdx(self.tree[treenode_next].element);
            {
                let e1 = &self.edges[edge];
                let e2 = &self.edges[edge_next];
                if e1.max_y < e2.min_y {
                    continue;
                }
                if (&x_next * &e2.dir_y + &e2.cross) * &e1.dir_x
                    >= (&x_next * &e1.dir_y + &e1.cross) * &e2.dir_x
                {
                    continue;
                }
            }
            let y = self.intersection_y(edge, edge_next);
            self.add_point(slice, y);
            if self.tree[self.edges[edge].treenode_edges].self_value == 0 {
                // The lower edge is a helper: it dies at the crossing.
                let treenode = self.edges[edge].treenode_edges;
                self.tree.remove_weighted(treenode, slice.0);
                if self.points[self.edges[edge].point_start].slice != slice {
                    let node = self.edges[edge].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                if self.points[self.edges[edge_next].point_start].slice != slice {
                    let node = self.edges[edge_next].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                let node = self.edges[edge_next].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
                self.lists.remove(self.edges[edge].listnode_check);
                let prev = self.tree[treenode_next].current.prev;
                if prev != self.edges_tree {
                    let prev_edge = EdgeIdx(self.tree[prev].element);
                    self.edges[prev_edge].next_check = slice;
                    let node = self.edges[prev_edge].listnode_check;
                    self.lists.insert(node, check_list);
                }
            } else if self.tree[treenode_next].self_value == 0 {
                // The upper edge is a helper.
                self.tree.remove_weighted(treenode_next, slice.0);
                if self.points[self.edges[edge].point_start].slice != slice {
                    let node = self.edges[edge].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                if self.points[self.edges[edge_next].point_start].slice != slice {
                    let node = self.edges[edge_next].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                let node = self.edges[edge].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
                self.lists.remove(self.edges[edge_next].listnode_check);
                self.edges[edge].next_check = slice;
                let node = self.edges[edge].listnode_check;
                self.lists.insert(node, check_list);
            } else {
                let treenode = self.edges[edge].treenode_edges;
                self.tree.swap_weighted(treenode, treenode_next, slice.0);
                if self.points[self.edges[edge].point_start].slice != slice {
                    let node = self.edges[edge].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                if self.points[self.edges[edge_next].point_start].slice != slice {
                    let node = self.edges[edge_next].listnode_incoming;
                    self.lists.insert(node, self.incoming_list);
                }
                let node = self.edges[edge].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
                let node = self.edges[edge_next].listnode_outgoing;
                self.lists.insert(node, self.outgoing_list);
                self.edges[edge].next_check = slice;
                let node = self.edges[edge].listnode_check;
                self.lists.insert(node, check_list);
                let prev = self.tree[treenode_next].current.prev;
                if prev != self.edges_tree {
                    let prev_edge = EdgeIdx(self.tree[prev].element);
                    self.edges[prev_edge].next_check = slice;
                    let node = self.edges[prev_edge].listnode_check;
                    self.lists.insert(node, check_list);
                }
            }
        }
    }

    /// Phase 5a: attach each queued incoming edge to the point it arrives
    /// at, ordered by where the edge stood in the tree when the slice
    /// began.
    fn attach_incoming(&mut self, slice: SliceIdx) {
        while self.lists[self.incoming_list].next != self.incoming_list {
            let head = self.lists[self.incoming_list].next;
            let edge = EdgeIdx(self.lists[head].element);
            self.lists.remove(head);
            let treenode = self.edges[edge].treenode_edges;
            self.tree.index_previous(treenode, slice.0);
            let points_tree = self.slices[slice].points_tree;
            let mut treenode_point = self.point_before_edge(slice, edge, false);
            // The found point can be one row off the rounded line; nudge
            // upward when the next point is the better match.
            if treenode_point == points_tree
                || (self.tree[treenode_point].current.next != points_tree
                    && !self.is_point_on_edge(PointIdx(self.tree[treenode_point].element), edge, false)
                    && (self.edges[edge].dir_y > 0
                        || self.is_point_on_edge(
                            PointIdx(self.tree[self.tree[treenode_point].current.next].element),
                            edge,
                            false,
                        )))
            {
                treenode_point = self.tree[treenode_point].current.next;
            }
            debug_assert!(treenode_point != points_tree);
            let point = PointIdx(self.tree[treenode_point].element);
            let slot = self.incoming_slot(point, self.tree[treenode].previous.index);
            let node = self.edges[edge].treenode_incoming;
            self.tree.insert_simple(node, slot);
        }
    }

    /// Phase 5b: attach each queued outgoing edge to the point it leaves,
    /// ordered by where the edge stands in the tree now.
    fn attach_outgoing(&mut self, slice: SliceIdx) {
        while self.lists[self.outgoing_list].next != self.outgoing_list {
            let head = self.lists[self.outgoing_list].next;
            let edge = EdgeIdx(self.lists[head].element);
            self.lists.remove(head);
            let treenode = self.edges[edge].treenode_edges;
            self.tree.index_current(treenode);
            let points_tree = self.slices[slice].points_tree;
            let mut treenode_point = self.point_before_edge(slice, edge, true);
            if treenode_point == points_tree
                || (self.tree[treenode_point].current.next != points_tree
                    && !self.is_point_on_edge(PointIdx(self.tree[treenode_point].element), edge, true)
                    && (self.edges[edge].dir_y < 0
                        || self.is_point_on_edge(
                            PointIdx(self.tree[self.tree[treenode_point].current.next].element),
                            edge,
                            true,
                        )))
            {
                treenode_point = self.tree[treenode_point].current.next;
            }
            debug_assert!(treenode_point != points_tree);
            let point = PointIdx(self.tree[treenode_point].element);
            let slot = self.outgoing_slot(point, self.tree[treenode].current.index);
            let node = self.edges[edge].treenode_outgoing;
            self.tree.insert_simple(node, slot);
        }
    }

    /// Phase 5c: intersection candidates that nothing attached to are
    /// dropped from the slice again.
    fn drop_unused_points(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let next = self.tree[point_iter].current.next;
            let incoming = self.points[point].incoming_tree;
            let outgoing = self.points[point].outgoing_tree;
            if self.tree[incoming].current.next == incoming
                && self.tree[outgoing].current.next == outgoing
            {
                self.tree.remove_simple(point_iter);
            }
            point_iter = next;
        }
    }

    /// Phase 5d: every edge that runs through a surviving point is forced
    /// to treat that point as an intersection, so the mesh never spans
    /// across a vertex.
    fn force_passthrough(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            // The tree is currently sorted by y at the next abscissa; the
            // previous view gives the sorting at this slice's own x.
            let mut treenode_edge = {
                let y = &self.points[point].y;
                self.edge_before_previous(slice, y)
            };
            // Back up over any edges coinciding with the point, then walk
            // forward through the coincident run.
            while treenode_edge != self.edges_tree
                && self.is_point_on_edge(point, EdgeIdx(self.tree[treenode_edge].element), false)
            {
                treenode_edge = self.tree.view(treenode_edge, slice.0).prev;
            }
            treenode_edge = self.tree.view(treenode_edge, slice.0).next;
            while treenode_edge != self.edges_tree
                && self.is_point_on_edge(point, EdgeIdx(self.tree[treenode_edge].element), false)
            {
                let edge = EdgeIdx(self.tree[treenode_edge].element);
                let already_attached = self.tree[self.edges[edge].treenode_incoming].current.parent
                    != NIL
                    || self.tree[self.edges[edge].treenode_outgoing].current.parent != NIL;
                if !already_attached {
                    self.tree.index_previous(treenode_edge, slice.0);
                    let slot =
                        self.incoming_slot(point, self.tree[treenode_edge].previous.index);
                    let node = self.edges[edge].treenode_incoming;
                    self.tree.insert_simple(node, slot);
                    if self.tree[treenode_edge].current.parent != NIL {
                        // Still in the active tree, so it leaves the point
                        // on the far side too.
                        self.tree.index_current(treenode_edge);
                        let slot =
                            self.outgoing_slot(point, self.tree[treenode_edge].current.index);
                        let node = self.edges[edge].treenode_outgoing;
                        self.tree.insert_simple(node, slot);
                    }
                }
                treenode_edge = self.tree.view(treenode_edge, slice.0).next;
            }
            point_iter = self.tree[point_iter].current.next;
        }
    }

    fn filled(&self, winding: i32) -> bool {
        match self.fill_rule {
            FillRule::EvenOdd => winding & 1 != 0,
            FillRule::NonZero => winding != 0,
        }
    }

    /// Pushes the cap triangle `(first, point, successor's outgoing
    /// anchor)`, where the successor is read in the previous view.
    fn emit(&mut self, first: PointIdx, point: PointIdx, treenode_edge: u32, version: u32) {
        let successor = self.tree.view(treenode_edge, version).next;
        if successor == self.edges_tree {
            // The winding above the topmost edge never returns to zero on
            // unbalanced inputs; there is no bounded trapezoid to cap.
            return;
        }
        let third = self.edges[EdgeIdx(self.tree[successor].element)].point_outgoing;
        self.triangles.push(first);
        self.triangles.push(point);
        self.triangles.push(third);
    }

    /// Phase 6: walk the slice's points bottom to top, tracking the edge
    /// just below the walk and the running winding, and cap every filled
    /// trapezoid column with a triangle.
    fn emit_triangles(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut winding = 0;
        let mut treenode_edge_previous = self.edges_tree;
        // Never read before a real point is recorded: the first column
        // always recomputes or has zero winding.
        let mut point_previous = PointIdx(0);
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let incoming_tree = self.points[point].incoming_tree;
            let first_incoming = self.tree[incoming_tree].current.next;
            let treenode_edge_before = if first_incoming != incoming_tree {
                let edge = EdgeIdx(self.tree[first_incoming].element);
                self.tree
                    .view(self.edges[edge].treenode_edges, slice.0)
                    .prev
            } else {
                let y = &self.points[point].y;
                self.edge_before_previous(slice, y)
            };
            if treenode_edge_before == treenode_edge_previous {
                // Same trapezoid as the previous point; extend its column.
                if self.filled(winding) {
                    debug_assert!(treenode_edge_previous != self.edges_tree);
                    self.emit(point_previous, point, treenode_edge_previous, slice.0);
                }
            } else {
                treenode_edge_previous = treenode_edge_before;
                winding = self
                    .tree
                    .prefix_value_previous(treenode_edge_previous, slice.0);
                if self.filled(winding) {
                    debug_assert!(treenode_edge_previous != self.edges_tree);
                    let first =
                        self.edges[EdgeIdx(self.tree[treenode_edge_previous].element)].point_outgoing;
                    self.emit(first, point, treenode_edge_previous, slice.0);
                }
            }
            let mut incoming_iter = first_incoming;
            while incoming_iter != incoming_tree {
                let edge = EdgeIdx(self.tree[incoming_iter].element);
                debug_assert!(
                    self.edges[edge].treenode_edges
                        == self.tree.view(treenode_edge_previous, slice.0).next
                );
                treenode_edge_previous = self.edges[edge].treenode_edges;
                winding += self.tree[treenode_edge_previous].self_value;
                if self.filled(winding) {
                    debug_assert!(treenode_edge_previous != self.edges_tree);
                    let first =
                        self.edges[EdgeIdx(self.tree[treenode_edge_previous].element)].point_outgoing;
                    self.emit(first, point, treenode_edge_previous, slice.0);
                }
                incoming_iter = self.tree[incoming_iter].current.next;
            }
            point_previous = point;
            point_iter = self.tree[point_iter].current.next;
        }
    }

    /// Phase 6b: every outgoing edge now hangs off this slice's points;
    /// later trapezoid caps must use these as their third vertex.
    fn update_outgoing_anchors(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let outgoing_tree = self.points[point].outgoing_tree;
            let mut outgoing_iter = self.tree[outgoing_tree].current.next;
            while outgoing_iter != outgoing_tree {
                let edge = EdgeIdx(self.tree[outgoing_iter].element);
                self.edges[edge].point_outgoing = point;
                outgoing_iter = self.tree[outgoing_iter].current.next;
            }
            point_iter = self.tree[point_iter].current.next;
        }
    }

    /// Pops the single freshly-created helper edge off this slice's check
    /// list and grafts it into the active tree and the point's outgoing
    /// set.
    fn adopt_helper(
        &mut self,
        slice: SliceIdx,
        treenode_after: u32,
        outgoing_after: u32,
    ) {
        let check_list = self.slices[slice].check_list;
        debug_assert!(self.lists[check_list].next != check_list);
        let edge = EdgeIdx(self.lists[self.lists[check_list].next].element);
        let treenode = self.edges[edge].treenode_edges;
        self.tree.insert_weighted(treenode, treenode_after, slice.0);
        let node = self.edges[edge].treenode_outgoing;
        self.tree.insert_simple(node, outgoing_after);
        let end_slice = self.points[self.edges[edge].point_end].slice;
        self.edges[edge].next_check = end_slice;
        let node = self.edges[edge].listnode_check;
        let end_check_list = self.slices[end_slice].check_list;
        self.lists.insert(node, end_check_list);
        debug_assert!(self.lists[check_list].next == check_list);
    }

    /// Phase 7: synthesize zero-winding helper diagonals below concave
    /// features, so that every filled trapezoid has an outgoing anchor to
    /// lean on.
    fn insert_helpers(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let outgoing_tree = self.points[point].outgoing_tree;

            // Concave in x: the point has no outgoing edges but sits
            // strictly between two active edges. Connect it to whichever
            // neighbour ends sooner, so the neighbours' endpoints don't
            // get joined across it.
            if self.tree[outgoing_tree].current.next == outgoing_tree {
                let treenode_before = {
                    let y = &self.points[point].y;
                    self.edge_before(&self.slices[slice].x, y)
                };
                if treenode_before != self.edges_tree
                    && self.tree[treenode_before].current.next != self.edges_tree
                {
                    debug_assert!(
                        self.lists[self.slices[slice].check_list].next
                            == self.slices[slice].check_list
                    );
                    let below_end = self.edges[EdgeIdx(self.tree[treenode_before].element)].point_end;
                    let above_end = self.edges
                        [EdgeIdx(self.tree[self.tree[treenode_before].current.next].element)]
                    .point_end;
                    let target = if self.points[below_end].x < self.points[above_end].x {
                        below_end
                    } else {
                        above_end
                    };
                    self.add_edge(point, target, 0);
                    self.adopt_helper(slice, treenode_before, outgoing_tree);
                }
            }

            // Concave in y: the quad between the point's extreme outgoing
            // edge and the next active edge beyond it bends the wrong way;
            // split it with a diagonal to the neighbour's endpoint.
            if self.tree[outgoing_tree].current.next != outgoing_tree {
                {
                    let edge_first =
                        EdgeIdx(self.tree[self.tree[outgoing_tree].current.next].element);
                    let treenode_other = self.tree[self.edges[edge_first].treenode_edges]
                        .current
                        .prev;
                    if treenode_other != self.edges_tree
                        && self.edges[edge_first].point_start == point
                    {
                        let concave = {
                            let p = &self.points[point];
                            let end = &self.points[self.edges[edge_first].point_end];
                            let other_out = &self.points[self.edges
                                [EdgeIdx(self.tree[treenode_other].element)]
                            .point_outgoing];
                            (&p.x - &other_out.x) * (&end.y - &other_out.y)
                                > (&p.y - &other_out.y) * (&end.x - &other_out.x)
                        };
                        if concave {
                            let target =
                                self.edges[EdgeIdx(self.tree[treenode_other].element)].point_end;
                            self.add_edge(point, target, 0);
                            self.adopt_helper(slice, treenode_other, outgoing_tree);
                        }
                    }
                }
                {
                    let edge_last =
                        EdgeIdx(self.tree[self.tree[outgoing_tree].current.prev].element);
                    let treenode_other = self.tree[self.edges[edge_last].treenode_edges]
                        .current
                        .next;
                    if treenode_other != self.edges_tree
                        && self.edges[edge_last].point_start == point
                    {
                        let concave = {
                            let p = &self.points[point];
                            let end = &self.points[self.edges[edge_last].point_end];
                            let other_out = &self.points[self.edges
                                [EdgeIdx(self.tree[treenode_other].element)]
                            .point_outgoing];
                            (&p.x - &other_out.x) * (&end.y - &other_out.y)
                                < (&p.y - &other_out.y) * (&end.x - &other_out.x)
                        };
                        if concave {
                            let target =
                                self.edges[EdgeIdx(self.tree[treenode_other].element)].point_end;
                            self.add_edge(point, target, 0);
                            let treenode_after = self.edges[edge_last].treenode_edges;
                            let outgoing_after = self.edges[edge_last].treenode_outgoing;
                            self.adopt_helper(slice, treenode_after, outgoing_after);
                        }
                    }
                }
            }
            point_iter = self.tree[point_iter].current.next;
        }
    }

    /// Phase 8: around every point, check each outgoing edge against its
    /// new neighbours for a future crossing.
    fn schedule_crossings(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let outgoing_tree = self.points[point].outgoing_tree;
            let mut outgoing_iter = self.tree[outgoing_tree].current.next;
            if outgoing_iter != outgoing_tree {
                let edge = EdgeIdx(self.tree[outgoing_iter].element);
                let below = self.tree[self.edges[edge].treenode_edges].current.prev;
                if below != self.edges_tree {
                    self.schedule_crossing(below);
                }
            }
            while outgoing_iter != outgoing_tree {
                let edge = EdgeIdx(self.tree[outgoing_iter].element);
                let treenode = self.edges[edge].treenode_edges;
                if self.tree[treenode].current.next != self.edges_tree {
                    self.schedule_crossing(treenode);
                }
                outgoing_iter = self.tree[outgoing_iter].current.next;
            }
            point_iter = self.tree[point_iter].current.next;
        }
    }

    /// Per-slice cleanup: detach the incoming/outgoing sets so the same
    /// edges can attach again at later slices.
    fn clear_point_trees(&mut self, slice: SliceIdx) {
        let points_tree = self.slices[slice].points_tree;
        let mut point_iter = self.tree[points_tree].current.next;
        while point_iter != points_tree {
            let point = PointIdx(self.tree[point_iter].element);
            let incoming = self.points[point].incoming_tree;
            self.tree.clear_simple(incoming);
            let outgoing = self.points[point].outgoing_tree;
            self.tree.clear_simple(outgoing);
            point_iter = self.tree[point_iter].current.next;
        }
    }

    /// Flushes the emitted triangles into a compact mesh, dropping
    /// degenerate triangles and numbering each point the first time a
    /// surviving triangle references it.
    pub fn finish(&mut self, quantizer: &Quantizer) -> Triangulation {
        let mut points = Vec::new();
        let mut triangles = Vec::new();
        debug_assert!(self.triangles.len() % 3 == 0);
        for i in (0..self.triangles.len()).step_by(3) {
            let corners = [
                self.triangles[i],
                self.triangles[i + 1],
                self.triangles[i + 2],
            ];
            if corners[0] == corners[1] || corners[0] == corners[2] || corners[1] == corners[2] {
                continue;
            }
            let mut indices = [0u32; 3];
            for (slot, &corner) in indices.iter_mut().zip(&corners) {
                if self.points[corner].used == 0 {
                    let record = &self.points[corner];
                    points.push(quantizer.from_grid(&record.x, &record.y));
                    self.points[corner].used = points.len() as u32;
                }
                *slot = self.points[corner].used - 1;
            }
            triangles.push(indices);
        }
        Triangulation { points, triangles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_sweep(segments: &[(f64, f64)], windings: &[i32], fill_rule: FillRule) -> Triangulation {
        let pts: Vec<Point> = segments.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let quantizer = Quantizer::new(&pts);
        let mut sweeper = Sweeper::new(fill_rule);
        sweeper.ingest(&pts, windings, &quantizer);
        sweeper.run();
        sweeper.finish(&quantizer)
    }

    #[test]
    fn triangle_is_filled() {
        let mesh = run_sweep(
            &[
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 0.0),
                (2.0, 4.0),
                (2.0, 4.0),
                (0.0, 0.0),
            ],
            &[1, 1, 1],
            FillRule::NonZero,
        );
        assert!(!mesh.triangles.is_empty());
        let area: f64 = mesh
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| mesh.points[i as usize]);
                ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() / 2.0
            })
            .sum();
        assert_eq!(area, 8.0);
    }

    #[test]
    fn lone_segment_emits_nothing() {
        let mesh = run_sweep(&[(0.0, 0.0), (1.0, 0.0)], &[1], FillRule::NonZero);
        assert!(mesh.triangles.is_empty());
        assert!(mesh.points.is_empty());
    }

    #[test]
    fn lone_vertical_segment_emits_nothing() {
        let mesh = run_sweep(&[(0.0, 0.0), (0.0, 1.0)], &[1], FillRule::NonZero);
        assert!(mesh.triangles.is_empty());
    }

    #[test]
    fn zero_winding_inputs_are_skipped() {
        let mesh = run_sweep(&[(0.0, 0.0), (1.0, 1.0)], &[0], FillRule::NonZero);
        assert!(mesh.triangles.is_empty());
        assert!(mesh.points.is_empty());
    }
}
