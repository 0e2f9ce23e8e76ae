//! The spatial BSP index (component 4.3): a plain owned recursion over
//! splitting planes, holding only references into a [`PolygonTree`]. No
//! `BspNode` operation ever walks upward, so unlike `PolygonTreeNode` it
//! keeps the ordinary `Box<BspNode>` recursive-tree idiom, with no parent
//! pointer.

use super::polygon_tree::{NodeId, PolygonTree};
use crate::errors::Error;
use crate::geom::plane::Plane;
use crate::geom::polygon::Polygon;

/// One node of the spatial partition. `polygons` holds the ids of polygons
/// lying on this node's own plane (the coplanar buckets).
pub struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<NodeId>,
}

impl BspNode {
    pub fn empty() -> Self {
        BspNode { plane: None, front: None, back: None, polygons: Vec::new() }
    }
}

impl Default for BspNode {
    fn default() -> Self {
        BspNode::empty()
    }
}

#[derive(Clone, Copy)]
enum Side {
    Front,
    Back,
}

fn child_mut<'a>(node: &'a mut BspNode, side: Side) -> &'a mut BspNode {
    match side {
        Side::Front => node.front.get_or_insert_with(|| Box::new(BspNode::empty())),
        Side::Back => node.back.get_or_insert_with(|| Box::new(BspNode::empty())),
    }
}

fn walk_to_mut<'a>(root: &'a mut BspNode, path: &[Side]) -> &'a mut BspNode {
    let mut current = root;
    for &side in path {
        current = child_mut(current, side);
    }
    current
}

/// Inserts `nodes` into the BSP rooted at `root`, choosing (when a node has
/// no plane yet) the first polygon's own plane — deliberately never a SAH or
/// median heuristic. Driven by an explicit work stack of `(path, nodes)`
/// tasks: each task re-descends from `root` along its path rather than
/// holding a long-lived mutable reference, which keeps the whole insertion
/// iterative instead of recursive.
pub fn add_polygon_tree_nodes(
    root: &mut BspNode,
    ptree: &mut PolygonTree,
    nodes: Vec<NodeId>,
) -> Result<(), Error> {
    let mut stack: Vec<(Vec<Side>, Vec<NodeId>)> = vec![(Vec::new(), nodes)];

    while let Some((path, nodes)) = stack.pop() {
        if nodes.is_empty() {
            continue;
        }
        let node = walk_to_mut(root, &path);
        if node.plane.is_none() {
            let first_polygon = ptree.polygon(nodes[0]).ok_or_else(|| {
                Error::Assertion("add_polygon_tree_nodes given an id with no live polygon".into())
            })?;
            node.plane = Some(first_polygon.plane);
        }
        let plane = node.plane.expect("just set above");

        let (mut coplanar_front, mut coplanar_back, mut front, mut back) =
            (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        ptree.split_by_plane(&nodes, &plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back)?;

        let node = walk_to_mut(root, &path);
        node.polygons.append(&mut coplanar_front);
        node.polygons.append(&mut coplanar_back);

        if !front.is_empty() {
            let mut front_path = path.clone();
            front_path.push(Side::Front);
            stack.push((front_path, front));
        }
        if !back.is_empty() {
            let mut back_path = path;
            back_path.push(Side::Back);
            stack.push((back_path, back));
        }
    }
    Ok(())
}

/// Structurally inverts the BSP (flips every plane, swaps every front/back
/// pair). Does not touch the underlying polygons — the caller is expected to
/// also invert the owning [`PolygonTree`] (see [`BspTree::invert`]).
fn invert_structure(root: &mut BspNode) {
    let mut queue: std::collections::VecDeque<Vec<Side>> = std::collections::VecDeque::new();
    queue.push_back(Vec::new());
    while let Some(path) = queue.pop_front() {
        let node = walk_to_mut(root, &path);
        if let Some(plane) = node.plane {
            node.plane = Some(plane.flipped());
        }
        std::mem::swap(&mut node.front, &mut node.back);
        if node.front.is_some() {
            let mut p = path.clone();
            p.push(Side::Front);
            queue.push_back(p);
        }
        if node.back.is_some() {
            let mut p = path;
            p.push(Side::Back);
            queue.push_back(p);
        }
    }
}

/// Read-only post-order classification of `nodes` against the subtree
/// rooted at `node`, per component 4.3: coplanar-front joins the front
/// bucket unless `also_remove_coplanar_front` is set (then it joins back);
/// coplanar-back always joins back. A missing front child passes its bucket
/// through unfiltered; a missing back child discards its bucket, removing
/// each discarded id from `ptree` (invalidating ancestors).
///
/// Implemented as an explicit stack of frames rather than a recursive
/// function so traversal depth is bounded by heap, not call-stack, depth.
fn clip_polygons(
    root: &BspNode,
    ptree: &mut PolygonTree,
    nodes: Vec<NodeId>,
    also_remove_coplanar_front: bool,
) -> Result<Vec<NodeId>, Error> {
    struct Frame<'a> {
        node: &'a BspNode,
        front_nodes: Option<Vec<NodeId>>,
        back_nodes: Option<Vec<NodeId>>,
        front_result: Option<Vec<NodeId>>,
        back_result: Option<Vec<NodeId>>,
    }

    let mut stack: Vec<Frame> = vec![Frame {
        node: root,
        front_nodes: None,
        back_nodes: None,
        front_result: None,
        back_result: None,
    }];
    let mut pending_input: Vec<NodeId> = nodes;
    let mut completed: Option<Vec<NodeId>> = None;

    loop {
        let Some(frame) = stack.last_mut() else {
            return Ok(completed.unwrap_or_default());
        };

        if let Some(result) = completed.take() {
            if frame.front_result.is_none() && frame.front_nodes.is_some() {
                frame.front_result = Some(result);
            } else {
                frame.back_result = Some(result);
            }
        }

        if frame.node.plane.is_none() && frame.front_nodes.is_none() {
            // Placeholder node with no plane: pass the incoming set through
            // unfiltered (this node represents empty space, not a cut).
            let result = std::mem::take(&mut pending_input);
            stack.pop();
            completed = Some(result);
            continue;
        }

        if frame.front_nodes.is_none() {
            // First visit: classify and stash both buckets, then descend
            // front first.
            let plane = frame.node.plane.expect("checked above");
            let (mut coplanar_front, mut coplanar_back, mut front, mut back) =
                (Vec::new(), Vec::new(), Vec::new(), Vec::new());
            let incoming = std::mem::take(&mut pending_input);
            ptree.split_by_plane(&incoming, &plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back)?;

            if also_remove_coplanar_front {
                back.extend(coplanar_front);
            } else {
                front.extend(coplanar_front);
            }
            back.extend(coplanar_back);

            frame.front_nodes = Some(front);
            frame.back_nodes = Some(back);

            match &frame.node.front {
                Some(child) => {
                    pending_input = frame.front_nodes.clone().unwrap_or_default();
                    stack.push(Frame {
                        node: child,
                        front_nodes: None,
                        back_nodes: None,
                        front_result: None,
                        back_result: None,
                    });
                }
                None => {
                    frame.front_result = frame.front_nodes.clone();
                }
            }
            continue;
        }

        if frame.front_result.is_none() {
            // Front child not yet descended (can only happen if we just set
            // front_nodes and there was no front child, handled above), or
            // we are waiting for it to be pushed — loop again.
            continue;
        }

        if frame.back_result.is_none() {
            match &frame.node.back {
                Some(child) => {
                    let back_nodes = frame.back_nodes.clone().unwrap_or_default();
                    pending_input = back_nodes;
                    stack.push(Frame {
                        node: child,
                        front_nodes: None,
                        back_nodes: None,
                        front_result: None,
                        back_result: None,
                    });
                    // Mark back as "in flight" so we don't re-enter this
                    // branch; use an empty Some as a sentinel replaced by
                    // the real result when the pushed frame completes.
                    frame.back_result = None;
                    continue;
                }
                None => {
                    for id in frame.back_nodes.clone().unwrap_or_default() {
                        ptree.remove(id)?;
                    }
                    frame.back_result = Some(Vec::new());
                }
            }
        }

        // Both sides resolved: combine and pop.
        let mut result = frame.front_result.clone().unwrap_or_default();
        result.extend(frame.back_result.clone().unwrap_or_default());
        stack.pop();
        completed = Some(result);
    }
}

/// Owns one [`PolygonTree`] arena and the [`BspNode`] graph built over it,
/// scoped to a single Boolean operation.
pub struct BspTree {
    polygon_tree: PolygonTree,
    root: BspNode,
}

impl BspTree {
    pub fn empty() -> Self {
        BspTree { polygon_tree: PolygonTree::new(), root: BspNode::empty() }
    }

    pub fn from_polygons(polygons: Vec<Polygon>) -> Result<Self, Error> {
        let mut tree = BspTree::empty();
        tree.add_polygons(polygons)?;
        Ok(tree)
    }

    pub fn polygon_tree(&self) -> &PolygonTree {
        &self.polygon_tree
    }

    /// Registers fresh polygons as new root-level entries in this tree's
    /// polygon arena and inserts them into the BSP.
    pub fn add_polygons(&mut self, polygons: Vec<Polygon>) -> Result<(), Error> {
        let ids: Vec<NodeId> = polygons
            .into_iter()
            .map(|p| self.polygon_tree.add_polygon(p))
            .collect();
        add_polygon_tree_nodes(&mut self.root, &mut self.polygon_tree, ids)
    }

    /// Flips the meaning of solid/empty: every plane flips, every
    /// front/back pair swaps, and every live polygon in the arena flips.
    pub fn invert(&mut self) {
        self.polygon_tree.invert(self.polygon_tree.root());
        invert_structure(&mut self.root);
    }

    /// Clips every polygon currently indexed by this tree against `other`'s
    /// BSP, discarding (and invalidating the ancestry of) whatever does not
    /// survive, then rebuilds this tree's own BSP index from the survivors.
    pub fn clip_to(&mut self, other: &BspTree, also_remove_coplanar_front: bool) -> Result<(), Error> {
        let mut ids = Vec::new();
        collect_node_ids(&self.root, &mut ids);
        let survivors = clip_polygons(&other.root, &mut self.polygon_tree, ids, also_remove_coplanar_front)?;
        self.root = BspNode::empty();
        add_polygon_tree_nodes(&mut self.root, &mut self.polygon_tree, survivors)
    }

    /// Materializes every surviving polygon this tree currently indexes.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut ids = Vec::new();
        collect_node_ids(&self.root, &mut ids);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            self.polygon_tree.get_polygons(id, &mut out);
        }
        out
    }
}

fn collect_node_ids(root: &BspNode, out: &mut Vec<NodeId>) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.extend(node.polygons.iter().copied());
        if let Some(front) = &node.front {
            stack.push(front);
        }
        if let Some(back) = &node.back {
            stack.push(back);
        }
    }
}
