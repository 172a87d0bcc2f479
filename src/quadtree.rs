//! Static spatial index over scene objects (component C5). Ported from
//! `hqz/src/zquadtree.h`'s `ZQuadtree`, generalized from "everything lives
//! at the root" into a real alternating-axis split, while keeping the
//! front-to-back closest-hit traversal algorithm unchanged. Built once
//! over a slice of segments into a flat `Vec<Node>` with `Option<u32>`
//! child indices, in the same spirit as a bounding-volume hierarchy built
//! once over a slice of hittables, just with 2D split planes instead of
//! 3D AABBs.

use crate::geometry::{Aabb, Ray, Vec2};
use crate::sampler::Sampler;
use crate::scene::Object;

/// A resolved segment: endpoints sampled once at build time from the
/// scene's (possibly random) object fields, plus its originating index.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSegment {
    pub object_index: usize,
    pub material_id: i64,
    pub p1: Vec2,
    pub dir: Vec2,
}

impl ResolvedSegment {
    fn aabb(&self) -> Aabb {
        let p2 = self.p1 + self.dir;
        Aabb::new(
            self.p1.x.min(p2.x),
            self.p1.y.min(p2.y),
            self.p1.x.max(p2.x),
            self.p1.y.max(p2.y),
        )
    }

    /// Outward normal `(-dy, dx)`.
    pub fn normal(&self) -> Vec2 {
        self.dir.perpendicular()
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    objects: Vec<usize>,
    split: f64,
    axis_y: bool,
    left: Option<u32>,
    right: Option<u32>,
}

/// The result of a closest-hit query: distance along the ray, hit point,
/// outward normal, and the index of the object hit (for self-hit
/// exclusion on the next bounce).
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub distance: f64,
    pub point: Vec2,
    pub normal: Vec2,
    pub object_index: usize,
    pub material_id: i64,
}

/// Arena-based quadtree: `Vec<Node>` with `Option<u32>` child indices
/// instead of heap pointers.
pub struct Quadtree {
    nodes: Vec<Node>,
    segments: Vec<ResolvedSegment>,
}

const MAX_OBJECTS_PER_LEAF: usize = 8;
const MAX_DEPTH: u32 = 24;

impl Quadtree {
    /// Resolve every object's geometry once (sampling any random fields)
    /// and build the split tree. Straddling objects — those whose AABB
    /// spans both sides of a split — are kept at that node.
    pub fn build(objects: &[Object], sampler: &mut Sampler) -> Quadtree {
        let segments: Vec<ResolvedSegment> = objects
            .iter()
            .enumerate()
            .map(|(i, o)| ResolvedSegment {
                object_index: i,
                material_id: sampler.value(&o.material_id) as i64,
                p1: Vec2::new(sampler.value(&o.x), sampler.value(&o.y)),
                dir: Vec2::new(sampler.value(&o.dx), sampler.value(&o.dy)),
            })
            .collect();

        let mut nodes = Vec::new();
        let all: Vec<usize> = (0..segments.len()).collect();
        build_node(&mut nodes, &segments, all, false, 0);

        Quadtree { nodes, segments }
    }

    pub fn segment(&self, index: usize) -> &ResolvedSegment {
        &self.segments[index]
    }

    /// Closest-hit query, excluding `exclude_index` (the previously-hit
    /// object, to prevent self-hits at a shared vertex). Traversal order:
    /// clip the ray to each child's AABB, recurse into the nearer child
    /// first, then the farther child only if it could still beat the best
    /// hit found so far, then test this node's straddling objects.
    pub fn closest_hit(&self, ray: &Ray, exclude_index: Option<usize>) -> Option<Hit> {
        if self.nodes.is_empty() {
            return None;
        }
        let root_bounds = Aabb::new(f64::MIN / 2.0, f64::MIN / 2.0, f64::MAX / 2.0, f64::MAX / 2.0);
        self.query(0, root_bounds, ray, exclude_index, f64::MAX)
    }

    /// The bounding box of every node in the tree, root first then
    /// children, clipped to `root_bounds`. Used only for the debug
    /// quadtree overlay (`scene.debug` bit 0).
    pub fn node_bounds(&self, root_bounds: Aabb) -> Vec<Aabb> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_node_bounds(0, root_bounds, &mut out);
        }
        out
    }

    fn collect_node_bounds(&self, node_index: u32, bounds: Aabb, out: &mut Vec<Aabb>) {
        out.push(bounds);
        let node = &self.nodes[node_index as usize];
        if let Some(idx) = node.left {
            self.collect_node_bounds(idx, Self::child_bounds(node, bounds, true), out);
        }
        if let Some(idx) = node.right {
            self.collect_node_bounds(idx, Self::child_bounds(node, bounds, false), out);
        }
    }

    fn child_bounds(node: &Node, bounds: Aabb, is_left: bool) -> Aabb {
        let mut b = bounds;
        if node.axis_y {
            if is_left {
                b.bottom = node.split;
            } else {
                b.top = node.split;
            }
        } else if is_left {
            b.right = node.split;
        } else {
            b.left = node.split;
        }
        b
    }

    fn query(
        &self,
        node_index: u32,
        bounds: Aabb,
        ray: &Ray,
        exclude_index: Option<usize>,
        best_so_far: f64,
    ) -> Option<Hit> {
        let node = &self.nodes[node_index as usize];
        let mut best: Option<Hit> = None;
        let mut best_distance = best_so_far;

        let left_bounds = node.left.map(|_| Self::child_bounds(node, bounds, true));
        let right_bounds = node.right.map(|_| Self::child_bounds(node, bounds, false));

        let left_hit = node
            .left
            .zip(left_bounds)
            .and_then(|(idx, b)| ray.intersect_aabb(&b).map(|(c, f)| (idx, b, c, f)));
        let right_hit = node
            .right
            .zip(right_bounds)
            .and_then(|(idx, b)| ray.intersect_aabb(&b).map(|(c, f)| (idx, b, c, f)));

        let (first, second) = match (left_hit, right_hit) {
            (Some(l), Some(r)) if l.2 <= r.2 => (Some(l), Some(r)),
            (Some(l), Some(r)) => (Some(r), Some(l)),
            (l, r) => (l.or(r), None),
        };

        if let Some((idx, b, closest, _)) = first {
            if closest < best_distance {
                if let Some(hit) = self.query(idx, b, ray, exclude_index, best_distance) {
                    if hit.distance < best_distance {
                        best_distance = hit.distance;
                        best = Some(hit);
                    }
                }
            }
        }
        if let Some((idx, b, closest, _)) = second {
            if closest < best_distance {
                if let Some(hit) = self.query(idx, b, ray, exclude_index, best_distance) {
                    if hit.distance < best_distance {
                        best_distance = hit.distance;
                        best = Some(hit);
                    }
                }
            }
        }

        for &obj_idx in &node.objects {
            if Some(obj_idx) == exclude_index {
                continue;
            }
            let seg = &self.segments[obj_idx];
            if let Some((distance, _alpha)) = ray.intersect_segment(seg.p1, seg.dir) {
                if distance < best_distance {
                    best_distance = distance;
                    best = Some(Hit {
                        distance,
                        point: ray.point_at_distance(distance),
                        normal: seg.normal(),
                        object_index: obj_idx,
                        material_id: seg.material_id,
                    });
                }
            }
        }

        best
    }
}

fn build_node(
    nodes: &mut Vec<Node>,
    segments: &[ResolvedSegment],
    indices: Vec<usize>,
    axis_y: bool,
    depth: u32,
) -> u32 {
    let my_index = nodes.len() as u32;
    nodes.push(Node::default());

    if indices.len() <= MAX_OBJECTS_PER_LEAF || depth >= MAX_DEPTH {
        nodes[my_index as usize] = Node {
            objects: indices,
            split: 0.0,
            axis_y,
            left: None,
            right: None,
        };
        return my_index;
    }

    let mut coords: Vec<f64> = indices
        .iter()
        .map(|&i| {
            let aabb = segments[i].aabb();
            if axis_y {
                (aabb.top + aabb.bottom) * 0.5
            } else {
                (aabb.left + aabb.right) * 0.5
            }
        })
        .collect();
    coords.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let split = coords[coords.len() / 2];

    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut here = Vec::new();

    for i in indices {
        let aabb = segments[i].aabb();
        let (lo, hi) = if axis_y {
            (aabb.top, aabb.bottom)
        } else {
            (aabb.left, aabb.right)
        };
        if hi < split {
            left.push(i);
        } else if lo >= split {
            right.push(i);
        } else {
            here.push(i);
        }
    }

    // A split that fails to separate anything degenerates to a leaf,
    // which keeps the tree correct even when every object straddles.
    if left.is_empty() && right.is_empty() {
        nodes[my_index as usize] = Node {
            objects: here,
            split: 0.0,
            axis_y,
            left: None,
            right: None,
        };
        return my_index;
    }

    let left_idx = if left.is_empty() {
        None
    } else {
        Some(build_node(nodes, segments, left, !axis_y, depth + 1))
    };
    let right_idx = if right.is_empty() {
        None
    } else {
        Some(build_node(nodes, segments, right, !axis_y, depth + 1))
    };

    nodes[my_index as usize] = Node {
        objects: here,
        split,
        axis_y,
        left: left_idx,
        right: right_idx,
    };
    my_index
}
