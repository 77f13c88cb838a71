//! # BSP Partitioner
//!
//! Recursively splits the map region into a binary tree of sub-rectangles
//! whose leaves become room candidates. The tree is a flat arena of nodes
//! with integer child indices, built with an explicit worklist; it exists
//! only during generation and is discarded once rooms are carved.

use crate::generation::GenerationConfig;
use crate::world::Position;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangular region of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The center position of the rectangle.
    pub fn center(&self) -> Position {
        Position::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// The rectangle's area in tiles.
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Which way a region was cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitAxis {
    /// Cut along x: left/right children separated at `x = coord`
    Vertical,
    /// Cut along y: top/bottom children separated at `y = coord`
    Horizontal,
}

/// The boundary a parent node was divided at, kept so the corridor connector
/// can pick the rooms nearest it on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub axis: SplitAxis,
    pub coord: i32,
}

/// One node of the BSP arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BspNode {
    /// The region this node covers
    pub region: Rect,
    /// Recursion depth, root at 0
    pub depth: u32,
    /// Arena indices of the two children; `None` marks a leaf
    pub children: Option<(usize, usize)>,
    /// How this node was divided; `None` for leaves
    pub split: Option<Split>,
}

impl BspNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A binary space partition of the map region, stored as a flat arena.
///
/// Children are always pushed after their parent, so iterating node indices
/// in reverse visits children before parents — the bottom-up order the
/// corridor connector needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BspTree {
    nodes: Vec<BspNode>,
}

impl BspTree {
    /// Partitions a region down to the configured size floor.
    ///
    /// A node is split only if it is below `max_depth` and both children
    /// would keep at least `min_room_size * 2` along the split dimension, so
    /// every leaf can hold a valid room with its margin. Splitting on the
    /// current node's size alone leaves children too small to carve,
    /// collapsing the room count. A region too small to split at all becomes
    /// the single leaf of a one-room map.
    pub fn partition(region: Rect, config: &GenerationConfig, rng: &mut StdRng) -> Self {
        let mut nodes = vec![BspNode {
            region,
            depth: 0,
            children: None,
            split: None,
        }];
        let mut pending = vec![0usize];
        let child_floor = config.min_room_size * 2;

        while let Some(idx) = pending.pop() {
            let region = nodes[idx].region;
            let depth = nodes[idx].depth;
            if depth >= config.max_depth {
                continue;
            }

            let can_vertical = region.width >= child_floor * 2;
            let can_horizontal = region.height >= child_floor * 2;
            let axis = match (can_vertical, can_horizontal) {
                (false, false) => continue,
                (true, false) => SplitAxis::Vertical,
                (false, true) => SplitAxis::Horizontal,
                // Prefer cutting the long dimension once the aspect ratio
                // passes 5:4, otherwise choose at random.
                (true, true) => {
                    if region.width * 4 > region.height * 5 {
                        SplitAxis::Vertical
                    } else if region.height * 4 > region.width * 5 {
                        SplitAxis::Horizontal
                    } else if rng.gen_bool(0.5) {
                        SplitAxis::Vertical
                    } else {
                        SplitAxis::Horizontal
                    }
                }
            };

            let (left, right, split) = match axis {
                SplitAxis::Vertical => {
                    let offset = rng.gen_range(child_floor..=region.width - child_floor);
                    (
                        Rect::new(region.x, region.y, offset, region.height),
                        Rect::new(
                            region.x + offset as i32,
                            region.y,
                            region.width - offset,
                            region.height,
                        ),
                        Split {
                            axis,
                            coord: region.x + offset as i32,
                        },
                    )
                }
                SplitAxis::Horizontal => {
                    let offset = rng.gen_range(child_floor..=region.height - child_floor);
                    (
                        Rect::new(region.x, region.y, region.width, offset),
                        Rect::new(
                            region.x,
                            region.y + offset as i32,
                            region.width,
                            region.height - offset,
                        ),
                        Split {
                            axis,
                            coord: region.y + offset as i32,
                        },
                    )
                }
            };

            let left_idx = nodes.len();
            nodes.push(BspNode {
                region: left,
                depth: depth + 1,
                children: None,
                split: None,
            });
            let right_idx = nodes.len();
            nodes.push(BspNode {
                region: right,
                depth: depth + 1,
                children: None,
                split: None,
            });

            nodes[idx].children = Some((left_idx, right_idx));
            nodes[idx].split = Some(split);
            pending.push(left_idx);
            pending.push(right_idx);
        }

        Self { nodes }
    }

    /// All nodes in the arena, root first.
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Arena indices of every leaf, in creation order.
    pub fn leaves(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_leaf())
            .map(|(i, _)| i)
            .collect()
    }

    /// Arena indices of every leaf in the subtree rooted at `idx`.
    pub fn leaves_under(&self, idx: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            match self.nodes[i].children {
                Some((l, r)) => {
                    stack.push(l);
                    stack.push(r);
                }
                None => leaves.push(i),
            }
        }
        leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    fn partition_with(config: &GenerationConfig) -> BspTree {
        let mut rng = create_rng(config);
        let region = Rect::new(
            1,
            1,
            config.width.saturating_sub(2),
            config.height.saturating_sub(2),
        );
        BspTree::partition(region, config, &mut rng)
    }

    #[test]
    fn test_children_never_fall_below_split_floor() {
        let config = GenerationConfig::new(42);
        let tree = partition_with(&config);
        let floor = config.min_room_size * 2;

        for node in tree.nodes() {
            if let (Some((l, r)), Some(split)) = (node.children, node.split) {
                let (a, b) = match split.axis {
                    SplitAxis::Vertical => {
                        (tree.nodes()[l].region.width, tree.nodes()[r].region.width)
                    }
                    SplitAxis::Horizontal => {
                        (tree.nodes()[l].region.height, tree.nodes()[r].region.height)
                    }
                };
                assert!(a >= floor, "left child {} below floor {}", a, floor);
                assert!(b >= floor, "right child {} below floor {}", b, floor);
            }
        }
    }

    #[test]
    fn test_depth_never_exceeds_max() {
        let mut config = GenerationConfig::new(7);
        config.max_depth = 3;
        let tree = partition_with(&config);
        for node in tree.nodes() {
            assert!(node.depth <= config.max_depth);
            if node.depth == config.max_depth {
                assert!(node.is_leaf());
            }
        }
    }

    #[test]
    fn test_tiny_root_degrades_to_single_leaf() {
        let config = GenerationConfig::new(3);
        let mut rng = create_rng(&config);
        let region = Rect::new(1, 1, config.min_room_size * 2 - 1, config.min_room_size);
        let tree = BspTree::partition(region, &config, &mut rng);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.leaves(), vec![0]);
    }

    #[test]
    fn test_leaves_tile_the_root_region() {
        let config = GenerationConfig::new(42);
        let tree = partition_with(&config);
        let root_area = tree.nodes()[0].region.area();
        let leaf_area: u32 = tree
            .leaves()
            .iter()
            .map(|&i| tree.nodes()[i].region.area())
            .sum();
        assert_eq!(leaf_area, root_area);
    }

    #[test]
    fn test_leaves_under_root_is_all_leaves() {
        let config = GenerationConfig::new(42);
        let tree = partition_with(&config);
        let mut all = tree.leaves();
        let mut under = tree.leaves_under(0);
        all.sort_unstable();
        under.sort_unstable();
        assert_eq!(all, under);
    }

    #[test]
    fn test_partition_is_deterministic() {
        let config = GenerationConfig::new(1234);
        let a = partition_with(&config);
        let b = partition_with(&config);
        assert_eq!(a.nodes().len(), b.nodes().len());
        for (x, y) in a.nodes().iter().zip(b.nodes().iter()) {
            assert_eq!(x.region, y.region);
            assert_eq!(x.children, y.children);
        }
    }

    #[test]
    fn test_default_config_produces_many_leaves() {
        // The corrected split predicate must not collapse the room count.
        let config = GenerationConfig::new(42);
        let tree = partition_with(&config);
        assert!(
            tree.leaves().len() >= 5,
            "expected at least 5 leaves, got {}",
            tree.leaves().len()
        );
    }
}
