use std::collections::{HashMap, HashSet};

use crate::algorithms::{adjacency_map, topological_sort};
use crate::graph::build_graph;
use crate::models::{FamilyEdge, FamilyGraph, Layout, LayoutEdge, LayoutNode, Member, NodeId, NodeKind};
use crate::unions::resolve_unions;

/// Spacing and footprint constants for the layered layout. Defaults mirror
/// the rendered card dimensions: 200×150 person cards, 10×10 union anchor
/// dots, 100px minimum separation in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub union_size: f64,
    pub node_gap: f64,
    pub rank_gap: f64,
    /// Upper bound on barycenter ordering sweeps. The cap, not an exception,
    /// guards against non-termination; the best ordering found wins.
    pub ordering_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 200.0,
            node_height: 150.0,
            union_size: 10.0,
            node_gap: 100.0,
            rank_gap: 100.0,
            ordering_passes: 8,
        }
    }
}

/// Single public pipeline entry: members → unions → graph → positioned
/// layout, with the default spacing.
pub fn build_layout(members: &[Member]) -> Layout {
    build_layout_with(members, &LayoutConfig::default())
}

pub fn build_layout_with(members: &[Member], config: &LayoutConfig) -> Layout {
    let unions = resolve_unions(members);
    let graph = build_graph(members, &unions);
    layout(&graph, config)
}

/// Assigns every node a top-left coordinate via layered drawing: longest-path
/// rank assignment, bounded barycenter crossing minimization, then rank
/// packing with fixed minimum gaps.
///
/// Pure function: the same graph and config always produce the same
/// assignment. Each invocation recomputes from scratch; there is no
/// incremental state to invalidate when the member set changes.
pub fn layout(graph: &FamilyGraph, config: &LayoutConfig) -> Layout {
    let ranks = assign_ranks(graph);
    let layers = order_layers(graph, &ranks, config.ordering_passes);
    let sizes = node_sizes(graph, config);
    let centers = position_nodes(&layers, &sizes, config);

    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        let Some(&(cx, cy)) = centers.get(&node.id) else {
            continue;
        };
        let (width, height) = sizes.get(&node.id).copied().unwrap_or_default();
        nodes.push(LayoutNode {
            id: node.id,
            kind: node.kind(),
            member: node.member.clone(),
            // The packing works on centers; the renderer expects the top-left
            // corner of the bounding box.
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        });
    }

    let edges = graph
        .edges
        .iter()
        .filter(|edge| centers.contains_key(&edge.from) && centers.contains_key(&edge.to))
        .map(|edge| LayoutEdge {
            from: edge.from,
            to: edge.to,
        })
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        ranks = layers.len(),
        "layout computed"
    );

    Layout { nodes, edges }
}

/// Longest-path ranking over the topological order: sources sit at rank 0,
/// every edge points to a strictly higher rank. Nodes stranded by a cycle in
/// malformed input keep the rank-0 fallback rather than aborting the layout.
fn assign_ranks(graph: &FamilyGraph) -> HashMap<NodeId, usize> {
    let adjacency = adjacency_map(graph);
    let mut ranks: HashMap<NodeId, usize> = graph.nodes.iter().map(|node| (node.id, 0)).collect();

    for node in topological_sort(graph) {
        let rank = ranks.get(&node.id).copied().unwrap_or(0);
        if let Some(successors) = adjacency.get(&node.id) {
            for successor in successors {
                let entry = ranks.entry(*successor).or_insert(0);
                if *entry < rank + 1 {
                    *entry = rank + 1;
                }
            }
        }
    }

    ranks
}

/// Groups nodes into rank layers (input order within a layer) and reorders
/// each layer with barycenter sweeps, keeping the ordering with the fewest
/// counted crossings.
fn order_layers(
    graph: &FamilyGraph,
    ranks: &HashMap<NodeId, usize>,
    ordering_passes: usize,
) -> Vec<Vec<NodeId>> {
    let max_rank = ranks.values().copied().max().unwrap_or(0);
    let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); max_rank + 1];
    let mut seen = HashSet::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if seen.insert(node.id) {
            let rank = ranks.get(&node.id).copied().unwrap_or(0);
            layers[rank].push(node.id);
        }
    }

    let mut predecessors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in &graph.edges {
        if seen.contains(&edge.from) && seen.contains(&edge.to) {
            predecessors.entry(edge.to).or_default().push(edge.from);
            successors.entry(edge.from).or_default().push(edge.to);
        }
    }

    let mut best = layers.clone();
    let mut best_crossings = count_crossings(&best, &graph.edges, ranks);

    for _ in 0..ordering_passes {
        if best_crossings == 0 {
            break;
        }
        barycenter_sweep(&mut layers, &predecessors, true);
        barycenter_sweep(&mut layers, &successors, false);
        let crossings = count_crossings(&layers, &graph.edges, ranks);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        } else {
            // No further improvement; the sweeps have converged.
            break;
        }
    }

    best
}

/// One sweep of barycenter ordering: each layer is re-sorted by the average
/// position of its neighbors on the fixed side. Nodes without neighbors keep
/// their current position. The sort is stable, so ties never reshuffle.
fn barycenter_sweep(
    layers: &mut [Vec<NodeId>],
    neighbors: &HashMap<NodeId, Vec<NodeId>>,
    downward: bool,
) {
    let order: Vec<usize> = if downward {
        (0..layers.len()).collect()
    } else {
        (0..layers.len()).rev().collect()
    };

    for layer_index in order {
        let positions = position_map(layers);
        let layer = &mut layers[layer_index];
        let mut keyed: Vec<(f64, NodeId)> = layer
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let adjacent: Vec<usize> = neighbors
                    .get(node)
                    .map(|nodes| {
                        nodes
                            .iter()
                            .filter_map(|n| positions.get(n).copied())
                            .collect()
                    })
                    .unwrap_or_default();
                let barycenter = if adjacent.is_empty() {
                    index as f64
                } else {
                    adjacent.iter().sum::<usize>() as f64 / adjacent.len() as f64
                };
                (barycenter, *node)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        *layer = keyed.into_iter().map(|(_, node)| node).collect();
    }
}

/// Index of every node within its own layer.
fn position_map(layers: &[Vec<NodeId>]) -> HashMap<NodeId, usize> {
    let mut positions = HashMap::new();
    for layer in layers {
        for (index, node) in layer.iter().enumerate() {
            positions.insert(*node, index);
        }
    }
    positions
}

/// Counts pairwise edge crossings, grouping edges by the rank pair they span
/// so long edges only compete with edges on the same span.
fn count_crossings(
    layers: &[Vec<NodeId>],
    edges: &[FamilyEdge],
    ranks: &HashMap<NodeId, usize>,
) -> usize {
    let positions = position_map(layers);
    let mut groups: HashMap<(usize, usize), Vec<(usize, usize)>> = HashMap::new();
    for edge in edges {
        let (Some(&from_rank), Some(&to_rank)) = (ranks.get(&edge.from), ranks.get(&edge.to))
        else {
            continue;
        };
        let (Some(&from_pos), Some(&to_pos)) = (positions.get(&edge.from), positions.get(&edge.to))
        else {
            continue;
        };
        groups
            .entry((from_rank, to_rank))
            .or_default()
            .push((from_pos, to_pos));
    }

    let mut crossings = 0;
    for group in groups.values() {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let (a, b) = (group[i], group[j]);
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

fn node_sizes(graph: &FamilyGraph, config: &LayoutConfig) -> HashMap<NodeId, (f64, f64)> {
    graph
        .nodes
        .iter()
        .map(|node| {
            let size = match node.kind() {
                NodeKind::Person => (config.node_width, config.node_height),
                NodeKind::Union => (config.union_size, config.union_size),
            };
            (node.id, size)
        })
        .collect()
}

/// Packs each rank left-to-right with the minimum node gap, centers every
/// rank on the widest one, and stacks ranks vertically using each rank's
/// tallest node plus the rank gap. Returns center coordinates.
fn position_nodes(
    layers: &[Vec<NodeId>],
    sizes: &HashMap<NodeId, (f64, f64)>,
    config: &LayoutConfig,
) -> HashMap<NodeId, (f64, f64)> {
    let row_width = |layer: &Vec<NodeId>| -> f64 {
        let widths: f64 = layer
            .iter()
            .map(|node| sizes.get(node).map(|s| s.0).unwrap_or_default())
            .sum();
        let gaps = config.node_gap * layer.len().saturating_sub(1) as f64;
        widths + gaps
    };
    let max_width = layers.iter().map(row_width).fold(0.0_f64, f64::max);

    let mut centers = HashMap::new();
    let mut y_cursor = 0.0_f64;
    for layer in layers {
        if layer.is_empty() {
            continue;
        }
        let row_height = layer
            .iter()
            .map(|node| sizes.get(node).map(|s| s.1).unwrap_or_default())
            .fold(0.0_f64, f64::max);
        let mut x_cursor = (max_width - row_width(layer)) / 2.0;
        for node in layer {
            let (width, _) = sizes.get(node).copied().unwrap_or_default();
            centers.insert(*node, (x_cursor + width / 2.0, y_cursor + row_height / 2.0));
            x_cursor += width + config.node_gap;
        }
        y_cursor += row_height + config.rank_gap;
    }

    centers
}
