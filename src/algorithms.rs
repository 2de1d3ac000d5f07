use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{FamilyGraph, FamilyNode, Member, MemberId, NodeId};
use crate::unions::member_index;

pub fn adjacency_map(graph: &FamilyGraph) -> HashMap<NodeId, Vec<NodeId>> {
    let mut adjacency = HashMap::new();
    let mut known_nodes = HashSet::new();
    for node in &graph.nodes {
        adjacency.entry(node.id).or_insert_with(Vec::new);
        known_nodes.insert(node.id);
    }
    for edge in &graph.edges {
        if !known_nodes.contains(&edge.from) || !known_nodes.contains(&edge.to) {
            // Best-effort behavior: skip dangling edges instead of failing the
            // whole computation.
            continue;
        }
        adjacency
            .entry(edge.from)
            .or_insert_with(Vec::new)
            .push(edge.to);
    }
    adjacency
}

pub fn has_cycle(graph: &FamilyGraph) -> bool {
    topological_sort(graph).len() != graph.nodes.len()
}

/// Kahn's algorithm over the family graph. Nodes caught in a cycle are left
/// out of the returned order; callers that care compare lengths (see
/// `has_cycle`) or fall back per node (see the layout engine's ranking).
pub fn topological_sort(graph: &FamilyGraph) -> Vec<&FamilyNode> {
    let mut node_lookup = HashMap::with_capacity(graph.nodes.len());
    let mut indegree: HashMap<NodeId, usize> = HashMap::with_capacity(graph.nodes.len());
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::with_capacity(graph.nodes.len());

    for node in &graph.nodes {
        node_lookup.entry(node.id).or_insert(node);
        indegree.insert(node.id, 0);
        adjacency.insert(node.id, Vec::new());
    }

    for edge in &graph.edges {
        // Best-effort behavior: ignore invalid edge endpoints.
        if !node_lookup.contains_key(&edge.from) || !node_lookup.contains_key(&edge.to) {
            continue;
        }
        if let Some(degree) = indegree.get_mut(&edge.to) {
            *degree += 1;
        }
        adjacency
            .entry(edge.from)
            .or_insert_with(Vec::new)
            .push(edge.to);
    }

    let mut queue = VecDeque::new();
    for node in &graph.nodes {
        if indegree.get(&node.id) == Some(&0) {
            queue.push_back(node.id);
        }
    }

    let mut ordered = Vec::with_capacity(graph.nodes.len());
    while let Some(node_id) = queue.pop_front() {
        if let Some(node) = node_lookup.get(&node_id) {
            ordered.push(*node);
        }
        if let Some(children) = adjacency.get(&node_id) {
            for child in children {
                if let Some(child_degree) = indegree.get_mut(child) {
                    *child_degree -= 1;
                    if *child_degree == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }
    }

    ordered
}

/// Answers whether assigning the given parents to `child_id` would make the
/// child its own ancestor.
///
/// The layout read path never validates ancestry chains; this exists for the
/// mutation-sink collaborator to call before accepting a parentage write.
pub fn creates_parentage_cycle(
    members: &[Member],
    child_id: MemberId,
    father_id: Option<MemberId>,
    mother_id: Option<MemberId>,
) -> bool {
    let index = member_index(members);
    let mut stack: Vec<MemberId> = father_id.into_iter().chain(mother_id).collect();
    let mut seen: HashSet<MemberId> = HashSet::new();

    while let Some(ancestor_id) = stack.pop() {
        if ancestor_id == child_id {
            return true;
        }
        if !seen.insert(ancestor_id) {
            continue;
        }
        if let Some(ancestor) = index.get(&ancestor_id) {
            stack.extend(ancestor.father_id.into_iter().chain(ancestor.mother_id));
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::{FamilyEdge, TreeOwnerId, UnionKey};
    use crate::unions::resolve_unions;

    use super::*;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn member(n: u128) -> Member {
        Member::new(id(n), TreeOwnerId(Uuid::from_u128(99)), "M", n.to_string())
    }

    fn couple_with_child() -> FamilyGraph {
        let members = vec![
            Member {
                spouse_id: Some(id(2)),
                ..member(1)
            },
            Member {
                spouse_id: Some(id(1)),
                ..member(2)
            },
            Member {
                father_id: Some(id(1)),
                mother_id: Some(id(2)),
                ..member(3)
            },
        ];
        crate::graph::build_graph(&members, &resolve_unions(&members))
    }

    #[test]
    fn family_graph_is_acyclic_and_fully_sorted() {
        let graph = couple_with_child();
        assert!(!has_cycle(&graph));
        assert_eq!(topological_sort(&graph).len(), graph.nodes.len());
    }

    #[test]
    fn union_anchor_sorts_between_parents_and_child() {
        let graph = couple_with_child();
        let order: Vec<NodeId> = topological_sort(&graph).iter().map(|n| n.id).collect();
        let position = |node: NodeId| order.iter().position(|id| *id == node).unwrap();
        let anchor = NodeId::Union(UnionKey::couple(id(1), id(2)));
        assert!(position(NodeId::Person(id(1))) < position(anchor));
        assert!(position(NodeId::Person(id(2))) < position(anchor));
        assert!(position(anchor) < position(NodeId::Person(id(3))));
    }

    #[test]
    fn cycle_detects_on_malformed_graph() {
        let mut graph = couple_with_child();
        // A child pointing back above its own ancestors is malformed input,
        // but the algorithms must still answer instead of looping.
        graph.edges.push(FamilyEdge {
            from: NodeId::Person(id(3)),
            to: NodeId::Person(id(1)),
        });
        assert!(has_cycle(&graph));
    }

    #[test]
    fn adjacency_skips_dangling_edges() {
        let mut graph = couple_with_child();
        graph.edges.push(FamilyEdge {
            from: NodeId::Person(id(77)),
            to: NodeId::Person(id(3)),
        });
        let adjacency = adjacency_map(&graph);
        assert!(!adjacency.contains_key(&NodeId::Person(id(77))));
    }

    #[test]
    fn parentage_cycle_is_flagged() {
        let members = vec![
            Member {
                father_id: Some(id(2)),
                ..member(1)
            },
            member(2),
        ];
        // Making member 2 a child of member 1 closes the loop.
        assert!(creates_parentage_cycle(&members, id(2), Some(id(1)), None));
        // A fresh parent with no ancestry does not.
        assert!(!creates_parentage_cycle(&members, id(1), None, Some(id(2))));
    }

    #[test]
    fn direct_self_parentage_is_a_cycle() {
        let members = vec![member(1)];
        assert!(creates_parentage_cycle(&members, id(1), Some(id(1)), None));
    }
}
