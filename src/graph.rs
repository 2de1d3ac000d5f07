use std::collections::HashSet;

use crate::models::{FamilyEdge, FamilyGraph, FamilyNode, Member, NodeId, Union};

/// Builds the directed family graph: one person node per member, one
/// invisible union anchor per union, parent→union and union→child edges.
///
/// Purely a transform with no side effects; a fresh graph is produced per
/// call. Edges whose endpoints are not present in the node set are skipped
/// (best-effort, the same tolerance the resolver applies to dangling member
/// references). The result is acyclic for well-formed input; this read path
/// performs no cycle detection of its own — rejecting cycle-creating writes
/// belongs to the mutation sink, see `algorithms::creates_parentage_cycle`.
pub fn build_graph(members: &[Member], unions: &[Union]) -> FamilyGraph {
    let mut nodes = Vec::with_capacity(members.len() + unions.len());
    let mut person_ids = HashSet::with_capacity(members.len());

    for member in members {
        // Exactly one node per member id even if the source hands us
        // duplicate rows.
        if person_ids.insert(member.id) {
            nodes.push(FamilyNode::person(member.clone()));
        }
    }
    for union in unions {
        nodes.push(FamilyNode::union(union.key));
    }

    let mut edges = Vec::new();
    for union in unions {
        let anchor = NodeId::Union(union.key);
        for partner in union.partners() {
            if person_ids.contains(&partner) {
                edges.push(FamilyEdge {
                    from: NodeId::Person(partner),
                    to: anchor,
                });
            }
        }
        for child in &union.children {
            if person_ids.contains(child) {
                edges.push(FamilyEdge {
                    from: anchor,
                    to: NodeId::Person(*child),
                });
            }
        }
    }

    FamilyGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::{MemberId, NodeKind, TreeOwnerId, UnionKey};
    use crate::unions::resolve_unions;

    use super::*;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn member(n: u128) -> Member {
        Member::new(id(n), TreeOwnerId(Uuid::from_u128(99)), "M", n.to_string())
    }

    fn sample_family() -> Vec<Member> {
        vec![
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
        ]
    }

    #[test]
    fn worked_example_couple_with_one_child() {
        let members = sample_family();
        let unions = resolve_unions(&members);
        let graph = build_graph(&members, &unions);

        let person_nodes: Vec<_> = graph
            .nodes
            .iter()
            .filter(|node| node.kind() == NodeKind::Person)
            .collect();
        let union_nodes: Vec<_> = graph
            .nodes
            .iter()
            .filter(|node| node.kind() == NodeKind::Union)
            .collect();
        assert_eq!(person_nodes.len(), 3);
        assert_eq!(union_nodes.len(), 1);

        let anchor = NodeId::Union(UnionKey::couple(id(1), id(2)));
        let parent_edges = graph.edges.iter().filter(|e| e.to == anchor).count();
        let child_edges = graph.edges.iter().filter(|e| e.from == anchor).count();
        assert_eq!(parent_edges, 2);
        assert_eq!(child_edges, 1);
        assert!(graph.edges.contains(&FamilyEdge {
            from: anchor,
            to: NodeId::Person(id(3)),
        }));
    }

    #[test]
    fn every_member_becomes_exactly_one_person_node() {
        let mut members = sample_family();
        // Duplicate row for member 1 must not produce a second node.
        members.push(members[0].clone());
        let unions = resolve_unions(&members);
        let graph = build_graph(&members, &unions);

        for wanted in [id(1), id(2), id(3)] {
            let count = graph
                .nodes
                .iter()
                .filter(|node| node.id == NodeId::Person(wanted))
                .count();
            assert_eq!(count, 1, "member {wanted} should appear exactly once");
        }
    }

    #[test]
    fn person_nodes_carry_the_full_member_payload() {
        let members = sample_family();
        let graph = build_graph(&members, &resolve_unions(&members));
        let node = graph
            .nodes
            .iter()
            .find(|node| node.id == NodeId::Person(id(3)))
            .unwrap();
        assert_eq!(node.member.as_ref().unwrap().father_id, Some(id(1)));
    }

    #[test]
    fn union_nodes_carry_no_payload() {
        let members = sample_family();
        let graph = build_graph(&members, &resolve_unions(&members));
        let node = graph
            .nodes
            .iter()
            .find(|node| node.kind() == NodeKind::Union)
            .unwrap();
        assert!(node.member.is_none());
    }

    #[test]
    fn single_parent_union_emits_one_parent_edge() {
        let members = vec![
            member(1),
            Member {
                father_id: Some(id(1)),
                ..member(2)
            },
        ];
        let graph = build_graph(&members, &resolve_unions(&members));
        let anchor = NodeId::Union(UnionKey::single_parent(id(1)));
        assert_eq!(graph.edges.iter().filter(|e| e.to == anchor).count(), 1);
        assert_eq!(graph.edges.iter().filter(|e| e.from == anchor).count(), 1);
    }

    #[test]
    fn edges_to_unknown_members_are_skipped() {
        // Hand-crafted union referencing a partner and child that are not in
        // the member set.
        let members = vec![member(1)];
        let mut union = Union::new(
            UnionKey::couple(id(1), id(8)),
            Some(id(1)),
            Some(id(8)),
        );
        union.children.push(id(9));
        let graph = build_graph(&members, &[union]);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, NodeId::Person(id(1)));
    }

    #[test]
    fn empty_input_yields_empty_graph() {
        let graph = build_graph(&[], &[]);
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }
}
