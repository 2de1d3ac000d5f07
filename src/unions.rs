use std::collections::{HashMap, HashSet};

use crate::models::{Member, MemberId, Union, UnionKey};

/// Lookup table over a member slice. Later duplicates of an id are ignored so
/// the first occurrence wins, matching the stable input order contract.
pub fn member_index(members: &[Member]) -> HashMap<MemberId, &Member> {
    let mut index = HashMap::with_capacity(members.len());
    for member in members {
        index.entry(member.id).or_insert(member);
    }
    index
}

/// Groups members into parental unions in discovery order: one spouse pass
/// over declared spouse links, then one parentage pass attaching children.
///
/// There is no error condition here. Dangling references (a spouse or parent
/// id with no matching member, including anything cross-tree) and
/// self-parentage are silently excluded; partial family data in the middle of
/// entry must still resolve to something renderable.
pub fn resolve_unions(members: &[Member]) -> Vec<Union> {
    let index = member_index(members);
    let mut unions: Vec<Union> = Vec::new();
    let mut slot_by_key: HashMap<UnionKey, usize> = HashMap::new();

    // Spouse pass: couples exist even when they have no children. Both sides
    // are marked paired as soon as one direction resolves, so an asymmetric
    // link still yields exactly one union.
    let mut paired: HashSet<MemberId> = HashSet::new();
    for member in members {
        let Some(spouse_id) = member.spouse_id else {
            continue;
        };
        if paired.contains(&member.id) {
            continue;
        }
        if spouse_id == member.id || !index.contains_key(&spouse_id) {
            // Declared spouse is missing from the set: the member is simply
            // not paired.
            continue;
        }
        let key = UnionKey::couple(member.id, spouse_id);
        if let UnionKey::Couple(a, b) = key
            && !slot_by_key.contains_key(&key)
        {
            slot_by_key.insert(key, unions.len());
            unions.push(Union::new(key, Some(a), Some(b)));
        }
        paired.insert(member.id);
        paired.insert(spouse_id);
    }

    // Parentage pass: attach each child to the union of its known parents,
    // creating the union when the spouse pass did not already discover it. A
    // lone known parent keys a single-parent union; that key space is
    // deliberately distinct from couple keys, so a parent who later turns out
    // to have a spouse keeps both unions side by side.
    for member in members {
        let father = member
            .father_id
            .filter(|id| *id != member.id && index.contains_key(id));
        let mother = member
            .mother_id
            .filter(|id| *id != member.id && index.contains_key(id));

        let (key, partner_a, partner_b) = match (father, mother) {
            (Some(father), Some(mother)) => {
                (UnionKey::couple(father, mother), Some(father), Some(mother))
            }
            (Some(father), None) => (UnionKey::single_parent(father), Some(father), None),
            (None, Some(mother)) => (UnionKey::single_parent(mother), Some(mother), None),
            (None, None) => continue,
        };

        let slot = *slot_by_key.entry(key).or_insert_with(|| {
            unions.push(Union::new(key, partner_a, partner_b));
            unions.len() - 1
        });
        let union = &mut unions[slot];
        if !union.children.contains(&member.id) {
            union.children.push(member.id);
        }
    }

    unions
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::models::TreeOwnerId;

    use super::*;

    fn id(n: u128) -> MemberId {
        MemberId(Uuid::from_u128(n))
    }

    fn member(n: u128) -> Member {
        Member::new(id(n), TreeOwnerId(Uuid::from_u128(99)), "M", n.to_string())
    }

    fn spouse_of(n: u128, spouse: u128) -> Member {
        Member {
            spouse_id: Some(id(spouse)),
            ..member(n)
        }
    }

    fn child_of(n: u128, father: Option<u128>, mother: Option<u128>) -> Member {
        Member {
            father_id: father.map(id),
            mother_id: mother.map(id),
            ..member(n)
        }
    }

    #[test]
    fn mutual_spouses_resolve_to_one_union() {
        let unions = resolve_unions(&[spouse_of(1, 2), spouse_of(2, 1)]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].key, UnionKey::couple(id(1), id(2)));
        assert_eq!(unions[0].partner_a, Some(id(1)));
        assert_eq!(unions[0].partner_b, Some(id(2)));
        assert!(unions[0].children.is_empty());
    }

    #[test]
    fn asymmetric_spouse_link_still_pairs_the_couple() {
        // Only member 2 declares the link; member 1 never points back.
        let unions = resolve_unions(&[member(1), spouse_of(2, 1)]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].key, UnionKey::couple(id(1), id(2)));
    }

    #[test]
    fn couple_key_is_independent_of_scan_order() {
        let forward = resolve_unions(&[spouse_of(1, 2), spouse_of(2, 1)]);
        let reverse = resolve_unions(&[spouse_of(2, 1), spouse_of(1, 2)]);
        assert_eq!(forward[0].key, reverse[0].key);
    }

    #[test]
    fn dangling_spouse_reference_leaves_member_unpaired() {
        let unions = resolve_unions(&[spouse_of(1, 42)]);
        assert!(unions.is_empty());
    }

    #[test]
    fn child_of_known_couple_attaches_to_exactly_one_union() {
        // The couple is discoverable both via the spouse pass and via the
        // child's shared parentage; the two discoveries must collapse.
        let unions = resolve_unions(&[spouse_of(1, 2), spouse_of(2, 1), child_of(3, Some(1), Some(2))]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].children, vec![id(3)]);
    }

    #[test]
    fn unmarried_parents_get_a_couple_union_from_parentage_alone() {
        let unions = resolve_unions(&[member(1), member(2), child_of(3, Some(1), Some(2))]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].key, UnionKey::couple(id(1), id(2)));
        assert_eq!(unions[0].children, vec![id(3)]);
    }

    #[test]
    fn single_father_child_never_joins_a_couple_union() {
        let unions = resolve_unions(&[
            spouse_of(1, 2),
            spouse_of(2, 1),
            child_of(3, Some(1), None),
        ]);
        assert_eq!(unions.len(), 2);
        assert_eq!(unions[0].key, UnionKey::couple(id(1), id(2)));
        assert!(unions[0].children.is_empty());
        assert_eq!(unions[1].key, UnionKey::single_parent(id(1)));
        assert_eq!(unions[1].children, vec![id(3)]);
    }

    #[test]
    fn single_mother_union_is_keyed_by_the_mother() {
        let unions = resolve_unions(&[member(2), child_of(3, None, Some(2))]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].key, UnionKey::single_parent(id(2)));
        assert_eq!(unions[0].partner_a, Some(id(2)));
        assert_eq!(unions[0].partner_b, None);
    }

    #[test]
    fn unions_emit_in_discovery_order_spouses_first() {
        let unions = resolve_unions(&[
            member(4),
            child_of(5, Some(4), None),
            spouse_of(1, 2),
            spouse_of(2, 1),
        ]);
        assert_eq!(unions.len(), 2);
        // Couple found by the spouse pass precedes the single-parent union
        // even though member 4 appears first in the input.
        assert_eq!(unions[0].key, UnionKey::couple(id(1), id(2)));
        assert_eq!(unions[1].key, UnionKey::single_parent(id(4)));
    }

    #[test]
    fn children_preserve_input_member_ordering() {
        let unions = resolve_unions(&[
            member(1),
            member(2),
            child_of(30, Some(1), Some(2)),
            child_of(10, Some(1), Some(2)),
            child_of(20, Some(1), Some(2)),
        ]);
        assert_eq!(unions[0].children, vec![id(30), id(10), id(20)]);
    }

    #[test]
    fn dangling_parent_reference_is_dropped_not_errored() {
        // Father 7 does not exist; the child still attaches to the mother's
        // single-parent union.
        let unions = resolve_unions(&[member(2), child_of(3, Some(7), Some(2))]);
        assert_eq!(unions.len(), 1);
        assert_eq!(unions[0].key, UnionKey::single_parent(id(2)));
    }

    #[test]
    fn self_parentage_is_ignored() {
        let unions = resolve_unions(&[child_of(1, Some(1), None)]);
        assert!(unions.is_empty());
    }

    #[test]
    fn self_spouse_is_ignored() {
        let unions = resolve_unions(&[spouse_of(1, 1)]);
        assert!(unions.is_empty());
    }
}
