//! End-to-end walk of the library: builds a three-generation layout, then
//! exercises the share-link access gate with an in-memory token table.
//!
//! Run with `cargo run --example shared_tree`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lineage_graph::prelude::*;

fn sample_tree(tree: TreeOwnerId) -> Vec<Member> {
    let id = |n: u128| MemberId(Uuid::from_u128(n));
    let mut members = vec![
        Member {
            spouse_id: Some(id(2)),
            ..Member::new(id(1), tree, "Arun", "Mehta")
        },
        Member {
            spouse_id: Some(id(1)),
            ..Member::new(id(2), tree, "Leela", "Mehta")
        },
        Member {
            father_id: Some(id(1)),
            mother_id: Some(id(2)),
            spouse_id: Some(id(4)),
            ..Member::new(id(3), tree, "Ravi", "Mehta")
        },
        Member {
            spouse_id: Some(id(3)),
            ..Member::new(id(4), tree, "Sana", "Mehta")
        },
        Member {
            father_id: Some(id(3)),
            mother_id: Some(id(4)),
            ..Member::new(id(5), tree, "Isha", "Mehta")
        },
    ];
    members[4].nickname = Some("Ish".to_string());
    members
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let tree = TreeOwnerId(Uuid::from_u128(0x7EE));
    let members = sample_tree(tree);

    let layout = build_layout(&members);
    println!(
        "layout: {} nodes ({} unions), {} edges",
        layout.nodes.len(),
        layout
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Union)
            .count(),
        layout.edges.len()
    );
    for node in &layout.nodes {
        let label = match &node.member {
            Some(member) => format!("{} {}", member.first_name, member.last_name),
            None => "(union)".to_string(),
        };
        println!("  {:>24} at ({:>7.1}, {:>6.1})", label, node.x, node.y);
    }

    // Share-link side: one view token, one edit token over the same tree.
    let verification = |permission| TokenVerification {
        valid: true,
        permission,
        tree_owner_id: tree,
        owner_name: "Arun Mehta".to_string(),
        label: "Mehta family".to_string(),
    };
    let resolver = StaticTokenResolver::new()
        .with_token("view-abc", verification(Permission::View))
        .with_token("edit-xyz", verification(Permission::Edit));
    let controller = ShareAccessController::new(&resolver);
    let source = InMemoryMembers::new(members);
    let mut session = GuestSessionStore::new();

    let view_token = ShareToken::from("view-abc");
    let state = controller.resolve_share_access(&view_token, &session);
    println!(
        "view link: can_fetch={} can_mutate={}",
        can_fetch(&state),
        can_mutate(&state)
    );

    let edit_token = ShareToken::from("edit-xyz");
    let state = controller.resolve_share_access(&edit_token, &session);
    println!("edit link before guest login: can_fetch={}", can_fetch(&state));

    let state = controller.identify_guest(&edit_token, &mut session, "Jane", "")?;
    println!("edit link after guest login: can_mutate={}", can_mutate(&state));

    let shared = controller.fetch_shared_members(&edit_token, &session, &source)?;
    println!("guest sees {} members", shared.len());

    let authorized = controller.authorize_mutation(
        &edit_token,
        &session,
        MemberMutation::Delete {
            member_id: shared[0].id,
        },
    )?;
    let mut sink = RecordingSink::default();
    sink.apply(authorized)?;
    println!(
        "recorded mutation attributed to {:?}",
        sink.applied[0].attribution.as_ref().map(|g| g.name.as_str())
    );

    // A view link hitting the same gate is refused server-side.
    let denied = controller.authorize_mutation(
        &view_token,
        &session,
        MemberMutation::Delete {
            member_id: shared[0].id,
        },
    );
    println!("view link mutation rejected: {}", denied.unwrap_err());

    Ok(())
}
