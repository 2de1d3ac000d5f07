pub mod access;
pub mod algorithms;
pub mod error;
pub mod graph;
pub mod layout;
pub mod models;
pub mod source;
pub mod unions;

pub mod prelude {
    pub use crate::access::{
        AccessState, GuestSessionStore, ShareAccessController, can_fetch, can_mutate,
    };
    pub use crate::algorithms::{
        adjacency_map, creates_parentage_cycle, has_cycle, topological_sort,
    };
    pub use crate::error::{AccessDenialDetails, ErrorKind, LibError, Result};
    pub use crate::graph::build_graph;
    pub use crate::layout::{LayoutConfig, build_layout, build_layout_with, layout};
    pub use crate::models::{
        AttributedMutation, FamilyEdge, FamilyGraph, FamilyNode, GuestIdentity, Layout,
        LayoutEdge, LayoutNode, Member, MemberId, MemberMutation, MemberPatch, NewMember,
        NodeId, NodeKind, Permission, ShareToken, TokenVerification, TreeOwnerId, Union,
        UnionKey,
    };
    pub use crate::source::{
        InMemoryMembers, MemberSource, MutationSink, RecordingSink, StaticTokenResolver,
        TokenResolver, scope_to_tree,
    };
    pub use crate::unions::resolve_unions;
}
