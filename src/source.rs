use std::collections::HashMap;

use anyhow::anyhow;

use crate::error::{LibError, Result};
use crate::models::{AttributedMutation, Member, ShareToken, TokenVerification, TreeOwnerId};

/// Read side of the relational collaborator: every member row owned by the
/// given tree, in a stable order. Small trees are assumed; there is no
/// pagination contract.
pub trait MemberSource {
    fn fetch_members(&self, tree_owner_id: TreeOwnerId) -> Result<Vec<Member>>;
}

/// External authority over share tokens. Validity is resolved here and only
/// here; the core never caches or re-derives it.
pub trait TokenResolver {
    fn verify_token(&self, token: &ShareToken) -> Result<TokenVerification>;
}

/// Write side, owned by an external collaborator. This core only gates calls
/// into it; it is also the right place to reject cycle-creating parentage
/// writes (see `algorithms::creates_parentage_cycle`).
pub trait MutationSink {
    fn apply(&mut self, mutation: AttributedMutation) -> Result<()>;
}

impl<T: MemberSource + ?Sized> MemberSource for &T {
    fn fetch_members(&self, tree_owner_id: TreeOwnerId) -> Result<Vec<Member>> {
        (**self).fetch_members(tree_owner_id)
    }
}

impl<T: TokenResolver + ?Sized> TokenResolver for &T {
    fn verify_token(&self, token: &ShareToken) -> Result<TokenVerification> {
        (**self).verify_token(token)
    }
}

/// Drops rows not owned by the requested tree. Cross-tree references are
/// invalid by construction; the resolver then ignores whatever dangling ids
/// remain.
pub fn scope_to_tree(members: Vec<Member>, tree_owner_id: TreeOwnerId) -> Vec<Member> {
    members
        .into_iter()
        .filter(|member| member.belongs_to(tree_owner_id))
        .collect()
}

/// In-memory member source for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMembers {
    members: Vec<Member>,
}

impl InMemoryMembers {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }
}

impl MemberSource for InMemoryMembers {
    fn fetch_members(&self, tree_owner_id: TreeOwnerId) -> Result<Vec<Member>> {
        Ok(scope_to_tree(self.members.clone(), tree_owner_id))
    }
}

/// Fixed token table for tests and demos. Unknown tokens are a lookup error;
/// known-but-revoked tokens resolve with `valid: false`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, TokenVerification>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<ShareToken>, verification: TokenVerification) -> Self {
        self.tokens.insert(token.into().0, verification);
        self
    }
}

impl TokenResolver for StaticTokenResolver {
    fn verify_token(&self, token: &ShareToken) -> Result<TokenVerification> {
        self.tokens.get(token.as_str()).cloned().ok_or_else(|| {
            LibError::not_found("This link is invalid or has expired", anyhow!("unknown share token"))
        })
    }
}

/// Mutation sink that records everything it is handed, for asserting on
/// attribution in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub applied: Vec<AttributedMutation>,
}

impl MutationSink for RecordingSink {
    fn apply(&mut self, mutation: AttributedMutation) -> Result<()> {
        self.applied.push(mutation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::error::ErrorKind;
    use crate::models::{MemberId, Permission};

    use super::*;

    fn owner(n: u128) -> TreeOwnerId {
        TreeOwnerId(Uuid::from_u128(n))
    }

    fn member(n: u128, tree: u128) -> Member {
        Member::new(MemberId(Uuid::from_u128(n)), owner(tree), "M", n.to_string())
    }

    #[test]
    fn scope_to_tree_drops_foreign_rows() {
        let scoped = scope_to_tree(vec![member(1, 7), member(2, 8), member(3, 7)], owner(7));
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|m| m.tree_owner_id == owner(7)));
    }

    #[test]
    fn in_memory_source_preserves_order_and_filters() {
        let source = InMemoryMembers::new(vec![member(3, 7), member(1, 7), member(2, 8)]);
        let fetched = source.fetch_members(owner(7)).unwrap();
        let ids: Vec<MemberId> = fetched.iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![MemberId(Uuid::from_u128(3)), MemberId(Uuid::from_u128(1))]
        );
    }

    #[test]
    fn static_resolver_reports_unknown_tokens_as_not_found() {
        let resolver = StaticTokenResolver::new();
        let err = resolver.verify_token(&ShareToken::from("nope")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn static_resolver_returns_registered_verification() {
        let verification = TokenVerification {
            valid: true,
            permission: Permission::View,
            tree_owner_id: owner(7),
            owner_name: "Priya".to_string(),
            label: "Summer reunion".to_string(),
        };
        let resolver =
            StaticTokenResolver::new().with_token("tok-1", verification.clone());
        assert_eq!(
            resolver.verify_token(&ShareToken::from("tok-1")).unwrap(),
            verification
        );
    }
}
