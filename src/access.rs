use std::collections::HashMap;

use anyhow::anyhow;

use crate::error::{AccessDenialDetails, LibError, Result};
use crate::models::{
    AttributedMutation, GuestIdentity, Member, MemberMutation, Permission, ShareToken,
    TokenVerification,
};
use crate::source::{MemberSource, TokenResolver};

/// Where a share-token request currently stands. `Invalid` is terminal; only
/// an edit-permission token ever passes through the guest-identification
/// gate into `Active`.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessState {
    Unverified,
    Invalid,
    ValidView {
        owner_name: String,
        label: String,
    },
    /// Edit permission granted but no guest identity yet: both data fetch and
    /// mutation stay blocked until a non-empty guest name arrives.
    ValidEdit {
        owner_name: String,
        label: String,
    },
    Active {
        permission: Permission,
        guest: GuestIdentity,
        owner_name: String,
        label: String,
    },
}

/// True when the state allows reading tree data.
pub fn can_fetch(state: &AccessState) -> bool {
    matches!(
        state,
        AccessState::ValidView { .. } | AccessState::Active { .. }
    )
}

/// True when the state allows add/edit/delete. View access never mutates,
/// whatever the client-side UI believes; an `Active` state under view
/// permission still answers false here.
pub fn can_mutate(state: &AccessState) -> bool {
    matches!(
        state,
        AccessState::Active {
            permission: Permission::Edit,
            guest,
            ..
        } if !guest.name.is_empty()
    )
}

/// Per-session guest identity cache, keyed by token. Single-writer per
/// session, so no interior locking.
#[derive(Debug, Clone, Default)]
pub struct GuestSessionStore {
    identities: HashMap<String, GuestIdentity>,
}

impl GuestSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &ShareToken) -> Option<&GuestIdentity> {
        self.identities.get(token.as_str())
    }

    pub fn insert(&mut self, token: &ShareToken, guest: GuestIdentity) {
        self.identities.insert(token.as_str().to_string(), guest);
    }
}

/// Gates everything a share-link requester may reach.
///
/// Permission is re-resolved through the token resolver on every
/// security-relevant call; nothing here trusts a permission flag or state
/// value carried over from a client.
pub struct ShareAccessController<R: TokenResolver> {
    resolver: R,
}

impl<R: TokenResolver> ShareAccessController<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Resolves a token into an access state. Lookup failures and revoked
    /// tokens both collapse to `Invalid`; a previously-stored guest identity
    /// for this exact token short-circuits the identification gate.
    pub fn resolve_share_access(
        &self,
        token: &ShareToken,
        session: &GuestSessionStore,
    ) -> AccessState {
        let Some(verification) = self.verify(token) else {
            return AccessState::Invalid;
        };
        match verification.permission {
            Permission::View => AccessState::ValidView {
                owner_name: verification.owner_name,
                label: verification.label,
            },
            Permission::Edit => match session.get(token) {
                Some(guest) => AccessState::Active {
                    permission: Permission::Edit,
                    guest: guest.clone(),
                    owner_name: verification.owner_name,
                    label: verification.label,
                },
                None => AccessState::ValidEdit {
                    owner_name: verification.owner_name,
                    label: verification.label,
                },
            },
        }
    }

    /// Supplies the guest identity for an edit link. The name must be
    /// non-empty; the email may be blank. On success the identity is cached
    /// for the remainder of the session and the state becomes `Active`.
    pub fn identify_guest(
        &self,
        token: &ShareToken,
        session: &mut GuestSessionStore,
        name: &str,
        email: &str,
    ) -> Result<AccessState> {
        let verification = self.verify(token).ok_or_else(invalid_token_error)?;
        if verification.permission != Permission::Edit {
            // View links have no identification step to begin with.
            return Err(LibError::invalid(
                "This link does not require guest access",
                anyhow!("guest identification attempted on a view token"),
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(LibError::invalid_with_details(
                "guest_name_required",
                "Please provide your name to continue",
                AccessDenialDetails::GuestIdentityRequired,
                anyhow!("empty guest name supplied for edit link"),
            ));
        }

        let guest = GuestIdentity::new(name, email.trim());
        session.insert(token, guest.clone());
        Ok(AccessState::Active {
            permission: Permission::Edit,
            guest,
            owner_name: verification.owner_name,
            label: verification.label,
        })
    }

    /// Fetches the shared tree's members, honoring the guest gate: a view
    /// link reads immediately, an edit link reads only once a guest identity
    /// is on file for this session.
    pub fn fetch_shared_members<S: MemberSource>(
        &self,
        token: &ShareToken,
        session: &GuestSessionStore,
        source: &S,
    ) -> Result<Vec<Member>> {
        let verification = self.verify(token).ok_or_else(invalid_token_error)?;
        if verification.permission == Permission::Edit && session.get(token).is_none() {
            return Err(guest_identity_error());
        }
        source.fetch_members(verification.tree_owner_id)
    }

    /// Authorizes one mutation arriving through a share link. The token is
    /// re-verified HERE, on every call: edit permission and a cached guest
    /// identity are both required, and the attribution attached to the
    /// returned mutation is the session's identity, never anything
    /// client-supplied.
    pub fn authorize_mutation(
        &self,
        token: &ShareToken,
        session: &GuestSessionStore,
        mutation: MemberMutation,
    ) -> Result<AttributedMutation> {
        let verification = self.verify(token).ok_or_else(|| {
            tracing::warn!("mutation rejected: share token invalid or revoked");
            invalid_token_error()
        })?;
        if verification.permission != Permission::Edit {
            tracing::warn!(
                granted = verification.permission.as_str(),
                "mutation rejected: share link lacks edit permission"
            );
            return Err(LibError::forbidden_with_details(
                "view_only_token",
                "This link does not allow changes",
                AccessDenialDetails::PermissionDenied {
                    required: Permission::Edit,
                    granted: verification.permission,
                },
                anyhow!("mutation attempted with view permission"),
            ));
        }
        let Some(guest) = session.get(token) else {
            tracing::warn!("mutation rejected: no guest identity on file for this session");
            return Err(guest_identity_error());
        };

        Ok(AttributedMutation {
            tree_owner_id: verification.tree_owner_id,
            mutation,
            attribution: Some(guest.clone()),
        })
    }

    fn verify(&self, token: &ShareToken) -> Option<TokenVerification> {
        match self.resolver.verify_token(token) {
            Ok(verification) if verification.valid => Some(verification),
            Ok(_) => None,
            Err(err) => {
                // The token itself stays out of the logs; it is a credential.
                tracing::warn!(error = %err, "share token verification failed");
                None
            }
        }
    }
}

fn invalid_token_error() -> LibError {
    LibError::not_found_with_details(
        "invalid_share_token",
        "This link is invalid or has expired",
        AccessDenialDetails::InvalidToken,
        anyhow!("share token failed verification"),
    )
}

fn guest_identity_error() -> LibError {
    LibError::forbidden_with_details(
        "guest_identity_required",
        "Please provide your name to continue",
        AccessDenialDetails::GuestIdentityRequired,
        anyhow!("edit link used without a guest identity"),
    )
}
