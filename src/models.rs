use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct TreeOwnerId(pub Uuid);

impl fmt::Display for TreeOwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TreeOwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for TreeOwnerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct MemberId(pub Uuid);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemberId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for MemberId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// One row of a user's family tree. `father_id`, `mother_id` and `spouse_id`
/// are back-references into the same tree, never ownership references; any of
/// them may dangle while data entry is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub tree_owner_id: TreeOwnerId,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anniversary_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub father_id: Option<MemberId>,
    pub mother_id: Option<MemberId>,
    pub spouse_id: Option<MemberId>,
}

impl Member {
    pub fn new(
        id: MemberId,
        tree_owner_id: TreeOwnerId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tree_owner_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            nickname: None,
            birth_date: None,
            death_date: None,
            anniversary_date: None,
            profile_image_url: None,
            description: None,
            father_id: None,
            mother_id: None,
            spouse_id: None,
        }
    }

    pub fn belongs_to(&self, tree_owner_id: TreeOwnerId) -> bool {
        self.tree_owner_id == tree_owner_id
    }
}

/// Identity of a parental union. Couple keys are normalized so that
/// `couple(a, b) == couple(b, a)`; single-parent keys live in a distinct key
/// space and never collide with a couple key containing the same member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnionKey {
    Couple(MemberId, MemberId),
    SingleParent(MemberId),
}

impl UnionKey {
    pub fn couple(a: MemberId, b: MemberId) -> Self {
        if b < a {
            UnionKey::Couple(b, a)
        } else {
            UnionKey::Couple(a, b)
        }
    }

    pub const fn single_parent(parent: MemberId) -> Self {
        UnionKey::SingleParent(parent)
    }
}

impl fmt::Display for UnionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnionKey::Couple(a, b) => write!(f, "union-{a}-{b}"),
            UnionKey::SingleParent(parent) => write!(f, "union-single-{parent}"),
        }
    }
}

/// Derived parental pairing: up to two partners and the ordered children
/// attached to them. Never persisted; rebuilt from member rows on every
/// layout invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub key: UnionKey,
    pub partner_a: Option<MemberId>,
    pub partner_b: Option<MemberId>,
    pub children: Vec<MemberId>,
}

impl Union {
    pub fn new(key: UnionKey, partner_a: Option<MemberId>, partner_b: Option<MemberId>) -> Self {
        Self {
            key,
            partner_a,
            partner_b,
            children: Vec::new(),
        }
    }

    pub fn partners(&self) -> impl Iterator<Item = MemberId> + '_ {
        self.partner_a.into_iter().chain(self.partner_b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    Person(MemberId),
    Union(UnionKey),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Person(id) => write!(f, "{id}"),
            NodeId::Union(key) => write!(f, "{key}"),
        }
    }
}

// Rendering collaborators address nodes by string id, so node ids serialize
// in their display form rather than as a tagged enum.
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    Union,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Person => "person",
            NodeKind::Union => "union",
        }
    }
}

/// A node of the pre-layout family graph: either a person carrying the full
/// member record, or a zero-size union anchor carrying no payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyNode {
    pub id: NodeId,
    pub member: Option<Member>,
}

impl FamilyNode {
    pub fn person(member: Member) -> Self {
        Self {
            id: NodeId::Person(member.id),
            member: Some(member),
        }
    }

    pub fn union(key: UnionKey) -> Self {
        Self {
            id: NodeId::Union(key),
            member: None,
        }
    }

    pub const fn kind(&self) -> NodeKind {
        match self.id {
            NodeId::Person(_) => NodeKind::Person,
            NodeId::Union(_) => NodeKind::Union,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyEdge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FamilyGraph {
    pub nodes: Vec<FamilyNode>,
    pub edges: Vec<FamilyEdge>,
}

/// Positioned node handed to the renderer. `x`/`y` name the TOP-LEFT corner
/// of the bounding box; the layout engine converts from center coordinates
/// before emitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub from: NodeId,
    pub to: NodeId,
}

impl LayoutEdge {
    /// Edges have no identity of their own beyond the endpoint concatenation.
    pub fn id(&self) -> String {
        format!("e{}-{}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    View,
    Edit,
}

impl Permission {
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Edit => "edit",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "view" => Some(Permission::View),
            "edit" => Some(Permission::Edit),
            _ => None,
        }
    }
}

/// Opaque unguessable credential granting access to one tree. Treated as a
/// secret: never logged in full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareToken(pub String);

impl ShareToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShareToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ShareToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// External lookup result for a share token. Validity is a single boolean
/// resolved by the collaborator that owns the token table; this core never
/// re-derives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenVerification {
    pub valid: bool,
    pub permission: Permission,
    pub tree_owner_id: TreeOwnerId,
    pub owner_name: String,
    pub label: String,
}

/// Client-attested attribution for guest edits. Never authenticated and never
/// used for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestIdentity {
    pub name: String,
    pub email: String,
}

impl GuestIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
    pub profile_image_url: Option<String>,
    pub description: Option<String>,
    pub father_id: Option<MemberId>,
    pub mother_id: Option<MemberId>,
    pub spouse_id: Option<MemberId>,
}

/// Partial update; `None` leaves the field untouched. Relational fields use a
/// double option so "clear this link" is expressible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub anniversary_date: Option<NaiveDate>,
    pub profile_image_url: Option<String>,
    pub description: Option<String>,
    pub father_id: Option<Option<MemberId>>,
    pub mother_id: Option<Option<MemberId>>,
    pub spouse_id: Option<Option<MemberId>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum MemberMutation {
    Add { member: NewMember },
    Edit { member_id: MemberId, patch: MemberPatch },
    Delete { member_id: MemberId },
}

/// A mutation that passed the share-access gate, scoped to its tree and
/// carrying guest attribution when it arrived through a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributedMutation {
    pub tree_owner_id: TreeOwnerId,
    pub mutation: MemberMutation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<GuestIdentity>,
}
