use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::ActorId;
use crate::config::RecruitmentConfig;

/// Roles consulted by the engine before privileged operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    HeadcountApprover,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::HeadcountApprover => "headcount_approver",
        }
    }
}

/// Who is acting and when. Passed explicitly into every operation that stamps an actor or
/// compares against the current time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub actor: ActorId,
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(actor: ActorId, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    pub fn current(actor: ActorId) -> Self {
        Self::new(actor, Utc::now())
    }
}

/// Authorization collaborator.
pub trait RoleAuthority: Send + Sync {
    fn has_role(&self, actor: &ActorId, role: Role) -> bool;
}

/// Fixed role grants, typically resolved from configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleAuthority {
    grants: BTreeMap<ActorId, BTreeSet<Role>>,
}

impl StaticRoleAuthority {
    pub fn from_config(config: &RecruitmentConfig) -> Self {
        config
            .headcount_approvers
            .iter()
            .cloned()
            .fold(Self::default(), |authority, actor| {
                authority.grant(actor, Role::HeadcountApprover)
            })
    }

    pub fn grant(mut self, actor: ActorId, role: Role) -> Self {
        self.grants.entry(actor).or_default().insert(role);
        self
    }
}

impl RoleAuthority for StaticRoleAuthority {
    fn has_role(&self, actor: &ActorId, role: Role) -> bool {
        self.grants
            .get(actor)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }
}
