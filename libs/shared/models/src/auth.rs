use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `super_admin > store_admin > staff > customer` (§6, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    StoreAdmin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::StoreAdmin => "store_admin",
            Role::Staff => "staff",
            Role::Customer => "customer",
        }
    }
}

/// The ambient per-request identity (§9): flows through the call chain as an
/// explicit parameter, never as mutable global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub id: Uuid,
    pub role: Role,
    pub store_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new(id: Uuid, role: Role, store_id: Option<Uuid>) -> Self {
        Self { id, role, store_id }
    }

    pub fn is_same_store(&self, store_id: Uuid) -> bool {
        self.store_id == Some(store_id)
    }
}

/// Closed set of actions the policy function is asked about (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadOwn,
    ReadStore,
    ReadAny,
    WriteOwn,
    WriteStore,
    WriteAny,
    ManageWebhooks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allow,
    Deny,
}

/// `allow(role, action, scope) -> bool` (§9), expressed here as a pure match
/// over the closed role/action enums plus the caller-supplied store-ownership
/// check (`ctx.is_same_store`).
pub fn allow(ctx: &RequestContext, action: Action, target_store_id: Option<Uuid>) -> Permission {
    use Action::*;
    use Role::*;

    let ok = match (ctx.role, action) {
        (SuperAdmin, _) => true,
        (_, ManageWebhooks) => false,
        (StoreAdmin, ReadAny) | (StoreAdmin, WriteAny) => false,
        (StoreAdmin, ReadStore) | (StoreAdmin, WriteStore) => {
            target_store_id.map(|s| ctx.is_same_store(s)).unwrap_or(false)
        }
        (Staff, ReadStore) => target_store_id.map(|s| ctx.is_same_store(s)).unwrap_or(false),
        (Staff, WriteStore) => false,
        (Customer, ReadOwn) | (Customer, WriteOwn) => true,
        (StoreAdmin, ReadOwn) | (StoreAdmin, WriteOwn) => true,
        (Staff, ReadOwn) | (Staff, WriteOwn) => true,
        _ => false,
    };

    if ok {
        Permission::Allow
    } else {
        Permission::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_may_not_touch_store_scope() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::Customer, None);
        assert_eq!(
            allow(&ctx, Action::WriteStore, Some(Uuid::new_v4())),
            Permission::Deny
        );
    }

    #[test]
    fn store_admin_scoped_to_own_store() {
        let store = Uuid::new_v4();
        let other = Uuid::new_v4();
        let ctx = RequestContext::new(Uuid::new_v4(), Role::StoreAdmin, Some(store));
        assert_eq!(allow(&ctx, Action::WriteStore, Some(store)), Permission::Allow);
        assert_eq!(allow(&ctx, Action::WriteStore, Some(other)), Permission::Deny);
    }

    #[test]
    fn super_admin_is_unrestricted() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::SuperAdmin, None);
        assert_eq!(allow(&ctx, Action::ManageWebhooks, None), Permission::Allow);
    }

    #[test]
    fn webhook_management_is_super_admin_only() {
        let ctx = RequestContext::new(Uuid::new_v4(), Role::StoreAdmin, Some(Uuid::new_v4()));
        assert_eq!(allow(&ctx, Action::ManageWebhooks, None), Permission::Deny);
    }
}
