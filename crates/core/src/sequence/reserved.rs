/// First identifier the allocator may issue. Everything below is reserved.
pub const MIN_USER_DEFINED_OBJECT_ID: i64 = 100_000;

/// Counter backing [`SequenceAllocator::next`](super::SequenceAllocator::next).
pub const GLOBAL_SEQUENCE_KEY: &str = "global";

/// Fixed system entities with identifiers in the reserved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedId {
    AdminUser,
    AdminWorkspace,
    PublicWorkspace,
    SystemUser,
    AnonymousUser,
}

impl ReservedId {
    pub const ALL: [ReservedId; 5] = [
        Self::AdminUser,
        Self::AdminWorkspace,
        Self::PublicWorkspace,
        Self::SystemUser,
        Self::AnonymousUser,
    ];

    pub const fn id(self) -> i64 {
        match self {
            Self::AdminUser => 1,
            Self::AdminWorkspace => 2,
            Self::PublicWorkspace => 3,
            Self::SystemUser => 4,
            Self::AnonymousUser => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::AdminUser => "AdminUser",
            Self::AdminWorkspace => "AdminWorkspace",
            Self::PublicWorkspace => "PublicWorkspace",
            Self::SystemUser => "SystemUser",
            Self::AnonymousUser => "AnonymousUser",
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|reserved| reserved.id() == id)
    }
}

/// True when `id` is one of the fixed system ids.
pub fn is_reserved_id(id: i64) -> bool {
    ReservedId::from_id(id).is_some()
}
