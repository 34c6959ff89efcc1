//! Merchant identity.

/// The party issuing payment commands.
///
/// Asked on every gateway call; an unauthenticated merchant is refused
/// before the transaction is read.
pub trait Merchant: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// A merchant whose authentication was settled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMerchant {
    authenticated: bool,
}

impl StaticMerchant {
    /// A merchant that is always authenticated.
    pub const fn trusted() -> Self {
        Self {
            authenticated: true,
        }
    }

    /// A merchant that is never authenticated.
    pub const fn anonymous() -> Self {
        Self {
            authenticated: false,
        }
    }
}

impl From<bool> for StaticMerchant {
    fn from(authenticated: bool) -> Self {
        Self { authenticated }
    }
}

impl Merchant for StaticMerchant {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}
