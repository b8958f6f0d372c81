use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::AppError;

/// The five actor roles of the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Client,
    Livreur,
    Merchant,
    Support,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
            Role::Livreur => "livreur",
            Role::Merchant => "merchant",
            Role::Support => "support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "client" => Ok(Role::Client),
            "livreur" => Ok(Role::Livreur),
            "merchant" => Ok(Role::Merchant),
            "support" => Ok(Role::Support),
            other => Err(AppError::BadRequest(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageProducts,
    ManagePromotions,
    PlaceOrder,
    ViewOwnOrders,
    ViewAllOrders,
    TransitionOrder,
    CancelOrder,
    PayOrder,
    DispatchDelivery,
    AcceptDelivery,
    UpdateDeliveryStatus,
    AssignDelivery,
    DeleteDelivery,
    UpdateCourierProfile,
    OpenTicket,
    ManageTickets,
    AdjustInventory,
}

/// Static role -> capability table. A pure lookup, no dynamic dispatch.
pub fn capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Admin => &[
            ManageProducts,
            ManagePromotions,
            PlaceOrder,
            ViewOwnOrders,
            ViewAllOrders,
            TransitionOrder,
            CancelOrder,
            PayOrder,
            DispatchDelivery,
            AcceptDelivery,
            UpdateDeliveryStatus,
            AssignDelivery,
            DeleteDelivery,
            UpdateCourierProfile,
            OpenTicket,
            ManageTickets,
            AdjustInventory,
        ],
        Role::Client => &[PlaceOrder, ViewOwnOrders, CancelOrder, PayOrder, OpenTicket],
        Role::Merchant => &[
            ManageProducts,
            ManagePromotions,
            ViewOwnOrders,
            TransitionOrder,
            CancelOrder,
            DispatchDelivery,
            DeleteDelivery,
            AdjustInventory,
        ],
        Role::Livreur => &[
            AcceptDelivery,
            UpdateDeliveryStatus,
            UpdateCourierProfile,
            ViewOwnOrders,
        ],
        Role::Support => &[ViewAllOrders, ManageTickets],
    }
}

pub fn has_capability(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

pub fn ensure_capability(role: Role, capability: Capability) -> Result<(), AppError> {
    if has_capability(role, capability) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        for cap in capabilities(Role::Merchant) {
            assert!(has_capability(Role::Admin, *cap));
        }
        for cap in capabilities(Role::Client) {
            assert!(has_capability(Role::Admin, *cap));
        }
    }

    #[test]
    fn client_cannot_manage_products() {
        assert!(!has_capability(Role::Client, Capability::ManageProducts));
        assert!(ensure_capability(Role::Client, Capability::ManageProducts).is_err());
    }

    #[test]
    fn livreur_can_accept_deliveries_but_not_dispatch() {
        assert!(has_capability(Role::Livreur, Capability::AcceptDelivery));
        assert!(!has_capability(Role::Livreur, Capability::DispatchDelivery));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [
            Role::Admin,
            Role::Client,
            Role::Livreur,
            Role::Merchant,
            Role::Support,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
