//! Pricing plans
//!
//! The catalog is static. Subscribing only changes `user.plan`; there is no
//! payment step.

use app_state::{Plan, SessionStore, UserUpdate};
use serde::Serialize;

/// One tier in the pricing catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingPlan {
    /// Tier this entry describes
    pub plan: Plan,
    /// Display name
    pub name: &'static str,
    /// Display price
    pub price: &'static str,
    /// Billing period label
    pub billing: &'static str,
    /// Feature bullets
    pub features: &'static [&'static str],
}

/// All tiers, cheapest first
pub const CATALOG: [PricingPlan; 3] = [
    PricingPlan {
        plan: Plan::Free,
        name: "Free",
        price: "$0",
        billing: "Forever",
        features: &[
            "3 advice generations per day",
            "Basic advice customization",
            "Save up to 10 favorite advice",
        ],
    },
    PricingPlan {
        plan: Plan::Premium,
        name: "Premium",
        price: "$4.99",
        billing: "per month",
        features: &[
            "Unlimited advice generations",
            "Advanced customization options",
            "Unlimited saved advice",
            "Priority support",
        ],
    },
    PricingPlan {
        plan: Plan::Pro,
        name: "Pro",
        price: "$9.99",
        billing: "per month",
        features: &[
            "All Premium features",
            "AI-powered conversation practice",
            "Personalized coaching sessions",
            "Advanced analytics and insights",
        ],
    },
];

/// Catalog entry for `plan`
pub fn pricing_for(plan: Plan) -> &'static PricingPlan {
    match plan {
        Plan::Free => &CATALOG[0],
        Plan::Premium => &CATALOG[1],
        Plan::Pro => &CATALOG[2],
    }
}

/// Limits that follow from a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    /// Maximum saved advice, `None` for unlimited
    pub max_saved: Option<usize>,
    /// Advertised daily generations, `None` for unlimited; not enforced
    pub daily_generations: Option<u32>,
}

impl PlanLimits {
    /// Saved-item cap on the free tier
    pub const FREE_SAVED_LIMIT: usize = 10;
    /// Advertised daily generations on the free tier
    pub const FREE_DAILY_GENERATIONS: u32 = 3;

    /// Limits for `plan`
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self {
                max_saved: Some(Self::FREE_SAVED_LIMIT),
                daily_generations: Some(Self::FREE_DAILY_GENERATIONS),
            },
            Plan::Premium | Plan::Pro => Self { max_saved: None, daily_generations: None },
        }
    }

    /// Whether another item may be saved when `current` are saved
    pub fn allows_saving(&self, current: usize) -> bool {
        self.max_saved.map_or(true, |max| current < max)
    }
}

/// Catalog entry paired with whether it is the user's plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOption {
    /// Catalog entry
    pub pricing: &'static PricingPlan,
    /// Whether the signed-in user is on this tier
    pub is_current: bool,
}

impl PlanOption {
    /// Label for the tier's action button
    pub fn action_label(&self) -> &'static str {
        if self.is_current {
            "Current Plan"
        } else if self.pricing.plan == Plan::Free {
            "Select Plan"
        } else {
            "Subscribe"
        }
    }
}

/// Catalog annotated for `current`
///
/// With no signed-in user nothing is marked current.
pub fn plan_options(current: Option<Plan>) -> Vec<PlanOption> {
    CATALOG
        .iter()
        .map(|pricing| PlanOption { pricing, is_current: current == Some(pricing.plan) })
        .collect()
}

/// Switch the signed-in user to `plan`
///
/// Returns whether the plan was applied; `false` when signed out or when
/// the change could not be persisted.
pub async fn subscribe(session: &SessionStore, plan: Plan) -> bool {
    let applied = session.update_user(UserUpdate::plan(plan)).await;
    if applied {
        tracing::info!(%plan, "subscribed");
    }
    applied
}
