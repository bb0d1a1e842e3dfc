use crate::shared::entity::{Entity, ID};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// A recurring payment the user wants to be reminded about.
///
/// Only the fields that reminder scheduling depends on are modelled here,
/// the rest of the record belongs to the subscription management screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: ID,
    pub name: String,
    pub active: bool,
    /// When the next payment is due. Subscriptions without one are never reminded about.
    #[serde(default)]
    pub next_payment_date: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn new(name: impl Into<String>, next_payment_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Default::default(),
            name: name.into(),
            active: true,
            next_payment_date,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl Entity for Subscription {
    fn id(&self) -> &ID {
        &self.id
    }
}
