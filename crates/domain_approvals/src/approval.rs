//! Approval aggregate

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{ApprovalId, Money, TenantId};
use crate::error::ApprovalError;

/// Approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            "cancelled" => Ok(ApprovalStatus::Cancelled),
            other => Err(ApprovalError::Validation(format!("unknown approval status `{other}`"))),
        }
    }
}

/// Work priority; lower rank is served first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(ApprovalError::Validation(format!("unknown priority `{other}`"))),
        }
    }
}

/// Kind of entity an approval decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Claim,
    Deduction,
    Promotion,
    Budget,
    Rebate,
    TradingTerm,
    Campaign,
}

impl EntityType {
    pub const ALL: [EntityType; 7] = [
        EntityType::Claim,
        EntityType::Deduction,
        EntityType::Promotion,
        EntityType::Budget,
        EntityType::Rebate,
        EntityType::TradingTerm,
        EntityType::Campaign,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Claim => "claim",
            EntityType::Deduction => "deduction",
            EntityType::Promotion => "promotion",
            EntityType::Budget => "budget",
            EntityType::Rebate => "rebate",
            EntityType::TradingTerm => "trading_term",
            EntityType::Campaign => "campaign",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ApprovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ApprovalError::Validation(format!("unknown entity type `{s}`")))
    }
}

/// Decision recorded when an approval leaves `Pending`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved {
        by: String,
        at: DateTime<Utc>,
        comments: Option<String>,
    },
    Rejected {
        by: String,
        at: DateTime<Utc>,
        reason: String,
        comments: Option<String>,
    },
    Cancelled {
        by: String,
        at: DateTime<Utc>,
        reason: Option<String>,
    },
}

impl ApprovalDecision {
    pub fn decided_by(&self) -> &str {
        match self {
            ApprovalDecision::Approved { by, .. }
            | ApprovalDecision::Rejected { by, .. }
            | ApprovalDecision::Cancelled { by, .. } => by,
        }
    }
}

/// Input for raising an approval request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApproval {
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub amount: Money,
    pub priority: Option<Priority>,
    pub sla_hours: Option<u32>,
    /// Explicit due date; otherwise derived from the SLA
    pub due_date: Option<DateTime<Utc>>,
    pub requested_by: String,
    pub assigned_to: Option<String>,
}

/// A time-boxed request to approve an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: ApprovalId,
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub entity_name: Option<String>,
    pub amount: Money,
    pub status: ApprovalStatus,
    pub priority: Priority,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub due_date: DateTime<Utc>,
    pub sla_hours: u32,
    pub decision: Option<ApprovalDecision>,
    /// Optimistic concurrency version
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Approval {
    /// Raises a pending approval
    ///
    /// The due date is `requested_at + sla_hours` unless the input overrides
    /// it; `default_sla_hours` applies when the input carries no SLA. An
    /// overriding due date also fixes `sla_hours` to the whole hours before it.
    pub fn request(
        input: NewApproval,
        requested_at: DateTime<Utc>,
        default_sla_hours: u32,
    ) -> Result<Self, ApprovalError> {
        if !input.amount.is_positive() {
            return Err(ApprovalError::Validation("amount must be positive".into()));
        }
        input
            .amount
            .ensure_storable()
            .map_err(|e| ApprovalError::Validation(e.to_string()))?;
        if input.requested_by.trim().is_empty() {
            return Err(ApprovalError::Validation("requested_by is required".into()));
        }
        let (sla_hours, due_date) = match input.due_date {
            Some(due) if due < requested_at => {
                return Err(ApprovalError::Validation("due date precedes request time".into()))
            }
            // Whole hours until the due date, rounded down
            Some(due) => {
                let hours = u32::try_from((due - requested_at).num_hours())
                    .map_err(|_| ApprovalError::Validation("due date is too far out".into()))?;
                (hours, due)
            }
            None => {
                let hours = input.sla_hours.unwrap_or(default_sla_hours);
                let due = requested_at
                    .checked_add_signed(Duration::hours(i64::from(hours)))
                    .ok_or_else(|| {
                        ApprovalError::Validation(format!("SLA of {hours} hours is out of range"))
                    })?;
                (hours, due)
            }
        };

        Ok(Self {
            id: ApprovalId::new_v7(),
            tenant_id: input.tenant_id,
            entity_type: input.entity_type,
            entity_id: input.entity_id,
            entity_name: input.entity_name,
            amount: input.amount,
            status: ApprovalStatus::Pending,
            priority: input.priority.unwrap_or_default(),
            requested_by: input.requested_by,
            requested_at,
            assigned_to: input.assigned_to,
            due_date,
            sla_hours,
            decision: None,
            version: 0,
            updated_at: requested_at,
        })
    }

    pub fn approve(
        &mut self,
        actor: &str,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        self.decide(ApprovalStatus::Approved, now)?;
        self.decision = Some(ApprovalDecision::Approved {
            by: actor.to_string(),
            at: now,
            comments,
        });
        Ok(())
    }

    pub fn reject(
        &mut self,
        actor: &str,
        reason: &str,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        if reason.trim().is_empty() {
            return Err(ApprovalError::Validation("rejection reason is required".into()));
        }
        self.decide(ApprovalStatus::Rejected, now)?;
        self.decision = Some(ApprovalDecision::Rejected {
            by: actor.to_string(),
            at: now,
            reason: reason.to_string(),
            comments,
        });
        Ok(())
    }

    pub fn cancel(
        &mut self,
        actor: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ApprovalError> {
        self.decide(ApprovalStatus::Cancelled, now)?;
        self.decision = Some(ApprovalDecision::Cancelled {
            by: actor.to_string(),
            at: now,
            reason,
        });
        Ok(())
    }

    /// Rejection reason, if the approval was rejected
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.decision {
            Some(ApprovalDecision::Rejected { reason, .. }) => Some(reason),
            _ => None,
        }
    }

    fn decide(&mut self, target: ApprovalStatus, now: DateTime<Utc>) -> Result<(), ApprovalError> {
        if self.status != ApprovalStatus::Pending {
            return Err(ApprovalError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_rank_order() {
        assert!(Priority::Urgent.rank() < Priority::High.rank());
        assert!(Priority::High.rank() < Priority::Normal.rank());
        assert!(Priority::Normal.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_entity_type_parse() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert!("invoice".parse::<EntityType>().is_err());
    }
}
