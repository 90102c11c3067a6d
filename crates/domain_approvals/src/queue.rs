//! Work queue ordering for pending approvals

use chrono::{DateTime, Utc};

use crate::approval::{Approval, ApprovalStatus};

/// Pending approvals ordered by priority rank, then request time, then id
///
/// Non-pending approvals are dropped.
pub fn priority_queue<I>(approvals: I) -> Vec<Approval>
where
    I: IntoIterator<Item = Approval>,
{
    let mut queue: Vec<Approval> = approvals
        .into_iter()
        .filter(|a| a.status == ApprovalStatus::Pending)
        .collect();
    queue.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then(a.requested_at.cmp(&b.requested_at))
            .then(a.id.cmp(&b.id))
    });
    queue
}

/// Pending approvals past their due date at `as_of`, most overdue first
pub fn overdue<I>(approvals: I, as_of: DateTime<Utc>) -> Vec<Approval>
where
    I: IntoIterator<Item = Approval>,
{
    let mut late: Vec<Approval> = approvals
        .into_iter()
        .filter(|a| a.status == ApprovalStatus::Pending && as_of > a.due_date)
        .collect();
    late.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
    late
}
