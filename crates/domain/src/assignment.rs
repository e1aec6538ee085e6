//! Membership selection and reconciliation.
//!
//! An [`AssignmentSession`] tracks one in-progress edit against a group's
//! permission membership or an access point's permission mapping. Selections
//! are sets: `to_add` only ever holds ids outside the authoritative
//! membership and `to_remove` only ids inside it, so the two never overlap
//! and a repeated selection is a no-op.

use std::collections::BTreeSet;

use turnstile_core::{AppError, AppResult};

use crate::PermissionId;

/// Maximum number of members a target may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Any number of members (permission groups).
    Unbounded,
    /// At most one member (access point mapping).
    AtMostOne,
}

/// Pending add and remove sets against one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDiff {
    to_add: BTreeSet<PermissionId>,
    to_remove: BTreeSet<PermissionId>,
}

impl AssignmentDiff {
    /// Returns permissions selected for addition.
    #[must_use]
    pub fn to_add(&self) -> &BTreeSet<PermissionId> {
        &self.to_add
    }

    /// Returns permissions selected for removal.
    #[must_use]
    pub fn to_remove(&self) -> &BTreeSet<PermissionId> {
        &self.to_remove
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Applies the diff to a membership set.
    #[must_use]
    pub fn apply_to(&self, current: &BTreeSet<PermissionId>) -> BTreeSet<PermissionId> {
        current
            .union(&self.to_add)
            .filter(|permission| !self.to_remove.contains(permission))
            .copied()
            .collect()
    }
}

/// Computes the minimal diff that turns `current` into `desired`.
#[must_use]
pub fn reconcile(
    current: &BTreeSet<PermissionId>,
    desired: &BTreeSet<PermissionId>,
) -> AssignmentDiff {
    AssignmentDiff {
        to_add: desired.difference(current).copied().collect(),
        to_remove: current.difference(desired).copied().collect(),
    }
}

/// Direction of one batched commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// Adds `to_add` (or maps the single selection for cardinality one).
    Add,
    /// Removes `to_remove`.
    Remove,
}

impl CommitKind {
    /// Returns a stable label used in messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// Lifecycle of an edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentPhase {
    /// Nothing selected.
    Idle,
    /// Selection in progress.
    Selecting,
    /// A batch is in flight; selection is frozen.
    Committing(CommitKind),
    /// The last commit failed; selection is preserved for retry.
    Error(AppError),
}

/// One edit session against a target's membership.
#[derive(Debug, Clone)]
pub struct AssignmentSession<T> {
    target: T,
    cardinality: Cardinality,
    current: BTreeSet<PermissionId>,
    diff: AssignmentDiff,
    phase: AssignmentPhase,
}

impl<T: Copy> AssignmentSession<T> {
    /// Opens a session from freshly fetched authoritative membership.
    #[must_use]
    pub fn open(target: T, cardinality: Cardinality, current: BTreeSet<PermissionId>) -> Self {
        Self {
            target,
            cardinality,
            current,
            diff: AssignmentDiff::default(),
            phase: AssignmentPhase::Idle,
        }
    }

    /// Returns the edited target.
    #[must_use]
    pub fn target(&self) -> T {
        self.target
    }

    /// Returns the target cardinality.
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns the authoritative membership the session was built against.
    #[must_use]
    pub fn current(&self) -> &BTreeSet<PermissionId> {
        &self.current
    }

    /// Returns the pending selection.
    #[must_use]
    pub fn diff(&self) -> &AssignmentDiff {
        &self.diff
    }

    /// Returns the session phase.
    #[must_use]
    pub fn phase(&self) -> &AssignmentPhase {
        &self.phase
    }

    /// Returns the error of the last failed commit, if the session is in error.
    #[must_use]
    pub fn last_error(&self) -> Option<&AppError> {
        match &self.phase {
            AssignmentPhase::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Returns candidates for addition: `all \ current`.
    #[must_use]
    pub fn available(&self, all: impl IntoIterator<Item = PermissionId>) -> BTreeSet<PermissionId> {
        all.into_iter()
            .filter(|permission| !self.current.contains(permission))
            .collect()
    }

    /// Returns the membership expected once every pending batch commits.
    #[must_use]
    pub fn projected(&self) -> BTreeSet<PermissionId> {
        match self.cardinality {
            Cardinality::AtMostOne if !self.diff.to_add.is_empty() => self.diff.to_add.clone(),
            _ => self.diff.apply_to(&self.current),
        }
    }

    /// Selects a permission for addition.
    ///
    /// Returns `false` when it was already selected. For cardinality one the
    /// new selection replaces any earlier one.
    pub fn select_for_add(&mut self, permission: PermissionId) -> AppResult<bool> {
        self.ensure_editable()?;

        if self.current.contains(&permission) {
            return Err(AppError::Validation(format!(
                "permission '{permission}' is already assigned and cannot be added"
            )));
        }

        if self.diff.to_add.contains(&permission) {
            self.resume();
            return Ok(false);
        }

        if self.cardinality == Cardinality::AtMostOne {
            self.diff.to_add.clear();
        }

        self.diff.to_add.insert(permission);
        self.phase = AssignmentPhase::Selecting;
        Ok(true)
    }

    /// Selects a current member for removal.
    ///
    /// Returns `false` when it was already selected.
    pub fn select_for_remove(&mut self, permission: PermissionId) -> AppResult<bool> {
        self.ensure_editable()?;

        if !self.current.contains(&permission) {
            return Err(AppError::Validation(format!(
                "permission '{permission}' is not assigned and cannot be removed"
            )));
        }

        let inserted = self.diff.to_remove.insert(permission);
        self.phase = AssignmentPhase::Selecting;
        Ok(inserted)
    }

    /// Drops a permission from either pending set.
    pub fn deselect(&mut self, permission: PermissionId) -> AppResult<bool> {
        self.ensure_editable()?;

        let removed =
            self.diff.to_add.remove(&permission) | self.diff.to_remove.remove(&permission);
        self.settle_phase();
        Ok(removed)
    }

    /// Discards the whole selection.
    pub fn clear(&mut self) -> AppResult<()> {
        self.ensure_editable()?;
        self.diff = AssignmentDiff::default();
        self.phase = AssignmentPhase::Idle;
        Ok(())
    }

    /// Leaves the error phase without changing the selection.
    pub fn resume(&mut self) {
        if matches!(self.phase, AssignmentPhase::Error(_)) {
            self.settle_phase();
        }
    }

    /// Freezes the selection and returns the batch to send.
    pub fn begin_commit(&mut self, kind: CommitKind) -> AppResult<BTreeSet<PermissionId>> {
        if let AssignmentPhase::Committing(in_flight) = self.phase {
            return Err(AppError::Conflict(format!(
                "a {} commit is already in flight",
                in_flight.as_str()
            )));
        }

        let batch = match kind {
            CommitKind::Add => self.diff.to_add.clone(),
            CommitKind::Remove => self.diff.to_remove.clone(),
        };

        if batch.is_empty() {
            return Err(AppError::Validation(format!(
                "no permissions selected to {}",
                kind.as_str()
            )));
        }

        self.phase = AssignmentPhase::Committing(kind);
        Ok(batch)
    }

    /// Adopts the membership confirmed by the store after a successful commit.
    pub fn commit_succeeded(&mut self, membership: BTreeSet<PermissionId>) {
        if let AssignmentPhase::Committing(kind) = self.phase {
            match kind {
                CommitKind::Add => self.diff.to_add.clear(),
                CommitKind::Remove => self.diff.to_remove.clear(),
            }
        }

        self.current = membership;
        self.prune_selection();
        self.settle_phase();
    }

    /// Records a failed commit. The selection stays intact for retry.
    pub fn commit_failed(&mut self, error: AppError) {
        self.phase = AssignmentPhase::Error(error);
    }

    /// Replaces the authoritative membership with a fresh read.
    ///
    /// Selections that no longer fit the new membership are dropped.
    pub fn refresh(&mut self, current: BTreeSet<PermissionId>) -> AppResult<()> {
        self.ensure_editable()?;
        self.current = current;
        self.prune_selection();
        self.settle_phase();
        Ok(())
    }

    fn prune_selection(&mut self) {
        let current = &self.current;
        self.diff
            .to_add
            .retain(|permission| !current.contains(permission));
        self.diff
            .to_remove
            .retain(|permission| current.contains(permission));
    }

    fn ensure_editable(&self) -> AppResult<()> {
        match self.phase {
            AssignmentPhase::Committing(kind) => Err(AppError::Conflict(format!(
                "selection is locked while a {} commit is in flight",
                kind.as_str()
            ))),
            _ => Ok(()),
        }
    }

    fn settle_phase(&mut self) {
        self.phase = if self.diff.is_empty() {
            AssignmentPhase::Idle
        } else {
            AssignmentPhase::Selecting
        };
    }
}
