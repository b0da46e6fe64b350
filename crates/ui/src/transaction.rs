//! Optimistic save transactions
//!
//! A save writes the draft onto the entity handle before the store has
//! answered. The transaction remembers the pre-save content so a failed or
//! never-started save can put it back.

use crate::entity::EntityHandle;
use confdesk_core::{Attributes, DialogError, DialogResult};

/// Where a transaction stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Committed,
    RolledBack,
}

/// One optimistic write to an entity handle
#[derive(Debug, Clone)]
pub struct SaveTransaction {
    snapshot: Attributes,
    state: TransactionState,
}

impl SaveTransaction {
    /// Snapshot the handle's content
    pub fn begin(handle: &EntityHandle) -> Self {
        Self {
            snapshot: handle.content(),
            state: TransactionState::Pending,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Content the handle held when the transaction began
    pub fn snapshot(&self) -> &Attributes {
        &self.snapshot
    }

    /// Keep the optimistic write
    pub fn commit(&mut self) -> DialogResult<()> {
        self.finish(TransactionState::Committed)
    }

    /// Restore the snapshot and signal the handle changed
    pub fn rollback(&mut self, handle: &EntityHandle) -> DialogResult<()> {
        self.finish(TransactionState::RolledBack)?;
        let mut entity = handle.borrow_mut();
        entity.content = self.snapshot.clone();
        entity.trigger_changed();
        Ok(())
    }

    fn finish(&mut self, next: TransactionState) -> DialogResult<()> {
        if self.state != TransactionState::Pending {
            return Err(DialogError::invalid_state(format!(
                "save transaction already {:?}",
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }
}
