//! Optimistic list edits with rollback
//!
//! The operator dashboard applies mutations to its local record list before
//! the backing call resolves, then either commits or rolls back. Only one
//! change may be in flight at a time; a second action while one is pending is
//! rejected rather than queued, which keeps rollback unambiguous.

use crate::types::{ArchwayError, Result};

/// Handle for one in-flight change. Commit and rollback both consume it.
#[derive(Debug, PartialEq, Eq)]
pub struct ChangeToken(u64);

enum Pending<T> {
    Removed { index: usize, item: T },
    Updated { index: usize, previous: T },
}

/// A record list supporting apply-then-confirm edits
pub struct OptimisticSet<T> {
    items: Vec<T>,
    pending: Option<(u64, Pending<T>)>,
    next_token: u64,
}

impl<T> OptimisticSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            pending: None,
            next_token: 0,
        }
    }

    /// Current view of the list, with any pending change applied
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.pending.is_some() {
            return Err(ArchwayError::BadRequest(
                "Another change is still pending".to_string(),
            ));
        }
        Ok(())
    }

    fn find(&self, matches: impl Fn(&T) -> bool) -> Result<usize> {
        self.items
            .iter()
            .position(matches)
            .ok_or_else(|| ArchwayError::NotFound("No matching record".to_string()))
    }

    fn issue_token(&mut self, pending: Pending<T>) -> ChangeToken {
        self.next_token += 1;
        self.pending = Some((self.next_token, pending));
        ChangeToken(self.next_token)
    }

    /// Remove the first matching record from the view, pending confirmation
    pub fn begin_remove(&mut self, matches: impl Fn(&T) -> bool) -> Result<ChangeToken> {
        self.ensure_idle()?;
        let index = self.find(matches)?;
        let item = self.items.remove(index);
        Ok(self.issue_token(Pending::Removed { index, item }))
    }

    /// Replace the first matching record in the view, pending confirmation
    pub fn begin_update(
        &mut self,
        matches: impl Fn(&T) -> bool,
        replacement: T,
    ) -> Result<ChangeToken> {
        self.ensure_idle()?;
        let index = self.find(matches)?;
        let previous = std::mem::replace(&mut self.items[index], replacement);
        Ok(self.issue_token(Pending::Updated { index, previous }))
    }

    fn take_pending(&mut self, token: &ChangeToken) -> Result<Pending<T>> {
        match self.pending.take() {
            Some((id, pending)) if id == token.0 => Ok(pending),
            other => {
                self.pending = other;
                Err(ArchwayError::BadRequest(
                    "Change token does not match the pending change".to_string(),
                ))
            }
        }
    }

    /// The backing call succeeded; the applied view becomes permanent
    pub fn commit(&mut self, token: ChangeToken) -> Result<()> {
        self.take_pending(&token).map(|_| ())
    }

    /// The backing call failed; restore the record where it was
    pub fn rollback(&mut self, token: ChangeToken) -> Result<()> {
        match self.take_pending(&token)? {
            Pending::Removed { index, item } => {
                let index = index.min(self.items.len());
                self.items.insert(index, item);
            }
            Pending::Updated { index, previous } => {
                self.items[index] = previous;
            }
        }
        Ok(())
    }
}
