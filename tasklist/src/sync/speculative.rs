//! Speculative transitions: apply a change now, keep what it replaced.
//!
//! A [`Speculation`] is created at the moment a change is applied and held
//! until the remote outcome is known. Success drops it with
//! [`commit`](Speculation::commit); failure writes the captured value back
//! with [`roll_back`](Speculation::roll_back). Restoring is a whole-value
//! overwrite, so unrelated mutations made in between are lost on rollback.

/// The pre-change value of a speculatively modified `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a speculation must be committed or rolled back"]
pub struct Speculation<T> {
    previous: T,
}

impl<T: Clone> Speculation<T> {
    /// Capture the current value without changing it.
    pub fn capture(current: &T) -> Self {
        Self {
            previous: current.clone(),
        }
    }

    /// Capture `target`, then mutate it with `change`.
    ///
    /// Returns the speculation together with whatever `change` returned.
    pub fn apply<R>(target: &mut T, change: impl FnOnce(&mut T) -> R) -> (Self, R) {
        let speculation = Self::capture(target);
        let out = change(target);
        (speculation, out)
    }
}

impl<T> Speculation<T> {
    /// The value as it was before the change.
    pub const fn previous(&self) -> &T {
        &self.previous
    }

    /// Accept the change; the captured value is discarded.
    pub fn commit(self) {}

    /// Reject the change and restore the captured value into `target`.
    pub fn roll_back(self, target: &mut T) {
        *target = self.previous;
    }
}
