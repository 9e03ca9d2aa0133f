// ============================================================================
// spark-entities - Subscription
// Unsubscribe token returned by `subscribe`
// ============================================================================

use std::fmt;
use std::rc::Weak;

use crate::core::types::Listeners;

/// Keeps a subscriber registered. Dropping the token unsubscribes.
///
/// Hold on to it for as long as notifications are wanted:
///
/// ```
/// use spark_entities::StateCell;
///
/// let cell = StateCell::new(1);
/// let sub = cell.subscribe(|value| println!("{value}"));
/// assert_eq!(cell.subscriber_count(), 1);
///
/// drop(sub);
/// assert_eq!(cell.subscriber_count(), 0);
/// ```
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<Listeners>,
    id: u64,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<Listeners>, id: u64) -> Self {
        Self {
            registry,
            id,
            active: true,
        }
    }

    /// Unsubscribe now instead of on drop.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.active && self.registry.strong_count() > 0
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn drop_removes_listener() {
        let registry = Rc::new(Listeners::new());
        let id = registry.add(Rc::new(|| {}));
        let sub = Subscription::new(Rc::downgrade(&registry), id);
        assert!(sub.is_active());

        drop(sub);
        assert!(registry.is_empty());
    }

    #[test]
    fn explicit_unsubscribe() {
        let registry = Rc::new(Listeners::new());
        let id = registry.add(Rc::new(|| {}));
        Subscription::new(Rc::downgrade(&registry), id).unsubscribe();
        assert!(registry.is_empty());
    }

    #[test]
    fn outliving_the_registry_is_fine() {
        let registry = Rc::new(Listeners::new());
        let id = registry.add(Rc::new(|| {}));
        let sub = Subscription::new(Rc::downgrade(&registry), id);

        drop(registry);
        assert!(!sub.is_active());
    }
}
