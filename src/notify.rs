// ============================================================================
// Canal de notification : "last updated"
// ============================================================================
// Le Store publie un timestamp après chaque mutation ; le PortfolioView
// s'abonne et relit le stockage quand la valeur change.
//
// CONCEPT RUST : tokio::sync::watch
// - Un seul écrivain, N lecteurs
// - Les lecteurs ne voient que la DERNIÈRE valeur (pas de file d'attente)
// - has_changed() / borrow_and_update() marchent sans runtime async
// ============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

/// Côté écrivain du signal "last updated"
#[derive(Debug, Clone)]
pub struct UpdateNotifier {
    tx: Arc<watch::Sender<Option<DateTime<Utc>>>>,
}

impl UpdateNotifier {
    /// Crée un canal sans valeur (jamais mis à jour)
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Publie un nouveau timestamp
    ///
    /// send_replace() réussit même s'il n'y a aucun abonné.
    pub fn update_time(&self, at: DateTime<Utc>) {
        debug!(at = %at.to_rfc3339(), "Publishing last-updated time");
        self.tx.send_replace(Some(at));
    }

    /// Crée un nouvel abonné
    pub fn subscribe(&self) -> UpdateSubscriber {
        UpdateSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.tx.borrow()
    }
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Côté lecteur du signal "last updated"
#[derive(Debug)]
pub struct UpdateSubscriber {
    rx: watch::Receiver<Option<DateTime<Utc>>>,
}

impl UpdateSubscriber {
    /// Retourne true si une nouvelle valeur a été publiée depuis le dernier
    /// appel, et la marque comme vue
    pub fn take_changed(&mut self) -> bool {
        match self.rx.has_changed() {
            Ok(true) => {
                self.rx.borrow_and_update();
                true
            }
            _ => false,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_sees_update_once() {
        let notifier = UpdateNotifier::new();
        let mut sub = notifier.subscribe();

        assert!(!sub.take_changed());
        assert!(sub.last_updated().is_none());

        let now = Utc::now();
        notifier.update_time(now);

        assert!(sub.take_changed());
        assert!(!sub.take_changed());
        assert_eq!(sub.last_updated(), Some(now));
    }

    #[test]
    fn test_update_without_subscribers() {
        let notifier = UpdateNotifier::new();
        let now = Utc::now();
        notifier.update_time(now);
        assert_eq!(notifier.last_updated(), Some(now));
    }

    #[test]
    fn test_cloned_notifier_reaches_same_subscribers() {
        let notifier = UpdateNotifier::new();
        let writer = notifier.clone();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        writer.update_time(Utc::now());
        assert!(a.take_changed());
        assert!(b.take_changed());
    }
}
