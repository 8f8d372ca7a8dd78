//! Turns store change notifications into view updates for one person's screen.
//!
//! The screen reloads while the person still has certificates and is dismissed once the last
//! one is gone.

use crate::store::{CertificateStore, InMemoryCertificateStore, StoreEvent};
use certview_types::PersonId;
use std::sync::mpsc::{Receiver, TryRecvError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Re-derive the view from a fresh snapshot.
    Reload,
    /// The person has no certificates left; close the screen.
    Dismiss,
}

pub struct PersonWatcher {
    person_id: PersonId,
    events: Receiver<StoreEvent>,
}

impl PersonWatcher {
    pub fn new(store: &InMemoryCertificateStore, person_id: PersonId) -> Self {
        Self {
            events: store.subscribe(),
            person_id,
        }
    }

    pub fn person_id(&self) -> &PersonId {
        &self.person_id
    }

    /// Drain pending events and report what the screen should do, if anything.
    ///
    /// Several events for the same person collapse into one update.
    pub fn poll(&self, store: &impl CertificateStore) -> Option<ViewUpdate> {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(StoreEvent::PersonChanged(id)) => changed |= id == self.person_id,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if !changed {
            return None;
        }

        if store.current_certificates(&self.person_id).is_empty() {
            tracing::debug!(person = %self.person_id, "no certificates left, dismissing");
            Some(ViewUpdate::Dismiss)
        } else {
            Some(ViewUpdate::Reload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certview_types::{
        CertificateId, Entry, HealthCertificate, HealthCertifiedPerson, TestEntry, TestType,
        VaccinationState,
    };

    fn test_certificate() -> HealthCertificate {
        HealthCertificate::new(
            CertificateId::new_random(),
            "HC1:test",
            Entry::Test(TestEntry {
                test_type: TestType::Antigen,
                sample_collection: None,
            }),
        )
    }

    fn person(certificates: Vec<HealthCertificate>) -> HealthCertifiedPerson {
        HealthCertifiedPerson {
            name: None,
            date_of_birth: None,
            certificates,
            vaccination_state: VaccinationState::NotVaccinated,
        }
    }

    #[test]
    fn reloads_then_dismisses_when_last_certificate_removed() {
        let store = InMemoryCertificateStore::new();
        let erika = PersonId::new("erika").expect("id");
        let first = test_certificate();
        let second = test_certificate();
        store.insert(erika.clone(), person(vec![first.clone(), second.clone()]));

        let watcher = PersonWatcher::new(&store, erika);
        assert_eq!(watcher.poll(&store), None);

        store.remove_certificate_by_id(&first.id);
        assert_eq!(watcher.poll(&store), Some(ViewUpdate::Reload));

        store.remove_certificate_by_id(&second.id);
        assert_eq!(watcher.poll(&store), Some(ViewUpdate::Dismiss));
    }

    #[test]
    fn ignores_other_people() {
        let store = InMemoryCertificateStore::new();
        let erika = PersonId::new("erika").expect("id");
        let max = PersonId::new("max").expect("id");

        let watcher = PersonWatcher::new(&store, erika);
        store.insert(max, person(vec![test_certificate()]));
        assert_eq!(watcher.poll(&store), None);
    }

    #[test]
    fn collapses_multiple_events() {
        let store = InMemoryCertificateStore::new();
        let erika = PersonId::new("erika").expect("id");
        let watcher = PersonWatcher::new(&store, erika.clone());

        store.insert(erika.clone(), person(vec![test_certificate()]));
        store.insert(erika, person(vec![test_certificate(), test_certificate()]));
        assert_eq!(watcher.poll(&store), Some(ViewUpdate::Reload));
        assert_eq!(watcher.poll(&store), None);
    }
}
