//! Certificate store and value-set provider interfaces.
//!
//! The presentation core never owns certificates. It reads snapshots through
//! [`CertificateStore`] and value sets through [`ValueSetProvider`], and callers re-derive
//! whenever the store reports a change.
//!
//! [`InMemoryCertificateStore`] is the store used by the binaries: it is filled from a directory
//! of person snapshot files and publishes a [`StoreEvent`] to every subscriber on each mutation.

use crate::constants::SNAPSHOT_EXTENSION;
use crate::{CoreError, CoreResult};
use certview_types::{
    CertificateId, HealthCertificate, HealthCertifiedPerson, PersonId, ValueSetLookup,
    VaccinationState,
};
use certview_wire::{PersonSnapshot, ValueSets};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError, RwLock};

/// Read and remove access to the certificates of certified persons.
pub trait CertificateStore {
    /// Certificates of `person` in store order (oldest first). Empty for unknown persons.
    fn current_certificates(&self, person: &PersonId) -> Vec<HealthCertificate>;

    /// Aggregate state of `person`, `None` for unknown persons.
    fn current_vaccination_state(&self, person: &PersonId) -> Option<VaccinationState>;

    /// Remove `certificate` wherever it is stored. Unknown certificates are ignored.
    fn remove_certificate(&self, certificate: &HealthCertificate);
}

/// Source of the latest value sets. May return `None` before any value sets are known.
pub trait ValueSetProvider {
    fn latest_value_sets(&self) -> Option<ValueSetLookup>;
}

/// Value sets fixed at construction, for example loaded from a file at startup.
#[derive(Clone, Debug, Default)]
pub struct StaticValueSets(Option<ValueSetLookup>);

impl StaticValueSets {
    pub fn new(value_sets: Option<ValueSetLookup>) -> Self {
        Self(value_sets)
    }

    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let lookup = ValueSets::read(path)?;
        tracing::info!("loaded value sets from {}", path.display());
        Ok(Self(Some(lookup)))
    }
}

impl ValueSetProvider for StaticValueSets {
    fn latest_value_sets(&self) -> Option<ValueSetLookup> {
        self.0.clone()
    }
}

/// Change notification published by [`InMemoryCertificateStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    PersonChanged(PersonId),
}

/// Thread-safe in-memory store keyed by [`PersonId`].
#[derive(Debug, Default)]
pub struct InMemoryCertificateStore {
    people: RwLock<BTreeMap<PersonId, HealthCertifiedPerson>>,
    subscribers: Mutex<Vec<Sender<StoreEvent>>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yaml` person snapshot in `dir`.
    ///
    /// Files that fail to parse are logged and skipped, so one broken file does not hide the
    /// remaining people.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataDirRead`] if the directory itself cannot be listed.
    pub fn load_dir(dir: &Path) -> CoreResult<Self> {
        let store = Self::new();

        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(CoreError::DataDirRead)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(SNAPSHOT_EXTENSION))
            })
            .collect();
        paths.sort();

        for path in paths {
            match PersonSnapshot::read(&path) {
                Ok(snapshot) => store.insert(snapshot.person_id, snapshot.person),
                Err(e) => tracing::warn!("failed to load snapshot {}: {}", path.display(), e),
            }
        }

        Ok(store)
    }

    /// Insert or replace a person and notify subscribers.
    pub fn insert(&self, id: PersonId, person: HealthCertifiedPerson) {
        tracing::info!(
            person = %id,
            certificates = person.certificates.len(),
            "storing person"
        );
        self.people
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), person);
        self.publish(StoreEvent::PersonChanged(id));
    }

    pub fn person(&self, id: &PersonId) -> Option<HealthCertifiedPerson> {
        self.people
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn person_ids(&self) -> Vec<PersonId> {
        self.people
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn people(&self) -> Vec<(PersonId, HealthCertifiedPerson)> {
        self.people
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, person)| (id.clone(), person.clone()))
            .collect()
    }

    /// Register for change notifications. Dropped receivers are pruned on the next publish.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Remove the certificate with `id` from whichever person holds it.
    ///
    /// Returns the removed certificate and its owner, or `None` if no person holds it.
    pub fn remove_certificate_by_id(
        &self,
        id: &CertificateId,
    ) -> Option<(PersonId, HealthCertificate)> {
        let removed = {
            let mut people = self.people.write().unwrap_or_else(PoisonError::into_inner);
            people.iter_mut().find_map(|(person_id, person)| {
                let index = person.certificates.iter().position(|c| &c.id == id)?;
                Some((person_id.clone(), person.certificates.remove(index)))
            })
        };

        match &removed {
            Some((person_id, certificate)) => {
                tracing::info!(person = %person_id, certificate = %certificate.id, "removed certificate");
                self.publish(StoreEvent::PersonChanged(person_id.clone()));
            }
            None => tracing::debug!(certificate = %id, "certificate to remove not found"),
        }

        removed
    }

    fn publish(&self, event: StoreEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn current_certificates(&self, person: &PersonId) -> Vec<HealthCertificate> {
        self.person(person)
            .map(|p| p.certificates)
            .unwrap_or_default()
    }

    fn current_vaccination_state(&self, person: &PersonId) -> Option<VaccinationState> {
        self.person(person).map(|p| p.vaccination_state)
    }

    fn remove_certificate(&self, certificate: &HealthCertificate) {
        self.remove_certificate_by_id(&certificate.id);
    }
}
