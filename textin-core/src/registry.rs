//! Process-wide contact registry and inbound dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use textin_types::{ContactId, InboundMessage};

use crate::broadcast::BroadcastHub;
use crate::clock::Clock;
use crate::contact::{Contact, ContactSummary, Outcome};
use crate::error::CoreError;
use crate::transport::Outbound;

pub const FAREWELL: &str = "Goodbye, and stay safe.";

/// Owns every contact. Entries are created on first contact and destroyed on
/// `@quit`; nothing else adds or removes them.
///
/// The map lock is only held for lookups and structural changes, never while
/// a contact handles a message or a broadcast is delivered.
pub struct Registry {
    contacts: RwLock<HashMap<ContactId, Arc<Contact>>>,
    hub: Arc<BroadcastHub>,
    outbound: Arc<dyn Outbound>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    pub fn new(outbound: Arc<dyn Outbound>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new_cyclic(|registry| Self {
            contacts: RwLock::new(HashMap::new()),
            hub: Arc::new(BroadcastHub::new(registry.clone(), outbound.clone())),
            outbound,
            clock,
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn get(&self, id: &ContactId) -> Option<Arc<Contact>> {
        self.contacts.read().get(id).cloned()
    }

    /// Return the contact for `id`, registering a fresh one if needed.
    pub fn get_or_create(&self, id: &ContactId) -> Arc<Contact> {
        if let Some(contact) = self.get(id) {
            return contact;
        }

        let mut guard = self.contacts.write();
        guard
            .entry(id.clone())
            .or_insert_with(|| {
                info!(contact = %id, "new contact registered");
                Contact::new(
                    id.clone(),
                    self.outbound.clone(),
                    self.hub.clone(),
                    self.clock.clone(),
                )
            })
            .clone()
    }

    /// Remove `id` and cancel its escalation task. Returns false if absent.
    pub fn remove(&self, id: &ContactId) -> bool {
        let removed = self.contacts.write().remove(id);
        match removed {
            Some(contact) => {
                contact.retire();
                info!(contact = %id, "contact removed");
                true
            }
            None => false,
        }
    }

    /// Remove this exact contact, leaving any newer registration for the same
    /// id in place.
    fn remove_contact(&self, contact: &Arc<Contact>) {
        contact.retire();
        let mut guard = self.contacts.write();
        if guard
            .get(contact.id())
            .is_some_and(|current| Arc::ptr_eq(current, contact))
        {
            guard.remove(contact.id());
            info!(contact = %contact.id(), "contact removed");
        }
    }

    /// Snapshot of registered ids.
    pub fn contact_ids(&self) -> Vec<ContactId> {
        self.contacts.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.read().is_empty()
    }

    /// Summaries of every contact, ordered by id.
    pub fn snapshot(&self) -> Vec<ContactSummary> {
        let contacts: Vec<Arc<Contact>> = self.contacts.read().values().cloned().collect();
        let mut summaries: Vec<ContactSummary> = contacts.iter().map(|c| c.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Route one inbound message and return the reply for the sender, if any.
    pub async fn dispatch(&self, message: &InboundMessage) -> Option<String> {
        loop {
            let contact = self.get_or_create(&message.sender);
            match contact
                .handle_input(&message.body, message.received_at)
                .await
            {
                Ok(Outcome::Quit) => {
                    self.remove_contact(&contact);
                    return Some(FAREWELL.to_string());
                }
                Ok(outcome) => return outcome.reply_text(),
                // Queued behind a quit: start over as a new contact.
                Err(CoreError::Retired(_)) => self.remove_contact(&contact),
            }
        }
    }

    /// Cancel every escalation task and empty the registry.
    pub fn shutdown(&self) {
        let drained: Vec<Arc<Contact>> = self.contacts.write().drain().map(|(_, c)| c).collect();
        for contact in &drained {
            contact.retire();
        }
        info!(contacts = drained.len(), "registry shut down");
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        for contact in self.contacts.get_mut().values() {
            contact.retire();
        }
    }
}
