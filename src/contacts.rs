use crate::api::client::EmergencyApi;
use crate::api::models::EmergencyContact;
use crate::error::ApiError;

/// UI-facing projection of the server's contact list.
///
/// Every operation talks to the server first and mutates the local list only
/// after an `Ok` — there are no optimistic writes, so an error (or a dropped
/// future) always leaves the previous list intact. Taking `&mut self` is the
/// single-flight guard: the borrow checker rules out a second in-flight
/// operation on the same book.
#[derive(Debug, Default)]
pub struct ContactBook {
    contacts: Vec<EmergencyContact>,
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Replace the whole list from the server. On error the prior list stays
    /// as-is; stale data beats a blank screen.
    pub async fn refresh(
        &mut self,
        api: &impl EmergencyApi,
        user_id: &str,
    ) -> Result<(), ApiError> {
        let fresh = api.list_contacts(user_id).await?;
        log::debug!("refreshed {} contacts for user {}", fresh.len(), user_id);
        self.contacts = fresh;
        Ok(())
    }

    /// Create on the server, then append the server's copy — which may differ
    /// from the draft (normalized fields, server-assigned id).
    pub async fn create(
        &mut self,
        api: &impl EmergencyApi,
        draft: EmergencyContact,
    ) -> Result<(), ApiError> {
        let created = api.create_contact(&draft).await?;
        self.contacts.push(created);
        Ok(())
    }

    /// Update on the server, then swap in the server's copy by id.
    pub async fn update(
        &mut self,
        api: &impl EmergencyApi,
        id: &str,
        draft: EmergencyContact,
    ) -> Result<(), ApiError> {
        let updated = api.update_contact(id, &draft).await?;
        if let Some(slot) = self.contacts.iter_mut().find(|c| c.id == id) {
            *slot = updated;
        } else {
            // The server confirmed a contact we never listed; keep it.
            self.contacts.push(updated);
        }
        Ok(())
    }

    /// Delete on the server, then drop the local entry by id.
    pub async fn delete(&mut self, api: &impl EmergencyApi, id: &str) -> Result<(), ApiError> {
        api.delete_contact(id).await?;
        self.contacts.retain(|c| c.id != id);
        Ok(())
    }
}
