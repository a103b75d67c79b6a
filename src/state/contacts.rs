use std::borrow::Cow;
use std::collections::HashMap;

use log::{error, info};

use crate::api::models::Contact;
use crate::api::{ApiClient, ApiError};
use crate::state::Notice;
use crate::utils::truncate;

/// Characters of a collapsed message shown in the table.
pub const MESSAGE_PREVIEW_LIMIT: usize = 50;

/// True when `term` appears in the contact's name or email, ignoring case.
pub fn matches(contact: &Contact, term: &str) -> bool {
    let term = term.to_lowercase();
    contact.name.to_lowercase().contains(&term) || contact.email.to_lowercase().contains(&term)
}

#[derive(Debug, Default)]
pub struct ContactsState {
    contacts: Vec<Contact>,
    search: String,
    expanded: HashMap<String, bool>,
}

impl ContactsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
    }

    /// Contacts matching the current search, in server order.
    pub fn visible(&self) -> Vec<&Contact> {
        self.search(&self.search)
    }

    pub fn search(&self, term: &str) -> Vec<&Contact> {
        self.contacts.iter().filter(|c| matches(c, term)).collect()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    /// Flip the message expansion for `id` and return the new state.
    pub fn toggle_expand(&mut self, id: &str) -> bool {
        let flag = self.expanded.entry(id.to_string()).or_insert(false);
        *flag = !*flag;
        *flag
    }

    pub fn message_for<'a>(&self, contact: &'a Contact) -> Cow<'a, str> {
        if self.is_expanded(&contact.id) {
            Cow::Borrowed(contact.message.as_str())
        } else {
            truncate(&contact.message, MESSAGE_PREVIEW_LIMIT)
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Contact> {
        let pos = self.contacts.iter().position(|c| c.id == id)?;
        self.expanded.remove(id);
        Some(self.contacts.remove(pos))
    }

    /// Replace the collection on success; on failure keep what is shown.
    pub fn apply_load(&mut self, result: Result<Vec<Contact>, ApiError>) -> Option<Notice> {
        match result {
            Ok(contacts) => {
                info!("Loaded {} contacts", contacts.len());
                self.set_contacts(contacts);
                None
            }
            Err(e) => {
                error!("Error fetching contacts: {e}");
                Some(Notice::error(format!("Failed to load contacts: {e}")))
            }
        }
    }

    pub fn apply_delete(&mut self, id: &str, result: Result<(), ApiError>) -> Notice {
        match result {
            Ok(()) => {
                let removed = self.remove(id);
                info!("Deleted contact {id}");
                match removed {
                    Some(c) if !c.name.is_empty() => Notice::success(format!("Contact {} deleted", c.name)),
                    _ => Notice::success("Contact deleted"),
                }
            }
            Err(e) => {
                error!("Error deleting contact {id}: {e}");
                Notice::error(format!("Failed to delete contact: {e}"))
            }
        }
    }

    pub async fn load(&mut self, api: &ApiClient) -> Option<Notice> {
        let result = api.contacts().await;
        self.apply_load(result)
    }

    pub async fn delete(&mut self, api: &ApiClient, id: &str) -> Notice {
        let result = api.delete_contact(id).await;
        self.apply_delete(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str, email: &str, message: &str) -> Contact {
        Contact {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            message: message.into(),
            ..Contact::default()
        }
    }

    fn sample() -> ContactsState {
        let mut state = ContactsState::new();
        state.set_contacts(vec![
            contact("1", "Ann Lee", "ann@x.com", "Hello"),
            contact("2", "Bob Stone", "bob@y.org", &"m".repeat(80)),
            contact("3", "Cara", "CARA@ann.io", ""),
        ]);
        state
    }

    fn ids(list: Vec<&Contact>) -> Vec<&str> {
        list.into_iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let state = sample();
        assert_eq!(ids(state.search("ann")), vec!["1", "3"]);
        assert_eq!(ids(state.search("BOB")), vec!["2"]);
        assert!(state.search("zed").is_empty());
    }

    #[test]
    fn empty_search_returns_everything() {
        let state = sample();
        assert_eq!(ids(state.search("")), vec!["1", "2", "3"]);
        assert_eq!(state.visible().len(), 3);
    }

    #[test]
    fn ann_lee_scenario() {
        let mut state = sample();
        state.set_search("ann");
        assert!(ids(state.visible()).contains(&"1"));
        state.set_search("bob");
        assert!(!ids(state.visible()).contains(&"1"));
    }

    #[test]
    fn collapsed_messages_are_truncated() {
        let mut state = sample();
        let bob = state.contacts()[1].clone();
        assert_eq!(state.message_for(&bob), format!("{}...", "m".repeat(50)));

        assert!(state.toggle_expand("2"));
        assert_eq!(state.message_for(&bob), bob.message);

        assert!(!state.toggle_expand("2"));
        assert!(!state.is_expanded("2"));
    }

    #[test]
    fn expansion_defaults_to_collapsed() {
        let state = sample();
        assert!(!state.is_expanded("1"));
        assert!(!state.is_expanded("unknown"));
    }

    #[test]
    fn successful_delete_removes_only_that_contact() {
        let mut state = sample();
        let notice = state.apply_delete("2", Ok(()));
        assert!(!notice.is_error());
        assert_eq!(ids(state.visible()), vec!["1", "3"]);
    }

    #[test]
    fn failed_delete_keeps_row_and_reports() {
        let mut state = sample();
        let notice = state.apply_delete("2", Err(ApiError::Status(reqwest::StatusCode::NOT_FOUND)));
        assert!(notice.is_error());
        assert_eq!(state.contacts().len(), 3);
    }

    #[test]
    fn failed_load_keeps_previous_collection() {
        let mut state = sample();
        let notice = state.apply_load(Err(ApiError::Status(reqwest::StatusCode::BAD_GATEWAY)));
        assert!(notice.is_some_and(|n| n.is_error()));
        assert_eq!(state.contacts().len(), 3);
    }
}
