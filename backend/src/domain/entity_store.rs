//! Entity store: the caregiver session, child profiles, and the
//! educator connection set, with the derived active-child selection.

use log::{debug, info};
use shared::{ChildProfile, User, UserRole};

/// Holds users, child profiles, and the connection set, and enforces
/// their referential invariants. All access control happens in the
/// engine facade; the store itself is role-agnostic.
#[derive(Debug, Default)]
pub struct EntityStore {
    current_user: Option<User>,
    /// Profiles in creation order.
    children: Vec<ChildProfile>,
    /// Child ids the session's educator identity is connected to, in
    /// redemption order. Every id resolves to a live profile.
    connections: Vec<String>,
    /// Sticky active-child selection; `None` until the selection rule
    /// or an explicit switch assigns one.
    active_child: Option<String>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted state. Connection ids that no longer
    /// resolve to a profile are pruned here: readers must see a
    /// dangling reference as "child unavailable", never crash on it.
    pub fn restore(
        current_user: Option<User>,
        children: Vec<ChildProfile>,
        connections: Vec<String>,
    ) -> Self {
        let mut store = EntityStore {
            current_user,
            children,
            connections: Vec::new(),
            active_child: None,
        };
        for id in connections {
            if store.child(&id).is_some() {
                store.connections.push(id);
            } else {
                log::warn!("Dropping connection to unknown child {}", id);
            }
        }
        store
    }

    // ---- caregiver session ----

    pub fn login(&mut self, user: User) {
        info!("Caregiver {} signed in as {}", user.name, user.role);
        self.current_user = Some(user);
    }

    /// Tear down the session: the user record is destroyed (no retained
    /// history) and the active selection is forgotten with it.
    pub fn logout(&mut self) {
        if let Some(user) = self.current_user.take() {
            info!("Caregiver {} signed out", user.name);
        }
        self.active_child = None;
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    // ---- child profiles ----

    pub fn children(&self) -> &[ChildProfile] {
        &self.children
    }

    pub fn child(&self, id: &str) -> Option<&ChildProfile> {
        self.children.iter().find(|child| child.id == id)
    }

    /// Look up a profile by its (already normalized) invite code.
    pub fn child_by_invite_code(&self, normalized_code: &str) -> Option<&ChildProfile> {
        self.children
            .iter()
            .find(|child| child.invite_code == normalized_code)
    }

    /// Whether any live profile carries this invite code.
    pub fn invite_code_in_use(&self, code: &str) -> bool {
        self.child_by_invite_code(code).is_some()
    }

    /// Insert the profile if its id is unseen, else replace the whole
    /// record. Never merges fields.
    pub fn upsert_child(&mut self, profile: ChildProfile) {
        match self.children.iter_mut().find(|c| c.id == profile.id) {
            Some(existing) => {
                debug!("Replacing profile for child {}", profile.id);
                *existing = profile;
            }
            None => {
                debug!("Inserting profile for child {}", profile.id);
                self.children.push(profile);
            }
        }
    }

    /// Remove a child together with its connection-set entry and, if it
    /// was selected, the active selection. The caller is responsible
    /// for purging the child's log entries in the same logical step.
    pub fn remove_child(&mut self, id: &str) -> Option<ChildProfile> {
        let position = self.children.iter().position(|child| child.id == id)?;
        let removed = self.children.remove(position);

        self.connections.retain(|connected| connected != id);
        if self.active_child.as_deref() == Some(id) {
            self.active_child = None;
        }
        Some(removed)
    }

    // ---- educator connections ----

    pub fn connections(&self) -> &[String] {
        &self.connections
    }

    /// Idempotently add a child to the connection set. Returns whether
    /// the id was newly added.
    pub fn connect(&mut self, child_id: &str) -> bool {
        if self.connections.iter().any(|id| id == child_id) {
            return false;
        }
        self.connections.push(child_id.to_string());
        true
    }

    /// Replace the connection set wholesale. Ids are assumed validated
    /// by the caller.
    pub fn set_connections(&mut self, ids: Vec<String>) {
        self.connections = ids;
    }

    pub fn is_connected(&self, child_id: &str) -> bool {
        self.connections.iter().any(|id| id == child_id)
    }

    // ---- active-child selection ----

    pub fn active_child_id(&self) -> Option<&str> {
        self.active_child.as_deref()
    }

    pub fn active_child(&self) -> Option<&ChildProfile> {
        self.active_child
            .as_deref()
            .and_then(|id| self.child(id))
    }

    pub fn set_active_child(&mut self, id: Option<String>) {
        self.active_child = id;
    }

    /// The deterministic selection rule: whenever no child is selected,
    /// pick the first child in creation order for a parent, or the
    /// first connected id for an educator. An existing selection is
    /// left untouched; selection is sticky, not recomputed.
    pub fn ensure_active_selection(&mut self) {
        if self.active_child.is_some() {
            return;
        }
        let role = match &self.current_user {
            Some(user) => user.role,
            None => return,
        };

        let candidate = match role {
            UserRole::Parent => self.children.first().map(|child| child.id.clone()),
            UserRole::Educator => self.connections.first().cloned(),
        };
        if let Some(id) = candidate {
            debug!("Auto-selecting active child {}", id);
            self.active_child = Some(id);
        }
    }

    /// Children visible to the current caregiver: all of them for a
    /// parent, only connected ones for an educator.
    pub fn visible_children(&self) -> Vec<&ChildProfile> {
        match self.current_user.as_ref().map(|user| user.role) {
            Some(UserRole::Parent) => self.children.iter().collect(),
            Some(UserRole::Educator) => self
                .children
                .iter()
                .filter(|child| self.is_connected(&child.id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_visible(&self, child_id: &str) -> bool {
        self.visible_children()
            .iter()
            .any(|child| child.id == child_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> User {
        User {
            id: "user::1".to_string(),
            name: "Sarah".to_string(),
            email: "sarah@example.com".to_string(),
            role: UserRole::Parent,
        }
    }

    fn educator() -> User {
        User {
            id: "user::2".to_string(),
            name: "Mr. Alvarez".to_string(),
            email: "alvarez@school.example".to_string(),
            role: UserRole::Educator,
        }
    }

    fn profile(id: &str, name: &str, code: &str) -> ChildProfile {
        ChildProfile {
            id: id.to_string(),
            name: name.to_string(),
            age: 6,
            care_notes: String::new(),
            invite_code: code.to_string(),
            parent_name: "Sarah".to_string(),
            emergency_contact: String::new(),
        }
    }

    #[test]
    fn upsert_inserts_then_replaces_fully() {
        let mut store = EntityStore::new();
        store.upsert_child(profile("child::a", "Leo", "LEO-2024"));

        let mut updated = profile("child::a", "Leo", "LEO-2024");
        updated.age = 7;
        updated.care_notes = "Now loves dinosaurs".to_string();
        store.upsert_child(updated.clone());

        assert_eq!(store.children().len(), 1);
        assert_eq!(store.child("child::a"), Some(&updated));
    }

    #[test]
    fn parent_selection_rule_picks_first_child_in_creation_order() {
        let mut store = EntityStore::new();
        store.login(parent());
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.upsert_child(profile("child::b", "Mia", "MIA-1000"));

        store.ensure_active_selection();
        assert_eq!(store.active_child_id(), Some("child::a"));
    }

    #[test]
    fn educator_selection_rule_picks_first_connection() {
        let mut store = EntityStore::new();
        store.login(educator());
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.upsert_child(profile("child::b", "Mia", "MIA-1000"));
        store.connect("child::b");

        store.ensure_active_selection();
        assert_eq!(store.active_child_id(), Some("child::b"));
    }

    #[test]
    fn selection_is_sticky_once_assigned() {
        let mut store = EntityStore::new();
        store.login(parent());
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.ensure_active_selection();

        store.upsert_child(profile("child::b", "Mia", "MIA-1000"));
        store.ensure_active_selection();
        assert_eq!(store.active_child_id(), Some("child::a"));
    }

    #[test]
    fn remove_child_clears_connection_and_selection() {
        let mut store = EntityStore::new();
        store.login(parent());
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.connect("child::a");
        store.set_active_child(Some("child::a".to_string()));

        let removed = store.remove_child("child::a").unwrap();
        assert_eq!(removed.name, "Leo");
        assert!(store.connections().is_empty());
        assert_eq!(store.active_child_id(), None);
    }

    #[test]
    fn connect_is_idempotent() {
        let mut store = EntityStore::new();
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));

        assert!(store.connect("child::a"));
        assert!(!store.connect("child::a"));
        assert_eq!(store.connections(), ["child::a".to_string()]);
    }

    #[test]
    fn restore_prunes_dangling_connections() {
        let store = EntityStore::restore(
            None,
            vec![profile("child::a", "Leo", "LEO-1000")],
            vec!["child::a".to_string(), "child::gone".to_string()],
        );

        assert_eq!(store.connections(), ["child::a".to_string()]);
    }

    #[test]
    fn visible_children_depend_on_role() {
        let mut store = EntityStore::new();
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.upsert_child(profile("child::b", "Mia", "MIA-1000"));
        store.connect("child::b");

        store.login(parent());
        assert_eq!(store.visible_children().len(), 2);

        store.login(educator());
        let visible = store.visible_children();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "child::b");

        store.logout();
        assert!(store.visible_children().is_empty());
    }

    #[test]
    fn logout_destroys_user_and_selection() {
        let mut store = EntityStore::new();
        store.login(parent());
        store.upsert_child(profile("child::a", "Leo", "LEO-1000"));
        store.ensure_active_selection();

        store.logout();
        assert!(store.current_user().is_none());
        assert_eq!(store.active_child_id(), None);
    }
}
