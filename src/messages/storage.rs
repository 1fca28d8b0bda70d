use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    /// Message at a 1-based transcript position
    pub fn nth(&self, position: usize) -> Option<Message> {
        position
            .checked_sub(1)
            .and_then(|index| self.messages.read().get(index).cloned())
    }

    /// Apply `f` to the message with `id`; returns false when it is gone
    pub fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Message),
    {
        match self.messages.write().iter_mut().find(|m| m.id == id) {
            Some(message) => {
                f(message);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;

    #[test]
    fn test_update_by_id() {
        let storage = MessageStorage::new();
        let first = Message::new(Role::User, "first");
        let second = Message::new(Role::Model, "second");
        let second_id = second.id;
        storage.add(first);
        storage.add(second);

        assert!(storage.update(second_id, |m| m.text.push('!')));
        assert_eq!(storage.get(second_id).unwrap().text, "second!");
        assert!(!storage.update(Uuid::new_v4(), |m| m.text.clear()));
    }

    #[test]
    fn test_nth_is_one_based() {
        let storage = MessageStorage::new();
        storage.add(Message::new(Role::User, "a"));
        storage.add(Message::new(Role::Model, "b"));

        assert!(storage.nth(0).is_none());
        assert_eq!(storage.nth(2).unwrap().text, "b");
        assert!(storage.nth(3).is_none());
        assert_eq!(storage.len(), 2);
    }
}
