use super::{Contact, ContactDirectory};

/// In-memory directory loaded from config.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    contacts: Vec<Contact>,
}

impl StaticDirectory {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

impl ContactDirectory for StaticDirectory {
    fn lookup(&self, candidate: &str) -> Option<Contact> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }
        // The candidate must contain the whole name. First match wins.
        self.contacts
            .iter()
            .find(|c| {
                let name = c.name.trim().to_lowercase();
                !name.is_empty() && candidate.contains(&name)
            })
            .cloned()
    }
}
