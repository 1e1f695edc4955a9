//! Per-selection clipboard store (spec.md §9 Open Question 3, resolved in
//! `SPEC_FULL.md` §9 and `DESIGN.md`): a single-owner model keyed by
//! selection, with the daemon forwarding stored bytes directly to a
//! requester rather than round-tripping through the original owner.

use std::collections::HashMap;

use semadraw_ipc::messages::ClipboardSelection;
use semadraw_session::ClientId;

#[derive(Debug, Default)]
pub struct ClipboardStore {
    entries: HashMap<u32, (ClientId, Vec<u8>)>,
}

impl ClipboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `selection`, replacing any previous owner. An
    /// empty `data` clears the selection instead.
    pub fn set(&mut self, selection: ClipboardSelection, owner: ClientId, data: Vec<u8>) {
        let key = selection as u32;
        if data.is_empty() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, (owner, data));
        }
    }

    pub fn get(&self, selection: ClipboardSelection) -> Option<&[u8]> {
        self.entries.get(&(selection as u32)).map(|(_, data)| data.as_slice())
    }

    /// Drops anything owned by `client`, called when a session disconnects.
    pub fn remove_owner(&mut self, client: ClientId) {
        self.entries.retain(|_, (owner, _)| *owner != client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut store = ClipboardStore::new();
        store.set(ClipboardSelection::Primary, ClientId(1), b"hello".to_vec());
        assert_eq!(store.get(ClipboardSelection::Primary), Some(b"hello".as_slice()));
    }

    #[test]
    fn empty_set_clears_selection() {
        let mut store = ClipboardStore::new();
        store.set(ClipboardSelection::Primary, ClientId(1), b"hello".to_vec());
        store.set(ClipboardSelection::Primary, ClientId(1), Vec::new());
        assert_eq!(store.get(ClipboardSelection::Primary), None);
    }

    #[test]
    fn overwrite_changes_owner() {
        let mut store = ClipboardStore::new();
        store.set(ClipboardSelection::Clipboard, ClientId(1), b"one".to_vec());
        store.set(ClipboardSelection::Clipboard, ClientId(2), b"two".to_vec());
        assert_eq!(store.get(ClipboardSelection::Clipboard), Some(b"two".as_slice()));
    }
}
