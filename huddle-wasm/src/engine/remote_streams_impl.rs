use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use web_sys::MediaStream;

/// Remote streams by stream id. Each entry belongs to the connection that
/// received it and is dropped when that connection closes.
pub struct StreamMap<S> {
    next_owner: Cell<u64>,
    streams: RefCell<HashMap<String, (u64, S)>>,
}

/// Remote `MediaStream` objects for the page to attach to `<video>` elements.
pub type RemoteStreams = Rc<StreamMap<MediaStream>>;

impl<S: Clone> StreamMap<S> {
    pub fn new() -> Self {
        Self {
            next_owner: Cell::new(0),
            streams: RefCell::new(HashMap::new()),
        }
    }

    /// Key for one connection's entries.
    pub fn register_owner(&self) -> u64 {
        let owner = self.next_owner.get();
        self.next_owner.set(owner + 1);
        owner
    }

    /// A stream id seen again on a newer connection moves to that owner.
    pub fn insert(&self, owner: u64, id: String, stream: S) {
        self.streams.borrow_mut().insert(id, (owner, stream));
    }

    pub fn get(&self, id: &str) -> Option<S> {
        self.streams.borrow().get(id).map(|(_, stream)| stream.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.streams.borrow().contains_key(id)
    }

    pub fn release(&self, owner: u64) {
        self.streams.borrow_mut().retain(|_, (o, _)| *o != owner);
    }

    pub fn clear(&self) {
        self.streams.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.streams.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone> Default for StreamMap<S> {
    fn default() -> Self {
        Self::new()
    }
}
