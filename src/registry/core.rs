use std::collections::BTreeSet;
use std::sync::Arc;

use blake3::Hash;

use crate::error::{BridgeError, Result};
use crate::zone::{Zone, ZoneMap};

/// Content projected into a zone by a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub key: String,
    pub body: String,
    fingerprint: Hash,
}

impl ContentNode {
    pub fn new(key: impl Into<String>, body: impl Into<String>) -> Self {
        let key = key.into();
        let body = body.into();
        let mut hasher = blake3::Hasher::new();
        hasher.update(key.as_bytes());
        hasher.update(&[0]);
        hasher.update(body.as_bytes());
        Self {
            key,
            body,
            fingerprint: hasher.finalize(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new("text", body)
    }

    pub fn fingerprint(&self) -> Hash {
        self.fingerprint
    }

    pub fn into_ref(self) -> ContentRef {
        Arc::new(self)
    }
}

/// Shared handle to injected content. Identity is the `Arc`, equality the fingerprint.
pub type ContentRef = Arc<ContentNode>;

/// Notification delivered to subscribers after every write.
#[derive(Debug, Clone)]
pub struct ZoneChange {
    pub zone: Zone,
    pub content: Option<ContentRef>,
    pub fingerprint: Option<Hash>,
    /// False when the new content hashes the same as the previous content.
    pub changed: bool,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&ZoneChange) + Send>;

#[derive(Debug, Clone, Default)]
struct ZoneSlot {
    content: Option<ContentRef>,
    hash: Option<Hash>,
}

impl ZoneSlot {
    fn replace(&mut self, content: Option<ContentRef>) -> bool {
        let new_hash = content.as_ref().map(|node| node.fingerprint());
        let changed = self.hash != new_hash;
        self.content = content;
        self.hash = new_hash;
        changed
    }
}

#[derive(Default)]
pub struct ZoneRegistry {
    active: bool,
    slots: ZoneMap<ZoneSlot>,
    dirty: BTreeSet<Zone>,
    sequence: u64,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.active = true;
    }

    /// Drop all content and subscribers. The registry must be `init`ed again before use.
    pub fn teardown(&mut self) {
        self.active = false;
        self.slots = ZoneMap::default();
        self.dirty.clear();
        self.subscribers.clear();
        self.sequence = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Replace the zone's content unconditionally and notify subscribers.
    pub fn inject(&mut self, zone: Zone, content: ContentRef) -> Result<ZoneChange> {
        self.write(zone, Some(content))
    }

    pub fn inject_named(&mut self, zone: &str, content: ContentRef) -> Result<ZoneChange> {
        let zone = zone.parse::<Zone>()?;
        self.inject(zone, content)
    }

    pub fn clear(&mut self, zone: Zone) -> Result<ZoneChange> {
        self.write(zone, None)
    }

    pub fn content(&self, zone: Zone) -> Option<ContentRef> {
        self.slots.get(zone).content.clone()
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&ZoneChange) + Send + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        before != self.subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Zones written since the last call, in layout order.
    pub fn take_dirty(&mut self) -> Vec<Zone> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn mark_dirty(&mut self, zone: Zone) {
        self.dirty.insert(zone);
    }

    fn write(&mut self, zone: Zone, content: Option<ContentRef>) -> Result<ZoneChange> {
        if !self.active {
            return Err(BridgeError::RegistryInactive);
        }
        let changed = self.slots.get_mut(zone).replace(content.clone());
        self.sequence += 1;
        self.dirty.insert(zone);

        let change = ZoneChange {
            zone,
            fingerprint: content.as_ref().map(|node| node.fingerprint()),
            content,
            changed,
            sequence: self.sequence,
        };
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&change);
        }
        Ok(change)
    }
}
