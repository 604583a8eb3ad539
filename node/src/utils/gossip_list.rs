//! An ordered, thread-safe list that consumers can follow while it changes.
//!
//! Every consumer holds its own cursor (an `Arc<Element<T>>`) and advances independently, waiting
//! for new elements to be appended once it reaches the back. Removing an element never
//! invalidates a cursor: a removed element remembers its successor at the time of removal, and
//! advancing skips over removed elements.

use std::{
    fmt::{self, Debug, Formatter},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, Weak,
    },
};

use tokio::sync::Notify;

use super::ObservableFuse;

/// Links of an element to its neighbours.
struct Links<T> {
    next: Option<Arc<Element<T>>>,
    prev: Weak<Element<T>>,
    removed: bool,
}

/// A list element.
pub struct Element<T> {
    value: T,
    links: Mutex<Links<T>>,
    /// Notified when `next` is set or the element is removed.
    changed: Notify,
}

/// Outcome of waiting for the successor of an element.
#[derive(Debug)]
pub enum Advance<T> {
    /// The next live element.
    Next(Arc<Element<T>>),
    /// The element was removed and no live element follows it.
    Detached,
    /// The cancellation fuse was triggered.
    Cancelled,
}

impl<T> Element<T> {
    /// Returns the element's value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Returns `true` if the element has been removed from its list.
    pub fn is_removed(&self) -> bool {
        self.links.lock().expect("should lock").removed
    }

    /// Returns the next live element, if any.
    pub fn next(&self) -> Option<Arc<Element<T>>> {
        let mut next = self.links.lock().expect("should lock").next.clone();
        while let Some(element) = next.as_ref() {
            let links = element.links.lock().expect("should lock");
            if !links.removed {
                break;
            }
            let skipped = links.next.clone();
            drop(links);
            next = skipped;
        }
        next
    }

    /// Waits until a live element follows this one, this element is removed, or `cancel` is set.
    ///
    /// Returns immediately if a live successor already exists.
    pub async fn wait_next(&self, cancel: &ObservableFuse) -> Advance<T> {
        loop {
            // Register for notifications before inspecting the links, so a concurrent append or
            // removal cannot slip in between.
            let changed = self.changed.notified();

            if let Some(next) = self.next() {
                return Advance::Next(next);
            }
            if self.is_removed() {
                return Advance::Detached;
            }
            if cancel.is_set() {
                return Advance::Cancelled;
            }

            tokio::select! {
                _ = changed => {}
                _ = cancel.wait() => return Advance::Cancelled,
            }
        }
    }
}

impl<T: Debug> Debug for Element<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("Element")
            .field("value", &self.value)
            .field("removed", &self.is_removed())
            .finish()
    }
}

struct Ends<T> {
    front: Option<Arc<Element<T>>>,
    back: Option<Arc<Element<T>>>,
}

/// A doubly-linked list supporting appends, removal from anywhere and waiting for new elements.
pub struct GossipList<T> {
    ends: Mutex<Ends<T>>,
    len: AtomicUsize,
    /// Notified whenever an element is appended.
    appended: Notify,
}

impl<T> GossipList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        GossipList {
            ends: Mutex::new(Ends {
                front: None,
                back: None,
            }),
            len: AtomicUsize::new(0),
            appended: Notify::new(),
        }
    }

    /// Returns the number of live elements.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    /// Returns `true` if the list has no live elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the oldest live element.
    pub fn front(&self) -> Option<Arc<Element<T>>> {
        self.ends.lock().expect("should lock").front.clone()
    }

    /// Appends a value, returning its element.
    pub fn push_back(&self, value: T) -> Arc<Element<T>> {
        let mut ends = self.ends.lock().expect("should lock");
        let element = Arc::new(Element {
            value,
            links: Mutex::new(Links {
                next: None,
                prev: ends.back.as_ref().map(Arc::downgrade).unwrap_or_default(),
                removed: false,
            }),
            changed: Notify::new(),
        });

        match ends.back.take() {
            Some(back) => {
                back.links.lock().expect("should lock").next = Some(Arc::clone(&element));
                back.changed.notify_waiters();
            }
            None => ends.front = Some(Arc::clone(&element)),
        }
        ends.back = Some(Arc::clone(&element));
        self.len.fetch_add(1, Ordering::SeqCst);
        drop(ends);

        self.appended.notify_waiters();
        element
    }

    /// Removes an element.
    ///
    /// Returns `false` if it had already been removed.
    pub fn remove(&self, element: &Arc<Element<T>>) -> bool {
        let mut ends = self.ends.lock().expect("should lock");
        self.unlink(&mut ends, element)
    }

    /// Removes every live element whose value matches `predicate`, returning how many were
    /// removed.
    pub fn remove_where<F: FnMut(&T) -> bool>(&self, mut predicate: F) -> usize {
        let mut ends = self.ends.lock().expect("should lock");
        let mut matching = Vec::new();
        let mut cursor = ends.front.clone();
        while let Some(element) = cursor {
            if predicate(&element.value) {
                matching.push(Arc::clone(&element));
            }
            cursor = element.links.lock().expect("should lock").next.clone();
        }
        matching
            .iter()
            .filter(|element| self.unlink(&mut ends, element))
            .count()
    }

    /// Returns a snapshot of the live elements, oldest first.
    pub fn elements(&self) -> Vec<Arc<Element<T>>> {
        let ends = self.ends.lock().expect("should lock");
        let mut elements = Vec::with_capacity(self.len());
        let mut cursor = ends.front.clone();
        while let Some(element) = cursor {
            cursor = element.links.lock().expect("should lock").next.clone();
            elements.push(element);
        }
        elements
    }

    /// Waits until the list is non-empty or `cancel` is set, returning the oldest live element.
    ///
    /// Returns `None` only if cancelled.
    pub async fn wait_front(&self, cancel: &ObservableFuse) -> Option<Arc<Element<T>>> {
        loop {
            let appended = self.appended.notified();

            if let Some(front) = self.front() {
                return Some(front);
            }
            if cancel.is_set() {
                return None;
            }

            tokio::select! {
                _ = appended => {}
                _ = cancel.wait() => return None,
            }
        }
    }

    /// Detaches `element` from its neighbours. Must be called with the `ends` lock held.
    fn unlink(&self, ends: &mut Ends<T>, element: &Arc<Element<T>>) -> bool {
        let mut links = element.links.lock().expect("should lock");
        if links.removed {
            return false;
        }
        links.removed = true;
        // The removed element keeps `next` so cursors resting on it can move on.
        let next = links.next.clone();
        let prev = links.prev.upgrade();
        drop(links);

        match &prev {
            Some(prev) => prev.links.lock().expect("should lock").next = next.clone(),
            None => ends.front = next.clone(),
        }
        match &next {
            Some(next) => {
                next.links.lock().expect("should lock").prev =
                    prev.as_ref().map(Arc::downgrade).unwrap_or_default()
            }
            None => ends.back = prev,
        }
        self.len.fetch_sub(1, Ordering::SeqCst);

        element.changed.notify_waiters();
        true
    }
}

impl<T> Default for GossipList<T> {
    fn default() -> Self {
        GossipList::new()
    }
}

impl<T> Debug for GossipList<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("GossipList")
            .field("len", &self.len())
            .finish()
    }
}
