//! # Observer Registry
//!
//! Fans broadcast events out to registered listeners.
//!
//! ## Dispatch Pass
//!
//! Every `notify` runs the same pass:
//!
//! 1. Under the lock: evict stale entries and entries whose listener was
//!    dropped, then snapshot the live listeners whose filter matches.
//! 2. Outside the lock: deliver to the snapshot in priority order. A listener
//!    that returns an error or panics is marked faulted; delivery continues.
//! 3. Under the lock: refresh `last_seen` for delivered entries and evict
//!    faulted ones.
//!
//! Registrations and removals made during step 2 take effect from the next
//! pass; the snapshot keeps the current pass consistent.

use crate::config::RegistryConfig;
use crate::events::{ActionFilter, BroadcastEvent};
use crate::subscriber::{
    listener_address, BroadcastListener, ObserverEntry, ObserverHandle, ObserverInfo,
};
use billing_telemetry::metrics::{OBSERVER_EVICTIONS, OBSERVER_NOTIFICATIONS};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyReport {
    pub delivered: usize,
    pub evicted_stale: usize,
    pub evicted_dropped: usize,
    pub evicted_faulted: usize,
}

/// Thread-safe registry of broadcast listeners.
pub struct ObserverRegistry {
    /// Entries sorted by descending priority, insertion order among equals.
    entries: Mutex<Vec<ObserverEntry>>,

    config: RegistryConfig,

    next_handle: AtomicU64,

    /// Total dispatch passes.
    notifications: AtomicU64,
}

impl ObserverRegistry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            config,
            next_handle: AtomicU64::new(1),
            notifications: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register `listener`. See [`Self::add_dyn_observer`].
    pub fn add_observer<L>(&self, listener: &Arc<L>, filter: ActionFilter, priority: i32) -> ObserverHandle
    where
        L: BroadcastListener + 'static,
    {
        let as_dyn: Arc<dyn BroadcastListener> = listener.clone();
        self.add_dyn_observer(&as_dyn, filter, priority)
    }

    /// Register a listener behind a trait object.
    ///
    /// Idempotent per listener: registering the same listener again keeps its
    /// handle, refreshes `last_seen` and adopts the new filter and priority.
    /// The registry only keeps a weak reference.
    pub fn add_dyn_observer(
        &self,
        listener: &Arc<dyn BroadcastListener>,
        filter: ActionFilter,
        priority: i32,
    ) -> ObserverHandle {
        let address = listener_address(listener);
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(pos) = entries.iter().position(|e| e.address == address) {
            if entries[pos].is_alive() {
                let entry = &mut entries[pos];
                entry.filter = filter;
                entry.priority = priority;
                entry.last_seen = now;
                let handle = entry.handle;
                entries.sort_by(|a, b| b.priority.cmp(&a.priority));
                debug!(handle = handle.id(), priority, "Observer re-registered");
                return handle;
            }
            // Address reused by a new allocation after the old listener died.
            entries.remove(pos);
            OBSERVER_EVICTIONS.with_label_values(&["dropped"]).inc();
        }

        let handle = ObserverHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        entries.push(ObserverEntry {
            handle,
            listener: Arc::downgrade(listener),
            address,
            filter,
            priority,
            last_seen: now,
        });
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        debug!(handle = handle.id(), priority, observers = entries.len(), "Observer registered");
        handle
    }

    /// Remove a registration by handle. Returns whether it was present.
    pub fn remove_observer(&self, handle: ObserverHandle) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.handle != handle);
        before != entries.len()
    }

    /// Remove the registration of `listener`. Returns whether it was present.
    pub fn remove_listener<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
        let address = listener_address(listener);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.address != address);
        before != entries.len()
    }

    /// Refresh `last_seen` without delivering anything.
    pub fn touch(&self, handle: ObserverHandle) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|e| e.handle == handle) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Dispatch `event` to every matching listener.
    pub fn notify(&self, event: &BroadcastEvent) -> NotifyReport {
        self.notify_at(event, Instant::now())
    }

    /// Dispatch `event` using `now` as the clock reading for staleness.
    pub fn notify_at(&self, event: &BroadcastEvent, now: Instant) -> NotifyReport {
        let mut report = NotifyReport::default();
        self.notifications.fetch_add(1, Ordering::Relaxed);
        OBSERVER_NOTIFICATIONS.inc();

        let targets: Vec<(ObserverHandle, Arc<dyn BroadcastListener>)> = {
            let mut entries = self.entries.lock();
            let timeout = self.config.observer_timeout();
            entries.retain(|entry| {
                if entry.is_stale(now, timeout) {
                    debug!(handle = entry.handle.id(), "Evicting stale observer");
                    report.evicted_stale += 1;
                    false
                } else if !entry.is_alive() {
                    report.evicted_dropped += 1;
                    false
                } else {
                    true
                }
            });
            let matching: Vec<_> = entries
                .iter()
                .filter(|e| e.filter.matches(event))
                .filter_map(|e| e.listener.upgrade().map(|l| (e.handle, l)))
                .collect();
            matching
        };

        let mut delivered = Vec::with_capacity(targets.len());
        let mut faulted = Vec::new();
        for (handle, listener) in targets {
            match catch_unwind(AssertUnwindSafe(|| listener.on_broadcast(event))) {
                Ok(Ok(())) => delivered.push(handle),
                Ok(Err(error)) => {
                    warn!(
                        handle = handle.id(),
                        action = event.action(),
                        error = %error,
                        "Observer failed, evicting"
                    );
                    faulted.push(handle);
                }
                Err(_) => {
                    warn!(
                        handle = handle.id(),
                        action = event.action(),
                        "Observer panicked, evicting"
                    );
                    faulted.push(handle);
                }
            }
        }

        if !delivered.is_empty() || !faulted.is_empty() {
            let mut entries = self.entries.lock();
            for entry in entries.iter_mut() {
                if delivered.contains(&entry.handle) {
                    entry.last_seen = now;
                }
            }
            let before = entries.len();
            entries.retain(|e| !faulted.contains(&e.handle));
            report.evicted_faulted = before - entries.len();
        }
        report.delivered = delivered.len();

        record_evictions(&report);
        debug!(
            action = event.action(),
            delivered = report.delivered,
            stale = report.evicted_stale,
            faulted = report.evicted_faulted,
            "Broadcast dispatched"
        );
        report
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, handle: ObserverHandle) -> bool {
        self.entries.lock().iter().any(|e| e.handle == handle)
    }

    /// Snapshot of the registrations in dispatch order.
    pub fn observers(&self) -> Vec<ObserverInfo> {
        self.entries.lock().iter().map(ObserverEntry::info).collect()
    }

    /// Total dispatch passes run.
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

fn record_evictions(report: &NotifyReport) {
    for (cause, count) in [
        ("stale", report.evicted_stale),
        ("dropped", report.evicted_dropped),
        ("faulted", report.evicted_faulted),
    ] {
        if count > 0 {
            OBSERVER_EVICTIONS
                .with_label_values(&[cause])
                .inc_by(count as f64);
        }
    }
}
