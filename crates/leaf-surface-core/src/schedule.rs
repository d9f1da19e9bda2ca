//! Mount scheduling.
//!
//! One strategy is chosen per page from what the host offers, in priority
//! order: paging signals, then viewport proximity, then eager mounting.
//! Every strategy drives the same mount callback, which is idempotent, so a
//! strategy never has to track what it already mounted.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use crate::error::SurfaceError;

/// Mount callback handed to a schedule. Receives a leaf index.
pub type MountFn = Rc<dyn Fn(usize)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStrategy {
    Paging,
    Proximity,
    Eager,
}

/// What the host page supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// A paging container that emits page signals exists.
    pub paging: bool,
    /// Viewport-proximity observation is available.
    pub proximity: bool,
}

impl MountStrategy {
    pub fn select(host: HostCapabilities) -> Self {
        if host.paging {
            MountStrategy::Paging
        } else if host.proximity {
            MountStrategy::Proximity
        } else {
            MountStrategy::Eager
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MountStrategy::Paging => "paging",
            MountStrategy::Proximity => "proximity",
            MountStrategy::Eager => "eager",
        }
    }
}

impl fmt::Display for MountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Leaves to mount for page `index`: the page and its neighbours, within
/// `0..len`.
pub fn paging_window(index: i64, len: usize) -> Range<usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = index.saturating_sub(1).max(0);
    let end = index.saturating_add(2).min(len);
    if start >= end {
        return 0..0;
    }
    // Both bounds are within 0..=len here.
    start as usize..end as usize
}

/// A mount-timing strategy.
pub trait MountSchedule {
    fn strategy(&self) -> MountStrategy;

    /// Start scheduling. Called once, after the mount controller exists.
    fn on_ready(self: Box<Self>, mount: MountFn);
}

/// Source of page-change signals.
pub trait PageSignal {
    /// Register `handler` for every page change. The handler receives the
    /// signalled index, or `None` when the signal carried no usable index.
    fn subscribe(&self, handler: Box<dyn Fn(Option<i64>)>);
}

/// Source of "anchor came near the viewport" notifications.
pub trait ProximitySource {
    /// Observe every anchor, calling `on_enter` with the anchor's index.
    fn observe(&self, on_enter: Box<dyn Fn(usize)>) -> Result<(), SurfaceError>;
}

fn mount_window(mount: &MountFn, index: i64, len: usize) {
    let window = paging_window(index, len);
    tracing::trace!(index, ?window, "paging window");
    for i in window {
        mount(i);
    }
}

/// Mount the current page and its neighbours on every page signal.
pub struct PagingSchedule<P> {
    signal: P,
    len: usize,
}

impl<P: PageSignal> PagingSchedule<P> {
    pub fn new(signal: P, len: usize) -> Self {
        Self { signal, len }
    }
}

impl<P: PageSignal> MountSchedule for PagingSchedule<P> {
    fn strategy(&self) -> MountStrategy {
        MountStrategy::Paging
    }

    fn on_ready(self: Box<Self>, mount: MountFn) {
        let len = self.len;
        mount_window(&mount, 0, len);
        self.signal.subscribe(Box::new(move |index| match index {
            Some(index) => mount_window(&mount, index, len),
            None => tracing::debug!("page signal without index ignored"),
        }));
    }
}

/// Mount anchors as they approach the viewport.
pub struct ProximitySchedule<S> {
    source: S,
    len: usize,
}

impl<S: ProximitySource> ProximitySchedule<S> {
    pub fn new(source: S, len: usize) -> Self {
        Self { source, len }
    }
}

impl<S: ProximitySource> MountSchedule for ProximitySchedule<S> {
    fn strategy(&self) -> MountStrategy {
        MountStrategy::Proximity
    }

    fn on_ready(self: Box<Self>, mount: MountFn) {
        if self.len > 0 {
            mount(0);
        }
        let on_enter = mount.clone();
        if let Err(err) = self.source.observe(Box::new(move |index| on_enter(index))) {
            tracing::warn!(error = %err, "proximity observation failed, mounting every leaf");
            for i in 0..self.len {
                mount(i);
            }
        }
    }
}

/// Mount everything at once.
pub struct EagerSchedule {
    len: usize,
}

impl EagerSchedule {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl MountSchedule for EagerSchedule {
    fn strategy(&self) -> MountStrategy {
        MountStrategy::Eager
    }

    fn on_ready(self: Box<Self>, mount: MountFn) {
        for i in 0..self.len {
            mount(i);
        }
    }
}
