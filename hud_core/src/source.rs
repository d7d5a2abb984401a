//! Pollable input streams from the sensing subsystem.
//!
//! Sources never block: a poll returns an item, reports that nothing is
//! pending right now, or reports that the stream has ended.

use crate::types::{InertialSample, Track};
use std::collections::VecDeque;

/// Result of a non-blocking poll.
#[derive(Clone, Debug, PartialEq)]
pub enum SourcePoll<T> {
    Ready(T),
    /// Nothing pending; poll again later.
    Empty,
    /// The stream has ended.
    Closed,
}

/// One batch of tracks per frame.
pub trait TrackSource {
    fn poll_tracks(&mut self) -> SourcePoll<Vec<Track>>;
}

/// Inertial samples at the IMU's native rate.
pub trait InertialSource {
    /// Whether the device behind this source is bound and streaming.
    fn is_ready(&self) -> bool {
        true
    }

    fn poll_sample(&mut self) -> SourcePoll<InertialSample>;
}

// ---------------------------------------------------------------------------
// Iterator adapter
// ---------------------------------------------------------------------------

/// Wraps an iterator; `Closed` once it is exhausted.
#[derive(Clone, Debug)]
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> TrackSource for IterSource<I>
where
    I: Iterator<Item = Vec<Track>>,
{
    fn poll_tracks(&mut self) -> SourcePoll<Vec<Track>> {
        self.inner.next().map_or(SourcePoll::Closed, SourcePoll::Ready)
    }
}

impl<I> InertialSource for IterSource<I>
where
    I: Iterator<Item = InertialSample>,
{
    fn poll_sample(&mut self) -> SourcePoll<InertialSample> {
        self.inner.next().map_or(SourcePoll::Closed, SourcePoll::Ready)
    }
}

// ---------------------------------------------------------------------------
// Push queue
// ---------------------------------------------------------------------------

/// A FIFO fed by a producer and drained by the frame loop.
///
/// Starts unbound for inertial use; `Empty` while open and drained.
#[derive(Clone, Debug)]
pub struct SourceQueue<T> {
    items: VecDeque<T>,
    ready: bool,
    closed: bool,
}

impl<T> Default for SourceQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            ready: false,
            closed: false,
        }
    }
}

impl<T> SourceQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the device as bound and streaming.
    pub fn bind(&mut self) {
        self.ready = true;
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// No more items after the queued ones.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn pop(&mut self) -> SourcePoll<T> {
        match self.items.pop_front() {
            Some(item) => SourcePoll::Ready(item),
            None if self.closed => SourcePoll::Closed,
            None => SourcePoll::Empty,
        }
    }
}

impl TrackSource for SourceQueue<Vec<Track>> {
    fn poll_tracks(&mut self) -> SourcePoll<Vec<Track>> {
        self.pop()
    }
}

impl InertialSource for SourceQueue<InertialSample> {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn poll_sample(&mut self) -> SourcePoll<InertialSample> {
        if !self.ready {
            return SourcePoll::Empty;
        }
        self.pop()
    }
}
