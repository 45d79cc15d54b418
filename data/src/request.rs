//! One cancellable request slot per logical stream.
//!
//! A result only commits when its token is the newest one issued for the
//! stream by the same owner and the request hasn't been cancelled since.

use enum_map::{Enum, EnumMap};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Stream {
    History,
    LivePoll,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::History => write!(f, "history"),
            Stream::LivePoll => write!(f, "live poll"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    owner: Uuid,
    stream: Stream,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Commit,
    Cancelled,
    Stale,
}

/// `H` is whatever aborts the running future when dropped
struct RequestSlot<H> {
    generation: u64,
    in_flight: bool,
    handle: Option<H>,
}

impl<H> Default for RequestSlot<H> {
    fn default() -> Self {
        Self {
            generation: 0,
            in_flight: false,
            handle: None,
        }
    }
}

impl<H> RequestSlot<H> {
    fn cancel(&mut self) -> bool {
        self.handle = None;
        std::mem::replace(&mut self.in_flight, false)
    }
}

pub struct RequestLifecycle<H> {
    owner: Uuid,
    slots: EnumMap<Stream, RequestSlot<H>>,
}

impl<H> Default for RequestLifecycle<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for RequestLifecycle<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLifecycle")
            .field("owner", &self.owner)
            .field("history", &self.slots[Stream::History].generation)
            .field("live_poll", &self.slots[Stream::LivePoll].generation)
            .finish()
    }
}

impl<H> RequestLifecycle<H> {
    pub fn new() -> Self {
        Self {
            owner: Uuid::new_v4(),
            slots: EnumMap::from_fn(|_| RequestSlot::default()),
        }
    }

    /// Supersedes whatever is running on `stream`
    pub fn begin(&mut self, stream: Stream) -> RequestToken {
        let slot = &mut self.slots[stream];
        if slot.cancel() {
            log::debug!("{} request {} superseded", stream, slot.generation);
        }

        slot.generation = slot.generation.wrapping_add(1);
        slot.in_flight = true;

        RequestToken {
            owner: self.owner,
            stream,
            generation: slot.generation,
        }
    }

    /// Parks the abort handle of the request `token` was issued for.
    /// A handle for a request that's no longer current is dropped right away.
    pub fn attach(&mut self, token: &RequestToken, handle: H) {
        if token.owner != self.owner {
            return;
        }

        let slot = &mut self.slots[token.stream];
        if slot.generation == token.generation && slot.in_flight {
            slot.handle = Some(handle);
        }
    }

    pub fn resolve(&mut self, token: &RequestToken) -> Disposition {
        if token.owner != self.owner {
            log::debug!("Dropping {} result addressed to another owner", token.stream);
            return Disposition::Stale;
        }

        let slot = &mut self.slots[token.stream];
        if slot.generation != token.generation {
            log::debug!(
                "Dropping stale {} result {} (current {})",
                token.stream,
                token.generation,
                slot.generation
            );
            return Disposition::Stale;
        }

        if !slot.in_flight {
            log::debug!("Dropping cancelled {} result {}", token.stream, token.generation);
            return Disposition::Cancelled;
        }

        slot.in_flight = false;
        slot.handle = None;
        Disposition::Commit
    }

    pub fn is_in_flight(&self, stream: Stream) -> bool {
        self.slots[stream].in_flight
    }

    pub fn cancel(&mut self, stream: Stream) -> bool {
        self.slots[stream].cancel()
    }

    pub fn cancel_all(&mut self) {
        for (_, slot) in self.slots.iter_mut() {
            slot.cancel();
        }
    }
}

impl<H> Drop for RequestLifecycle<H> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
