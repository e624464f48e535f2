//! Shared helpers for waiter tests.

#![allow(dead_code)]

use pacekeeper_rate_limit::{WaitEnded, WaitObserver, WaitStarted, WaitTick};
use parking_lot::Mutex;
use std::sync::Arc;

/// One observed wait event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start(WaitStarted),
    Tick(WaitTick),
    End(WaitEnded),
}

/// Observer that records every event; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn starts(&self) -> Vec<WaitStarted> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Start(start) => Some(start.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn ticks(&self) -> Vec<WaitTick> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Tick(tick) => Some(*tick),
                _ => None,
            })
            .collect()
    }

    pub fn ends(&self) -> Vec<WaitEnded> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::End(end) => Some(*end),
                _ => None,
            })
            .collect()
    }
}

impl WaitObserver for Recorder {
    fn on_start(&self, event: &WaitStarted) {
        self.events.lock().push(Event::Start(event.clone()));
    }

    fn on_tick(&self, tick: &WaitTick) {
        self.events.lock().push(Event::Tick(*tick));
    }

    fn on_end(&self, event: &WaitEnded) {
        self.events.lock().push(Event::End(*event));
    }
}
