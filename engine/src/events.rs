use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use crate::host::BufferId;
use crate::host::Host;

/// Host event classes a finder can subscribe to. Prompt mode uses the
/// first four; panel mode uses `Confirmed`, `Cancelled` and `CursorMoved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    InputChanged,
    SelectionChanged,
    Confirmed,
    Cancelled,
    CursorMoved,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::InputChanged => "input-changed",
            EventKind::SelectionChanged => "selection-changed",
            EventKind::Confirmed => "confirmed",
            EventKind::Cancelled => "cancelled",
            EventKind::CursorMoved => "cursor-moved",
        };
        f.write_str(name)
    }
}

/// Structured event payloads delivered by the host to
/// [`Finder::handle_event`](crate::Finder::handle_event).
#[derive(Clone, Debug)]
pub enum FinderEvent {
    InputChanged {
        text: String,
    },
    SelectionChanged {
        index: Option<usize>,
    },
    Confirmed,
    Cancelled,
    CursorMoved {
        buffer: BufferId,
        /// File backing the buffer, when it has one.
        file: Option<PathBuf>,
        /// 0-based line the cursor landed on.
        line: u32,
    },
}

impl FinderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FinderEvent::InputChanged { .. } => EventKind::InputChanged,
            FinderEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            FinderEvent::Confirmed => EventKind::Confirmed,
            FinderEvent::Cancelled => EventKind::Cancelled,
            FinderEvent::CursorMoved { .. } => EventKind::CursorMoved,
        }
    }
}

/// Per-instance event registrations.
///
/// Handler names are namespaced by the finder's id, so two finders never
/// collide in the host's subscription table. All registrations made
/// through a registry are released together on mode exit.
pub(crate) struct HandlerRegistry {
    host: Arc<dyn Host>,
    prefix: String,
    active: Mutex<Vec<EventKind>>,
}

impl HandlerRegistry {
    pub(crate) fn new(host: Arc<dyn Host>, finder_id: &str) -> Self {
        Self {
            host,
            prefix: format!("scout.{finder_id}"),
            active: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn handler_name(&self, event: EventKind) -> String {
        format!("{}.{event}", self.prefix)
    }

    pub(crate) fn register(&self, events: &[EventKind]) {
        let mut active = match self.active.lock() {
            Ok(active) => active,
            Err(poisoned) => poisoned.into_inner(),
        };
        for &event in events {
            self.host.subscribe(event, &self.handler_name(event));
            active.push(event);
        }
    }

    pub(crate) fn unregister_all(&self) {
        let drained: Vec<EventKind> = {
            let mut active = match self.active.lock() {
                Ok(active) => active,
                Err(poisoned) => poisoned.into_inner(),
            };
            active.drain(..).collect()
        };
        for event in drained {
            self.host.unsubscribe(event, &self.handler_name(event));
        }
    }
}

impl Drop for HandlerRegistry {
    fn drop(&mut self) {
        self.unregister_all();
    }
}
