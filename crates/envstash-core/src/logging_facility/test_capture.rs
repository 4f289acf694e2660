//! In-memory event capture for tests
//!
//! [`init_test_capture`] installs a global subscriber whose only layer
//! appends every event to a shared buffer. The buffer is shared by every
//! test in the binary, so assertions should select their own events,
//! usually with [`TestCapture::events_for_request`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use envstash_core_types::schema::{FIELD_COMPONENT, FIELD_EVENT, FIELD_OP, FIELD_REQUEST_ID};

/// One recorded event; every field value is kept in its rendered form
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn op(&self) -> Option<&str> {
        self.field(FIELD_OP)
    }

    pub fn event(&self) -> Option<&str> {
        self.field(FIELD_EVENT)
    }

    pub fn component(&self) -> Option<&str> {
        self.field(FIELD_COMPONENT)
    }

    fn is(&self, op: &str, event: &str) -> bool {
        self.op() == Some(op) && self.event() == Some(event)
    }
}

/// Integers and bools fall back to `record_debug`, which renders them
/// the same way `Display` would.
struct Recorder<'a>(&'a mut BTreeMap<String, String>);

impl Visit for Recorder<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

type Buffer = Arc<Mutex<Vec<CapturedEvent>>>;

fn lock(buffer: &Buffer) -> MutexGuard<'_, Vec<CapturedEvent>> {
    // A test that panicked while holding the lock must not hide events
    // from the others.
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

struct CaptureLayer {
    buffer: Buffer,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut Recorder(&mut fields));
        lock(&self.buffer).push(CapturedEvent {
            level: *event.metadata().level(),
            fields,
        });
    }
}

/// Read side of the capture buffer
#[derive(Clone)]
pub struct TestCapture {
    buffer: Buffer,
}

impl TestCapture {
    /// Snapshot of everything captured so far, oldest first
    pub fn events(&self) -> Vec<CapturedEvent> {
        lock(&self.buffer).clone()
    }

    /// Events carrying `request_id = <request_id>`, oldest first
    pub fn events_for_request(&self, request_id: &str) -> Vec<CapturedEvent> {
        lock(&self.buffer)
            .iter()
            .filter(|e| e.field(FIELD_REQUEST_ID) == Some(request_id))
            .cloned()
            .collect()
    }

    pub fn count_events(&self, predicate: impl Fn(&CapturedEvent) -> bool) -> usize {
        lock(&self.buffer).iter().filter(|e| predicate(e)).count()
    }

    /// First event for `op` of kind `event`
    pub fn find(&self, op: &str, event: &str) -> Option<CapturedEvent> {
        lock(&self.buffer).iter().find(|e| e.is(op, event)).cloned()
    }

    /// # Panics
    ///
    /// When no captured event matches `op` and `event`.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let total = lock(&self.buffer).len();
        assert!(
            self.find(op, event).is_some(),
            "Expected event op={} event={} among {} captured events",
            op,
            event,
            total
        );
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber (first call only) and return its handle
///
/// ```
/// use envstash_core::log_op_start;
/// use envstash_core::logging_facility::test_capture::init_test_capture;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_capture_op");
/// capture.assert_event_exists("doc_capture_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let buffer = Buffer::default();
            let layer = CaptureLayer {
                buffer: buffer.clone(),
            };
            // Another subscriber may already be installed; events then go
            // there and assertions fail loudly.
            let _ = tracing_subscriber::registry().with(layer).try_init();
            TestCapture { buffer }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_op_events() {
        let capture = init_test_capture();
        crate::log_op_start!("capture_unit_op", request_id = "req-capture-unit");
        crate::log_op_end!("capture_unit_op", duration_ms = 1u64, request_id = "req-capture-unit");

        let events = capture.events_for_request("req-capture-unit");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event(), Some("start"));
        assert_eq!(events[1].event(), Some("end"));
        assert_eq!(events[1].field("duration_ms"), Some("1"));
        assert!(events[0].component().is_some());
    }

    #[test]
    fn test_find_matches_op_and_event() {
        let capture = init_test_capture();
        crate::log_op_start!("capture_find_op", request_id = "req-capture-find");

        assert!(capture.find("capture_find_op", "start").is_some());
        assert!(capture.find("capture_find_op", "end").is_none());
    }
}
