//! Concurrent handle creation runs the transport's global setup once.
//!
//! Lives in its own test binary: `TRANSPORT_INIT` is process-wide, and any
//! other test creating a handle first would mask the race.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use mqlhttp_core::{InfoType, Request, Session, TransferHandler, TransferOption, TransportError, TRANSPORT_INIT};

static INITS: AtomicUsize = AtomicUsize::new(0);

struct CountingSession;

impl Session for CountingSession {
    fn global_init() {
        INITS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(std::time::Duration::from_millis(20));
    }

    fn open() -> Result<Self, TransportError> {
        Ok(Self)
    }

    fn set_option(&mut self, _option: TransferOption) -> Result<(), TransportError> {
        Ok(())
    }

    fn perform(&mut self, handler: &mut dyn TransferHandler) -> Result<(), TransportError> {
        handler.debug(InfoType::Text, b"noop\n");
        Ok(())
    }

    fn response_code(&self) -> u16 {
        0
    }
}

#[test]
fn concurrent_creates_initialize_once() {
    assert!(!TRANSPORT_INIT.is_initialized());

    let barrier = Arc::new(Barrier::new(8));
    let workers: Vec<_> = (0..8)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                Request::<CountingSession>::create().is_ok()
            })
        })
        .collect();

    for worker in workers {
        assert!(worker.join().unwrap());
    }
    assert_eq!(INITS.load(Ordering::SeqCst), 1);
    assert!(TRANSPORT_INIT.is_initialized());

    Request::<CountingSession>::create().unwrap();
    assert_eq!(INITS.load(Ordering::SeqCst), 1);
}
