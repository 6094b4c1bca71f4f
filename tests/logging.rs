use std::{ptr::NonNull, sync::Mutex};

use log::{LevelFilter, Log, Metadata, Record};
use slot_bitmap::{AllocError, Global, RawSlotBitmap, SlotBitmap, WordAllocator};

/// Keeps every record emitted by this crate.
struct Capture {
    records: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.target().starts_with("slot_bitmap")
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            let line = format!("{} {}", record.level(), record.args());
            self.records.lock().unwrap().push(line);
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn take_records() -> Vec<String> {
    std::mem::take(&mut *CAPTURE.records.lock().unwrap())
}

struct FailingAlloc;

unsafe impl WordAllocator for FailingAlloc {
    fn allocate(&self, words: usize) -> Result<NonNull<u64>, AllocError> {
        Err(AllocError { words })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u64>, _words: usize) {
        unreachable!("nothing was allocated");
    }
}

// A logger can be installed once per process, so every event is checked in
// this one test.
#[test]
fn test_lifecycle_events_are_logged() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let bitmap = SlotBitmap::new(130).unwrap();
    assert_eq!(
        take_records(),
        ["TRACE constructed slot bitmap: capacity=130 words=3"]
    );

    drop(bitmap);
    assert_eq!(
        take_records(),
        ["TRACE destroying slot bitmap: capacity=130 words=3"]
    );

    SlotBitmap::new(5000).unwrap_err();
    assert_eq!(
        take_records(),
        ["DEBUG rejecting slot bitmap capacity 5000 (max 4096)"]
    );

    RawSlotBitmap::construct(&FailingAlloc, 200).unwrap_err();
    let expected = "DEBUG slot bitmap allocation failed: failed to allocate 4 bitmap words";
    assert_eq!(take_records(), [expected]);

    // A bitmap without storage releases nothing and stays quiet
    unsafe { RawSlotBitmap::default().destroy(&Global, 64) };
    assert!(take_records().is_empty());

    // Slot operations never log
    let mut bitmap = SlotBitmap::new(64).unwrap();
    take_records();
    bitmap.set(3);
    bitmap.reset(3);
    let _ = bitmap.first_open();
    let _ = bitmap.iter().count();
    assert!(take_records().is_empty());
}
