use std::{
    panic::{self, AssertUnwindSafe},
    sync::Mutex,
};

use slot_bitmap::SlotBitmap;

static LOCATIONS: Mutex<Vec<String>> = Mutex::new(Vec::new());

// Runs `f`, expecting a panic, and returns the file the panic is reported at.
fn panic_file(f: impl FnOnce()) -> String {
    LOCATIONS.lock().unwrap().clear();
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    assert!(result.is_err(), "expected a panic");
    LOCATIONS.lock().unwrap().pop().expect("panic hook ran")
}

// The hook is process-wide, so every check lives in this one test.
#[test]
fn test_bounds_panics_point_at_the_caller() {
    let prev = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        if let Some(loc) = info.location() {
            LOCATIONS.lock().unwrap().push(loc.file().to_string());
        }
    }));

    let mut bitmap = SlotBitmap::new(100).unwrap();
    let set = panic_file(|| {
        bitmap.set(100);
    });
    let reset = panic_file(|| {
        bitmap.reset(500);
    });
    let put_word = panic_file(|| bitmap.put_word(2, 1));

    panic::set_hook(prev);

    assert_eq!(set, file!());
    assert_eq!(reset, file!());
    assert_eq!(put_word, file!());
}
