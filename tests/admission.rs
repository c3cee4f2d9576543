//! Parameters over the memory ceiling must be refused before any large
//! buffer is allocated. This binary installs a counting global allocator,
//! so every test here holds `SERIAL` to keep the counter attributable.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cryptal_scrypt::derivation::{ParamError, ScryptError, ScryptOptions, derive_key};

/// Anything this big can only be a scrypt working buffer.
const LARGE: usize = 1 << 20;

static LARGE_ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);
static SERIAL: Mutex<()> = Mutex::new(());

struct CountingAllocator;

fn record(size: usize) {
    if size >= LARGE {
        LARGE_ALLOCATIONS.fetch_add(1, Ordering::SeqCst);
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record(layout.size());
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record(new_size);
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

fn large_allocations_during<R>(f: impl FnOnce() -> R) -> (R, usize) {
    let before = LARGE_ALLOCATIONS.load(Ordering::SeqCst);
    let result = f();
    (result, LARGE_ALLOCATIONS.load(Ordering::SeqCst) - before)
}

#[test]
fn rejected_parameters_allocate_nothing_large() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());

    let cases = [
        // 1 GiB table against the 32 MiB default
        ScryptOptions::new().with_n(1 << 20).with_r(8),
        // 16 MiB table against a 1 MiB ceiling
        ScryptOptions::new().with_maxmem(1 << 20),
        // large p blows the working buffer past the ceiling
        ScryptOptions::new().with_n(16).with_r(8).with_p(1 << 16),
    ];

    for options in cases {
        let (result, large) = large_allocations_during(|| derive_key(b"pw", b"salt", 64, &options));

        assert!(
            matches!(
                result,
                Err(ScryptError::Configuration(ParamError::MemoryLimitExceeded { .. }))
            ),
            "{options:?} was not rejected: {result:?}"
        );
        assert_eq!(large, 0, "{options:?} allocated before being rejected");
    }
}

#[test]
fn admitted_parameters_do_allocate_the_table() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());

    // Defaults: a 16 MiB lookup table.
    let (result, large) =
        large_allocations_during(|| derive_key(b"pw", b"salt", 32, &ScryptOptions::new()));

    assert_eq!(result.unwrap().len(), 32);
    assert!(large >= 1);
}
