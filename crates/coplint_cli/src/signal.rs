//! Ctrl-C handling.
//!
//! The first SIGINT raises the linter's abort flag so files already being
//! inspected finish and the run reports what it has. A second SIGINT exits
//! at once.

use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;

static ABORT: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Routes SIGINT to `abort`. Only the first call has an effect.
pub fn install(abort: Arc<AtomicBool>) {
    if ABORT.set(abort).is_ok() {
        route_sigint();
    }
}

#[cfg(unix)]
fn route_sigint() {
    // SAFETY: the handler only touches an atomic and calls `_exit`, both
    // async-signal-safe.
    unsafe {
        libc::signal(
            libc::SIGINT,
            on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

#[cfg(not(unix))]
fn route_sigint() {}

#[cfg(unix)]
extern "C" fn on_interrupt(_signal: libc::c_int) {
    use std::sync::atomic::Ordering;

    if let Some(abort) = ABORT.get()
        && abort.swap(true, Ordering::SeqCst)
    {
        // SAFETY: `_exit` is async-signal-safe and never returns.
        unsafe { libc::_exit(130) }
    }
}
