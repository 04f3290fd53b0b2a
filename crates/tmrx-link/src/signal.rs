//! Process-wide interrupt latch.
//!
//! SIGINT and SIGTERM are installed without `SA_RESTART`. Before each
//! device read the receive path blocks both signals, checks
//! [`interrupt_requested`], and waits for data in `ppoll` with the old mask
//! restored. A signal that lands between the check and the wait therefore
//! stays pending and wakes the wait instead of being missed until the next
//! frame.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the latch for SIGINT and SIGTERM.
#[cfg(unix)]
pub fn install_interrupt_handler() -> std::io::Result<()> {
    for signal in [libc::SIGINT, libc::SIGTERM] {
        // SAFETY: a zeroed `sigaction` is a valid "default" value; every field we
        // rely on is set explicitly below before it is handed to the kernel.
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = 0;

        // SAFETY: `sa_mask` is a valid, writable `sigset_t` owned by `action`.
        unsafe { libc::sigemptyset(&mut action.sa_mask) };

        // SAFETY: `action` is fully initialised and outlives the call; the old
        // action is not requested.
        let rc = unsafe { libc::sigaction(signal, &action, std::ptr::null_mut()) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    tracing::debug!("interrupt handler installed");
    Ok(())
}

/// True once SIGINT or SIGTERM was delivered.
pub fn interrupt_requested() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Wait until `fd` is readable. Returns `false` if an interrupt was
/// requested first.
#[cfg(target_os = "linux")]
pub(crate) fn wait_readable(fd: std::os::fd::RawFd) -> std::io::Result<bool> {
    wait_readable_or(fd, interrupt_requested)
}

#[cfg(target_os = "linux")]
fn wait_readable_or(
    fd: std::os::fd::RawFd,
    interrupted: impl Fn() -> bool,
) -> std::io::Result<bool> {
    let blocked = BlockedInterrupts::block()?;
    loop {
        if interrupted() {
            return Ok(false);
        }
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid `pollfd`, no timeout, and a signal mask owned by
        // `blocked` that lives across the call.
        let rc = unsafe { libc::ppoll(&mut pollfd, 1, std::ptr::null(), &blocked.previous) };
        if rc > 0 {
            return Ok(true);
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// SIGINT and SIGTERM blocked for the calling thread until drop.
#[cfg(target_os = "linux")]
struct BlockedInterrupts {
    previous: libc::sigset_t,
}

#[cfg(target_os = "linux")]
impl BlockedInterrupts {
    fn block() -> std::io::Result<Self> {
        // SAFETY: both sets are zeroed then initialised by sigemptyset /
        // pthread_sigmask before being read.
        unsafe {
            let mut set: libc::sigset_t = std::mem::zeroed();
            let mut previous: libc::sigset_t = std::mem::zeroed();
            libc::sigemptyset(&mut set);
            libc::sigaddset(&mut set, libc::SIGINT);
            libc::sigaddset(&mut set, libc::SIGTERM);
            let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut previous);
            if rc != 0 {
                return Err(std::io::Error::from_raw_os_error(rc));
            }
            Ok(Self { previous })
        }
    }
}

#[cfg(target_os = "linux")]
impl Drop for BlockedInterrupts {
    fn drop(&mut self) {
        // SAFETY: restores the mask saved in `block`; pending signals are
        // delivered here.
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
        }
    }
}
