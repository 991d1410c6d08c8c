//! CPU affinity for the worker and monitor threads.
//!
//! Linux pins through `sched_setaffinity`; other hosts report
//! [`AffinityError::Unsupported`] and the thread runs wherever the
//! scheduler puts it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AffinityError {
    #[error("core {core} is outside the CPU set")]
    OutOfRange { core: usize },

    #[error("affinity call failed: {0}")]
    Os(String),

    #[error("thread affinity is not supported on this platform")]
    Unsupported,
}

/// Restrict the calling thread to `core`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(core: usize) -> Result<(), AffinityError> {
    if core >= libc::CPU_SETSIZE as usize {
        return Err(AffinityError::OutOfRange { core });
    }
    // SAFETY: cpu_set_t is a plain bitmask, zeroed is the empty set, and
    // `core` was bounds-checked against CPU_SETSIZE above.
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(AffinityError::Os(std::io::Error::last_os_error().to_string()))
    }
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_core: usize) -> Result<(), AffinityError> {
    Err(AffinityError::Unsupported)
}

/// Cores the calling thread may currently run on, ascending.
#[cfg(target_os = "linux")]
pub fn current_affinity() -> Result<Vec<usize>, AffinityError> {
    // SAFETY: the kernel fills a zeroed cpu_set_t of the size we pass, and
    // CPU_ISSET only reads indices below CPU_SETSIZE.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        if libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set) != 0 {
            return Err(AffinityError::Os(std::io::Error::last_os_error().to_string()));
        }
        Ok((0..libc::CPU_SETSIZE as usize)
            .filter(|&core| libc::CPU_ISSET(core, &set))
            .collect())
    }
}

#[cfg(not(target_os = "linux"))]
pub fn current_affinity() -> Result<Vec<usize>, AffinityError> {
    Err(AffinityError::Unsupported)
}
