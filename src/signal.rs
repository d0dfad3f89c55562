//! Interrupt monitoring and cooperative cancellation.
//!
//! A run subscribes to the configured OS signals while it is in progress.
//! Delivery only flips a sticky pending flag; workers look at it before each
//! claim, so a signal that arrives before anyone looks is never lost. The
//! first worker to see it cancels the shared [`CancellationToken`] and
//! unsubscribes the run from the OS.

use crate::error::Result;
use parking_lot::Mutex;
use signal_hook::{flag, low_level, SigId};
use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Broadcast cancellation flag shared by every worker of a run.
///
/// Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any clone of this token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Cancel the token for every clone.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Delivers an interrupt to a runner the same way an OS signal does.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    pending: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Mark an interrupt as pending. Workers adopt it before their next claim.
    pub fn trigger(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Whether an interrupt has been delivered, by signal or by `trigger`.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct InterruptMonitor {
    pending: Arc<AtomicBool>,
    token: CancellationToken,
    signals: Vec<c_int>,
    registrations: Mutex<Vec<SigId>>,
}

impl InterruptMonitor {
    pub fn new(signals: Vec<c_int>) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            token: CancellationToken::new(),
            signals,
            registrations: Mutex::new(Vec::new()),
        }
    }

    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            pending: self.pending.clone(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Subscribe to the configured OS signals.
    pub fn arm(&self) -> Result<()> {
        let mut registrations = self.registrations.lock();
        if self.signals.is_empty() || !registrations.is_empty() {
            return Ok(());
        }

        registry::acquire(&self.signals)?;

        for &signal in &self.signals {
            match flag::register(signal, self.pending.clone()) {
                Ok(id) => registrations.push(id),
                Err(e) => {
                    for id in registrations.drain(..) {
                        low_level::unregister(id);
                    }
                    registry::release();
                    return Err(e.into());
                }
            }
        }

        debug!(signals = ?self.signals, "interrupt monitoring armed");
        Ok(())
    }

    /// Whether cancellation is in effect, adopting a pending interrupt if one
    /// was delivered since the last look.
    pub fn observe(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }

        if self.pending.load(Ordering::SeqCst) {
            self.token.cancel();
            self.disarm();
            return true;
        }

        false
    }

    /// Unsubscribe from the OS. Idempotent.
    pub fn disarm(&self) {
        let mut registrations = self.registrations.lock();
        if registrations.is_empty() {
            return;
        }

        for id in registrations.drain(..) {
            if !low_level::unregister(id) {
                warn!(?id, "signal action was already unregistered");
            }
        }
        registry::release();

        debug!("interrupt monitoring disarmed");
    }
}

impl Drop for InterruptMonitor {
    fn drop(&mut self) {
        self.disarm();
    }
}

// Process-wide bookkeeping: while no run is armed, a watched signal falls
// back to its default action instead of being swallowed by the installed
// handler.
mod registry {
    use parking_lot::Mutex;
    use signal_hook::flag;
    use std::io;
    use std::os::raw::c_int;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Registry {
        armed: usize,
        idle: Option<Arc<AtomicBool>>,
        defaults: Vec<c_int>,
    }

    static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
        armed: 0,
        idle: None,
        defaults: Vec::new(),
    });

    pub(super) fn acquire(signals: &[c_int]) -> io::Result<()> {
        let mut registry = REGISTRY.lock();
        let idle = registry
            .idle
            .get_or_insert_with(|| Arc::new(AtomicBool::new(true)))
            .clone();

        for &signal in signals {
            if !registry.defaults.contains(&signal) {
                flag::register_conditional_default(signal, idle.clone())?;
                registry.defaults.push(signal);
            }
        }

        registry.armed += 1;
        idle.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub(super) fn release() {
        let mut registry = REGISTRY.lock();
        registry.armed = registry.armed.saturating_sub(1);

        if registry.armed == 0 {
            if let Some(idle) = &registry.idle {
                idle.store(true, Ordering::SeqCst);
            }
        }
    }

    #[cfg(test)]
    pub(super) fn armed() -> usize {
        REGISTRY.lock().armed
    }

    #[cfg(test)]
    pub(super) fn idle() -> Option<bool> {
        REGISTRY
            .lock()
            .idle
            .as_ref()
            .map(|idle| idle.load(Ordering::SeqCst))
    }
}
