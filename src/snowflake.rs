use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Hub epoch: 2025-01-01T00:00:00Z
const EPOCH: u64 = 1_735_689_600_000;
const SEQ_BITS: u64 = 12;

// Packed (timestamp << SEQ_BITS | seq) of the last issued id.
static STATE: AtomicU64 = AtomicU64::new(0);

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock went backwards")
        .as_millis() as u64
}

/// Generate a process-unique, monotonically increasing id string.
///
/// Used for session ids. If the clock stalls or steps backwards the
/// sequence portion keeps ids strictly increasing.
pub fn generate() -> String {
    loop {
        let prev = STATE.load(Ordering::SeqCst);
        let candidate = (now_ms() - EPOCH) << SEQ_BITS;
        let next = if candidate > prev { candidate } else { prev + 1 };
        if STATE
            .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return next.to_string();
        }
    }
}
