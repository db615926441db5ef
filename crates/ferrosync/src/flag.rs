use portable_atomic::{AtomicBool, Ordering};

/// A boolean stored in a single atomic word.
///
/// Every operation is sequentially consistent on the flag itself; no other
/// memory is ordered by it beyond what `SeqCst` implies.
///
/// # Example
/// ```
/// use ferrosync::AtomicFlag;
///
/// let flag = AtomicFlag::new(true);
/// assert!(flag.compare_and_set(true, false));
/// assert!(!flag.compare_and_set(true, false));
/// assert!(!flag.get());
/// ```
#[derive(Debug, Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub const fn new(initial: bool) -> Self {
        Self {
            value: AtomicBool::new(initial),
        }
    }

    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    /// Stores `new` if the flag currently equals `expected`.
    ///
    /// Returns `true` if the swap happened.
    pub fn compare_and_set(&self, expected: bool, new: bool) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
