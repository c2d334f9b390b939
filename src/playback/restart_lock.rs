/// Debounces sensor restarts until every restarted row has finished one
/// playback cycle or been stopped.
///
/// The lock is held exactly while `pending` is non-zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SensorRestartLock {
    pending: usize,
}

impl SensorRestartLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.pending > 0
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Lock for `count` rows. Returns `false` and changes nothing when
    /// already locked or when `count` is zero.
    pub fn try_lock(&mut self, count: usize) -> bool {
        if self.is_locked() || count == 0 {
            return false;
        }
        self.pending = count;
        true
    }

    /// Count one restarted row as finished. Returns `true` when this
    /// release unlocked the lock.
    pub fn release_one(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        self.pending == 0
    }
}
