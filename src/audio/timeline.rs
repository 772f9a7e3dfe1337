//! Append-only record of analysed instants, with run progress and state.
//!
//! Spectra, progress and state share a single lock so a reader always sees a
//! progress value consistent with the number of spectra.

use std::sync::Arc;

use parking_lot::Mutex;

use super::spectrum::Spectrum;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Completed instants out of the expected total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub expected: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        self.completed.min(self.expected) as f64 / self.expected as f64
    }

    pub fn is_done(&self) -> bool {
        self.expected > 0 && self.completed >= self.expected
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.fraction() * 100.0)
    }
}

struct TimelineState {
    spectra: Vec<Arc<Spectrum>>,
    expected: usize,
    state: RunState,
}

pub struct Timeline {
    inner: Mutex<TimelineState>,
}

impl Timeline {
    pub fn new(expected: usize) -> Self {
        Self {
            inner: Mutex::new(TimelineState {
                spectra: Vec::with_capacity(expected),
                expected,
                state: RunState::Idle,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of instants a full run produces.
    pub fn expected(&self) -> usize {
        self.inner.lock().expected
    }

    pub fn state(&self) -> RunState {
        self.inner.lock().state
    }

    /// Whether a run finished and every expected instant is present.
    pub fn is_complete(&self) -> bool {
        let inner = self.inner.lock();
        inner.state == RunState::Completed && inner.spectra.len() == inner.expected
    }

    pub fn progress(&self) -> Progress {
        let inner = self.inner.lock();
        Progress {
            completed: inner.spectra.len(),
            expected: inner.expected,
        }
    }

    pub fn get(&self, index: usize) -> Option<Arc<Spectrum>> {
        self.inner.lock().spectra.get(index).cloned()
    }

    /// Spectra appended after the first `already_seen`.
    pub fn since(&self, already_seen: usize) -> Vec<Arc<Spectrum>> {
        let inner = self.inner.lock();
        inner
            .spectra
            .get(already_seen..)
            .map(|s| s.to_vec())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> Vec<Arc<Spectrum>> {
        self.inner.lock().spectra.clone()
    }

    /// Idle -> Running. Any other starting state means a run already happened.
    pub(crate) fn begin(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != RunState::Idle {
            return Err(Error::AlreadyStarted);
        }
        inner.state = RunState::Running;
        Ok(())
    }

    pub(crate) fn push(&self, spectrum: Spectrum) -> Progress {
        let mut inner = self.inner.lock();
        inner.spectra.push(Arc::new(spectrum));
        Progress {
            completed: inner.spectra.len(),
            expected: inner.expected,
        }
    }

    pub(crate) fn finish(&self, state: RunState) {
        self.inner.lock().state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spectrum(time: f64) -> Spectrum {
        Spectrum {
            time,
            magnitudes: vec![time; 88],
        }
    }

    #[test]
    fn progress_tracks_pushes() {
        let timeline = Timeline::new(4);
        assert_eq!(timeline.progress().fraction(), 0.0);

        let mut last = 0.0;
        for i in 0..4 {
            let progress = timeline.push(spectrum(i as f64));
            assert!(progress.fraction() >= last);
            last = progress.fraction();
        }
        assert_eq!(last, 1.0);
        assert!(timeline.progress().is_done());
        assert_eq!(timeline.progress().to_string(), "100.0%");
    }

    #[test]
    fn since_returns_only_new_entries() {
        let timeline = Timeline::new(3);
        timeline.push(spectrum(0.0));
        timeline.push(spectrum(1.0));
        assert_eq!(timeline.since(0).len(), 2);
        let fresh = timeline.since(1);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].time, 1.0);
        assert!(timeline.since(2).is_empty());
        assert!(timeline.since(10).is_empty());
    }

    #[test]
    fn begin_only_once() {
        let timeline = Timeline::new(1);
        assert_eq!(timeline.state(), RunState::Idle);
        timeline.begin().unwrap();
        assert!(matches!(timeline.begin(), Err(Error::AlreadyStarted)));
        timeline.finish(RunState::Failed);
        assert!(matches!(timeline.begin(), Err(Error::AlreadyStarted)));
        assert!(!timeline.is_complete());
    }

    #[test]
    fn percentage_string() {
        let progress = Progress { completed: 1, expected: 8 };
        assert_eq!(progress.to_string(), "12.5%");
    }
}
