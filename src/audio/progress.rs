//! Progress reporting for analysis runs.
//!
//! The channel sink uses a bounded crossbeam queue. While the queue is full
//! the analysis worker blocks in `send`, so a consumer that stops draining
//! stalls the run. Capacity 0 makes every update a rendezvous. Dropping the
//! receiver never stalls or fails the run: the sink just goes quiet.

use crossbeam_channel::{Receiver, Sender};

use super::timeline::Progress;

/// How a run ended, as reported to [`ProgressSink::finished`].
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Completed,
    Failed(String),
}

/// Receives updates from the analysis sweep, on the sweep's thread.
pub trait ProgressSink {
    /// Called after every analysed instant.
    fn progress(&mut self, progress: &Progress);

    /// Called once when the run completes or fails.
    fn finished(&mut self, _outcome: &Outcome) {}
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _progress: &Progress) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Progress(Progress),
    Completed,
    Failed(String),
}

/// Forwards updates into a bounded channel.
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
    connected: bool,
}

impl ChannelSink {
    fn send(&mut self, event: ProgressEvent) {
        if self.connected && self.tx.send(event).is_err() {
            log::debug!("Progress receiver dropped; further updates discarded");
            self.connected = false;
        }
    }
}

impl ProgressSink for ChannelSink {
    fn progress(&mut self, progress: &Progress) {
        self.send(ProgressEvent::Progress(*progress));
    }

    fn finished(&mut self, outcome: &Outcome) {
        let event = match outcome {
            Outcome::Completed => ProgressEvent::Completed,
            Outcome::Failed(reason) => ProgressEvent::Failed(reason.clone()),
        };
        self.send(event);
    }
}

/// A sink and its receiving end, holding at most `capacity` queued events.
pub fn progress_channel(capacity: usize) -> (ChannelSink, Receiver<ProgressEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ChannelSink { tx, connected: true }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_in_order() {
        let (mut sink, rx) = progress_channel(4);
        sink.progress(&Progress { completed: 1, expected: 2 });
        sink.progress(&Progress { completed: 2, expected: 2 });
        sink.finished(&Outcome::Completed);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Progress(Progress { completed: 1, expected: 2 }),
                ProgressEvent::Progress(Progress { completed: 2, expected: 2 }),
                ProgressEvent::Completed,
            ]
        );
    }

    #[test]
    fn dropped_receiver_does_not_block() {
        let (mut sink, rx) = progress_channel(0);
        drop(rx);
        for i in 0..100 {
            sink.progress(&Progress { completed: i, expected: 100 });
        }
        sink.finished(&Outcome::Failed("boom".into()));
        assert!(!sink.connected);
    }

    #[test]
    fn rendezvous_hands_off_each_update() {
        let (mut sink, rx) = progress_channel(0);
        let consumer = std::thread::spawn(move || rx.iter().collect::<Vec<_>>());
        for i in 1..=3 {
            sink.progress(&Progress { completed: i, expected: 3 });
        }
        sink.finished(&Outcome::Completed);
        drop(sink);
        let events = consumer.join().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events.last(), Some(&ProgressEvent::Completed));
    }
}
