//! Bounded FIFO between calling threads and the writer.
//!
//! Any number of producers enqueue; exactly one writer dequeues. Delivery order
//! is enqueue order, which is the only ordering guarantee a logger gives.
//! A full queue blocks the producer until the writer frees a slot. There is no
//! timeout and no drop policy.
//!
//! The receiver also holds a liveness token. Once it is dropped, which happens
//! when the writer thread ends for any reason including a panic, producers
//! waiting on a reply are released with [`LogError::Disconnected`].

use crate::{error::LogError, record::LogRecord};
use crossbeam::channel::{self, Receiver, Sender};

/// What travels through the queue.
#[derive(Debug)]
pub(crate) enum Envelope {
    /// A record to format and write. `done` is signalled with the rendered
    /// message body once the line is on the sink.
    Record {
        record: LogRecord,
        done: Option<Sender<String>>,
    },
    /// Flush the sink and acknowledge; orders after every earlier envelope.
    Flush(Sender<()>),
    /// Drain stops here; the writer flushes and exits.
    Shutdown,
}

/// Producer half. Cheap to clone; every clone feeds the same writer.
#[derive(Debug, Clone)]
pub(crate) struct RecordSender {
    tx: Sender<Envelope>,
    /// Never carries a message; disconnects when the receiver is dropped.
    consumer_alive: Receiver<()>,
}

/// Consumer half, owned by the writer thread.
#[derive(Debug)]
pub(crate) struct RecordReceiver {
    rx: Receiver<Envelope>,
    _alive: Sender<()>,
}

/// Create a queue with `capacity` slots. The capacity never changes.
pub(crate) fn bounded(capacity: usize) -> Result<(RecordSender, RecordReceiver), LogError> {
    if capacity == 0 {
        // A zero-capacity crossbeam channel is a rendezvous channel, which
        // would turn every log call into a handoff with the writer.
        return Err(LogError::ZeroCapacity);
    }
    let (tx, rx) = channel::bounded(capacity);
    let (alive, consumer_alive) = channel::bounded(0);
    Ok((
        RecordSender { tx, consumer_alive },
        RecordReceiver { rx, _alive: alive },
    ))
}

impl RecordSender {
    /// Enqueue, blocking while the queue is full.
    pub(crate) fn send(&self, envelope: Envelope) -> Result<(), LogError> {
        self.tx.send(envelope).map_err(|_| LogError::Disconnected)
    }

    /// Block until the writer answers on `reply` or the writer is gone.
    pub(crate) fn wait<T>(&self, reply: &Receiver<T>) -> Result<T, LogError> {
        channel::select! {
            recv(reply) -> msg => msg.map_err(|_| LogError::Disconnected),
            // The answer may have landed just before the writer went away.
            recv(self.consumer_alive) -> _ => reply.try_recv().map_err(|_| LogError::Disconnected),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tx.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(0)
    }
}

impl RecordReceiver {
    /// Block until the next envelope; `None` once every sender is gone.
    pub(crate) fn recv(&self) -> Option<Envelope> {
        self.rx.recv().ok()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{level::LogLevel, record::CallSite};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn record(n: i64) -> Envelope {
        Envelope::Record {
            record: LogRecord::new(
                chrono::Local::now(),
                LogLevel::Info,
                CallSite::new("queue.rs", 1),
                None,
                crate::args![n],
            ),
            done: None,
        }
    }

    fn value_of(envelope: Envelope) -> crate::Value {
        match envelope {
            Envelope::Record { record, .. } => record.args[0].clone(),
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(bounded(0), Err(LogError::ZeroCapacity)));
    }

    #[test]
    fn test_fifo_delivery() {
        let (tx, rx) = bounded(8).unwrap();
        for n in 0..5 {
            tx.send(record(n)).unwrap();
        }
        assert_eq!(tx.len(), 5);
        assert_eq!(tx.capacity(), 8);
        for n in 0..5 {
            assert_eq!(value_of(rx.recv().unwrap()), crate::Value::Int(n));
        }
        assert!(rx.is_empty());
    }

    #[test]
    fn test_full_queue_blocks_producer() {
        let (tx, rx) = bounded(1).unwrap();
        tx.send(record(0)).unwrap();

        let sent = Arc::new(AtomicBool::new(false));
        let producer = {
            let tx = tx.clone();
            let sent = Arc::clone(&sent);
            std::thread::spawn(move || {
                tx.send(record(1)).unwrap();
                sent.store(true, Ordering::SeqCst);
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        assert!(!sent.load(Ordering::SeqCst), "producer should be blocked");

        assert_eq!(value_of(rx.recv().unwrap()), crate::Value::Int(0));
        producer.join().unwrap();
        assert!(sent.load(Ordering::SeqCst));
        assert_eq!(value_of(rx.recv().unwrap()), crate::Value::Int(1));
    }

    #[test]
    fn test_wait_returns_reply() {
        let (tx, _rx) = bounded(2).unwrap();
        let (reply_tx, reply_rx) = channel::bounded(1);
        reply_tx.send(7u32).unwrap();
        assert_eq!(tx.wait(&reply_rx).unwrap(), 7);
    }

    #[test]
    fn test_wait_released_when_receiver_dropped_with_pending_reply() {
        let (tx, rx) = bounded(2).unwrap();
        let (ack_tx, ack_rx) = channel::bounded::<()>(1);
        // The reply sender sits in the queue, keeping `ack_rx` connected.
        tx.send(Envelope::Flush(ack_tx)).unwrap();

        let consumer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(rx);
        });
        assert!(matches!(tx.wait(&ack_rx), Err(LogError::Disconnected)));
        consumer.join().unwrap();
    }

    #[test]
    fn test_recv_none_after_senders_dropped() {
        let (tx, rx) = bounded(2).unwrap();
        drop(tx);
        assert!(rx.recv().is_none());
    }
}
