use anyhow::Result;
use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use xlog::{args, LogLevel, Logger, MemorySink};

/// Body text after the `file:line ` part of a rendered line.
fn body(line: &str) -> &str {
    // "YYYY/MM/DD HH:MM:SS [level] file:line body"
    line.splitn(5, ' ').nth(4).unwrap_or("")
}

/// Records enqueued in a known global order must reach the sink in that order.
#[test]
fn concurrent_producers_preserve_enqueue_order() -> Result<()> {
    let memory = MemorySink::new();
    let logger = Arc::new(Logger::builder().queue_capacity(64).build(memory.clone())?);

    // The sequence number and the enqueue happen under one lock, so the
    // sequence is the enqueue order.
    let sequence = Arc::new(Mutex::new(0u64));
    let threads = 8;
    let per_thread = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let sequence = Arc::clone(&sequence);
            std::thread::spawn(move || {
                for n in 0..per_thread {
                    let mut seq = sequence.lock();
                    logger.infof("seq=%d thread=%d n=%d", args![*seq, t, n]);
                    *seq += 1;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    logger.flush()?;

    let lines = memory.lines();
    assert_eq!(lines.len(), threads * per_thread);
    for (expected, line) in lines.iter().enumerate() {
        assert!(line.contains(" [info] "), "mangled line: {}", line);
        let body = body(line);
        assert!(
            body.starts_with(&format!("seq={} ", expected)),
            "line {} out of order: {}",
            expected,
            line
        );
    }
    Ok(())
}

/// Each producer's records appear whole and in its own order even without
/// any coordination between producers.
#[test]
fn uncoordinated_producers_keep_per_thread_order() -> Result<()> {
    let memory = MemorySink::new();
    let logger = Arc::new(Logger::builder().queue_capacity(16).build(memory.clone())?);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for n in 0..1000 {
                    logger.debug(args![format!("t{}", t), n]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    logger.flush()?;

    let mut next = [0i64; 4];
    let lines = memory.lines();
    assert_eq!(lines.len(), 4000);
    for line in &lines {
        let mut parts = body(line).split(' ');
        let thread: usize = parts.next().unwrap()[1..].parse()?;
        let n: i64 = parts.next().unwrap().parse()?;
        assert_eq!(n, next[thread], "thread {} skipped or reordered", thread);
        next[thread] += 1;
    }
    Ok(())
}

/// Writes block until the test hands out a token.
struct GatedSink {
    tokens: Receiver<()>,
    inner: MemorySink,
}

impl Write for GatedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = self.tokens.recv();
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn full_queue_blocks_producers_without_dropping() -> Result<()> {
    let memory = MemorySink::new();
    let (tokens_tx, tokens_rx) = channel::unbounded();
    let logger = Arc::new(Logger::builder().queue_capacity(2).build(GatedSink {
        tokens: tokens_rx,
        inner: memory.clone(),
    })?);

    let finished = Arc::new(AtomicBool::new(false));
    let producer = {
        let logger = Arc::clone(&logger);
        let finished = Arc::clone(&finished);
        std::thread::spawn(move || {
            for n in 0..5 {
                logger.info(args!["record", n]);
            }
            finished.store(true, Ordering::SeqCst);
        })
    };

    // One record is stuck in the writer, two fill the queue, the fourth blocks.
    std::thread::sleep(Duration::from_millis(200));
    assert!(!finished.load(Ordering::SeqCst), "producer should be blocked");
    assert_eq!(logger.queued(), 2);
    assert!(memory.is_empty());

    for _ in 0..5 {
        tokens_tx.send(())?;
    }
    producer.join().expect("producer panicked");
    logger.flush()?;

    let bodies: Vec<String> = memory.lines().iter().map(|l| body(l).to_string()).collect();
    assert_eq!(
        bodies,
        vec!["record 0", "record 1", "record 2", "record 3", "record 4"]
    );
    Ok(())
}

#[test]
fn threshold_filters_before_queueing() -> Result<()> {
    let memory = MemorySink::new();
    let logger = Logger::builder()
        .level(LogLevel::Error)
        .build(memory.clone())?;

    for level in LogLevel::ALL {
        if level < LogLevel::Panic {
            logger.output(level, None, args![level.tag()]);
        }
    }
    logger.flush()?;

    let lines = memory.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[error]"));
    Ok(())
}
