//! # Ordered emission example
//!
//! Workers prepare their messages concurrently (with varying durations) but
//! emit them strictly in the order they acquired their tickets. One worker
//! never finishes; the stall supervisor requeues it and finally evicts it, so
//! the workers behind it are not blocked forever.
//!
//! ## Run
//! ```bash
//! cargo run --example ordered_emit --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use turnstile::{LogWriter, QueueConfig, QueueError, TicketQueue};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = QueueConfig {
        timeout: Duration::from_millis(500),
        retries: 1,
    };
    let (queue, subscribers) = TicketQueue::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build_attached();

    let mut handles = Vec::new();
    for i in 0..5u64 {
        let ticket = queue.acquire();
        handles.push(tokio::spawn(async move {
            let prepare = if i == 1 {
                // Too slow: requeued once, then evicted before it ever waits.
                Duration::from_secs(2)
            } else {
                Duration::from_millis(50 * (5 - i))
            };
            tokio::time::sleep(prepare).await;
            ticket.wait_until_first().await?;
            println!("emit message {i}");
            Ok::<u64, QueueError>(i)
        }));
    }

    for h in handles {
        match h.await? {
            Ok(i) => println!("worker {i} done"),
            Err(e) => println!("worker failed: {e} ({})", e.as_label()),
        }
    }

    // Closing the queue lets the log writer print its backlog and stop.
    drop(queue);
    subscribers.join().await;
    Ok(())
}
