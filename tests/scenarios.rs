use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

use acksub::broker::{AckOutcome, Broker, Delivery, HandlerResult, Message};
use acksub::utils::error::PublishError;

fn sensor_handler(message: &Message, delivery: &Delivery) -> HandlerResult {
    if message.get("value").is_none() {
        delivery.nack();
    } else {
        delivery.ack();
    }
    Ok(())
}

#[test]
fn acked_temperature_reading_leaves_queue_empty() {
    let broker = Broker::new();
    let topic = "events.sensors.temperature";
    broker.subscribe(topic, sensor_handler);

    let message = Message::new()
        .with_field("sensor_id", "temp-001")
        .with_field("value", "25.5")
        .with_field("unit", "C");
    let receipt = broker.publish(topic, &message).unwrap();

    assert_eq!(receipt.delivered, 1);
    assert!(broker.queued(topic).is_empty());
    assert_eq!(broker.stats().acked, 1);
}

#[test]
fn nacked_pressure_reading_stays_queued() {
    let broker = Broker::new();
    let topic = "events.sensors.pressure";
    broker.subscribe(topic, sensor_handler);

    let message = Message::new()
        .with_field("sensor_id", "press-002")
        .with_field("reading", "98.2");
    broker.publish(topic, &message).unwrap();

    let queued = broker.queued(topic);
    assert_eq!(queued.len(), 1);
    assert_eq!(
        queued[0].wire.as_str(),
        "<message><sensor_id>press-002</sensor_id><reading>98.2</reading></message>"
    );
    assert_eq!(broker.codec().decode(queued[0].wire.as_str()).unwrap(), message);
}

#[test]
fn bare_string_payload_is_rejected_without_side_effects() {
    let broker = Broker::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    broker.subscribe("events.sensors.temperature", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let err = broker
        .publish_json(
            "events.sensors.temperature",
            &serde_json::json!("temp-001 25.5 C"),
        )
        .unwrap_err();

    assert!(matches!(err, PublishError::InvalidMessageType { found: "string" }));
    assert_eq!(broker.queue_len("events.sensors.temperature"), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn late_subscriber_does_not_see_earlier_publish() {
    let broker = Broker::new();
    broker.publish("t", &Message::new().with_field("n", 1)).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    broker.subscribe("t", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(broker.queue_len("t"), 1);

    broker.publish("t", &Message::new().with_field("n", 2)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(broker.queue_len("t"), 2);
}

#[test]
fn delivery_kept_by_subscriber_can_ack_later() {
    let broker = Broker::new();
    let (tx, rx) = mpsc::channel::<Delivery>();
    let tx = std::sync::Mutex::new(tx);
    broker.subscribe("jobs", move |_, delivery| {
        tx.lock().unwrap().send(delivery.clone())?;
        Ok(())
    });

    broker.publish("jobs", &Message::new().with_field("job", "resize")).unwrap();
    assert_eq!(broker.queue_len("jobs"), 1);

    let delivery = rx.recv().unwrap();
    let worker = thread::spawn(move || delivery.ack());
    assert_eq!(worker.join().unwrap(), AckOutcome::Removed);
    assert_eq!(broker.queue_len("jobs"), 0);
}

#[test]
fn concurrent_publishers_each_get_their_own_entry() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let broker = Broker::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    broker.subscribe("load", move |message, delivery| {
        counter.fetch_add(1, Ordering::SeqCst);
        // keep every odd sequence number queued
        let seq: usize = message.get("seq").unwrap_or("0").parse()?;
        if seq % 2 == 0 {
            assert_eq!(delivery.ack(), AckOutcome::Removed);
        } else {
            delivery.nack();
        }
        Ok(())
    });

    thread::scope(|scope| {
        for t in 0..THREADS {
            let broker = broker.clone();
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    let message = Message::new()
                        .with_field("thread", t)
                        .with_field("seq", i);
                    broker.publish("load", &message).unwrap();
                }
            });
        }
    });

    let total = THREADS * PER_THREAD;
    let stats = broker.stats();
    assert_eq!(seen.load(Ordering::SeqCst), total);
    assert_eq!(stats.published, total as u64);
    assert_eq!(stats.acked, (total / 2) as u64);
    assert_eq!(stats.nacked, (total / 2) as u64);
    assert_eq!(stats.failed_deliveries, 0);
    assert_eq!(broker.queue_len("load"), total / 2);
}

#[test]
fn handlers_publishing_into_each_others_topics_do_not_block() {
    let broker = Broker::new();
    let barrier = Arc::new(Barrier::new(2));

    for (from, to) in [("a", "b"), ("b", "a")] {
        let inner = broker.clone();
        let barrier = Arc::clone(&barrier);
        broker.subscribe(from, move |message, _| {
            if message.get("forwarded").is_none() {
                // both threads are now mid-delivery on different topics
                barrier.wait();
                inner.publish(to, &message.clone().with_field("forwarded", from))?;
            }
            Ok(())
        });
    }

    let (done_tx, done_rx) = mpsc::channel();
    for topic in ["a", "b"] {
        let broker = broker.clone();
        let done_tx = done_tx.clone();
        thread::spawn(move || {
            let receipt = broker.publish(topic, &Message::new().with_field("origin", topic));
            let _ = done_tx.send(receipt.map(|r| r.failed));
        });
    }

    for _ in 0..2 {
        let failed = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("cross-topic publishes did not complete")
            .unwrap();
        assert_eq!(failed, 0);
    }
    assert_eq!(broker.queue_len("a"), 2);
    assert_eq!(broker.queue_len("b"), 2);
    assert_eq!(broker.stats().published, 4);
}
