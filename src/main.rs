//! Demo for acksub
//!
//! Subscribes one handler to two sensor topics, publishes a well-formed
//! reading (acked) and a reading without a `value` field (nacked), then
//! checks what is left in each queue.

use std::process::ExitCode;

use acksub::broker::{Broker, Delivery, HandlerResult, Message};
use acksub::config::load_config;
use tracing::{error, info};

const TEMPERATURE: &str = "events.sensors.temperature";
const PRESSURE: &str = "events.sensors.pressure";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            // config may have failed before logging was set up
            acksub::utils::logging::init("info");
            error!("demo failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn sensor_handler(message: &Message, delivery: &Delivery) -> HandlerResult {
    info!(topic = delivery.topic(), ?message, "received sensor data");
    if message.get("value").is_none() {
        info!("reading has no value field; rejecting");
        delivery.nack();
        return Ok(());
    }

    info!("processing complete; acknowledging");
    delivery.ack();
    Ok(())
}

fn run() -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config()?;
    acksub::utils::logging::init(&config.log.level);

    let broker = Broker::with_settings(&config.broker)?;

    broker.subscribe(TEMPERATURE, sensor_handler);
    let ok = Message::new()
        .with_field("sensor_id", "temp-001")
        .with_field("value", "25.5")
        .with_field("unit", "C");
    broker.publish(TEMPERATURE, &ok)?;

    let acked = broker.queue_len(TEMPERATURE) == 0;
    if acked {
        info!(topic = TEMPERATURE, "queue is empty; ack removed the message");
    } else {
        error!(topic = TEMPERATURE, queued = ?broker.queued(TEMPERATURE), "ack did not empty the queue");
    }

    broker.subscribe(PRESSURE, sensor_handler);
    let bad = Message::new()
        .with_field("sensor_id", "press-002")
        .with_field("reading", "98.2");
    broker.publish(PRESSURE, &bad)?;

    let queued = broker.queued(PRESSURE);
    let nacked = queued.len() == 1;
    match queued.first() {
        Some(entry) if nacked => {
            info!(topic = PRESSURE, wire = %entry.wire, "message still queued after nack");
        }
        _ => error!(topic = PRESSURE, queued = queued.len(), "nack did not keep exactly one entry"),
    }

    info!(stats = %serde_json::to_string(&broker.stats())?, "broker statistics");
    Ok(acked && nacked)
}
