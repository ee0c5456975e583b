//! Finger identification example

use std::time::Duration;
use tokio::time::sleep;
use zfmrust::{CharBuffer, Sensor};

#[tokio::main]
async fn main() -> zfmrust::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("SENSOR_PORT").unwrap_or_else(|_| "/dev/ttyUSB0".to_string());

    let mut sensor = Sensor::new(port, 57_600)?;
    sensor.connect().await?;

    if !sensor.verify_password().await? {
        eprintln!("Sensor password rejected");
        return Ok(());
    }

    println!("Place your finger on the sensor...");
    while !sensor.read_image().await? {
        sleep(Duration::from_millis(200)).await;
    }
    sensor.convert_image(CharBuffer::One).await?;

    match sensor.search_template(CharBuffer::One, 0, None).await? {
        (-1, -1) => println!("No match found"),
        (position, score) => println!("Matched position {position} with score {score}"),
    }

    sensor.close().await?;
    Ok(())
}
