//! SPE Expert status monitor example.
//!
//! Connects to an Expert amplifier, prints its identity and capabilities,
//! then polls status once a second and reports meters, warnings, and
//! alarms.
//!
//! # Requirements
//!
//! - An SPE Expert 1.3K-FA, 1.5K-FA, or 2K-FA connected via USB
//! - The serial port path adjusted for your system (e.g., `/dev/ttyUSB0`
//!   on Linux, `COM3` on Windows)
//!
//! # Usage
//!
//! ```sh
//! cargo run -p amplib --example spe_status
//! ```

use std::time::Duration;

use amplib::spe::models::expert_1_5k_fa;
use amplib::spe::SpeBuilder;
use amplib::{Amplifier, PowerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Adjust this to match your system's serial port.
    let serial_port = "/dev/ttyUSB0";

    println!("Connecting to Expert 1.5K-FA on {}...", serial_port);

    let amp = SpeBuilder::new(expert_1_5k_fa())
        .serial_port(serial_port)
        .build()
        .await?;

    let info = amp.info();
    println!("Connected: {} {} (id: {})", info.manufacturer, info.model_name, info.model_id);

    let caps = amp.capabilities();
    println!("Antennas: {}, inputs: {}", caps.antenna_count, caps.input_count);
    println!("Max power: {} W", caps.max_power_watts);

    if amp.get_power_state().await? == PowerState::Off {
        println!("Amplifier is off, switching on...");
        amp.set_power_state(PowerState::On).await?;
    }

    for _ in 0..10 {
        let status = amp.status(false).await?;
        println!(
            "{} {} ant {} in {} | {} W, SWR {:.2}, {:.1} V {:.1} A, {} C",
            status.power_state(),
            status.band,
            status.tx_antenna,
            status.input,
            status.output_power_watts,
            status.swr_antenna,
            status.pa_voltage,
            status.pa_current,
            status.max_temperature_c(),
        );
        if status.warning.is_active() {
            println!("  warning: {}", status.warning);
        }
        if status.alarm.is_active() {
            println!("  ALARM: {}", status.alarm);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    amp.close().await?;
    println!("\nDone.");
    Ok(())
}
