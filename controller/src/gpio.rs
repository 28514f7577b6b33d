//! Console power switch and liveness pin.
//!
//! The liveness pin is driven high while the controller runs; the reader
//! watches it to know when it may cut power. Both halves of the power switch
//! fire once per press: a falling edge on pull-up inputs when the buttons are
//! active-low, a rising edge on pull-down inputs otherwise.

use std::sync::mpsc::Sender;

use anyhow::Result;
use cartreader_core::config::GpioConfig;
use cartreader_core::controller::Event;

#[cfg(feature = "rpi")]
mod pins {
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use cartreader_core::config::GpioConfig;
    use cartreader_core::controller::Event;
    use rppal::gpio::{Gpio, InputPin, OutputPin, Pin, Trigger};

    /// Pins stay claimed until dropped; dropping releases the liveness pin.
    pub struct Pins {
        _liveness: OutputPin,
        _launch: InputPin,
        _stop: InputPin,
    }

    pub fn attach(config: &GpioConfig, events: Sender<Event>) -> Result<Pins> {
        let gpio = Gpio::new().context("Failed to open GPIO")?;
        let debounce = Some(Duration::from_millis(config.debounce_ms));
        let (trigger, input): (Trigger, fn(Pin) -> InputPin) = if config.active_low {
            (Trigger::FallingEdge, Pin::into_input_pullup)
        } else {
            (Trigger::RisingEdge, Pin::into_input_pulldown)
        };

        let liveness = gpio
            .get(config.liveness)
            .with_context(|| format!("Failed to claim liveness pin {}", config.liveness))?
            .into_output_high();

        let mut launch = gpio
            .get(config.launch_button)
            .with_context(|| format!("Failed to claim launch pin {}", config.launch_button))
            .map(input)?;
        let tx = events.clone();
        launch.set_async_interrupt(trigger, debounce, move |_| {
            let _ = tx.send(Event::LaunchPressed);
        })?;

        let mut stop = gpio
            .get(config.stop_button)
            .with_context(|| format!("Failed to claim stop pin {}", config.stop_button))
            .map(input)?;
        stop.set_async_interrupt(trigger, debounce, move |_| {
            let _ = events.send(Event::StopPressed);
        })?;

        tracing::info!(
            liveness = config.liveness,
            launch = config.launch_button,
            stop = config.stop_button,
            "GPIO attached"
        );
        Ok(Pins {
            _liveness: liveness,
            _launch: launch,
            _stop: stop,
        })
    }
}

#[cfg(not(feature = "rpi"))]
mod pins {
    use std::sync::mpsc::Sender;

    use anyhow::Result;
    use cartreader_core::config::GpioConfig;
    use cartreader_core::controller::Event;

    pub struct Pins;

    pub fn attach(_config: &GpioConfig, _events: Sender<Event>) -> Result<Pins> {
        tracing::warn!("Built without the `rpi` feature, power switch is disabled");
        Ok(Pins)
    }
}

pub use pins::Pins;

/// Claim the liveness pin and wire the power switch to `events`.
pub fn attach(config: &GpioConfig, events: Sender<Event>) -> Result<Pins> {
    pins::attach(config, events)
}
