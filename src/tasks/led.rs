//! LED task
//!
//! Applies LED commands from the BLE write handler without blocking the
//! host loop.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use esp_hal::gpio::Output;

use crate::commands::UartCommand;

/// LED state change requested by a central
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    On,
    Off,
}

impl From<UartCommand> for LedCommand {
    fn from(command: UartCommand) -> Self {
        match command {
            UartCommand::LedOn => Self::On,
            UartCommand::LedOff => Self::Off,
        }
    }
}

/// Type alias for the LED channel sender
pub type LedSender = Sender<'static, CriticalSectionRawMutex, LedCommand, 4>;

/// Type alias for the LED channel receiver
pub type LedReceiver = Receiver<'static, CriticalSectionRawMutex, LedCommand, 4>;

/// Channel for LED state changes
pub static LED_CHANNEL: Channel<CriticalSectionRawMutex, LedCommand, 4> = Channel::new();

/// Task that applies LED state changes (LED is active high on GPIO2)
pub async fn led_task(mut led: Output<'static>, receiver: LedReceiver) {
    loop {
        match receiver.receive().await {
            LedCommand::On => led.set_high(),
            LedCommand::Off => led.set_low(),
        }
    }
}
