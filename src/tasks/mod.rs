//! Embassy tasks module
//!
//! Contains the async tasks for the firmware, organised by functionality.

pub mod ble;
pub mod led;

pub use ble::{ble_task, is_connected, send};
pub use led::{led_task, LedCommand, LedReceiver, LedSender, LED_CHANNEL};
