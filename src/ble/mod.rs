//! Bluetooth Low Energy UART peripheral
//!
//! Exposes the Nordic UART Service (NUS) so a central can write commands and
//! receive notifications. The session manager in [`peripheral`] is
//! stack-agnostic; the trouble-host binding lives in the task layer.

pub mod advertising;
pub mod events;
pub mod peripheral;
pub mod service;
pub mod stack;

#[cfg(feature = "embedded")]
pub mod nus;

pub use events::{AttributeHandle, ConnectionHandle, StackEvent};
pub use peripheral::{AdvertisingPolicy, SessionConfig, SetupError, UartPeripheral};
pub use stack::{RadioError, RadioStack};
