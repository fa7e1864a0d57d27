//! Nordic UART Service (NUS) descriptor
//!
//! Declares the standard NUS layout for BLE serial communication:
//! - Service UUID: 6E400001-B5A3-F393-E0A9-E50E24DCCA9E
//! - RX Characteristic: 6E400002-... (write, write without response)
//! - TX Characteristic: 6E400003-... (read, notify)
//!
//! The descriptor is stack-agnostic; registering it with a [`RadioStack`]
//! yields the attribute handles the session manager operates on.
//!
//! [`RadioStack`]: crate::ble::stack::RadioStack

use crate::ble::events::AttributeHandle;

/// Maximum length of a single notification payload
///
/// Using a fixed-size buffer that fits within GATT constraints
pub const MAX_PAYLOAD_LEN: usize = 128;

/// A 128-bit UUID stored in the little-endian order it travels on air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uuid128([u8; 16]);

impl Uuid128 {
    /// Build a UUID from its big-endian (textual) byte order.
    pub const fn from_be(bytes: [u8; 16]) -> Self {
        let mut le = [0u8; 16];
        let mut i = 0;
        while i < 16 {
            le[i] = bytes[15 - i];
            i += 1;
        }
        Self(le)
    }

    /// The UUID bytes in on-air (little-endian) order.
    pub const fn as_le_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// UART service UUID (6E400001-B5A3-F393-E0A9-E50E24DCCA9E)
pub const UART_SERVICE_UUID: Uuid128 = Uuid128::from_be([
    0x6E, 0x40, 0x00, 0x01, 0xB5, 0xA3, 0xF3, 0x93, 0xE0, 0xA9, 0xE5, 0x0E, 0x24, 0xDC, 0xCA,
    0x9E,
]);

/// TX characteristic UUID, device to central (6E400003-B5A3-F393-E0A9-E50E24DCCA9E)
pub const UART_TX_UUID: Uuid128 = Uuid128::from_be([
    0x6E, 0x40, 0x00, 0x03, 0xB5, 0xA3, 0xF3, 0x93, 0xE0, 0xA9, 0xE5, 0x0E, 0x24, 0xDC, 0xCA,
    0x9E,
]);

/// RX characteristic UUID, central to device (6E400002-B5A3-F393-E0A9-E50E24DCCA9E)
pub const UART_RX_UUID: Uuid128 = Uuid128::from_be([
    0x6E, 0x40, 0x00, 0x02, 0xB5, 0xA3, 0xF3, 0x93, 0xE0, 0xA9, 0xE5, 0x0E, 0x24, 0xDC, 0xCA,
    0x9E,
]);

/// GATT characteristic property bits (Core Spec Vol 3, Part G, 3.3.1.1)
pub const PROP_READ: u8 = 0x02;
pub const PROP_WRITE_NO_RESPONSE: u8 = 0x04;
pub const PROP_WRITE: u8 = 0x08;
pub const PROP_NOTIFY: u8 = 0x10;

/// One characteristic within the service declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: Uuid128,
    /// Bitwise OR of the `PROP_*` flags
    pub props: u8,
}

/// The full UART service declaration handed to the stack at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartServiceDef {
    pub uuid: Uuid128,
    pub tx: CharacteristicDef,
    pub rx: CharacteristicDef,
}

impl UartServiceDef {
    /// The canonical NUS layout: notifiable+readable TX, writable RX.
    pub const fn nus() -> Self {
        Self {
            uuid: UART_SERVICE_UUID,
            tx: CharacteristicDef {
                uuid: UART_TX_UUID,
                props: PROP_READ | PROP_NOTIFY,
            },
            rx: CharacteristicDef {
                uuid: UART_RX_UUID,
                props: PROP_WRITE | PROP_WRITE_NO_RESPONSE,
            },
        }
    }
}

/// Attribute handles returned by the stack once the service is registered.
///
/// Immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceHandles {
    pub tx: AttributeHandle,
    pub rx: AttributeHandle,
}
