//! trouble-host declaration of the Nordic UART Service
//!
//! The hardware GATT server registers this; the UUIDs are the same wire
//! identifiers declared in [`crate::ble::service`].

use trouble_host::prelude::*;

use crate::ble::service::MAX_PAYLOAD_LEN;

/// Nordic UART Service as seen by the trouble-host attribute server
#[gatt_service(uuid = "6e400001-b5a3-f393-e0a9-e50e24dcca9e")]
pub struct NordicUartService {
    /// RX Characteristic - centrals write commands here
    #[characteristic(uuid = "6e400002-b5a3-f393-e0a9-e50e24dcca9e", write, write_without_response, value = [0u8; 128])]
    pub rx: [u8; MAX_PAYLOAD_LEN],

    /// TX Characteristic - acknowledgements are notified here
    #[characteristic(uuid = "6e400003-b5a3-f393-e0a9-e50e24dcca9e", read, notify, value = [0u8; 128])]
    pub tx: [u8; MAX_PAYLOAD_LEN],
}
