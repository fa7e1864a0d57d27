//! BLE client for talking to the firmware via the Nordic UART Service.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

/// Nordic UART Service UUIDs
const NUS_SERVICE_UUID: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);
const NUS_RX_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e); // Write to device
const NUS_TX_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e); // Notify from device

/// BLE client for communicating with the device.
pub struct BleClient {
    peripheral: Peripheral,
    rx_char: Characteristic,
    tx_char: Characteristic,
    /// Notifications received so far (oldest first)
    notifications: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl BleClient {
    /// Scan for a device whose name starts with `name_prefix` and connect.
    pub async fn connect_by_name(name_prefix: &str, scan_timeout: Duration) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No Bluetooth adapters found"))?;

        adapter.start_scan(ScanFilter::default()).await?;

        let peripheral = Self::find_device_by_prefix(&adapter, name_prefix, scan_timeout).await?;

        adapter.stop_scan().await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        // Find NUS characteristics
        let characteristics = peripheral.characteristics();

        let rx_char = characteristics
            .iter()
            .find(|c| c.uuid == NUS_RX_UUID)
            .cloned()
            .ok_or_else(|| anyhow!("NUS RX characteristic not found"))?;

        let tx_char = characteristics
            .iter()
            .find(|c| c.uuid == NUS_TX_UUID)
            .cloned()
            .ok_or_else(|| anyhow!("NUS TX characteristic not found"))?;

        // Subscribe to notifications on TX characteristic
        peripheral.subscribe(&tx_char).await?;

        let notifications = Arc::new(Mutex::new(Vec::new()));

        // Spawn notification handler
        let notifications_clone = notifications.clone();
        let peripheral_clone = peripheral.clone();
        tokio::spawn(async move {
            let mut stream = match peripheral_clone.notifications().await {
                Ok(stream) => stream,
                Err(_) => return,
            };

            while let Some(data) = stream.next().await {
                if data.uuid == NUS_TX_UUID {
                    let mut log = notifications_clone.lock().await;
                    log.push(data.value);
                }
            }
        });

        Ok(Self {
            peripheral,
            rx_char,
            tx_char,
            notifications,
        })
    }

    /// Find a device by name prefix within the scan timeout.
    async fn find_device_by_prefix(
        adapter: &Adapter,
        name_prefix: &str,
        scan_timeout: Duration,
    ) -> Result<Peripheral> {
        let start = std::time::Instant::now();

        while start.elapsed() < scan_timeout {
            let peripherals = adapter.peripherals().await?;

            for peripheral in peripherals {
                if let Some(props) = peripheral.properties().await? {
                    if let Some(local_name) = props.local_name {
                        if local_name.starts_with(name_prefix) {
                            return Ok(peripheral);
                        }
                    }
                }
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(anyhow!(
            "No device with name prefix '{}' found within timeout",
            name_prefix
        ))
    }

    /// Write a command to the RX characteristic.
    pub async fn send_command(&self, command: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.rx_char, command, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    /// Wait for the next notification, with trailing zero padding stripped.
    ///
    /// The firmware notifies the full fixed-size characteristic value, so
    /// short acknowledgements arrive padded with NUL bytes.
    pub async fn wait_for_notification(&self, response_timeout: Duration) -> Result<Vec<u8>> {
        let result = timeout(response_timeout, async {
            loop {
                {
                    let mut log = self.notifications.lock().await;
                    if !log.is_empty() {
                        let mut value = log.remove(0);
                        while value.last() == Some(&0) {
                            value.pop();
                        }
                        return value;
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        result.map_err(|_| anyhow!("Timeout waiting for BLE notification"))
    }

    /// Check that no notification arrives within `quiet_period`.
    pub async fn expect_silence(&self, quiet_period: Duration) -> Result<()> {
        match self.wait_for_notification(quiet_period).await {
            Ok(value) => Err(anyhow!("Unexpected notification: {:?}", value)),
            Err(_) => Ok(()),
        }
    }

    /// Clear any pending notifications.
    pub async fn clear_notifications(&self) {
        let mut log = self.notifications.lock().await;
        log.clear();
    }

    /// Disconnect from the device.
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.unsubscribe(&self.tx_char).await?;
        self.peripheral.disconnect().await?;
        Ok(())
    }
}
