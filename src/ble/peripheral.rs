//! BLE UART peripheral session manager
//!
//! Bridges the asynchronous radio-stack event stream and synchronous
//! application calls. The session owns the connection table, the registered
//! attribute handles, the cached advertising payload and the single
//! application write-callback slot.
//!
//! One rule keeps the device discoverable: after every disconnect the
//! advertise command is re-issued, so a departing central never leaves the
//! peripheral silent.
//!
//! All mutation happens inside [`UartPeripheral::on_event`]; the owner must
//! serialise calls into the session (the hardware binding does so by keeping
//! it inside a single task and feeding it through channels).

use crate::ble::advertising::{advertising_payload, ADV_MAX_LEN};
use crate::ble::events::{ConnectionHandle, StackEvent};
use crate::ble::service::{ServiceHandles, UartServiceDef, MAX_PAYLOAD_LEN, UART_SERVICE_UUID};
use crate::ble::stack::{RadioError, RadioStack};
use crate::config;
use heapless::{FnvIndexSet, Vec};
use log::{debug, info, warn};

/// Whether advertising keeps running while centrals are connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingPolicy {
    /// Keep advertising alongside active connections; re-arm after every
    /// disconnect. Additional centrals can connect at any time.
    Concurrent,
    /// Stop advertising once a central connects; re-arm only when the last
    /// connection drops.
    SuspendWhileConnected,
}

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Advertising interval in microseconds
    pub adv_interval_us: u32,
    pub policy: AdvertisingPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            adv_interval_us: config::ble::ADV_INTERVAL_US,
            policy: AdvertisingPolicy::Concurrent,
        }
    }
}

/// Fatal startup errors; unrecoverable at this layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    /// The radio could not be powered
    RadioInactive,
    /// The stack rejected the service registration
    ServiceRegistration(RadioError),
    /// The device name does not fit the advertising frame
    PayloadTooLong,
    /// The initial advertise command was rejected
    AdvertiseStart(RadioError),
}

/// BLE UART peripheral session
///
/// Constructed once at startup; registers the UART service, builds the
/// advertising payload and starts advertising. Lives for the process
/// lifetime.
pub struct UartPeripheral<'cb, S: RadioStack> {
    stack: S,
    handles: ServiceHandles,
    connections: FnvIndexSet<ConnectionHandle, { config::ble::MAX_CONNECTIONS }>,
    adv_payload: Vec<u8, ADV_MAX_LEN>,
    session_config: SessionConfig,
    write_callback: Option<&'cb mut (dyn FnMut(&[u8]) + 'cb)>,
}

impl<'cb, S: RadioStack> UartPeripheral<'cb, S> {
    /// Activate the radio, register the UART service, build the advertising
    /// payload and start advertising.
    pub fn new(
        mut stack: S,
        name: &str,
        session_config: SessionConfig,
    ) -> Result<Self, SetupError> {
        if !stack.activate() {
            return Err(SetupError::RadioInactive);
        }

        let handles = stack
            .register_uart_service(&UartServiceDef::nus())
            .map_err(SetupError::ServiceRegistration)?;

        // Built once; reused verbatim on every subsequent advertise command
        let adv_payload = advertising_payload(name, &[UART_SERVICE_UUID])
            .map_err(|_| SetupError::PayloadTooLong)?;

        let mut peripheral = Self {
            stack,
            handles,
            connections: FnvIndexSet::new(),
            adv_payload,
            session_config,
            write_callback: None,
        };

        info!("BLE: advertising as '{}'", name);
        peripheral.advertise().map_err(SetupError::AdvertiseStart)?;

        Ok(peripheral)
    }

    /// Handle one stack event.
    ///
    /// The sole mutation path for session state. Runs to completion before
    /// the next event is dispatched; nothing here fails loudly.
    pub fn on_event(&mut self, event: StackEvent) {
        match event {
            StackEvent::CentralConnect { conn } => {
                info!("BLE: central {} connected", conn);
                if self.connections.insert(conn).is_err() {
                    warn!("BLE: connection table full, not tracking {}", conn);
                }
                if self.session_config.policy == AdvertisingPolicy::SuspendWhileConnected {
                    let _ = self.stack.gap_advertise_stop();
                }
            }
            StackEvent::CentralDisconnect { conn } => {
                // Duplicate disconnects are tolerated, not errors
                self.connections.remove(&conn);
                info!("BLE: central {} disconnected", conn);
                let rearm = match self.session_config.policy {
                    AdvertisingPolicy::Concurrent => true,
                    AdvertisingPolicy::SuspendWhileConnected => self.connections.is_empty(),
                };
                if rearm && self.advertise().is_err() {
                    warn!("BLE: failed to re-arm advertising");
                }
            }
            StackEvent::GattsWrite { conn: _, attr } => {
                // Writes to anything but the RX characteristic are tolerated
                // and dropped
                if attr != self.handles.rx {
                    return;
                }
                let mut buf = [0u8; MAX_PAYLOAD_LEN];
                let len = match self.stack.gatts_read_local(attr, &mut buf) {
                    Ok(len) => len,
                    Err(_) => return,
                };
                debug!("BLE: received {} bytes", len);
                if let Some(callback) = self.write_callback.as_mut() {
                    callback(&buf[..len]);
                }
            }
            StackEvent::Unknown { id } => {
                debug!("BLE: ignoring unknown stack event {}", id);
            }
        }
    }

    /// Notify `data` on the TX characteristic to every connected central.
    ///
    /// Best-effort: per-connection failures are not retried or reported, and
    /// an empty connection table makes this a no-op.
    pub fn send(&mut self, data: &[u8]) {
        for conn in self.connections.iter() {
            let _ = self.stack.gatts_notify(*conn, self.handles.tx, data);
        }
    }

    /// Whether any central is currently connected.
    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Number of currently connected centrals.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Replace the application write handler. Only one handler is active at
    /// a time.
    pub fn set_write_callback(&mut self, callback: &'cb mut (dyn FnMut(&[u8]) + 'cb)) {
        self.write_callback = Some(callback);
    }

    /// The cached advertising payload.
    pub fn adv_payload(&self) -> &[u8] {
        &self.adv_payload
    }

    /// The registered TX/RX attribute handles.
    pub fn handles(&self) -> ServiceHandles {
        self.handles
    }

    /// Access the underlying stack.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Mutable access to the underlying stack, for bindings that mirror
    /// state into it.
    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Issue the start-advertising command with the cached payload.
    fn advertise(&mut self) -> Result<(), RadioError> {
        self.stack
            .gap_advertise(self.session_config.adv_interval_us, &self.adv_payload)
    }
}
