//! BLE host task
//!
//! Runs the trouble-host stack and owns the [`UartPeripheral`] session. The
//! session is touched from exactly one execution context — this task —
//! which serialises stack events against application calls. Application
//! code reaches the session through [`send`] and [`is_connected`]; the
//! session reaches the radio by queueing commands this loop executes with
//! trouble-host primitives.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::{Channel, Sender};
use heapless::Vec;
use log::{debug, info};
use trouble_host::prelude::*;

use crate::ble::events::{AttributeHandle, ConnectionHandle, StackEvent};
use crate::ble::nus::NordicUartService;
use crate::ble::peripheral::{SessionConfig, UartPeripheral};
use crate::ble::service::{ServiceHandles, UartServiceDef, MAX_PAYLOAD_LEN};
use crate::ble::stack::{RadioError, RadioStack};
use crate::commands::UartCommand;
use crate::tasks::led::{LedCommand, LED_CHANNEL};

/// Device name prefix for BLE advertising
const DEVICE_NAME_PREFIX: &str = "ESP32S3-";

/// Format device ID bytes as uppercase hex into a buffer
/// Returns the formatted string slice
fn format_device_name<'a>(buf: &'a mut [u8; 16], device_id: &[u8; 3]) -> &'a str {
    const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";
    let prefix = DEVICE_NAME_PREFIX.as_bytes();

    buf[..prefix.len()].copy_from_slice(prefix);

    // Format 3 bytes as 6 hex characters
    let mut pos = prefix.len();
    for &byte in device_id {
        buf[pos] = HEX_CHARS[(byte >> 4) as usize];
        buf[pos + 1] = HEX_CHARS[(byte & 0x0F) as usize];
        pos += 2;
    }

    // All bytes are ASCII, so this will always succeed
    core::str::from_utf8(&buf[..pos]).unwrap_or(DEVICE_NAME_PREFIX)
}

/// Number of maximum concurrent connections
const CONNECTIONS_MAX: usize = 1;
/// Number of L2CAP channels
const L2CAP_CHANNELS_MAX: usize = 3;

/// Depth of the outbound notification queue
const OUTBOUND_DEPTH: usize = 4;
/// Depth of the radio command queue
const COMMAND_DEPTH: usize = 8;

/// Payloads queued by application code for notification to the central
static OUTBOUND_CHANNEL: Channel<
    CriticalSectionRawMutex,
    Vec<u8, MAX_PAYLOAD_LEN>,
    OUTBOUND_DEPTH,
> = Channel::new();

/// Radio commands issued by the session, executed by the host loop
static RADIO_COMMANDS: Channel<CriticalSectionRawMutex, RadioCommand, COMMAND_DEPTH> =
    Channel::new();

/// Connection state mirrored out of the session for application queries
static CONNECTED: Mutex<CriticalSectionRawMutex, Cell<bool>> = Mutex::new(Cell::new(false));

/// Whether any central is currently connected.
pub fn is_connected() -> bool {
    CONNECTED.lock(|cell| cell.get())
}

/// Queue `data` for notification on the TX characteristic.
///
/// A no-op returning false when no central is connected or the queue is
/// full; payloads are truncated to [`MAX_PAYLOAD_LEN`].
pub fn send(data: &[u8]) -> bool {
    if !is_connected() {
        return false;
    }
    let len = data.len().min(MAX_PAYLOAD_LEN);
    let mut payload = Vec::new();
    if payload.extend_from_slice(&data[..len]).is_err() {
        return false;
    }
    OUTBOUND_CHANNEL.try_send(payload).is_ok()
}

/// A fire-and-forget command from the session to the radio
enum RadioCommand {
    Notify {
        conn: ConnectionHandle,
        attr: AttributeHandle,
        data: Vec<u8, MAX_PAYLOAD_LEN>,
    },
    /// Advertising re-arm request; satisfied when the host loop cycles back
    /// to its advertise step
    Advertise,
    StopAdvertising,
}

/// [`RadioStack`] implementation bridging the session to trouble-host.
///
/// Registration hands back the handles the attribute server already
/// assigned; notify and advertise turn into queued commands; the RX mirror
/// backs the session's read-back of values the central wrote.
struct ChannelRadio {
    handles: ServiceHandles,
    rx_value: Vec<u8, MAX_PAYLOAD_LEN>,
    commands: Sender<'static, CriticalSectionRawMutex, RadioCommand, COMMAND_DEPTH>,
}

impl ChannelRadio {
    fn new(handles: ServiceHandles) -> Self {
        Self {
            handles,
            rx_value: Vec::new(),
            commands: RADIO_COMMANDS.sender(),
        }
    }

    /// Mirror the value a central just wrote, as the stack's attribute store
    /// holds it
    fn note_rx_write(&mut self, data: &[u8]) {
        let len = data.len().min(MAX_PAYLOAD_LEN);
        self.rx_value.clear();
        let _ = self.rx_value.extend_from_slice(&data[..len]);
    }
}

impl RadioStack for ChannelRadio {
    fn activate(&mut self) -> bool {
        // The controller is brought up in main before this task runs
        true
    }

    fn register_uart_service(
        &mut self,
        _service: &UartServiceDef,
    ) -> Result<ServiceHandles, RadioError> {
        Ok(self.handles)
    }

    fn gatts_notify(
        &mut self,
        conn: ConnectionHandle,
        attr: AttributeHandle,
        data: &[u8],
    ) -> Result<(), RadioError> {
        let mut payload = Vec::new();
        payload
            .extend_from_slice(data)
            .map_err(|_| RadioError::NotifyFailed)?;
        self.commands
            .try_send(RadioCommand::Notify {
                conn,
                attr,
                data: payload,
            })
            .map_err(|_| RadioError::NotifyFailed)
    }

    fn gatts_read_local(
        &self,
        attr: AttributeHandle,
        buf: &mut [u8],
    ) -> Result<usize, RadioError> {
        if attr != self.handles.rx {
            return Err(RadioError::InvalidHandle);
        }
        let len = self.rx_value.len().min(buf.len());
        buf[..len].copy_from_slice(&self.rx_value[..len]);
        Ok(len)
    }

    fn gap_advertise(&mut self, _interval_us: u32, _adv_data: &[u8]) -> Result<(), RadioError> {
        self.commands
            .try_send(RadioCommand::Advertise)
            .map_err(|_| RadioError::AdvertiseFailed)
    }

    fn gap_advertise_stop(&mut self) -> Result<(), RadioError> {
        self.commands
            .try_send(RadioCommand::StopAdvertising)
            .map_err(|_| RadioError::AdvertiseFailed)
    }
}

/// BLE GATT server with the Nordic UART Service
#[gatt_server(mutex_type = CriticalSectionRawMutex)]
struct Server {
    nus: NordicUartService,
}

/// Main BLE task that manages the Bluetooth stack and the UART session
///
/// This task:
/// 1. Initialises the BLE host and GATT server
/// 2. Advertises as "ESP32S3-XXXXXX" (unique per device)
/// 3. Feeds connection and write events into the session
/// 4. Routes received commands to the LED task and acknowledges them
pub async fn ble_task<C: Controller>(controller: C, device_id: [u8; 3]) {
    // Generate unique device name from chip ID
    let mut device_name_buf = [0u8; 16];
    let device_name = format_device_name(&mut device_name_buf, &device_id);

    info!("BLE: starting as '{}'", device_name);

    // Create BLE host resources
    let mut resources: HostResources<DefaultPacketPool, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX> =
        HostResources::new();

    // Build the BLE stack with address derived from device ID
    let stack = trouble_host::new(controller, &mut resources).set_random_address(Address::random([
        device_id[0],
        device_id[1],
        device_id[2],
        0x7A, 0xC4, 0xE9,
    ]));

    let Host {
        mut peripheral,
        mut runner,
        ..
    } = stack.build();

    // Create GATT server with GAP configuration
    let gap = GapConfig::Peripheral(PeripheralConfig {
        name: device_name,
        appearance: &appearance::UNKNOWN,
    });
    let server: Server = match Server::new_with_config(gap) {
        Ok(server) => server,
        Err(_) => return,
    };

    let radio = ChannelRadio::new(ServiceHandles {
        tx: server.nus.tx.handle,
        rx: server.nus.rx.handle,
    });

    // Application write handler: drive the LED and acknowledge the command
    let mut on_write = |data: &[u8]| match UartCommand::parse(data) {
        Some(command) => {
            let _ = LED_CHANNEL.sender().try_send(LedCommand::from(command));
            let _ = send(command.ack());
        }
        None => debug!("BLE: ignoring unrecognised command"),
    };

    let mut session = match UartPeripheral::new(radio, device_name, SessionConfig::default()) {
        Ok(session) => session,
        Err(_) => return,
    };
    session.set_write_callback(&mut on_write);

    // The session caches the payload; copy it out for the advertiser
    let mut adv_data = [0u8; 31];
    let adv_len = session.adv_payload().len();
    adv_data[..adv_len].copy_from_slice(session.adv_payload());

    let runner_task = runner.run();

    let session_task = async {
        let mut conn_counter: ConnectionHandle = 0;

        loop {
            CONNECTED.lock(|cell| cell.set(false));

            // Anything queued with no central listening is dropped, and
            // advertising re-arm requests are satisfied by the advertise
            // call below
            while OUTBOUND_CHANNEL.try_receive().is_ok() {}
            while RADIO_COMMANDS.try_receive().is_ok() {}

            debug!("BLE: advertising...");
            let advertiser = match peripheral
                .advertise(
                    &Default::default(),
                    Advertisement::ConnectableScannableUndirected {
                        adv_data: &adv_data[..adv_len],
                        scan_data: &[],
                    },
                )
                .await
            {
                Ok(advertiser) => advertiser,
                Err(_) => continue,
            };

            // Wait for connection
            let acceptor = match advertiser.accept().await {
                Ok(acceptor) => acceptor,
                Err(_) => continue,
            };

            // Attach to attribute server (using Deref to get &AttributeServer)
            let conn = match acceptor.with_attribute_server(&*server) {
                Ok(conn) => conn,
                Err(_) => continue,
            };

            conn_counter = conn_counter.wrapping_add(1);
            let conn_id = conn_counter;
            session.on_event(StackEvent::CentralConnect { conn: conn_id });
            CONNECTED.lock(|cell| cell.set(session.is_connected()));

            loop {
                let gatt_future = conn.next();
                let outbound_future = OUTBOUND_CHANNEL.receive();

                match embassy_futures::select::select(gatt_future, outbound_future).await {
                    embassy_futures::select::Either::First(event) => match event {
                        GattConnectionEvent::Disconnected { reason: _ } => {
                            session.on_event(StackEvent::CentralDisconnect { conn: conn_id });
                            break;
                        }
                        GattConnectionEvent::Gatt { event } => match event {
                            GattEvent::Write(write_event) => {
                                let attr = write_event.handle();
                                if attr == server.nus.rx.handle {
                                    session.stack_mut().note_rx_write(write_event.data());
                                }
                                session.on_event(StackEvent::GattsWrite {
                                    conn: conn_id,
                                    attr,
                                });
                                // Accept the write
                                let _ = write_event.accept();
                            }
                            GattEvent::Read(read_event) => {
                                let _ = read_event.accept();
                            }
                            GattEvent::Other(other_event) => {
                                let _ = other_event.accept();
                            }
                        },
                        _ => {}
                    },
                    embassy_futures::select::Either::Second(payload) => {
                        session.send(&payload);
                    }
                }

                // Execute the radio commands the session just issued
                while let Ok(command) = RADIO_COMMANDS.try_receive() {
                    match command {
                        RadioCommand::Notify { data, .. } => {
                            let mut tx_buf = [0u8; MAX_PAYLOAD_LEN];
                            let len = data.len().min(tx_buf.len());
                            tx_buf[..len].copy_from_slice(&data[..len]);
                            let _ = server.nus.tx.notify(&conn, &tx_buf).await;
                        }
                        // The single-connection build stops advertising on
                        // accept and re-arms when the outer loop cycles
                        RadioCommand::Advertise | RadioCommand::StopAdvertising => {}
                    }
                }
            }

            CONNECTED.lock(|cell| cell.set(session.is_connected()));
        }
    };

    embassy_futures::select::select(runner_task, session_task).await;
}
