//! Radio-stack trait for abstraction and testability
//!
//! This trait defines the capability surface the session manager needs from
//! the underlying BLE stack, allowing the hardware binding to be swapped
//! with a mock for testing. Every method is fire-and-forget: commands are
//! issued to the stack and the radio-level outcome is reported (or not)
//! outside this interface.

use crate::ble::events::{AttributeHandle, ConnectionHandle};
use crate::ble::service::{ServiceHandles, UartServiceDef};

/// Errors that can occur when issuing stack commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The GATT table cannot hold the service (resource exhaustion)
    TableFull,
    /// The attribute handle does not address a registered value
    InvalidHandle,
    /// The notify command was rejected or could not be queued
    NotifyFailed,
    /// The advertising command was rejected
    AdvertiseFailed,
}

/// Abstract BLE radio-stack interface
///
/// The session manager drives the radio exclusively through this trait; the
/// stack reports back through [`StackEvent`]s handed to
/// [`UartPeripheral::on_event`].
///
/// [`StackEvent`]: crate::ble::events::StackEvent
/// [`UartPeripheral::on_event`]: crate::ble::peripheral::UartPeripheral::on_event
pub trait RadioStack {
    /// Power the radio. Idempotent; returns false if the radio cannot be
    /// brought up.
    fn activate(&mut self) -> bool;

    /// Register the UART service, returning the TX/RX attribute handles.
    fn register_uart_service(
        &mut self,
        service: &UartServiceDef,
    ) -> Result<ServiceHandles, RadioError>;

    /// Push `data` as a notification of `attr` to one connected central.
    fn gatts_notify(
        &mut self,
        conn: ConnectionHandle,
        attr: AttributeHandle,
        data: &[u8],
    ) -> Result<(), RadioError>;

    /// Read the current value of a local attribute into `buf`, returning the
    /// value length. Used to fetch the just-written value on a write event.
    fn gatts_read_local(
        &self,
        attr: AttributeHandle,
        buf: &mut [u8],
    ) -> Result<usize, RadioError>;

    /// Start (or restart) advertising with the given raw payload. Safe to
    /// call while already advertising.
    fn gap_advertise(&mut self, interval_us: u32, adv_data: &[u8]) -> Result<(), RadioError>;

    /// Stop advertising. A no-op if advertising is not running.
    fn gap_advertise_stop(&mut self) -> Result<(), RadioError>;
}

#[cfg(test)]
pub mod mock {
    //! Mock radio stack for testing

    use super::*;
    use crate::ble::service::MAX_PAYLOAD_LEN;
    use core::cell::RefCell;
    use heapless::Vec;

    /// Attribute handles the mock hands out at registration
    pub const TX_HANDLE: AttributeHandle = 3;
    pub const RX_HANDLE: AttributeHandle = 6;

    /// One recorded notify command
    pub type NotifyRecord = (ConnectionHandle, AttributeHandle, Vec<u8, MAX_PAYLOAD_LEN>);

    /// One recorded advertise command
    pub type AdvertiseRecord = (u32, Vec<u8, 31>);

    /// Mock radio stack for unit testing
    ///
    /// Records every command so tests can assert on exact sequences, and
    /// holds a small attribute store backing `gatts_read_local`.
    pub struct MockRadioStack {
        /// Whether activate() has succeeded
        active: RefCell<bool>,
        /// Service definition captured at registration
        registered: RefCell<Option<UartServiceDef>>,
        /// Local attribute store: (handle, value)
        values: RefCell<Vec<(AttributeHandle, Vec<u8, MAX_PAYLOAD_LEN>), 4>>,
        /// Record of notify commands
        notify_log: RefCell<Vec<NotifyRecord, 16>>,
        /// Record of advertise commands
        adv_log: RefCell<Vec<AdvertiseRecord, 16>>,
        /// Number of advertise-stop commands
        adv_stops: RefCell<usize>,
        /// Make activate() fail
        refuse_activation: RefCell<bool>,
        /// Error to return on the next registration
        next_register_error: RefCell<Option<RadioError>>,
        /// Error to return on the next notify
        next_notify_error: RefCell<Option<RadioError>>,
        /// Error to return on the next advertise
        next_advertise_error: RefCell<Option<RadioError>>,
    }

    impl MockRadioStack {
        /// Create a new mock stack
        pub fn new() -> Self {
            Self {
                active: RefCell::new(false),
                registered: RefCell::new(None),
                values: RefCell::new(Vec::new()),
                notify_log: RefCell::new(Vec::new()),
                adv_log: RefCell::new(Vec::new()),
                adv_stops: RefCell::new(0),
                refuse_activation: RefCell::new(false),
                next_register_error: RefCell::new(None),
                next_notify_error: RefCell::new(None),
                next_advertise_error: RefCell::new(None),
            }
        }

        /// Make activate() fail
        pub fn refuse_activation(&self) {
            *self.refuse_activation.borrow_mut() = true;
        }

        /// Set an error to be returned by the next register call
        pub fn set_next_register_error(&self, error: RadioError) {
            *self.next_register_error.borrow_mut() = Some(error);
        }

        /// Set an error to be returned by the next notify call
        pub fn set_next_notify_error(&self, error: RadioError) {
            *self.next_notify_error.borrow_mut() = Some(error);
        }

        /// Set an error to be returned by the next advertise call
        pub fn set_next_advertise_error(&self, error: RadioError) {
            *self.next_advertise_error.borrow_mut() = Some(error);
        }

        /// Place a value in the local attribute store, as the stack does when
        /// a central writes
        pub fn set_local_value(&self, attr: AttributeHandle, data: &[u8]) {
            let mut values = self.values.borrow_mut();
            if let Some(entry) = values.iter_mut().find(|(h, _)| *h == attr) {
                entry.1.clear();
                let _ = entry.1.extend_from_slice(data);
            } else {
                let mut value = Vec::new();
                let _ = value.extend_from_slice(data);
                let _ = values.push((attr, value));
            }
        }

        /// Whether the radio has been activated
        pub fn is_active(&self) -> bool {
            *self.active.borrow()
        }

        /// The service definition captured at registration
        pub fn registered_service(&self) -> Option<UartServiceDef> {
            *self.registered.borrow()
        }

        /// All notify commands issued so far
        pub fn notifications(&self) -> Vec<NotifyRecord, 16> {
            self.notify_log.borrow().clone()
        }

        /// All advertise commands issued so far
        pub fn advertisements(&self) -> Vec<AdvertiseRecord, 16> {
            self.adv_log.borrow().clone()
        }

        /// Number of advertise-stop commands issued so far
        pub fn advertise_stops(&self) -> usize {
            *self.adv_stops.borrow()
        }
    }

    impl Default for MockRadioStack {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RadioStack for MockRadioStack {
        fn activate(&mut self) -> bool {
            if *self.refuse_activation.borrow() {
                return false;
            }
            *self.active.borrow_mut() = true;
            true
        }

        fn register_uart_service(
            &mut self,
            service: &UartServiceDef,
        ) -> Result<ServiceHandles, RadioError> {
            if let Some(error) = self.next_register_error.borrow_mut().take() {
                return Err(error);
            }
            *self.registered.borrow_mut() = Some(*service);
            Ok(ServiceHandles {
                tx: TX_HANDLE,
                rx: RX_HANDLE,
            })
        }

        fn gatts_notify(
            &mut self,
            conn: ConnectionHandle,
            attr: AttributeHandle,
            data: &[u8],
        ) -> Result<(), RadioError> {
            if let Some(error) = self.next_notify_error.borrow_mut().take() {
                return Err(error);
            }
            let mut payload = Vec::new();
            payload
                .extend_from_slice(data)
                .map_err(|_| RadioError::NotifyFailed)?;
            let _ = self.notify_log.borrow_mut().push((conn, attr, payload));
            Ok(())
        }

        fn gatts_read_local(
            &self,
            attr: AttributeHandle,
            buf: &mut [u8],
        ) -> Result<usize, RadioError> {
            let values = self.values.borrow();
            let entry = values
                .iter()
                .find(|(h, _)| *h == attr)
                .ok_or(RadioError::InvalidHandle)?;
            let len = entry.1.len().min(buf.len());
            buf[..len].copy_from_slice(&entry.1[..len]);
            Ok(len)
        }

        fn gap_advertise(&mut self, interval_us: u32, adv_data: &[u8]) -> Result<(), RadioError> {
            if let Some(error) = self.next_advertise_error.borrow_mut().take() {
                return Err(error);
            }
            let mut payload = Vec::new();
            payload
                .extend_from_slice(adv_data)
                .map_err(|_| RadioError::AdvertiseFailed)?;
            let _ = self.adv_log.borrow_mut().push((interval_us, payload));
            Ok(())
        }

        fn gap_advertise_stop(&mut self) -> Result<(), RadioError> {
            *self.adv_stops.borrow_mut() += 1;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_records_notifications() {
            let mut stack = MockRadioStack::new();

            stack.gatts_notify(1, TX_HANDLE, b"hello").unwrap();
            stack.gatts_notify(2, TX_HANDLE, b"world").unwrap();

            let log = stack.notifications();
            assert_eq!(log.len(), 2);
            assert_eq!(log[0].0, 1);
            assert_eq!(log[0].2.as_slice(), b"hello");
            assert_eq!(log[1].0, 2);
            assert_eq!(log[1].2.as_slice(), b"world");
        }

        #[test]
        fn test_mock_read_local_roundtrip() {
            let stack = MockRadioStack::new();
            stack.set_local_value(RX_HANDLE, b"led_on");

            let mut buf = [0u8; MAX_PAYLOAD_LEN];
            let len = stack.gatts_read_local(RX_HANDLE, &mut buf).unwrap();
            assert_eq!(&buf[..len], b"led_on");

            // Overwriting replaces the stored value
            stack.set_local_value(RX_HANDLE, b"led_off");
            let len = stack.gatts_read_local(RX_HANDLE, &mut buf).unwrap();
            assert_eq!(&buf[..len], b"led_off");
        }

        #[test]
        fn test_mock_read_unknown_handle() {
            let stack = MockRadioStack::new();
            let mut buf = [0u8; 8];
            assert_eq!(
                stack.gatts_read_local(0x42, &mut buf),
                Err(RadioError::InvalidHandle)
            );
        }

        #[test]
        fn test_mock_injected_error_is_one_shot() {
            let mut stack = MockRadioStack::new();
            stack.set_next_notify_error(RadioError::NotifyFailed);

            assert_eq!(
                stack.gatts_notify(1, TX_HANDLE, b"x"),
                Err(RadioError::NotifyFailed)
            );

            // Error should be cleared, next call should succeed
            stack.gatts_notify(1, TX_HANDLE, b"y").unwrap();
            assert_eq!(stack.notifications().len(), 1);
        }
    }
}
