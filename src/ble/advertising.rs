//! Advertising payload builder
//!
//! Pure encoder mapping a device name and service UUID list onto the raw
//! advertising data blob handed to the stack. The frame is a sequence of
//! AD structures (`[len][type][data...]`) and must fit the 31-byte legacy
//! advertising PDU.

use crate::ble::service::Uuid128;
use heapless::Vec;

/// Maximum legacy advertising payload length
pub const ADV_MAX_LEN: usize = 31;

/// AD structure types (Bluetooth Assigned Numbers, Common Data Types)
const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// Flags octet: LE General Discoverable, BR/EDR not supported
const ADV_FLAGS: u8 = 0x06;

/// Errors that can occur while encoding the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Name and UUID list do not fit the 31-byte frame
    TooLong,
}

/// Encode the advertising payload for `name` and `services`.
///
/// Field order matches what UART-service centrals expect to scan: flags,
/// complete local name, complete list of 128-bit service UUIDs
/// (little-endian). The result is immutable and intended to be cached and
/// reused verbatim on every advertise command.
pub fn advertising_payload(
    name: &str,
    services: &[Uuid128],
) -> Result<Vec<u8, ADV_MAX_LEN>, PayloadError> {
    let mut payload = Vec::new();

    append(&mut payload, AD_TYPE_FLAGS, &[ADV_FLAGS])?;
    if !name.is_empty() {
        append(&mut payload, AD_TYPE_NAME_COMPLETE, name.as_bytes())?;
    }
    for uuid in services {
        append(&mut payload, AD_TYPE_UUID128_COMPLETE, uuid.as_le_bytes())?;
    }

    Ok(payload)
}

/// Append one AD structure: length, type, data.
fn append(
    payload: &mut Vec<u8, ADV_MAX_LEN>,
    ad_type: u8,
    data: &[u8],
) -> Result<(), PayloadError> {
    payload
        .push(data.len() as u8 + 1)
        .map_err(|_| PayloadError::TooLong)?;
    payload.push(ad_type).map_err(|_| PayloadError::TooLong)?;
    payload
        .extend_from_slice(data)
        .map_err(|_| PayloadError::TooLong)?;
    Ok(())
}
