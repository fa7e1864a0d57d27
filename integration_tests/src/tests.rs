//! Integration test cases.

use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::ble_client::BleClient;

/// Timeout for an acknowledgement notification
const ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to listen when no notification is expected
const QUIET_PERIOD: Duration = Duration::from_millis(750);

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: Some(message.to_string()),
        }
    }

    fn from(name: &str, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::pass(name),
            Err(e) => Self::fail(name, &e.to_string()),
        }
    }
}

/// Send a command and assert the acknowledgement bytes.
async fn expect_ack(client: &BleClient, command: &[u8], ack: &[u8]) -> Result<()> {
    client.clear_notifications().await;
    client.send_command(command).await?;

    let response = client.wait_for_notification(ACK_TIMEOUT).await?;
    if response != ack {
        return Err(anyhow!(
            "Expected ack {:?}, got {:?}",
            String::from_utf8_lossy(ack),
            String::from_utf8_lossy(&response)
        ));
    }
    Ok(())
}

/// led_on is acknowledged.
pub async fn test_led_on_ack(client: &BleClient) -> Result<()> {
    expect_ack(client, b"led_on", b"led_on ok").await
}

/// led_off is acknowledged.
pub async fn test_led_off_ack(client: &BleClient) -> Result<()> {
    expect_ack(client, b"led_off", b"led_off ok").await
}

/// A trailing newline (terminal-style central) is tolerated.
pub async fn test_newline_terminated_command(client: &BleClient) -> Result<()> {
    expect_ack(client, b"led_on\n", b"led_on ok").await
}

/// Unrecognised commands are ignored, not answered.
pub async fn test_unknown_command_is_silent(client: &BleClient) -> Result<()> {
    client.clear_notifications().await;
    client.send_command(b"led_dim").await?;
    client.expect_silence(QUIET_PERIOD).await
}

/// The device re-advertises after a disconnect and accepts a new connection.
pub async fn test_reconnect_after_disconnect(
    client: BleClient,
    name_prefix: &str,
    scan_timeout: Duration,
) -> Result<BleClient> {
    client.disconnect().await?;

    // Give the stack a moment to process the disconnect and re-arm
    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = BleClient::connect_by_name(name_prefix, scan_timeout).await?;
    expect_ack(&client, b"led_off", b"led_off ok").await?;
    Ok(client)
}
