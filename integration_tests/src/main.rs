//! Integration tests for the BLE UART firmware.
//!
//! Run after flashing the firmware. Requires a host Bluetooth adapter;
//! the device advertises as "ESP32S3-XXXXXX".

mod ble_client;
mod tests;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use ble_client::BleClient;
use tests::TestResult;

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the BLE UART firmware")]
struct Args {
    /// BLE device name prefix to scan for
    #[arg(long, default_value = "ESP32S3-")]
    ble_name: String,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,
}

fn announce(name: &str) {
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();
}

fn report(result: &TestResult) {
    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(message) = &result.message {
            println!("    {}", message.red());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let scan_timeout = Duration::from_secs(args.scan_timeout);

    println!("{}", "BLE UART Integration Tests".bold());
    println!("Scanning for \"{}\"...", args.ble_name);

    let client = BleClient::connect_by_name(&args.ble_name, scan_timeout).await?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let mut results: Vec<TestResult> = Vec::new();

    announce("led_on acknowledged");
    let result = TestResult::from(
        "led_on acknowledged",
        tests::test_led_on_ack(&client).await,
    );
    report(&result);
    results.push(result);

    announce("led_off acknowledged");
    let result = TestResult::from(
        "led_off acknowledged",
        tests::test_led_off_ack(&client).await,
    );
    report(&result);
    results.push(result);

    announce("newline-terminated command accepted");
    let result = TestResult::from(
        "newline-terminated command accepted",
        tests::test_newline_terminated_command(&client).await,
    );
    report(&result);
    results.push(result);

    announce("unknown command is silent");
    let result = TestResult::from(
        "unknown command is silent",
        tests::test_unknown_command_is_silent(&client).await,
    );
    report(&result);
    results.push(result);

    announce("reconnect after disconnect");
    let reconnect =
        tests::test_reconnect_after_disconnect(client, &args.ble_name, scan_timeout).await;
    let result = match &reconnect {
        Ok(_) => TestResult {
            name: "reconnect after disconnect".to_string(),
            passed: true,
            message: None,
        },
        Err(e) => TestResult {
            name: "reconnect after disconnect".to_string(),
            passed: false,
            message: Some(e.to_string()),
        },
    };
    report(&result);
    results.push(result);

    if let Ok(client) = reconnect {
        let _ = client.disconnect().await;
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    println!();
    println!(
        "{} passed, {} failed",
        passed.to_string().green().bold(),
        failed.to_string().red().bold()
    );

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
