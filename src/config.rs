//! Hardware configuration constants for the ESP32-S3 board

/// LED pin (active high)
pub mod led {
    pub const PIN: u8 = 2;
}

/// BLE configuration
pub mod ble {
    /// Device name advertised to centrals
    pub const DEVICE_NAME: &str = "ESP32S3";

    /// Default advertising interval in microseconds
    pub const ADV_INTERVAL_US: u32 = 500_000;

    /// Connection table capacity (power of two for the index set)
    ///
    /// The stack never reports more simultaneous centrals than this on the
    /// target platform; overflow is logged and the connection untracked.
    pub const MAX_CONNECTIONS: usize = 4;
}
