//! Text commands accepted over the UART service
//!
//! Centrals write short text commands to the RX characteristic; recognised
//! commands drive the LED and are acknowledged with a notification.
//! Anything else is ignored.

/// A recognised application command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartCommand {
    /// Turn the LED on (`led_on`)
    LedOn,
    /// Turn the LED off (`led_off`)
    LedOff,
}

impl UartCommand {
    /// Parse a received payload into a command.
    ///
    /// Exact byte match; a trailing CR/LF from terminal-style centrals is
    /// tolerated. Returns `None` for anything unrecognised.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut trimmed = data;
        while let [rest @ .., last] = trimmed {
            if *last == b'\r' || *last == b'\n' {
                trimmed = rest;
            } else {
                break;
            }
        }

        match trimmed {
            b"led_on" => Some(Self::LedOn),
            b"led_off" => Some(Self::LedOff),
            _ => None,
        }
    }

    /// Acknowledgement bytes notified back to the central.
    pub fn ack(&self) -> &'static [u8] {
        match self {
            Self::LedOn => b"led_on ok",
            Self::LedOff => b"led_off ok",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_led_on() {
        assert_eq!(UartCommand::parse(b"led_on"), Some(UartCommand::LedOn));
    }

    #[test]
    fn test_parse_led_off() {
        assert_eq!(UartCommand::parse(b"led_off"), Some(UartCommand::LedOff));
    }

    #[test]
    fn test_parse_tolerates_trailing_newline() {
        assert_eq!(UartCommand::parse(b"led_on\n"), Some(UartCommand::LedOn));
        assert_eq!(UartCommand::parse(b"led_off\r\n"), Some(UartCommand::LedOff));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(UartCommand::parse(b"led_dim"), None);
        assert_eq!(UartCommand::parse(b"LED_ON"), None);
        assert_eq!(UartCommand::parse(b""), None);
        assert_eq!(UartCommand::parse(b"led_on extra"), None);
    }

    #[test]
    fn test_ack_names_the_command() {
        assert_eq!(UartCommand::LedOn.ack(), b"led_on ok");
        assert_eq!(UartCommand::LedOff.ack(), b"led_off ok");
    }
}
