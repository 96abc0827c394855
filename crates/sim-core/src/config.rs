//! Board-level simulator configuration.

use std::path::PathBuf;

use crate::names::{Channel, Port, UsartFamily};

/// Default CPU core clock in hertz.
pub const DEFAULT_CLOCK_HZ: u32 = 16_000_000;
/// Default line rate in bits per second.
pub const DEFAULT_BAUD: u32 = 9_600;
/// Default percent chance, per status poll, that an in-flight transmit
/// completes.
pub const DEFAULT_COMPLETION_PERCENT: u8 = 4;
/// Default well-known file where the PTY peer path is published.
pub const DEFAULT_SLAVE_PATH_FILE: &str = "pty_slave.txt";

/// Everything the simulator needs to know about the emulated board.
///
/// The defaults describe the reference board: a 0-series part clocked at
/// 16 MHz talking 9600 baud over USART3 routed to its alternate pins,
/// PORTB pin 4 TX and pin 5 RX.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Register naming family the simulator presents.
    pub family: UsartFamily,
    /// Channel the firmware-facing driver talks to.
    pub channel: Channel,
    /// CPU core clock in hertz, the basis of the baud divisor.
    pub clock_hz: u32,
    /// Line rate in bits per second.
    pub baud: u32,
    /// Port carrying the TX pin.
    pub tx_port: Port,
    /// TX pin number within `tx_port`.
    pub tx_pin: u8,
    /// Port carrying the RX pin.
    pub rx_port: Port,
    /// RX pin number within `rx_port`.
    pub rx_pin: u8,
    /// Bits of the routing register that select this usart's pin route.
    pub route_mask: u8,
    /// Expected value of the masked routing bits.
    pub route_value: u8,
    /// Percent chance, per status poll, that an in-flight transmit
    /// completes.
    pub completion_percent: u8,
    /// File to publish the PTY peer path to, when set.
    pub slave_path_file: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            family: UsartFamily::ZeroSeries,
            channel: Channel::Usart3,
            clock_hz: DEFAULT_CLOCK_HZ,
            baud: DEFAULT_BAUD,
            tx_port: Port::B,
            tx_pin: 4,
            rx_port: Port::B,
            rx_pin: 5,
            route_mask: 0xC0,
            route_value: 0x40,
            completion_percent: DEFAULT_COMPLETION_PERCENT,
            slave_path_file: Some(PathBuf::from(DEFAULT_SLAVE_PATH_FILE)),
        }
    }
}

impl SimConfig {
    /// Computes the divisor firmware must program into the baud register.
    ///
    /// The 0-series fractional generator expects `8 * clock / (2 * baud)`;
    /// classic parts expect `clock / (16 * baud) - 1`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn baud_register_value(&self) -> u16 {
        let clock = u64::from(self.clock_hz);
        let baud = u64::from(self.baud).max(1);
        match self.family {
            UsartFamily::ZeroSeries => ((8 * clock) / (2 * baud)) as u16,
            UsartFamily::Classic => (clock / (16 * baud)).saturating_sub(1) as u16,
        }
    }

    /// Bit mask selecting the TX pin within its port, wrapping pin numbers
    /// at the 8-bit port width.
    #[must_use]
    pub const fn tx_pin_mask(&self) -> u8 {
        1 << (self.tx_pin & 7)
    }

    /// Bit mask selecting the RX pin within its port, wrapping pin numbers
    /// at the 8-bit port width.
    #[must_use]
    pub const fn rx_pin_mask(&self) -> u8 {
        1 << (self.rx_pin & 7)
    }
}
