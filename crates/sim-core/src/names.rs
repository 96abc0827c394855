//! Typed catalog of channels, registers, and ports with family-aware names.
//!
//! The register space is keyed by plain strings; everything inside the crate
//! goes through this module to render those strings, so a register can only
//! be reached under its canonical spelling.

use std::str::FromStr;

use thiserror::Error;

/// Main clock prescaler control register name.
pub const CLKCTRL_MCLKCTRLB: &str = "CLKCTRL_MCLKCTRLB";
/// USART pin routing register name.
pub const PORTMUX_USARTROUTEA: &str = "PORTMUX_USARTROUTEA";
/// Configuration change protection register name.
pub const CPU_CCP: &str = "CPU_CCP";

/// Register naming families the simulator can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UsartFamily {
    /// megaAVR 0-series layout: `USARTn_*` registers and a 16-bit `BAUD`.
    #[default]
    ZeroSeries,
    /// Classic AVR layout: `UCSRnA/B/C`, a shared `UDRn`, and `UBRRn`.
    Classic,
}

/// Error returned when a register-family spelling is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown register family {0:?} (expected 0series or classic)")]
pub struct FamilyParseError(String);

impl FromStr for UsartFamily {
    type Err = FamilyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0series" | "zero-series" | "mega0" => Ok(Self::ZeroSeries),
            "classic" => Ok(Self::Classic),
            _ => Err(FamilyParseError(s.to_owned())),
        }
    }
}

/// One of the four emulated USART channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Channel {
    /// Channel 0.
    Usart0 = 0,
    /// Channel 1.
    Usart1 = 1,
    /// Channel 2.
    Usart2 = 2,
    /// Channel 3.
    Usart3 = 3,
}

impl Channel {
    /// All channels in index order.
    pub const ALL: [Self; 4] = [Self::Usart0, Self::Usart1, Self::Usart2, Self::Usart3];

    /// Returns the channel number used in register names.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Converts a channel number back into a channel.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Usart0),
            1 => Some(Self::Usart1),
            2 => Some(Self::Usart2),
            3 => Some(Self::Usart3),
            _ => None,
        }
    }

    /// Renders the channel's 16-bit baud divisor register name.
    #[must_use]
    pub fn baud_name(self, family: UsartFamily) -> String {
        match family {
            UsartFamily::ZeroSeries => format!("USART{}_BAUD", self.index()),
            UsartFamily::Classic => format!("UBRR{}", self.index()),
        }
    }
}

/// Error returned when a channel spelling is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown usart channel {0:?} (expected 0-3)")]
pub struct ChannelParseError(String);

impl FromStr for Channel {
    type Err = ChannelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digit = trimmed
            .strip_prefix("usart")
            .or_else(|| trimmed.strip_prefix("USART"))
            .unwrap_or(trimmed);
        match digit {
            "0" => Ok(Self::Usart0),
            "1" => Ok(Self::Usart1),
            "2" => Ok(Self::Usart2),
            "3" => Ok(Self::Usart3),
            _ => Err(ChannelParseError(s.to_owned())),
        }
    }
}

/// 8-bit USART registers addressable per channel.
///
/// The classic family folds several of these onto shared hardware registers:
/// `RxData` and `TxData` both land on `UDRn`, and `CtrlA`/`CtrlB` both land
/// on `UCSRnB`. Rendering them through here keeps that aliasing exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UsartRegister {
    /// Receive data register.
    RxData,
    /// Transmit data register.
    TxData,
    /// Status flags register.
    Status,
    /// Interrupt-enable control register.
    CtrlA,
    /// Receiver/transmitter-enable control register.
    CtrlB,
    /// Frame format control register.
    CtrlC,
}

impl UsartRegister {
    /// Renders the register's name for `family` and `channel`.
    #[must_use]
    pub fn name(self, family: UsartFamily, channel: Channel) -> String {
        let n = channel.index();
        match family {
            UsartFamily::ZeroSeries => {
                let suffix = match self {
                    Self::RxData => "RXDATAL",
                    Self::TxData => "TXDATAL",
                    Self::Status => "STATUS",
                    Self::CtrlA => "CTRLA",
                    Self::CtrlB => "CTRLB",
                    Self::CtrlC => "CTRLC",
                };
                format!("USART{n}_{suffix}")
            }
            UsartFamily::Classic => match self {
                Self::RxData | Self::TxData => format!("UDR{n}"),
                Self::Status => format!("UCSR{n}A"),
                Self::CtrlA | Self::CtrlB => format!("UCSR{n}B"),
                Self::CtrlC => format!("UCSR{n}C"),
            },
        }
    }
}

/// GPIO port identifiers used for pin-direction registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Port {
    /// Port A.
    A,
    /// Port B.
    B,
    /// Port C.
    C,
    /// Port D.
    D,
    /// Port E.
    E,
    /// Port F.
    F,
}

impl Port {
    /// Returns the port letter used in register names.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
        }
    }

    /// Renders the port's pin-direction register name.
    #[must_use]
    pub fn dir_name(self) -> String {
        format!("PORT{}_DIR", self.letter())
    }
}
