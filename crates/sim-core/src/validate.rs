//! Configuration checks gating live serial transfer.
//!
//! A transfer only touches the line when the channel's registers hold the
//! values real hardware would need: matching baud divisor, sane pin
//! directions, and the family's enable and frame-format registers
//! programmed for asynchronous 8N1. Checks use raw reads so validation
//! never triggers emulation hooks.

use thiserror::Error;

use crate::bits;
use crate::config::SimConfig;
use crate::names::{Channel, UsartFamily, UsartRegister, CLKCTRL_MCLKCTRLB, PORTMUX_USARTROUTEA};
use crate::space::RegisterSpace;

/// Reason a channel's register programming was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConfigFault {
    /// Programmed baud divisor does not match the clock and line rate.
    #[error("baud divisor mismatch: expected {expected:#06x}, found {found:#06x}")]
    BaudMismatch {
        /// Divisor the clock and line rate call for.
        expected: u16,
        /// Divisor found in the baud register.
        found: u16,
    },
    /// RX pin is not configured as an input.
    #[error("rx pin is driven as an output")]
    RxPinDirection,
    /// TX pin is not configured as an output.
    #[error("tx pin is not driven as an output")]
    TxPinDirection,
    /// Pin routing does not select this usart's route.
    #[error("pin route mismatch: expected {expected:#04x}, found {found:#04x}")]
    RouteMismatch {
        /// Expected value of the masked routing bits.
        expected: u8,
        /// Routing register value found.
        found: u8,
    },
    /// Receiver/transmitter enables or mode bits are wrong.
    #[error("enable register not set for plain rx/tx operation: {found:#04x}")]
    EnableBits {
        /// Enable register value found.
        found: u8,
    },
    /// Frame format is not asynchronous 8N1.
    #[error("frame format is not asynchronous 8n1: {found:#04x}")]
    FrameFormat {
        /// Frame-format register value found.
        found: u8,
    },
    /// Main clock prescaler is enabled, so the baud math would be off.
    #[error("main clock prescaler enabled: {found:#04x}")]
    ClockPrescaler {
        /// Prescaler register value found.
        found: u8,
    },
    /// Double-speed or multi-processor bits are set.
    #[error("double-speed or multi-processor bits set: {found:#04x}")]
    SpeedMode {
        /// Status register value found.
        found: u8,
    },
}

/// Checks `channel`'s programmed registers against `config`.
///
/// # Errors
///
/// Returns the first mismatch, checking baud, pin directions, then the
/// family-specific control registers.
pub fn validate(
    space: &RegisterSpace,
    config: &SimConfig,
    channel: Channel,
) -> Result<(), ConfigFault> {
    let expected = config.baud_register_value();
    let found = space.cell16(&channel.baud_name(config.family)).raw_read();
    if found != expected {
        return Err(ConfigFault::BaudMismatch { expected, found });
    }

    let rx_dir = space.cell8(&config.rx_port.dir_name()).raw_read();
    if rx_dir & config.rx_pin_mask() != 0 {
        return Err(ConfigFault::RxPinDirection);
    }
    let tx_dir = space.cell8(&config.tx_port.dir_name()).raw_read();
    if tx_dir & config.tx_pin_mask() == 0 {
        return Err(ConfigFault::TxPinDirection);
    }

    match config.family {
        UsartFamily::ZeroSeries => validate_zero_series(space, config, channel),
        UsartFamily::Classic => validate_classic(space, config, channel),
    }
}

fn validate_zero_series(
    space: &RegisterSpace,
    config: &SimConfig,
    channel: Channel,
) -> Result<(), ConfigFault> {
    let route = space.cell8(PORTMUX_USARTROUTEA).raw_read();
    if route & config.route_mask != config.route_value {
        return Err(ConfigFault::RouteMismatch {
            expected: config.route_value,
            found: route,
        });
    }

    let enables = bits::CTRLB_RX_ENABLE | bits::CTRLB_TX_ENABLE;
    let ctrlb = space
        .cell8(&UsartRegister::CtrlB.name(config.family, channel))
        .raw_read();
    if ctrlb & enables != enables || ctrlb & bits::CTRLB_MODE_MASK != 0 {
        return Err(ConfigFault::EnableBits { found: ctrlb });
    }

    let ctrlc = space
        .cell8(&UsartRegister::CtrlC.name(config.family, channel))
        .raw_read();
    if ctrlc != bits::CTRLC_MODE_8N1_ASYNC {
        return Err(ConfigFault::FrameFormat { found: ctrlc });
    }

    let prescaler = space.cell8(CLKCTRL_MCLKCTRLB).raw_read();
    if prescaler != 0 {
        return Err(ConfigFault::ClockPrescaler { found: prescaler });
    }

    Ok(())
}

fn validate_classic(
    space: &RegisterSpace,
    config: &SimConfig,
    channel: Channel,
) -> Result<(), ConfigFault> {
    let ucsra = space
        .cell8(&UsartRegister::Status.name(config.family, channel))
        .raw_read();
    if ucsra & bits::UCSRA_SPEED_MODE_MASK != 0 {
        return Err(ConfigFault::SpeedMode { found: ucsra });
    }

    let enables = bits::UCSRB_RX_ENABLE | bits::UCSRB_TX_ENABLE;
    let checked = enables | bits::UCSRB_CHAR_SIZE_HIGH;
    let ucsrb = space
        .cell8(&UsartRegister::CtrlB.name(config.family, channel))
        .raw_read();
    if ucsrb & checked != enables {
        return Err(ConfigFault::EnableBits { found: ucsrb });
    }

    let ucsrc = space
        .cell8(&UsartRegister::CtrlC.name(config.family, channel))
        .raw_read();
    if ucsrc != bits::UCSRC_MODE_8N1 {
        return Err(ConfigFault::FrameFormat { found: ucsrc });
    }

    Ok(())
}
