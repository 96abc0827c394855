//! Register bit masks for the emulated USART families.
//!
//! The status flags sit at the same bit positions in both families, so the
//! emulation logic uses one set of masks. Control-register layouts differ
//! and carry family-specific masks.

/// Status flag: a received byte is waiting in the RX data register.
pub const STATUS_RX_COMPLETE: u8 = 0x80;
/// Status flag: the previous transmit has fully shifted out.
pub const STATUS_TX_COMPLETE: u8 = 0x40;
/// Status flag: the TX data register can accept another byte.
pub const STATUS_DATA_EMPTY: u8 = 0x20;

/// 0-series `CTRLA`: receive-complete interrupt enable.
pub const CTRLA_RX_COMPLETE_IE: u8 = 0x80;
/// 0-series `CTRLA`: data-register-empty interrupt enable.
pub const CTRLA_DATA_EMPTY_IE: u8 = 0x20;
/// 0-series `CTRLB`: receiver enable.
pub const CTRLB_RX_ENABLE: u8 = 0x80;
/// 0-series `CTRLB`: transmitter enable.
pub const CTRLB_TX_ENABLE: u8 = 0x40;
/// 0-series `CTRLB`: receiver-mode field, all clear in normal operation.
pub const CTRLB_MODE_MASK: u8 = 0x07;
/// 0-series `CTRLC` value for asynchronous 8-data 1-stop no-parity frames.
pub const CTRLC_MODE_8N1_ASYNC: u8 = 0x03;

/// Classic `UCSRnA`: double-speed and multi-processor bits, must stay clear.
pub const UCSRA_SPEED_MODE_MASK: u8 = 0x03;
/// Classic `UCSRnB`: receive-complete interrupt enable.
pub const UCSRB_RX_COMPLETE_IE: u8 = 0x80;
/// Classic `UCSRnB`: data-register-empty interrupt enable.
pub const UCSRB_DATA_EMPTY_IE: u8 = 0x20;
/// Classic `UCSRnB`: receiver enable.
pub const UCSRB_RX_ENABLE: u8 = 0x10;
/// Classic `UCSRnB`: transmitter enable.
pub const UCSRB_TX_ENABLE: u8 = 0x08;
/// Classic `UCSRnB`: 9-bit character-size bit, must stay clear.
pub const UCSRB_CHAR_SIZE_HIGH: u8 = 0x04;
/// Classic `UCSRnC` value for asynchronous 8-data 1-stop no-parity frames.
pub const UCSRC_MODE_8N1: u8 = 0x06;

/// Unlock signature written to `CPU_CCP` before protected I/O writes.
pub const CCP_UNLOCK_IOREG: u8 = 0xD8;

/// 0-series `STATUS` hardware reset value.
pub const ZERO_SERIES_STATUS_RESET: u8 = STATUS_TX_COMPLETE | STATUS_DATA_EMPTY;
/// Classic `UCSRnA` hardware reset value.
pub const CLASSIC_UCSRA_RESET: u8 = STATUS_DATA_EMPTY;
