//! Host-side simulator of a microcontroller USART peripheral.
//!
//! Firmware-style code reads and writes what it believes are hardware
//! registers; hooks on those registers give the accesses live serial
//! semantics against a pseudo-terminal the host can attach to. Transfers
//! only reach the line once the registers are programmed the way real
//! hardware would need, so initialization code can be tested unmodified.

/// Register bit masks for the emulated USART families.
pub mod bits;

/// Transmit-completion policies.
pub mod completion;
pub use completion::{FixedCompletion, RandomCompletion, TxCompletion};

/// Board-level simulator configuration.
pub mod config;
pub use config::{
    SimConfig, DEFAULT_BAUD, DEFAULT_CLOCK_HZ, DEFAULT_COMPLETION_PERCENT, DEFAULT_SLAVE_PATH_FILE,
};

/// Typed catalog of channels, registers, and ports with family-aware names.
pub mod names;
pub use names::{
    Channel, ChannelParseError, FamilyParseError, Port, UsartFamily, UsartRegister,
    CLKCTRL_MCLKCTRLB, CPU_CCP, PORTMUX_USARTROUTEA,
};

/// Shared register cells with interception hooks.
pub mod register;
pub use register::{Reg16, Reg8};

/// Name-keyed lazy register space.
pub mod space;
pub use space::RegisterSpace;

/// Pseudo-terminal serial endpoint.
pub mod transport;
pub use transport::PtyTransport;

/// Configuration checks gating live serial transfer.
pub mod validate;
pub use validate::{validate, ConfigFault};

mod usart;

/// Ownership root wiring cells, transport, and emulation together.
pub mod simulator;
pub use simulator::Simulator;

#[cfg(test)]
use tempfile as _;
