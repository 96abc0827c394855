//! Firmware-style serial driver running against the USART simulator.
//!
//! The driver programs the simulated registers the same way bare-metal boot
//! code would, then moves bytes with busy-wait loops over the status flags.
//! Nothing here touches the PTY directly; every effect goes through register
//! reads and writes.

use std::hint;

use sim_core::{bits, Channel, Simulator, UsartFamily, UsartRegister};

use env_logger as _;

/// Polled serial port over one simulated USART channel.
#[derive(Debug)]
pub struct SerialPort<'a> {
    sim: &'a Simulator,
    channel: Channel,
}

impl<'a> SerialPort<'a> {
    /// Creates a driver for the channel named in `sim`'s configuration.
    #[must_use]
    pub const fn new(sim: &'a Simulator) -> Self {
        Self {
            sim,
            channel: sim.config().channel,
        }
    }

    /// Creates a driver for a specific channel.
    #[must_use]
    pub const fn on_channel(sim: &'a Simulator, channel: Channel) -> Self {
        Self { sim, channel }
    }

    /// Programs clock, pins, and USART registers for 8N1 at the configured
    /// baud rate, mirroring the boot sequence real firmware runs.
    pub fn init(&self) {
        match self.sim.config().family {
            UsartFamily::ZeroSeries => self.init_zero_series(),
            UsartFamily::Classic => self.init_classic(),
        }
        log::debug!("usart{}: driver initialized", self.channel.index());
    }

    fn init_zero_series(&self) {
        let config = self.sim.config();
        // Protected clock registers only accept writes right after the
        // unlock signature.
        self.sim
            .reg8(sim_core::CPU_CCP)
            .write(bits::CCP_UNLOCK_IOREG);
        self.sim.reg8(sim_core::CLKCTRL_MCLKCTRLB).write(0);
        self.sim
            .reg8(sim_core::PORTMUX_USARTROUTEA)
            .write(config.route_value);
        self.sim
            .port_dir(config.tx_port)
            .or_with(config.tx_pin_mask());
        self.sim
            .port_dir(config.rx_port)
            .and_with(!config.rx_pin_mask());
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlC)
            .write(bits::CTRLC_MODE_8N1_ASYNC);
        self.sim
            .baud_reg(self.channel)
            .write(config.baud_register_value());
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlB)
            .write(bits::CTRLB_RX_ENABLE | bits::CTRLB_TX_ENABLE);
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlA)
            .or_with(bits::CTRLA_RX_COMPLETE_IE | bits::CTRLA_DATA_EMPTY_IE);
    }

    fn init_classic(&self) {
        let config = self.sim.config();
        self.sim
            .port_dir(config.tx_port)
            .or_with(config.tx_pin_mask());
        self.sim
            .port_dir(config.rx_port)
            .and_with(!config.rx_pin_mask());
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlC)
            .write(bits::UCSRC_MODE_8N1);
        self.sim
            .baud_reg(self.channel)
            .write(config.baud_register_value());
        // UCSRnB carries both the enables and the interrupt masks, so the
        // CtrlA write lands in the same register as the CtrlB one.
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlB)
            .write(bits::UCSRB_RX_ENABLE | bits::UCSRB_TX_ENABLE);
        self.sim
            .usart_reg8(self.channel, UsartRegister::CtrlA)
            .or_with(bits::UCSRB_RX_COMPLETE_IE | bits::UCSRB_DATA_EMPTY_IE);
    }

    /// True when a received byte is waiting in the data register.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.status() & bits::STATUS_RX_COMPLETE != 0
    }

    /// True when the transmit buffer can accept another byte.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.status() & bits::STATUS_DATA_EMPTY != 0
    }

    /// Spins until a byte arrives, then returns it.
    #[must_use]
    pub fn read_byte(&self) -> u8 {
        while !self.has_data() {
            hint::spin_loop();
        }
        self.sim.read_channel_data(self.channel)
    }

    /// Spins until the transmitter is free, then queues `byte`.
    pub fn write_byte(&self, byte: u8) {
        while !self.can_write() {
            hint::spin_loop();
        }
        self.sim.write_channel_data(self.channel, byte);
    }

    fn status(&self) -> u8 {
        self.sim.read_channel_status(self.channel)
    }
}
