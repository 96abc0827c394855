//! Ownership root wiring cells, transport, and emulation together.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::bits;
use crate::completion::{RandomCompletion, TxCompletion};
use crate::config::SimConfig;
use crate::names::{Channel, Port, UsartFamily, UsartRegister};
use crate::register::{Reg16, Reg8};
use crate::space::RegisterSpace;
use crate::transport::PtyTransport;
use crate::usart::UsartModel;
use crate::validate::{self, ConfigFault};

/// A running register simulator.
///
/// Construction opens the serial line, seeds hardware reset values, and
/// installs the emulation hooks on every channel of the active family.
/// When a publish file is configured and the line came up, the PTY peer
/// path is written there so external harnesses can attach. Dropping the
/// simulator closes the line.
pub struct Simulator {
    space: Arc<RegisterSpace>,
    transport: Arc<PtyTransport>,
    config: SimConfig,
    // Hooks hold the model weakly; this keeps it alive with the simulator.
    _model: Arc<UsartModel>,
}

impl Simulator {
    /// Builds a simulator with a freshly allocated PTY line.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let completion = Arc::new(RandomCompletion::new(config.completion_percent));
        Self::with_parts(config, PtyTransport::open(), completion)
    }

    /// Builds a simulator with no serial line, for offline use.
    #[must_use]
    pub fn without_transport(config: SimConfig) -> Self {
        let completion = Arc::new(RandomCompletion::new(config.completion_percent));
        Self::with_parts(config, PtyTransport::disabled(), completion)
    }

    /// Builds a simulator with a freshly allocated PTY line and a
    /// caller-supplied transmit-completion policy.
    #[must_use]
    pub fn with_completion(config: SimConfig, completion: Arc<dyn TxCompletion>) -> Self {
        Self::with_parts(config, PtyTransport::open(), completion)
    }

    /// Builds a simulator from a caller-supplied transport and
    /// transmit-completion policy.
    #[must_use]
    pub fn with_parts(
        config: SimConfig,
        transport: PtyTransport,
        completion: Arc<dyn TxCompletion>,
    ) -> Self {
        let space = Arc::new(RegisterSpace::new());
        let transport = Arc::new(transport);
        seed_reset_values(&space, &config);
        let model = Arc::new(UsartModel::new(
            Arc::clone(&space),
            Arc::clone(&transport),
            completion,
            config.clone(),
        ));
        install_hooks(&model, &space, config.family);
        publish_slave_path(&transport, &config);
        Self {
            space,
            transport,
            config,
            _model: model,
        }
    }

    /// Returns the configuration the simulator was built with.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the path peers should open to reach the serial line.
    #[must_use]
    pub fn slave_path(&self) -> Option<&Path> {
        self.transport.slave_path()
    }

    /// Returns the serial transport endpoint.
    #[must_use]
    pub fn transport(&self) -> &PtyTransport {
        &self.transport
    }

    /// Returns the shared 8-bit register cell named `name`.
    #[must_use]
    pub fn reg8(&self, name: &str) -> Arc<Reg8> {
        self.space.cell8(name)
    }

    /// Returns the shared 16-bit register cell named `name`.
    #[must_use]
    pub fn reg16(&self, name: &str) -> Arc<Reg16> {
        self.space.cell16(name)
    }

    /// Returns `channel`'s cell for `reg` under the active family naming.
    #[must_use]
    pub fn usart_reg8(&self, channel: Channel, reg: UsartRegister) -> Arc<Reg8> {
        self.space.cell8(&reg.name(self.config.family, channel))
    }

    /// Returns `channel`'s 16-bit baud divisor cell.
    #[must_use]
    pub fn baud_reg(&self, channel: Channel) -> Arc<Reg16> {
        self.space.cell16(&channel.baud_name(self.config.family))
    }

    /// Returns `port`'s pin-direction cell.
    #[must_use]
    pub fn port_dir(&self, port: Port) -> Arc<Reg8> {
        self.space.cell8(&port.dir_name())
    }

    /// Reads `channel`'s status register through the emulation hooks.
    #[must_use]
    pub fn read_channel_status(&self, channel: Channel) -> u8 {
        self.usart_reg8(channel, UsartRegister::Status).read()
    }

    /// Reads `channel`'s receive data register through the emulation hooks.
    #[must_use]
    pub fn read_channel_data(&self, channel: Channel) -> u8 {
        self.usart_reg8(channel, UsartRegister::RxData).read()
    }

    /// Writes `byte` to `channel`'s transmit data register through the
    /// emulation hooks.
    pub fn write_channel_data(&self, channel: Channel, byte: u8) {
        self.usart_reg8(channel, UsartRegister::TxData).write(byte);
    }

    /// Checks `channel`'s current register programming.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch between the programmed registers and the
    /// board configuration.
    pub fn validate_channel(&self, channel: Channel) -> Result<(), ConfigFault> {
        validate::validate(&self.space, &self.config, channel)
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

fn seed_reset_values(space: &RegisterSpace, config: &SimConfig) {
    for channel in Channel::ALL {
        match config.family {
            UsartFamily::ZeroSeries => {
                space
                    .cell8(&UsartRegister::Status.name(config.family, channel))
                    .raw_store(bits::ZERO_SERIES_STATUS_RESET);
            }
            UsartFamily::Classic => {
                space
                    .cell8(&UsartRegister::Status.name(config.family, channel))
                    .raw_store(bits::CLASSIC_UCSRA_RESET);
                space
                    .cell8(&UsartRegister::CtrlC.name(config.family, channel))
                    .raw_store(bits::UCSRC_MODE_8N1);
            }
        }
    }
}

// Cells own their hooks and the model owns the space that owns the cells,
// so hooks hold the model weakly. A cell that outlives its simulator
// reverts to plain storage.
fn install_hooks(model: &Arc<UsartModel>, space: &RegisterSpace, family: UsartFamily) {
    for channel in Channel::ALL {
        let status = space.cell8(&UsartRegister::Status.name(family, channel));
        let hook_model = Arc::downgrade(model);
        status.set_read_hook(move |cell| {
            hook_model
                .upgrade()
                .map_or_else(|| cell.raw_read(), |model| model.status_read(channel))
        });

        let tx = space.cell8(&UsartRegister::TxData.name(family, channel));
        let hook_model = Arc::downgrade(model);
        tx.set_write_hook(move |cell, byte| {
            hook_model.upgrade().map_or_else(
                || cell.raw_store(byte),
                |model| model.data_write(channel, byte),
            );
        });

        let rx = space.cell8(&UsartRegister::RxData.name(family, channel));
        let hook_model = Arc::downgrade(model);
        rx.set_read_hook(move |cell| {
            hook_model
                .upgrade()
                .map_or_else(|| cell.raw_read(), |model| model.data_read(channel))
        });
    }
}

fn publish_slave_path(transport: &PtyTransport, config: &SimConfig) {
    let (Some(file), Some(path)) = (config.slave_path_file.as_deref(), transport.slave_path())
    else {
        return;
    };
    if let Err(err) = fs::write(file, format!("{}\n", path.display())) {
        log::warn!("could not publish pty path to {}: {err}", file.display());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Simulator;
    use crate::bits;
    use crate::config::SimConfig;
    use crate::names::{Channel, UsartFamily, UsartRegister};

    fn offline(family: UsartFamily) -> Simulator {
        Simulator::without_transport(SimConfig {
            family,
            ..SimConfig::default()
        })
    }

    #[test]
    fn status_registers_hold_reset_values_on_every_channel() {
        let sim = offline(UsartFamily::ZeroSeries);
        for channel in Channel::ALL {
            assert_eq!(
                sim.read_channel_status(channel),
                bits::ZERO_SERIES_STATUS_RESET
            );
        }

        let sim = offline(UsartFamily::Classic);
        for channel in Channel::ALL {
            assert_eq!(sim.read_channel_status(channel), bits::CLASSIC_UCSRA_RESET);
            assert_eq!(
                sim.usart_reg8(channel, UsartRegister::CtrlC).raw_read(),
                bits::UCSRC_MODE_8N1
            );
        }
    }

    #[test]
    fn data_write_latches_and_clears_data_empty() {
        let sim = offline(UsartFamily::ZeroSeries);
        sim.write_channel_data(Channel::Usart3, 0x5A);
        assert_eq!(
            sim.usart_reg8(Channel::Usart3, UsartRegister::TxData)
                .raw_read(),
            0x5A
        );
        assert_eq!(
            sim.usart_reg8(Channel::Usart3, UsartRegister::Status)
                .raw_read()
                & bits::STATUS_DATA_EMPTY,
            0
        );
    }

    #[test]
    fn string_and_typed_access_reach_the_same_cell() {
        let sim = offline(UsartFamily::ZeroSeries);
        let typed = sim.usart_reg8(Channel::Usart2, UsartRegister::CtrlB);
        let named = sim.reg8("USART2_CTRLB");
        assert!(Arc::ptr_eq(&typed, &named));
    }

    #[test]
    fn classic_udr_hooks_share_one_cell() {
        let sim = offline(UsartFamily::Classic);
        sim.write_channel_data(Channel::Usart1, 0x33);
        assert_eq!(sim.read_channel_data(Channel::Usart1), 0x33);
    }

    #[test]
    fn cells_outliving_the_simulator_act_as_plain_storage() {
        let sim = offline(UsartFamily::ZeroSeries);
        let status = sim.usart_reg8(Channel::Usart3, UsartRegister::Status);
        let tx = sim.usart_reg8(Channel::Usart3, UsartRegister::TxData);
        drop(sim);

        assert_eq!(status.read(), bits::ZERO_SERIES_STATUS_RESET);
        tx.write(0x42);
        assert_eq!(tx.raw_read(), 0x42);
        assert_eq!(
            status.raw_read() & bits::STATUS_DATA_EMPTY,
            bits::STATUS_DATA_EMPTY
        );
    }

    #[test]
    fn offline_simulator_reports_no_slave_path() {
        let sim = offline(UsartFamily::ZeroSeries);
        assert!(sim.slave_path().is_none());
        assert!(!sim.transport().is_enabled());
    }

    #[test]
    fn validation_reflects_live_register_programming() {
        let sim = offline(UsartFamily::ZeroSeries);
        assert!(sim.validate_channel(Channel::Usart3).is_err());

        let config = sim.config().clone();
        sim.baud_reg(Channel::Usart3)
            .write(config.baud_register_value());
        sim.port_dir(config.tx_port).or_with(config.tx_pin_mask());
        sim.reg8(crate::names::PORTMUX_USARTROUTEA)
            .write(config.route_value);
        sim.usart_reg8(Channel::Usart3, UsartRegister::CtrlB)
            .write(bits::CTRLB_RX_ENABLE | bits::CTRLB_TX_ENABLE);
        sim.usart_reg8(Channel::Usart3, UsartRegister::CtrlC)
            .write(bits::CTRLC_MODE_8N1_ASYNC);

        assert_eq!(sim.validate_channel(Channel::Usart3), Ok(()));
    }
}
