//! Live USART semantics attached to the register cells.
//!
//! Three hook bodies give the status and data registers their behavior:
//! status reads surface pending line bytes and wind down in-flight
//! transmits, data writes latch and transmit, data reads consume. Transfer
//! effects are gated per channel on the configuration checks; status flags
//! update regardless so firmware polling loops behave the same either way.

use std::sync::Arc;

use crate::bits;
use crate::completion::TxCompletion;
use crate::config::SimConfig;
use crate::names::{Channel, UsartRegister};
use crate::register::Reg8;
use crate::space::RegisterSpace;
use crate::transport::PtyTransport;
use crate::validate;

pub(crate) struct UsartModel {
    space: Arc<RegisterSpace>,
    transport: Arc<PtyTransport>,
    completion: Arc<dyn TxCompletion>,
    config: SimConfig,
}

impl UsartModel {
    pub(crate) fn new(
        space: Arc<RegisterSpace>,
        transport: Arc<PtyTransport>,
        completion: Arc<dyn TxCompletion>,
        config: SimConfig,
    ) -> Self {
        Self {
            space,
            transport,
            completion,
            config,
        }
    }

    fn reg(&self, channel: Channel, reg: UsartRegister) -> Arc<Reg8> {
        self.space.cell8(&reg.name(self.config.family, channel))
    }

    /// Status-read hook body.
    ///
    /// Surfaces pending receive data, then gives an in-flight transmit a
    /// chance to finish. The policy is consulted only while the
    /// data-register-empty flag is clear.
    pub(crate) fn status_read(&self, channel: Channel) -> u8 {
        self.poll_receive(channel);
        let status = self.reg(channel, UsartRegister::Status);
        if status.raw_read() & bits::STATUS_DATA_EMPTY == 0 && self.completion.should_complete() {
            status.raw_or(bits::STATUS_TX_COMPLETE | bits::STATUS_DATA_EMPTY);
        }
        status.raw_read()
    }

    /// TX-write hook body.
    ///
    /// Latches the byte into the data register and clears the
    /// data-register-empty flag. The byte reaches the line only when the
    /// channel's configuration checks pass; otherwise it is dropped.
    pub(crate) fn data_write(&self, channel: Channel, byte: u8) {
        self.reg(channel, UsartRegister::TxData).raw_store(byte);
        self.reg(channel, UsartRegister::Status)
            .raw_and(!bits::STATUS_DATA_EMPTY);
        if self.channel_configured(channel) {
            self.transport.write_byte(byte);
        }
    }

    /// RX-read hook body.
    ///
    /// When the channel is correctly configured, consumes at most one
    /// pending line byte into the data register and retires the
    /// receive-complete flag, re-raising it if more bytes wait. Otherwise
    /// the stale register value comes back untouched.
    pub(crate) fn data_read(&self, channel: Channel) -> u8 {
        let rx = self.reg(channel, UsartRegister::RxData);
        let stale = rx.raw_read();
        if !self.channel_configured(channel) {
            return stale;
        }
        let Some(byte) = self.transport.read_byte() else {
            return stale;
        };
        rx.raw_store(byte);
        self.reg(channel, UsartRegister::Status)
            .raw_and(!bits::STATUS_RX_COMPLETE);
        self.poll_receive(channel);
        byte
    }

    fn poll_receive(&self, channel: Channel) {
        if self.transport.bytes_available() > 0 {
            self.reg(channel, UsartRegister::Status)
                .raw_or(bits::STATUS_RX_COMPLETE);
        }
    }

    fn channel_configured(&self, channel: Channel) -> bool {
        match validate::validate(&self.space, &self.config, channel) {
            Ok(()) => true,
            Err(fault) => {
                log::warn!("usart{}: transfer blocked: {fault}", channel.index());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::UsartModel;
    use crate::bits;
    use crate::completion::FixedCompletion;
    use crate::config::SimConfig;
    use crate::names::{Channel, UsartFamily};
    use crate::space::RegisterSpace;
    use crate::transport::PtyTransport;

    fn model_with(completion: bool) -> (Arc<RegisterSpace>, UsartModel) {
        let space = Arc::new(RegisterSpace::new());
        let model = UsartModel::new(
            Arc::clone(&space),
            Arc::new(PtyTransport::disabled()),
            Arc::new(FixedCompletion(completion)),
            SimConfig::default(),
        );
        (space, model)
    }

    #[test]
    fn status_read_finishes_an_in_flight_transmit() {
        let (space, model) = model_with(true);
        let status = space.cell8("USART3_STATUS");
        status.raw_store(0);

        assert_eq!(
            model.status_read(Channel::Usart3),
            bits::STATUS_TX_COMPLETE | bits::STATUS_DATA_EMPTY
        );
        assert_eq!(
            status.raw_read(),
            bits::STATUS_TX_COMPLETE | bits::STATUS_DATA_EMPTY
        );
    }

    #[test]
    fn transmit_stays_in_flight_until_the_policy_completes() {
        let (space, model) = model_with(false);
        space.cell8("USART3_STATUS").raw_store(0);
        assert_eq!(model.status_read(Channel::Usart3), 0);
        assert_eq!(model.status_read(Channel::Usart3), 0);
    }

    #[test]
    fn idle_transmitter_does_not_consult_the_policy() {
        let (space, model) = model_with(true);
        let status = space.cell8("USART3_STATUS");
        status.raw_store(bits::STATUS_DATA_EMPTY);

        assert_eq!(model.status_read(Channel::Usart3), bits::STATUS_DATA_EMPTY);
        assert_eq!(status.raw_read(), bits::STATUS_DATA_EMPTY);
    }

    #[test]
    fn tx_write_latches_the_byte_and_clears_data_empty() {
        let (space, model) = model_with(false);
        space
            .cell8("USART3_STATUS")
            .raw_store(bits::ZERO_SERIES_STATUS_RESET);

        model.data_write(Channel::Usart3, 0x41);

        assert_eq!(space.cell8("USART3_TXDATAL").raw_read(), 0x41);
        assert_eq!(
            space.cell8("USART3_STATUS").raw_read(),
            bits::STATUS_TX_COMPLETE
        );
    }

    #[test]
    fn rx_read_returns_the_stale_value_when_not_configured() {
        let (space, model) = model_with(false);
        space.cell8("USART3_RXDATAL").raw_store(0x7E);
        assert_eq!(model.data_read(Channel::Usart3), 0x7E);
        assert_eq!(space.cell8("USART3_RXDATAL").raw_read(), 0x7E);
    }

    #[test]
    fn classic_family_latches_tx_into_the_shared_data_register() {
        let space = Arc::new(RegisterSpace::new());
        let config = SimConfig {
            family: UsartFamily::Classic,
            ..SimConfig::default()
        };
        let model = UsartModel::new(
            Arc::clone(&space),
            Arc::new(PtyTransport::disabled()),
            Arc::new(FixedCompletion(false)),
            config,
        );

        model.data_write(Channel::Usart3, 0x55);

        assert_eq!(space.cell8("UDR3").raw_read(), 0x55);
        assert_eq!(model.data_read(Channel::Usart3), 0x55);
    }
}
