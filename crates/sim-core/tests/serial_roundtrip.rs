//! End-to-end serial behavior over a real PTY pair.

#![allow(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::sync::Arc;

use sim_core::{bits, FixedCompletion, RandomCompletion, SimConfig, Simulator, UsartRegister};

use log as _;
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use tempfile as _;
use thiserror as _;

/// Opens the slave side of `sim`'s PTY with non-blocking reads.
fn open_peer(sim: &Simulator) -> File {
    let path = sim.slave_path().expect("simulator has a live pty");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .expect("slave side opens");
    let flags = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_GETFL) };
    assert!(flags >= 0, "F_GETFL failed");
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETFL, flags | libc::O_NONBLOCK) };
    assert_eq!(rc, 0, "F_SETFL failed");
    file
}

fn read_pending(peer: &mut File) -> Vec<u8> {
    let mut buf = [0u8; 64];
    peer.read(&mut buf)
        .map_or_else(|_| Vec::new(), |n| buf[..n].to_vec())
}

fn wired(completion: bool) -> (Simulator, File) {
    let config = SimConfig {
        slave_path_file: None,
        ..SimConfig::default()
    };
    let sim = Simulator::with_completion(config, Arc::new(FixedCompletion(completion)));
    let peer = open_peer(&sim);
    (sim, peer)
}

/// Runs the same register sequence firmware init would.
fn program_channel(sim: &Simulator) {
    let config = sim.config().clone();
    let channel = config.channel;
    sim.reg8(sim_core::CPU_CCP).write(bits::CCP_UNLOCK_IOREG);
    sim.reg8(sim_core::CLKCTRL_MCLKCTRLB).write(0);
    sim.reg8(sim_core::PORTMUX_USARTROUTEA)
        .write(config.route_value);
    sim.port_dir(config.tx_port).or_with(config.tx_pin_mask());
    sim.port_dir(config.rx_port).and_with(!config.rx_pin_mask());
    sim.usart_reg8(channel, UsartRegister::CtrlC)
        .write(bits::CTRLC_MODE_8N1_ASYNC);
    sim.baud_reg(channel).write(config.baud_register_value());
    sim.usart_reg8(channel, UsartRegister::CtrlB)
        .write(bits::CTRLB_RX_ENABLE | bits::CTRLB_TX_ENABLE);
    sim.usart_reg8(channel, UsartRegister::CtrlA)
        .or_with(bits::CTRLA_RX_COMPLETE_IE | bits::CTRLA_DATA_EMPTY_IE);
    assert_eq!(sim.validate_channel(channel), Ok(()));
}

#[test]
fn configured_transmit_reaches_the_peer() {
    let (sim, mut peer) = wired(true);
    program_channel(&sim);
    let channel = sim.config().channel;

    sim.write_channel_data(channel, b'Z');

    assert_eq!(read_pending(&mut peer), b"Z");
    let status = sim.read_channel_status(channel);
    assert_ne!(status & bits::STATUS_DATA_EMPTY, 0);
    assert_ne!(status & bits::STATUS_TX_COMPLETE, 0);
}

#[test]
fn unconfigured_transmit_never_reaches_the_peer() {
    let (sim, mut peer) = wired(true);
    let channel = sim.config().channel;

    sim.write_channel_data(channel, b'X');

    assert!(read_pending(&mut peer).is_empty());
    assert_eq!(
        sim.usart_reg8(channel, UsartRegister::TxData).raw_read(),
        b'X'
    );
}

#[test]
fn baud_mismatch_alone_blocks_the_line() {
    let (sim, mut peer) = wired(true);
    program_channel(&sim);
    let channel = sim.config().channel;

    sim.baud_reg(channel).write(0);
    sim.write_channel_data(channel, b'1');
    assert!(read_pending(&mut peer).is_empty());

    sim.baud_reg(channel)
        .write(sim.config().baud_register_value());
    sim.write_channel_data(channel, b'2');
    assert_eq!(read_pending(&mut peer), b"2");
}

#[test]
fn receive_lifecycle_tracks_pending_bytes() {
    let (sim, mut peer) = wired(true);
    program_channel(&sim);
    let channel = sim.config().channel;

    assert_eq!(
        sim.read_channel_status(channel) & bits::STATUS_RX_COMPLETE,
        0
    );

    peer.write_all(b"K").expect("peer write succeeds");
    assert_ne!(
        sim.read_channel_status(channel) & bits::STATUS_RX_COMPLETE,
        0
    );
    assert_eq!(sim.read_channel_data(channel), b'K');
    assert_eq!(
        sim.usart_reg8(channel, UsartRegister::Status).raw_read() & bits::STATUS_RX_COMPLETE,
        0
    );
    assert_eq!(
        sim.read_channel_status(channel) & bits::STATUS_RX_COMPLETE,
        0
    );
}

#[test]
fn receive_complete_stays_raised_while_more_bytes_wait() {
    let (sim, mut peer) = wired(true);
    program_channel(&sim);
    let channel = sim.config().channel;

    peer.write_all(b"AB").expect("peer write succeeds");
    assert_ne!(
        sim.read_channel_status(channel) & bits::STATUS_RX_COMPLETE,
        0
    );
    assert_eq!(sim.read_channel_data(channel), b'A');
    assert_ne!(
        sim.usart_reg8(channel, UsartRegister::Status).raw_read() & bits::STATUS_RX_COMPLETE,
        0
    );
    assert_eq!(sim.read_channel_data(channel), b'B');
    assert_eq!(
        sim.usart_reg8(channel, UsartRegister::Status).raw_read() & bits::STATUS_RX_COMPLETE,
        0
    );
}

#[test]
fn unconfigured_receive_leaves_bytes_on_the_line() {
    let (sim, mut peer) = wired(true);
    let channel = sim.config().channel;

    peer.write_all(b"Q").expect("peer write succeeds");
    assert_ne!(
        sim.read_channel_status(channel) & bits::STATUS_RX_COMPLETE,
        0
    );
    assert_eq!(sim.read_channel_data(channel), 0);

    program_channel(&sim);
    assert_eq!(sim.read_channel_data(channel), b'Q');
}

#[test]
fn in_flight_transmit_completes_within_bounded_polls() {
    let config = SimConfig {
        slave_path_file: None,
        ..SimConfig::default()
    };
    let sim = Simulator::with_completion(config, Arc::new(RandomCompletion::default()));
    program_channel(&sim);
    let channel = sim.config().channel;

    sim.write_channel_data(channel, 0xA5);
    assert_eq!(
        sim.usart_reg8(channel, UsartRegister::Status).raw_read() & bits::STATUS_DATA_EMPTY,
        0
    );

    let mut completed = false;
    for _ in 0..1000 {
        let status = sim.read_channel_status(channel);
        if status & bits::STATUS_DATA_EMPTY != 0 {
            assert_ne!(status & bits::STATUS_TX_COMPLETE, 0);
            completed = true;
            break;
        }
    }
    assert!(completed, "transmit never completed across 1000 status polls");
}
