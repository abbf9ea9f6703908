//! Shared in-memory transport fake for the integration tests.

#![allow(dead_code)]

use ft232h_io::{ChannelOptions, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Scripted state behind [`FakeTransport`]. Tests flip the failure switches
/// and the simulated pin levels mid-run through [`FakeTransport::state`].
#[derive(Default)]
pub struct FakeState {
    /// Fail the next channel open attempts.
    pub fail_open: bool,
    /// Fail every configure/read/write until cleared.
    pub fail_io: bool,
    /// Simulated electrical level of all sixteen pins.
    pub pins: u16,
    /// Every raw MPSSE write, in order.
    pub writes: Vec<Vec<u8>>,
    /// Every channel configuration, in order.
    pub configs: Vec<ChannelOptions>,
    /// Every addressed I2C write, in order.
    pub i2c_writes: Vec<(u8, Vec<u8>)>,
    /// Scripted replies for addressed I2C reads, consumed front to back.
    pub i2c_read_data: VecDeque<Vec<u8>>,
    /// Bytes queued by GPIO read commands, waiting to be read back.
    pub pending_reads: VecDeque<Vec<u8>>,
    pub opened: u32,
    pub closed: u32,
}

/// A [`Transport`] that answers GPIO reads from a scripted 16-bit pin image
/// and records everything written to it.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

pub struct FakeChannel;

impl FakeTransport {
    pub fn new() -> Self {
        FakeTransport::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_pins(&self, pins: u16) {
        self.state().pins = pins;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    pub fn set_fail_io(&self, fail: bool) {
        self.state().fail_io = fail;
    }

    /// MPSSE `[opcode, value, direction]` frames among the recorded writes.
    pub fn gpio_frames(&self) -> Vec<Vec<u8>> {
        self.state()
            .writes
            .iter()
            .filter(|w| w.len() == 3 && matches!(w[0], 0x80 | 0x82))
            .cloned()
            .collect()
    }
}

impl Transport for FakeTransport {
    type Channel = FakeChannel;

    fn open_channel(&self, _index: u32) -> Result<FakeChannel, TransportError> {
        let mut state = self.state();
        if state.fail_open {
            return Err(TransportError::new(2));
        }
        state.opened += 1;
        Ok(FakeChannel)
    }

    fn close_channel(&self, _channel: FakeChannel) {
        self.state().closed += 1;
    }

    fn configure_channel(
        &self,
        _channel: &mut FakeChannel,
        options: &ChannelOptions,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.fail_io {
            return Err(TransportError::new(4));
        }
        state.configs.push(*options);
        Ok(())
    }

    fn write_bytes(&self, _channel: &mut FakeChannel, buf: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state();
        if state.fail_io {
            return Err(TransportError::new(4));
        }
        state.writes.push(buf.to_vec());
        // GPIO read commands answer from the simulated pin image.
        match buf.first() {
            Some(&0x81) => {
                let byte = (state.pins & 0xFF) as u8;
                state.pending_reads.push_back(vec![byte]);
            }
            Some(&0x83) => {
                let byte = (state.pins >> 8) as u8;
                state.pending_reads.push_back(vec![byte]);
            }
            _ => {}
        }
        Ok(buf.len())
    }

    fn read_bytes(
        &self,
        _channel: &mut FakeChannel,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        let mut state = self.state();
        if state.fail_io {
            return Err(TransportError::new(4));
        }
        match state.pending_reads.pop_front() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn i2c_write_bytes(
        &self,
        _channel: &mut FakeChannel,
        address: u8,
        buf: &[u8],
    ) -> Result<usize, TransportError> {
        let mut state = self.state();
        if state.fail_io {
            return Err(TransportError::new(4));
        }
        state.i2c_writes.push((address, buf.to_vec()));
        Ok(buf.len())
    }

    fn i2c_read_bytes(
        &self,
        _channel: &mut FakeChannel,
        address: u8,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        let mut state = self.state();
        if state.fail_io {
            return Err(TransportError::new(4));
        }
        let _ = address;
        match state.i2c_read_data.pop_front() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}

/// Routes driver logs to the test harness when `RUST_LOG` is set.
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Polls `condition` every few milliseconds until it holds or `timeout`
/// elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Adapter settings with the background worker effectively parked, for tests
/// that drive the adapter purely through its synchronous API.
pub fn quiet_config() -> ft232h_io::AdapterConfig {
    ft232h_io::AdapterConfig {
        poll_period: Duration::from_secs(3600),
        retry_backoff: Duration::from_secs(3600),
        ..Default::default()
    }
}

/// Adapter settings with fast polling and retry, for reconnection and
/// notification tests.
pub fn fast_config() -> ft232h_io::AdapterConfig {
    ft232h_io::AdapterConfig {
        poll_period: Duration::from_millis(10),
        retry_backoff: Duration::from_millis(50),
        ..Default::default()
    }
}
