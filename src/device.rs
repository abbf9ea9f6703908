//! The GPIO/I2C adapter for the bridge chip.
//!
//! [`Ft232h`] owns the pin bank and the nullable vendor channel handle,
//! translates pin operations into MPSSE command frames, implements the
//! [`I2cMaster`] contract over the same channel, and runs the background
//! readiness machine that polls input pins and recovers from disconnects.

use crate::bits;
use crate::consts::mpsse;
use crate::error::{Error, Result};
use crate::gpio::{GpioLevel, GpioPin, PinBank, PinGroup, PinMode};
use crate::i2c::{check_address, I2cMaster, I2cSpeed};
use crate::transport::{ChannelOptions, Transport, TransportError, STATUS_IO_ERROR};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Speed classes the MPSSE serial engine can actually clock.
const SUPPORTED_SPEEDS: [I2cSpeed; 3] = [I2cSpeed::Khz100, I2cSpeed::Khz400, I2cSpeed::Mhz1];

/// Construction-time settings for the adapter.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Vendor channel index to open.
    pub channel_index: u32,
    /// Period of the input-pin poll while the link is up.
    pub poll_period: Duration,
    /// Backoff between reconnection attempts while the link is down.
    pub retry_backoff: Duration,
    /// Initial I2C clock class.
    pub i2c_speed: I2cSpeed,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            channel_index: 0,
            poll_period: Duration::from_millis(200),
            retry_backoff: Duration::from_secs(1),
            i2c_speed: I2cSpeed::Khz100,
        }
    }
}

/// Readiness of the link to the physical chip.
///
/// The presence of the channel handle is the sole source of truth for
/// reachability; this enum only adds whether a retry is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Handle absent; waiting for the next reconnection attempt.
    Disconnected,
    /// Handle absent; a reconnection attempt is in progress.
    Reconnecting,
    /// Handle present; the poller is running.
    Ready,
}

struct Inner<C> {
    channel: Option<C>,
    link: LinkState,
    bank: PinBank,
    /// Previous 16-bit pin snapshot, compared bit-by-bit against fresh polls.
    last_snapshot: u16,
    speed: I2cSpeed,
}

struct Shared<T: Transport> {
    transport: T,
    config: AdapterConfig,
    inner: Mutex<Inner<T::Channel>>,
    subscribers: Mutex<Vec<Sender<u16>>>,
}

/// A handle to the bridge chip, generic over the vendor transport.
///
/// One instance owns its pin bank, its channel handle and one background
/// worker thread for the lifetime of the adapter. All pin and I2C operations
/// share a single exclusive lock, so a caller never observes or produces a
/// torn bank-wide mask; the poller takes the same lock for its snapshot
/// reads. Operations are serviced in every link state — when the handle is
/// absent they fail fast with [`Error::NotConnected`] instead of blocking.
pub struct Ft232h<T: Transport> {
    shared: Arc<Shared<T>>,
    stop: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> Ft232h<T> {
    /// Creates the adapter, attempts one synchronous initialization and
    /// starts the background worker.
    ///
    /// A failed first initialization is not an error: the adapter starts
    /// `Disconnected` and the retry loop brings the link up when the
    /// hardware appears.
    pub fn new(transport: T, config: AdapterConfig) -> Self {
        let shared = Arc::new(Shared {
            transport,
            inner: Mutex::new(Inner {
                channel: None,
                link: LinkState::Disconnected,
                bank: PinBank::new(),
                last_snapshot: 0,
                speed: config.i2c_speed,
            }),
            subscribers: Mutex::new(Vec::new()),
            config,
        });
        shared.try_connect();

        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let shared = Arc::clone(&shared);
            let stop = Arc::clone(&stop);
            thread::spawn(move || worker_loop(shared, stop))
        };
        Ft232h {
            shared,
            stop,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Current readiness of the link.
    pub fn link_state(&self) -> LinkState {
        self.shared.lock_inner().link
    }

    /// Configures a pin as input or output.
    ///
    /// Fails with [`Error::NotConnected`] while the link is down and with
    /// [`Error::PinReserved`] for serial-engine pins. The direction byte is
    /// derived from the bank at the next write; nothing is transmitted here.
    /// A pin becoming an input takes its level from the latest snapshot, so
    /// a line already asserted at configuration time reads back correctly
    /// before (and without) any further edge.
    pub fn configure_pin(&self, pin: GpioPin, mode: PinMode) -> Result<()> {
        let mut inner = self.shared.lock_inner();
        if inner.channel.is_none() {
            return Err(Error::NotConnected);
        }
        inner.bank.set_mode(pin, mode)?;
        if mode == PinMode::Input {
            let level = if bits::is_set(u32::from(inner.last_snapshot), pin.number()) {
                GpioLevel::High
            } else {
                GpioLevel::Low
            };
            inner.bank.set_level(pin, level);
        }
        debug!("pin {:?} configured as {:?}", pin, mode);
        Ok(())
    }

    /// Drives an output pin high or low.
    ///
    /// Recomputes the full value mask for the pin's byte group and writes
    /// one `[opcode, value, direction]` frame. A transport failure closes
    /// the handle and is returned to the caller.
    pub fn write_pin(&self, pin: GpioPin, level: GpioLevel) -> Result<()> {
        if level == GpioLevel::Unknown {
            return Err(Error::ArgumentOutOfRange(
                "cannot drive a pin to an unknown level".to_string(),
            ));
        }
        let mut inner = self.shared.lock_inner();
        if inner.channel.is_none() {
            return Err(Error::NotConnected);
        }
        if inner.bank.level(pin) == GpioLevel::Unknown {
            return Err(Error::PinNotControllable { pin });
        }
        if inner.bank.mode(pin) != PinMode::Output {
            return Err(Error::PinNotOutput { pin });
        }
        let previous = inner.bank.level(pin);
        inner.bank.set_level(pin, level);
        match self.shared.write_group(&mut inner, pin.group()) {
            Ok(()) => {
                trace!("pin {:?} driven {:?}", pin, level);
                Ok(())
            }
            Err(e) => {
                // The frame never reached the chip; keep the bank at the
                // last transmitted state.
                inner.bank.set_level(pin, previous);
                warn!("pin write failed: {}", e);
                self.shared.disconnect(&mut inner);
                Err(e.into())
            }
        }
    }

    /// Returns the last known level of an input pin.
    ///
    /// Serves the snapshot maintained by the poller; the transport is never
    /// touched, so this cannot race the poller's read-modify-write.
    pub fn read_pin(&self, pin: GpioPin) -> Result<GpioLevel> {
        let inner = self.shared.lock_inner();
        if inner.channel.is_none() {
            return Err(Error::NotConnected);
        }
        if inner.bank.mode(pin) != PinMode::Input {
            return Err(Error::PinNotInput { pin });
        }
        match inner.bank.level(pin) {
            GpioLevel::Unknown => Err(Error::PinNotControllable { pin }),
            level => Ok(level),
        }
    }

    /// Subscribes to input-pin change notifications.
    ///
    /// Each qualifying poll difference delivers one 16-bit snapshot, in
    /// detection order from the single poller thread. Nothing is delivered
    /// across a disconnect/reconnect gap; the first post-reconnect snapshot
    /// becomes the new comparison baseline.
    pub fn subscribe(&self) -> Receiver<u16> {
        let (tx, rx) = mpsc::channel();
        self.shared.lock_subscribers().push(tx);
        rx
    }
}

impl<T: Transport> Drop for Ft232h<T> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        let mut inner = self.shared.lock_inner();
        if let Some(channel) = inner.channel.take() {
            self.shared.transport.close_channel(channel);
        }
        inner.link = LinkState::Disconnected;
    }
}

// --- I2C master over the same channel handle ---

impl<T: Transport> Ft232h<T> {
    fn i2c_write_inner(&self, address: u8, payload: &[u8]) -> Result<()> {
        check_address(address)?;
        let mut inner = self.shared.lock_inner();
        let Some(channel) = inner.channel.as_mut() else {
            return Err(Error::NotConnected);
        };
        trace!("I2C write addr=0x{:02X}: {:02X?}", address, payload);
        match self.shared.transport.i2c_write_bytes(channel, address, payload) {
            Ok(n) if n == payload.len() => Ok(()),
            Ok(n) => {
                warn!("short I2C write ({} of {} bytes)", n, payload.len());
                self.shared.disconnect(&mut inner);
                Err(TransportError::new(STATUS_IO_ERROR).into())
            }
            Err(e) => {
                warn!("I2C write failed: {}", e);
                self.shared.disconnect(&mut inner);
                Err(e.into())
            }
        }
    }

    fn i2c_read_inner(&self, address: u8, command: u8, buf: &mut [u8]) -> Result<usize> {
        check_address(address)?;
        let mut inner = self.shared.lock_inner();
        let Some(channel) = inner.channel.as_mut() else {
            return Err(Error::NotConnected);
        };
        let result = self
            .shared
            .transport
            .i2c_write_bytes(channel, address, &[command])
            .and_then(|_| self.shared.transport.i2c_read_bytes(channel, address, buf));
        match result {
            Ok(n) => {
                trace!("I2C read addr=0x{:02X} cmd=0x{:02X}: {:02X?}", address, command, &buf[..n]);
                Ok(n)
            }
            Err(e) => {
                warn!("I2C read failed: {}", e);
                self.shared.disconnect(&mut inner);
                Err(e.into())
            }
        }
    }

    /// Short fixed-width reads close the handle like any other failed
    /// transfer.
    fn expect_read_len(&self, got: usize, want: usize) -> Result<()> {
        if got == want {
            return Ok(());
        }
        warn!("short I2C read ({} of {} bytes)", got, want);
        let mut inner = self.shared.lock_inner();
        self.shared.disconnect(&mut inner);
        Err(TransportError::new(STATUS_IO_ERROR).into())
    }
}

impl<T: Transport> I2cMaster for Ft232h<T> {
    fn set_speed(&self, speed: I2cSpeed) -> Result<()> {
        if !SUPPORTED_SPEEDS.contains(&speed) {
            return Err(Error::UnsupportedSpeed(speed));
        }
        let mut inner = self.shared.lock_inner();
        let options = channel_options(&inner.bank, speed);
        let Some(channel) = inner.channel.as_mut() else {
            return Err(Error::NotConnected);
        };
        match self.shared.transport.configure_channel(channel, &options) {
            Ok(()) => {
                debug!("I2C clock set to {}", speed);
                inner.speed = speed;
                Ok(())
            }
            Err(e) => {
                warn!("channel reconfiguration failed: {}", e);
                self.shared.disconnect(&mut inner);
                Err(e.into())
            }
        }
    }

    fn read_byte(&self, address: u8, command: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        let n = self.read_block(address, command, &mut buf)?;
        self.expect_read_len(n, 1)?;
        Ok(buf[0])
    }

    fn write_byte(&self, address: u8, command: u8, value: u8) -> Result<()> {
        self.i2c_write_inner(address, &[command, value])
    }

    fn read_word(&self, address: u8, command: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        let n = self.read_block(address, command, &mut buf)?;
        self.expect_read_len(n, 2)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_word(&self, address: u8, command: u8, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c_write_inner(address, &[command, lo, hi])
    }

    fn read_block(&self, address: u8, command: u8, buf: &mut [u8]) -> Result<usize> {
        self.i2c_read_inner(address, command, buf)
    }

    fn write_block(&self, address: u8, command: u8, data: &[u8]) -> Result<()> {
        let mut payload = Vec::with_capacity(1 + data.len());
        payload.push(command);
        payload.extend_from_slice(data);
        self.i2c_write_inner(address, &payload)
    }
}

// --- Readiness machine internals ---

impl<T: Transport> Shared<T> {
    fn lock_inner(&self) -> MutexGuard<'_, Inner<T::Channel>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Sender<u16>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Closes the handle and marks the link down. Any transport failure
    /// funnels through here; the retry loop takes over from there.
    fn disconnect(&self, inner: &mut Inner<T::Channel>) {
        if let Some(channel) = inner.channel.take() {
            self.transport.close_channel(channel);
        }
        if inner.link != LinkState::Disconnected {
            warn!("link lost, entering reconnect loop");
        }
        inner.link = LinkState::Disconnected;
    }

    /// One full (re)initialization attempt: open, configure, write both
    /// byte groups from the bank, take a fresh comparison baseline.
    fn try_connect(&self) {
        let mut inner = self.lock_inner();
        inner.link = LinkState::Reconnecting;
        let mut channel = match self.transport.open_channel(self.config.channel_index) {
            Ok(channel) => channel,
            Err(e) => {
                debug!("channel open failed: {}", e);
                inner.link = LinkState::Disconnected;
                return;
            }
        };
        let options = channel_options(&inner.bank, inner.speed);
        if let Err(e) = self.transport.configure_channel(&mut channel, &options) {
            debug!("channel configuration failed: {}", e);
            self.transport.close_channel(channel);
            inner.link = LinkState::Disconnected;
            return;
        }
        inner.channel = Some(channel);
        if self.write_group(&mut inner, PinGroup::Low).is_err()
            || self.write_group(&mut inner, PinGroup::High).is_err()
        {
            debug!("initial pin write failed");
            self.disconnect(&mut inner);
            return;
        }
        // Fresh baseline: state from before the gap is discarded.
        match self.read_snapshot(&mut inner) {
            Ok(snapshot) => {
                inner.last_snapshot = snapshot;
                inner.bank.apply_snapshot(snapshot);
            }
            Err(e) => {
                debug!("baseline snapshot failed: {}", e);
                self.disconnect(&mut inner);
                return;
            }
        }
        inner.link = LinkState::Ready;
        info!(
            "link established, polling every {:?}",
            self.config.poll_period
        );
    }

    /// Writes one byte group as a 3-byte MPSSE frame derived from the bank.
    fn write_group(
        &self,
        inner: &mut Inner<T::Channel>,
        group: PinGroup,
    ) -> std::result::Result<(), TransportError> {
        let opcode = match group {
            PinGroup::Low => mpsse::SET_DATA_BITS_LOW,
            PinGroup::High => mpsse::SET_DATA_BITS_HIGH,
        };
        let frame = [
            opcode,
            inner.bank.value_byte(group),
            inner.bank.direction_byte(group),
        ];
        let Some(channel) = inner.channel.as_mut() else {
            return Err(TransportError::new(STATUS_IO_ERROR));
        };
        trace!("GPIO frame {:02X?}", frame);
        let written = self.transport.write_bytes(channel, &frame)?;
        if written != frame.len() {
            return Err(TransportError::new(STATUS_IO_ERROR));
        }
        Ok(())
    }

    /// Reads one byte group back from the chip.
    fn read_group(
        &self,
        inner: &mut Inner<T::Channel>,
        group: PinGroup,
    ) -> std::result::Result<u8, TransportError> {
        let opcode = match group {
            PinGroup::Low => mpsse::GET_DATA_BITS_LOW,
            PinGroup::High => mpsse::GET_DATA_BITS_HIGH,
        };
        let Some(channel) = inner.channel.as_mut() else {
            return Err(TransportError::new(STATUS_IO_ERROR));
        };
        let request = [opcode, mpsse::SEND_IMMEDIATE];
        let written = self.transport.write_bytes(channel, &request)?;
        if written != request.len() {
            return Err(TransportError::new(STATUS_IO_ERROR));
        }
        let mut buf = [0u8; 1];
        let read = self.transport.read_bytes(channel, &mut buf)?;
        if read != 1 {
            return Err(TransportError::new(STATUS_IO_ERROR));
        }
        Ok(buf[0])
    }

    /// Full 16-bit pin snapshot: low byte group, then high byte group.
    fn read_snapshot(
        &self,
        inner: &mut Inner<T::Channel>,
    ) -> std::result::Result<u16, TransportError> {
        let low = self.read_group(inner, PinGroup::Low)?;
        let high = self.read_group(inner, PinGroup::High)?;
        Ok(u16::from(low) | (u16::from(high) << 8))
    }

    /// One poll tick while `Ready`: snapshot, compare input bits, notify.
    fn poll_once(&self) {
        let mut inner = self.lock_inner();
        if inner.channel.is_none() {
            return;
        }
        let snapshot = match self.read_snapshot(&mut inner) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("poll read failed: {}", e);
                self.disconnect(&mut inner);
                return;
            }
        };
        // Only bits of input-configured pins qualify; output and reserved
        // bits never represent external input.
        let input_mask = inner.bank.input_mask();
        let changed = (snapshot ^ inner.last_snapshot) & input_mask != 0;
        if changed {
            trace!(
                "input change: 0x{:04X} -> 0x{:04X}",
                inner.last_snapshot,
                snapshot
            );
            inner.last_snapshot = snapshot;
            inner.bank.apply_snapshot(snapshot);
        }
        drop(inner);
        if changed {
            self.notify(snapshot);
        }
    }

    fn notify(&self, snapshot: u16) {
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|tx| tx.send(snapshot).is_ok());
    }

    fn link(&self) -> LinkState {
        self.lock_inner().link
    }
}

fn channel_options(bank: &PinBank, clock: I2cSpeed) -> ChannelOptions {
    ChannelOptions {
        direction_low: bank.direction_byte(PinGroup::Low),
        value_low: bank.value_byte(PinGroup::Low),
        direction_high: bank.direction_byte(PinGroup::High),
        value_high: bank.value_byte(PinGroup::High),
        clock,
    }
}

/// The background worker: poll while `Ready`, back off and retry otherwise.
/// Runs until the adapter is dropped; there is no terminal state.
fn worker_loop<T: Transport>(shared: Arc<Shared<T>>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Relaxed) {
        match shared.link() {
            LinkState::Ready => {
                sleep_interruptibly(&stop, shared.config.poll_period);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                shared.poll_once();
            }
            LinkState::Disconnected | LinkState::Reconnecting => {
                sleep_interruptibly(&stop, shared.config.retry_backoff);
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                shared.try_connect();
            }
        }
    }
}

/// Sleeps in short slices so adapter teardown is not held up by a long
/// poll period or retry backoff.
fn sleep_interruptibly(stop: &AtomicBool, total: Duration) {
    const SLICE: Duration = Duration::from_millis(10);
    let mut remaining = total;
    while !stop.load(Ordering::Relaxed) && remaining > Duration::ZERO {
        let step = remaining.min(SLICE);
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
}
