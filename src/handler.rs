//! Synchronized facade over the GPIO adapter.
//!
//! [`IoHandler`] is the surface application code talks to: it holds the
//! adapter behind an `Arc`, serializes the pin operations of competing
//! callers through one facade-level lock and re-exposes the change
//! subscription. The facade adds no behavior of its own — every call
//! forwards to [`Ft232h`] and returns its result unchanged.

use crate::device::{AdapterConfig, Ft232h, LinkState};
use crate::error::Result;
use crate::gpio::{GpioLevel, GpioPin, PinMode};
use crate::transport::Transport;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

/// Thread-safe pin operation facade.
pub struct IoHandler<T: Transport> {
    adapter: Arc<Ft232h<T>>,
    op_lock: Mutex<()>,
}

impl<T: Transport> IoHandler<T> {
    /// Creates the facade over a freshly started adapter.
    pub fn new(transport: T, config: AdapterConfig) -> Self {
        Self::with_adapter(Arc::new(Ft232h::new(transport, config)))
    }

    /// Wraps an existing adapter, e.g. one that is also shared with I2C
    /// peripherals.
    pub fn with_adapter(adapter: Arc<Ft232h<T>>) -> Self {
        IoHandler {
            adapter,
            op_lock: Mutex::new(()),
        }
    }

    /// The underlying adapter, for use as an I2C master.
    pub fn adapter(&self) -> Arc<Ft232h<T>> {
        Arc::clone(&self.adapter)
    }

    /// Current readiness of the link.
    pub fn link_state(&self) -> LinkState {
        self.adapter.link_state()
    }

    /// See [`Ft232h::configure_pin`].
    pub fn configure_pin(&self, pin: GpioPin, mode: PinMode) -> Result<()> {
        let _guard = self.op_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.adapter.configure_pin(pin, mode)
    }

    /// See [`Ft232h::write_pin`].
    pub fn write_pin(&self, pin: GpioPin, level: GpioLevel) -> Result<()> {
        let _guard = self.op_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.adapter.write_pin(pin, level)
    }

    /// See [`Ft232h::read_pin`].
    pub fn read_pin(&self, pin: GpioPin) -> Result<GpioLevel> {
        let _guard = self.op_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.adapter.read_pin(pin)
    }

    /// Subscribes to input-pin change notifications.
    pub fn subscribe(&self) -> Receiver<u16> {
        self.adapter.subscribe()
    }
}
