//! Simulated device link.
//!
//! Implements [`DeviceLink`] without any transport so the bridge can run
//! end to end on a host with no device server. The first scan "finds" one
//! vibrator; hooks let tests remove it or drop the server.

use core::cell::{Cell, RefCell};

use log::{debug, info};

use crate::app::ports::{DeviceHandle, DeviceLink};
use crate::channels::{DeviceEventHub, LinkEvent};
use crate::error::LinkError;

/// Name of the device the first scan discovers.
pub const SIM_DEVICE_NAME: &str = "Simulated Vibrator";

pub struct SimDeviceLink<'a> {
    hub: &'a DeviceEventHub,
    connected: Cell<bool>,
    scanning: Cell<bool>,
    next_index: Cell<u32>,
    devices: RefCell<Vec<DeviceHandle>>,
    level: Cell<f64>,
}

impl<'a> SimDeviceLink<'a> {
    pub fn new(hub: &'a DeviceEventHub) -> Self {
        Self {
            hub,
            connected: Cell::new(false),
            scanning: Cell::new(false),
            next_index: Cell::new(0),
            devices: RefCell::new(Vec::new()),
            level: Cell::new(0.0),
        }
    }

    /// Intensity the simulated device is currently running at.
    pub fn level(&self) -> f64 {
        self.level.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.get()
    }

    /// Make a new device appear, as if it had been switched on.
    pub fn add_device(&self, name: &str) -> DeviceHandle {
        let index = self.next_index.get();
        self.next_index.set(index.wrapping_add(1));
        let device = DeviceHandle::new(index, name);
        self.devices.borrow_mut().push(device.clone());
        info!("SimLink: device added {}", device);
        self.hub.publish(LinkEvent::DeviceAdded(device.clone()));
        device
    }

    /// Make a device disappear, as if it had been switched off.
    pub fn remove_device(&self, index: u32) {
        let removed = {
            let mut devices = self.devices.borrow_mut();
            let pos = devices.iter().position(|d| d.index == index);
            pos.map(|pos| devices.remove(pos))
        };
        if let Some(device) = removed {
            info!("SimLink: device removed {}", device);
            self.level.set(0.0);
            self.hub.publish(LinkEvent::DeviceRemoved(device));
        }
    }

    /// Drop the simulated server connection.
    pub fn disconnect(&self) {
        self.connected.set(false);
        self.devices.borrow_mut().clear();
        self.level.set(0.0);
        info!("SimLink: server disconnected");
        self.hub.publish(LinkEvent::ServerDisconnected);
    }

    fn ensure_connected(&self) -> Result<(), LinkError> {
        if self.connected.get() {
            Ok(())
        } else {
            Err(LinkError::Disconnected)
        }
    }
}

impl DeviceLink for SimDeviceLink<'_> {
    async fn connect(&self, address: &str) -> Result<(), LinkError> {
        if !(address.starts_with("ws://") || address.starts_with("wss://")) {
            return Err(LinkError::ConnectFailed(format!("unsupported address '{address}'")));
        }
        self.connected.set(true);
        info!("SimLink: connected to {}", address);
        Ok(())
    }

    async fn start_scan(&self) -> Result<(), LinkError> {
        if !self.connected.get() {
            return Err(LinkError::ScanFailed("not connected".into()));
        }
        self.scanning.set(true);
        if self.next_index.get() == 0 {
            self.add_device(SIM_DEVICE_NAME);
        }
        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), LinkError> {
        self.scanning.set(false);
        Ok(())
    }

    fn known_devices(&self) -> Vec<DeviceHandle> {
        self.devices.borrow().clone()
    }

    async fn send_intensity(&self, device: &DeviceHandle, value: f64) -> Result<(), LinkError> {
        self.ensure_connected()?;
        if !self.devices.borrow().iter().any(|d| d.same_device(device)) {
            return Err(LinkError::DeviceGone);
        }
        self.level.set(value);
        debug!("SimLink: {} at {:.2}", device.name, value);
        Ok(())
    }

    async fn stop_all(&self) -> Result<(), LinkError> {
        self.ensure_connected()?;
        self.level.set(0.0);
        Ok(())
    }
}
