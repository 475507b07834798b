// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor

use super::super::types::{BackendError, BackendResult, CameraDevice};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// Properties that carry the camera location, most specific first
const LOCATION_PROPERTIES: &[&str] = &["api.libcamera.location", "camera.location"];

/// Properties that identify a device stably across monitor runs
const PATH_PROPERTIES: &[&str] = &["object.serial", "api.v4l2.path", "device.path", "object.path"];

/// List video sources together with the GStreamer device used to open them
pub fn enumerate_devices() -> BackendResult<Vec<(CameraDevice, gst::Device)>> {
    gst::init().map_err(|e| BackendError::NotAvailable(format!("GStreamer init failed: {}", e)))?;

    let monitor = gst::DeviceMonitor::new();
    monitor.add_filter(Some("Video/Source"), None);
    monitor
        .start()
        .map_err(|e| BackendError::NotAvailable(format!("Device monitor failed to start: {}", e)))?;
    let devices = monitor.devices();
    monitor.stop();

    let cameras: Vec<_> = devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| {
            let camera = describe(&device, index);
            debug!(
                name = %camera.name,
                path = %camera.path,
                location = ?camera.camera_location,
                "Found video source"
            );
            (camera, device)
        })
        .collect();

    info!(count = cameras.len(), "Enumerated cameras via GStreamer");
    Ok(cameras)
}

fn describe(device: &gst::Device, index: usize) -> CameraDevice {
    let name = device.display_name().to_string();
    let properties = device.properties();

    let lookup = |keys: &[&str]| -> Option<String> {
        let structure = properties.as_ref()?;
        keys.iter().find_map(|key| property_string(structure, key))
    };

    let path = lookup(PATH_PROPERTIES)
        .map(|value| format!("gst:{}", value))
        .unwrap_or_else(|| format!("gst-index:{}:{}", index, name));

    CameraDevice {
        name,
        path,
        camera_location: lookup(LOCATION_PROPERTIES),
    }
}

/// Read a property that providers expose either as a string or a number
fn property_string(structure: &gst::StructureRef, key: &str) -> Option<String> {
    if let Ok(value) = structure.get::<String>(key) {
        return Some(value);
    }
    if let Ok(value) = structure.get::<u64>(key) {
        return Some(value.to_string());
    }
    structure.get::<i32>(key).ok().map(|value| value.to_string())
}
