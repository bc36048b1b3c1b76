//! WebAssembly bindings for qoiexp-rs.
//!
//! This module provides JavaScript-compatible functions via wasm-bindgen
//! for use in browsers and Node.js.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Image information returned from WASM API.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct QoiImageInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub colorspace: u8,
}

/// Encode interleaved RGB/RGBA samples into a QOI image.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn encode_qoi(
    data: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    colorspace: u8,
) -> Result<Vec<u8>, JsValue> {
    let info = crate::ImageInfo::from_raw(width, height, channels, colorspace)
        .map_err(|e| JsValue::from_str(&format!("Encode error: {}", e)))?;
    crate::encode_to_vec(data, &info).map_err(|e| JsValue::from_str(&format!("Encode error: {}", e)))
}

/// Decode a QOI image to raw interleaved samples.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn decode_qoi(data: &[u8]) -> Result<Vec<u8>, JsValue> {
    let (_, pixels) = crate::decode_from_slice(data)
        .map_err(|e| JsValue::from_str(&format!("Decode error: {}", e)))?;
    Ok(pixels)
}

/// Read the header of a QOI image without decoding pixels.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn read_qoi_info(data: &[u8]) -> Result<QoiImageInfo, JsValue> {
    let info =
        crate::read_info(data).map_err(|e| JsValue::from_str(&format!("Header error: {}", e)))?;
    Ok(QoiImageInfo {
        width: info.width,
        height: info.height,
        channels: info.channels.into(),
        colorspace: info.colorspace,
    })
}
