#[cfg(not(target_arch = "wasm32"))]
pub mod health;
pub mod qr;
