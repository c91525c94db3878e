#[cfg(not(target_arch = "wasm32"))]
mod background;
#[cfg(not(target_arch = "wasm32"))]
pub mod handler;
pub mod media;
pub mod service;
mod symbol;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub use background::BackgroundFetcher;
#[cfg(not(target_arch = "wasm32"))]
pub use handler::create_qr_router;
#[cfg(not(target_arch = "wasm32"))]
pub use service::QrService;
pub use service::{generate_in_process, symbol_info};
pub use symbol::{MAX_CANVAS_SIDE, QUIET_ZONE, QrSymbol};
pub use types::{GenerationRequest, GenerationResult, OutputFormat, SymbolInfo};
