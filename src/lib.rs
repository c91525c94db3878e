/// 统一错误处理模块
pub mod error;

/// 功能聚合模块
pub mod features;

/// 配置模块
#[cfg(not(target_arch = "wasm32"))]
pub mod config;

/// HTTP 应用组装（路由与中间件）
#[cfg(not(target_arch = "wasm32"))]
pub mod app;

/// CORS 中间件构建
#[cfg(not(target_arch = "wasm32"))]
pub mod cors;

/// HTTP Client 复用工具
#[cfg(not(target_arch = "wasm32"))]
pub mod http;

/// OpenAPI 文档
#[cfg(not(target_arch = "wasm32"))]
pub mod openapi;

/// 请求 ID 中间件
#[cfg(not(target_arch = "wasm32"))]
pub mod request_id;

/// 优雅退出管理模块
#[cfg(not(target_arch = "wasm32"))]
pub mod shutdown;

/// 应用状态聚合模块
#[cfg(not(target_arch = "wasm32"))]
pub mod state;

/// 浏览器端导出
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// 导出常用类型供外部使用
pub use error::AppError;
pub use features::qr::{GenerationRequest, GenerationResult, generate_in_process, symbol_info};

#[cfg(not(target_arch = "wasm32"))]
pub use config::AppConfig;
#[cfg(not(target_arch = "wasm32"))]
pub use shutdown::{ShutdownManager, ShutdownReason};
