use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8000
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "qraft=info,tower_http=info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// CORS 配置
///
/// 未写出的字段取 `frontend_defaults()` 中的值，只调整个别字段时不会丢失默认放行列表。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// 是否启用 CORS
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    /// 前端站点的默认放行列表（线上域名 + 本地开发端口）。
    pub fn frontend_defaults() -> Self {
        let origins = [
            "https://qrcode-artistic.vercel.app",
            "https://qraft.shauryaa.dev",
            "http://localhost:3000",
            "http://localhost:3001",
            "http://localhost:4001",
            "http://127.0.0.1:3000",
            "http://127.0.0.1:3001",
            "http://127.0.0.1:4001",
        ];
        Self {
            enabled: true,
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            allowed_methods: vec!["GET".into(), "POST".into(), "OPTIONS".into()],
            // 携带凭证时不允许 "*"，这里列出前端实际会发送的请求头。
            allowed_headers: vec![
                "content-type".into(),
                "authorization".into(),
                "x-request-id".into(),
            ],
            expose_headers: vec!["x-request-id".into(), "content-disposition".into()],
            allow_credentials: true,
            max_age_secs: Some(600),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::frontend_defaults()
    }
}

/// 二维码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrConfig {
    /// 表单未提供 scale 时的默认值
    #[serde(default = "QrConfig::default_scale")]
    pub default_scale: u32,
    /// 表单未提供 kind 时的默认输出格式
    #[serde(default = "QrConfig::default_kind")]
    pub default_kind: String,
    /// 背景图拉取超时（秒）
    #[serde(default = "QrConfig::default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// 请求体（含上传背景图）大小上限（字节）
    #[serde(default = "QrConfig::default_max_upload")]
    pub max_upload_bytes: usize,
    /// 按 URL 拉取的背景图大小上限（字节）
    #[serde(default = "QrConfig::default_max_background")]
    pub max_background_bytes: usize,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl QrConfig {
    fn default_scale() -> u32 {
        8
    }
    fn default_kind() -> String {
        "png".to_string()
    }
    fn default_fetch_timeout() -> u64 {
        10
    }
    fn default_max_upload() -> usize {
        10 * 1024 * 1024
    }
    fn default_max_background() -> usize {
        10 * 1024 * 1024
    }

    /// 背景图拉取超时
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// 实际生效的并发渲染许可数
    pub fn effective_parallelism(&self) -> usize {
        match self.max_parallel {
            0 => num_cpus::get().max(1),
            n => n as usize,
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            default_scale: Self::default_scale(),
            default_kind: Self::default_kind(),
            fetch_timeout_secs: Self::default_fetch_timeout(),
            max_upload_bytes: Self::default_max_upload(),
            max_background_bytes: Self::default_max_background(),
            max_parallel: 0,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 二维码生成配置
    #[serde(default)]
    pub qr: QrConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可缺省），支持环境变量覆盖
    ///
    /// 加载发生在日志初始化之前，结果由调用方记录。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        let builder = ConfigBuilder::builder()
            // 加载配置文件（不存在时全部使用默认值）
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_SERVER__PORT
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(AppConfig::default)
    }

    /// 初始化全局配置并返回其引用
    pub fn init_global() -> Result<&'static AppConfig, ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(Self::global())
    }

    /// 获取配置文件路径（可通过 QRAFT_CONFIG 指定）
    pub fn get_config_path() -> PathBuf {
        std::env::var_os("QRAFT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            qr: QrConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_frontend_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.qr.default_scale, 8);
        assert_eq!(cfg.qr.default_kind, "png");
        assert_eq!(cfg.qr.fetch_timeout(), Duration::from_secs(10));
        assert!(cfg.cors.enabled);
        assert!(
            cfg.cors
                .allowed_origins
                .iter()
                .any(|o| o == "https://qraft.shauryaa.dev")
        );
        assert_eq!(cfg.cors.allowed_methods, vec!["GET", "POST", "OPTIONS"]);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: AppConfig = ConfigBuilder::builder()
            .add_source(File::from_str(
                "[server]\nport = 9001\n\n[qr]\nfetch_timeout_secs = 3\n",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize config");

        assert_eq!(cfg.server.port, 9001);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.qr.fetch_timeout_secs, 3);
        assert_eq!(cfg.qr.default_scale, 8);
        assert!(cfg.cors.enabled);
    }

    #[test]
    fn partial_cors_section_keeps_frontend_allow_list() {
        let cfg: AppConfig = ConfigBuilder::builder()
            .add_source(File::from_str(
                "[cors]\nmax_age_secs = 60\n",
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize config");

        let defaults = CorsConfig::frontend_defaults();
        assert_eq!(cfg.cors.max_age_secs, Some(60));
        assert!(cfg.cors.enabled);
        assert!(cfg.cors.allow_credentials);
        assert_eq!(cfg.cors.allowed_origins, defaults.allowed_origins);
        assert_eq!(cfg.cors.allowed_methods, defaults.allowed_methods);
    }

    #[test]
    fn cors_can_still_be_disabled_explicitly() {
        let cfg: AppConfig = ConfigBuilder::builder()
            .add_source(File::from_str("[cors]\nenabled = false\n", config::FileFormat::Toml))
            .build()
            .expect("build config")
            .try_deserialize()
            .expect("deserialize config");
        assert!(!cfg.cors.enabled);
        assert!(!cfg.cors.allowed_origins.is_empty());
    }

    #[test]
    fn zero_parallelism_means_cpu_count() {
        let qr = QrConfig::default();
        assert!(qr.effective_parallelism() >= 1);
        let fixed = QrConfig {
            max_parallel: 2,
            ..QrConfig::default()
        };
        assert_eq!(fixed.effective_parallelism(), 2);
    }
}
