use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// 全局复用的背景图拉取 Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// 仅在超时与默认值（10s）一致时复用；其他超时按需单独构建。
static CLIENT_TIMEOUT_10S: OnceCell<Client> = OnceCell::new();

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

fn build(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("qraft/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// timeout=10s 的 HTTP Client（背景图拉取的默认超时）。
pub fn client_timeout_10s() -> Result<&'static Client, reqwest::Error> {
    CLIENT_TIMEOUT_10S.get_or_try_init(|| build(DEFAULT_FETCH_TIMEOUT))
}

/// 按指定超时获取 HTTP Client。
pub fn client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    if timeout == DEFAULT_FETCH_TIMEOUT {
        return client_timeout_10s().cloned();
    }
    build(timeout)
}
