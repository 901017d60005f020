use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;

/// 全局复用的 HTTP Client（统一连接池/Keep-Alive），避免每次请求重复创建。
///
/// Contents API 的单次写入在 30s 内完成是合理预期；`Client` 本身线程安全，
/// 适合全局复用。
static CLIENT_TIMEOUT_30S: OnceCell<Client> = OnceCell::new();

/// timeout=30s 的 HTTP Client，用于对内容仓库服务的写入请求。
pub fn client_timeout_30s() -> Result<&'static Client, reqwest::Error> {
    CLIENT_TIMEOUT_30S
        .get_or_try_init(|| Client::builder().timeout(Duration::from_secs(30)).build())
}
