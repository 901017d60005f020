use std::sync::Arc;

use crate::config::AppConfig;
use crate::features::upload::store::ContentStore;

/// 聚合的应用共享状态
///
/// 全部为只读：请求之间不共享任何可变状态，处理器无需加锁。
#[derive(Clone)]
pub struct AppState {
    /// 进程级配置。以注入方式传给处理器（而非在核心逻辑里读全局单例），
    /// 测试可以用假凭据/假仓库构造自己的实例。
    pub config: Arc<AppConfig>,
    /// 内容仓库客户端。trait 对象，测试中可替换为记录调用的桩。
    pub content_store: Arc<dyn ContentStore>,
}
