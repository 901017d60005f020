use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

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
        3000
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
    /// 日志级别
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    fn default_format() -> String {
        "full".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀
    #[serde(default = "ApiConfig::default_prefix")]
    pub prefix: String,
}

impl ApiConfig {
    fn default_prefix() -> String {
        "/api".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: Self::default_prefix(),
        }
    }
}

/// CORS 配置
///
/// 默认值即对外契约要求的头部组合：任意来源、POST/OPTIONS、
/// Content-Type / X-Requested-With / Accept。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_headers")]
    pub allowed_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_allowed_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    fn default_allowed_methods() -> Vec<String> {
        vec!["POST".to_string(), "OPTIONS".to_string()]
    }

    fn default_allowed_headers() -> Vec<String> {
        vec![
            "Content-Type".to_string(),
            "X-Requested-With".to_string(),
            "Accept".to_string(),
        ]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_allowed_origins(),
            allowed_methods: Self::default_allowed_methods(),
            allowed_headers: Self::default_allowed_headers(),
            max_age_secs: None,
        }
    }
}

/// GitHub 内容仓库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// 访问令牌（机密，严禁写入日志或错误响应）
    #[serde(default)]
    pub token: String,
    /// Contents API 基地址
    #[serde(default = "GithubConfig::default_api_base_url")]
    pub api_base_url: String,
    /// 仓库所有者（用户名/组织名）
    #[serde(default)]
    pub owner: String,
    /// 仓库名
    #[serde(default)]
    pub repo: String,
    /// 目标分支
    #[serde(default = "GithubConfig::default_branch")]
    pub branch: String,
    /// 提交者名称
    #[serde(default = "GithubConfig::default_committer_name")]
    pub committer_name: String,
    /// 提交者邮箱
    #[serde(default = "GithubConfig::default_committer_email")]
    pub committer_email: String,
}

impl GithubConfig {
    fn default_api_base_url() -> String {
        "https://api.github.com".to_string()
    }

    fn default_branch() -> String {
        "main".to_string()
    }

    fn default_committer_name() -> String {
        "GitHub Image Uploader".to_string()
    }

    fn default_committer_email() -> String {
        "uploader@example.com".to_string()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base_url: Self::default_api_base_url(),
            owner: String::new(),
            repo: String::new(),
            branch: Self::default_branch(),
            committer_name: Self::default_committer_name(),
            committer_email: Self::default_committer_email(),
        }
    }
}

/// 响应主链接类型（按部署固定，不随请求变化）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryLink {
    /// GitHub Pages CDN 直链
    #[default]
    Cdn,
    /// github.com blob 页面链接
    Blob,
}

/// 上传行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 单文件大小上限（字节），multipart 路径生效
    #[serde(default = "UploadConfig::default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
    /// 可选的代理前缀，整段拼接在完整 URL 之前（例如 https://gh.example.com/）
    #[serde(default)]
    pub proxy_prefix: Option<String>,
    /// Pages 直链域名
    #[serde(default = "UploadConfig::default_pages_host")]
    pub pages_host: String,
    /// 代码托管域名（blob 链接）
    #[serde(default = "UploadConfig::default_code_host")]
    pub code_host: String,
    /// 文件名时间戳使用的固定时区（IANA 名称）
    #[serde(default = "UploadConfig::default_timezone")]
    pub timezone: String,
    /// 响应主链接类型
    #[serde(default)]
    pub primary_link: PrimaryLink,
}

impl UploadConfig {
    fn default_max_file_size_bytes() -> u64 {
        5 * 1024 * 1024
    }

    fn default_pages_host() -> String {
        "github.io".to_string()
    }

    fn default_code_host() -> String {
        "github.com".to_string()
    }

    fn default_timezone() -> String {
        "Asia/Shanghai".to_string()
    }

    /// 解析配置时区；名称非法时回退 UTC 并告警。
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            tracing::warn!("无法解析时区 {:?}，回退为 UTC", self.timezone);
            chrono_tz::Tz::UTC
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: Self::default_max_file_size_bytes(),
            proxy_prefix: None,
            pages_host: Self::default_pages_host(),
            code_host: Self::default_code_host(),
            timezone: Self::default_timezone(),
            primary_link: PrimaryLink::default(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// GitHub 内容仓库配置
    #[serde(default)]
    pub github: GithubConfig,
    /// 上传行为配置
    #[serde(default)]
    pub upload: UploadConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 配置文件可缺省（纯环境变量部署），环境变量形如 `APP_GITHUB__TOKEN`。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件（允许缺省）", config_path);

        let builder = ConfigBuilder::builder()
            // 加载配置文件（缺省时仅用默认值 + 环境变量）
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_GITHUB__TOKEN / APP_SERVER__PORT。
            // 层级分隔符必须是双下划线：字段名本身含下划线
            // （如 upload.max_file_size_bytes），单下划线会切错层级。
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;

        // 调试：只打印 token 是否存在，绝不打印其内容
        tracing::debug!(
            "配置加载完成: github.token {}，目标仓库 {}/{}@{}",
            if config.github.token.is_empty() {
                "未设置"
            } else {
                "已设置"
            },
            config.github.owner,
            config.github.repo,
            config.github.branch,
        );

        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
