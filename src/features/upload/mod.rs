pub mod github;
pub mod handler;
pub mod links;
pub mod models;
pub mod spool;
pub mod storage_key;
pub mod store;

// 对外导出路由构建函数，便于 main.rs 引用
pub use handler::create_upload_router;
pub use store::{ContentStore, StoredContent};
