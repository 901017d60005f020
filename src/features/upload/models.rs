use serde::{Deserialize, Serialize};

/// JSON 上传请求体
///
/// 字段手工校验（而非依赖反序列化失败），缺失时返回本端点自己的
/// 400 外形。
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct JsonUploadRequest {
    /// Base64 编码的图片内容
    pub image: Option<String>,
    /// 图片 MIME 类型（如 image/png）
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
}

/// JSON 上传成功响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JsonUploadResponse {
    /// 仓库 blob 页面链接
    pub blob_url: String,
    /// Pages CDN 直链
    pub cdn_url: String,
    /// 仓库内存储路径（存储键）
    pub path: String,
    /// 内容摘要（blob SHA）
    pub sha: String,
}

/// 表单上传成功响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FormUploadResponse {
    /// 恒为 true
    pub success: bool,
    /// 主链接（按部署配置为 CDN 或 blob，含代理前缀）
    pub url: String,
    /// 删除端点占位符（删除功能未实现）
    pub delete_url: String,
    /// 人类可读的结果说明
    pub message: String,
    /// blob 页面链接（含代理前缀），供前端内部使用
    #[serde(rename = "blobUrlForInternalUse")]
    pub blob_url_for_internal_use: String,
}

#[cfg(test)]
mod tests {
    use super::{FormUploadResponse, JsonUploadRequest, JsonUploadResponse};

    /// 对外 JSON 字段命名必须与历史契约一致（camelCase / 显式 rename）。
    #[test]
    fn json_response_serializes_with_contract_field_names() {
        let resp = JsonUploadResponse {
            blob_url: "b".to_string(),
            cdn_url: "c".to_string(),
            path: "images/x.png".to_string(),
            sha: "abc123".to_string(),
        };
        let v = serde_json::to_value(resp).expect("serialize json");
        assert!(v.get("blobUrl").is_some());
        assert!(v.get("cdnUrl").is_some());
        assert!(v.get("blob_url").is_none());
    }

    #[test]
    fn form_response_keeps_snake_case_delete_url_and_renamed_blob_field() {
        let resp = FormUploadResponse {
            success: true,
            url: "u".to_string(),
            delete_url: "d".to_string(),
            message: "m".to_string(),
            blob_url_for_internal_use: "b".to_string(),
        };
        let v = serde_json::to_value(resp).expect("serialize json");
        assert!(v.get("delete_url").is_some());
        assert!(v.get("blobUrlForInternalUse").is_some());
    }

    #[test]
    fn json_request_tolerates_missing_fields() {
        let req: JsonUploadRequest = serde_json::from_str("{}").expect("parse");
        assert!(req.image.is_none());
        assert!(req.mime_type.is_none());

        let req: JsonUploadRequest =
            serde_json::from_str(r#"{"image":"aGVsbG8=","type":"image/png"}"#).expect("parse");
        assert_eq!(req.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(req.mime_type.as_deref(), Some("image/png"));
    }
}
