use axum::{
    Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::Json,
    routing::post,
};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use crate::config::AppConfig;
use crate::error::{AppError, FormApiError, JsonApiError};
use crate::state::AppState;

use super::links::AssetLinks;
use super::models::{FormUploadResponse, JsonUploadRequest, JsonUploadResponse};
use super::spool::SpooledImage;
use super::storage_key;

/// 删除端点尚未实现，响应中的 delete_url 固定为占位符。
const DELETE_URL_PLACEHOLDER: &str = "https://api.yourdomain.com/delete?id=NotImplementedYet";

/// 构建上传路由
///
/// 两个端点共用一条流水线：校验 → 生成存储键 → 写内容仓库 → 组装链接。
/// OPTIONS 一律应答 200 空体；预检请求在外层 CORS 中间件处已被拦截。
pub fn create_upload_router(config: &AppConfig) -> Router<AppState> {
    // multipart 体积还包含边界与字段头，body 上限给出富余；
    // 413 的语义判定由处理器按配置的文件上限自行完成。
    let body_limit = (config.upload.max_file_size_bytes as usize).saturating_mul(2);

    Router::new()
        .route("/upload", post(upload_json).options(preflight))
        .route(
            "/v1",
            post(upload_form)
                .options(preflight)
                .fallback(form_method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn form_method_not_allowed() -> FormApiError {
    FormApiError(AppError::MethodNotAllowed(
        "Method Not Allowed. Only POST is supported.".to_string(),
    ))
}

/// 校验上传所需的服务端配置是否齐全；message 不包含任何机密值。
fn ensure_github_config(config: &AppConfig) -> Result<(), AppError> {
    if config.github.token.trim().is_empty() {
        return Err(AppError::Configuration(
            "Server configuration error: GitHub token missing.".to_string(),
        ));
    }
    if config.github.owner.is_empty() || config.github.repo.is_empty() {
        return Err(AppError::Configuration(
            "Server configuration error: target repository not configured.".to_string(),
        ));
    }
    Ok(())
}

fn commit_message_for(storage_key: &str) -> String {
    let filename = storage_key.rsplit('/').next().unwrap_or(storage_key);
    format!("Upload image: {}", filename)
}

#[utoipa::path(
    post,
    path = "/upload",
    summary = "上传图片（Base64 JSON）",
    description = "接收 Base64 图片与 MIME 类型，写入内容仓库后返回 blob/CDN 链接。",
    request_body = JsonUploadRequest,
    responses(
        (status = 200, description = "上传成功", body = JsonUploadResponse),
        (status = 400, description = "缺少 image/type 或请求体非法", body = crate::error::JsonErrorBody),
        (status = 500, description = "配置错误或内容仓库失败", body = crate::error::JsonErrorBody)
    ),
    tag = "Upload"
)]
pub async fn upload_json(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JsonUploadResponse>, JsonApiError> {
    // 手工解析：非法 JSON 与缺字段都要落到本端点的 400 外形，
    // 而不是框架默认的拒绝响应。
    let req: JsonUploadRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("Invalid JSON body.".to_string()))?;

    let image = req.image.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let mime_type = req
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (Some(image), Some(mime_type)) = (image, mime_type) else {
        return Err(AppError::Validation(
            "Missing image data or type. Please provide Base64 image and its MIME type."
                .to_string(),
        )
        .into());
    };

    ensure_github_config(&state.config)?;

    let key = storage_key::generate_storage_key(state.config.upload.tz(), mime_type, None);
    let stored = state
        .content_store
        .put(&key, image, &commit_message_for(&key))
        .await?;

    let links = AssetLinks::build(&state.config.github, &state.config.upload, &key);
    tracing::info!(path = %key, sha = %stored.sha, "图片上传成功");
    tracing::debug!(markdown = %links.markdown, "Markdown 引用");

    Ok(Json(JsonUploadResponse {
        blob_url: links.blob_url,
        cdn_url: links.cdn_url,
        path: key,
        sha: stored.sha,
    }))
}

#[utoipa::path(
    post,
    path = "/v1",
    summary = "上传图片（multipart 表单）",
    description = "接收表单文件字段 image 与可选 outputFormat，写入内容仓库后返回（可代理的）公开链接。",
    responses(
        (status = 200, description = "上传成功", body = FormUploadResponse),
        (status = 400, description = "未携带图片文件", body = crate::error::FormErrorBody),
        (status = 405, description = "非 POST/OPTIONS 方法", body = crate::error::FormErrorBody),
        (status = 413, description = "文件超过大小上限", body = crate::error::FormErrorBody),
        (status = 500, description = "配置错误、解码失败或内容仓库失败", body = crate::error::FormErrorBody)
    ),
    tag = "Upload"
)]
pub async fn upload_form(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FormUploadResponse>, FormApiError> {
    // 提取器本身的拒绝（非 multipart 的 Content-Type、缺 boundary 等）
    // 也必须落到本端点的 {success:false, message} 外形，而不是框架的
    // 纯文本响应。
    let multipart = multipart.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("File too large.".to_string())
        } else {
            AppError::Decode(format!("File parsing error: {}", rejection.body_text()))
        }
    })?;

    let form = decode_form(multipart).await?;

    let Some(image) = form.image else {
        return Err(AppError::Validation("No image file uploaded.".to_string()).into());
    };

    tracing::debug!(
        file_name = form.file_name.as_deref().unwrap_or("<unnamed>"),
        mime_type = image.mime_type.as_deref().unwrap_or("<none>"),
        size = image.bytes.len(),
        "收到表单图片"
    );

    let max = state.config.upload.max_file_size_bytes;
    if image.bytes.len() as u64 > max {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Max {}MB allowed.",
            max / (1024 * 1024)
        ))
        .into());
    }

    ensure_github_config(&state.config)?;

    // 解码后的字节经临时文件落盘再读回：与表单解析器"先落盘后消费"的
    // 契约一致；guard 在任意退出路径上都会删除临时文件。
    let spool = SpooledImage::write(&image.bytes).await?;
    let content_base64 = BASE64_STANDARD.encode(spool.read().await?);

    let key = storage_key::generate_storage_key(
        state.config.upload.tz(),
        image.mime_type.as_deref().unwrap_or(""),
        form.output_format.as_deref(),
    );
    let stored = state
        .content_store
        .put(&key, &content_base64, &commit_message_for(&key))
        .await?;
    drop(spool);

    let links = AssetLinks::build(&state.config.github, &state.config.upload, &key);
    tracing::info!(path = %key, sha = %stored.sha, "图片上传成功");

    let url = links.primary(state.config.upload.primary_link).to_string();
    Ok(Json(FormUploadResponse {
        success: true,
        url,
        delete_url: DELETE_URL_PLACEHOLDER.to_string(),
        message: "图片上传成功！".to_string(),
        blob_url_for_internal_use: links.blob_url,
    }))
}

/// 解码后的表单内容（已在解码边界归一化）
struct DecodedForm {
    image: Option<DecodedImage>,
    file_name: Option<String>,
    output_format: Option<String>,
}

struct DecodedImage {
    bytes: Bytes,
    mime_type: Option<String>,
}

/// 消费 multipart 流并归一化字段。
///
/// 解码器可能把同名字段呈现为单值或序列（多次出现）：这里一律取
/// 首个出现值，歧义不外泄到核心逻辑。
async fn decode_form(mut multipart: Multipart) -> Result<DecodedForm, AppError> {
    let mut form = DecodedForm {
        image: None,
        file_name: None,
        output_format: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_err)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let mime_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(map_multipart_err)?;
                if form.image.is_none() {
                    form.image = Some(DecodedImage { bytes, mime_type });
                    form.file_name = file_name;
                }
            }
            Some("outputFormat") => {
                let text = field.text().await.map_err(map_multipart_err)?;
                if form.output_format.is_none() {
                    form.output_format = Some(text.trim().to_ascii_lowercase());
                }
            }
            _ => {
                // 未知字段：消费并丢弃，保证流能继续推进
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

fn map_multipart_err(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File too large.".to_string())
    } else {
        AppError::Decode(format!("File parsing error: {}", err))
    }
}
