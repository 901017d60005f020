use chrono::Utc;
use chrono_tz::Tz;
use rand::Rng;

/// 调用方可指定的输出格式允许清单
const OUTPUT_FORMAT_ALLOW_LIST: &[&str] = &["jpeg", "png", "webp", "gif", "bmp", "tiff", "avif"];

/// 存储键的逻辑目录前缀
const LOGICAL_DIR: &str = "images";

/// 无法从 MIME 解析出子类型时的兜底扩展名
const DEFAULT_EXT: &str = "png";

/// 随机后缀长度（小写 base36）。
///
/// 同一秒内基名相同，唯一性只靠后缀：6 位下一秒内生成 1 万个键的
/// 碰撞概率约 2e-5。不做查重，也不做碰撞重试。
const SUFFIX_LEN: usize = 6;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// 生成存储键：`images/<YYYYMMDDHHmmss>_<随机后缀>.<扩展名>`
///
/// 时间基名取固定时区的本地时刻，全部端点共用这一种方案。
pub fn generate_storage_key(tz: Tz, mime_type: &str, requested_format: Option<&str>) -> String {
    let ext = resolve_extension(mime_type, requested_format);
    let basename = Utc::now().with_timezone(&tz).format("%Y%m%d%H%M%S");
    format!(
        "{}/{}_{}.{}",
        LOGICAL_DIR,
        basename,
        random_suffix(),
        ext
    )
}

/// 解析扩展名。
///
/// 优先级：允许清单内的 outputFormat > MIME 子类型 > `png` 兜底；
/// 唯一的归一化规则是 `jpeg → jpg`。匹配不区分大小写。
pub fn resolve_extension(mime_type: &str, requested_format: Option<&str>) -> String {
    if let Some(requested) = requested_format {
        let requested = requested.trim().to_ascii_lowercase();
        if OUTPUT_FORMAT_ALLOW_LIST.contains(&requested.as_str()) {
            return normalize_ext(&requested).to_string();
        }
    }

    let subtype = mime_type
        .split('/')
        .nth(1)
        .and_then(|s| s.split(';').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match subtype {
        Some(s) => normalize_ext(&s.to_ascii_lowercase()).to_string(),
        None => DEFAULT_EXT.to_string(),
    }
}

fn normalize_ext(ext: &str) -> &str {
    if ext == "jpeg" { "jpg" } else { ext }
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_storage_key, resolve_extension};
    use std::collections::HashSet;

    const TZ: chrono_tz::Tz = chrono_tz::Asia::Shanghai;

    #[test]
    fn resolve_extension_maps_jpeg_to_jpg() {
        assert_eq!(resolve_extension("image/jpeg", None), "jpg");
        assert_eq!(resolve_extension("image/png", Some("jpeg")), "jpg");
    }

    #[test]
    fn resolve_extension_defaults_to_png() {
        assert_eq!(resolve_extension("image", None), "png");
        assert_eq!(resolve_extension("", None), "png");
        assert_eq!(resolve_extension("image/ ", None), "png");
    }

    #[test]
    fn resolve_extension_honors_allow_listed_output_format() {
        assert_eq!(resolve_extension("image/png", Some("webp")), "webp");
        assert_eq!(resolve_extension("image/png", Some("WEBP")), "webp");
        // 清单外的请求被忽略，回落到 MIME 子类型
        assert_eq!(resolve_extension("image/png", Some("exe")), "png");
        assert_eq!(resolve_extension("image/gif", Some("auto")), "gif");
    }

    #[test]
    fn resolve_extension_strips_mime_parameters() {
        assert_eq!(resolve_extension("image/png; charset=binary", None), "png");
    }

    #[test]
    fn storage_key_has_expected_shape() {
        let key = generate_storage_key(TZ, "image/jpeg", None);
        let rest = key.strip_prefix("images/").expect("images/ 前缀");
        let (base, ext) = rest.rsplit_once('.').expect("扩展名分隔");
        assert_eq!(ext, "jpg");

        let (ts, suffix) = base.split_once('_').expect("下划线分隔");
        assert_eq!(ts.len(), 14);
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 6);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    /// 紧循环生成 1 万个键必须全不相同（同秒基名相同，唯一性全靠后缀）。
    #[test]
    fn storage_keys_do_not_collide_within_one_second() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let key = generate_storage_key(TZ, "image/png", None);
            assert!(seen.insert(key), "生成了重复的存储键");
        }
    }
}
