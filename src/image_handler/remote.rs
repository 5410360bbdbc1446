//! # 远程图片下载
//!
//! 生成接口返回的结果地址、配置成远程地址的品牌素材都走这里，按不可信输入处理：
//!
//! - 目标检查：只允许 http/https，默认拒绝本地与内网地址（含 DNS 解析结果）
//! - 重定向：客户端不自动跟随，每一跳都重新做目标检查
//! - 重试：只对 408/429/5xx 与连接类错误做有限次指数退避
//! - 读取：首包 / 分块超时、累计体积上限、最后做一次签名校验

use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{StatusCode, Url};
use tokio::net::lookup_host;

use super::loader::{
    check_signature, ensure_within, redact_url_for_log, sanitize_error_message_with_redacted_url,
};
use super::{ImageConfig, ImageError};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 200;

/// 单次下载使用的 HTTP 客户端与配置快照。
pub(super) struct RemoteFetcher<'a> {
    client: reqwest::Client,
    config: &'a ImageConfig,
}

impl<'a> RemoteFetcher<'a> {
    pub(super) fn new(config: &'a ImageConfig) -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ImageError::Network(format!("无法创建下载客户端：{}", e)))?;

        Ok(Self { client, config })
    }

    /// 下载并返回图片字节。
    pub(super) async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let mut target =
            Url::parse(url).map_err(|e| ImageError::InvalidFormat(format!("URL 格式错误：{}", e)))?;
        check_target(&target, self.config).await?;

        let mut hops = 0usize;
        loop {
            let response = self.get_with_retry(&target).await?;
            let status = response.status();

            if status.is_redirection() {
                hops += 1;
                if hops > self.config.max_redirects {
                    return Err(ImageError::Network(format!(
                        "重定向超过 {} 次",
                        self.config.max_redirects
                    )));
                }
                target = next_hop(&target, &response)?;
                check_target(&target, self.config).await?;
                log::debug!("↪️ 重定向到 {}", redact_url_for_log(target.as_str()));
                continue;
            }

            if !status.is_success() {
                return Err(ImageError::Network(format!("下载失败：HTTP {}", status.as_u16())));
            }

            if let Some(content_type) = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
                if !is_image_content_type(content_type) {
                    return Err(ImageError::InvalidFormat(format!("响应不是图片：{}", content_type)));
                }
            }

            return self.read_limited(response).await;
        }
    }

    async fn get_with_retry(&self, url: &Url) -> Result<reqwest::Response, ImageError> {
        let mut attempt = 1;
        loop {
            let outcome = self
                .client
                .get(url.clone())
                .header(ACCEPT, "image/png,image/webp,image/jpeg,image/*;q=0.8")
                .send()
                .await;

            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(err) => err.is_timeout() || err.is_connect(),
            };
            if !retryable || attempt >= MAX_ATTEMPTS {
                return outcome.map_err(|e| self.map_error(e, url));
            }

            let delay = backoff_delay(attempt);
            match &outcome {
                Ok(response) => log::warn!(
                    "⚠️ 下载返回 HTTP {}，{}ms 后第 {} 次重试",
                    response.status().as_u16(),
                    delay.as_millis(),
                    attempt
                ),
                Err(err) => log::warn!(
                    "⚠️ 下载失败：{}，{}ms 后第 {} 次重试",
                    sanitize_error_message_with_redacted_url(&err.to_string(), url.as_str()),
                    delay.as_millis(),
                    attempt
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn read_limited(&self, mut response: reqwest::Response) -> Result<Vec<u8>, ImageError> {
        let limit = self.config.max_file_size;
        if let Some(declared) = response.content_length() {
            ensure_within(declared, limit, "下载内容")?;
        }

        let mut body = Vec::new();
        loop {
            let wait = if body.is_empty() {
                Duration::from_millis(self.config.stream_first_byte_timeout_ms)
            } else {
                Duration::from_millis(self.config.stream_chunk_timeout_ms)
            };

            let chunk = tokio::time::timeout(wait, response.chunk())
                .await
                .map_err(|_| ImageError::Timeout(format!("{}ms 内没有收到数据", wait.as_millis())))?
                .map_err(|e| ImageError::Network(format!("读取下载内容失败：{}", e)))?;

            let Some(chunk) = chunk else {
                break;
            };
            ensure_within((body.len() + chunk.len()) as u64, limit, "下载内容")?;
            body.extend_from_slice(&chunk);
        }

        check_signature(&body)?;
        log::debug!("✅ 下载完成 - {} bytes", body.len());
        Ok(body)
    }

    fn map_error(&self, err: reqwest::Error, url: &Url) -> ImageError {
        let message = sanitize_error_message_with_redacted_url(&err.to_string(), url.as_str());
        if err.is_timeout() {
            ImageError::Timeout(format!("下载超时（{}秒）", self.config.download_timeout))
        } else {
            ImageError::Network(message)
        }
    }
}

fn next_hop(current: &Url, response: &reqwest::Response) -> Result<Url, ImageError> {
    let location = response
        .headers()
        .get(LOCATION)
        .ok_or_else(|| ImageError::Network("重定向缺少 Location".to_string()))?
        .to_str()
        .map_err(|e| ImageError::InvalidFormat(format!("Location 无效：{}", e)))?;

    current
        .join(location)
        .map_err(|e| ImageError::InvalidFormat(format!("Location 无法解析：{}", e)))
}

/// 下载目标检查：协议、主机名、IP 段、DNS 解析结果。
async fn check_target(url: &Url, config: &ImageConfig) -> Result<(), ImageError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ImageError::InvalidFormat(format!("不支持的协议：{}", url.scheme())));
    }
    if config.allow_private_network {
        return Ok(());
    }

    let host = url
        .host_str()
        .ok_or_else(|| ImageError::InvalidFormat("URL 缺少主机".to_string()))?;
    let lower = host.to_ascii_lowercase();
    if lower == "localhost"
        || lower == "localhost."
        || lower.ends_with(".localhost")
        || lower.ends_with(".local")
    {
        return Err(ImageError::InvalidFormat(format!("禁止访问本地地址：{}", host)));
    }

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return if is_restricted_ip(ip) {
            Err(ImageError::InvalidFormat(format!("禁止访问内网地址：{}", ip)))
        } else {
            Ok(())
        };
    }

    if config.resolve_dns_for_url_safety {
        let port = url.port_or_known_default().unwrap_or(443);
        let resolved: Vec<_> = lookup_host((host, port))
            .await
            .map_err(|e| ImageError::InvalidFormat(format!("主机解析失败：{}", e)))?
            .collect();
        if resolved.is_empty() {
            return Err(ImageError::InvalidFormat(format!("主机没有解析结果：{}", host)));
        }
        if let Some(addr) = resolved.iter().find(|addr| is_restricted_ip(addr.ip())) {
            return Err(ImageError::InvalidFormat(format!("主机解析到内网地址：{}", addr.ip())));
        }
    }

    Ok(())
}

/// 本地、内网、链路本地、组播、保留与 CGNAT 段。
fn is_restricted_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || v4.is_multicast()
                || a == 0
                || (a == 100 && (64..128).contains(&b))
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_restricted_ip(IpAddr::V4(mapped));
            }
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || v6.is_multicast()
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS) || status.is_server_error()
}

/// 某些对象存储只返回 octet-stream，交给签名校验兜底。
fn is_image_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/octet-stream"
}

/// 指数退避 + 时间种子抖动（最多 +50%）。
fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MS << attempt.saturating_sub(1).min(6);
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);
    Duration::from_millis(base + seed % (base / 2 + 1))
}
