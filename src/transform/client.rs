//! # 远端生成接口客户端
//!
//! ## 设计思路
//!
//! 客户端只负责“一次 POST → 一个输出地址”，不做任何自动重试：
//! 生成接口有成本且结果不幂等，失败后由界面重新启用按钮，让用户手动重试。
//!
//! ## 实现思路
//!
//! - 复用同一个 `reqwest::Client`（连接池），超时参数来自 `TransformConfig`。
//! - 非 2xx：读取响应文本，返回 `RemoteTransform { status, body }`。
//! - 2xx 但响应体不是 JSON：同样视为 `RemoteTransform`（响应格式错误）。
//! - JSON 中找不到输出地址：`NoOutputUrl`。

use std::time::{Duration, Instant};

use super::request::{RequestShape, TransformRequest};
use super::response::extract_output_url;
use super::TransformConfig;
use crate::error::BoothError;
use crate::image_handler::{redact_url_for_log, sanitize_error_message_with_redacted_url};

/// 日志中响应体的最大展示长度。
const LOG_BODY_PREVIEW_CHARS: usize = 200;

/// 生成成功的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub output_url: String,
}

/// 远端生成接口客户端。
#[derive(Debug, Clone)]
pub struct RemoteTransformClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    shape: RequestShape,
}

impl RemoteTransformClient {
    pub fn new(config: &TransformConfig) -> Result<Self, BoothError> {
        if config.endpoint.trim().is_empty() {
            return Err(BoothError::Config("未配置生成接口地址 transform.endpoint".to_string()));
        }

        let endpoint = reqwest::Url::parse(config.endpoint.trim())
            .map_err(|e| BoothError::Config(format!("生成接口地址无效: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| BoothError::Network(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            shape: config.request_shape,
        })
    }

    /// 发送生成请求并解析输出地址。
    pub async fn transform(&self, request: &TransformRequest) -> Result<TransformResult, BoothError> {
        let started = Instant::now();
        log::info!(
            "🪄 发送生成请求 - endpoint: {} prompt: {:?}",
            redact_url_for_log(self.endpoint.as_str()),
            request.prompt
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request.to_body(self.shape))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BoothError::Network(format!("读取生成接口响应失败: {}", e)))?;

        if !status.is_success() {
            log::error!(
                "❌ 生成接口返回错误 - HTTP {} body: {}",
                status.as_u16(),
                preview(&text)
            );
            return Err(BoothError::RemoteTransform {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            log::error!("❌ 生成接口响应不是合法 JSON: {} body: {}", e, preview(&text));
            BoothError::RemoteTransform {
                status: status.as_u16(),
                body: text.clone(),
            }
        })?;

        let output_url = extract_output_url(&body).ok_or_else(|| {
            log::error!("❌ 生成接口响应中没有可识别的输出地址: {}", preview(&text));
            BoothError::NoOutputUrl
        })?;

        log::info!(
            "✅ 生成完成 - output: {} elapsed={}ms",
            redact_url_for_log(&output_url),
            started.elapsed().as_millis()
        );

        Ok(TransformResult { output_url })
    }

    fn map_send_error(&self, e: reqwest::Error) -> BoothError {
        let message = sanitize_error_message_with_redacted_url(&e.to_string(), self.endpoint.as_str());

        if e.is_timeout() {
            BoothError::Network(format!("生成请求超时: {}", message))
        } else if e.is_connect() {
            BoothError::Network(format!("无法连接生成接口: {}", message))
        } else {
            BoothError::Network(format!("生成请求失败: {}", message))
        }
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_BODY_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_BODY_PREVIEW_CHARS {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// 起一个只响应一次的本地 HTTP 服务，返回地址与收到的请求文本。
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, mpsc::Receiver<String>, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");
        let (tx, rx) = mpsc::channel();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let request = read_http_request(&mut stream);
            let _ = tx.send(request);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response failed");
            stream.flush().expect("flush failed");
        });

        (format!("http://127.0.0.1:{}/api/generate", addr.port()), rx, server)
    }

    fn read_http_request(stream: &mut std::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).expect("read request failed");
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                if data.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn client_for(endpoint: String) -> RemoteTransformClient {
        let config = TransformConfig {
            endpoint,
            ..TransformConfig::default()
        };
        RemoteTransformClient::new(&config).expect("client init failed")
    }

    #[tokio::test]
    async fn resolves_first_output_array_element() {
        let (endpoint, requests, server) =
            serve_once("200 OK", r#"{ "output": ["https://x/y.png"] }"#);
        let client = client_for(endpoint);

        let result = client
            .transform(&TransformRequest::new("data:image/png;base64,AAAA".to_string(), "add hat"))
            .await
            .expect("transform should succeed");

        server.join().expect("server thread failed");
        assert_eq!(result.output_url, "https://x/y.png");

        let request = requests.recv().expect("request not captured");
        assert!(request.starts_with("POST /api/generate"));
        assert!(request.contains("\"image_input\":[\"data:image/png;base64,AAAA\"]"));
        assert!(request.contains("\"prompt\":\"add hat\""));
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let (endpoint, _requests, server) = serve_once("503 Service Unavailable", "model overloaded");
        let client = client_for(endpoint);

        let result = client
            .transform(&TransformRequest::new("data:image/png;base64,AAAA".to_string(), "p"))
            .await;

        server.join().expect("server thread failed");
        match result {
            Err(BoothError::RemoteTransform { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "model overloaded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unrecognized_body_is_no_output_url() {
        let (endpoint, _requests, server) = serve_once("200 OK", r#"{ "status": "succeeded" }"#);
        let client = client_for(endpoint);

        let result = client
            .transform(&TransformRequest::new("data:image/png;base64,AAAA".to_string(), "p"))
            .await;

        server.join().expect("server thread failed");
        assert!(matches!(result, Err(BoothError::NoOutputUrl)));
    }

    #[tokio::test]
    async fn malformed_json_is_remote_transform_error() {
        let (endpoint, _requests, server) = serve_once("200 OK", "<html>oops</html>");
        let client = client_for(endpoint);

        let result = client
            .transform(&TransformRequest::new("data:image/png;base64,AAAA".to_string(), "p"))
            .await;

        server.join().expect("server thread failed");
        assert!(matches!(result, Err(BoothError::RemoteTransform { status: 200, .. })));
    }

    #[test]
    fn empty_endpoint_is_a_config_error() {
        let result = RemoteTransformClient::new(&TransformConfig::default());

        assert!(matches!(result, Err(BoothError::Config(_))));
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let long = "x".repeat(LOG_BODY_PREVIEW_CHARS + 10);

        let shown = preview(&long);

        assert_eq!(shown.chars().count(), LOG_BODY_PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
    }
}
