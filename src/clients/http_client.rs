/// 表单提交 HTTP 客户端
///
/// 以 multipart 形式 POST 表单字段，只关心响应状态
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::FormData;
use async_trait::async_trait;
use reqwest::{multipart, Client, Url};
use thiserror::Error;
use tracing::debug;

/// 标记为脚本发起的请求
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";

/// 网络层错误，内容为底层错误文本
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// 提交响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    /// 实际请求的地址（解析后）
    pub url: String,
    /// 响应内容，读取但不解析
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 表单提交通道
#[async_trait]
pub trait Transport: Send + Sync {
    /// 把字段 POST 到 `url`，拿到任何响应都返回 `Ok`
    async fn post_form(&self, url: &str, data: &FormData) -> Result<HttpReply, TransportError>;
}

/// 基于 reqwest 的实现
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<Url>,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> AppResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|e| AppError::Config(format!("BASE_URL 无效: {}", e)))?;
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// 解析目标地址，相对地址基于 `base_url`
    pub fn resolve(&self, action: &str) -> Result<Url, TransportError> {
        match Url::parse(action) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base
                    .join(action)
                    .map_err(|e| TransportError(format!("{}: {}", e, action))),
                None => Err(TransportError(format!(
                    "relative URL without a base: {}",
                    action
                ))),
            },
            Err(e) => Err(TransportError(format!("{}: {}", e, action))),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_form(&self, url: &str, data: &FormData) -> Result<HttpReply, TransportError> {
        let target = self.resolve(url)?;

        let form = data.iter().fold(multipart::Form::new(), |form, field| {
            form.text(field.name.clone(), field.value.clone())
        });

        debug!("POST {} ({} 个字段)", target, data.len());

        let response = self
            .client
            .post(target)
            .header(REQUESTED_WITH_HEADER, REQUESTED_WITH_VALUE)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let final_url = response.url().to_string();

        // 只有成功时才读取响应体
        let body = if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| TransportError(e.to_string()))?
        } else {
            String::new()
        };

        debug!("响应: {} {} ({} 字节)", status.as_u16(), status_text, body.len());

        Ok(HttpReply {
            status: status.as_u16(),
            status_text,
            url: final_url,
            body,
        })
    }
}
