/// 验证码（reCAPTCHA）客户端
///
/// 发送前获取一次性 token
use crate::infrastructure::js_executor::{js_string, JsExecutor};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// 获取 token 失败，内容为抛出的错误文本
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ChallengeError(pub String);

/// 验证码库
#[async_trait]
pub trait ChallengeApi: Send + Sync {
    /// 验证码库是否已加载
    async fn is_loaded(&self) -> bool;

    /// 为 `action` 获取一次性 token
    async fn execute(&self, site_key: &str, action: &str) -> Result<String, ChallengeError>;
}

/// 未加载验证码库
pub struct MissingChallenge;

#[async_trait]
impl ChallengeApi for MissingChallenge {
    async fn is_loaded(&self) -> bool {
        false
    }

    async fn execute(&self, _site_key: &str, _action: &str) -> Result<String, ChallengeError> {
        Err(ChallengeError("grecaptcha is not defined".to_string()))
    }
}

/// 返回固定结果的验证码库（无浏览器模式）
pub struct FixedChallenge {
    result: Result<String, ChallengeError>,
}

impl FixedChallenge {
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            result: Ok(token.into()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(ChallengeError(message.into())),
        }
    }
}

#[async_trait]
impl ChallengeApi for FixedChallenge {
    async fn is_loaded(&self) -> bool {
        true
    }

    async fn execute(&self, _site_key: &str, _action: &str) -> Result<String, ChallengeError> {
        self.result.clone()
    }
}

#[derive(Debug, Deserialize)]
struct TokenReply {
    token: Option<String>,
    error: Option<String>,
}

/// 页面中的 grecaptcha
pub struct ChromiumChallenge {
    executor: Arc<JsExecutor>,
}

impl ChromiumChallenge {
    pub fn new(executor: Arc<JsExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ChallengeApi for ChromiumChallenge {
    async fn is_loaded(&self) -> bool {
        self.executor
            .eval_as::<bool>(r#"typeof grecaptcha !== "undefined""#)
            .await
            .unwrap_or(false)
    }

    async fn execute(&self, site_key: &str, action: &str) -> Result<String, ChallengeError> {
        let script = format!(
            r#"
            new Promise((resolve) => {{
                grecaptcha.ready(() => {{
                    try {{
                        grecaptcha.execute({site_key}, {{ action: {action} }})
                            .then((token) => resolve({{ token }}))
                            .catch((e) => resolve({{ error: String(e) }}));
                    }} catch (e) {{
                        resolve({{ error: String(e) }});
                    }}
                }});
            }})
            "#,
            site_key = js_string(site_key),
            action = js_string(action)
        );

        let reply: TokenReply = self
            .executor
            .eval_as(script)
            .await
            .map_err(|e| ChallengeError(e.to_string()))?;

        match (reply.token, reply.error) {
            (Some(token), _) => {
                debug!("获取验证码 token 成功 ({} 字符)", token.len());
                Ok(token)
            }
            (None, Some(error)) => Err(ChallengeError(error)),
            (None, None) => Err(ChallengeError("empty reCaptcha response".to_string())),
        }
    }
}
