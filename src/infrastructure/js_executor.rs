//! JS 执行器 - 基础设施层
//!
//! 持有浏览器标签页，负责执行脚本，并约定页面脚本的返回格式：
//! `{ ok, value, error, missing }`

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{PageError, PageResult};

/// 页面脚本的统一返回格式
#[derive(Debug, Deserialize)]
pub struct ScriptReply {
    pub ok: bool,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default)]
    pub error: Option<String>,
    /// 缺失的元素 class
    #[serde(default)]
    pub missing: Option<String>,
}

/// JS 执行器
///
/// 执行失败（CDP 错误、返回值无法解析）统一转成 `PageError::Script`
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> PageResult<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| PageError::Script(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| PageError::Script(e.to_string()))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> PageResult<T> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| PageError::Script(e.to_string()))
    }

    /// 执行按统一格式返回的脚本
    pub async fn eval_reply(&self, js_code: impl Into<String>) -> PageResult<ScriptReply> {
        self.eval_as(js_code).await
    }
}

/// 把 Rust 字符串转成 JS 字符串字面量
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// 包成立即执行的函数，脚本抛出的异常转成 `{ ok: false, error }`
pub fn guarded_script(body: &str) -> String {
    format!(
        "(() => {{\n    try {{\n        {}\n    }} catch (e) {{\n        return {{ ok: false, error: String(e) }};\n    }}\n}})()",
        body
    )
}
