//! 表单配置
//!
//! 绑定时从表单属性解析出来的强类型配置

use std::fmt::Display;

/// 目标地址属性
pub const ACTION_ATTR: &str = "action";
/// 验证码 site key 属性
pub const RECAPTCHA_SITE_KEY_ATTR: &str = "data-recaptcha-site-key";
/// 开发模式属性
pub const DEV_MODE_ATTR: &str = "data-dev";

/// 单个表单的配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormConfig {
    /// 提交目标地址，空字符串视为未设置
    pub action: Option<String>,
    /// 验证码 site key
    pub recaptcha_site_key: Option<String>,
    /// 开发模式：不发请求，延迟后直接走成功流程
    pub dev_mode: bool,
}

impl FormConfig {
    /// 从原始属性值构建配置
    ///
    /// # 返回
    /// `data-dev` 取值无法识别时返回 `Err(原始值)`
    pub fn from_attributes(
        action: Option<String>,
        recaptcha_site_key: Option<String>,
        dev_flag: Option<String>,
    ) -> Result<Self, String> {
        let dev_mode = match dev_flag {
            Some(raw) => parse_flag(&raw).ok_or(raw)?,
            None => false,
        };
        Ok(Self {
            action: action.filter(|v| !v.is_empty()),
            recaptcha_site_key: non_blank(recaptcha_site_key),
            dev_mode,
        })
    }
}

impl Display for FormConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "action={} recaptcha={} dev={}",
            self.action.as_deref().unwrap_or("<未设置>"),
            self.recaptcha_site_key.is_some(),
            self.dev_mode
        )
    }
}

/// 解析布尔属性
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" => Some(false),
        "true" | "1" => Some(true),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
