use std::time::Duration;

use crate::error::{AppError, AppResult};

/// 界面时序配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UiTimings {
    /// 开发模式下模拟成功前的等待时间
    pub dev_mode_delay: Duration,
    /// toast 开始淡出的时间（从创建开始计）
    pub toast_fade_after: Duration,
    /// toast 被移除的时间（从创建开始计）
    pub toast_remove_after: Duration,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            dev_mode_delay: Duration::from_millis(800),
            toast_fade_after: Duration::from_millis(4200),
            toast_remove_after: Duration::from_millis(4600),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 需要绑定的表单 class
    pub form_marker: String,
    /// 表单 TOML 文件存放目录（无浏览器模式）
    pub forms_folder: String,
    /// 相对 action 的解析基准
    pub base_url: Option<String>,
    /// 验证码 action 标签
    pub recaptcha_action: String,
    /// 无浏览器模式下使用的固定验证码 token
    pub recaptcha_token: Option<String>,
    /// 浏览器调试端口，设置后走浏览器模式
    pub browser_debug_port: Option<u16>,
    /// 浏览器模式下的目标页面
    pub target_url: Option<String>,
    /// 界面时序
    pub timings: UiTimings,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            form_marker: "php-email-form".to_string(),
            forms_folder: "forms".to_string(),
            base_url: None,
            recaptcha_action: "php_email_form_submit".to_string(),
            recaptcha_token: None,
            browser_debug_port: None,
            target_url: None,
            timings: UiTimings::default(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let millis = |name: &str, fallback: Duration| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(fallback)
        };
        Self {
            form_marker: std::env::var("FORM_MARKER").unwrap_or(default.form_marker),
            forms_folder: std::env::var("FORMS_FOLDER").unwrap_or(default.forms_folder),
            base_url: std::env::var("BASE_URL").ok().filter(|v| !v.is_empty()),
            recaptcha_action: std::env::var("RECAPTCHA_ACTION").unwrap_or(default.recaptcha_action),
            recaptcha_token: std::env::var("RECAPTCHA_TOKEN").ok().filter(|v| !v.is_empty()),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            target_url: std::env::var("TARGET_URL").ok().filter(|v| !v.is_empty()),
            timings: UiTimings {
                dev_mode_delay: millis("DEV_MODE_DELAY_MS", default.timings.dev_mode_delay),
                toast_fade_after: millis("TOAST_FADE_MS", default.timings.toast_fade_after),
                toast_remove_after: millis("TOAST_REMOVE_MS", default.timings.toast_remove_after),
            },
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.form_marker.trim().is_empty() {
            return Err(AppError::Config("FORM_MARKER 不能为空".to_string()));
        }
        if self.timings.toast_remove_after < self.timings.toast_fade_after {
            return Err(AppError::Config(format!(
                "toast 移除时间 ({:?}) 早于淡出时间 ({:?})",
                self.timings.toast_remove_after, self.timings.toast_fade_after
            )));
        }
        Ok(())
    }
}
