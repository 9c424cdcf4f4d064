//! 提交上下文
//!
//! 封装"正在向哪里提交哪个表单的哪些字段"这一信息，只在一次提交内存在

use std::fmt::Display;

use crate::infrastructure::FormHandle;
use crate::models::FormData;

/// 提交上下文
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 表单标识
    pub form: FormHandle,

    /// 提交目标地址
    pub action: String,

    /// 验证码 site key
    pub recaptcha_site_key: Option<String>,

    /// 提交时收集到的字段
    pub data: FormData,
}

impl SubmissionCtx {
    pub fn new(
        form: FormHandle,
        action: String,
        recaptcha_site_key: Option<String>,
        data: FormData,
    ) -> Self {
        Self {
            form,
            action,
            recaptcha_site_key,
            data,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[表单 {} → {} 字段#{}]",
            self.form,
            self.action,
            self.data.len()
        )
    }
}
