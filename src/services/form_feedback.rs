//! 表单内联反馈 - 业务能力层
//!
//! 只负责表单内 loading / sent / error 三个元素的状态

use std::sync::Arc;

use crate::error::PageResult;
use crate::infrastructure::{FormHandle, FormState, PageAdapter};

/// 表单内联反馈
///
/// 每次切换都是一次 `render_state`，并发提交时最后完成的一次决定最终状态
#[derive(Clone)]
pub struct FormFeedback {
    page: Arc<dyn PageAdapter>,
}

impl FormFeedback {
    pub fn new(page: Arc<dyn PageAdapter>) -> Self {
        Self { page }
    }

    /// 开始提交：只显示 loading
    pub async fn begin(&self, form: FormHandle) -> PageResult<()> {
        self.page.render_state(form, &FormState::Loading).await
    }

    /// 成功：只显示 sent，清空表单
    pub async fn sent(&self, form: FormHandle) -> PageResult<()> {
        self.page.render_state(form, &FormState::Sent).await
    }

    /// 失败：写入错误内容，只显示 error
    pub async fn error(&self, form: FormHandle, message: &str) -> PageResult<()> {
        self.page
            .render_state(form, &FormState::Error(message.to_string()))
            .await
    }
}
