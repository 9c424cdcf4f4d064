//! Toast 服务 - 业务能力层
//!
//! 在页面上显示一条短暂的提示，页面上同时最多只有一条

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error};

use crate::config::UiTimings;
use crate::error::PageResult;
use crate::infrastructure::PageAdapter;
use crate::models::{ElementHandle, ToastKind, ToastSpec};

/// Toast 服务
///
/// 职责：
/// - 用新 toast 替换旧 toast（由页面一次完成）
/// - 按时序淡出并移除
/// - 自身失败只记日志，不向调用方抛出
#[derive(Clone)]
pub struct ToastService {
    page: Arc<dyn PageAdapter>,
    timings: UiTimings,
}

impl ToastService {
    pub fn new(page: Arc<dyn PageAdapter>, timings: UiTimings) -> Self {
        Self { page, timings }
    }

    /// 显示 toast，失败时返回 `None`
    pub async fn show(&self, message: &str, kind: ToastKind) -> Option<ElementHandle> {
        match self.try_show(message, kind).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("显示 toast 失败: {}", e);
                None
            }
        }
    }

    async fn try_show(&self, message: &str, kind: ToastKind) -> PageResult<ElementHandle> {
        let handle = self.page.replace_toast(&ToastSpec::new(message, kind)).await?;
        self.schedule_removal(handle);
        Ok(handle)
    }

    fn schedule_removal(&self, handle: ElementHandle) {
        let page = self.page.clone();
        let fade_after = self.timings.toast_fade_after;
        let remove_after = self.timings.toast_remove_after;

        tokio::spawn(async move {
            sleep(fade_after).await;
            if let Err(e) = page.fade_out(handle).await {
                error!("toast 淡出失败: {}", e);
            }

            sleep(remove_after.saturating_sub(fade_after)).await;
            match page.remove_if_attached(handle).await {
                Ok(true) => debug!("toast {:?} 已移除", handle),
                Ok(false) => {}
                Err(e) => error!("移除 toast 失败: {}", e),
            }
        });
    }
}
