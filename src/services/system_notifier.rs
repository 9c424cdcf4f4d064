//! 系统通知服务 - 业务能力层
//!
//! 尽力而为：页面外的系统通知，失败只记 warn

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PageResult;
use crate::infrastructure::{NotificationPermission, PageAdapter};

/// 一次通知尝试的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Shown,
    /// 平台不支持通知
    Unsupported,
    /// 用户拒绝或此前已拒绝
    Declined,
    /// 出错（已记录日志）
    Failed,
}

/// 系统通知服务
#[derive(Clone)]
pub struct SystemNotifier {
    page: Arc<dyn PageAdapter>,
}

impl SystemNotifier {
    pub fn new(page: Arc<dyn PageAdapter>) -> Self {
        Self { page }
    }

    /// 在后台尝试显示通知，调用方可以不等待
    pub fn notify(&self, title: &str, body: &str) -> JoinHandle<NotifyOutcome> {
        let page = self.page.clone();
        let title = title.to_string();
        let body = body.to_string();

        tokio::spawn(async move {
            match deliver(page.as_ref(), &title, &body).await {
                Ok(outcome) => {
                    debug!("系统通知 '{}': {:?}", title, outcome);
                    outcome
                }
                Err(e) => {
                    warn!("System notification failed: {}", e);
                    NotifyOutcome::Failed
                }
            }
        })
    }
}

async fn deliver(page: &dyn PageAdapter, title: &str, body: &str) -> PageResult<NotifyOutcome> {
    let permission = match page.notification_permission().await? {
        Some(permission) => permission,
        None => return Ok(NotifyOutcome::Unsupported),
    };

    let permission = match permission {
        NotificationPermission::Default => page.request_notification_permission().await?,
        other => other,
    };

    if permission == NotificationPermission::Granted {
        page.show_notification(title, body).await?;
        Ok(NotifyOutcome::Shown)
    } else {
        Ok(NotifyOutcome::Declined)
    }
}
