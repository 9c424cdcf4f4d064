//! 单元测试用的页面包装

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::yield_now;

use crate::error::PageResult;
use crate::infrastructure::{FormHandle, FormState, MemoryPage, NotificationPermission, PageAdapter};
use crate::models::{ElementHandle, FormData, ToastSpec};

/// 每次调用前让出执行权，模拟浏览器往返，让并发任务有机会交错
pub struct YieldingPage {
    inner: Arc<MemoryPage>,
}

impl YieldingPage {
    pub fn new(inner: Arc<MemoryPage>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PageAdapter for YieldingPage {
    async fn find_forms(&self, marker: &str) -> PageResult<Vec<FormHandle>> {
        yield_now().await;
        self.inner.find_forms(marker).await
    }

    async fn form_attribute(&self, form: FormHandle, name: &str) -> PageResult<Option<String>> {
        yield_now().await;
        self.inner.form_attribute(form, name).await
    }

    async fn form_data(&self, form: FormHandle) -> PageResult<FormData> {
        yield_now().await;
        self.inner.form_data(form).await
    }

    async fn render_state(&self, form: FormHandle, state: &FormState) -> PageResult<()> {
        yield_now().await;
        self.inner.render_state(form, state).await
    }

    async fn replace_toast(&self, toast: &ToastSpec) -> PageResult<ElementHandle> {
        yield_now().await;
        self.inner.replace_toast(toast).await
    }

    async fn fade_out(&self, element: ElementHandle) -> PageResult<()> {
        yield_now().await;
        self.inner.fade_out(element).await
    }

    async fn remove_if_attached(&self, element: ElementHandle) -> PageResult<bool> {
        yield_now().await;
        self.inner.remove_if_attached(element).await
    }

    async fn notification_permission(&self) -> PageResult<Option<NotificationPermission>> {
        yield_now().await;
        self.inner.notification_permission().await
    }

    async fn request_notification_permission(&self) -> PageResult<NotificationPermission> {
        yield_now().await;
        self.inner.request_notification_permission().await
    }

    async fn show_notification(&self, title: &str, body: &str) -> PageResult<()> {
        yield_now().await;
        self.inner.show_notification(title, body).await
    }
}
