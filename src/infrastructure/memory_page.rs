//! 内存页面 - 基础设施层
//!
//! 不依赖浏览器的 `PageAdapter` 实现：无浏览器模式下承载 TOML 表单，
//! 测试中用来观察界面状态

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PageError, PageResult};
use crate::infrastructure::page::{
    FormHandle, FormPart, FormState, NotificationPermission, PageAdapter,
};
use crate::models::{ElementHandle, FormData, FormDocument, FormField, ToastSpec};

/// 内存中的表单元素
#[derive(Debug, Clone)]
pub struct MemoryForm {
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub fields: Vec<FormField>,
    /// 状态元素及其可见性，缺少的元素不在表中
    pub parts: HashMap<FormPart, bool>,
    pub error_content: String,
}

impl MemoryForm {
    /// 创建带有全部状态元素的表单
    pub fn new(class: impl Into<String>) -> Self {
        let parts = [FormPart::Loading, FormPart::ErrorMessage, FormPart::SentMessage]
            .into_iter()
            .map(|part| (part, false))
            .collect();
        Self {
            classes: vec![class.into()],
            attributes: BTreeMap::new(),
            fields: Vec::new(),
            parts,
            error_content: String::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// 去掉某个状态元素
    pub fn without_part(mut self, part: FormPart) -> Self {
        self.parts.remove(&part);
        self
    }

    /// 由 TOML 表单文件构建
    pub fn from_document(class: impl Into<String>, document: &FormDocument) -> Self {
        let mut form = Self::new(class);
        for (name, value) in document.attributes() {
            form.attributes.insert(name, value);
        }
        form.fields = document.fields.clone();
        form
    }

    pub fn is_visible(&self, part: FormPart) -> bool {
        self.parts.get(&part).copied().unwrap_or(false)
    }

    /// 所有字段是否都已清空
    pub fn fields_empty(&self) -> bool {
        self.fields.iter().all(|f| f.value.is_empty())
    }
}

/// 页面上的 toast 元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastNode {
    pub handle: ElementHandle,
    pub spec: ToastSpec,
    pub faded: bool,
}

/// 已显示的系统通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownNotification {
    pub title: String,
    pub body: String,
}

/// 通知能力设置
#[derive(Debug, Clone)]
pub struct NotificationSettings {
    /// 平台是否支持通知
    pub supported: bool,
    pub permission: NotificationPermission,
    /// 申请权限时用户的选择
    pub prompt_answer: NotificationPermission,
    /// 显示通知时抛出的错误
    pub failure: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            supported: true,
            permission: NotificationPermission::Granted,
            prompt_answer: NotificationPermission::Granted,
            failure: None,
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    forms: Vec<MemoryForm>,
    toasts: Vec<ToastNode>,
    toasts_created: usize,
    toast_failure: Option<String>,
    next_element: u64,
    notifications: NotificationSettings,
    permission_checks: usize,
    permission_requests: usize,
    shown: Vec<ShownNotification>,
}

/// 内存页面
#[derive(Debug, Default)]
pub struct MemoryPage {
    state: Mutex<PageState>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加表单，返回其标识
    pub fn add_form(&self, form: MemoryForm) -> FormHandle {
        let mut state = self.lock();
        state.forms.push(form);
        FormHandle(state.forms.len() - 1)
    }

    /// 修改字段值（模拟用户输入）
    pub fn fill_field(&self, form: FormHandle, name: &str, value: &str) -> PageResult<()> {
        let mut state = self.lock();
        let form_el = state
            .forms
            .get_mut(form.0)
            .ok_or(PageError::FormNotFound(form.0))?;
        match form_el.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value.to_string(),
            None => form_el.fields.push(FormField {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    pub fn set_notification_settings(&self, settings: NotificationSettings) {
        self.lock().notifications = settings;
    }

    /// 让后续创建 toast 的操作失败
    pub fn fail_toasts(&self, message: impl Into<String>) {
        self.lock().toast_failure = Some(message.into());
    }

    /// 表单当前状态的快照
    pub fn form(&self, form: FormHandle) -> Option<MemoryForm> {
        self.lock().forms.get(form.0).cloned()
    }

    /// 当前页面上的 toast
    pub fn toasts(&self) -> Vec<ToastNode> {
        self.lock().toasts.clone()
    }

    /// 累计创建过的 toast 数量
    pub fn toasts_created(&self) -> usize {
        self.lock().toasts_created
    }

    /// 已显示的系统通知
    pub fn notifications(&self) -> Vec<ShownNotification> {
        self.lock().shown.clone()
    }

    /// 尝试发送系统通知的次数
    pub fn notification_attempts(&self) -> usize {
        self.lock().permission_checks
    }

    /// 申请通知权限的次数
    pub fn permission_requests(&self) -> usize {
        self.lock().permission_requests
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn form_mut(state: &mut PageState, form: FormHandle) -> PageResult<&mut MemoryForm> {
    state
        .forms
        .get_mut(form.0)
        .ok_or(PageError::FormNotFound(form.0))
}

#[async_trait]
impl PageAdapter for MemoryPage {
    async fn find_forms(&self, marker: &str) -> PageResult<Vec<FormHandle>> {
        let state = self.lock();
        Ok(state
            .forms
            .iter()
            .enumerate()
            .filter(|(_, f)| f.classes.iter().any(|c| c == marker))
            .map(|(i, _)| FormHandle(i))
            .collect())
    }

    async fn form_attribute(&self, form: FormHandle, name: &str) -> PageResult<Option<String>> {
        let mut state = self.lock();
        Ok(form_mut(&mut state, form)?.attributes.get(name).cloned())
    }

    async fn form_data(&self, form: FormHandle) -> PageResult<FormData> {
        let mut state = self.lock();
        let form_el = form_mut(&mut state, form)?;
        Ok(form_el
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect())
    }

    async fn render_state(&self, form: FormHandle, next: &FormState) -> PageResult<()> {
        let mut state = self.lock();
        let form_el = form_mut(&mut state, form)?;
        for part in [FormPart::Loading, FormPart::ErrorMessage, FormPart::SentMessage] {
            if !form_el.parts.contains_key(&part) {
                return Err(PageError::ElementMissing {
                    form: form.0,
                    class: part.class_name().to_string(),
                });
            }
        }

        let visible = next.visible_part();
        for (part, shown) in form_el.parts.iter_mut() {
            *shown = *part == visible;
        }
        match next {
            FormState::Loading => {}
            FormState::Sent => {
                for field in form_el.fields.iter_mut() {
                    field.value.clear();
                }
            }
            FormState::Error(message) => form_el.error_content = message.clone(),
        }
        Ok(())
    }

    async fn replace_toast(&self, toast: &ToastSpec) -> PageResult<ElementHandle> {
        let mut state = self.lock();
        if let Some(message) = &state.toast_failure {
            return Err(PageError::Rejected(message.clone()));
        }
        let before = state.toasts.len();
        state.toasts.retain(|t| t.spec.id != toast.id);
        if state.toasts.len() != before {
            debug!("已移除上一条 toast");
        }

        state.next_element += 1;
        let handle = ElementHandle(state.next_element);
        state.toasts.push(ToastNode {
            handle,
            spec: toast.clone(),
            faded: false,
        });
        state.toasts_created += 1;
        debug!("创建 toast {:?}: {}", handle, toast.message);
        Ok(handle)
    }

    async fn fade_out(&self, element: ElementHandle) -> PageResult<()> {
        let mut state = self.lock();
        if let Some(node) = state.toasts.iter_mut().find(|t| t.handle == element) {
            node.faded = true;
        }
        Ok(())
    }

    async fn remove_if_attached(&self, element: ElementHandle) -> PageResult<bool> {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|t| t.handle != element);
        Ok(state.toasts.len() != before)
    }

    async fn notification_permission(&self) -> PageResult<Option<NotificationPermission>> {
        let mut state = self.lock();
        state.permission_checks += 1;
        if !state.notifications.supported {
            return Ok(None);
        }
        Ok(Some(state.notifications.permission))
    }

    async fn request_notification_permission(&self) -> PageResult<NotificationPermission> {
        let mut state = self.lock();
        state.permission_requests += 1;
        let answer = state.notifications.prompt_answer;
        state.notifications.permission = answer;
        Ok(answer)
    }

    async fn show_notification(&self, title: &str, body: &str) -> PageResult<()> {
        let mut state = self.lock();
        if let Some(message) = &state.notifications.failure {
            return Err(PageError::Rejected(message.clone()));
        }
        state.shown.push(ShownNotification {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
