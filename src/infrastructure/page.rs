//! 页面适配器 - 基础设施层
//!
//! 对页面（DOM + 通知 API）的抽象，上层只通过这里访问页面

use async_trait::async_trait;

use crate::error::PageResult;
use crate::models::{ElementHandle, FormData, ToastSpec};

/// 页面中表单的标识（按 marker 查询结果中的位置）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormHandle(pub usize);

impl std::fmt::Display for FormHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 表单内部的三个状态元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormPart {
    Loading,
    ErrorMessage,
    SentMessage,
}

impl FormPart {
    /// 元素的 class
    pub fn class_name(&self) -> &'static str {
        match self {
            FormPart::Loading => "loading",
            FormPart::ErrorMessage => "error-message",
            FormPart::SentMessage => "sent-message",
        }
    }
}

/// 显示元素时添加的 class
pub const VISIBLE_CLASS: &str = "d-block";

/// 表单的界面状态
///
/// 每个状态由适配器一次性渲染，并发提交之间不会交错出半个状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// 提交中：只显示 loading
    Loading,
    /// 已发送：只显示 sent，并清空表单
    Sent,
    /// 失败：只显示 error，内容为错误信息
    Error(String),
}

impl FormState {
    /// 该状态下可见的元素
    pub fn visible_part(&self) -> FormPart {
        match self {
            FormState::Loading => FormPart::Loading,
            FormState::Sent => FormPart::SentMessage,
            FormState::Error(_) => FormPart::ErrorMessage,
        }
    }
}

/// 系统通知权限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// 尚未询问用户
    Default,
}

impl NotificationPermission {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "granted" => Some(Self::Granted),
            "denied" => Some(Self::Denied),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// 页面适配器
///
/// 职责：
/// - 按 class 查找表单，读取属性和字段
/// - 渲染表单的界面状态（单次原子操作）
/// - 替换 / 移除 toast 元素
/// - 查询和申请系统通知权限
#[async_trait]
pub trait PageAdapter: Send + Sync {
    /// 查找所有带有 `marker` class 的表单
    async fn find_forms(&self, marker: &str) -> PageResult<Vec<FormHandle>>;

    /// 读取表单属性，不存在时返回 `None`
    async fn form_attribute(&self, form: FormHandle, name: &str) -> PageResult<Option<String>>;

    /// 收集表单当前的字段值
    async fn form_data(&self, form: FormHandle) -> PageResult<FormData>;

    /// 渲染表单状态
    ///
    /// 三个状态元素都必须存在，否则不做任何修改并返回 `ElementMissing`
    async fn render_state(&self, form: FormHandle, state: &FormState) -> PageResult<()>;

    /// 移除同 id 的旧 toast 并创建新 toast，两步在同一次操作中完成
    async fn replace_toast(&self, toast: &ToastSpec) -> PageResult<ElementHandle>;

    /// 开始淡出动画
    async fn fade_out(&self, element: ElementHandle) -> PageResult<()>;

    /// 元素仍在页面上时移除，返回是否移除
    async fn remove_if_attached(&self, element: ElementHandle) -> PageResult<bool>;

    /// 当前通知权限，平台不支持通知时返回 `None`
    async fn notification_permission(&self) -> PageResult<Option<NotificationPermission>>;

    /// 向用户申请通知权限
    async fn request_notification_permission(&self) -> PageResult<NotificationPermission>;

    /// 显示系统通知
    async fn show_notification(&self, title: &str, body: &str) -> PageResult<()>;
}
