/// toast 元素保留的 id，页面上同时最多存在一个
pub const TOAST_ELEMENT_ID: &str = "w3-toast-notification";

/// toast 类型，只区分成功和其他
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    /// 背景色（w3-green / w3-red）
    pub fn background(&self) -> &'static str {
        match self {
            ToastKind::Success => "#4CAF50",
            ToastKind::Error => "#f44336",
        }
    }
}

/// 待渲染的 toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastSpec {
    pub id: String,
    pub message: String,
    pub kind: ToastKind,
}

impl ToastSpec {
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            id: TOAST_ELEMENT_ID.to_string(),
            message: message.into(),
            kind,
        }
    }
}

/// 页面中已创建元素的标识，用于按身份移除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);
