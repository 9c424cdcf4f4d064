//! 基础设施层（Infrastructure）
//!
//! 持有页面资源，只向上暴露能力：
//! - `PageAdapter` - 页面抽象
//! - `MemoryPage` - 内存实现（无浏览器模式 / 测试）
//! - `ChromiumPage` + `JsExecutor` - 浏览器实现

pub mod chromium_page;
pub mod js_executor;
pub mod memory_page;
pub mod page;

pub use chromium_page::ChromiumPage;
pub use js_executor::JsExecutor;
pub use memory_page::{MemoryForm, MemoryPage, NotificationSettings, ShownNotification, ToastNode};
pub use page::{FormHandle, FormPart, FormState, NotificationPermission, PageAdapter};
