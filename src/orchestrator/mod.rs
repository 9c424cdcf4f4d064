//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `form_controller` - 表单控制器
//! - 按 marker 绑定表单，解析强类型配置
//! - 接管提交事件，每次提交独立运行 `SubmissionFlow`
//!
//! ### `app` - 应用主结构
//! - 选择页面资源（浏览器 / 内存页面）
//! - 批量提交并输出统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (管理页面资源)
//!     ↓
//! form_controller (绑定表单、分发提交事件)
//!     ↓
//! workflow::SubmissionFlow (处理单次提交)
//!     ↓
//! services (能力层：feedback / toast / notifier)  clients (transport / challenge)
//!     ↓
//! infrastructure (基础设施：PageAdapter)
//! ```

pub mod app;
pub mod form_controller;

pub use app::{App, RunStats};
pub use form_controller::{BindReport, FormController, SubmissionResult, SubmitEvent};
