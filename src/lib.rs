//! # Contact Form Submit
//!
//! 静态网站联系表单的提交处理：拦截提交事件，把字段 POST 到配置的地址，
//! 并在页面上给出成功 / 失败反馈（内联提示、toast、系统通知）
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有页面资源，只暴露能力
//! - `PageAdapter` - 页面抽象；`MemoryPage` / `ChromiumPage` 两种实现
//!
//! ### ② 业务能力层（Services / Clients）
//! - `FormFeedback` - 表单内联状态
//! - `ToastService` - 单例 toast
//! - `SystemNotifier` - 尽力而为的系统通知
//! - `Transport` / `ChallengeApi` - 请求发送与验证码
//!
//! ### ③ 流程层（Workflow）
//! - `SubmissionFlow` - 一次提交的完整流程（检查 → 验证码 → 请求 → 反馈）
//!
//! ### ④ 编排层（Orchestration）
//! - `FormController` - 绑定表单、分发提交事件
//! - `App` - 命令行入口使用的批量提交
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

// 重新导出常用类型
pub use config::{Config, UiTimings};
pub use error::{AppError, AppResult, ConfigError, FormError, PageError};
pub use infrastructure::{FormHandle, FormPart, FormState, MemoryForm, MemoryPage, PageAdapter};
pub use models::{FormConfig, FormData};
pub use orchestrator::{App, FormController, SubmitEvent};
pub use workflow::{SubmissionFlow, SubmissionOutcome};
