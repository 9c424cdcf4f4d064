//! 表单提交流程 - 流程层
//!
//! 核心职责：定义"一次提交"的完整处理流程
//!
//! 流程顺序：
//! 1. 检查 action → 显示 loading → 收集字段
//! 2. 开发模式：延迟后直接走成功流程
//! 3. （可选）获取验证码 token
//! 4. POST → 按状态码走成功 / 失败流程

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::clients::{ChallengeApi, Transport};
use crate::config::Config;
use crate::error::{ConfigError, FormError, PageResult};
use crate::infrastructure::{FormHandle, PageAdapter};
use crate::models::{FormConfig, ToastKind};
use crate::services::{FormFeedback, SystemNotifier, ToastService};
use crate::utils::logging::truncate_text;
use crate::workflow::submission_ctx::SubmissionCtx;

/// 验证码 token 的保留字段名
pub const RECAPTCHA_FIELD: &str = "recaptcha-response";

pub const SENT_TOAST: &str = "Message sent — thank you!";
pub const SENT_TITLE: &str = "Message sent";
pub const SENT_BODY: &str = "Thank you — I will get back to you soon.";
pub const DEV_SENT_TOAST: &str = "Message sent (dev mode)";
pub const DEV_SENT_BODY: &str = "Dev mode: simulated success";
pub const FAILED_TITLE: &str = "Message failed";

/// 成功提交的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// 服务端返回 2xx
    Sent,
    /// 开发模式模拟成功
    Simulated,
}

/// 表单提交流程
///
/// - 编排一次提交：检查 → 验证码 → 请求 → 反馈
/// - 主流程结果通过 `Result` 返回
/// - toast / 系统通知失败只进日志
pub struct SubmissionFlow {
    page: Arc<dyn PageAdapter>,
    feedback: FormFeedback,
    toasts: ToastService,
    notifier: SystemNotifier,
    transport: Arc<dyn Transport>,
    challenge: Arc<dyn ChallengeApi>,
    config: Config,
}

impl SubmissionFlow {
    pub fn new(
        config: &Config,
        page: Arc<dyn PageAdapter>,
        transport: Arc<dyn Transport>,
        challenge: Arc<dyn ChallengeApi>,
    ) -> Self {
        Self {
            feedback: FormFeedback::new(page.clone()),
            toasts: ToastService::new(page.clone(), config.timings),
            notifier: SystemNotifier::new(page.clone()),
            page,
            transport,
            challenge,
            config: config.clone(),
        }
    }

    pub async fn run(
        &self,
        form: FormHandle,
        form_config: &FormConfig,
    ) -> Result<SubmissionOutcome, FormError> {
        let action = match &form_config.action {
            Some(action) => action.clone(),
            None => {
                return Err(self.fail(form, ConfigError::MissingAction.into()).await);
            }
        };

        log_page_fault(form, self.feedback.begin(form).await);

        let data = match self.page.form_data(form).await {
            Ok(data) => data,
            Err(e) => return Err(self.fail(form, e.into()).await),
        };
        let mut ctx = SubmissionCtx::new(form, action, form_config.recaptcha_site_key.clone(), data);

        if form_config.dev_mode {
            info!("{} 🧪 开发模式，不发送请求", ctx);
            sleep(self.config.timings.dev_mode_delay).await;
            self.succeed(form, DEV_SENT_TOAST, DEV_SENT_BODY).await;
            return Ok(SubmissionOutcome::Simulated);
        }

        if let Some(site_key) = ctx.recaptcha_site_key.clone() {
            if !self.challenge.is_loaded().await {
                return Err(self.fail(form, ConfigError::ChallengeApiMissing.into()).await);
            }
            match self.challenge.execute(&site_key, &self.config.recaptcha_action).await {
                Ok(token) => {
                    debug!("{} ✓ 已获取验证码 token", ctx);
                    ctx.data.set(RECAPTCHA_FIELD, token);
                }
                Err(e) => {
                    return Err(self.fail(form, FormError::Challenge(e.0)).await);
                }
            }
        }

        match self.dispatch(&ctx).await {
            Ok(()) => {
                self.succeed(form, SENT_TOAST, SENT_BODY).await;
                Ok(SubmissionOutcome::Sent)
            }
            Err(e) => Err(self.fail(form, e).await),
        }
    }

    /// 发送请求并解释响应
    async fn dispatch(&self, ctx: &SubmissionCtx) -> Result<(), FormError> {
        info!("{} 📤 正在提交...", ctx);

        let reply = self
            .transport
            .post_form(&ctx.action, &ctx.data)
            .await
            .map_err(|e| FormError::Transport(e.0))?;

        if !reply.is_success() {
            return Err(FormError::Status {
                status: reply.status,
                status_text: reply.status_text,
                url: reply.url,
            });
        }

        if self.config.verbose_logging {
            debug!("{} 响应内容: {}", ctx, truncate_text(&reply.body, 80));
        }
        info!("{} ✓ 提交成功 ({})", ctx, reply.status);
        Ok(())
    }

    /// 成功流程
    async fn succeed(&self, form: FormHandle, toast: &str, body: &str) {
        log_page_fault(form, self.feedback.sent(form).await);
        self.toasts.show(toast, ToastKind::Success).await;
        let _ = self.notifier.notify(SENT_TITLE, body);
    }

    /// 失败流程，返回传入的错误
    async fn fail(&self, form: FormHandle, err: FormError) -> FormError {
        let message = err.to_string();
        warn!("[表单 {}] ❌ 提交失败: {}", form, message);

        log_page_fault(form, self.feedback.error(form, &message).await);

        if err.is_dispatch_failure() {
            self.toasts.show(&message, ToastKind::Error).await;
            let _ = self.notifier.notify(FAILED_TITLE, &message);
        }
        err
    }
}

fn log_page_fault(form: FormHandle, result: PageResult<()>) {
    if let Err(e) = result {
        error!("[表单 {}] 更新页面失败: {}", form, e);
    }
}
