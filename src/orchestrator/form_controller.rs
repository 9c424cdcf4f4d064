//! 表单控制器 - 编排层
//!
//! 绑定页面中所有带 marker 的表单，接管它们的提交事件

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::{ChallengeApi, Transport};
use crate::config::Config;
use crate::error::{AppError, AppResult, BindError, FormError};
use crate::infrastructure::{FormHandle, PageAdapter};
use crate::models::form_config::{ACTION_ATTR, DEV_MODE_ATTR, RECAPTCHA_SITE_KEY_ATTR};
use crate::models::FormConfig;
use crate::workflow::{SubmissionFlow, SubmissionOutcome};

/// 一次提交的结果
pub type SubmissionResult = Result<SubmissionOutcome, FormError>;

/// 表单提交事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    form: FormHandle,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(form: FormHandle) -> Self {
        Self {
            form,
            default_prevented: false,
        }
    }

    pub fn form(&self) -> FormHandle {
        self.form
    }

    /// 阻止浏览器原生提交
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// 绑定结果
#[derive(Debug, Default)]
pub struct BindReport {
    pub bound: Vec<FormHandle>,
    pub rejected: Vec<BindError>,
}

/// 表单控制器
///
/// 职责：
/// - 按 marker 查找表单并解析配置
/// - 接管提交事件，每次提交作为独立任务运行
/// - 不限制同一表单的并发提交
pub struct FormController {
    page: Arc<dyn PageAdapter>,
    flow: Arc<SubmissionFlow>,
    marker: String,
    forms: RwLock<HashMap<FormHandle, FormConfig>>,
}

impl FormController {
    pub fn new(
        config: &Config,
        page: Arc<dyn PageAdapter>,
        transport: Arc<dyn Transport>,
        challenge: Arc<dyn ChallengeApi>,
    ) -> Self {
        Self {
            flow: Arc::new(SubmissionFlow::new(config, page.clone(), transport, challenge)),
            page,
            marker: config.form_marker.clone(),
            forms: RwLock::new(HashMap::new()),
        }
    }

    /// 绑定页面中所有带 marker 的表单
    pub async fn bind_all(&self) -> AppResult<BindReport> {
        let handles = self.page.find_forms(&self.marker).await?;
        info!("🔗 找到 {} 个 .{} 表单", handles.len(), self.marker);

        let mut report = BindReport::default();
        for form in handles {
            match self.read_config(form).await {
                Ok(config) => {
                    debug!("[表单 {}] 已绑定: {}", form, config);
                    self.forms_mut().insert(form, config);
                    report.bound.push(form);
                }
                Err(e) => {
                    error!("[表单 {}] ❌ 绑定失败: {}", form, e);
                    report.rejected.push(e);
                }
            }
        }
        Ok(report)
    }

    /// 读取并校验表单配置
    async fn read_config(&self, form: FormHandle) -> Result<FormConfig, BindError> {
        let attr = |name: &'static str| {
            let page = self.page.clone();
            async move {
                page.form_attribute(form, name)
                    .await
                    .map_err(|source| BindError::Page { form: form.0, source })
            }
        };

        let action = attr(ACTION_ATTR).await?;
        let site_key = attr(RECAPTCHA_SITE_KEY_ATTR).await?;
        let dev_flag = attr(DEV_MODE_ATTR).await?;

        FormConfig::from_attributes(action, site_key, dev_flag)
            .map_err(|value| BindError::InvalidDevFlag { form: form.0, value })
    }

    /// 表单的配置，未绑定时返回 `None`
    pub fn form_config(&self, form: FormHandle) -> Option<FormConfig> {
        self.forms_ref().get(&form).cloned()
    }

    /// 处理提交事件
    ///
    /// 未绑定的表单不处理，返回 `None`，原生提交不被阻止
    pub fn handle_submit(&self, event: &mut SubmitEvent) -> Option<JoinHandle<SubmissionResult>> {
        let form = event.form();
        let config = self.form_config(form)?;
        event.prevent_default();

        let flow = self.flow.clone();
        Some(tokio::spawn(async move { flow.run(form, &config).await }))
    }

    /// 提交表单并等待主流程结束
    pub async fn submit(&self, form: FormHandle) -> AppResult<SubmissionResult> {
        let mut event = SubmitEvent::new(form);
        let handle = self
            .handle_submit(&mut event)
            .ok_or(AppError::NotBound(form.0))?;

        handle.await.map_err(|e| {
            warn!("[表单 {}] 提交任务异常退出: {}", form, e);
            AppError::Task(e.to_string())
        })
    }

    fn forms_ref(&self) -> std::sync::RwLockReadGuard<'_, HashMap<FormHandle, FormConfig>> {
        self.forms.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn forms_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<FormHandle, FormConfig>> {
        self.forms.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
