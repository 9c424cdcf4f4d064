//! 应用主结构 - 编排层
//!
//! 管理页面资源（浏览器或内存页面），绑定表单并逐个提交

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::browser;
use crate::clients::{
    ChallengeApi, ChromiumChallenge, FixedChallenge, MissingChallenge, ReqwestTransport, Transport,
};
use crate::config::Config;
use crate::infrastructure::{
    ChromiumPage, FormHandle, JsExecutor, MemoryForm, MemoryPage, PageAdapter,
};
use crate::models::load_all_form_documents;
use crate::orchestrator::form_controller::{FormController, SubmitEvent};
use crate::utils::logging;

/// 处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// 应用主结构
pub struct App {
    controller: FormController,
    /// 浏览器模式下保持连接
    _browser: Option<Browser>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);

        let (page, challenge, browser): (Arc<dyn PageAdapter>, Arc<dyn ChallengeApi>, Option<Browser>) =
            match config.browser_debug_port {
                Some(port) => {
                    logging::log_startup("浏览器模式", &config.form_marker);
                    let (browser, page) =
                        browser::connect_to_form_page(port, config.target_url.as_deref()).await?;
                    let executor = Arc::new(JsExecutor::new(page));
                    let page: Arc<dyn PageAdapter> =
                        Arc::new(ChromiumPage::new(executor.clone(), config.form_marker.clone()));
                    let challenge: Arc<dyn ChallengeApi> = Arc::new(ChromiumChallenge::new(executor));
                    (page, challenge, Some(browser))
                }
                None => {
                    logging::log_startup("无浏览器模式", &config.form_marker);
                    let page = load_memory_page(&config).await?;
                    let challenge: Arc<dyn ChallengeApi> = match &config.recaptcha_token {
                        Some(token) => Arc::new(FixedChallenge::token(token.clone())),
                        None => Arc::new(MissingChallenge),
                    };
                    (page, challenge, None)
                }
            };

        Ok(Self {
            controller: FormController::new(&config, page, transport, challenge),
            _browser: browser,
        })
    }

    /// 绑定并提交所有表单
    pub async fn run(&self) -> Result<RunStats> {
        let report = self.controller.bind_all().await?;
        for rejected in &report.rejected {
            warn!("⚠️ 跳过表单: {}", rejected);
        }

        if report.bound.is_empty() {
            warn!("⚠️ 没有可提交的表单，程序结束");
            return Ok(RunStats::default());
        }

        let mut handles: Vec<(FormHandle, _)> = Vec::new();
        for form in &report.bound {
            let mut event = SubmitEvent::new(*form);
            if let Some(handle) = self.controller.handle_submit(&mut event) {
                handles.push((*form, handle));
            }
        }

        let (forms, futures): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(futures).await;

        let mut stats = RunStats {
            total: forms.len(),
            ..Default::default()
        };
        for (form, result) in forms.into_iter().zip(results) {
            match result {
                Ok(Ok(outcome)) => {
                    info!("[表单 {}] ✅ {:?}", form, outcome);
                    stats.sent += 1;
                }
                Ok(Err(e)) => {
                    error!("[表单 {}] ❌ {}", form, e);
                    stats.failed += 1;
                }
                Err(e) => {
                    error!("[表单 {}] 任务执行失败: {}", form, e);
                    stats.failed += 1;
                }
            }
        }

        logging::print_final_stats(stats.sent, stats.failed, stats.total);
        Ok(stats)
    }
}

/// 把 TOML 表单装入内存页面
async fn load_memory_page(config: &Config) -> Result<Arc<dyn PageAdapter>> {
    info!("\n📁 正在扫描表单文件: {}", config.forms_folder);
    let documents = load_all_form_documents(&config.forms_folder)
        .await
        .context("加载表单文件失败")?;

    let page = MemoryPage::new();
    for document in &documents {
        let form = page.add_form(MemoryForm::from_document(&config.form_marker, document));
        info!("[表单 {}] 来自 {}", form, document.display_name());
    }
    Ok(Arc::new(page))
}
