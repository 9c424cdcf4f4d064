use crate::error::{AppError, AppResult};
use crate::models::form_config::{ACTION_ATTR, DEV_MODE_ATTR, RECAPTCHA_SITE_KEY_ATTR};
use crate::models::form_data::FormField;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// TOML 表单文件
#[derive(Debug, Clone, Deserialize)]
pub struct FormDocument {
    pub form: FormSection,
    #[serde(default)]
    pub fields: Vec<FormField>,
    /// 来源文件（加载后填充）
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// `[form]` 段，对应表单元素上的属性
#[derive(Debug, Clone, Deserialize)]
pub struct FormSection {
    pub action: Option<String>,
    pub recaptcha_site_key: Option<String>,
    /// 保持字符串形式，和 data-dev 属性走同一套解析
    pub dev: Option<DevFlag>,
}

/// `dev` 既可以写成布尔值也可以写成字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DevFlag {
    Bool(bool),
    Text(String),
}

impl FormDocument {
    /// 转换成表单元素属性列表
    pub fn attributes(&self) -> Vec<(String, String)> {
        let mut attrs = Vec::new();
        if let Some(action) = &self.form.action {
            attrs.push((ACTION_ATTR.to_string(), action.clone()));
        }
        if let Some(key) = &self.form.recaptcha_site_key {
            attrs.push((RECAPTCHA_SITE_KEY_ATTR.to_string(), key.clone()));
        }
        match &self.form.dev {
            Some(DevFlag::Bool(flag)) => attrs.push((DEV_MODE_ATTR.to_string(), flag.to_string())),
            Some(DevFlag::Text(raw)) => attrs.push((DEV_MODE_ATTR.to_string(), raw.clone())),
            None => {}
        }
        attrs
    }

    /// 用于日志的名字
    pub fn display_name(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "<inline>".to_string())
    }
}

/// 从 TOML 文件加载表单
pub async fn load_form_document(toml_file_path: &Path) -> AppResult<FormDocument> {
    let path_str = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file(&path_str, e))?;

    let mut document: FormDocument =
        toml::from_str(&content).map_err(|e| AppError::file(&path_str, e))?;

    document.file_path = Some(path_str);

    Ok(document)
}

/// 从文件夹中加载所有 TOML 表单，解析失败的文件跳过
pub async fn load_all_form_documents(folder_path: &str) -> AppResult<Vec<FormDocument>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::file(
            folder_path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "文件夹不存在"),
        ));
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    // read_dir 的顺序不固定
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_form_document(&path).await {
            Ok(document) => {
                tracing::info!("成功加载表单，{} 个字段", document.fields.len());
                documents.push(document);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}
