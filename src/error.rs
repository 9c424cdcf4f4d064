use thiserror::Error;

/// 一次提交尝试的终止错误
///
/// `Display` 的输出就是渲染到 `.error-message` 里的文本
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// 表单配置错误（不发请求）
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 验证码 token 获取失败
    #[error("{0}")]
    Challenge(String),
    /// 网络层失败（没有拿到响应）
    #[error("{0}")]
    Transport(String),
    /// 读取表单失败
    #[error(transparent)]
    Page(#[from] PageError),
    /// 非 2xx 响应
    #[error("{status} {status_text} {url}")]
    Status {
        status: u16,
        status_text: String,
        url: String,
    },
}

impl FormError {
    /// 是否为请求阶段的失败（需要 toast 和系统通知）
    pub fn is_dispatch_failure(&self) -> bool {
        matches!(self, FormError::Transport(_) | FormError::Status { .. })
    }
}

/// 表单配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("The form action property is not set!")]
    MissingAction,
    #[error("The reCaptcha javascript API url is not loaded!")]
    ChallengeApiMissing,
}

/// 页面适配器错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// 找不到表单
    #[error("表单不存在: #{0}")]
    FormNotFound(usize),
    /// 找不到表单内的元素
    #[error("表单 #{form} 中缺少元素 .{class}")]
    ElementMissing { form: usize, class: String },
    /// 当前环境不允许该操作（例如非安全上下文中的通知）
    #[error("操作被页面拒绝: {0}")]
    Rejected(String),
    /// 脚本执行失败
    #[error("执行脚本失败: {0}")]
    Script(String),
}

/// 绑定表单时的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// `data-dev` 不是合法的布尔值
    #[error("表单 #{form} 的 data-dev 取值无效: '{value}'")]
    InvalidDevFlag { form: usize, value: String },
    /// 读取表单属性失败
    #[error("读取表单 #{form} 属性失败: {source}")]
    Page {
        form: usize,
        #[source]
        source: PageError,
    },
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 页面操作错误
    #[error("页面错误: {0}")]
    Page(#[from] PageError),
    /// 表单未绑定提交处理
    #[error("表单 #{0} 未绑定")]
    NotBound(usize),
    /// 后台任务异常退出
    #[error("任务执行失败: {0}")]
    Task(String),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::File {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

/// 页面操作结果类型
pub type PageResult<T> = Result<T, PageError>;

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
