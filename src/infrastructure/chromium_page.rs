//! 浏览器页面 - 基础设施层
//!
//! 通过 `JsExecutor` 在真实浏览器标签页中操作 DOM

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{PageError, PageResult};
use crate::infrastructure::js_executor::{guarded_script, js_string, JsExecutor};
use crate::infrastructure::page::{
    FormHandle, FormPart, FormState, NotificationPermission, PageAdapter, VISIBLE_CLASS,
};
use crate::models::{ElementHandle, FormData, FormField, ToastSpec};

/// 浏览器页面适配器
pub struct ChromiumPage {
    executor: Arc<JsExecutor>,
    marker: RwLock<String>,
    next_toast: AtomicU64,
}

impl ChromiumPage {
    pub fn new(executor: Arc<JsExecutor>, marker: impl Into<String>) -> Self {
        Self {
            executor,
            marker: RwLock::new(marker.into()),
            next_toast: AtomicU64::new(0),
        }
    }

    fn marker(&self) -> String {
        self.marker
            .read()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// 执行脚本并检查返回
    async fn run(&self, form: Option<FormHandle>, script: String) -> PageResult<JsonValue> {
        let reply = self.executor.eval_reply(script).await?;

        if reply.ok {
            return Ok(reply.value);
        }
        match (form, reply.missing, reply.error) {
            (Some(form), Some(class), _) => Err(PageError::ElementMissing { form: form.0, class }),
            (Some(form), None, Some(error)) if error == "form-not-found" => {
                Err(PageError::FormNotFound(form.0))
            }
            (_, _, Some(error)) => Err(PageError::Rejected(error)),
            _ => Err(PageError::Script("页面脚本返回了未知错误".to_string())),
        }
    }

    /// 包装针对某个表单的脚本，`body` 中可以使用 `form` 变量
    fn form_script(&self, form: FormHandle, body: &str) -> String {
        guarded_script(&format!(
            r#"
            const form = document.querySelectorAll({selector})[{index}];
            if (!form) return {{ ok: false, error: "form-not-found" }};
            {body}
            "#,
            selector = js_string(&format!(".{}", self.marker())),
            index = form.0,
            body = body
        ))
    }

    /// 渲染状态的脚本：先确认三个元素都在，再一次性切换
    fn state_script(state: &FormState) -> String {
        let parts = [
            ("loading", FormPart::Loading),
            ("error", FormPart::ErrorMessage),
            ("sent", FormPart::SentMessage),
        ];
        let visible = state.visible_part();
        let visible_class = js_string(VISIBLE_CLASS);

        let mut script = String::new();
        for (var, part) in parts {
            script.push_str(&format!(
                "const {var} = form.querySelector({selector});\nif (!{var}) return {{ ok: false, missing: {class} }};\n",
                var = var,
                selector = js_string(&format!(".{}", part.class_name())),
                class = js_string(part.class_name())
            ));
        }
        if let FormState::Error(message) = state {
            script.push_str(&format!("error.innerHTML = {};\n", js_string(message)));
        }
        for (var, part) in parts {
            script.push_str(&format!(
                "{}.classList.toggle({}, {});\n",
                var,
                visible_class,
                part == visible
            ));
        }
        if *state == FormState::Sent {
            script.push_str("form.reset();\n");
        }
        script.push_str("return { ok: true };");
        script
    }

    /// 移除旧 toast 并创建新 toast 的脚本，返回值表示是否移除了旧的
    fn toast_script(toast: &ToastSpec, handle: ElementHandle) -> String {
        let body = format!(
            r##"
            const prev = document.getElementById({id});
            if (prev) prev.remove();

            const toast = document.createElement("div");
            toast.id = {id};
            toast.dataset.toastSeq = {seq};
            Object.assign(toast.style, {{
                position: "fixed",
                bottom: "24px",
                right: "24px",
                zIndex: 9999,
                padding: "12px 18px",
                borderRadius: "4px",
                boxShadow: "0 2px 10px rgba(0,0,0,0.2)",
                color: "#fff",
                fontSize: "14px",
                maxWidth: "320px",
                lineHeight: "1.3",
                cursor: "default",
                backgroundColor: {background},
            }});
            toast.textContent = {message};
            toast.setAttribute("role", "status");
            toast.setAttribute("aria-live", "polite");
            toast.tabIndex = -1;
            document.body.appendChild(toast);
            return {{ ok: true, value: !!prev }};
            "##,
            id = js_string(&toast.id),
            seq = js_string(&handle.0.to_string()),
            background = js_string(toast.kind.background()),
            message = js_string(&toast.message)
        );
        guarded_script(&body)
    }
}

#[async_trait]
impl PageAdapter for ChromiumPage {
    async fn find_forms(&self, marker: &str) -> PageResult<Vec<FormHandle>> {
        if let Ok(mut current) = self.marker.write() {
            *current = marker.to_string();
        }
        let script = format!(
            r#"
            (() => {{
                return {{ ok: true, value: document.querySelectorAll({}).length }};
            }})()
            "#,
            js_string(&format!(".{}", marker))
        );
        let count = self.run(None, script).await?.as_u64().unwrap_or(0) as usize;
        debug!("页面中找到 {} 个表单 (.{})", count, marker);
        Ok((0..count).map(FormHandle).collect())
    }

    async fn form_attribute(&self, form: FormHandle, name: &str) -> PageResult<Option<String>> {
        let body = format!(
            "return {{ ok: true, value: form.getAttribute({}) }};",
            js_string(name)
        );
        let value = self.run(Some(form), self.form_script(form, &body)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn form_data(&self, form: FormHandle) -> PageResult<FormData> {
        let body = r#"
            const entries = [];
            for (const [name, value] of new FormData(form).entries()) {
                if (typeof value === "string") entries.push({ name, value });
            }
            return { ok: true, value: entries };
        "#;
        let value = self.run(Some(form), self.form_script(form, body)).await?;
        let fields: Vec<FormField> =
            serde_json::from_value(value).map_err(|e| PageError::Script(e.to_string()))?;
        Ok(fields.into_iter().map(|f| (f.name, f.value)).collect())
    }

    async fn render_state(&self, form: FormHandle, state: &FormState) -> PageResult<()> {
        let body = Self::state_script(state);
        self.run(Some(form), self.form_script(form, &body)).await?;
        Ok(())
    }

    async fn replace_toast(&self, toast: &ToastSpec) -> PageResult<ElementHandle> {
        let handle = ElementHandle(self.next_toast.fetch_add(1, Ordering::SeqCst) + 1);
        let replaced = self.run(None, Self::toast_script(toast, handle)).await?;
        if replaced.as_bool().unwrap_or(false) {
            debug!("已移除上一条 toast");
        }
        Ok(handle)
    }

    async fn fade_out(&self, element: ElementHandle) -> PageResult<()> {
        let script = format!(
            r#"
            (() => {{
                const toast = document.querySelector('[data-toast-seq="{}"]');
                if (toast) {{
                    toast.style.transition = "opacity 300ms ease-out, transform 300ms ease-out";
                    toast.style.opacity = "0";
                    toast.style.transform = "translateY(10px)";
                }}
                return {{ ok: true }};
            }})()
            "#,
            element.0
        );
        self.run(None, script).await?;
        Ok(())
    }

    async fn remove_if_attached(&self, element: ElementHandle) -> PageResult<bool> {
        let script = format!(
            r#"
            (() => {{
                const toast = document.querySelector('[data-toast-seq="{}"]');
                if (toast && toast.parentNode) {{
                    toast.parentNode.removeChild(toast);
                    return {{ ok: true, value: true }};
                }}
                return {{ ok: true, value: false }};
            }})()
            "#,
            element.0
        );
        Ok(self.run(None, script).await?.as_bool().unwrap_or(false))
    }

    async fn notification_permission(&self) -> PageResult<Option<NotificationPermission>> {
        let script = r#"
            (() => {
                if (!("Notification" in window)) return { ok: true, value: null };
                return { ok: true, value: Notification.permission };
            })()
        "#;
        let value = self.run(None, script.to_string()).await?;
        Ok(value.as_str().and_then(NotificationPermission::parse))
    }

    async fn request_notification_permission(&self) -> PageResult<NotificationPermission> {
        let script = r#"
            (async () => {
                try {
                    const permission = await Notification.requestPermission();
                    return { ok: true, value: permission };
                } catch (e) {
                    return { ok: false, error: String(e) };
                }
            })()
        "#;
        let value = self.run(None, script.to_string()).await?;
        Ok(value
            .as_str()
            .and_then(NotificationPermission::parse)
            .unwrap_or(NotificationPermission::Default))
    }

    async fn show_notification(&self, title: &str, body: &str) -> PageResult<()> {
        let script = guarded_script(&format!(
            "new Notification({}, {{ body: {} }});\nreturn {{ ok: true }};",
            js_string(title),
            js_string(body)
        ));
        self.run(None, script).await?;
        Ok(())
    }
}
