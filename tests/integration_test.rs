use async_trait::async_trait;
use contact_form_submit::clients::{
    ChallengeApi, FixedChallenge, HttpReply, MissingChallenge, Transport, TransportError,
};
use contact_form_submit::error::{BindError, PageResult};
use contact_form_submit::infrastructure::{NotificationPermission, NotificationSettings};
use contact_form_submit::models::{ElementHandle, ToastKind, ToastSpec};
use contact_form_submit::{
    Config, FormController, FormData, FormError, FormHandle, FormPart, FormState, MemoryForm,
    MemoryPage, PageAdapter, SubmissionOutcome, SubmitEvent,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

const MARKER: &str = "php-email-form";

/// 记录请求的假 transport，按顺序返回预设响应
struct MockTransport {
    replies: Mutex<VecDeque<(Duration, Result<HttpReply, TransportError>)>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockTransport {
    fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn reply(self, status: u16, status_text: &str, url: &str) -> Self {
        self.reply_after(Duration::ZERO, status, status_text, url)
    }

    fn reply_after(self, delay: Duration, status: u16, status_text: &str, url: &str) -> Self {
        self.replies.lock().unwrap().push_back((
            delay,
            Ok(HttpReply {
                status,
                status_text: status_text.to_string(),
                url: url.to_string(),
                body: "OK".to_string(),
            }),
        ));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(TransportError(message.to_string()))));
        self
    }

    fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_form(
        &self,
        url: &str,
        data: &contact_form_submit::FormData,
    ) -> Result<HttpReply, TransportError> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            data.iter()
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect(),
        ));
        let next = self.replies.lock().unwrap().pop_front();
        let (delay, reply) =
            next.unwrap_or_else(|| (Duration::ZERO, Err(TransportError("no reply".into()))));
        sleep(delay).await;
        reply
    }
}

/// 每次页面调用前让出执行权，模拟浏览器往返
struct YieldingPage(Arc<MemoryPage>);

#[async_trait]
impl PageAdapter for YieldingPage {
    async fn find_forms(&self, marker: &str) -> PageResult<Vec<FormHandle>> {
        tokio::task::yield_now().await;
        self.0.find_forms(marker).await
    }

    async fn form_attribute(&self, form: FormHandle, name: &str) -> PageResult<Option<String>> {
        tokio::task::yield_now().await;
        self.0.form_attribute(form, name).await
    }

    async fn form_data(&self, form: FormHandle) -> PageResult<FormData> {
        tokio::task::yield_now().await;
        self.0.form_data(form).await
    }

    async fn render_state(&self, form: FormHandle, state: &FormState) -> PageResult<()> {
        tokio::task::yield_now().await;
        self.0.render_state(form, state).await
    }

    async fn replace_toast(&self, toast: &ToastSpec) -> PageResult<ElementHandle> {
        tokio::task::yield_now().await;
        self.0.replace_toast(toast).await
    }

    async fn fade_out(&self, element: ElementHandle) -> PageResult<()> {
        tokio::task::yield_now().await;
        self.0.fade_out(element).await
    }

    async fn remove_if_attached(&self, element: ElementHandle) -> PageResult<bool> {
        tokio::task::yield_now().await;
        self.0.remove_if_attached(element).await
    }

    async fn notification_permission(&self) -> PageResult<Option<NotificationPermission>> {
        tokio::task::yield_now().await;
        self.0.notification_permission().await
    }

    async fn request_notification_permission(&self) -> PageResult<NotificationPermission> {
        tokio::task::yield_now().await;
        self.0.request_notification_permission().await
    }

    async fn show_notification(&self, title: &str, body: &str) -> PageResult<()> {
        tokio::task::yield_now().await;
        self.0.show_notification(title, body).await
    }
}

struct Harness {
    page: Arc<MemoryPage>,
    transport: Arc<MockTransport>,
    controller: FormController,
}

impl Harness {
    async fn new(
        forms: Vec<MemoryForm>,
        transport: MockTransport,
        challenge: Arc<dyn ChallengeApi>,
    ) -> Self {
        let page = Arc::new(MemoryPage::new());
        for form in forms {
            page.add_form(form);
        }
        let transport = Arc::new(transport);
        let controller =
            FormController::new(&Config::default(), page.clone(), transport.clone(), challenge);
        controller.bind_all().await.unwrap();
        Self {
            page,
            transport,
            controller,
        }
    }

    fn form(&self, index: usize) -> MemoryForm {
        self.page.form(FormHandle(index)).unwrap()
    }
}

fn contact_form() -> MemoryForm {
    MemoryForm::new(MARKER)
        .with_attribute("action", "/contact.php")
        .with_field("name", "Ada")
        .with_field("email", "ada@example.com")
        .with_field("message", "Hello there")
}

/// 让后台任务（系统通知）跑完
async fn settle() {
    sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn test_successful_submission() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();
    settle().await;

    assert_eq!(result, Ok(SubmissionOutcome::Sent));
    let form = h.form(0);
    assert!(!form.is_visible(FormPart::Loading));
    assert!(form.is_visible(FormPart::SentMessage));
    assert!(!form.is_visible(FormPart::ErrorMessage));
    assert!(form.fields_empty());

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "/contact.php");
    assert_eq!(calls[0].1.len(), 3);

    let toasts = h.page.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].spec.kind, ToastKind::Success);
    assert_eq!(toasts[0].spec.message, "Message sent — thank you!");
    assert_eq!(h.page.toasts_created(), 1);

    assert_eq!(h.page.notification_attempts(), 1);
    let shown = h.page.notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Message sent");
    assert_eq!(shown[0].body, "Thank you — I will get back to you soon.");
}

#[tokio::test(start_paused = true)]
async fn test_any_2xx_is_success() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().reply(204, "No Content", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();

    assert_eq!(result, Ok(SubmissionOutcome::Sent));
    assert!(h.form(0).is_visible(FormPart::SentMessage));
}

#[tokio::test(start_paused = true)]
async fn test_server_error_message_format() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().reply(500, "Server Error", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();
    settle().await;

    assert!(matches!(result, Err(FormError::Status { status: 500, .. })));
    let form = h.form(0);
    assert_eq!(form.error_content, "500 Server Error /contact.php");
    assert!(form.is_visible(FormPart::ErrorMessage));
    assert!(!form.is_visible(FormPart::SentMessage));
    assert!(!form.is_visible(FormPart::Loading));
    // 失败时保留用户输入
    assert!(!form.fields_empty());

    let toasts = h.page.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].spec.kind, ToastKind::Error);
    assert_eq!(toasts[0].spec.message, "500 Server Error /contact.php");

    let shown = h.page.notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Message failed");
    assert_eq!(shown[0].body, "500 Server Error /contact.php");
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_uses_native_text() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().fail("error sending request for url (https://example.com/contact.php)"),
        Arc::new(MissingChallenge),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();

    assert!(matches!(result, Err(FormError::Transport(_))));
    let form = h.form(0);
    assert_eq!(
        form.error_content,
        "error sending request for url (https://example.com/contact.php)"
    );
    assert!(form.is_visible(FormPart::ErrorMessage));
    assert_eq!(h.page.toasts()[0].spec.kind, ToastKind::Error);
}

#[tokio::test(start_paused = true)]
async fn test_missing_action_never_sends() {
    let h = Harness::new(
        vec![MemoryForm::new(MARKER).with_field("name", "Ada")],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let mut event = SubmitEvent::new(FormHandle(0));
    let handle = h.controller.handle_submit(&mut event).unwrap();
    assert!(event.default_prevented());
    let result = handle.await.unwrap();
    settle().await;

    assert!(matches!(result, Err(FormError::Config(_))));
    assert!(h.transport.calls().is_empty());

    let form = h.form(0);
    assert_eq!(form.error_content, "The form action property is not set!");
    assert!(form.is_visible(FormPart::ErrorMessage));
    assert!(!form.is_visible(FormPart::Loading));
    assert!(!form.is_visible(FormPart::SentMessage));
    // 配置错误只在表单内显示
    assert!(h.page.toasts().is_empty());
    assert_eq!(h.page.notification_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dev_mode_simulates_success_after_delay() {
    let h = Harness::new(
        vec![contact_form().with_attribute("data-dev", "true")],
        MockTransport::new(),
        Arc::new(MissingChallenge),
    )
    .await;

    let mut event = SubmitEvent::new(FormHandle(0));
    let handle = h.controller.handle_submit(&mut event).unwrap();

    sleep(Duration::from_millis(700)).await;
    let form = h.form(0);
    assert!(form.is_visible(FormPart::Loading));
    assert!(!form.is_visible(FormPart::SentMessage));

    let result = handle.await.unwrap();
    settle().await;

    assert_eq!(result, Ok(SubmissionOutcome::Simulated));
    assert!(h.transport.calls().is_empty());
    let form = h.form(0);
    assert!(!form.is_visible(FormPart::Loading));
    assert!(form.is_visible(FormPart::SentMessage));
    assert!(form.fields_empty());
    assert_eq!(h.page.toasts()[0].spec.message, "Message sent (dev mode)");
    assert_eq!(h.page.notifications()[0].body, "Dev mode: simulated success");
}

#[tokio::test(start_paused = true)]
async fn test_site_key_without_library_short_circuits() {
    let h = Harness::new(
        vec![contact_form().with_attribute("data-recaptcha-site-key", "site-key")],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();

    assert!(matches!(result, Err(FormError::Config(_))));
    assert!(h.transport.calls().is_empty());
    let form = h.form(0);
    assert!(form.error_content.contains("reCaptcha javascript API"));
    assert!(form.is_visible(FormPart::ErrorMessage));
    assert!(!form.is_visible(FormPart::Loading));
}

#[tokio::test(start_paused = true)]
async fn test_challenge_token_overwrites_reserved_field() {
    let form = contact_form()
        .with_attribute("data-recaptcha-site-key", "site-key")
        .with_field("recaptcha-response", "stale");
    let h = Harness::new(
        vec![form],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(FixedChallenge::token("fresh-token")),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();

    assert_eq!(result, Ok(SubmissionOutcome::Sent));
    let calls = h.transport.calls();
    let tokens: Vec<_> = calls[0]
        .1
        .iter()
        .filter(|(name, _)| name == "recaptcha-response")
        .collect();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].1, "fresh-token");
}

#[tokio::test(start_paused = true)]
async fn test_challenge_fault_is_terminal() {
    let h = Harness::new(
        vec![contact_form().with_attribute("data-recaptcha-site-key", "site-key")],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(FixedChallenge::failing("Invalid site key or not loaded in api.js")),
    )
    .await;

    let result = h.controller.submit(FormHandle(0)).await.unwrap();

    assert_eq!(
        result,
        Err(FormError::Challenge(
            "Invalid site key or not loaded in api.js".to_string()
        ))
    );
    assert!(h.transport.calls().is_empty());
    assert_eq!(
        h.form(0).error_content,
        "Invalid site key or not loaded in api.js"
    );
}

#[tokio::test(start_paused = true)]
async fn test_invalid_dev_flag_is_rejected_at_bind() {
    let page = Arc::new(MemoryPage::new());
    page.add_form(contact_form().with_attribute("data-dev", "sometimes"));
    page.add_form(contact_form());
    let controller = FormController::new(
        &Config::default(),
        page.clone(),
        Arc::new(MockTransport::new()),
        Arc::new(MissingChallenge),
    );

    let report = controller.bind_all().await.unwrap();

    assert_eq!(report.bound, vec![FormHandle(1)]);
    assert_eq!(
        report.rejected,
        vec![BindError::InvalidDevFlag {
            form: 0,
            value: "sometimes".to_string()
        }]
    );

    // 未绑定的表单不拦截原生提交
    let mut event = SubmitEvent::new(FormHandle(0));
    assert!(controller.handle_submit(&mut event).is_none());
    assert!(!event.default_prevented());
}

#[tokio::test(start_paused = true)]
async fn test_only_marked_forms_are_bound() {
    let h = Harness::new(
        vec![
            MemoryForm::new("newsletter-form").with_attribute("action", "/subscribe"),
            contact_form(),
        ],
        MockTransport::new(),
        Arc::new(MissingChallenge),
    )
    .await;

    assert!(h.controller.form_config(FormHandle(0)).is_none());
    assert!(h.controller.form_config(FormHandle(1)).is_some());
    assert!(h.controller.submit(FormHandle(0)).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_submissions_last_to_resolve_wins() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new()
            .reply_after(Duration::from_millis(500), 500, "Server Error", "/contact.php")
            .reply_after(Duration::from_millis(100), 200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    let mut first = SubmitEvent::new(FormHandle(0));
    let first = h.controller.handle_submit(&mut first).unwrap();
    settle().await;
    let mut second = SubmitEvent::new(FormHandle(0));
    let second = h.controller.handle_submit(&mut second).unwrap();

    assert_eq!(second.await.unwrap(), Ok(SubmissionOutcome::Sent));
    assert!(first.await.unwrap().is_err());

    let form = h.form(0);
    assert!(form.is_visible(FormPart::ErrorMessage));
    assert!(!form.is_visible(FormPart::SentMessage));
    assert_eq!(h.transport.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_outcomes_keep_ui_consistent() {
    let memory = Arc::new(MemoryPage::new());
    let form = memory.add_form(contact_form());
    let transport = Arc::new(
        MockTransport::new()
            .reply_after(Duration::from_millis(100), 200, "OK", "/contact.php")
            .reply_after(Duration::from_millis(100), 500, "Server Error", "/contact.php"),
    );
    let controller = FormController::new(
        &Config::default(),
        Arc::new(YieldingPage(memory.clone())),
        transport.clone(),
        Arc::new(MissingChallenge),
    );
    controller.bind_all().await.unwrap();

    let mut first = SubmitEvent::new(form);
    let first = controller.handle_submit(&mut first).unwrap();
    let mut second = SubmitEvent::new(form);
    let second = controller.handle_submit(&mut second).unwrap();

    let (first, second) = tokio::join!(first, second);
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(transport.calls().len(), 2);

    let state = memory.form(form).unwrap();
    assert!(!state.is_visible(FormPart::Loading));
    assert!(state.is_visible(FormPart::SentMessage) != state.is_visible(FormPart::ErrorMessage));
    assert_eq!(memory.toasts().len(), 1);
    assert_eq!(memory.toasts_created(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_second_toast_replaces_visible_one() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new()
            .reply(200, "OK", "/contact.php")
            .reply(500, "Server Error", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;

    h.controller.submit(FormHandle(0)).await.unwrap().unwrap();
    sleep(Duration::from_millis(1000)).await;
    h.controller.submit(FormHandle(0)).await.unwrap().unwrap_err();

    let toasts = h.page.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].spec.kind, ToastKind::Error);
    assert_eq!(h.page.toasts_created(), 2);

    sleep(Duration::from_millis(5000)).await;
    assert!(h.page.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_best_effort_faults_do_not_change_outcome() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;
    h.page.fail_toasts("document.body is null");
    h.page.set_notification_settings(NotificationSettings {
        failure: Some("SecurityError: insecure context".to_string()),
        ..Default::default()
    });

    let result = h.controller.submit(FormHandle(0)).await.unwrap();
    settle().await;

    assert_eq!(result, Ok(SubmissionOutcome::Sent));
    let form = h.form(0);
    assert!(form.is_visible(FormPart::SentMessage));
    assert!(!form.is_visible(FormPart::ErrorMessage));
    assert!(h.page.toasts().is_empty());
    assert!(h.page.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_permission_prompt_on_success() {
    let h = Harness::new(
        vec![contact_form()],
        MockTransport::new().reply(200, "OK", "/contact.php"),
        Arc::new(MissingChallenge),
    )
    .await;
    h.page.set_notification_settings(NotificationSettings {
        permission: NotificationPermission::Default,
        prompt_answer: NotificationPermission::Denied,
        ..Default::default()
    });

    let result = h.controller.submit(FormHandle(0)).await.unwrap();
    settle().await;

    assert_eq!(result, Ok(SubmissionOutcome::Sent));
    assert_eq!(h.page.permission_requests(), 1);
    assert!(h.page.notifications().is_empty());
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_form_binding() {
    use contact_form_submit::browser::connect_to_form_page;
    use contact_form_submit::infrastructure::{ChromiumPage, JsExecutor};

    let config = Config::from_env();
    let port = config.browser_debug_port.unwrap_or(9222);

    let (_browser, page) = connect_to_form_page(port, config.target_url.as_deref())
        .await
        .expect("连接浏览器失败");

    let page = ChromiumPage::new(Arc::new(JsExecutor::new(page)), config.form_marker.clone());
    let forms = page.find_forms(&config.form_marker).await;

    assert!(forms.is_ok(), "应该能够查询页面中的表单");
}
