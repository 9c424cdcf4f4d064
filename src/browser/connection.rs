use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 连接到已开启调试端口的浏览器，并找到表单所在页面
///
/// 优先复用 URL 以 `page_url` 开头的标签页，找不到时新建标签页并导航
pub async fn connect_to_form_page(port: u16, page_url: Option<&str>) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    let Some(url) = page_url else {
        // 没有指定目标时使用当前第一个标签页
        if let Some(page) = pages.into_iter().next() {
            return Ok((browser, page));
        }
        let page = browser.new_page("about:blank").await?;
        return Ok((browser, page));
    };

    for p in pages.iter() {
        if let Ok(Some(current)) = p.url().await {
            debug!("检查页面: {}", current);
            if current.starts_with(url) {
                info!("✓ 找到表单页面: {}", current);
                return Ok((browser, p.clone()));
            }
        }
    }

    debug!("未找到匹配的页面，新建标签页并导航到: {}", url);
    let page = browser.new_page(url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", url, e);
        e
    })?;
    page.wait_for_navigation().await?;
    info!("已导航到: {}", url);

    Ok((browser, page))
}
