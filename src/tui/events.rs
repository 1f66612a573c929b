use std::time::Duration;
use crossterm::event::{self, KeyCode, KeyEvent, KeyModifiers};
use anyhow::Result;
use tokio::sync::mpsc;

use crate::models::IndexState;
use crate::utils::ProgressUpdate;

/// 应用程序事件
#[derive(Clone, Debug)]
pub enum Event {
    /// 键盘输入
    Key(KeyEvent),

    /// 终端大小调整
    Resize(u16, u16),

    /// 定时刷新
    Tick,

    /// 后台索引任务的进度
    Progress(ProgressUpdate),

    /// 后台索引任务完成，归还索引状态和结果摘要
    IndexFinished(Box<IndexState>, String),
}

/// 事件处理器 - 负责捕获终端事件并与后台任务的事件合并
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,

    /// 后台任务通过它发送事件
    pub sender: mpsc::UnboundedSender<Event>,

    handler: Option<tokio::task::JoinHandle<()>>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            handler: None,
        }
    }

    /// 启动终端事件监听
    pub fn start(&mut self) {
        let sender = self.sender.clone();

        self.handler = Some(tokio::spawn(async move {
            let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

            loop {
                tokio::select! {
                    _ = tick_interval.tick() => {
                        if sender.send(Event::Tick).is_err() {
                            break;
                        }
                    }

                    result = tokio::task::spawn_blocking(|| event::poll(Duration::from_millis(16))) => {
                        if let Ok(Ok(true)) = result {
                            let app_event = match event::read() {
                                Ok(event::Event::Key(key)) => Event::Key(key),
                                Ok(event::Event::Resize(w, h)) => Event::Resize(w, h),
                                _ => continue,
                            };

                            if sender.send(app_event).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }));
    }

    /// 接收下一个事件
    pub async fn next(&mut self) -> Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("事件通道已关闭"))
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handler.take() {
            handle.abort();
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 键盘快捷键
///
/// 字母键都用于输入查询，所以快捷键只使用功能键和组合键。
pub mod keys {
    use super::*;

    /// 退出 (Esc, Ctrl+C)
    pub fn is_quit_key(key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
            KeyCode::Esc => true,
            _ => false,
        }
    }

    /// 帮助 (F1)
    pub fn is_help_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::F(1))
    }

    /// 完整建立索引 (F5)
    pub fn is_full_index_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::F(5))
    }

    /// 增量重建 (F6)
    pub fn is_reindex_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::F(6))
    }

    pub fn is_up_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Up)
    }

    pub fn is_down_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Down)
    }

    /// 切换搜索方式 (Tab)
    pub fn is_tab_key(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Tab)
    }

    /// 可以追加到查询中的字符
    pub fn typed_char(key: &KeyEvent) -> Option<char> {
        match key.code {
            KeyCode::Char(c)
                if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        assert!(keys::is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(keys::is_quit_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!keys::is_quit_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!keys::is_quit_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_function_keys() {
        assert!(keys::is_help_key(&KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE)));
        assert!(keys::is_full_index_key(&KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)));
        assert!(keys::is_reindex_key(&KeyEvent::new(KeyCode::F(6), KeyModifiers::NONE)));
        assert!(!keys::is_reindex_key(&KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE)));
    }

    #[test]
    fn test_typed_char() {
        assert_eq!(keys::typed_char(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)), Some('a'));
        assert_eq!(keys::typed_char(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)), Some('A'));
        assert_eq!(keys::typed_char(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)), None);
        assert_eq!(keys::typed_char(&KeyEvent::new(KeyCode::Up, KeyModifiers::NONE)), None);
    }
}
