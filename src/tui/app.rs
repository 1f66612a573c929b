use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use ratatui::{
    backend::CrosstermBackend,
    Terminal,
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    style::{Color, Style, Modifier},
    text::{Line, Span},
    Frame,
};
use crossterm::{
    event::{KeyCode, KeyEvent},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    execute,
};
use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::indexer::FileIndexer;
use crate::models::IndexState;
use crate::operations::index_manager::{format_build_report, format_reconcile_report};
use crate::search::{self, SearchMode};
use crate::storage::IndexStore;
use crate::tui::events::{keys, Event, EventHandler};
use crate::tui::screens::{SearchScreen, SearchView};
use crate::utils::{ChannelProgress, ProgressUpdate};

/// 应用程序状态
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    /// 搜索界面
    Searching,

    /// 帮助信息
    Help,
}

/// 后台索引任务类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexJob {
    /// 完整建立索引 (F5)
    Full,

    /// 增量重建 (F6)
    Reconcile,
}

/// 交互式搜索应用
pub struct App {
    config: Config,
    store: IndexStore,

    /// F5/F6 使用的根目录
    root: Option<PathBuf>,

    state: AppState,

    /// 当前索引；后台任务运行时为 None，任务结束后归还
    index: Option<IndexState>,

    indexing: bool,
    query: String,
    mode: SearchMode,
    results: Vec<String>,
    selected: usize,
    progress: Option<ProgressUpdate>,
    status_message: String,
    should_quit: bool,
    event_handler: EventHandler,
    search_screen: SearchScreen,
}

impl App {
    pub fn new(config: Config, store: IndexStore, root: Option<PathBuf>) -> Self {
        Self {
            config,
            store,
            root,
            state: AppState::Searching,
            index: Some(IndexState::default()),
            indexing: false,
            query: String::new(),
            mode: SearchMode::Combined,
            results: Vec::new(),
            selected: 0,
            progress: None,
            status_message: "正在启动...".to_string(),
            should_quit: false,
            event_handler: EventHandler::new(),
            search_screen: SearchScreen::new(),
        }
    }

    /// 运行应用程序
    pub async fn run(&mut self) -> Result<()> {
        self.load_index().await;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.event_handler.start();

        let result = self.main_loop(&mut terminal).await;

        // 恢复终端
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            let event = self.event_handler.next().await?;
            self.handle_event(event);

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// 启动时加载已有索引
    async fn load_index(&mut self) {
        let indexer = FileIndexer::new(&self.config, self.store.clone());

        self.status_message = match indexer.load().await {
            Ok(Some(state)) => {
                let message = format!("已加载索引: {} 个文件，{} 个文件夹", state.total_files, state.total_folders);
                self.index = Some(state);
                message
            }
            Ok(None) => "未找到索引，按 F5 建立索引".to_string(),
            Err(err) => format!("加载索引失败: {:#}", err),
        };
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Resize(_, _) | Event::Tick => {}
            Event::Progress(update) => {
                // 任务结束后才到达的进度直接丢弃
                if self.indexing {
                    self.progress = Some(update);
                }
            }
            Event::IndexFinished(state, summary) => self.finish_index(*state, summary),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.state == AppState::Help {
            self.state = AppState::Searching;
            return;
        }

        if keys::is_quit_key(&key) {
            self.should_quit = true;
        } else if keys::is_help_key(&key) {
            self.state = AppState::Help;
        } else if keys::is_full_index_key(&key) {
            self.start_index(IndexJob::Full);
        } else if keys::is_reindex_key(&key) {
            self.start_index(IndexJob::Reconcile);
        } else if keys::is_tab_key(&key) {
            self.mode = self.mode.next();
            self.refresh_results();
        } else if keys::is_up_key(&key) {
            self.selected = self.selected.saturating_sub(1);
        } else if keys::is_down_key(&key) {
            if self.selected + 1 < self.results.len() {
                self.selected += 1;
            }
        } else if key.code == KeyCode::Backspace {
            self.query.pop();
            self.refresh_results();
        } else if let Some(c) = keys::typed_char(&key) {
            self.query.push(c);
            self.refresh_results();
        }
    }

    /// 按当前查询和搜索方式重新搜索
    ///
    /// 综合模式下仍然支持 `-f ` 和 `-s ` 前缀。
    fn refresh_results(&mut self) {
        self.selected = 0;

        let Some(index) = self.index.as_ref().filter(|index| !index.is_empty()) else {
            self.results.clear();
            return;
        };

        let (mode, query) = if self.mode == SearchMode::Combined {
            search::parse_query(&self.query)
        } else {
            (self.mode, self.query.as_str())
        };
        self.results = search::search(index, mode, query);
    }

    /// 把索引交给后台任务，进度通过事件通道返回
    fn start_index(&mut self, job: IndexJob) {
        if self.indexing {
            self.status_message = "索引任务正在进行中".to_string();
            return;
        }

        let Some(root) = self.root.clone() else {
            self.status_message = "未指定根目录，请使用 `tui <目录>` 启动".to_string();
            return;
        };

        let mut state = self.index.take().unwrap_or_default();
        self.indexing = true;
        self.progress = None;
        self.results.clear();
        self.selected = 0;
        self.status_message = match job {
            IndexJob::Full => format!("正在建立索引: {}", root.display()),
            IndexJob::Reconcile => format!("正在增量重建: {}", root.display()),
        };

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let forward = self.event_handler.sender.clone();
        tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                if forward.send(Event::Progress(update)).is_err() {
                    break;
                }
            }
        });

        let indexer = FileIndexer::with_progress(
            &self.config,
            self.store.clone(),
            Arc::new(ChannelProgress::new(progress_tx)),
        );
        let sender = self.event_handler.sender.clone();

        spawn_index_task(sender, self.store.clone(), async move {
            let summary = match job {
                IndexJob::Full => {
                    let report = indexer.build_index(&root, &mut state).await;
                    if report.root_missing {
                        format!("路径不存在: {}", root.display())
                    } else {
                        one_line(&format_build_report(&report, indexer.store().path()))
                    }
                }
                IndexJob::Reconcile => {
                    let report = indexer.reconcile(&root, &mut state).await;
                    one_line(&format_reconcile_report(&report))
                }
            };
            (state, summary)
        });
    }

    fn finish_index(&mut self, state: IndexState, summary: String) {
        self.index = Some(state);
        self.indexing = false;
        self.progress = None;
        self.status_message = summary;
        self.refresh_results();
    }

    fn draw(&mut self, f: &mut Frame) {
        let area = f.area();

        match self.state {
            AppState::Searching => {
                let view = SearchView {
                    query: &self.query,
                    mode: self.mode,
                    results: &self.results,
                    selected: self.selected,
                    progress: self.progress.as_ref(),
                    indexing: self.indexing,
                    indexed_files: self.index.as_ref().map_or(0, |index| index.total_files),
                };
                self.search_screen.draw(f, area, &view);
            }
            AppState::Help => self.draw_help_screen(f, area),
        }

        self.draw_status_bar(f, area);
    }

    fn draw_help_screen(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("帮助信息")
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Green));

        let help_text = vec![
            Line::from(vec![Span::styled("快捷键:", Style::default().add_modifier(Modifier::BOLD))]),
            Line::from(""),
            Line::from("  输入字符        - 实时搜索"),
            Line::from("  Tab             - 切换搜索方式"),
            Line::from("  ↑/↓             - 选择结果"),
            Line::from("  F5              - 完整建立索引"),
            Line::from("  F6              - 增量重建索引"),
            Line::from("  F1              - 显示帮助信息"),
            Line::from("  Esc, Ctrl+C     - 退出"),
            Line::from(""),
            Line::from(vec![Span::styled("查询前缀（综合模式）:", Style::default().add_modifier(Modifier::BOLD))]),
            Line::from(""),
            Line::from("  -f <关键字>     - 路径包含关键字的文件夹下的所有子文件夹"),
            Line::from("  -s <关键字>     - 名称包含关键字的文件和文件夹"),
            Line::from(""),
            Line::from("按任意键返回"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(block)
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }

    fn draw_status_bar(&self, f: &mut Frame, area: Rect) {
        if area.height == 0 {
            return;
        }

        let status_area = Rect {
            x: area.x,
            y: area.y + area.height - 1,
            width: area.width,
            height: 1,
        };

        let status_text = format!(
            "{} | 方式: {} | 结果: {} | F1 帮助",
            self.status_message,
            self.mode.label(),
            self.results.len()
        );

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(Color::Blue).fg(Color::White));

        f.render_widget(status, status_area);
    }
}

/// 把多行报告合并成一行状态消息
fn one_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

/// 在后台运行索引任务，结束后把索引交还界面
///
/// 任务 panic 时状态随任务丢失，改为从索引文件重新加载。
fn spawn_index_task<F>(sender: mpsc::UnboundedSender<Event>, store: IndexStore, work: F)
where
    F: Future<Output = (IndexState, String)> + Send + 'static,
{
    tokio::spawn(async move {
        let (state, summary) = match tokio::spawn(work).await {
            Ok(finished) => finished,
            Err(err) => {
                tracing::error!("索引任务异常终止: {}", err);
                let state = match store.load().await {
                    Ok(snapshot) => snapshot.map(IndexState::from).unwrap_or_default(),
                    Err(load_err) => {
                        tracing::warn!("恢复索引失败: {}", load_err);
                        IndexState::default()
                    }
                };
                (state, format!("索引任务异常终止，已从索引文件恢复: {}", err))
            }
        };

        let _ = sender.send(Event::IndexFinished(Box::new(state), summary));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use std::fs;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_index() -> IndexState {
        let mut state = IndexState::default();
        state.files.insert("notes.txt", "/home/me/docs/notes.txt");
        state.files.insert("main.rs", "/home/me/app/main.rs");
        state.folders.insert("docs", "/home/me/docs");
        state.total_files = 2;
        state.total_folders = 1;
        state
    }

    fn test_app(root: Option<PathBuf>) -> App {
        let temp_dir = tempdir().unwrap();
        let store = IndexStore::new(temp_dir.path().join("index.json"));
        App::new(Config::default(), store, root)
    }

    #[test]
    fn test_typing_updates_results() {
        let mut app = test_app(None);
        app.index = Some(sample_index());

        for c in "note".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        assert_eq!(app.results, vec!["/home/me/docs/notes.txt".to_string()]);

        app.handle_key_event(key(KeyCode::Backspace));
        assert_eq!(app.query, "not");

        app.handle_key_event(key(KeyCode::Tab));
        assert_eq!(app.mode, SearchMode::FoldersOnly);
    }

    #[test]
    fn test_help_and_quit() {
        let mut app = test_app(None);

        app.handle_key_event(key(KeyCode::F(1)));
        assert_eq!(app.state, AppState::Help);

        // 帮助界面中任意键返回，不会退出
        app.handle_key_event(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Searching);
        assert!(!app.should_quit);

        app.handle_key_event(key(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_index_without_root() {
        let mut app = test_app(None);
        app.handle_key_event(key(KeyCode::F(5)));

        assert!(!app.indexing);
        assert!(app.index.is_some());
        assert!(app.status_message.contains("未指定根目录"));
    }

    #[tokio::test]
    async fn test_full_index_returns_state() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/a.txt"), "").unwrap();

        let store = IndexStore::new(temp_dir.path().join("index.json"));
        let mut app = App::new(Config::default(), store, Some(root));

        app.handle_key_event(key(KeyCode::F(5)));
        assert!(app.indexing);
        assert!(app.index.is_none());

        // 等待后台任务归还索引
        loop {
            let event = app.event_handler.next().await.unwrap();
            let finished = matches!(event, Event::IndexFinished(..));
            app.handle_event(event);
            if finished {
                break;
            }
        }

        assert!(!app.indexing);
        assert!(app.progress.is_none());
        assert_eq!(app.index.as_ref().unwrap().total_files, 1);

        app.handle_key_event(key(KeyCode::Char('a')));
        assert_eq!(app.results.len(), 1);
    }

    #[tokio::test]
    async fn test_panicked_index_task_restores_saved_index() {
        let temp_dir = tempdir().unwrap();
        let store = IndexStore::new(temp_dir.path().join("index.json"));
        store.save(&sample_index().to_snapshot()).await.unwrap();

        let mut app = App::new(Config::default(), store.clone(), Some(temp_dir.path().to_path_buf()));
        app.index = None;
        app.indexing = true;

        spawn_index_task(app.event_handler.sender.clone(), store, async {
            panic!("索引线程崩溃");
        });

        loop {
            let event = app.event_handler.next().await.unwrap();
            let finished = matches!(event, Event::IndexFinished(..));
            app.handle_event(event);
            if finished {
                break;
            }
        }

        assert!(!app.indexing);
        assert!(app.status_message.contains("异常终止"));
        assert_eq!(app.index.as_ref().unwrap().total_files, 2);

        app.handle_key_event(key(KeyCode::Char('n')));
        assert!(app.results.contains(&"/home/me/docs/notes.txt".to_string()));
    }

    #[tokio::test]
    async fn test_reconcile_without_index_adds_everything() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), "").unwrap();

        let store = IndexStore::new(temp_dir.path().join("index.json"));
        let mut app = App::new(Config::default(), store, Some(root));

        app.handle_key_event(key(KeyCode::F(6)));
        assert!(app.indexing);

        loop {
            let event = app.event_handler.next().await.unwrap();
            let finished = matches!(event, Event::IndexFinished(..));
            app.handle_event(event);
            if finished {
                break;
            }
        }

        assert_eq!(app.index.as_ref().unwrap().total_files, 1);
        assert!(app.status_message.contains("新增 1 个"));
    }

    #[test]
    fn test_draw_search_and_help() {
        let mut app = test_app(None);
        app.index = Some(sample_index());
        app.handle_key_event(key(KeyCode::Char('m')));

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        app.handle_key_event(key(KeyCode::F(1)));
        terminal.draw(|f| app.draw(f)).unwrap();
    }

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("a\nb\n"), "a b");
    }
}
