use std::path::Path;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame,
};

use crate::search::SearchMode;
use crate::utils::{render_bar, ProgressUpdate};

/// 搜索方式标签栏的顺序
const MODES: [SearchMode; 4] = [
    SearchMode::Combined,
    SearchMode::FoldersOnly,
    SearchMode::Names,
    SearchMode::Extension,
];

/// 搜索屏幕需要的数据
pub struct SearchView<'a> {
    pub query: &'a str,
    pub mode: SearchMode,
    pub results: &'a [String],
    pub selected: usize,
    pub progress: Option<&'a ProgressUpdate>,
    pub indexing: bool,
    pub indexed_files: usize,
}

/// 搜索屏幕 - 查询输入框、结果列表和索引进度
pub struct SearchScreen {
    list_state: ListState,
}

impl SearchScreen {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, view: &SearchView) {
        let progress_height = if view.progress.is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),               // 搜索方式
                Constraint::Length(3),               // 查询
                Constraint::Min(0),                  // 结果
                Constraint::Length(progress_height), // 进度
                Constraint::Length(1),               // 状态栏占位
            ])
            .split(area);

        self.draw_mode_tabs(f, chunks[0], view.mode);
        self.draw_query(f, chunks[1], view.query);
        self.draw_results(f, chunks[2], view);

        if let Some(update) = view.progress {
            self.draw_progress(f, chunks[3], update);
        }
    }

    fn draw_mode_tabs(&self, f: &mut Frame, area: Rect, mode: SearchMode) {
        let titles: Vec<&str> = MODES.iter().map(|m| m.label()).collect();
        let selected = MODES.iter().position(|m| *m == mode).unwrap_or(0);

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("搜索方式 (Tab 切换)"))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(selected);

        f.render_widget(tabs, area);
    }

    fn draw_query(&self, f: &mut Frame, area: Rect, query: &str) {
        let line = Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Cyan)),
            Span::raw(query),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]);

        let paragraph = Paragraph::new(line)
            .block(Block::default().title("查询").borders(Borders::ALL));

        f.render_widget(paragraph, area);
    }

    fn draw_results(&mut self, f: &mut Frame, area: Rect, view: &SearchView) {
        if view.results.is_empty() {
            let message = if view.indexing {
                "正在建立索引，完成后即可搜索"
            } else if view.indexed_files == 0 {
                "索引为空\n\n按 F5 建立索引"
            } else if view.query.trim().is_empty() {
                "输入关键字开始搜索"
            } else {
                "没有匹配的结果"
            };

            let paragraph = Paragraph::new(message)
                .block(Block::default().title("结果").borders(Borders::ALL))
                .style(Style::default().fg(Color::Gray));

            f.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = view
            .results
            .iter()
            .map(|path| {
                let name = Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<30}", name), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!(" {}", path), Style::default().fg(Color::Gray)),
                ]))
            })
            .collect();

        self.list_state.select(Some(view.selected));

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("结果 ({} 个)", view.results.len()))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_progress(&self, f: &mut Frame, area: Rect, update: &ProgressUpdate) {
        // 标签、百分比和计数大约占 40 列
        let width = (area.width as usize).saturating_sub(40).max(10);
        let text = render_bar(update, width);

        let paragraph = Paragraph::new(text)
            .block(Block::default().title("索引中").borders(Borders::ALL))
            .style(Style::default().fg(Color::Yellow));

        f.render_widget(paragraph, area);
    }
}

impl Default for SearchScreen {
    fn default() -> Self {
        Self::new()
    }
}
