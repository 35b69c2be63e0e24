//! 渲染端口
//!
//! 核心逻辑只通过 [`RenderPort`] 输出，不直接访问展示层。
//! 实现方缺少某个目标元素时直接忽略即可。

use std::collections::HashMap;
use std::io::{self, Write};

use crate::dashboard::view_state::{DataLimit, SortColumn, SortDirection};
use crate::funding::table_renderer::{TickerRow, EMPTY_MESSAGE};
use crate::snapshot::history::HistoryColumn;
use crate::snapshot::model::Snapshot;

/// 文本元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    PageTitle,
    AvgFunding,
    MedianFunding,
    PosCount,
    NegCount,
    ZeroCount,
}

/// 可切换显示的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    MarketStats,
    MarketTable,
    SearchBar,
    SnapshotSection,
    SaveSnapshotButton,
}

/// 快照表为空时的提示
pub const NO_SNAPSHOTS_MESSAGE: &str = "No snapshots saved.";

pub trait RenderPort {
    /// 渲染行情表
    fn render_rows(&mut self, rows: &[TickerRow]);

    /// 用单行提示替换行情表内容（加载中、错误、空结果）
    fn render_message(&mut self, message: &str);

    /// 设置文本，class 为可选的样式类
    fn set_text(&mut self, element: Element, text: &str, class: Option<&str>);

    fn set_visible(&mut self, section: Section, visible: bool);

    fn set_tab_active(&mut self, tab: DataLimit, active: bool);

    /// direction 为 None 表示清除该列图标
    fn set_sort_indicator(&mut self, column: SortColumn, direction: Option<SortDirection>);

    fn set_history_sort_indicator(
        &mut self,
        column: HistoryColumn,
        direction: Option<SortDirection>,
    );

    /// 渲染快照表，已按当前历史排序
    fn render_snapshots(&mut self, snapshots: &[Snapshot]);

    /// 面向用户的提示（导入结果、错误等）
    fn notify(&mut self, message: &str);
}

/// 记录所有渲染调用，用于无终端测试
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub rows: Vec<TickerRow>,
    pub row_renders: usize,
    pub message: Option<String>,
    pub texts: HashMap<Element, String>,
    pub classes: HashMap<Element, String>,
    pub visible: HashMap<Section, bool>,
    pub active_tab: Option<DataLimit>,
    pub sort_indicators: HashMap<SortColumn, SortDirection>,
    pub history_indicators: HashMap<HistoryColumn, SortDirection>,
    pub snapshots: Vec<Snapshot>,
    pub notifications: Vec<String>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, element: Element) -> Option<&str> {
        self.texts.get(&element).map(|s| s.as_str())
    }

    pub fn is_visible(&self, section: Section) -> Option<bool> {
        self.visible.get(&section).copied()
    }

    pub fn row_symbols(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }
}

impl RenderPort for RecordingRenderer {
    fn render_rows(&mut self, rows: &[TickerRow]) {
        self.rows = rows.to_vec();
        self.message = None;
        self.row_renders += 1;
    }

    fn render_message(&mut self, message: &str) {
        self.rows.clear();
        self.message = Some(message.to_string());
    }

    fn set_text(&mut self, element: Element, text: &str, class: Option<&str>) {
        self.texts.insert(element, text.to_string());
        if let Some(class) = class {
            self.classes.insert(element, class.to_string());
        }
    }

    fn set_visible(&mut self, section: Section, visible: bool) {
        self.visible.insert(section, visible);
    }

    fn set_tab_active(&mut self, tab: DataLimit, active: bool) {
        if active {
            self.active_tab = Some(tab);
        } else if self.active_tab == Some(tab) {
            self.active_tab = None;
        }
    }

    fn set_sort_indicator(&mut self, column: SortColumn, direction: Option<SortDirection>) {
        match direction {
            Some(d) => {
                self.sort_indicators.insert(column, d);
            }
            None => {
                self.sort_indicators.remove(&column);
            }
        }
    }

    fn set_history_sort_indicator(
        &mut self,
        column: HistoryColumn,
        direction: Option<SortDirection>,
    ) {
        match direction {
            Some(d) => {
                self.history_indicators.insert(column, d);
            }
            None => {
                self.history_indicators.remove(&column);
            }
        }
    }

    fn render_snapshots(&mut self, snapshots: &[Snapshot]) {
        self.snapshots = snapshots.to_vec();
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

/// 终端渲染：保存各元素状态，行情表或快照表更新时整屏输出
pub struct TerminalRenderer<W: Write> {
    out: W,
    texts: HashMap<Element, String>,
    visible: HashMap<Section, bool>,
    active_tab: Option<DataLimit>,
    sort_indicator: Option<(SortColumn, SortDirection)>,
    history_indicator: Option<(HistoryColumn, SortDirection)>,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            texts: HashMap::new(),
            visible: HashMap::new(),
            active_tab: None,
            sort_indicator: None,
            history_indicator: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn shown(&self, section: Section) -> bool {
        self.visible.get(&section).copied().unwrap_or(true)
    }

    fn text(&self, element: Element) -> &str {
        self.texts.get(&element).map(|s| s.as_str()).unwrap_or("...")
    }

    fn header(&self, column: SortColumn, label: &str) -> String {
        match self.sort_indicator {
            Some((c, d)) if c == column => format!("{}{}", label, d.glyph()),
            _ => label.to_string(),
        }
    }

    fn history_header(&self, column: HistoryColumn, label: &str) -> String {
        match self.history_indicator {
            Some((c, d)) if c == column => format!("{}{}", label, d.glyph()),
            _ => label.to_string(),
        }
    }

    fn tabs_line(&self) -> String {
        DataLimit::TABS
            .iter()
            .map(|tab| {
                let label = match tab {
                    DataLimit::All => "All".to_string(),
                    DataLimit::History => "History".to_string(),
                    other => other.as_key(),
                };
                if Some(*tab) == self.active_tab {
                    format!("[{}]", label)
                } else {
                    format!(" {} ", label)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn write_header(&mut self) -> io::Result<()> {
        let title = self.texts.get(&Element::PageTitle).cloned().unwrap_or_default();
        let tabs = self.tabs_line();
        writeln!(self.out)?;
        writeln!(self.out, "=== {} ===", title)?;
        writeln!(self.out, "{}", tabs)?;
        if self.shown(Section::MarketStats) {
            let line = format!(
                "Avg APR: {}  Median APR: {}  Positive: {}  Negative: {}  Zero: {}",
                self.text(Element::AvgFunding),
                self.text(Element::MedianFunding),
                self.text(Element::PosCount),
                self.text(Element::NegCount),
                self.text(Element::ZeroCount),
            );
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn write_rows(&mut self, rows: &[TickerRow]) -> io::Result<()> {
        self.write_header()?;
        let headers = [
            self.header(SortColumn::Symbol, "Symbol"),
            self.header(SortColumn::FundingRate, "Funding Rate"),
            self.header(SortColumn::Annualized, "APR"),
            self.header(SortColumn::Turnover24h, "24h Volume"),
        ];
        writeln!(
            self.out,
            "{:<6} {:<16} {:<20} {:<12} {:>14}",
            "#", headers[0], headers[1], headers[2], headers[3]
        )?;
        for row in rows {
            let rate = format!("{} {}", row.rate_text(), row.interval_text());
            writeln!(
                self.out,
                "{:<6} {:<16} {:<20} {:<12} {:>14}",
                row.rank_text(),
                row.symbol,
                rate,
                row.apr_text(),
                row.volume_text()
            )?;
        }
        self.out.flush()
    }

    fn write_snapshots(&mut self, snapshots: &[Snapshot]) -> io::Result<()> {
        self.write_header()?;
        let headers = [
            self.history_header(HistoryColumn::Time, "Time"),
            self.history_header(HistoryColumn::Label, "Label"),
            self.history_header(HistoryColumn::View, "View"),
            self.history_header(HistoryColumn::Avg, "Avg"),
            self.history_header(HistoryColumn::Median, "Median"),
            self.history_header(HistoryColumn::Sentiment, "Sentiment"),
        ];
        writeln!(
            self.out,
            "{:<15} {:<21} {:<16} {:<9} {:<10} {:<10} {}",
            "ID", headers[0], headers[1], headers[2], headers[3], headers[4], headers[5]
        )?;
        if snapshots.is_empty() {
            writeln!(self.out, "{}", NO_SNAPSHOTS_MESSAGE)?;
        }
        for s in snapshots {
            writeln!(
                self.out,
                "{:<15} {:<21} {:<16} {:<9} {:<10} {:<10} {}",
                s.id,
                s.timestamp,
                s.label,
                s.view_text(),
                s.avg,
                s.median,
                s.sentiment
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> RenderPort for TerminalRenderer<W> {
    fn render_rows(&mut self, rows: &[TickerRow]) {
        if !self.shown(Section::MarketTable) {
            return;
        }
        let res = if rows.is_empty() {
            self.write_header()
                .and_then(|_| writeln!(self.out, "{}", EMPTY_MESSAGE))
        } else {
            self.write_rows(rows)
        };
        if let Err(e) = res {
            tracing::warn!("terminal render failed: {}", e);
        }
    }

    fn render_message(&mut self, message: &str) {
        if !self.shown(Section::MarketTable) {
            return;
        }
        if let Err(e) = writeln!(self.out, "-- {} --", message) {
            tracing::warn!("terminal render failed: {}", e);
        }
    }

    fn set_text(&mut self, element: Element, text: &str, _class: Option<&str>) {
        self.texts.insert(element, text.to_string());
    }

    fn set_visible(&mut self, section: Section, visible: bool) {
        self.visible.insert(section, visible);
    }

    fn set_tab_active(&mut self, tab: DataLimit, active: bool) {
        if active {
            self.active_tab = Some(tab);
        }
    }

    fn set_sort_indicator(&mut self, column: SortColumn, direction: Option<SortDirection>) {
        match direction {
            Some(d) => self.sort_indicator = Some((column, d)),
            None => {
                if matches!(self.sort_indicator, Some((c, _)) if c == column) {
                    self.sort_indicator = None;
                }
            }
        }
    }

    fn set_history_sort_indicator(
        &mut self,
        column: HistoryColumn,
        direction: Option<SortDirection>,
    ) {
        match direction {
            Some(d) => self.history_indicator = Some((column, d)),
            None => {
                if matches!(self.history_indicator, Some((c, _)) if c == column) {
                    self.history_indicator = None;
                }
            }
        }
    }

    fn render_snapshots(&mut self, snapshots: &[Snapshot]) {
        if !self.shown(Section::SnapshotSection) {
            return;
        }
        if let Err(e) = self.write_snapshots(snapshots) {
            tracing::warn!("terminal render failed: {}", e);
        }
    }

    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, ">> {}", message) {
            tracing::warn!("terminal render failed: {}", e);
        }
    }
}
