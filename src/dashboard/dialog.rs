use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, Lines};
use tracing::warn;

/// 输入 `/cancel` 取消当前输入
pub const CANCEL_INPUT: &str = "/cancel";

/// 输入 `.` 保留预填内容；空行表示清空
pub const KEEP_INPUT: &str = ".";

/// 确认与输入对话框
#[async_trait]
pub trait DialogPort: Send {
    /// 确认操作，返回 false 表示取消
    async fn confirm(&mut self, message: &str) -> bool;

    /// 请求输入，`default` 为预填内容；返回 None 表示取消
    async fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
}

/// 预设答案的对话框，用于测试与非交互场景
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    confirms: VecDeque<bool>,
    answers: VecDeque<Option<String>>,
    /// 所有出现过的提示文本
    pub asked: Vec<String>,
}

impl ScriptedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }

    pub fn answer_with(mut self, answer: Option<&str>) -> Self {
        self.answers.push_back(answer.map(|s| s.to_string()));
        self
    }
}

#[async_trait]
impl DialogPort for ScriptedDialog {
    async fn confirm(&mut self, message: &str) -> bool {
        self.asked.push(message.to_string());
        // 没有预设答案时按取消处理
        self.confirms.pop_front().unwrap_or(false)
    }

    async fn prompt(&mut self, message: &str, _default: &str) -> Option<String> {
        self.asked.push(message.to_string());
        self.answers.pop_front().flatten()
    }
}

/// 终端对话框：与命令共用同一个 stdin 行读取器
pub struct ConsoleDialog<'a, R> {
    lines: &'a mut Lines<R>,
}

impl<'a, R> ConsoleDialog<'a, R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(lines: &'a mut Lines<R>) -> Self {
        Self { lines }
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to read dialog input: {}", e);
                None
            }
        }
    }
}

fn show(text: &str) {
    let mut out = std::io::stdout();
    let _ = write!(out, "{}", text);
    let _ = out.flush();
}

#[async_trait]
impl<'a, R> DialogPort for ConsoleDialog<'a, R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&mut self, message: &str) -> bool {
        show(&format!("{} [y/N] ", message));
        match self.read_line().await {
            Some(answer) => {
                let answer = answer.trim();
                answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
            }
            None => false,
        }
    }

    async fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        if default.is_empty() {
            show(&format!("{} ({} to abort): ", message, CANCEL_INPUT));
        } else {
            show(&format!(
                "{} [{}] ({} to keep, empty to clear, {} to abort): ",
                message, default, KEEP_INPUT, CANCEL_INPUT
            ));
        }
        let line = self.read_line().await?;
        match line.trim() {
            CANCEL_INPUT => None,
            KEEP_INPUT => Some(default.to_string()),
            "" => Some(String::new()),
            _ => Some(line),
        }
    }
}
