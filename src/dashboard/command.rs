//! 终端命令解析

use std::path::PathBuf;

use crate::dashboard::view_state::{DataLimit, SortColumn};
use crate::snapshot::history::HistoryColumn;

pub const HELP_TEXT: &str = "\
Commands:
  limit <5|10|25|50|all|history>   switch view
  search [query]                   filter symbols (empty query clears)
  sort <symbol|rate|apr|volume>    sort market table
  hsort <time|label|view|avg|median|sentiment>   sort snapshot history
  refresh                          fetch market data now
  save                             save a snapshot of the current stats
  delete <id>                      delete a snapshot
  edit <id>                        rename a snapshot
  clear                            delete all snapshots
  export                           export snapshots to a JSON file
  import <path>                    merge snapshots from a JSON file
  help                             show this help
  quit                             exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Limit(DataLimit),
    Search(String),
    Sort(SortColumn),
    HistorySort(HistoryColumn),
    Refresh,
    Save,
    Delete(i64),
    Edit(i64),
    Clear,
    Export,
    Import(PathBuf),
    Help,
    Quit,
}

impl Command {
    /// 解析一行输入，错误信息直接展示给用户
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_lowercase().as_str() {
            "limit" | "l" => DataLimit::parse(arg)
                .map(Command::Limit)
                .ok_or_else(|| format!("unknown limit: {}", arg)),
            "search" | "s" | "/" => Ok(Command::Search(arg.to_string())),
            "sort" => SortColumn::parse(arg)
                .map(Command::Sort)
                .ok_or_else(|| format!("unknown column: {}", arg)),
            "hsort" => HistoryColumn::parse(arg)
                .map(Command::HistorySort)
                .ok_or_else(|| format!("unknown history column: {}", arg)),
            "refresh" | "r" => Ok(Command::Refresh),
            "save" => Ok(Command::Save),
            "delete" | "del" => parse_id(arg).map(Command::Delete),
            "edit" => parse_id(arg).map(Command::Edit),
            "clear" => Ok(Command::Clear),
            "export" => Ok(Command::Export),
            "import" if !arg.is_empty() => Ok(Command::Import(PathBuf::from(arg))),
            "import" => Err("usage: import <path>".to_string()),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

fn parse_id(arg: &str) -> Result<i64, String> {
    arg.parse::<i64>()
        .map_err(|_| format!("invalid snapshot id: {}", arg))
}
