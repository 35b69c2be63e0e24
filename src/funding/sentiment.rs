use crate::bybit::market::TickersData;

/// 全市场多空情绪统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentimentStats {
    pub positive: usize,
    pub negative: usize,
    pub zero: usize,
    /// 费率可解析的合约数
    pub total: usize,
}

impl SentimentStats {
    fn pct(&self, count: usize) -> usize {
        if self.total == 0 {
            return 0;
        }
        // 截断取整
        (count as f64 / self.total as f64 * 100.0) as usize
    }

    pub fn positive_pct(&self) -> usize {
        self.pct(self.positive)
    }

    pub fn negative_pct(&self) -> usize {
        self.pct(self.negative)
    }

    pub fn zero_pct(&self) -> usize {
        self.pct(self.zero)
    }

    pub fn positive_text(&self) -> String {
        format!("{} ({}%)", self.positive, self.positive_pct())
    }

    pub fn negative_text(&self) -> String {
        format!("{} ({}%)", self.negative, self.negative_pct())
    }

    pub fn zero_text(&self) -> String {
        format!("{} ({}%)", self.zero, self.zero_pct())
    }

    /// 快照中保存的情绪字段："P (p%) / N (n%)"
    pub fn summary(&self) -> String {
        format!("{} / {}", self.positive_text(), self.negative_text())
    }
}

/// 统计全部缓存合约（不受 limit/搜索影响）的正负费率数量
pub fn aggregate(tickers: &[TickersData]) -> SentimentStats {
    let mut stats = SentimentStats::default();
    for t in tickers {
        let rate = t.rate();
        if rate.is_nan() {
            continue;
        }
        stats.total += 1;
        if rate > 0.0 {
            stats.positive += 1;
        } else if rate < 0.0 {
            stats.negative += 1;
        } else {
            stats.zero += 1;
        }
    }
    stats
}
