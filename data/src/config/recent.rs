use exchange::Symbol;
use serde::{Deserialize, Serialize};

pub const MAX_RECENT_SYMBOLS: usize = 5;

/// Most recently opened symbols, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSymbols(Vec<Symbol>);

impl RecentSymbols {
    pub fn push(&mut self, symbol: Symbol) {
        self.0.retain(|s| *s != symbol);
        self.0.push(symbol);

        if self.0.len() > MAX_RECENT_SYMBOLS {
            let excess = self.0.len() - MAX_RECENT_SYMBOLS;
            self.0.drain(..excess);
        }
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Symbol> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops duplicates and overflow that may come from a hand-edited state file
    pub fn normalized(self) -> Self {
        let mut recent = Self::default();
        for symbol in self.0 {
            recent.push(symbol);
        }
        recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s).expect("valid symbol")
    }

    #[test]
    fn keeps_five_most_recent_without_duplicates() {
        let mut recent = RecentSymbols::default();
        for s in ["AAPL", "MSFT", "TSLA", "AMZN", "NVDA", "MSFT", "META"] {
            recent.push(sym(s));
        }

        let names: Vec<&str> = recent.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["TSLA", "AMZN", "NVDA", "MSFT", "META"]);
        assert_eq!(recent.iter().last(), Some(&sym("META")));
    }

    #[test]
    fn normalizes_persisted_list() {
        let raw = r#"["aapl","AAPL","A","B","C","D","E"]"#;
        let recent: RecentSymbols = serde_json::from_str(raw).expect("valid list");
        let recent = recent.normalized();
        assert_eq!(recent.iter().count(), MAX_RECENT_SYMBOLS);
        assert_eq!(recent.iter().next(), Some(&sym("A")));
    }
}
