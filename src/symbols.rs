use ratatui::style::{
    Color,
    Modifier,
    Style,
};
use rand::{
    Rng,
    seq::IndexedRandom,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use unicode_width::UnicodeWidthStr;

pub const CLASSIC_SYMBOLS: [&str; 5] = ["🍒", "🍋", "🍇", "💎", "7️⃣"];
pub const GRAND_SYMBOLS: [&str; 8] = ["10", "J", "Q", "K", "A", "💎", "7️⃣", "👑"];
pub const SEVEN: &str = "7️⃣";

/// A reel symbol exactly as the slot server spells it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(glyph: impl Into<String>) -> Self {
        Self(glyph.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(glyph: &str) -> Self {
        Self::new(glyph)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual family a symbol belongs to. Glyphs the renderer does not know fall
/// back to `Plain`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Diamond,
    Seven,
    Wild,
    Plain,
}

impl SymbolClass {
    pub fn of(symbol: &Symbol) -> Self {
        match symbol.as_str() {
            "10" => SymbolClass::Ten,
            "J" | "🍇" => SymbolClass::Jack,
            "Q" | "🍋" => SymbolClass::Queen,
            "K" | "🍒" => SymbolClass::King,
            "A" => SymbolClass::Ace,
            "💎" => SymbolClass::Diamond,
            "7️⃣" => SymbolClass::Seven,
            "👑" => SymbolClass::Wild,
            _ => SymbolClass::Plain,
        }
    }

    fn style(self) -> Style {
        match self {
            SymbolClass::Ten => Style::default().fg(Color::Gray),
            SymbolClass::Jack => Style::default().fg(Color::LightBlue),
            SymbolClass::Queen => Style::default().fg(Color::LightMagenta),
            SymbolClass::King => Style::default().fg(Color::LightRed),
            SymbolClass::Ace => Style::default().fg(Color::LightGreen),
            SymbolClass::Diamond => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            SymbolClass::Seven => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            SymbolClass::Wild => Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            SymbolClass::Plain => Style::default(),
        }
    }
}

/// One rendered reel cell.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayCell {
    pub glyph: String,
    pub class: SymbolClass,
    pub style: Style,
    pub width: usize,
}

impl DisplayCell {
    /// Glyph padded with spaces so it sits in the middle of `columns`.
    pub fn centered(&self, columns: usize) -> String {
        let free = columns.saturating_sub(self.width);
        let left = free / 2;
        let right = free - left;
        format!("{}{}{}", " ".repeat(left), self.glyph, " ".repeat(right))
    }
}

pub fn render_symbol(symbol: &Symbol) -> DisplayCell {
    let class = SymbolClass::of(symbol);
    DisplayCell {
        glyph: symbol.as_str().to_owned(),
        class,
        style: class.style(),
        width: UnicodeWidthStr::width(symbol.as_str()),
    }
}

/// Alphabet used to draw random filler symbols for a variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    pub fn new<I, T>(symbols: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Symbol>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classic() -> Self {
        Self::new(CLASSIC_SYMBOLS)
    }

    pub fn grand() -> Self {
        Self::new(GRAND_SYMBOLS)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn random(&self, rng: &mut impl Rng) -> Symbol {
        self.symbols
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| Symbol::new(" "))
    }
}
