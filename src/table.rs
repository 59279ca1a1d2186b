//! Markdown table builder
//!
//! Tables are rendered as pipe tables (`| a | b |`). Every cell carries an
//! optional highlight, a code flag and a color; columns may declare a default
//! style that rows inherit unless a cell overrides or clears a field.

use crate::error::{Error, Result};
use std::fmt;

/// Smallest accepted line length for wrapped cells
pub const MIN_LINE_LEN: usize = 10;

/// Soft line break inserted between chunks of a long cell
pub const LINE_BREAK: &str = "<br>";

const NO_DATA: &str = "NO DATA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Bold,
    Italic,
}

/// A per-cell style field: inherit the column default, force it off, or set it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting<T> {
    Inherit,
    Clear,
    Set(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Inherit
    }
}

impl<T> Setting<T> {
    fn is_set(&self) -> bool {
        matches!(self, Setting::Set(_))
    }
}

/// A fully resolved style
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellStyle {
    pub highlight: Option<Highlight>,
    pub is_code: bool,
    pub color: Option<String>,
}

impl CellStyle {
    pub fn code() -> Self {
        Self {
            is_code: true,
            ..Self::default()
        }
    }

    pub fn bold() -> Self {
        Self {
            highlight: Some(Highlight::Bold),
            ..Self::default()
        }
    }
}

/// Text plus the style fields a caller wants to set or clear
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub text: String,
    pub highlight: Setting<Highlight>,
    pub is_code: Setting<bool>,
    pub color: Setting<String>,
}

impl Entry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.highlight = Setting::Set(Highlight::Bold);
        self
    }

    pub fn italic(mut self) -> Self {
        self.highlight = Setting::Set(Highlight::Italic);
        self
    }

    pub fn code(mut self) -> Self {
        self.is_code = Setting::Set(true);
        self
    }

    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = Setting::Set(color.into());
        self
    }

    pub fn without_highlight(mut self) -> Self {
        self.highlight = Setting::Clear;
        self
    }

    pub fn without_color(mut self) -> Self {
        self.color = Setting::Clear;
        self
    }

    /// Resolve against a column default
    fn resolve(self, default: Option<&CellStyle>) -> Result<(String, CellStyle)> {
        if matches!(self.is_code, Setting::Set(true)) && self.color.is_set() {
            return Err(Error::table(format!(
                "cell '{}' cannot be both code and colored",
                self.text
            )));
        }
        let default = default.cloned().unwrap_or_default();

        let highlight = match self.highlight {
            Setting::Inherit => default.highlight,
            Setting::Clear => None,
            Setting::Set(h) => Some(h),
        };
        let is_code = match self.is_code {
            Setting::Clear | Setting::Set(false) => false,
            Setting::Set(true) => true,
            Setting::Inherit => default.is_code && !self.color.is_set(),
        };
        let color = match self.color {
            Setting::Clear => None,
            Setting::Set(c) => Some(c),
            Setting::Inherit if is_code => None,
            Setting::Inherit => default.color,
        };

        Ok((
            self.text,
            CellStyle {
                highlight,
                is_code,
                color,
            },
        ))
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Entry::new(value)
    }
}

impl From<String> for Entry {
    fn from(value: String) -> Self {
        Entry::new(value)
    }
}

/// A column header with an optional default style for its cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: Entry,
    pub default_style: Option<CellStyle>,
}

impl Column {
    pub fn new(header: impl Into<Entry>) -> Self {
        Self {
            header: header.into(),
            default_style: None,
        }
    }

    pub fn with_default_style(mut self, style: CellStyle) -> Self {
        self.default_style = Some(style);
        self
    }
}

impl From<&str> for Column {
    fn from(value: &str) -> Self {
        Column::new(value)
    }
}

/// A heading placed above the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTitle {
    pub text: String,
    pub level: usize,
}

impl TableTitle {
    pub fn new(text: impl Into<String>, level: usize) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

impl From<&str> for TableTitle {
    fn from(value: &str) -> Self {
        TableTitle::new(value, 1)
    }
}

impl From<String> for TableTitle {
    fn from(value: String) -> Self {
        TableTitle::new(value, 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    text: String,
    style: CellStyle,
}

impl Cell {
    fn render(&self, styled: bool) -> String {
        let mut out = self.text.clone();
        if !styled {
            return out;
        }
        if self.style.is_code {
            out = format!("`{}`", out);
        }
        match self.style.highlight {
            Some(Highlight::Italic) => out = format!("*{}*", out),
            Some(Highlight::Bold) => out = format!("**{}**", out),
            None => {}
        }
        if let Some(color) = &self.style.color {
            out = format!("<span style=\"color:{}\">{}</span>", color, out);
        }
        out
    }
}

/// A markdown pipe table
#[derive(Debug, Clone, Default)]
pub struct MdTable {
    columns: Vec<Cell>,
    defaults: Vec<Option<CellStyle>>,
    rows: Vec<Vec<Cell>>,
    line_len: Option<usize>,
    title: String,
}

impl MdTable {
    pub fn new<I, C>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        let mut table = MdTable::default();
        for column in columns {
            let column = column.into();
            let (text, style) = column.header.resolve(None)?;
            table.columns.push(Cell { text, style });
            table.defaults.push(column.default_style);
        }
        Ok(table)
    }

    pub fn line_len(&self) -> Option<usize> {
        self.line_len
    }

    /// Cap cell text length; longer text is split into chunks
    pub fn set_line_len(&mut self, len: Option<usize>) -> Result<()> {
        if let Some(len) = len
            && len < MIN_LINE_LEN
        {
            return Err(Error::config(format!("min len is {}", MIN_LINE_LEN)));
        }
        self.line_len = len;
        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<TableTitle>, info: Option<&str>) {
        let title = title.into();
        let info = info
            .filter(|i| !i.is_empty())
            .map(|i| format!("{}\n\n", i))
            .unwrap_or_default();
        self.title = format!("{} {}\n\n{}", "#".repeat(title.level), title.text, info);
    }

    /// Append one row; the cell count must match the column count
    pub fn add_entry<I, E>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<Entry>,
    {
        let mut row = Vec::with_capacity(self.columns.len());
        for (index, cell) in cells.into_iter().enumerate() {
            let default = self
                .defaults
                .get(index)
                .ok_or_else(|| Error::table(format!("row has more than {} cells", self.columns.len())))?;
            let (text, style) = cell.into().resolve(default.as_ref())?;
            row.push(Cell {
                text: self.split_line(&text),
                style,
            });
        }
        if row.len() != self.columns.len() {
            return Err(Error::table(format!(
                "expected {} cells, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with styling markup
    pub fn render(&self) -> String {
        self.render_internal(true)
    }

    fn split_line(&self, src: &str) -> String {
        match self.line_len {
            Some(len) if src.chars().count() > len => src
                .chars()
                .collect::<Vec<_>>()
                .chunks(len)
                .map(|chunk| chunk.iter().collect::<String>())
                .collect::<Vec<_>>()
                .join(LINE_BREAK),
            _ => src.to_string(),
        }
    }

    fn render_row(cells: &[Cell], styled: bool) -> String {
        let cells: Vec<String> = cells.iter().map(|c| c.render(styled)).collect();
        format!("| {} |", cells.join(" | "))
    }

    fn render_internal(&self, styled: bool) -> String {
        let mut out = self.title.clone();
        if self.rows.is_empty() {
            out.push_str(NO_DATA);
            out.push('\n');
            return out;
        }

        out.push_str(&Self::render_row(&self.columns, styled));
        out.push('\n');
        let divider = vec!["---"; self.columns.len()].join(" | ");
        out.push_str(&format!("| {} |\n", divider));
        for row in &self.rows {
            out.push_str(&Self::render_row(row, styled));
            out.push('\n');
        }
        out
    }
}

/// Plain rendering without any markup
impl fmt::Display for MdTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render_internal(false))
    }
}
