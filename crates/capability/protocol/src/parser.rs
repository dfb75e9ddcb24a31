//! 变量表解析。
//!
//! 控制器以两种格式暴露变量表：
//! - `getvar.csv`：带表头的 CSV（`name,id,desc,type,access,val`，分隔符可能是 `;`）
//! - `vars.htm`：HTML 表格，每行若干 `<td>`
//!
//! 解析永不失败：无法识别的输入得到空结果。

use crate::types::VarRow;

/// 一种变量表格式。
///
/// `try_parse` 返回 `None` 表示输入不属于该格式；`Some(vec![])` 表示格式匹配但没有有效行。
pub trait VarTableFormat: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_parse(&self, text: &str) -> Option<Vec<VarRow>>;
}

/// 带表头的 CSV。
pub struct CsvTable;

/// HTML 表格。
pub struct HtmlTable;

/// 按固定优先级解析：明显是 HTML 的文本直接走表格解析；
/// 否则先 CSV，CSV 没有结果时再尝试 HTML 表格。
pub fn parse_var_table(text: &str) -> Vec<VarRow> {
    if looks_like_html(text) {
        return HtmlTable.try_parse(text).unwrap_or_default();
    }
    let formats: [&dyn VarTableFormat; 2] = [&CsvTable, &HtmlTable];
    for format in formats {
        if let Some(rows) = format.try_parse(text) {
            if !rows.is_empty() {
                return rows;
            }
        }
    }
    Vec::new()
}

/// 去掉首尾空白后以 `<` 开头，或包含 `<table`（不区分大小写）。
pub fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('<') || trimmed.to_ascii_lowercase().contains("<table")
}

impl VarTableFormat for CsvTable {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn try_parse(&self, text: &str) -> Option<Vec<VarRow>> {
        let trimmed = text.trim();
        if trimmed.is_empty() || looks_like_html(trimmed) {
            return None;
        }

        let first_line = text.lines().next().unwrap_or_default();
        let commas = first_line.matches(',').count();
        let semicolons = first_line.matches(';').count();
        let delimiter = if semicolons > commas { ';' } else { ',' };

        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() <= 1 {
            return None;
        }

        let mut name_idx = None;
        let mut val_idx = None;
        let mut value_idx = None;
        for (idx, column) in lines[0].split(delimiter).enumerate() {
            match unquote(column.trim()).to_ascii_lowercase().as_str() {
                "name" => name_idx = Some(idx),
                "val" => val_idx = Some(idx),
                "value" => value_idx = Some(idx),
                _ => {}
            }
        }
        let Some(name_idx) = name_idx else {
            return Some(Vec::new());
        };

        let mut rows = Vec::new();
        for line in &lines[1..] {
            let columns = split_quoted(line, delimiter);
            let name = match columns.get(name_idx) {
                Some(name) if !name.is_empty() => unquote(name),
                _ => continue,
            };
            if name.is_empty() {
                continue;
            }
            let value = val_idx
                .and_then(|idx| columns.get(idx))
                .or_else(|| value_idx.and_then(|idx| columns.get(idx)))
                .map(|value| unquote(value))
                .unwrap_or_default();
            rows.push(VarRow::new(name, value));
        }
        Some(rows)
    }
}

impl VarTableFormat for HtmlTable {
    fn name(&self) -> &'static str {
        "html"
    }

    fn try_parse(&self, text: &str) -> Option<Vec<VarRow>> {
        let tables = elements(text, "table");
        let table = tables
            .iter()
            .find(|element| is_vars_table(&element.open_tag))
            .or_else(|| tables.first())?;

        let body = elements(table.whole, "tbody")
            .first()
            .map(|tbody| tbody.inner)
            .unwrap_or(table.whole);

        let mut rows = Vec::new();
        for row in elements(body, "tr") {
            let cells: Vec<String> = elements(row.inner, "td")
                .iter()
                .map(|cell| clean_cell(cell.inner))
                .filter(|cell| !cell.is_empty())
                .collect();
            if cells.is_empty() {
                continue;
            }
            let name = cells.get(1).unwrap_or(&cells[0]).clone();
            let value = cells
                .get(3)
                .or_else(|| cells.get(2))
                .or_else(|| cells.get(1))
                .cloned()
                .unwrap_or_default();
            rows.push(VarRow::new(name, value));
        }
        Some(rows)
    }
}

/// 引号感知的切分：引号内的分隔符不切分，`""` 表示一个字面引号，引号本身不保留。
fn split_quoted(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    fields.push(current);
    fields
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

struct Element<'a> {
    /// 小写的起始标签，例如 `<table id="varstable">`。
    open_tag: String,
    /// 起始标签到结束标签（含）的完整片段。
    whole: &'a str,
    /// 起始标签与结束标签之间的内容。
    inner: &'a str,
}

/// 按出现顺序找出 `<tag ...>...</tag>` 片段（不区分大小写，不处理嵌套）。
fn elements<'a>(text: &'a str, tag: &str) -> Vec<Element<'a>> {
    let lower = text.to_ascii_lowercase();
    let open_pattern = format!("<{tag}");
    let close_pattern = format!("</{tag}>");
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = lower[pos..].find(&open_pattern) {
        let start = pos + offset;
        let after_name = start + open_pattern.len();
        let boundary = lower[after_name..]
            .chars()
            .next()
            .is_some_and(|ch| ch == '>' || ch == '/' || ch.is_ascii_whitespace());
        if !boundary {
            pos = after_name;
            continue;
        }
        let Some(tag_end) = lower[after_name..].find('>') else {
            break;
        };
        let inner_start = after_name + tag_end + 1;
        let Some(close) = lower[inner_start..].find(&close_pattern) else {
            break;
        };
        let inner_end = inner_start + close;
        let whole_end = inner_end + close_pattern.len();
        found.push(Element {
            open_tag: lower[start..inner_start].to_string(),
            whole: &text[start..whole_end],
            inner: &text[inner_start..inner_end],
        });
        pos = whole_end;
    }
    found
}

fn is_vars_table(open_tag: &str) -> bool {
    ["id=\"varstable\"", "id='varstable'", "id=varstable"]
        .iter()
        .any(|pattern| open_tag.contains(pattern))
}

/// 去标签、`&nbsp;` 转空格、去首尾空白。
fn clean_cell(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) if close > 0 => rest = &after[close + 1..],
            _ => {
                text.push('<');
                rest = after;
            }
        }
    }
    text.push_str(rest);
    text.replace("&nbsp;", " ").trim().to_string()
}
