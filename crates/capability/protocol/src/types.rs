//! 协议相关类型定义

use std::collections::HashMap;

/// 变量表中的一行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRow {
    pub name: String,
    pub value: String,
}

impl VarRow {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 按变量名索引的变量表，重名时后出现的行覆盖先出现的行。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarTable {
    values: HashMap<String, String>,
}

impl VarTable {
    pub fn from_rows(rows: Vec<VarRow>) -> Self {
        let mut values = HashMap::with_capacity(rows.len());
        for row in rows {
            values.insert(row.name, row.value);
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// 一次批量读取的结果。
///
/// `reachable = false` 表示变量表没有取到，此时所有变量都视为缺失。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarReadout {
    pub reachable: bool,
    values: HashMap<String, String>,
}

impl VarReadout {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn from_table(table: &VarTable, keys: &[&str]) -> Self {
        let mut values = HashMap::new();
        for key in keys {
            if let Some(value) = table.get(key) {
                values.insert((*key).to_string(), value.to_string());
            }
        }
        Self {
            reachable: true,
            values,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// 读取变量表时依次尝试的地址：先 CSV，后 HTML。
pub fn read_urls(ip: &str) -> [String; 2] {
    [
        format!("http://{ip}/getvar.csv"),
        format!("http://{ip}/vars.htm"),
    ]
}

/// 写变量的候选端点，不同固件版本路径不同。
pub const WRITE_PATHS: [&str; 4] = [
    "/setvar.csv",
    "/pgd/setvar.csv",
    "/http/setvar.csv",
    "/pgd/http/setvar.csv",
];

/// 一次写入尝试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteAttempt {
    Get { url: String },
    PostForm { url: String, body: String },
}

/// 写入 `name = value` 时依次尝试的请求，名称与取值均做百分号编码。
///
/// 按端点依次尝试：同一端点先试 5 种 GET 查询串，再试 4 种表单 POST，然后才换下一个端点。
pub fn write_attempts(ip: &str, name: &str, value: &str) -> Vec<WriteAttempt> {
    let name = urlencoding::encode(name);
    let value = urlencoding::encode(value);
    let bases: Vec<String> = WRITE_PATHS
        .iter()
        .map(|path| format!("http://{ip}{path}"))
        .collect();

    let queries = [
        format!("{name}={value}"),
        format!("name={name}&value={value}"),
        format!("name={name}&val={value}"),
        format!("id={name}&value={value}"),
        format!("var={name}&val={value}"),
    ];
    let forms = [
        format!("name={name}&value={value}"),
        format!("name={name}&val={value}"),
        format!("id={name}&value={value}"),
        format!("var={name}&val={value}"),
    ];

    let mut attempts = Vec::with_capacity(bases.len() * (queries.len() + forms.len()));
    for base in &bases {
        for query in &queries {
            attempts.push(WriteAttempt::Get {
                url: format!("{base}?{query}"),
            });
        }
        for body in &forms {
            attempts.push(WriteAttempt::PostForm {
                url: base.clone(),
                body: body.clone(),
            });
        }
    }
    attempts
}
