//! 由开关机日志还原开机/关机时段。
//!
//! 同一机组的日志按时间升序排列后，相邻两条动作不同的记录构成一个闭合时段，
//! 状态取前一条的动作；最后一条记录构成一个持续到当前时间的开放时段。
//! 时长不为正的时段丢弃，结果按开始时间降序。

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::PowerAction;

/// 一条开关机日志在还原算法中的投影。
#[derive(Debug, Clone)]
pub struct PowerTransition {
    pub id: String,
    pub unit_name: String,
    pub action: PowerAction,
    pub at: DateTime<Utc>,
}

/// 还原出的时段。
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSession {
    pub id: String,
    pub unit_name: String,
    pub state: PowerAction,
    pub start_at: DateTime<Utc>,
    /// `None` 表示时段仍在持续。
    pub end_at: Option<DateTime<Utc>>,
    pub duration_ms: i64,
}

pub fn derive_power_sessions(entries: &[PowerTransition], now: DateTime<Utc>) -> Vec<PowerSession> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_unit: HashMap<&str, Vec<&PowerTransition>> = HashMap::new();
    for entry in entries {
        let unit = entry.unit_name.as_str();
        by_unit
            .entry(unit)
            .or_insert_with(|| {
                order.push(unit);
                Vec::new()
            })
            .push(entry);
    }

    let mut sessions = Vec::new();
    for unit in order {
        let Some(list) = by_unit.get_mut(unit) else {
            continue;
        };
        list.sort_by_key(|entry| entry.at);

        for pair in list.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if prev.action == cur.action {
                continue;
            }
            let duration_ms = (cur.at - prev.at).num_milliseconds();
            if duration_ms <= 0 {
                continue;
            }
            sessions.push(PowerSession {
                id: format!("{}-{}-{}-{}", unit, prev.id, cur.id, prev.action),
                unit_name: unit.to_string(),
                state: prev.action,
                start_at: prev.at,
                end_at: Some(cur.at),
                duration_ms,
            });
        }

        if let Some(last) = list.last() {
            let duration_ms = (now - last.at).num_milliseconds();
            if duration_ms > 0 {
                sessions.push(PowerSession {
                    id: format!("{}-{}-open-{}", unit, last.id, last.action),
                    unit_name: unit.to_string(),
                    state: last.action,
                    start_at: last.at,
                    end_at: None,
                    duration_ms,
                });
            }
        }
    }

    sessions.sort_by(|a, b| b.start_at.cmp(&a.start_at));
    sessions
}
