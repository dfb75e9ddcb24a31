//! 存储后端共用的数据集与操作。
//!
//! 内存实现与 JSON 文件实现都持有一个 `Dataset`，差别只在于加锁方式与是否落盘。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    ChillerRecord, ChillerUpdate, NewChiller, NewPowerLog, NewTimer, PowerLogPolicy,
    PowerLogRecord, TimerRecord, UserRecord,
};

/// 数据文件的完整内容。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dataset {
    /// 最新在前。
    pub power_logs: Vec<PowerLogRecord>,
    pub users: Vec<UserRecord>,
    pub chillers: Vec<ChillerRecord>,
    pub timers: Vec<TimerRecord>,
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Dataset {
    pub(crate) fn list_chillers(&self, include_inactive: bool) -> Vec<ChillerRecord> {
        self.chillers
            .iter()
            .filter(|chiller| include_inactive || chiller.active)
            .cloned()
            .collect()
    }

    pub(crate) fn find_chiller(&self, id: &str) -> Option<ChillerRecord> {
        self.chillers.iter().find(|chiller| chiller.id == id).cloned()
    }

    pub(crate) fn create_chiller(&mut self, new: NewChiller, now: DateTime<Utc>) -> ChillerRecord {
        let record = ChillerRecord {
            id: new_id(),
            name: new.name,
            ip: new.ip,
            active: new.active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.chillers.push(record.clone());
        record
    }

    pub(crate) fn upsert_chiller(
        &mut self,
        mut record: ChillerRecord,
        now: DateTime<Utc>,
    ) -> ChillerRecord {
        record.updated_at = Some(now);
        match self.chillers.iter_mut().find(|item| item.id == record.id) {
            Some(existing) => {
                record.created_at = existing.created_at.or(Some(now));
                *existing = record.clone();
            }
            None => {
                record.created_at = record.created_at.or(Some(now));
                self.chillers.push(record.clone());
            }
        }
        record
    }

    pub(crate) fn update_chiller(
        &mut self,
        id: &str,
        update: ChillerUpdate,
        now: DateTime<Utc>,
    ) -> Option<ChillerRecord> {
        let chiller = self.chillers.iter_mut().find(|item| item.id == id)?;
        if let Some(name) = update.name {
            chiller.name = name;
        }
        if let Some(ip) = update.ip {
            chiller.ip = ip;
        }
        if let Some(active) = update.active {
            chiller.active = active;
        }
        chiller.updated_at = Some(now);
        Some(chiller.clone())
    }

    pub(crate) fn deactivate_chiller(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
    ) -> Option<ChillerRecord> {
        self.update_chiller(
            id,
            ChillerUpdate {
                active: Some(false),
                ..ChillerUpdate::default()
            },
            now,
        )
    }

    pub(crate) fn create_timer(&mut self, new: NewTimer, now: DateTime<Utc>) -> TimerRecord {
        let record = TimerRecord {
            id: new_id(),
            chiller_name: new.chiller_name,
            chiller_ip: new.chiller_ip,
            mode: new.mode,
            hours: new.hours,
            target_at: new.target_at,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.timers.push(record.clone());
        record
    }

    pub(crate) fn find_active_timer(&self, chiller_ip: &str) -> Option<TimerRecord> {
        // 同一时刻创建的多条取插入顺序靠后的一条。
        self.timers
            .iter()
            .filter(|timer| timer.active && timer.chiller_ip == chiller_ip)
            .max_by_key(|timer| timer.created_at)
            .cloned()
    }

    pub(crate) fn deactivate_timers_for_ip(&mut self, chiller_ip: &str, now: DateTime<Utc>) -> usize {
        let mut count = 0;
        for timer in self
            .timers
            .iter_mut()
            .filter(|timer| timer.active && timer.chiller_ip == chiller_ip)
        {
            timer.active = false;
            timer.updated_at = now;
            count += 1;
        }
        count
    }

    pub(crate) fn list_due_timers(&self, now: DateTime<Utc>) -> Vec<TimerRecord> {
        self.timers
            .iter()
            .filter(|timer| timer.active && timer.target_at <= now)
            .cloned()
            .collect()
    }

    pub(crate) fn claim_timer(&mut self, timer_id: &str, now: DateTime<Utc>) -> bool {
        match self
            .timers
            .iter_mut()
            .find(|timer| timer.id == timer_id && timer.active)
        {
            Some(timer) => {
                timer.active = false;
                timer.updated_at = now;
                true
            }
            None => false,
        }
    }

    pub(crate) fn append_power_log(
        &mut self,
        new: NewPowerLog,
        policy: PowerLogPolicy,
        now: DateTime<Utc>,
    ) -> PowerLogRecord {
        let record = PowerLogRecord {
            id: new_id(),
            unit_name: new.unit_name,
            action: new.action,
            at: new.at,
            user: new.user,
        };
        self.power_logs.insert(0, record.clone());
        let cutoff = now - policy.retention;
        self.power_logs.retain(|entry| entry.at >= cutoff);
        self.power_logs.truncate(policy.max_entries);
        record
    }

    pub(crate) fn list_power_logs(
        &self,
        limit: usize,
        policy: PowerLogPolicy,
        now: DateTime<Utc>,
    ) -> Vec<PowerLogRecord> {
        let cutoff = now - policy.retention;
        self.power_logs
            .iter()
            .filter(|entry| entry.at >= cutoff)
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) fn find_user(&self, username: &str) -> Option<UserRecord> {
        self.users.iter().find(|user| user.username == username).cloned()
    }

    pub(crate) fn upsert_user(&mut self, record: UserRecord) {
        match self
            .users
            .iter_mut()
            .find(|user| user.username == record.username)
        {
            Some(existing) => *existing = record,
            None => self.users.push(record),
        }
    }

    pub(crate) fn update_password_hash(&mut self, username: &str, password_hash: &str) -> bool {
        match self.users.iter_mut().find(|user| user.username == username) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::PowerAction;

    fn log(unit: &str, at: DateTime<Utc>) -> NewPowerLog {
        NewPowerLog {
            unit_name: unit.to_string(),
            action: PowerAction::On,
            at,
            user: None,
        }
    }

    #[test]
    fn power_logs_are_capped_and_newest_first() {
        let mut dataset = Dataset::default();
        let now = Utc::now();
        let policy = PowerLogPolicy {
            retention: Duration::days(30),
            max_entries: 3,
        };
        for idx in 0..5 {
            dataset.append_power_log(log(&format!("CH-{idx}"), now), policy, now);
        }

        assert_eq!(dataset.power_logs.len(), 3);
        assert_eq!(dataset.power_logs[0].unit_name, "CH-4");
        assert_eq!(dataset.power_logs[2].unit_name, "CH-2");
    }

    #[test]
    fn expired_power_logs_are_dropped() {
        let mut dataset = Dataset::default();
        let now = Utc::now();
        let policy = PowerLogPolicy::default();
        dataset.append_power_log(log("old", now - Duration::days(31)), policy, now);
        dataset.append_power_log(log("new", now), policy, now);

        let items = dataset.list_power_logs(100, policy, now);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_name, "new");
    }

    #[test]
    fn claim_is_a_one_way_transition() {
        let mut dataset = Dataset::default();
        let now = Utc::now();
        let timer = dataset.create_timer(
            NewTimer {
                chiller_name: "CH-1".to_string(),
                chiller_ip: "10.0.0.5".to_string(),
                mode: PowerAction::Off,
                hours: 1.0,
                target_at: now,
            },
            now,
        );

        assert!(dataset.claim_timer(&timer.id, now));
        assert!(!dataset.claim_timer(&timer.id, now));
        assert!(dataset.list_due_timers(now).is_empty());
    }
}
