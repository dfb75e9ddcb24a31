//! 基于变量表客户端的机组控制实现。

use std::sync::Arc;

use async_trait::async_trait;
use bms_config::VarsConfig;
use bms_protocol::VarTableClient;
use domain::ChillerMode;
use tracing::{debug, info, warn};

use crate::coerce::{clamp, round1, to_bool, to_num};
use crate::setpoint::{
    COMFORT_SETPOINT_ALIAS, SetpointOutcome, SetpointPolicy, SetpointStage, decimal_formats,
    setpoint_targets,
};
use crate::{ChillerController, StatusResult};

/// 当前温度的候选变量（配置的 `TempCurrent` 之后依次尝试）。
const TEMP_CURRENT_FALLBACKS: [&str; 5] = [
    "CurrRoomTemp_Val",
    "RoomTempAct_Val",
    "RoomTemp.ReadVal",
    "SupplyTemp.ReadVal",
    "ReturnTemp.ReadVal",
];

pub struct ChillerAdapter {
    client: Arc<VarTableClient>,
    policy: SetpointPolicy,
}

impl ChillerAdapter {
    pub fn new(client: Arc<VarTableClient>) -> Self {
        Self::with_policy(client, SetpointPolicy::default())
    }

    pub fn with_policy(client: Arc<VarTableClient>, policy: SetpointPolicy) -> Self {
        Self { client, policy }
    }

    pub fn client(&self) -> &Arc<VarTableClient> {
        &self.client
    }

    /// 读回设定值：优先主变量，取不到数值时依次看其他写入目标。
    async fn readback(&self, ip: &str, primary: &str, targets: &[String]) -> Option<f64> {
        let mut keys: Vec<&str> = vec![primary];
        keys.extend(
            targets
                .iter()
                .map(String::as_str)
                .filter(|name| *name != primary),
        );
        let readout = self.client.read_fresh(ip, &keys).await;
        if let Some(value) = readout.get(primary).and_then(to_num) {
            return Some(value);
        }
        targets
            .iter()
            .find_map(|name| readout.get(name).and_then(to_num))
    }

    /// 把 `text` 写入全部目标，等待控制器处理后读回校验。
    async fn write_and_verify(
        &self,
        ip: &str,
        primary: &str,
        targets: &[String],
        text: &str,
        desired: f64,
        stage: SetpointStage,
    ) -> SetpointOutcome {
        for name in targets {
            self.client.write_var(ip, name, text).await;
        }
        tokio::time::sleep(self.policy.settle_delay).await;

        let actual = self.readback(ip, primary, targets).await;
        match actual {
            Some(value) if self.policy.accepts(value, desired) => {
                debug!(target: "bms.control", ip = %ip, stage = %stage, value = %text, actual = value, "setpoint_verified");
                SetpointOutcome { ok: true, actual }
            }
            _ => {
                bms_telemetry::record_setpoint_verify_failure();
                debug!(target: "bms.control", ip = %ip, stage = %stage, value = %text, actual = ?actual, "setpoint_verify_failed");
                SetpointOutcome { ok: false, actual }
            }
        }
    }

    /// 先点号小数，再逗号小数。
    async fn write_both_formats(
        &self,
        ip: &str,
        primary: &str,
        targets: &[String],
        desired: f64,
        first_stage: SetpointStage,
    ) -> SetpointOutcome {
        let [dot, comma] = decimal_formats(desired);
        let outcome = self
            .write_and_verify(ip, primary, targets, &dot, desired, first_stage)
            .await;
        if outcome.ok {
            return outcome;
        }
        self.write_and_verify(ip, primary, targets, &comma, desired, SetpointStage::Comma)
            .await
    }
}

#[async_trait]
impl ChillerController for ChillerAdapter {
    async fn probe(&self, ip: &str) -> bool {
        self.client.probe(ip).await
    }

    async fn read_status(&self, ip: &str, vars: &VarsConfig) -> StatusResult {
        let mut temp_candidates: Vec<&str> = Vec::with_capacity(TEMP_CURRENT_FALLBACKS.len() + 1);
        if !vars.temp_current.is_empty() {
            temp_candidates.push(&vars.temp_current);
        }
        temp_candidates.extend(TEMP_CURRENT_FALLBACKS);

        let mut keys: Vec<&str> = [
            vars.power_fb.as_str(),
            vars.fan_speed_fb.as_str(),
            vars.temp_return.as_str(),
            vars.mode_fb.as_str(),
            vars.alarm_active.as_str(),
            vars.temp_setpoint.as_str(),
            COMFORT_SETPOINT_ALIAS,
        ]
        .into_iter()
        .chain(temp_candidates.iter().copied())
        .filter(|key| !key.is_empty())
        .collect();
        let mut seen = std::collections::HashSet::new();
        keys.retain(|key| seen.insert(*key));

        let readout = self.client.batch_read(ip, &keys).await;
        if !readout.reachable {
            warn!(target: "bms.control", ip = %ip, "status_unreachable");
            return StatusResult::unreachable();
        }

        let power_fb = readout.get(&vars.power_fb).is_some_and(to_bool);
        let fan_speed = readout
            .get(&vars.fan_speed_fb)
            .and_then(to_num)
            .unwrap_or(0.0);

        let temp_current = temp_candidates
            .iter()
            .filter_map(|key| readout.get(key))
            .find(|raw| !raw.trim().is_empty())
            .and_then(to_num)
            .map(round1);
        let temp_return = readout.get(&vars.temp_return).and_then(to_num).map(round1);

        let mode = readout.get(&vars.mode_fb).map(|raw| {
            to_num(raw)
                .and_then(ChillerMode::from_code)
                .map(|mode| mode.label().to_string())
                .unwrap_or_else(|| raw.to_string())
        });

        let alarm_active = readout.get(&vars.alarm_active).is_some_and(to_bool);
        let setpoint = readout
            .get(&vars.temp_setpoint)
            .and_then(to_num)
            .or_else(|| readout.get(COMFORT_SETPOINT_ALIAS).and_then(to_num))
            .map(round1);

        StatusResult {
            ok: true,
            // 部分机组的电源反馈不可靠，风机有转速也视为开机。
            power: power_fb || fan_speed > 0.0,
            temp_current,
            temp_return,
            setpoint,
            fan_speed,
            alarm_active,
            mode,
        }
    }

    async fn set_power(&self, ip: &str, vars: &VarsConfig, on: bool) -> bool {
        let has_mode = !vars.mode_cmd.is_empty();
        let ok = if on {
            if has_mode {
                let code = ChillerMode::Comfort.code().to_string();
                self.client.write_var(ip, &vars.mode_cmd, &code).await;
            }
            self.client.write_var(ip, &vars.power_cmd, "1").await
        } else {
            let ok = self.client.write_var(ip, &vars.power_cmd, "0").await;
            if has_mode {
                let code = ChillerMode::Off.code().to_string();
                self.client.write_var(ip, &vars.mode_cmd, &code).await;
            }
            ok
        };

        if ok {
            info!(target: "bms.control", ip = %ip, on = on, "power_command_applied");
        } else {
            warn!(target: "bms.control", ip = %ip, on = on, "power_command_failed");
        }
        ok
    }

    async fn set_mode(&self, ip: &str, vars: &VarsConfig, mode: &str) -> bool {
        let target = ChillerMode::from_command(mode);
        let ok = self
            .client
            .write_var(ip, &vars.mode_cmd, &target.code().to_string())
            .await;
        if ok {
            info!(target: "bms.control", ip = %ip, mode = target.label(), "mode_command_applied");
        } else {
            warn!(target: "bms.control", ip = %ip, mode = target.label(), "mode_command_failed");
        }
        ok
    }

    async fn apply_setpoint(&self, ip: &str, vars: &VarsConfig, desired: f64) -> SetpointOutcome {
        let value = clamp(desired, self.policy.min, self.policy.max);
        let primary = vars.temp_setpoint.as_str();
        let targets = setpoint_targets(primary);

        let mut outcome = self
            .write_both_formats(ip, primary, &targets, value, SetpointStage::Dot)
            .await;
        if outcome.ok {
            info!(target: "bms.control", ip = %ip, desired = value, actual = ?outcome.actual, "setpoint_applied");
            return outcome;
        }

        for (unlock_var, code) in self.policy.unlock_sequence() {
            bms_telemetry::record_setpoint_unlock_attempt();
            debug!(target: "bms.control", ip = %ip, unlock_var = %unlock_var, "setpoint_unlock_attempt");
            self.client.write_var(ip, unlock_var, code).await;
            tokio::time::sleep(self.policy.unlock_delay).await;

            outcome = self
                .write_both_formats(ip, primary, &targets, value, SetpointStage::Unlock)
                .await;
            if outcome.ok {
                self.client.write_var(ip, unlock_var, "0").await;
                info!(
                    target: "bms.control",
                    ip = %ip,
                    desired = value,
                    actual = ?outcome.actual,
                    unlock_var = %unlock_var,
                    "setpoint_applied_after_unlock"
                );
                return outcome;
            }
        }

        warn!(target: "bms.control", ip = %ip, desired = value, actual = ?outcome.actual, "setpoint_failed");
        SetpointOutcome {
            ok: false,
            actual: None,
        }
    }
}
