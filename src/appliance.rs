//! アプライアンス API のレスポンス型。
//!
//! サーバーが返すフィールドはそのまま `Option` にデコードする。欠落は正当な状態であり、
//! ゼロ値とは区別する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ApplianceId はアプライアンスの識別子。
///
/// 先頭 9 文字が PNC（製品番号）、続く 8 文字がシリアル番号。
/// 例: `950011538111111115087076` → PNC `950011538`、シリアル `11111111`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplianceId(pub String);

impl ApplianceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn pnc(&self) -> Option<&str> {
        self.0.get(0..9)
    }

    pub fn serial(&self) -> Option<&str> {
        self.0.get(9..17)
    }
}

impl std::fmt::Display for ApplianceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplianceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// `POST /appliance/api/v2/appliances/info` のリクエストボディ。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplianceInfoRequest<'a> {
    pub appliance_ids: &'a [ApplianceId],
}

/// ApplianceInfo は製品としての属性情報。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceInfo {
    #[serde(default)]
    pub pnc: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub product_area: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub colour: Option<String>,
}

/// Appliance はアカウントに登録されたアプライアンスと現在の状態。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appliance {
    pub appliance_id: ApplianceId,
    #[serde(default)]
    pub appliance_data: Option<ApplianceData>,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub status: Option<String>,
    /// 例: `Connected`, `Disconnected`
    #[serde(default)]
    pub connection_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplianceData {
    #[serde(default)]
    pub appliance_name: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub desired: Option<Desired>,
    #[serde(default)]
    pub reported: Option<Reported>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// `$metadata` 配下の各フィールドの更新情報。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastUpdated {
    #[serde(rename = "$lastUpdated", default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(rename = "$lastUpdatedVersion", default, skip_serializing_if = "Option::is_none")]
    pub last_updated_version: Option<i64>,
}

/// アプリ側から要求されている設定値。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desired {
    #[serde(rename = "TimeZoneStandardName", default)]
    pub time_zone_standard_name: Option<String>,
    #[serde(rename = "LocationReq", default)]
    pub location_request: Option<bool>,
    #[serde(rename = "FrmVer_NIU", default)]
    pub firmware_version_niu: Option<String>,
    #[serde(default)]
    pub tasks: Option<serde_json::Value>,
    #[serde(rename = "TimeZoneDaylightRule", default)]
    pub time_zone_daylight_rule: Option<String>,
    #[serde(rename = "$metadata", default)]
    pub metadata: Option<DesiredMetadata>,
    #[serde(rename = "$version", default)]
    pub version: Option<i64>,
    #[serde(rename = "MinRefreshInterval_s", default)]
    pub min_refresh_interval_seconds: Option<i64>,
    #[serde(rename = "ReportExtraProperties", default)]
    pub report_extra_properties: Option<bool>,
    #[serde(rename = "PM2_5_Hysteresis", default)]
    pub pm25_hysteresis: Option<i64>,
    #[serde(rename = "Monitoring", default)]
    pub monitoring: Option<bool>,
    #[serde(rename = "Monitoring_Stop", default)]
    pub monitoring_stop: Option<i64>,
    #[serde(rename = "Monitoring_Start", default)]
    pub monitoring_start: Option<i64>,
    #[serde(rename = "VmNo_NIU", default)]
    pub vm_no_niu: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredMetadata {
    #[serde(flatten)]
    pub updated: LastUpdated,
    #[serde(rename = "TimeZoneStandardName", default)]
    pub time_zone_standard_name: Option<LastUpdated>,
    #[serde(rename = "LocationReq", default)]
    pub location_request: Option<LastUpdated>,
    #[serde(rename = "FrmVer_NIU", default)]
    pub firmware_version_niu: Option<LastUpdated>,
    #[serde(default)]
    pub tasks: Option<LastUpdated>,
    #[serde(rename = "TimeZoneDaylightRule", default)]
    pub time_zone_daylight_rule: Option<LastUpdated>,
    #[serde(rename = "MinRefreshInterval_s", default)]
    pub min_refresh_interval_seconds: Option<LastUpdated>,
    #[serde(rename = "ReportExtraProperties", default)]
    pub report_extra_properties: Option<LastUpdated>,
    #[serde(rename = "PM2_5_Hysteresis", default)]
    pub pm25_hysteresis: Option<LastUpdated>,
    #[serde(rename = "Monitoring", default)]
    pub monitoring: Option<LastUpdated>,
    #[serde(rename = "Monitoring_Stop", default)]
    pub monitoring_stop: Option<LastUpdated>,
    #[serde(rename = "Monitoring_Start", default)]
    pub monitoring_start: Option<LastUpdated>,
    #[serde(rename = "VmNo_NIU", default)]
    pub vm_no_niu: Option<LastUpdated>,
}

/// デバイスが報告している現在値。
///
/// センサー値はファームウェアや機種によって存在しないことがある。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reported {
    #[serde(rename = "FrmVer_NIU", default)]
    pub firmware_version_niu: Option<String>,
    /// 例: `Auto`, `Manual`, `PowerOff`
    #[serde(rename = "Workmode", default)]
    pub workmode: Option<String>,
    #[serde(rename = "FilterRFID", default)]
    pub filter_rfid: Option<String>,
    #[serde(rename = "FilterLife", default)]
    pub filter_life: Option<i64>,
    #[serde(rename = "Fanspeed", default)]
    pub fanspeed: Option<i64>,
    #[serde(rename = "UILight", default)]
    pub ui_light: Option<bool>,
    #[serde(rename = "SafetyLock", default)]
    pub safety_lock: Option<bool>,
    #[serde(rename = "Ionizer", default)]
    pub ionizer: Option<bool>,
    #[serde(rename = "FilterType", default)]
    pub filter_type: Option<i64>,
    #[serde(rename = "ErrPM2_5", default)]
    pub err_pm25: Option<bool>,
    #[serde(rename = "ErrTVOC", default)]
    pub err_tvoc: Option<bool>,
    #[serde(rename = "ErrTempHumidity", default)]
    pub err_temp_humidity: Option<bool>,
    #[serde(rename = "ErrFanMtr", default)]
    pub err_fan_mtr: Option<bool>,
    #[serde(rename = "ErrCommSensorDisplayBrd", default)]
    pub err_comm_sensor_display_brd: Option<bool>,
    #[serde(rename = "DoorOpen", default)]
    pub door_open: Option<bool>,
    #[serde(rename = "ErrRFID", default)]
    pub err_rfid: Option<bool>,
    #[serde(rename = "SignalStrength", default)]
    pub signal_strength: Option<String>,
    #[serde(rename = "logE", default)]
    pub log_e: Option<i64>,
    #[serde(rename = "logW", default)]
    pub log_w: Option<i64>,
    #[serde(rename = "InterfaceVer", default)]
    pub interface_version: Option<i64>,
    #[serde(rename = "VmNo_NIU", default)]
    pub vm_no_niu: Option<String>,
    #[serde(rename = "TVOCBrand", default)]
    pub tvoc_brand: Option<String>,
    #[serde(default)]
    pub capabilities: Option<ReportedCapabilities>,
    #[serde(default)]
    pub tasks: Option<serde_json::Value>,
    #[serde(rename = "$metadata", default)]
    pub metadata: Option<ReportedMetadata>,
    #[serde(rename = "$version", default)]
    pub version: Option<i64>,
    #[serde(rename = "deviceId", default)]
    pub device_id: Option<String>,
    #[serde(rename = "TVOC", default)]
    pub tvoc: Option<i64>,
    /// 最新ファームウェアでは `ECO2` を使う。
    #[serde(rename = "CO2", default)]
    pub co2: Option<i64>,
    #[serde(rename = "PM1", default)]
    pub pm1: Option<i64>,
    #[serde(rename = "PM2_5", default)]
    pub pm25: Option<i64>,
    #[serde(rename = "PM10", default)]
    pub pm10: Option<i64>,
    #[serde(rename = "Humidity", default)]
    pub humidity: Option<i64>,
    #[serde(rename = "Temp", default)]
    pub temp: Option<i64>,
    #[serde(rename = "RSSI", default)]
    pub rssi: Option<i64>,
    #[serde(rename = "ECO2", default)]
    pub eco2: Option<i64>,
    #[serde(rename = "FilterLife_1", default)]
    pub filter_life_1: Option<i64>,
    #[serde(rename = "Monitoring", default)]
    pub monitoring: Option<bool>,
    #[serde(rename = "Monitoring_Stop", default)]
    pub monitoring_stop: Option<i64>,
    #[serde(rename = "Monitoring_Start", default)]
    pub monitoring_start: Option<i64>,
    #[serde(rename = "UVState", default)]
    pub uv_state: Option<String>,
    #[serde(rename = "UVRuntime", default)]
    pub uv_runtime: Option<i64>,
    #[serde(rename = "ErrCommSensorUIBrd", default)]
    pub err_comm_sensor_ui_brd: Option<String>,
    #[serde(rename = "ErrImpellerStuck", default)]
    pub err_impeller_stuck: Option<String>,
    #[serde(rename = "ErrPmNotResp", default)]
    pub err_pm_not_resp: Option<String>,
    #[serde(rename = "VmNo_MCU", default)]
    pub vm_no_mcu: Option<String>,
    #[serde(rename = "PM2_5_approximate", default)]
    pub pm25_approximate: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedCapabilities {
    #[serde(default)]
    pub tasks: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedMetadataCapabilities {
    #[serde(flatten)]
    pub updated: LastUpdated,
    #[serde(default)]
    pub tasks: Option<LastUpdated>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedMetadata {
    #[serde(flatten)]
    pub updated: LastUpdated,
    #[serde(rename = "FrmVer_NIU", default)]
    pub firmware_version_niu: Option<LastUpdated>,
    #[serde(rename = "Workmode", default)]
    pub workmode: Option<LastUpdated>,
    #[serde(rename = "FilterRFID", default)]
    pub filter_rfid: Option<LastUpdated>,
    #[serde(rename = "FilterLife", default)]
    pub filter_life: Option<LastUpdated>,
    #[serde(rename = "Fanspeed", default)]
    pub fanspeed: Option<LastUpdated>,
    #[serde(rename = "UILight", default)]
    pub ui_light: Option<LastUpdated>,
    #[serde(rename = "SafetyLock", default)]
    pub safety_lock: Option<LastUpdated>,
    #[serde(rename = "Ionizer", default)]
    pub ionizer: Option<LastUpdated>,
    #[serde(rename = "FilterType", default)]
    pub filter_type: Option<LastUpdated>,
    #[serde(rename = "ErrPM2_5", default)]
    pub err_pm25: Option<LastUpdated>,
    #[serde(rename = "ErrTVOC", default)]
    pub err_tvoc: Option<LastUpdated>,
    #[serde(rename = "ErrTempHumidity", default)]
    pub err_temp_humidity: Option<LastUpdated>,
    #[serde(rename = "ErrFanMtr", default)]
    pub err_fan_mtr: Option<LastUpdated>,
    #[serde(rename = "ErrCommSensorDisplayBrd", default)]
    pub err_comm_sensor_display_brd: Option<LastUpdated>,
    #[serde(rename = "DoorOpen", default)]
    pub door_open: Option<LastUpdated>,
    #[serde(rename = "ErrRFID", default)]
    pub err_rfid: Option<LastUpdated>,
    #[serde(rename = "SignalStrength", default)]
    pub signal_strength: Option<LastUpdated>,
    #[serde(rename = "logE", default)]
    pub log_e: Option<LastUpdated>,
    #[serde(rename = "logW", default)]
    pub log_w: Option<LastUpdated>,
    #[serde(rename = "InterfaceVer", default)]
    pub interface_version: Option<LastUpdated>,
    #[serde(rename = "VmNo_NIU", default)]
    pub vm_no_niu: Option<LastUpdated>,
    #[serde(rename = "TVOCBrand", default)]
    pub tvoc_brand: Option<LastUpdated>,
    #[serde(default)]
    pub capabilities: Option<ReportedMetadataCapabilities>,
    #[serde(default)]
    pub tasks: Option<LastUpdated>,
    #[serde(rename = "TVOC", default)]
    pub tvoc: Option<LastUpdated>,
    #[serde(rename = "CO2", default)]
    pub co2: Option<LastUpdated>,
    #[serde(rename = "PM1", default)]
    pub pm1: Option<LastUpdated>,
    #[serde(rename = "PM2_5", default)]
    pub pm25: Option<LastUpdated>,
    #[serde(rename = "PM10", default)]
    pub pm10: Option<LastUpdated>,
    #[serde(rename = "Humidity", default)]
    pub humidity: Option<LastUpdated>,
    #[serde(rename = "Temp", default)]
    pub temp: Option<LastUpdated>,
    #[serde(rename = "RSSI", default)]
    pub rssi: Option<LastUpdated>,
    #[serde(rename = "ECO2", default)]
    pub eco2: Option<LastUpdated>,
    #[serde(rename = "FilterLife_1", default)]
    pub filter_life_1: Option<LastUpdated>,
    #[serde(rename = "Monitoring", default)]
    pub monitoring: Option<LastUpdated>,
    #[serde(rename = "Monitoring_Stop", default)]
    pub monitoring_stop: Option<LastUpdated>,
    #[serde(rename = "Monitoring_Start", default)]
    pub monitoring_start: Option<LastUpdated>,
    #[serde(rename = "UVState", default)]
    pub uv_state: Option<LastUpdated>,
    #[serde(rename = "UVRuntime", default)]
    pub uv_runtime: Option<LastUpdated>,
    #[serde(rename = "ErrCommSensorUIBrd", default)]
    pub err_comm_sensor_ui_brd: Option<LastUpdated>,
    #[serde(rename = "ErrImpellerStuck", default)]
    pub err_impeller_stuck: Option<LastUpdated>,
    #[serde(rename = "ErrPmNotResp", default)]
    pub err_pm_not_resp: Option<LastUpdated>,
    #[serde(rename = "VmNo_MCU", default)]
    pub vm_no_mcu: Option<LastUpdated>,
    #[serde(rename = "PM2_5_approximate", default)]
    pub pm25_approximate: Option<LastUpdated>,
}
