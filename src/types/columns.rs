//! Column names of the SCADA export and the layout table.
//!
//! These are matched byte-for-byte against CSV headers.

pub const STATION_ID: &str = "StationId";
pub const TIMESTAMP: &str = "TimeStamp";
pub const EFFECTIVE_ALARM_TIME: &str = "EffectiveAlarmTime";
pub const ALARM_TEXT: &str = "UK Text";
/// Seconds that alarm code 2006 (OEM internal curtailment) was active.
pub const INTERNAL_CURTAILMENT_2006: &str = "Duration 2006(s)";
pub const EXPORTED_ENERGY: &str = "wtc_kWG1TotE_accum";
pub const ACTIVE_POWER_MEAN: &str = "wtc_ActPower_mean";
pub const ACTIVE_POWER_MIN: &str = "wtc_ActPower_min";
pub const ACTIVE_POWER_MAX: &str = "wtc_ActPower_max";
pub const WIND_SPEED_MEAN: &str = "wtc_AcWindSp_mean";
pub const WIND_DIRECTION_MEAN: &str = "wtc_ActualWindDirection_mean";
/// Seconds of grid-operator power reduction.
pub const EXTERNAL_CURTAILMENT: &str = "wtc_PowerRed_timeon";

/// Every SCADA column that must be present for a dataset to load.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    STATION_ID,
    TIMESTAMP,
    EFFECTIVE_ALARM_TIME,
    ALARM_TEXT,
    INTERNAL_CURTAILMENT_2006,
    EXPORTED_ENERGY,
    ACTIVE_POWER_MEAN,
    ACTIVE_POWER_MIN,
    ACTIVE_POWER_MAX,
    WIND_SPEED_MEAN,
    WIND_DIRECTION_MEAN,
    EXTERNAL_CURTAILMENT,
];

pub const METMAST_WIND_SPEED_PREFIX: &str = "met_WindSpeedRot_mean_";
pub const METMAST_WIND_DIRECTION_PREFIX: &str = "met_WinddirectionRot_mean_";

pub const LAYOUT_STATION_ID: &str = "StationId";
pub const LAYOUT_X: &str = "X-Coordinate";
pub const LAYOUT_Y: &str = "Y-Coordinate";
/// Optional: `turbine` (default) or `metmast`.
pub const LAYOUT_TYPE: &str = "Type";

pub const REQUIRED_LAYOUT_COLUMNS: [&str; 3] = [LAYOUT_STATION_ID, LAYOUT_X, LAYOUT_Y];

/// Metmast id of a `met_WindSpeedRot_mean_<id>` column.
pub fn metmast_speed_id(column: &str) -> Option<&str> {
    column
        .strip_prefix(METMAST_WIND_SPEED_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Metmast id of a `met_WinddirectionRot_mean_<id>` column.
pub fn metmast_direction_id(column: &str) -> Option<&str> {
    column
        .strip_prefix(METMAST_WIND_DIRECTION_PREFIX)
        .filter(|id| !id.is_empty())
}
