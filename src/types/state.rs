//! Operational state taxonomy: top-level state plus reason sub-category

use serde::{Deserialize, Serialize};

// ============================================================================
// Operational State
// ============================================================================

/// Why a turbine is, or is not, producing during one interval.
///
/// - **Producing**: mean active power above the production threshold
/// - **NotProducingExplained**: alarm, curtailment, confirmed low wind, or a
///   recognised restart
/// - **NotProducingVerificationPending**: plausible explanation that the
///   references could not confirm
/// - **NotProducingUnexpected**: silent loss worth investigating
/// - **DataMissing**: the row lacks the values needed to decide
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalState {
    Producing,
    NotProducingExplained,
    NotProducingVerificationPending,
    NotProducingUnexpected,
    DataMissing,
}

impl OperationalState {
    pub const ALL: [Self; 5] = [
        Self::Producing,
        Self::NotProducingExplained,
        Self::NotProducingVerificationPending,
        Self::NotProducingUnexpected,
        Self::DataMissing,
    ];

    /// Numeric code used in exports (1-5).
    pub fn code(&self) -> u8 {
        match self {
            Self::Producing => 1,
            Self::NotProducingExplained => 2,
            Self::NotProducingVerificationPending => 3,
            Self::NotProducingUnexpected => 4,
            Self::DataMissing => 5,
        }
    }

    /// Get display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Producing => "Producing",
            Self::NotProducingExplained => "Not Producing - Explained",
            Self::NotProducingVerificationPending => "Not Producing - Verification Pending",
            Self::NotProducingUnexpected => "Not Producing - Unexpected",
            Self::DataMissing => "Data Missing",
        }
    }

    /// Get short code for logging and CSV output
    pub fn short_code(&self) -> &'static str {
        match self {
            Self::Producing => "PRODUCING",
            Self::NotProducingExplained => "NOT_PRODUCING_EXPLAINED",
            Self::NotProducingVerificationPending => "NOT_PRODUCING_VERIFICATION_PENDING",
            Self::NotProducingUnexpected => "NOT_PRODUCING_UNEXPECTED",
            Self::DataMissing => "DATA_MISSING",
        }
    }

    /// One of the three not-producing states (data-missing rows excluded).
    pub fn is_non_producing(&self) -> bool {
        matches!(
            self,
            Self::NotProducingExplained
                | Self::NotProducingVerificationPending
                | Self::NotProducingUnexpected
        )
    }
}

impl std::fmt::Display for OperationalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Reason Code
// ============================================================================

/// Sub-category explaining the state. Each code belongs to exactly one
/// [`OperationalState`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    NormalOperation,
    AlarmActive,
    CurtailmentActive,
    ConfirmedLowWind,
    StartupPostLowWind,
    StartupPostAlarm,
    SuspectedLowWind,
    StartupUnclear,
    SensorErrorLow,
    SensorErrorAnomalous,
    MechanicalOrControlIssue,
    UnknownNonProduction,
    DataMissingWithAlarm,
    DataMissingNoAlarm,
}

impl ReasonCode {
    pub const ALL: [Self; 14] = [
        Self::NormalOperation,
        Self::AlarmActive,
        Self::CurtailmentActive,
        Self::ConfirmedLowWind,
        Self::StartupPostLowWind,
        Self::StartupPostAlarm,
        Self::SuspectedLowWind,
        Self::StartupUnclear,
        Self::SensorErrorLow,
        Self::SensorErrorAnomalous,
        Self::MechanicalOrControlIssue,
        Self::UnknownNonProduction,
        Self::DataMissingWithAlarm,
        Self::DataMissingNoAlarm,
    ];

    /// The top-level state this reason belongs to.
    pub fn state(&self) -> OperationalState {
        match self {
            Self::NormalOperation => OperationalState::Producing,
            Self::AlarmActive
            | Self::CurtailmentActive
            | Self::ConfirmedLowWind
            | Self::StartupPostLowWind
            | Self::StartupPostAlarm => OperationalState::NotProducingExplained,
            Self::SuspectedLowWind | Self::StartupUnclear => {
                OperationalState::NotProducingVerificationPending
            }
            Self::SensorErrorLow
            | Self::SensorErrorAnomalous
            | Self::MechanicalOrControlIssue
            | Self::UnknownNonProduction => OperationalState::NotProducingUnexpected,
            Self::DataMissingWithAlarm | Self::DataMissingNoAlarm => OperationalState::DataMissing,
        }
    }

    /// Get display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NormalOperation => "Normal Operation",
            Self::AlarmActive => "Alarm Active",
            Self::CurtailmentActive => "Curtailment Active",
            Self::ConfirmedLowWind => "Confirmed Low Wind",
            Self::StartupPostLowWind => "Startup Sequence (Post-Low Wind)",
            Self::StartupPostAlarm => "Startup Sequence (Post-Alarm)",
            Self::SuspectedLowWind => "Suspected Low Wind",
            Self::StartupUnclear => "Startup Sequence (Trigger Unclear)",
            Self::SensorErrorLow => "Suspected Sensor Error (Low Reading)",
            Self::SensorErrorAnomalous => "Suspected Sensor Error (Anomalous Reading)",
            Self::MechanicalOrControlIssue => "Suspected Mechanical/Control Issue",
            Self::UnknownNonProduction => "Unknown Non-Production",
            Self::DataMissingWithAlarm => "Data Missing (Alarm Active)",
            Self::DataMissingNoAlarm => "Data Missing (No Alarm)",
        }
    }

    /// Get short code for logging and CSV output
    pub fn short_code(&self) -> &'static str {
        match self {
            Self::NormalOperation => "NORMAL_OPERATION",
            Self::AlarmActive => "ALARM_ACTIVE",
            Self::CurtailmentActive => "CURTAILMENT_ACTIVE",
            Self::ConfirmedLowWind => "CONFIRMED_LOW_WIND",
            Self::StartupPostLowWind => "STARTUP_POST_LOW_WIND",
            Self::StartupPostAlarm => "STARTUP_POST_ALARM",
            Self::SuspectedLowWind => "SUSPECTED_LOW_WIND",
            Self::StartupUnclear => "STARTUP_UNCLEAR",
            Self::SensorErrorLow => "SENSOR_ERROR_LOW",
            Self::SensorErrorAnomalous => "SENSOR_ERROR_ANOMALOUS",
            Self::MechanicalOrControlIssue => "MECHANICAL_CONTROL_ISSUE",
            Self::UnknownNonProduction => "UNKNOWN_NON_PRODUCTION",
            Self::DataMissingWithAlarm => "DATA_MISSING_WITH_ALARM",
            Self::DataMissingNoAlarm => "DATA_MISSING_NO_ALARM",
        }
    }

    /// Low wind, confirmed or suspected.
    pub fn is_low_wind(&self) -> bool {
        matches!(self, Self::ConfirmedLowWind | Self::SuspectedLowWind)
    }

    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::StartupPostAlarm | Self::StartupPostLowWind | Self::StartupUnclear
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
