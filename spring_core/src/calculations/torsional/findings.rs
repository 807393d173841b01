//! Classified, non-fatal findings and the status scales used to grade them.

use serde::{Deserialize, Serialize};

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Info,
    Warning,
    Error,
}

/// What a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    /// Spring index outside the preferred manufacturing range
    SpringIndexRange,
    /// Stop angle does not exceed engagement angle
    NonPositiveTravel,
    /// Shear stress above allowable at the reference angle
    Overstress,
    /// Material lookup failed, fallback strength used
    MaterialFallback,
    /// Groups listed out of engagement order
    EngagementOrder,
    /// Springs of different groups interfere on a shared radius
    CollisionRisk,
    /// Abrupt stiffness handoff at a stage transition
    TransitionNvh,
    /// Reference angle lies past the system stop
    ReferenceBeyondStop,
    /// Operating angle against the system safe angle
    OperatingMargin,
}

impl FindingCode {
    /// Short code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            FindingCode::SpringIndexRange => "SPRING_INDEX_RANGE",
            FindingCode::NonPositiveTravel => "NON_POSITIVE_TRAVEL",
            FindingCode::Overstress => "OVERSTRESS",
            FindingCode::MaterialFallback => "MATERIAL_FALLBACK",
            FindingCode::EngagementOrder => "ENGAGEMENT_ORDER",
            FindingCode::CollisionRisk => "COLLISION_RISK",
            FindingCode::TransitionNvh => "TRANSITION_NVH",
            FindingCode::ReferenceBeyondStop => "REFERENCE_BEYOND_STOP",
            FindingCode::OperatingMargin => "OPERATING_MARGIN",
        }
    }
}

/// A non-fatal, classified observation about a design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: FindingSeverity,
    pub code: FindingCode,
    /// Group the finding concerns, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub message: String,
}

impl Finding {
    pub fn new(severity: FindingSeverity, code: FindingCode, group_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            group_id: group_id.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn info(code: FindingCode, group_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(FindingSeverity::Info, code, group_id, message)
    }

    pub fn warning(code: FindingCode, group_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(FindingSeverity::Warning, code, group_id, message)
    }

    pub fn error(code: FindingCode, group_id: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(FindingSeverity::Error, code, group_id, message)
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            FindingSeverity::Info => "INFO",
            FindingSeverity::Warning => "WARN",
            FindingSeverity::Error => "ERROR",
        };
        match &self.group_id {
            Some(id) => write!(f, "[{}] {} ({}): {}", tag, self.code.code(), id, self.message),
            None => write!(f, "[{}] {}: {}", tag, self.code.code(), self.message),
        }
    }
}

/// Pass/warn/fail grade of a check. Ordered so `max` is the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    #[default]
    Pass,
    Warn,
    Fail,
}

impl AuditStatus {
    /// Grade `value` against warn/fail thresholds (strictly greater trips).
    pub fn classify(value: f64, thresholds: &crate::policy::Thresholds) -> Self {
        if value > thresholds.fail {
            AuditStatus::Fail
        } else if value > thresholds.warn {
            AuditStatus::Warn
        } else {
            AuditStatus::Pass
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::Pass => "PASS",
            AuditStatus::Warn => "WARN",
            AuditStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Overall status of a design report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Ok,
    Warn,
    Fail,
}

impl ReportStatus {
    /// FAIL on any error, WARN on any warning, else OK
    pub fn from_findings(findings: &[Finding]) -> Self {
        match findings.iter().map(|f| f.severity).max() {
            Some(FindingSeverity::Error) => ReportStatus::Fail,
            Some(FindingSeverity::Warning) => ReportStatus::Warn,
            _ => ReportStatus::Ok,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Ok => "OK",
            ReportStatus::Warn => "WARN",
            ReportStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Thresholds;

    #[test]
    fn test_classify_boundaries() {
        let t = Thresholds::new(0.8, 1.0);
        assert_eq!(AuditStatus::classify(0.8, &t), AuditStatus::Pass);
        assert_eq!(AuditStatus::classify(0.8000001, &t), AuditStatus::Warn);
        assert_eq!(AuditStatus::classify(1.0, &t), AuditStatus::Warn);
        assert_eq!(AuditStatus::classify(1.0000001, &t), AuditStatus::Fail);
    }

    #[test]
    fn test_status_ordering() {
        assert!(AuditStatus::Fail > AuditStatus::Warn);
        assert!(AuditStatus::Warn > AuditStatus::Pass);
        let worst = [AuditStatus::Pass, AuditStatus::Fail, AuditStatus::Warn].into_iter().max();
        assert_eq!(worst, Some(AuditStatus::Fail));
    }

    #[test]
    fn test_report_status_from_findings() {
        assert_eq!(ReportStatus::from_findings(&[]), ReportStatus::Ok);

        let info = Finding::info(FindingCode::OperatingMargin, None, "capability reference");
        assert_eq!(ReportStatus::from_findings(&[info.clone()]), ReportStatus::Ok);

        let warn = Finding::warning(FindingCode::SpringIndexRange, Some("g1"), "C = 3.2");
        assert_eq!(ReportStatus::from_findings(&[info.clone(), warn.clone()]), ReportStatus::Warn);

        let err = Finding::error(FindingCode::Overstress, Some("g1"), "utilization 1.12");
        assert_eq!(ReportStatus::from_findings(&[info, err, warn]), ReportStatus::Fail);
    }

    #[test]
    fn test_finding_display() {
        let f = Finding::warning(FindingCode::CollisionRisk, None, "gap 5.00° < 13.53°");
        assert_eq!(f.to_string(), "[WARN] COLLISION_RISK: gap 5.00° < 13.53°");
        let f = Finding::error(FindingCode::Overstress, Some("g2"), "utilization 1.10");
        assert_eq!(f.to_string(), "[ERROR] OVERSTRESS (g2): utilization 1.10");
    }

    #[test]
    fn test_finding_serialization() {
        let f = Finding::warning(FindingCode::MaterialFallback, Some("g1"), "not found");
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"code\":\"MATERIAL_FALLBACK\""));
        let parsed: Finding = serde_json::from_str(&json).unwrap();
        assert_eq!(f, parsed);
    }
}
