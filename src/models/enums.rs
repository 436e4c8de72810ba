use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a wire string does not match any enum variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + Display + std::str::FromStr pattern.
/// The literal is the wire form used by the persistence service.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(VisitStatus {
    Scheduled => "scheduled",
    Rescheduled => "rescheduled",
    OnCourse => "on-course",
    InProgress => "in-progress",
    Cancelled => "cancelled",
    Completed => "completed",
});

impl VisitStatus {
    /// Terminal statuses accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// `rescheduled` is equivalent to `scheduled` for transition purposes:
    /// both mean the consultant has not departed yet.
    pub fn is_pre_route(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Rescheduled)
    }
}

str_enum!(VisitType {
    InitialVisit => "initial-visit",
    FollowUp => "follow-up",
    Training => "training",
    InitialAssessment => "initial-assessment",
    FinalAssessment => "final-assessment",
    Distribution => "distribution",
});

str_enum!(InstitutionProfile {
    OnboardingYear1 => "onboarding-year1",
    VeteranYear2Plus => "veteran-year2plus",
});

str_enum!(Role {
    Consultant => "consultant",
    Admin => "admin",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            VisitStatus::Scheduled,
            VisitStatus::Rescheduled,
            VisitStatus::OnCourse,
            VisitStatus::InProgress,
            VisitStatus::Cancelled,
            VisitStatus::Completed,
        ] {
            assert_eq!(VisitStatus::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn status_serializes_as_wire_string() {
        let json = serde_json::to_string(&VisitStatus::OnCourse).unwrap();
        assert_eq!(json, "\"on-course\"");
    }

    #[test]
    fn unknown_status_is_an_error() {
        let err = VisitStatus::from_str("paused").unwrap_err();
        assert_eq!(err.value, "paused");
    }

    #[test]
    fn terminal_statuses() {
        assert!(VisitStatus::Cancelled.is_terminal());
        assert!(VisitStatus::Completed.is_terminal());
        assert!(!VisitStatus::Rescheduled.is_terminal());
    }

    #[test]
    fn rescheduled_counts_as_not_departed() {
        assert!(VisitStatus::Scheduled.is_pre_route());
        assert!(VisitStatus::Rescheduled.is_pre_route());
        assert!(!VisitStatus::OnCourse.is_pre_route());
    }
}
