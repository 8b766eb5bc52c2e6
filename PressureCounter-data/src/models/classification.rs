use std::fmt;

use serde::{Deserialize, Serialize};

/// Blood pressure category based on measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PressureCategory {
    /// Low blood pressure (systolic < 90 or diastolic < 60)
    Hypotension,

    /// Normal blood pressure (systolic < 120 and diastolic < 80)
    Normal,

    /// Elevated blood pressure (systolic 120-129 and diastolic < 80)
    Elevated,

    /// Stage 1 Hypertension (systolic 130-139 or diastolic 80-89)
    #[serde(rename = "HYPERTENSION_STAGE_1")]
    HypertensionStage1,

    /// Stage 2 Hypertension (systolic 140-179 or diastolic 90-119)
    #[serde(rename = "HYPERTENSION_STAGE_2")]
    HypertensionStage2,

    /// Hypertensive crisis, everything the other bands leave over
    HypertensiveCrisis,
}

impl PressureCategory {
    pub fn label(self) -> &'static str {
        match self {
            PressureCategory::Hypotension => "Hypotension",
            PressureCategory::Normal => "Normal",
            PressureCategory::Elevated => "Elevated",
            PressureCategory::HypertensionStage1 => "Hypertension Stage 1",
            PressureCategory::HypertensionStage2 => "Hypertension Stage 2",
            PressureCategory::HypertensiveCrisis => "Hypertensive Crisis",
        }
    }

    /// Display colour as 0xAARRGGBB
    pub fn color_argb(self) -> u32 {
        match self {
            PressureCategory::Hypotension => 0xFF21_96F3,
            PressureCategory::Normal => 0xFF4C_AF50,
            PressureCategory::Elevated => 0xFFFF_EB3B,
            PressureCategory::HypertensionStage1 => 0xFFFF_9800,
            PressureCategory::HypertensionStage2 => 0xFFF4_4336,
            PressureCategory::HypertensiveCrisis => 0xFF9C_27B0,
        }
    }
}

impl fmt::Display for PressureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categorize blood pressure based on measurements
///
/// Bands are checked in order and the first match wins, so a later band only
/// applies when every earlier one failed. 125/85 is stage 1 rather than
/// elevated, and 200/70 reaches crisis only through the final branch because
/// it is outside stage 2's systolic range.
pub fn categorize_pressure(systolic: i32, diastolic: i32) -> PressureCategory {
    if systolic < 90 || diastolic < 60 {
        PressureCategory::Hypotension
    } else if systolic < 120 && diastolic < 80 {
        PressureCategory::Normal
    } else if (120..=129).contains(&systolic) && diastolic < 80 {
        PressureCategory::Elevated
    } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        PressureCategory::HypertensionStage1
    } else if (140..=179).contains(&systolic) || (90..=119).contains(&diastolic) {
        PressureCategory::HypertensionStage2
    } else {
        PressureCategory::HypertensiveCrisis
    }
}
