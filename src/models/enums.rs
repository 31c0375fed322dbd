use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire form (serde) is the same string as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(LabCategory {
    Lipid => "lipid",
    Glucose => "glucose",
    Kidney => "kidney",
    Thyroid => "thyroid",
    Other => "other",
});

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(SmokingStatus {
    Never => "never",
    Former => "former",
    Current => "current",
});

str_enum!(AlcoholConsumption {
    None => "none",
    Light => "light",
    Moderate => "moderate",
    Heavy => "heavy",
});

str_enum!(ActivityLevel {
    Sedentary => "sedentary",
    Light => "light",
    Moderate => "moderate",
    Active => "active",
    VeryActive => "very_active",
});

str_enum!(PrimaryGoal {
    WeightLoss => "weight_loss",
    WeightGain => "weight_gain",
    MuscleGain => "muscle_gain",
    Maintenance => "maintenance",
    HealthImprovement => "health_improvement",
});

str_enum!(BmiCategory {
    Underweight => "underweight",
    Normal => "normal",
    Overweight => "overweight",
    Obese => "obese",
});

// Risk factors and recommendations go out as the labels the dashboard displays.
str_enum!(RiskFactor {
    Overweight => "Sobrepeso/Obesidade",
    Smoking => "Tabagismo",
    HeavyAlcohol => "Consumo excessivo de álcool",
    Sedentary => "Sedentarismo",
});

str_enum!(Recommendation {
    ControlledCaloricDeficit => "Déficit calórico controlado",
    AerobicAndResistanceTraining => "Exercícios aeróbicos e resistência",
    ModerateCaloricSurplus => "Superávit calórico moderado",
    ResistanceTrainingFocus => "Foco em exercícios de resistência",
});
