use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::enums::{ActivityLevel, AlcoholConsumption, Gender, PrimaryGoal, SmokingStatus};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: Gender,
    /// Centimetres.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
    pub phone: String,
    pub emergency_contact: EmergencyContact,
}

impl PersonalInfo {
    pub fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").ok()
    }

    /// Age as the difference of calendar years; the birthday itself is ignored.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        self.birth_date().map(|birth| today.year() - birth.year())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub surgeries: Vec<String>,
    #[serde(default)]
    pub family_history: Vec<String>,
    pub smoking_status: SmokingStatus,
    pub alcohol_consumption: AlcoholConsumption,
    pub exercise_frequency: ActivityLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthGoals {
    pub primary: PrimaryGoal,
    #[serde(default)]
    pub target_weight: Option<f64>,
    /// Weeks.
    pub timeframe: u32,
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub preferred_workout_types: Vec<String>,
    /// 0 = Sunday … 6 = Saturday.
    #[serde(default)]
    pub available_workout_days: Vec<u8>,
    /// Minutes.
    pub workout_duration: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub personal_info: PersonalInfo,
    pub medical_history: MedicalHistory,
    pub goals: HealthGoals,
}

/// A single failed form rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All rule failures for one submitted form.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .0.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl OnboardingForm {
    /// Check every form rule, collecting all failures instead of stopping at the first.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        let mut fail = |field: &'static str, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            });
        };

        let info = &self.personal_info;
        if info.name.trim().chars().count() < 2 {
            fail("personalInfo.name", "Nome deve ter pelo menos 2 caracteres");
        }
        if !EMAIL_PATTERN.is_match(info.email.trim()) {
            fail("personalInfo.email", "Email inválido");
        }
        // An unreadable date has no age, so it fails the same rule.
        if !info.age_on(today).is_some_and(|age| (18..=120).contains(&age)) {
            fail("personalInfo.dateOfBirth", "Idade deve estar entre 18 e 120 anos");
        }
        if info.height < 100.0 {
            fail("personalInfo.height", "Altura mínima: 100cm");
        } else if info.height > 250.0 {
            fail("personalInfo.height", "Altura máxima: 250cm");
        }
        if info.weight < 30.0 {
            fail("personalInfo.weight", "Peso mínimo: 30kg");
        } else if info.weight > 300.0 {
            fail("personalInfo.weight", "Peso máximo: 300kg");
        }
        if info.phone.chars().count() < 10 {
            fail("personalInfo.phone", "Telefone deve ter pelo menos 10 dígitos");
        }

        let contact = &info.emergency_contact;
        if contact.name.trim().chars().count() < 2 {
            fail(
                "personalInfo.emergencyContact.name",
                "Nome do contato de emergência é obrigatório",
            );
        }
        if contact.phone.chars().count() < 10 {
            fail(
                "personalInfo.emergencyContact.phone",
                "Telefone do contato de emergência é obrigatório",
            );
        }
        if contact.relationship.trim().chars().count() < 2 {
            fail(
                "personalInfo.emergencyContact.relationship",
                "Relacionamento deve ser especificado",
            );
        }

        let goals = &self.goals;
        if goals.timeframe < 1 {
            fail("goals.timeframe", "Prazo mínimo: 1 semana");
        } else if goals.timeframe > 104 {
            fail("goals.timeframe", "Prazo máximo: 2 anos");
        }
        if goals.workout_duration < 15 {
            fail("goals.workoutDuration", "Duração mínima: 15 minutos");
        } else if goals.workout_duration > 180 {
            fail("goals.workoutDuration", "Duração máxima: 3 horas");
        }
        if goals.available_workout_days.iter().any(|d| *d > 6) {
            fail("goals.availableWorkoutDays", "Dias de treino devem estar entre 0 e 6");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}
