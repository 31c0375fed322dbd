//! Baseline metabolic profile for a newly onboarded patient.
//!
//! BMR uses the revised Harris-Benedict equations; TDEE multiplies it by an
//! activity factor taken from the patient's reported exercise frequency.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    ActivityLevel, AlcoholConsumption, BmiCategory, Gender, OnboardingForm, PrimaryGoal,
    Recommendation, RiskFactor, SmokingStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicProfile {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    /// kcal/day, rounded.
    pub bmr: i64,
    /// kcal/day, rounded.
    pub tdee: i64,
    pub age: i32,
    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<Recommendation>,
}

/// Body-mass index from centimetres and kilograms.
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let meters = height_cm / 100.0;
    weight_kg / (meters * meters)
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi >= 30.0 {
        BmiCategory::Obese
    } else if bmi >= 25.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Normal
    }
}

/// Unrounded basal metabolic rate. Any gender other than male uses the female equation.
pub fn basal_metabolic_rate(gender: Gender, weight_kg: f64, height_cm: f64, age: i32) -> f64 {
    let age = f64::from(age);
    match gender {
        Gender::Male => 88.362 + 13.397 * weight_kg + 4.799 * height_cm - 5.677 * age,
        Gender::Female | Gender::Other => {
            447.593 + 9.247 * weight_kg + 3.098 * height_cm - 4.330 * age
        }
    }
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// Compute the profile for a form that already passed validation.
/// Returns `None` only if the birth date cannot be parsed.
pub fn compute_profile(form: &OnboardingForm, today: NaiveDate) -> Option<MetabolicProfile> {
    let info = &form.personal_info;
    let history = &form.medical_history;

    let age = info.age_on(today)?;
    let bmi = bmi(info.height, info.weight);
    let bmr = basal_metabolic_rate(info.gender, info.weight, info.height, age);
    let tdee = bmr * activity_factor(history.exercise_frequency);

    let mut risk_factors = Vec::new();
    if bmi >= 25.0 {
        risk_factors.push(RiskFactor::Overweight);
    }
    if history.smoking_status == SmokingStatus::Current {
        risk_factors.push(RiskFactor::Smoking);
    }
    if history.alcohol_consumption == AlcoholConsumption::Heavy {
        risk_factors.push(RiskFactor::HeavyAlcohol);
    }
    if history.exercise_frequency == ActivityLevel::Sedentary {
        risk_factors.push(RiskFactor::Sedentary);
    }

    let recommendations = match form.goals.primary {
        PrimaryGoal::WeightLoss => vec![
            Recommendation::ControlledCaloricDeficit,
            Recommendation::AerobicAndResistanceTraining,
        ],
        PrimaryGoal::MuscleGain => vec![
            Recommendation::ModerateCaloricSurplus,
            Recommendation::ResistanceTrainingFocus,
        ],
        _ => Vec::new(),
    };

    Some(MetabolicProfile {
        bmi,
        bmi_category: bmi_category(bmi),
        bmr: bmr.round() as i64,
        tdee: tdee.round() as i64,
        age,
        risk_factors,
        recommendations,
    })
}
