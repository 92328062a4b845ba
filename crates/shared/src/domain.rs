use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown answer key '{0}'")]
pub struct FieldKeyError(pub String);

macro_rules! field_keys {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FieldKeyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(FieldKeyError(other.to_string())),
                }
            }
        }
    };
}

field_keys!(TextField {
    LotNumber => "lotNumber",
    PatientId => "patientId",
    TreatmentDate => "treatmentDate",
    Age => "age",
    Gender => "gender",
    OtherInformation => "otherInformation",
    AnticoagulantUse => "anticoagulantUse",
    AnticoagulantType => "anticoagulantType",
    AnatomicalOther => "anatomicalOther",
    BleedingType => "bleedingType",
    InjuryOther => "injuryOther",
    HemostaticOther => "hemostaticOther",
    BleedingControlled => "bleedingControlled",
    BleedingComment => "bleedingComment",
    ProductsUsed => "productsUsed",
    ProductsCount => "productsCount",
    UnexpectedReactions => "unexpectedReactions",
    ReactionsDescription => "reactionsDescription",
    ConditionsOther => "conditionsOther",
    PackageOpening => "packageOpening",
    PackageComment => "packageComment",
    RemovalHours => "removalHours",
    RemovalEvaluation => "removalEvaluation",
});

field_keys!(SetField {
    AnatomicalRegion => "anatomicalRegion",
    InjuryType => "injuryType",
    HemostaticMeasure => "hemostaticMeasure",
    DifficultConditions => "difficultConditions",
});

/// Either kind of answer key, for callers that receive keys as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Text(TextField),
    Set(SetField),
}

impl FromStr for FieldKey {
    type Err = FieldKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(field) = s.parse::<TextField>() {
            return Ok(FieldKey::Text(field));
        }
        s.parse::<SetField>().map(FieldKey::Set)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Text(field) => fmt::Display::fmt(field, f),
            FieldKey::Set(field) => fmt::Display::fmt(field, f),
        }
    }
}

/// All answers for one form session. Every key is always present; the
/// default value is an empty string or an empty selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnswerRecord {
    pub lot_number: String,
    pub patient_id: String,
    pub treatment_date: String,
    pub age: String,
    pub gender: String,
    pub other_information: String,
    pub anticoagulant_use: String,
    pub anticoagulant_type: String,
    pub anatomical_region: Vec<String>,
    pub anatomical_other: String,
    pub bleeding_type: String,
    pub injury_type: Vec<String>,
    pub injury_other: String,
    pub hemostatic_measure: Vec<String>,
    pub hemostatic_other: String,
    pub bleeding_controlled: String,
    pub bleeding_comment: String,
    pub products_used: String,
    pub products_count: String,
    pub unexpected_reactions: String,
    pub reactions_description: String,
    pub difficult_conditions: Vec<String>,
    pub conditions_other: String,
    pub package_opening: String,
    pub package_comment: String,
    pub removal_hours: String,
    pub removal_evaluation: String,
}

impl AnswerRecord {
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::LotNumber => &self.lot_number,
            TextField::PatientId => &self.patient_id,
            TextField::TreatmentDate => &self.treatment_date,
            TextField::Age => &self.age,
            TextField::Gender => &self.gender,
            TextField::OtherInformation => &self.other_information,
            TextField::AnticoagulantUse => &self.anticoagulant_use,
            TextField::AnticoagulantType => &self.anticoagulant_type,
            TextField::AnatomicalOther => &self.anatomical_other,
            TextField::BleedingType => &self.bleeding_type,
            TextField::InjuryOther => &self.injury_other,
            TextField::HemostaticOther => &self.hemostatic_other,
            TextField::BleedingControlled => &self.bleeding_controlled,
            TextField::BleedingComment => &self.bleeding_comment,
            TextField::ProductsUsed => &self.products_used,
            TextField::ProductsCount => &self.products_count,
            TextField::UnexpectedReactions => &self.unexpected_reactions,
            TextField::ReactionsDescription => &self.reactions_description,
            TextField::ConditionsOther => &self.conditions_other,
            TextField::PackageOpening => &self.package_opening,
            TextField::PackageComment => &self.package_comment,
            TextField::RemovalHours => &self.removal_hours,
            TextField::RemovalEvaluation => &self.removal_evaluation,
        }
    }

    pub fn text_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::LotNumber => &mut self.lot_number,
            TextField::PatientId => &mut self.patient_id,
            TextField::TreatmentDate => &mut self.treatment_date,
            TextField::Age => &mut self.age,
            TextField::Gender => &mut self.gender,
            TextField::OtherInformation => &mut self.other_information,
            TextField::AnticoagulantUse => &mut self.anticoagulant_use,
            TextField::AnticoagulantType => &mut self.anticoagulant_type,
            TextField::AnatomicalOther => &mut self.anatomical_other,
            TextField::BleedingType => &mut self.bleeding_type,
            TextField::InjuryOther => &mut self.injury_other,
            TextField::HemostaticOther => &mut self.hemostatic_other,
            TextField::BleedingControlled => &mut self.bleeding_controlled,
            TextField::BleedingComment => &mut self.bleeding_comment,
            TextField::ProductsUsed => &mut self.products_used,
            TextField::ProductsCount => &mut self.products_count,
            TextField::UnexpectedReactions => &mut self.unexpected_reactions,
            TextField::ReactionsDescription => &mut self.reactions_description,
            TextField::ConditionsOther => &mut self.conditions_other,
            TextField::PackageOpening => &mut self.package_opening,
            TextField::PackageComment => &mut self.package_comment,
            TextField::RemovalHours => &mut self.removal_hours,
            TextField::RemovalEvaluation => &mut self.removal_evaluation,
        }
    }

    pub fn selection(&self, field: SetField) -> &[String] {
        match field {
            SetField::AnatomicalRegion => &self.anatomical_region,
            SetField::InjuryType => &self.injury_type,
            SetField::HemostaticMeasure => &self.hemostatic_measure,
            SetField::DifficultConditions => &self.difficult_conditions,
        }
    }

    pub fn selection_mut(&mut self, field: SetField) -> &mut Vec<String> {
        match field {
            SetField::AnatomicalRegion => &mut self.anatomical_region,
            SetField::InjuryType => &mut self.injury_type,
            SetField::HemostaticMeasure => &mut self.hemostatic_measure,
            SetField::DifficultConditions => &mut self.difficult_conditions,
        }
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}
