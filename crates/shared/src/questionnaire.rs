//! The fixed case-report questionnaire: question order, labels, option lists
//! and the satellite free-text fields hanging off individual questions.

use crate::domain::{AnswerRecord, SetField, TextField};

pub const OTHERS_OPTION: &str = "others";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputHint {
    FreeText,
    Date,
    Number,
    LongText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Text {
        field: TextField,
        hint: InputHint,
    },
    Choice {
        field: TextField,
        options: &'static [&'static str],
    },
    MultiChoice {
        field: SetField,
        options: &'static [&'static str],
    },
}

/// When a satellite field carries meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatelliteTrigger {
    /// The primary answer equals this value.
    Equals(&'static str),
    /// The primary selection contains this value.
    Contains(&'static str),
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Satellite {
    pub field: TextField,
    pub label: &'static str,
    pub prompt: &'static str,
    pub trigger: SatelliteTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub number: u8,
    pub prompt: &'static str,
    pub report_label: &'static str,
    pub placeholder: Option<&'static str>,
    pub kind: QuestionKind,
    pub satellite: Option<Satellite>,
}

impl Question {
    /// Primary answer as it appears in the report; selections are joined
    /// with ", " in the order they were picked.
    pub fn primary_answer(&self, record: &AnswerRecord) -> String {
        match self.kind {
            QuestionKind::Text { field, .. } | QuestionKind::Choice { field, .. } => {
                record.text(field).to_string()
            }
            QuestionKind::MultiChoice { field, .. } => record.selection(field).join(", "),
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self.kind {
            QuestionKind::Text { .. } => &[],
            QuestionKind::Choice { options, .. } | QuestionKind::MultiChoice { options, .. } => {
                options
            }
        }
    }

    /// Whether the satellite input is enabled for the current answers.
    pub fn satellite_active(&self, record: &AnswerRecord) -> bool {
        let Some(satellite) = self.satellite else {
            return false;
        };

        match (satellite.trigger, self.kind) {
            (SatelliteTrigger::Always, _) => true,
            (SatelliteTrigger::Equals(value), QuestionKind::Text { field, .. })
            | (SatelliteTrigger::Equals(value), QuestionKind::Choice { field, .. }) => {
                record.text(field) == value
            }
            (SatelliteTrigger::Contains(value), QuestionKind::MultiChoice { field, .. }) => {
                record.selection(field).iter().any(|item| item == value)
            }
            _ => false,
        }
    }
}

const fn others_satellite(field: TextField) -> Option<Satellite> {
    Some(Satellite {
        field,
        label: "Other",
        prompt: "others, please describe:",
        trigger: SatelliteTrigger::Contains(OTHERS_OPTION),
    })
}

pub static QUESTIONS: [Question; 18] = [
    Question {
        number: 1,
        prompt: "XXX® LOT number:",
        report_label: "XXX® LOT number",
        placeholder: None,
        kind: QuestionKind::Text {
            field: TextField::LotNumber,
            hint: InputHint::FreeText,
        },
        satellite: None,
    },
    Question {
        number: 2,
        prompt: "Anonymized patient identification:",
        report_label: "Anonymized patient identification",
        placeholder: None,
        kind: QuestionKind::Text {
            field: TextField::PatientId,
            hint: InputHint::FreeText,
        },
        satellite: None,
    },
    Question {
        number: 3,
        prompt: "Date of treatment:",
        report_label: "Date of treatment",
        placeholder: None,
        kind: QuestionKind::Text {
            field: TextField::TreatmentDate,
            hint: InputHint::Date,
        },
        satellite: None,
    },
    Question {
        number: 4,
        prompt: "Age:",
        report_label: "Age",
        placeholder: None,
        kind: QuestionKind::Text {
            field: TextField::Age,
            hint: InputHint::Number,
        },
        satellite: None,
    },
    Question {
        number: 5,
        prompt: "Gender:",
        report_label: "Gender",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::Gender,
            options: &["male", "female", "diverse"],
        },
        satellite: None,
    },
    Question {
        number: 6,
        prompt: "Other information:",
        report_label: "Other information",
        placeholder: Some("(e.g. previous illnesses, smoker, alcohol influence, medication)"),
        kind: QuestionKind::Text {
            field: TextField::OtherInformation,
            hint: InputHint::LongText,
        },
        satellite: None,
    },
    Question {
        number: 7,
        prompt: "Anticoagulant use:",
        report_label: "Anticoagulant use",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::AnticoagulantUse,
            options: &["yes", "no", "unknown"],
        },
        satellite: Some(Satellite {
            field: TextField::AnticoagulantType,
            label: "Type",
            prompt: "yes, which one:",
            trigger: SatelliteTrigger::Equals("yes"),
        }),
    },
    Question {
        number: 8,
        prompt: "Anatomical region of injury:",
        report_label: "Anatomical region of injury",
        placeholder: None,
        kind: QuestionKind::MultiChoice {
            field: SetField::AnatomicalRegion,
            options: &[
                "extremities",
                "trunk/abdomen",
                "inguinal",
                "head/neck",
                OTHERS_OPTION,
            ],
        },
        satellite: others_satellite(TextField::AnatomicalOther),
    },
    Question {
        number: 9,
        prompt: "Type of bleeding:",
        report_label: "Type of bleeding",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::BleedingType,
            options: &["arterial", "venous/mixed", "unknown"],
        },
        satellite: None,
    },
    Question {
        number: 10,
        prompt: "Type of injury:",
        report_label: "Type of injury",
        placeholder: None,
        kind: QuestionKind::MultiChoice {
            field: SetField::InjuryType,
            options: &["aaa", "bbb", "ccc", "ddd", OTHERS_OPTION],
        },
        satellite: others_satellite(TextField::InjuryOther),
    },
    Question {
        number: 11,
        prompt: "Complementary hemostatic measure:",
        report_label: "Complementary hemostatic measure",
        placeholder: None,
        kind: QuestionKind::MultiChoice {
            field: SetField::HemostaticMeasure,
            options: &["tourniquet", "compression bandage", OTHERS_OPTION],
        },
        satellite: others_satellite(TextField::HemostaticOther),
    },
    Question {
        number: 12,
        prompt: "Could the bleeding be controlled with XXX®:",
        report_label: "Could the bleeding be controlled with XXX®",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::BleedingControlled,
            options: &["completely", "partially", "not"],
        },
        satellite: Some(Satellite {
            field: TextField::BleedingComment,
            label: "Comment",
            prompt: "Comment:",
            trigger: SatelliteTrigger::Always,
        }),
    },
    Question {
        number: 13,
        prompt: "How many products were used on this patient:",
        report_label: "How many products were used",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::ProductsUsed,
            options: &["1", "more"],
        },
        satellite: Some(Satellite {
            field: TextField::ProductsCount,
            label: "Count",
            prompt: "more, how many?",
            trigger: SatelliteTrigger::Equals("more"),
        }),
    },
    Question {
        number: 14,
        prompt: "Where there any unexpected reactions?",
        report_label: "Unexpected reactions",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::UnexpectedReactions,
            options: &["no", "yes"],
        },
        satellite: Some(Satellite {
            field: TextField::ReactionsDescription,
            label: "Description",
            prompt: "yes, please describe:",
            trigger: SatelliteTrigger::Equals("yes"),
        }),
    },
    Question {
        number: 15,
        prompt: "Have there been difficult conditions?",
        report_label: "Difficult conditions",
        placeholder: None,
        kind: QuestionKind::MultiChoice {
            field: SetField::DifficultConditions,
            options: &["no", "darkness", "wet/snow conditions", OTHERS_OPTION],
        },
        satellite: others_satellite(TextField::ConditionsOther),
    },
    Question {
        number: 16,
        prompt: "Evaluate the opening of the package:",
        report_label: "Package opening evaluation",
        placeholder: None,
        kind: QuestionKind::Choice {
            field: TextField::PackageOpening,
            options: &["easy", "difficult"],
        },
        satellite: Some(Satellite {
            field: TextField::PackageComment,
            label: "Comment",
            prompt: "Comment:",
            trigger: SatelliteTrigger::Always,
        }),
    },
    Question {
        number: 17,
        prompt: "After how many hours was XXX® removed from the wound?",
        report_label: "Hours until XXX® removal",
        placeholder: None,
        kind: QuestionKind::Text {
            field: TextField::RemovalHours,
            hint: InputHint::FreeText,
        },
        satellite: None,
    },
    Question {
        number: 18,
        prompt: "Evaluate the removal of XXX® from the wound:",
        report_label: "Removal evaluation",
        placeholder: Some("(e.g. sticking, rebleeding, painless removal, rinsing solution)"),
        kind: QuestionKind::Text {
            field: TextField::RemovalEvaluation,
            hint: InputHint::LongText,
        },
        satellite: None,
    },
];
