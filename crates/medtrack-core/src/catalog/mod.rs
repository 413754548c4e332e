//! Medication catalogue: model types, controlled vocabulary and seed data.

mod store;

pub use store::CatalogStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Suggested category labels used to pre-populate pickers and group the
/// catalogue. Free text remains the escape hatch; these are not enforced.
pub const CATEGORY_SUGGESTIONS: &[&str] = &["高血压", "心血管", "糖尿病", "感冒发烧", "消化系统"];

/// Suggested dosage-form labels.
pub const FORM_SUGGESTIONS: &[&str] = &["片剂", "胶囊", "口服液", "注射剂"];

/// The application records personal medication data only; it gives no
/// medical advice. Shown verbatim in the "more" screen.
pub const DISCLAIMER: &str = "本应用仅用于个人用药记录与提醒，不构成任何医疗建议或诊断。\
用药请遵循专业医生或药师的指导，如有不适请及时就医。";

/// A catalogue entry.
///
/// `name` uniqueness is soft: same-name entries are treated as "the same
/// medication" during reconciliation, but the store enforces no constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub generic_name: String,
    pub category: String,
    pub form: String,
    pub strength: String,
    pub notes: String,
    /// True for seed data; immutable after creation.
    pub is_builtin: bool,
    pub is_favorite: bool,
    /// Doses per day in the usage plan, >= 1.
    pub doses_per_day: i64,
    /// Days between doses in the usage plan, >= 1.
    pub interval_days: i64,
    pub created_at: DateTime<Utc>,
}

/// Descriptive fields for creating or reconciling a catalogue entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub name: String,
    #[serde(default)]
    pub generic_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub form: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub notes: String,
}

impl MedicationDraft {
    /// Draft carrying only a name; descriptive fields stay empty.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// The fixed built-in medication list inserted on first use of an empty
/// catalogue: (name, generic_name, category, form, strength, notes).
pub(crate) const BUILTIN_MEDICATIONS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("氨氯地平", "Amlodipine", "高血压", "片剂", "5 mg", "常用降压药"),
    ("缬沙坦", "Valsartan", "高血压", "片剂", "80 mg", "ARB 类降压药"),
    (
        "阿司匹林肠溶片",
        "Aspirin",
        "心血管",
        "片剂",
        "100 mg",
        "心梗、脑梗二级预防常用药",
    ),
    (
        "他汀类降脂药",
        "Atorvastatin",
        "心血管",
        "片剂",
        "10 mg",
        "降脂常用药",
    ),
    (
        "二甲双胍",
        "Metformin",
        "糖尿病",
        "片剂",
        "500 mg",
        "2 型糖尿病基础用药",
    ),
    (
        "格列美脲",
        "Glimepiride",
        "糖尿病",
        "片剂",
        "1 mg",
        "磺脲类降糖药",
    ),
    (
        "对乙酰氨基酚",
        "Acetaminophen",
        "感冒发烧",
        "片剂",
        "500 mg",
        "解热镇痛常用药",
    ),
    (
        "布洛芬",
        "Ibuprofen",
        "感冒发烧",
        "片剂",
        "200 mg",
        "解热镇痛、抗炎",
    ),
    ("复方感冒药", "", "感冒发烧", "片剂", "", "多成分复方制剂"),
    (
        "奥美拉唑",
        "Omeprazole",
        "消化系统",
        "胶囊",
        "20 mg",
        "胃酸相关疾病常用药",
    ),
];
