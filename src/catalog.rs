//! Canonical enum tables.
//!
//! Each enum field has exactly one table of `(code, label)` pairs. The step
//! validators take their allow-lists from here and the CSV export takes its
//! human labels from here, so the two can never disagree about which codes
//! exist.

/// An enum field: its name and its ordered `(code, label)` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumField {
    /// Field name as it appears in forms and stored records.
    pub field: &'static str,
    /// Allowed codes paired with their export labels, in display order.
    pub options: &'static [(&'static str, &'static str)],
}

impl EnumField {
    /// Returns the allowed codes in display order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.options.iter().map(|(code, _)| *code).collect()
    }

    /// Returns `true` if `code` is one of the allowed codes.
    pub fn contains(&self, code: &str) -> bool {
        self.options.iter().any(|(c, _)| *c == code)
    }

    /// Maps a stored code to its label. Unknown codes yield `None`.
    pub fn label(&self, code: &str) -> Option<&'static str> {
        self.options
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }
}

const YES_NO: &[(&str, &str)] = &[("yes", "Yes"), ("no", "No")];

/// Options for `consent`.
pub const CONSENT: EnumField = EnumField {
    field: "consent",
    options: YES_NO,
};

/// Options for `sex`.
pub const SEX: EnumField = EnumField {
    field: "sex",
    options: &[
        ("male", "Male"),
        ("female", "Female"),
        ("prefer_not_to_say", "Prefer not to say"),
    ],
};

/// Options for `age_range`.
pub const AGE_RANGE: EnumField = EnumField {
    field: "age_range",
    options: &[
        ("18_24", "18-24"),
        ("25_34", "25-34"),
        ("35_44", "35-44"),
        ("45_54", "45-54"),
        ("55_above", "55 and above"),
    ],
};

/// Options for `office_type`.
pub const OFFICE_TYPE: EnumField = EnumField {
    field: "office_type",
    options: &[
        ("central_office", "Central Office"),
        ("field_office", "Field Office"),
        ("attached_agency", "Attached Agency"),
    ],
};

/// Options for `employment_status`.
pub const EMPLOYMENT_STATUS: EnumField = EnumField {
    field: "employment_status",
    options: &[
        ("permanent", "Permanent"),
        ("coterminous", "Coterminous"),
        ("contractual", "Contractual"),
        ("cos_moa", "Contract of Service / MOA"),
    ],
};

/// Options for `years_dswd`.
pub const YEARS_DSWD: EnumField = EnumField {
    field: "years_dswd",
    options: &[
        ("less_than_1", "Less than 1 year"),
        ("1_5", "1 to 5 years"),
        ("6_10", "6 to 10 years"),
        ("11_15", "11 to 15 years"),
        ("more_than_15", "More than 15 years"),
    ],
};

/// Options for `years_swd_sector`.
pub const YEARS_SWD_SECTOR: EnumField = EnumField {
    field: "years_swd_sector",
    options: &[
        ("less_than_5", "Less than 5 years"),
        ("5_10", "5 to 10 years"),
        ("11_15", "11 to 15 years"),
        ("more_than_15", "More than 15 years"),
    ],
};

/// Options for `performs_sw_tasks`.
pub const PERFORMS_SW_TASKS: EnumField = EnumField {
    field: "performs_sw_tasks",
    options: YES_NO,
};

/// Options for `highest_education`.
pub const HIGHEST_EDUCATION: EnumField = EnumField {
    field: "highest_education",
    options: &[
        ("high_school", "High School Graduate"),
        ("vocational", "Vocational/Technical"),
        ("college_undergraduate", "College Undergraduate"),
        ("bachelors", "Bachelor's Degree"),
        ("graduate", "Master's/Doctoral Degree"),
    ],
};

/// Options for `availed_dswd_training`.
pub const AVAILED_DSWD_TRAINING: EnumField = EnumField {
    field: "availed_dswd_training",
    options: YES_NO,
};

/// Options for `eteeap_awareness`.
pub const ETEEAP_AWARENESS: EnumField = EnumField {
    field: "eteeap_awareness",
    options: YES_NO,
};

/// Options for `eteeap_interest`.
pub const ETEEAP_INTEREST: EnumField = EnumField {
    field: "eteeap_interest",
    options: &[
        ("very_interested", "Very Interested"),
        ("interested", "Interested"),
        ("somewhat_interested", "Somewhat Interested"),
        ("not_interested", "Not Interested"),
    ],
};

/// Options for `will_apply`.
pub const WILL_APPLY: EnumField = EnumField {
    field: "will_apply",
    options: &[("yes", "Yes"), ("maybe", "Maybe"), ("no", "No")],
};

/// Enum fields whose stored codes the export rewrites into labels.
///
/// The yes/no fields are left out: they are stored as booleans and the export
/// renders them through its boolean rules instead.
pub const EXPORT_LABELED: &[EnumField] = &[
    SEX,
    AGE_RANGE,
    OFFICE_TYPE,
    EMPLOYMENT_STATUS,
    YEARS_DSWD,
    YEARS_SWD_SECTOR,
    HIGHEST_EDUCATION,
    ETEEAP_INTEREST,
    WILL_APPLY,
];

/// Looks up the export label table for a field, if it has one.
pub fn export_table(field: &str) -> Option<&'static EnumField> {
    EXPORT_LABELED.iter().find(|e| e.field == field)
}
