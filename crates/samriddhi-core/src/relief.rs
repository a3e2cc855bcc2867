//! # Case Relief Record
//!
//! Transient form state describing an atrocity case for DBT relief
//! sanction. The record is edited field by field, handed to a submission
//! sink once, and then discarded; nothing in this crate persists it.
//!
//! Select fields serialize an unset choice as the empty string, the same
//! value an unselected `<select>` submits.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! select_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:tt, expected = $expected:tt {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:tt, $label:tt)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            /// Every option, in display order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// Wire value of this option.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            /// Human-readable option label.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Parse a wire value.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidOption`] for values outside
            /// the option list.
            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                match value {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(ValidationError::InvalidOption {
                        field: $field,
                        value: other.to_string(),
                        expected: $expected,
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

select_enum! {
    /// Category of the atrocity recorded in the FIR.
    AtrocityType, field = "atrocityType",
    expected = "murder, rape, grievous_hurt, social_boycott, other" {
        /// Murder or death.
        Murder => ("murder", "Murder/Death"),
        /// Rape or sexual assault.
        Rape => ("rape", "Rape/Sexual Assault"),
        /// Grievous hurt or injury.
        GrievousHurt => ("grievous_hurt", "Grievous Hurt/Injury"),
        /// Social boycott or harassment.
        SocialBoycott => ("social_boycott", "Social Boycott/Harassment"),
        /// Any other atrocity.
        Other => ("other", "Other Atrocity"),
    }
}

select_enum! {
    /// Relief installment the case has reached.
    ReliefStage, field = "reliefStage", expected = "first, second, final" {
        /// Paid after FIR registration.
        First => ("first", "1st Installment (After FIR)"),
        /// Paid after the charge sheet.
        Second => ("second", "2nd Installment (After Charge Sheet)"),
        /// Paid after conviction or acquittal.
        Final => ("final", "Final Installment (After Conviction/Acquittal)"),
    }
}

select_enum! {
    /// Aadhaar-bank account seeding status for direct transfer.
    BankSeedingStatus, field = "bankAccountSeeded",
    expected = "seeded, pending, not_applicable" {
        /// Account is seeded and ready for DBT.
        Seeded => ("seeded", "Seeded (Ready for DBT)"),
        /// Seeding has been requested but is not complete.
        Pending => ("pending", "Pending Seeding"),
        /// Seeding does not apply to this case.
        NotApplicable => ("not_applicable", "Not Applicable"),
    }
}

/// Fields of a [`CaseReliefRecord`], addressable by form input name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReliefField {
    /// FIR / case number.
    FirNumber,
    /// Date of the incident.
    IncidentDate,
    /// Police station or jurisdiction.
    PoliceStation,
    /// Atrocity category (select).
    AtrocityType,
    /// Relief installment stage (select).
    ReliefStage,
    /// Victim's contact number.
    VictimContact,
    /// Aadhaar-bank seeding status (select).
    BankAccountSeeded,
}

impl ReliefField {
    /// Every field, in form order.
    pub const ALL: [ReliefField; 7] = [
        Self::FirNumber,
        Self::IncidentDate,
        Self::PoliceStation,
        Self::AtrocityType,
        Self::ReliefStage,
        Self::VictimContact,
        Self::BankAccountSeeded,
    ];

    /// Form input name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirNumber => "firNumber",
            Self::IncidentDate => "incidentDate",
            Self::PoliceStation => "policeStation",
            Self::AtrocityType => "atrocityType",
            Self::ReliefStage => "reliefStage",
            Self::VictimContact => "victimContact",
            Self::BankAccountSeeded => "bankAccountSeeded",
        }
    }

    /// Look a field up by form input name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownFormField`] for names the record
    /// does not have.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| ValidationError::UnknownFormField(name.to_string()))
    }

    /// Whether the field is a select with a fixed option list.
    pub fn is_select(&self) -> bool {
        matches!(
            self,
            Self::AtrocityType | Self::ReliefStage | Self::BankAccountSeeded
        )
    }
}

impl std::fmt::Display for ReliefField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Case and relief details captured for DBT verification and sanction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseReliefRecord {
    /// FIR / case number, e.g. `0123/2023`.
    pub fir_number: String,
    /// Date of the incident, as entered.
    pub incident_date: String,
    /// Police station name.
    pub police_station: String,
    /// Atrocity category.
    #[serde(with = "select")]
    pub atrocity_type: Option<AtrocityType>,
    /// Relief installment stage.
    #[serde(with = "select")]
    pub relief_stage: Option<ReliefStage>,
    /// Victim's contact number.
    pub victim_contact: String,
    /// Aadhaar-bank seeding status.
    #[serde(with = "select")]
    pub bank_account_seeded: Option<BankSeedingStatus>,
}

impl CaseReliefRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one field. The empty string clears a select.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidOption`] when a select field
    /// receives a value outside its option list; the record is unchanged.
    pub fn set(&mut self, field: ReliefField, value: &str) -> Result<(), ValidationError> {
        match field {
            ReliefField::FirNumber => self.fir_number = value.to_string(),
            ReliefField::IncidentDate => self.incident_date = value.to_string(),
            ReliefField::PoliceStation => self.police_station = value.to_string(),
            ReliefField::VictimContact => self.victim_contact = value.to_string(),
            ReliefField::AtrocityType => self.atrocity_type = parse_select(value)?,
            ReliefField::ReliefStage => self.relief_stage = parse_select(value)?,
            ReliefField::BankAccountSeeded => self.bank_account_seeded = parse_select(value)?,
        }
        Ok(())
    }

    /// Current value of a field as the form shows it.
    pub fn get(&self, field: ReliefField) -> &str {
        match field {
            ReliefField::FirNumber => &self.fir_number,
            ReliefField::IncidentDate => &self.incident_date,
            ReliefField::PoliceStation => &self.police_station,
            ReliefField::VictimContact => &self.victim_contact,
            ReliefField::AtrocityType => self.atrocity_type.map_or("", |v| v.as_str()),
            ReliefField::ReliefStage => self.relief_stage.map_or("", |v| v.as_str()),
            ReliefField::BankAccountSeeded => self.bank_account_seeded.map_or("", |v| v.as_str()),
        }
    }

    /// Required fields that are still blank. Every field of the form is
    /// marked required.
    pub fn missing_required(&self) -> Vec<ReliefField> {
        ReliefField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }
}

fn parse_select<T: SelectOption>(value: &str) -> Result<Option<T>, ValidationError> {
    if value.is_empty() {
        Ok(None)
    } else {
        T::parse_option(value).map(Some)
    }
}

trait SelectOption: Sized {
    fn parse_option(value: &str) -> Result<Self, ValidationError>;
    fn wire(&self) -> &'static str;
}

macro_rules! impl_select_option {
    ($($ty:ty),+) => {
        $(impl SelectOption for $ty {
            fn parse_option(value: &str) -> Result<Self, ValidationError> {
                Self::parse(value)
            }
            fn wire(&self) -> &'static str {
                self.as_str()
            }
        })+
    };
}

impl_select_option!(AtrocityType, ReliefStage, BankSeedingStatus);

mod select {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_select, SelectOption};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: SelectOption,
    {
        serializer.serialize_str(value.as_ref().map_or("", |v| v.wire()))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: SelectOption,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        parse_select(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_blank_and_fully_missing() {
        let r = CaseReliefRecord::new();
        assert_eq!(r.missing_required().len(), 7);
        assert_eq!(r.get(ReliefField::ReliefStage), "");
    }

    #[test]
    fn set_by_field_is_last_write_wins() {
        let mut r = CaseReliefRecord::new();
        r.set(ReliefField::FirNumber, "0123/2023").unwrap();
        r.set(ReliefField::FirNumber, "0124/2023").unwrap();
        assert_eq!(r.fir_number, "0124/2023");
    }

    #[test]
    fn select_rejects_unknown_option_without_writing() {
        let mut r = CaseReliefRecord::new();
        r.set(ReliefField::ReliefStage, "second").unwrap();
        let err = r.set(ReliefField::ReliefStage, "fourth").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidOption { field: "reliefStage", .. }
        ));
        assert_eq!(r.relief_stage, Some(ReliefStage::Second));
    }

    #[test]
    fn empty_string_clears_select() {
        let mut r = CaseReliefRecord::new();
        r.set(ReliefField::AtrocityType, "murder").unwrap();
        r.set(ReliefField::AtrocityType, "").unwrap();
        assert_eq!(r.atrocity_type, None);
    }

    #[test]
    fn field_lookup_by_input_name() {
        for field in ReliefField::ALL {
            assert_eq!(ReliefField::from_name(field.name()).unwrap(), field);
        }
        assert_eq!(
            ReliefField::from_name("arrivalDate"),
            Err(ValidationError::UnknownFormField("arrivalDate".into()))
        );
    }

    #[test]
    fn serializes_with_form_names_and_empty_selects() {
        let mut r = CaseReliefRecord::new();
        r.set(ReliefField::BankAccountSeeded, "not_applicable").unwrap();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["bankAccountSeeded"], "not_applicable");
        assert_eq!(v["atrocityType"], "");
        assert_eq!(v["firNumber"], "");
    }

    #[test]
    fn deserializes_prefilled_partial_record() {
        let r: CaseReliefRecord = serde_json::from_value(serde_json::json!({
            "firNumber": "0123/2023",
            "atrocityType": "grievous_hurt",
            "reliefStage": ""
        }))
        .unwrap();
        assert_eq!(r.fir_number, "0123/2023");
        assert_eq!(r.atrocity_type, Some(AtrocityType::GrievousHurt));
        assert_eq!(r.relief_stage, None);
        assert!(r.police_station.is_empty());
    }

    #[test]
    fn deserialize_rejects_bad_select_value() {
        let result: Result<CaseReliefRecord, _> =
            serde_json::from_value(serde_json::json!({ "reliefStage": "fourth" }));
        assert!(result.is_err());
    }

    #[test]
    fn option_labels_cover_every_variant() {
        assert_eq!(AtrocityType::ALL.len(), 5);
        assert_eq!(ReliefStage::First.label(), "1st Installment (After FIR)");
        assert_eq!(BankSeedingStatus::parse("seeded").unwrap(), BankSeedingStatus::Seeded);
    }
}
