#[cfg(test)]
#[path = "patients_test.rs"]
mod patients_test;

use crate::api::types::{Patient, PatientStatus, RecordId};

/// Status dropdown on the patient list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PatientStatus),
}

impl StatusFilter {
    /// Parse `all` or a status name (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "active" => Some(Self::Only(PatientStatus::Active)),
            "inactive" => Some(Self::Only(PatientStatus::Inactive)),
            "discharged" => Some(Self::Only(PatientStatus::Discharged)),
            _ => None,
        }
    }
}

/// Search box plus status dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub query: String,
    pub status: StatusFilter,
}

impl PatientFilter {
    /// Name and email match case-insensitively; phone matches as typed.
    #[must_use]
    pub fn matches(&self, patient: &Patient) -> bool {
        let query = self.query.trim();
        let text_match = query.is_empty() || {
            let needle = query.to_lowercase();
            patient.name.to_lowercase().contains(&needle)
                || patient.email.to_lowercase().contains(&needle)
                || patient.phone.contains(query)
        };
        let status_match = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => patient.status == status,
        };
        text_match && status_match
    }

    #[must_use]
    pub fn apply<'a>(&self, patients: &'a [Patient]) -> Vec<&'a Patient> {
        patients.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Counts shown on the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatientStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub discharged: usize,
}

impl PatientStats {
    #[must_use]
    pub fn from_patients(patients: &[Patient]) -> Self {
        patients.iter().fold(Self { total: patients.len(), ..Self::default() }, |mut stats, p| {
            match p.status {
                PatientStatus::Active => stats.active += 1,
                PatientStatus::Inactive => stats.inactive += 1,
                PatientStatus::Discharged => stats.discharged += 1,
                PatientStatus::Unknown => {}
            }
            stats
        })
    }
}

/// Medical id for a new record given how many patients exist already.
#[must_use]
pub fn next_medical_id(existing: usize) -> String {
    format!("MED{:03}", existing + 1)
}

/// Add/edit dialog on the patient list.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PatientDialog {
    #[default]
    Closed,
    Adding(Patient),
    Editing { patient_id: RecordId, form: Patient },
}

impl PatientDialog {
    /// Open with an empty form (status `Active`).
    #[must_use]
    pub fn add() -> Self {
        Self::Adding(Patient::default())
    }

    /// Open pre-filled from an existing record. Records without an id
    /// cannot be edited and open as a new record instead.
    #[must_use]
    pub fn edit(patient: &Patient) -> Self {
        match &patient.id {
            Some(id) => Self::Editing { patient_id: id.clone(), form: patient.clone() },
            None => Self::Adding(patient.clone()),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn form_mut(&mut self) -> Option<&mut Patient> {
        match self {
            Self::Closed => None,
            Self::Adding(form) | Self::Editing { form, .. } => Some(form),
        }
    }

    pub fn close(&mut self) {
        *self = Self::Closed;
    }

    /// Turn the dialog into the request to send. New records get the doctor
    /// id, a medical id and today's visit date filled in.
    #[must_use]
    pub fn submission(&self, doctor_id: &RecordId, existing: usize, today: &str) -> Option<PatientSubmission> {
        match self {
            Self::Closed => None,
            Self::Adding(form) => {
                let mut record = form.clone();
                record.doctor_id = Some(doctor_id.clone());
                record.medical_id = Some(next_medical_id(existing));
                record.last_visit = Some(today.to_owned());
                Some(PatientSubmission::Create(record))
            }
            Self::Editing { patient_id, form } => {
                Some(PatientSubmission::Update { patient_id: patient_id.clone(), record: form.clone() })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatientSubmission {
    Create(Patient),
    Update { patient_id: RecordId, record: Patient },
}
