// One row of the cBioPortal clinical data export.

use anyhow::{bail, Context, Result};

const SUBJECT_ID: usize = 1;
const DIAGNOSIS_AGE: usize = 3;
const ICD_10_CODE: usize = 24;
const SURVIVAL_STATUS: usize = 35;
const PATIENT_ID: usize = 36;
const RADIATION_THERAPY: usize = 46;
const SEX: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalRecord {
    pub subject_id: String,
    pub onset_age: f64,
    pub icd_10_code: String,
    pub is_alive: bool,
    pub patient_id: String,
    pub radiation_therapy: bool,
    pub sex: String,
}

impl ClinicalRecord {
    /// Parse one tab-separated line. `line_no` is 1-based and only used in
    /// error messages.
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() <= SEX {
            bail!(
                "line {}: expected at least {} columns, found {}",
                line_no,
                SEX + 1,
                fields.len()
            );
        }

        let age = fields[DIAGNOSIS_AGE];
        let onset_age = age
            .trim()
            .parse::<f64>()
            .with_context(|| format!("line {}: diagnosis age {:?} is not a number", line_no, age))?;

        Ok(ClinicalRecord {
            subject_id: fields[SUBJECT_ID].to_string(),
            onset_age,
            icd_10_code: fields[ICD_10_CODE].to_string(),
            is_alive: fields[SURVIVAL_STATUS] == "0:LIVING",
            patient_id: fields[PATIENT_ID].to_string(),
            radiation_therapy: fields[RADIATION_THERAPY] == "Yes",
            sex: fields[SEX].to_string(),
        })
    }
}
