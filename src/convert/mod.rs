// TSV → FHIR transaction bundle conversion.
//
// Two modes, picked by whether a research study id is supplied:
// - without one, a fresh ResearchStudy is written to `study.json` and
//   nothing else happens, so it can be uploaded and referenced first;
// - with one, every data row becomes `<subject id>.json`, a transaction
//   bundle whose ResearchSubject points at that study.

pub mod fhir;
pub mod record;

use crate::config::ConvertConfig;
use anyhow::{Context, Result};
use fhir::{
    Age, BundleEntry, CodeableConcept, Condition, Identifier, Patient, Procedure, ProgressStatus,
    Reference, ResearchStudy, ResearchSubject, Resource, TransactionBundle,
};
use record::ClinicalRecord;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

pub const PATIENT_ID_SYSTEM: &str = "https://www.gmds.de/pk-nachwuchs/patient";
pub const STUDY_PATIENT_ID_SYSTEM: &str = "https://www.cbioportal.org/patient";
pub const STUDY_ID_SYSTEM: &str = "https://www.cbioportal.org/study";
pub const STUDY_ID_VALUE: &str = "paad_tcga_pan_can_atlas_2018";

const ICD_10_GM_SYSTEM: &str = "http://fhir.de/CodeSystem/bfarm/icd-10-gm";
const CONDITION_CLINICAL_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
const STUDY_STATUS_SYSTEM: &str = "http://hl7.org/fhir/research-study-status";
const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
const RADIOTHERAPY_CODE: &str = "1287742003";

/// Run the converter, printing each output path to `out` before writing it.
/// Returns the paths written.
pub fn run<W: Write>(config: &ConvertConfig, out: &mut W) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("Failed to create {}", config.out_dir.display()))?;

    let Some(study_id) = config.research_study_id.as_deref() else {
        let study_id = new_id();
        let path = config.out_dir.join("study.json");
        writeln!(out, "{}", path.display())?;
        write_json(&path, &Resource::ResearchStudy(research_study(&study_id)))?;
        info!("Wrote ResearchStudy {} to {}", study_id, path.display());
        return Ok(vec![path]);
    };

    let data = fs::read_to_string(&config.data_path)
        .with_context(|| format!("Failed to read {}", config.data_path.display()))?;

    let mut written = Vec::new();
    // Line 1 is the header.
    for (idx, line) in data.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let record = ClinicalRecord::parse(line, idx + 1)?;
        let bundle = transaction_bundle(&record, study_id);

        let path = config.out_dir.join(format!("{}.json", record.subject_id));
        writeln!(out, "{}", path.display())?;
        write_json(&path, &bundle)?;
        debug!("{}: {} entries", path.display(), bundle.entry.len());
        written.push(path);
    }
    info!("Wrote {} bundle(s) to {}", written.len(), config.out_dir.display());
    Ok(written)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn research_study(study_id: &str) -> ResearchStudy {
    ResearchStudy {
        id: study_id.to_string(),
        identifier: vec![Identifier::new(STUDY_ID_SYSTEM, STUDY_ID_VALUE)],
        version: "1.0.0".to_string(),
        name: "tcga_pancreatic_adenocarcinoma".to_string(),
        title: "Pancreatic Adenocarcinoma (TCGA, PanCancer Atlas)".to_string(),
        status: "active".to_string(),
        progress_status: vec![ProgressStatus {
            state: CodeableConcept::single(STUDY_STATUS_SYSTEM, "completed", Some("Completed")),
        }],
    }
}

/// German ICD-10-GM display text for the pancreas codes in the export.
pub fn icd_10_label(code: &str) -> Option<&'static str> {
    let label = match code {
        "C25.0" => "Bösartige Neubildung: Pankreaskopf",
        "C25.1" => "Bösartige Neubildung: Pankreaskörper",
        "C25.2" => "Bösartige Neubildung: Pankreasschwanz",
        "C25.3" => "Bösartige Neubildung: Ductus pancreaticus",
        "C25.4" => "Bösartige Neubildung: Endokriner Drüsenanteil des Pankreas",
        "C25.7" => "Bösartige Neubildung: Sonstige Teile des Pankreas",
        "C25.8" => "Bösartige Neubildung: Pankreas, mehrere Teilbereiche überlappend",
        "C25.9" => "Bösartige Neubildung: Pankreas, nicht näher bezeichnet",
        _ => return None,
    };
    Some(label)
}

/// Patient, ResearchSubject and Condition entries, plus a Procedure entry
/// when the subject had radiation therapy. All resources get fresh UUIDs.
pub fn transaction_bundle(record: &ClinicalRecord, study_id: &str) -> TransactionBundle {
    let patient_id = new_id();
    let patient_ref = Reference::to("Patient", &patient_id);
    let pseudonym = record.patient_id.to_lowercase();

    let patient = Patient {
        id: patient_id,
        identifier: vec![Identifier::new(PATIENT_ID_SYSTEM, pseudonym.clone())],
        gender: record.sex.to_lowercase(),
        deceased_boolean: !record.is_alive,
    };

    let research_subject = ResearchSubject {
        id: new_id(),
        identifier: vec![Identifier::new(
            STUDY_PATIENT_ID_SYSTEM,
            record.subject_id.clone(),
        )],
        status: "active".to_string(),
        study: Reference::to("ResearchStudy", study_id),
        subject: patient_ref.clone(),
    };

    let condition = Condition {
        id: new_id(),
        clinical_status: CodeableConcept::single(CONDITION_CLINICAL_SYSTEM, "active", Some("Active")),
        code: CodeableConcept::single(
            ICD_10_GM_SYSTEM,
            &record.icd_10_code,
            icd_10_label(&record.icd_10_code),
        ),
        subject: patient_ref.clone(),
        onset_age: Age {
            value: record.onset_age,
            // UCUM unit for years
            unit: "a".to_string(),
        },
    };

    let mut entry = vec![
        BundleEntry::create(
            Resource::Patient(patient),
            Some(format!("identifier={}|{}", PATIENT_ID_SYSTEM, pseudonym)),
        ),
        BundleEntry::create(
            Resource::ResearchSubject(research_subject),
            Some(format!(
                "identifier={}|{}",
                STUDY_PATIENT_ID_SYSTEM, record.subject_id
            )),
        ),
        BundleEntry::create(Resource::Condition(condition), None),
    ];

    if record.radiation_therapy {
        let procedure = Procedure {
            id: new_id(),
            status: "completed".to_string(),
            code: CodeableConcept::single(
                SNOMED_SYSTEM,
                RADIOTHERAPY_CODE,
                Some("Radiotherapy (procedure)"),
            ),
            subject: patient_ref,
        };
        entry.push(BundleEntry::create(Resource::Procedure(procedure), None));
    }

    TransactionBundle::new(entry)
}
