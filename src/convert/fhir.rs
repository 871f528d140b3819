// The slice of FHIR R4 the converter writes. Only the elements we fill in
// are modelled; `None` fields are left out of the JSON.

use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

impl Identifier {
    pub fn new(system: &str, value: impl Into<String>) -> Self {
        Identifier {
            system: system.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    pub fn to(resource_type: &str, id: &str) -> Self {
        Reference {
            reference: format!("{}/{}", resource_type, id),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Coding {
    pub system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

impl CodeableConcept {
    pub fn single(system: &str, code: &str, display: Option<&str>) -> Self {
        CodeableConcept {
            coding: vec![Coding {
                system: system.to_string(),
                code: code.to_string(),
                display: display.map(str::to_string),
            }],
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Age {
    pub value: f64,
    pub unit: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProgressStatus {
    pub state: CodeableConcept,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub identifier: Vec<Identifier>,
    pub gender: String,
    pub deceased_boolean: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStudy {
    pub id: String,
    pub identifier: Vec<Identifier>,
    pub version: String,
    pub name: String,
    pub title: String,
    pub status: String,
    pub progress_status: Vec<ProgressStatus>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResearchSubject {
    pub id: String,
    pub identifier: Vec<Identifier>,
    pub status: String,
    pub study: Reference,
    pub subject: Reference,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub clinical_status: CodeableConcept,
    pub code: CodeableConcept,
    pub subject: Reference,
    pub onset_age: Age,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Procedure {
    pub id: String,
    pub status: String,
    pub code: CodeableConcept,
    pub subject: Reference,
}

/// Any resource we emit, tagged with `resourceType` as its first key.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    ResearchStudy(ResearchStudy),
    ResearchSubject(ResearchSubject),
    Condition(Condition),
    Procedure(Procedure),
}

impl Resource {
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::ResearchStudy(_) => "ResearchStudy",
            Resource::ResearchSubject(_) => "ResearchSubject",
            Resource::Condition(_) => "Condition",
            Resource::Procedure(_) => "Procedure",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::ResearchStudy(r) => &r.id,
            Resource::ResearchSubject(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::Procedure(r) => &r.id,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntryRequest {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_none_exist: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: Resource,
    pub request: BundleEntryRequest,
}

impl BundleEntry {
    /// A conditional-create (`POST <type>`) entry whose `fullUrl` is
    /// `<type>/<id>`.
    pub fn create(resource: Resource, if_none_exist: Option<String>) -> Self {
        let resource_type = resource.resource_type();
        BundleEntry {
            full_url: format!("{}/{}", resource_type, resource.id()),
            request: BundleEntryRequest {
                method: "POST".to_string(),
                url: resource_type.to_string(),
                if_none_exist,
            },
            resource,
        }
    }
}

/// A FHIR `Bundle` resource of type `transaction`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "resourceType", rename = "Bundle")]
pub struct TransactionBundle {
    #[serde(rename = "type")]
    pub kind: String,
    pub entry: Vec<BundleEntry>,
}

impl TransactionBundle {
    pub fn new(entry: Vec<BundleEntry>) -> Self {
        TransactionBundle {
            kind: "transaction".to_string(),
            entry,
        }
    }
}
