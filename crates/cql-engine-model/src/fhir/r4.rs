//! FHIR R4 ModelInfo
//!
//! The full HL7-published FHIR R4 ModelInfo XML runs to several thousand
//! types and is out of scope to vendor into this crate (the external record
//! data model is an opaque collaborator per the engine's design). What's
//! embedded here is a minimal ModelInfo covering the resource types this
//! workspace's tests retrieve against; callers targeting a complete FHIR R4
//! model should load the official `FHIR-modelinfo-4.0.1.xml` via
//! [`ModelRegistry::from_xml_file`](crate::registry::ModelRegistry::from_xml_file).

use crate::model_info::ModelInfo;
use crate::provider::ModelProviderError;
use crate::registry::ModelRegistry;
use once_cell::sync::Lazy;

/// Minimal embedded FHIR R4 ModelInfo XML.
pub const FHIR_R4_MODEL_INFO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<modelInfo name="FHIR" version="4.0.1" url="http://hl7.org/fhir"
           targetQualifier="fhir" patientClassName="Patient"
           patientBirthDatePropertyName="birthDate">
    <typeInfo name="Patient" retrievable="true" primaryCodePath="">
        <element name="id" type="String"/>
        <element name="birthDate" type="FHIR.date"/>
        <element name="gender" type="FHIR.code"/>
        <element name="name" type="list&lt;FHIR.HumanName&gt;"/>
    </typeInfo>
    <typeInfo name="Condition" retrievable="true" primaryCodePath="code">
        <element name="id" type="String"/>
        <element name="code" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="onset" type="FHIR.dateTime"/>
        <element name="clinicalStatus" type="FHIR.CodeableConcept"/>
    </typeInfo>
    <typeInfo name="Observation" retrievable="true" primaryCodePath="code">
        <element name="id" type="String"/>
        <element name="code" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="effective" type="FHIR.dateTime"/>
        <element name="value" type="FHIR.Quantity"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
    <typeInfo name="Encounter" retrievable="true" primaryCodePath="type">
        <element name="id" type="String"/>
        <element name="type" type="list&lt;FHIR.CodeableConcept&gt;"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="period" type="FHIR.Period"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
    <typeInfo name="MedicationRequest" retrievable="true" primaryCodePath="medication">
        <element name="id" type="String"/>
        <element name="medication" type="FHIR.CodeableConcept"/>
        <element name="subject" type="FHIR.Reference"/>
        <element name="authoredOn" type="FHIR.dateTime"/>
        <element name="status" type="FHIR.code"/>
    </typeInfo>
</modelInfo>
"#;

/// Lazily parsed minimal FHIR R4 model registry.
pub static FHIR_R4_REGISTRY: Lazy<Result<ModelRegistry, ModelProviderError>> =
    Lazy::new(|| ModelRegistry::from_xml(FHIR_R4_MODEL_INFO_XML));

/// Get the minimal FHIR R4 model registry.
pub fn fhir_r4_registry() -> Result<ModelRegistry, ModelProviderError> {
    FHIR_R4_REGISTRY.clone()
}

/// Parse the minimal embedded FHIR R4 ModelInfo.
pub fn load_fhir_r4_model_info() -> Result<ModelInfo, ModelProviderError> {
    crate::model_info::parse_xml(FHIR_R4_MODEL_INFO_XML)
        .map_err(|e| ModelProviderError::ParseError(e.to_string()))
}
